//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::{from_fn_with_state, Next},
    extract::{Request, State},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use http_cache_headers::http::{post_handle_middleware, pre_store_middleware};
use http_cache_headers::Pipeline;

/// Headers seen between the two stages, where a caching proxy would sit.
pub type ProxyView = Arc<Mutex<Vec<HeaderMap>>>;

/// Build an app whose single route returns the given headers, wrapped in
/// both pipeline stages with a recorder standing in for the cache.
pub fn app_with_headers(
    pipeline: Pipeline,
    origin: &'static [(&'static str, &'static str)],
) -> (Router, ProxyView) {
    let pipeline = Arc::new(pipeline);
    let view: ProxyView = Arc::new(Mutex::new(Vec::new()));

    let router = Router::new()
        .route(
            "/",
            get(move || async move {
                let mut headers = HeaderMap::new();
                for &(name, value) in origin {
                    headers.append(
                        HeaderName::from_static(name),
                        HeaderValue::from_static(value),
                    );
                }
                (headers, "ok")
            }),
        )
        .layer(from_fn_with_state(pipeline.clone(), pre_store_middleware))
        .layer(from_fn_with_state(view.clone(), record_proxy_view))
        .layer(from_fn_with_state(pipeline, post_handle_middleware));

    (router, view)
}

async fn record_proxy_view(
    State(view): State<ProxyView>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    view.lock().await.push(response.headers().clone());
    response
}

/// Serve a router on an ephemeral local port.
pub async fn spawn_app(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    addr
}

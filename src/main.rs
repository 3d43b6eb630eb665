//! Demo host for the cache header listeners.
//!
//! Serves a small origin whose responses carry `Cache-Control`, a custom
//! proxy TTL and cache tags, with the two pipeline stages wrapped around a
//! stand-in for the caching proxy that logs what it would store.
//!
//! ```text
//! client ─▶ PostHandle ─▶ proxy view ─▶ PreStore ─▶ origin
//! ```
//!
//! Try `curl -i localhost:8080/ttl/120`: the response has `s-maxage=60`
//! while the proxy view logs `s-maxage=120`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header::CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use http_cache_headers::config::{load_config, AppConfig};
use http_cache_headers::http::{post_handle_middleware, pre_store_middleware, CacheControl, S_MAXAGE};
use http_cache_headers::listeners::SMAXAGE_BACKUP_HEADER;
use http_cache_headers::observability::init_logging;
use http_cache_headers::Pipeline;

#[derive(Parser)]
#[command(name = "cache-headers-demo")]
#[command(about = "Serve a demo origin through the cache header pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Clone)]
struct OriginState {
    tags_header: HeaderName,
    ttl_header: HeaderName,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;

    tracing::info!(
        tags_header = %config.cache_headers.tags_header,
        ttl_header = %config.cache_headers.ttl_header,
        fallback_to_smaxage = config.cache_headers.fallback_to_smaxage,
        "Configuration loaded"
    );

    let pipeline = Arc::new(Pipeline::from_config(&config.cache_headers)?);
    let origin = OriginState {
        tags_header: config.cache_headers.tags_header_name()?,
        ttl_header: config.cache_headers.ttl_header_name()?,
    };

    let app = Router::new()
        .route("/", get(origin_default))
        .route("/ttl/{seconds}", get(origin_with_ttl))
        .with_state(origin)
        .layer(from_fn_with_state(pipeline.clone(), pre_store_middleware))
        .layer(from_fn(proxy_view))
        .layer(from_fn_with_state(pipeline, post_handle_middleware))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn origin_headers(state: &OriginState) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=30, s-maxage=60"));
    headers.insert(state.tags_header.clone(), HeaderValue::from_static("demo,origin"));
    headers
}

async fn origin_default(State(state): State<OriginState>) -> impl IntoResponse {
    (origin_headers(&state), "origin response\n")
}

async fn origin_with_ttl(
    State(state): State<OriginState>,
    Path(seconds): Path<String>,
) -> Response {
    let mut headers = origin_headers(&state);
    match HeaderValue::from_str(&seconds) {
        Ok(ttl) => {
            headers.insert(state.ttl_header.clone(), ttl);
        }
        Err(_) => tracing::warn!(seconds = %seconds, "TTL is not a valid header value"),
    }
    (headers, "origin response with proxy TTL\n").into_response()
}

/// Logs what a caching proxy placed here would see.
async fn proxy_view(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let cache_control = CacheControl::from_headers(response.headers());

    tracing::info!(
        s_maxage = cache_control.get(S_MAXAGE).unwrap_or("none"),
        backup = response
            .headers()
            .get(SMAXAGE_BACKUP_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none"),
        "Proxy view of response"
    );

    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! Axum middleware running the cache header pipeline stages.
//!
//! Both functions run the inner service first and then dispatch a stage on
//! the response it produced. Place them around the caching layer:
//!
//! ```text
//! Router::new()
//!     .route(..)
//!     .layer(from_fn_with_state(pipeline.clone(), pre_store_middleware))
//!     .layer(<caching layer>)
//!     .layer(from_fn_with_state(pipeline, post_handle_middleware))
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::listeners::{Pipeline, Stage};

/// Dispatches [`Stage::PreStore`] on the application's response.
pub async fn pre_store_middleware(
    State(pipeline): State<Arc<Pipeline>>,
    request: Request,
    next: Next,
) -> Response {
    run_stage(&pipeline, Stage::PreStore, request, next).await
}

/// Dispatches [`Stage::PostHandle`] before the response leaves the server.
pub async fn post_handle_middleware(
    State(pipeline): State<Arc<Pipeline>>,
    request: Request,
    next: Next,
) -> Response {
    run_stage(&pipeline, Stage::PostHandle, request, next).await
}

async fn run_stage(pipeline: &Pipeline, stage: Stage, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let errors = pipeline.dispatch(stage, response.headers_mut());
    if !errors.is_empty() {
        tracing::debug!(
            stage = %stage,
            path = %path,
            errors = errors.len(),
            "Cache headers rewritten with errors"
        );
    }

    response
}

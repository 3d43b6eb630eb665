//! HTTP middleware.

pub mod cache_headers;

pub use cache_headers::{post_handle_middleware, pre_store_middleware};

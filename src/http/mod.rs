//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! application handler
//!     → middleware/cache_headers.rs (PreStore)
//!     → caching layer (external)
//!     → middleware/cache_headers.rs (PostHandle)
//!     → Send to client
//! ```
//!
//! `cache_control.rs` gives the listeners a structured view of the
//! `Cache-Control` header.

pub mod cache_control;
pub mod middleware;

pub use cache_control::{CacheControl, Directive, S_MAXAGE};
pub use middleware::{post_handle_middleware, pre_store_middleware};

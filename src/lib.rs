//! Cache header rewriting for responses passing through a caching proxy.

pub mod config;
pub mod http;
pub mod listeners;
pub mod observability;

pub use config::schema::AppConfig;
pub use listeners::{CacheHeaderError, CustomTtlRewriter, Pipeline, Stage, TagHeaderStripper};

//! Cache header listeners.
//!
//! # Data Flow
//! ```text
//! Stage::PreStore
//!     → custom_ttl.rs (X-Reverse-Proxy-TTL overrides s-maxage, original backed up)
//! Stage::PostHandle
//!     → custom_ttl.rs (s-maxage restored, TTL + backup headers removed)
//!     → tags.rs (X-Cache-Tags removed)
//! ```
//!
//! # Design Decisions
//! - All state lives in the response headers; listeners hold config only
//! - A failing listener is logged and skipped, delivery always continues

pub mod custom_ttl;
pub mod error;
pub mod pipeline;
pub mod tags;

pub use custom_ttl::{CustomTtlConfig, CustomTtlRewriter, SmaxageBackup, SMAXAGE_BACKUP_HEADER};
pub use error::CacheHeaderError;
pub use pipeline::{Listener, Pipeline, Stage};
pub use tags::TagHeaderStripper;

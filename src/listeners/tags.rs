//! Removes the cache tags header before a response reaches the client.
//!
//! Tags are only meaningful to the caching proxy (for invalidation), so they
//! are dropped at the last stage of the pipeline.

use axum::http::{HeaderMap, HeaderName};

use crate::listeners::pipeline::{Listener, Stage};
use crate::listeners::CacheHeaderError;

/// Default header carrying cache invalidation tags.
pub const DEFAULT_TAGS_HEADER: &str = "x-cache-tags";

/// Strips a configurable tags header from outgoing responses.
#[derive(Debug, Clone)]
pub struct TagHeaderStripper {
    header: HeaderName,
}

impl TagHeaderStripper {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Remove every value of the tags header. No-op when absent.
    pub fn strip(&self, headers: &mut HeaderMap) {
        if headers.remove(&self.header).is_some() {
            tracing::trace!(header = %self.header, "Removed cache tags header");
        }
    }
}

impl Default for TagHeaderStripper {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_TAGS_HEADER))
    }
}

impl Listener for TagHeaderStripper {
    fn stages(&self) -> &'static [Stage] {
        &[Stage::PostHandle]
    }

    fn handle(&self, stage: Stage, headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
        if stage == Stage::PostHandle {
            self.strip(headers);
        }
        Ok(())
    }
}

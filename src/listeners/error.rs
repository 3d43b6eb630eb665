//! Error definitions for the cache header listeners.

use thiserror::Error;

/// Errors reported while rewriting cache headers on a response.
///
/// None of these abort delivery: the pipeline logs them and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheHeaderError {
    /// The custom TTL header did not hold a non-negative integer.
    #[error("invalid TTL value {value:?} in header {header}")]
    InvalidTtlValue { header: String, value: String },

    /// A value could not be written back as an HTTP header value.
    #[error("cannot encode value for header {header}")]
    InvalidHeaderValue { header: String },
}

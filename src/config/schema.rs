//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every field has a default, so an empty file is a valid configuration.

use axum::http::{header::InvalidHeaderName, HeaderName};
use serde::Deserialize;

use crate::listeners::custom_ttl::{CustomTtlConfig, DEFAULT_TTL_HEADER};
use crate::listeners::tags::DEFAULT_TAGS_HEADER;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener used by the demo server.
    pub listener: ListenerConfig,

    /// Header names and rewrite behaviour.
    pub cache_headers: CacheHeadersConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Cache header listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheHeadersConfig {
    /// Header carrying cache invalidation tags.
    pub tags_header: String,

    /// Remove the tags header before delivery.
    pub strip_tags_header: bool,

    /// Header the application sets to request a proxy TTL.
    pub ttl_header: String,

    /// Keep the existing `s-maxage` when no TTL header is set.
    /// If false, such responses are stored with `s-maxage=0`.
    pub fallback_to_smaxage: bool,

    /// Remove the TTL header before delivery.
    pub strip_ttl_header: bool,
}

impl Default for CacheHeadersConfig {
    fn default() -> Self {
        Self {
            tags_header: "X-Cache-Tags".to_string(),
            strip_tags_header: true,
            ttl_header: "X-Reverse-Proxy-TTL".to_string(),
            fallback_to_smaxage: true,
            strip_ttl_header: true,
        }
    }
}

impl CacheHeadersConfig {
    pub fn tags_header_name(&self) -> Result<HeaderName, InvalidHeaderName> {
        HeaderName::from_bytes(self.tags_header.as_bytes())
    }

    pub fn ttl_header_name(&self) -> Result<HeaderName, InvalidHeaderName> {
        HeaderName::from_bytes(self.ttl_header.as_bytes())
    }

    /// Settings for the custom TTL rewriter.
    pub fn custom_ttl(&self) -> Result<CustomTtlConfig, InvalidHeaderName> {
        Ok(CustomTtlConfig {
            ttl_header: self.ttl_header_name()?,
            fallback_to_smaxage: self.fallback_to_smaxage,
            strip_ttl_header: self.strip_ttl_header,
        })
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

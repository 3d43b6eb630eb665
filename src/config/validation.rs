//! Configuration validation.
//!
//! Serde handles syntax; this module checks that the values make sense
//! together. Every problem is reported, not just the first one.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;
use tracing::Level;

use crate::config::schema::AppConfig;
use crate::listeners::SMAXAGE_BACKUP_HEADER;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let headers = &config.cache_headers;

    let tags = check_header_name("cache_headers.tags_header", &headers.tags_header, &mut errors);
    let ttl = check_header_name("cache_headers.ttl_header", &headers.ttl_header, &mut errors);

    if let (Some(tags), Some(ttl)) = (&tags, &ttl) {
        if tags == ttl {
            errors.push(ValidationError::new(
                "cache_headers.ttl_header",
                "must differ from tags_header",
            ));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.log_level.parse::<Level>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_header_name(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<HeaderName> {
    let Ok(name) = HeaderName::from_bytes(value.as_bytes()) else {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a valid header name", value),
        ));
        return None;
    };

    if name == SMAXAGE_BACKUP_HEADER {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is reserved for the s-maxage backup", value),
        ));
        return None;
    }

    Some(name)
}

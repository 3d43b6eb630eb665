//! Custom reverse-proxy TTL.
//!
//! An application can ask the caching proxy for a TTL that differs from the
//! `s-maxage` it sends to downstream caches by setting `X-Reverse-Proxy-TTL`.
//!
//! ```text
//! PreStore:   X-Reverse-Proxy-TTL: 120, Cache-Control: s-maxage=60
//!             → Cache-Control: s-maxage=120, X-Cache-TTL-Smaxage-Backup: 60
//! PostHandle: → Cache-Control: s-maxage=60 (TTL and backup headers removed)
//! ```
//!
//! The backup header travels with the response between the two stages, so a
//! proxy in another process can read it too. Its value is the previous
//! `s-maxage`, the literal `false` when there was none, or empty when the
//! directive was present without a value.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::http::cache_control::{CacheControl, Directive, S_MAXAGE};
use crate::listeners::pipeline::{Listener, Stage};
use crate::listeners::CacheHeaderError;

/// Default header an application uses to request a proxy TTL.
pub const DEFAULT_TTL_HEADER: &str = "x-reverse-proxy-ttl";

/// Header holding the original `s-maxage` while the custom TTL is active.
pub const SMAXAGE_BACKUP_HEADER: &str = "x-cache-ttl-smaxage-backup";

/// Backup value meaning "the response had no `s-maxage`".
pub const NO_SMAXAGE_MARKER: &str = "false";

/// Backup value meaning "`s-maxage` was present without a value".
pub const BARE_SMAXAGE_MARKER: &str = "";

/// The `s-maxage` a response had before the custom TTL replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmaxageBackup {
    Value(String),
    Bare,
    WasAbsent,
}

impl SmaxageBackup {
    fn backup_header() -> HeaderName {
        HeaderName::from_static(SMAXAGE_BACKUP_HEADER)
    }

    /// Read the backup header, `None` if no override is in effect.
    pub fn read(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(SMAXAGE_BACKUP_HEADER)?;
        let value = String::from_utf8_lossy(raw.as_bytes());
        Some(match value.as_ref() {
            NO_SMAXAGE_MARKER => Self::WasAbsent,
            BARE_SMAXAGE_MARKER => Self::Bare,
            _ => Self::Value(value.into_owned()),
        })
    }

    pub fn encode(&self) -> &str {
        match self {
            Self::Value(value) => value.as_str(),
            Self::Bare => BARE_SMAXAGE_MARKER,
            Self::WasAbsent => NO_SMAXAGE_MARKER,
        }
    }

    fn write_to(&self, headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
        let value = HeaderValue::from_str(self.encode()).map_err(|_| {
            CacheHeaderError::InvalidHeaderValue {
                header: SMAXAGE_BACKUP_HEADER.to_string(),
            }
        })?;
        headers.insert(Self::backup_header(), value);
        Ok(())
    }
}

impl From<Option<&Directive>> for SmaxageBackup {
    fn from(smaxage: Option<&Directive>) -> Self {
        match smaxage.map(Directive::value) {
            Some(Some(value)) => Self::Value(value.to_string()),
            Some(None) => Self::Bare,
            None => Self::WasAbsent,
        }
    }
}

/// Settings for [`CustomTtlRewriter`].
#[derive(Debug, Clone)]
pub struct CustomTtlConfig {
    /// Header the application sets to request a proxy TTL.
    pub ttl_header: HeaderName,

    /// Keep the existing `s-maxage` when no TTL header is present.
    /// When disabled, such responses get `s-maxage=0` while in the proxy.
    pub fallback_to_smaxage: bool,

    /// Remove the TTL header during cleanup.
    pub strip_ttl_header: bool,
}

impl Default for CustomTtlConfig {
    fn default() -> Self {
        Self {
            ttl_header: HeaderName::from_static(DEFAULT_TTL_HEADER),
            fallback_to_smaxage: true,
            strip_ttl_header: true,
        }
    }
}

/// Swaps `s-maxage` for a custom TTL while the response is in the proxy and
/// puts it back before delivery.
#[derive(Debug, Clone, Default)]
pub struct CustomTtlRewriter {
    config: CustomTtlConfig,
}

impl CustomTtlRewriter {
    pub fn new(config: CustomTtlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CustomTtlConfig {
        &self.config
    }

    /// Override `s-maxage` with the custom TTL, backing up the original.
    ///
    /// A TTL header that is not a non-negative integer is treated as absent
    /// and reported as [`CacheHeaderError::InvalidTtlValue`] once the rest of
    /// the phase has run. A `Cache-Control` value that is not visible ASCII
    /// leaves the response untouched.
    pub fn apply_custom_ttl(&self, headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
        let (ttl, invalid) = match self.read_ttl(headers) {
            Ok(ttl) => (ttl, None),
            Err(e) => (None, Some(e)),
        };

        let ttl = match ttl {
            Some(ttl) => ttl,
            None if self.config.fallback_to_smaxage => return invalid.map_or(Ok(()), Err),
            None => 0,
        };

        let mut cache_control = CacheControl::try_from_headers(headers)?;

        // Only the first override records a backup.
        if !headers.contains_key(SMAXAGE_BACKUP_HEADER) {
            let backup = SmaxageBackup::from(cache_control.directive(S_MAXAGE));
            backup.write_to(headers)?;
            tracing::debug!(ttl, backup = backup.encode(), "Applied custom reverse proxy TTL");
        }

        cache_control.set(S_MAXAGE, ttl.to_string());
        cache_control.write_to(headers)?;

        invalid.map_or(Ok(()), Err)
    }

    /// Restore the backed-up `s-maxage` and drop the TTL and backup headers.
    ///
    /// The TTL and backup headers are removed even when `Cache-Control`
    /// cannot be decoded; `Cache-Control` itself is then left as it is.
    pub fn cleanup_custom_ttl(&self, headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
        let backup = SmaxageBackup::read(headers);
        if backup.is_none() && !headers.contains_key(&self.config.ttl_header) {
            return Ok(());
        }

        if self.config.strip_ttl_header {
            headers.remove(&self.config.ttl_header);
        }
        headers.remove(SMAXAGE_BACKUP_HEADER);

        let Some(backup) = backup else {
            return Ok(());
        };

        let mut cache_control = CacheControl::try_from_headers(headers)?;
        match &backup {
            SmaxageBackup::Value(value) => cache_control.set(S_MAXAGE, value.clone()),
            SmaxageBackup::Bare => cache_control.set_flag(S_MAXAGE),
            SmaxageBackup::WasAbsent => {
                cache_control.remove(S_MAXAGE);
            }
        }
        tracing::debug!(backup = backup.encode(), "Restored s-maxage after custom TTL");
        cache_control.write_to(headers)
    }

    fn read_ttl(&self, headers: &HeaderMap) -> Result<Option<u64>, CacheHeaderError> {
        let Some(raw) = headers.get(&self.config.ttl_header) else {
            return Ok(None);
        };

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Some)
            .ok_or_else(|| CacheHeaderError::InvalidTtlValue {
                header: self.config.ttl_header.to_string(),
                value: String::from_utf8_lossy(raw.as_bytes()).into_owned(),
            })
    }
}

impl Listener for CustomTtlRewriter {
    fn stages(&self) -> &'static [Stage] {
        &[Stage::PreStore, Stage::PostHandle]
    }

    fn handle(&self, stage: Stage, headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
        match stage {
            Stage::PreStore => self.apply_custom_ttl(headers),
            Stage::PostHandle => self.cleanup_custom_ttl(headers),
        }
    }
}

//! Structured view over the `Cache-Control` response header.
//!
//! The header is treated as an ordered set of directives, each a lower-cased
//! name with an optional value. Directives this module knows nothing about
//! are kept as they are, so rewriting `s-maxage` never disturbs `max-age`,
//! `public` or extensions.

use std::fmt;

use axum::http::{header::CACHE_CONTROL, HeaderMap, HeaderValue};

use crate::listeners::CacheHeaderError;

/// The shared-cache freshness directive.
pub const S_MAXAGE: &str = "s-maxage";

/// A single `Cache-Control` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    name: String,
    value: Option<String>,
}

impl Directive {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        match raw.split_once('=') {
            Some((name, value)) => {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Self {
                    name: name.to_ascii_lowercase(),
                    value: Some(unquote(value.trim())),
                })
            }
            None => Some(Self {
                name: raw.to_ascii_lowercase(),
                value: None,
            }),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) if is_token(value) => write!(f, "{}={}", self.name, value),
            Some(value) => write!(f, "{}=\"{}\"", self.name, escape(value)),
            None => f.write_str(&self.name),
        }
    }
}

/// Parsed `Cache-Control` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    directives: Vec<Directive>,
}

impl CacheControl {
    /// Create an empty directive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single `Cache-Control` header value.
    ///
    /// Directives are merged by name: a repeated directive keeps the position
    /// of its first occurrence and the last value seen, so `public, public`
    /// renders back as `public`.
    pub fn parse(header: &str) -> Self {
        let mut cc = Self::new();
        for directive in split_directives(header).into_iter().filter_map(Directive::parse) {
            cc.push(directive);
        }
        cc
    }

    /// Read every `Cache-Control` value present on a header map.
    ///
    /// Values that are not visible ASCII are skipped, so the result must not
    /// be written back; use [`CacheControl::try_from_headers`] for that.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let joined = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");

        Self::parse(&joined)
    }

    /// Like [`CacheControl::from_headers`], but refuses to drop anything.
    ///
    /// Fails if any `Cache-Control` value is not visible ASCII, since writing
    /// the parsed set back would lose that value.
    pub fn try_from_headers(headers: &HeaderMap) -> Result<Self, CacheHeaderError> {
        let mut values = Vec::new();
        for value in headers.get_all(CACHE_CONTROL) {
            let value = value
                .to_str()
                .map_err(|_| CacheHeaderError::InvalidHeaderValue {
                    header: CACHE_CONTROL.to_string(),
                })?;
            values.push(value);
        }

        Ok(Self::parse(&values.join(",")))
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Look up a directive by (case-insensitive) name.
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }

    /// Value of a directive, `None` when it is absent or carries no value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.directive(name).and_then(Directive::value)
    }

    /// Set a directive's value, keeping its position if it already exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .directives
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self.directives.push(Directive {
                name: name.to_ascii_lowercase(),
                value,
            }),
        }
    }

    /// Set a directive without a value, keeping its position if present.
    pub fn set_flag(&mut self, name: &str) {
        match self
            .directives
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = None,
            None => self.directives.push(Directive {
                name: name.to_ascii_lowercase(),
                value: None,
            }),
        }
    }

    /// Remove a directive. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.directives.len();
        self.directives.retain(|d| !d.name.eq_ignore_ascii_case(name));
        before != self.directives.len()
    }

    /// Render as a header value, directives separated by `", "`.
    pub fn to_header_value(&self) -> String {
        self.directives
            .iter()
            .map(Directive::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Replace the `Cache-Control` header on `headers` with this set.
    ///
    /// An empty set removes the header altogether.
    pub fn write_to(&self, headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
        if self.is_empty() {
            headers.remove(CACHE_CONTROL);
            return Ok(());
        }

        let value = HeaderValue::from_str(&self.to_header_value()).map_err(|_| {
            CacheHeaderError::InvalidHeaderValue {
                header: CACHE_CONTROL.to_string(),
            }
        })?;
        headers.insert(CACHE_CONTROL, value);
        Ok(())
    }

    // Later duplicates of a directive replace the value of the first one.
    fn push(&mut self, directive: Directive) {
        match directive.value {
            Some(value) => self.set(&directive.name, value),
            None if self.has(&directive.name) => {}
            None => self.directives.push(directive),
        }
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Split on commas that are not inside a quoted string.
fn split_directives(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// RFC 9110 `token`.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
}

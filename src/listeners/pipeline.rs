//! Stage dispatch for the cache header listeners.
//!
//! The host calls [`Pipeline::dispatch`] at two points of its response path:
//!
//! ```text
//! application response
//!     → Stage::PreStore   (custom TTL applied, proxy sees the override)
//!     → caching proxy stores / serves
//!     → Stage::PostHandle (s-maxage restored, internal headers removed)
//!     → client
//! ```
//!
//! Registrations run synchronously in the order they were subscribed.

use std::fmt;
use std::sync::Arc;

use axum::http::{header::InvalidHeaderName, HeaderMap, Response};

use crate::config::CacheHeadersConfig;
use crate::listeners::{CacheHeaderError, CustomTtlRewriter, TagHeaderStripper};

/// Hook points in the host's response pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Before the caching proxy decides how to store the response.
    PreStore,
    /// Right before the response is delivered to the client.
    PostHandle,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::PreStore => f.write_str("pre_store"),
            Stage::PostHandle => f.write_str("post_handle"),
        }
    }
}

/// A component reacting to one or more stages.
pub trait Listener: Send + Sync {
    /// Stages this listener is registered for.
    fn stages(&self) -> &'static [Stage];

    fn handle(&self, stage: Stage, headers: &mut HeaderMap) -> Result<(), CacheHeaderError>;
}

/// Ordered list of `(stage, listener)` registrations.
#[derive(Clone, Default)]
pub struct Pipeline {
    registrations: Vec<(Stage, Arc<dyn Listener>)>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard wiring: custom TTL first, then tag stripping, so the
    /// post-handle stage restores `s-maxage` before removing tags.
    pub fn from_config(config: &CacheHeadersConfig) -> Result<Self, InvalidHeaderName> {
        let mut pipeline = Self::new().subscribe(CustomTtlRewriter::new(config.custom_ttl()?));

        if config.strip_tags_header {
            pipeline = pipeline.subscribe(TagHeaderStripper::new(config.tags_header_name()?));
        }

        Ok(pipeline)
    }

    /// Register a listener for every stage it declares.
    pub fn subscribe<L: Listener + 'static>(self, listener: L) -> Self {
        self.subscribe_shared(Arc::new(listener))
    }

    pub fn subscribe_shared(mut self, listener: Arc<dyn Listener>) -> Self {
        for stage in listener.stages() {
            self.registrations.push((*stage, listener.clone()));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run every listener registered for `stage`.
    ///
    /// Errors are logged and collected; they never stop later listeners.
    pub fn dispatch(&self, stage: Stage, headers: &mut HeaderMap) -> Vec<CacheHeaderError> {
        let mut errors = Vec::new();

        for (registered, listener) in &self.registrations {
            if *registered != stage {
                continue;
            }
            if let Err(e) = listener.handle(stage, headers) {
                tracing::warn!(stage = %stage, error = %e, "Cache header listener failed");
                errors.push(e);
            }
        }

        errors
    }

    /// Early hook: call before the response is handed to the cache.
    pub fn on_pre_store<B>(&self, response: &mut Response<B>) -> Vec<CacheHeaderError> {
        self.dispatch(Stage::PreStore, response.headers_mut())
    }

    /// Late hook: call just before the response is sent to the client.
    pub fn on_post_handle<B>(&self, response: &mut Response<B>) -> Vec<CacheHeaderError> {
        self.dispatch(Stage::PostHandle, response.headers_mut())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.registrations.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::CACHE_CONTROL, HeaderValue};
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        stages: &'static [Stage],
        log: Arc<Mutex<Vec<(Stage, &'static str)>>>,
        fail: bool,
    }

    impl Listener for Recorder {
        fn stages(&self) -> &'static [Stage] {
            self.stages
        }

        fn handle(&self, stage: Stage, _headers: &mut HeaderMap) -> Result<(), CacheHeaderError> {
            self.log.lock().unwrap().push((stage, self.name));
            if self.fail {
                return Err(CacheHeaderError::InvalidHeaderValue {
                    header: self.name.to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .subscribe(Recorder {
                name: "first",
                stages: &[Stage::PreStore, Stage::PostHandle],
                log: log.clone(),
                fail: false,
            })
            .subscribe(Recorder {
                name: "second",
                stages: &[Stage::PostHandle],
                log: log.clone(),
                fail: false,
            });
        assert_eq!(pipeline.len(), 3);

        let mut headers = HeaderMap::new();
        pipeline.dispatch(Stage::PreStore, &mut headers);
        pipeline.dispatch(Stage::PostHandle, &mut headers);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (Stage::PreStore, "first"),
                (Stage::PostHandle, "first"),
                (Stage::PostHandle, "second"),
            ]
        );
    }

    #[test]
    fn test_errors_do_not_stop_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .subscribe(Recorder {
                name: "broken",
                stages: &[Stage::PostHandle],
                log: log.clone(),
                fail: true,
            })
            .subscribe(Recorder {
                name: "after",
                stages: &[Stage::PostHandle],
                log: log.clone(),
                fail: false,
            });

        let errors = pipeline.dispatch(Stage::PostHandle, &mut HeaderMap::new());

        assert_eq!(errors.len(), 1);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_from_config_round_trip() {
        let pipeline = Pipeline::from_config(&CacheHeadersConfig::default()).unwrap();
        assert_eq!(pipeline.len(), 3);

        let mut response = Response::new(());
        let headers = response.headers_mut();
        headers.insert("x-reverse-proxy-ttl", HeaderValue::from_static("120"));
        headers.insert("x-cache-tags", HeaderValue::from_static("post-1,user-2"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("s-maxage=60, max-age=30"));

        assert!(pipeline.on_pre_store(&mut response).is_empty());
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            "s-maxage=120, max-age=30"
        );
        assert!(response.headers().contains_key("x-cache-tags"));

        assert!(pipeline.on_post_handle(&mut response).is_empty());
        let headers = response.headers();
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "s-maxage=60, max-age=30");
        assert!(!headers.contains_key("x-cache-tags"));
        assert!(!headers.contains_key("x-reverse-proxy-ttl"));
        assert!(!headers.contains_key("x-cache-ttl-smaxage-backup"));
    }

    #[test]
    fn test_from_config_without_tag_stripping() {
        let config = CacheHeadersConfig {
            strip_tags_header: false,
            ..CacheHeadersConfig::default()
        };
        let pipeline = Pipeline::from_config(&config).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-cache-tags", HeaderValue::from_static("a"));
        pipeline.dispatch(Stage::PostHandle, &mut headers);

        assert!(headers.contains_key("x-cache-tags"));
    }

    #[test]
    fn test_from_config_rejects_bad_header_name() {
        let config = CacheHeadersConfig {
            tags_header: "bad header".into(),
            ..CacheHeadersConfig::default()
        };
        assert!(Pipeline::from_config(&config).is_err());
    }
}

//! Observability subsystem.
//!
//! Listeners emit `tracing` events (`debug` on TTL override/restore, `warn`
//! on listener failures, `trace` on tag removal); `logging.rs` installs the
//! subscriber that prints them.

pub mod logging;

pub use logging::init_logging;

//! Cross-cutting handlers.
//!
//! # Default Chain
//! ```text
//! ExceptionHandler   (outermost: errors → structured responses)
//!     → LoggerHandler  (outcome, latency, metrics)
//!     → [user handlers, e.g. CorsHandler]
//!     → terminal dispatch
//! ```

pub mod cors;
pub mod exception;
pub mod logging;

pub use cors::{CorsHandler, CORS_HANDLER};
pub use exception::{ExceptionHandler, EXCEPTION_HANDLER};
pub use logging::{LoggerHandler, LOGGER_HANDLER};

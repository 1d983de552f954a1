//! Error taxonomy for registration, dispatch and startup.
//!
//! # Design Decisions
//! - Registration faults (`RouteError`) are detected before any listener binds
//! - Request faults (`DispatchError`) carry their HTTP status
//! - Startup faults (`StartupError`) abort bootstrap entirely

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Boxed error produced by application targets and startup hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering routes or initializing handlers.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Pattern text could not be parsed.
    #[error("Invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route with the same method and normalized pattern already exists.
    #[error("Duplicate route {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },

    /// Some concrete path would match both routes with equal precedence.
    #[error("Route {method} {pattern} is ambiguous with {other}")]
    AmbiguousRoute {
        method: Method,
        pattern: String,
        other: String,
    },

    /// A `PathVariable` binding names a variable the pattern does not declare.
    #[error("Route {method} {pattern} binds path variable `{name}` which the pattern does not declare")]
    MissingVariable {
        method: Method,
        pattern: String,
        name: String,
    },
}

/// Errors raised while a request travels through the handler chain.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route matched the request method and path.
    #[error("CAN'T {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// The matched route did not capture a variable its bindings require.
    #[error("Path variable `{0}` was not captured by the matched route")]
    MissingVariable(String),

    /// Query string or body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// A handler or the invoked target failed.
    #[error("Handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl DispatchError {
    /// Wrap any error raised by a handler or target.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        DispatchError::Handler(err.into())
    }

    /// HTTP status this error translates to.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::MissingVariable(_) | DispatchError::Handler(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors that abort server bootstrap.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Route registration failed: {0}")]
    Route(#[from] RouteError),

    /// A startup hook (e.g. a database connection) failed.
    #[error("Startup hook `{name}` failed: {source}")]
    Hook {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(#[source] std::io::Error),

    #[error("Invalid CORS header value: {0}")]
    Cors(#[from] axum::http::header::InvalidHeaderValue),

    #[error("Server stopped with error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DispatchError::RouteNotFound {
            method: Method::DELETE,
            path: "/nope".into(),
        };
        assert_eq!(err.to_string(), "CAN'T DELETE /nope");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_handler_error_keeps_cause() {
        let err = DispatchError::handler("boom");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Rester: a small HTTP service framework.
//!
//! Routes with path variables, a pluggable handler chain with an explicit
//! continuation, declarative parameter binding, CORS and error translation.

pub mod app;
pub mod binding;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use app::{Controller, Rester, Running};
pub use binding::{Arg, ParamBinding};
pub use config::ResterConfig;
pub use error::{BoxError, DispatchError, RouteError, StartupError};
pub use handlers::{CorsHandler, ExceptionHandler, LoggerHandler};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Handler, HandlerId, HandlerPool, HandlerResult, Next, RequestContext};
pub use routing::{RegisterMode, RouteDefinition};

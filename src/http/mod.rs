//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → HandlerPool::process (route, chain, dispatch)
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ResterConfig.addresses
//!     → tls.rs (load certificate once if any address is https)
//!     → listener.rs (bind each address)
//!     → Hand off to one HttpServer instance per address
//! ```

pub mod listener;
pub mod tls;

pub use listener::{bind_all, BoundAddress, BoundListener};

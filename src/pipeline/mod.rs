//! Request dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! Transport request
//!     → pool.rs (create RequestContext, resolve route)
//!     → chain = dedup(global handlers ++ route handlers)
//!     → handler[0] → next → handler[1] → ... → dispatch.rs
//!     → dispatch.rs (bind arguments, invoke target, JSON reply)
//!     → reply.rs (render, apply response head)
//! ```
//!
//! # Design Decisions
//! - Chain order is the configured order; exception translation goes first
//! - Any handler may short-circuit by not calling `next`
//! - Cancellation is checked before every step

pub mod context;
pub mod dispatch;
pub mod handler;
pub mod pool;
pub mod reply;

pub use context::{CancelSignal, RequestContext, RequestHead, ResponseHandle};
pub use handler::{Handler, HandlerId, HandlerResult, HandlerSetup, Next};
pub use pool::HandlerPool;
pub use reply::{Reply, ReplyBody};

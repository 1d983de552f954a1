//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     RouteDefinition (method, pattern text, bindings, handlers, target)
//!     → pattern.rs (parse into literal/variable segments)
//!     → route.rs (validate bindings against the pattern)
//!     → router.rs (reject duplicates and ambiguous overlaps, store)
//!     → Freeze as Arc<RouteRegistry>
//!
//! Incoming Request (method, path):
//!     → router.rs (scan routes of the method, compare segment by segment)
//!     → Return: RouteMatch { route, variables } or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: literal segments outrank variables

pub mod pattern;
pub mod route;
pub mod router;

pub use pattern::{RoutePattern, Segment};
pub use route::{Route, RouteDefinition, Target};
pub use router::{RegisterMode, RouteMatch, RouteRegistry};

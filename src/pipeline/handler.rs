//! Handler contract and the continuation passed between handlers.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::{DispatchError, RouteError};
use crate::pipeline::context::RequestContext;
use crate::pipeline::dispatch::dispatch;
use crate::pipeline::reply::Reply;
use crate::routing::RouteRegistry;

/// Outcome of a handler or of the terminal step.
pub type HandlerResult = Result<Reply, DispatchError>;

/// Static identity of a handler; chains are deduplicated by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(&'static str);

impl HandlerId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A cross-cutting step in the request pipeline.
///
/// Handlers are created once at startup and shared by every request; any
/// configuration they carry is read-only afterwards. A handler may call
/// `next` and transform its result, return without calling it, or fail.
pub trait Handler: Send + Sync + 'static {
    fn id(&self) -> HandlerId;

    /// One-time initialization after all routes are registered.
    fn init(&self, setup: &mut HandlerSetup<'_>) -> Result<(), RouteError> {
        let _ = setup;
        Ok(())
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// Startup view handed to [`Handler::init`].
pub struct HandlerSetup<'r> {
    registry: &'r mut RouteRegistry,
    global: &'r [HandlerId],
}

impl<'r> HandlerSetup<'r> {
    pub(crate) fn new(registry: &'r mut RouteRegistry, global: &'r [HandlerId]) -> Self {
        Self { registry, global }
    }

    pub fn registry(&mut self) -> &mut RouteRegistry {
        self.registry
    }

    /// Whether `id` is part of the global handler list.
    pub fn is_global(&self, id: HandlerId) -> bool {
        self.global.contains(&id)
    }
}

/// Continuation invoking the rest of the chain.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Handler>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Handler>]) -> Self {
        Self { chain }
    }

    /// Run the next handler, or terminal dispatch when none remain.
    pub fn run<'c>(self, ctx: &'c mut RequestContext) -> BoxFuture<'c, HandlerResult>
    where
        'a: 'c,
    {
        Box::pin(async move {
            ctx.check_cancelled()?;
            match self.chain.split_first() {
                Some((handler, rest)) => {
                    tracing::trace!(handler = %handler.id(), "Entering handler");
                    handler.handle(ctx, Next { chain: rest }).await
                }
                None => dispatch(ctx).await,
            }
        })
    }
}

/// Deduplicate handlers by identity, keeping the first occurrence.
pub fn dedup_handlers<'h>(
    handlers: impl IntoIterator<Item = &'h Arc<dyn Handler>>,
) -> Vec<Arc<dyn Handler>> {
    let mut chain: Vec<Arc<dyn Handler>> = Vec::new();
    for handler in handlers {
        if !chain.iter().any(|h| h.id() == handler.id()) {
            chain.push(handler.clone());
        }
    }
    chain
}

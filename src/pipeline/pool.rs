//! Handler pool: per-request chain construction and execution.
//!
//! # Responsibilities
//! - Create one `RequestContext` per inbound request
//! - Resolve the route before the chain runs
//! - Build the chain from global and route-declared handlers
//! - Guarantee that no error escapes to the transport

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::pipeline::context::{cancel_pair, RequestContext};
use crate::pipeline::handler::{dedup_handlers, Handler, HandlerResult, Next};
use crate::pipeline::reply::Reply;
use crate::routing::{Route, RouteRegistry};

/// Shared entry point of every server instance.
pub struct HandlerPool {
    registry: Arc<RouteRegistry>,
    handlers: Vec<Arc<dyn Handler>>,
    body_limit: usize,
}

impl HandlerPool {
    pub fn new(
        registry: RouteRegistry,
        handlers: Vec<Arc<dyn Handler>>,
        body_limit: usize,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            handlers: dedup_handlers(&handlers),
            body_limit,
        }
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Global handlers in execution order.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Global handlers first, then route extras, deduplicated by identity.
    pub fn chain_for(&self, route: Option<&Route>) -> Vec<Arc<dyn Handler>> {
        let extras = route.map(Route::handlers).unwrap_or_default();
        dedup_handlers(self.handlers.iter().chain(extras))
    }

    /// Process one request end to end.
    pub async fn process(&self, request: Request<Body>) -> Response {
        let (trigger, signal) = cancel_pair();
        let guard = trigger.on_drop();
        let mut ctx = RequestContext::new(request, self.body_limit, signal);

        let result = self.execute(&mut ctx).await;
        guard.disarm();

        let reply = result.unwrap_or_else(|err| {
            tracing::error!(
                method = %ctx.method(),
                path = %ctx.path(),
                error = %err,
                "Error escaped the handler chain"
            );
            Reply::from_error(&err)
        });
        reply.finalize(ctx.response().snapshot())
    }

    /// Resolve the route and run the chain against an existing context.
    pub async fn execute(&self, ctx: &mut RequestContext) -> HandlerResult {
        if let Some(matched) = self.registry.find(ctx.method(), ctx.path()) {
            ctx.resolve(matched);
        }
        let chain = self.chain_for(ctx.route().map(Arc::as_ref));
        Next::new(&chain).run(ctx).await
    }
}

impl std::fmt::Debug for HandlerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerPool")
            .field("routes", &self.registry.len())
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.id()).collect::<Vec<_>>(),
            )
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

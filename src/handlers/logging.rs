//! Request logging handler.

use std::time::Instant;

use futures_util::future::BoxFuture;

use crate::observability::metrics;
use crate::pipeline::{Handler, HandlerId, HandlerResult, Next, RequestContext};

pub const LOGGER_HANDLER: HandlerId = HandlerId::new("logger");

/// Logs every request with its outcome and latency, and records metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerHandler;

impl Handler for LoggerHandler {
    fn id(&self) -> HandlerId {
        LOGGER_HANDLER
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.method().clone();
            let path = ctx.path().to_string();
            let route = ctx
                .route()
                .map(|r| r.pattern().to_string())
                .unwrap_or_else(|| "none".to_string());
            let request_id = ctx.header("x-request-id").unwrap_or("unknown").to_string();

            let result = next.run(ctx).await;

            let status = match &result {
                Ok(reply) => reply.status,
                Err(err) => err.status(),
            };
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route = %route,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
            metrics::record_request(method.as_str(), status.as_u16(), &route, start);

            result
        })
    }
}

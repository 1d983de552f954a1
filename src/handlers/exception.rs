//! Exception translation handler.
//!
//! Outermost handler of the default chain: converts every error raised
//! downstream into a structured response.

use futures_util::future::BoxFuture;

use crate::error::DispatchError;
use crate::pipeline::{Handler, HandlerId, HandlerResult, Next, Reply, RequestContext};

pub const EXCEPTION_HANDLER: HandlerId = HandlerId::new("exception");

#[derive(Debug, Default, Clone, Copy)]
pub struct ExceptionHandler;

impl Handler for ExceptionHandler {
    fn id(&self) -> HandlerId {
        EXCEPTION_HANDLER
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let method = ctx.method().clone();
            let path = ctx.path().to_string();

            match next.run(ctx).await {
                Ok(reply) => Ok(reply),
                Err(err) => {
                    match &err {
                        DispatchError::RouteNotFound { .. } => {
                            tracing::debug!(method = %method, path = %path, "No route matched");
                        }
                        DispatchError::BadRequest(reason) => {
                            tracing::debug!(
                                method = %method,
                                path = %path,
                                reason = %reason,
                                "Bad request"
                            );
                        }
                        DispatchError::Cancelled => {
                            tracing::debug!(method = %method, path = %path, "Request cancelled");
                        }
                        DispatchError::MissingVariable(_) | DispatchError::Handler(_) => {
                            tracing::error!(
                                method = %method,
                                path = %path,
                                error = %err,
                                cause = ?std::error::Error::source(&err),
                                "Request failed"
                            );
                        }
                    }
                    Ok(Reply::from_error(&err))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::test_context;
    use crate::pipeline::HandlerPool;
    use crate::routing::{RouteDefinition, RouteRegistry};
    use crate::error::BoxError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;

    fn pool() -> HandlerPool {
        let mut registry = RouteRegistry::new();
        registry
            .register(RouteDefinition::get("/explode").target(|_| async move {
                Err::<(), BoxError>("database unavailable".into())
            }))
            .unwrap();
        HandlerPool::new(registry, vec![Arc::new(ExceptionHandler)], 1024)
    }

    #[tokio::test]
    async fn test_target_failure_becomes_500() {
        let reply = pool()
            .execute(&mut test_context(
                Request::get("/explode").body(Body::empty()).unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            reply.body,
            crate::pipeline::ReplyBody::Text("Handler failed: database unavailable".into())
        );
    }

    #[tokio::test]
    async fn test_unknown_route_becomes_404() {
        let reply = pool()
            .execute(&mut test_context(
                Request::delete("/nope").body(Body::empty()).unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(
            reply.body,
            crate::pipeline::ReplyBody::Text("CAN'T DELETE /nope".into())
        );
    }
}

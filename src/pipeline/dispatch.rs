//! Terminal dispatch: the innermost step of every chain.

use axum::http::StatusCode;

use crate::binding::bind;
use crate::error::DispatchError;
use crate::pipeline::context::RequestContext;
use crate::pipeline::handler::HandlerResult;
use crate::pipeline::reply::Reply;

/// Invoke the target of the resolved route.
///
/// Routes without a target (synthetic companions) complete with an empty
/// `204 No Content`. The target races the request's cancellation signal.
pub(crate) async fn dispatch(ctx: &mut RequestContext) -> HandlerResult {
    let route = match ctx.route() {
        Some(route) => route.clone(),
        None => {
            return Err(DispatchError::RouteNotFound {
                method: ctx.method().clone(),
                path: ctx.path().to_string(),
            })
        }
    };

    let Some(target) = route.target() else {
        tracing::trace!(pattern = %route.pattern(), "Route has no target");
        return Ok(Reply::empty(StatusCode::NO_CONTENT));
    };

    let args = bind(route.bindings(), ctx).await?;
    ctx.set_args(args.clone());
    ctx.check_cancelled()?;

    let mut cancel = ctx.cancel_signal().clone();
    let value = tokio::select! {
        result = target.call(args) => result.map_err(DispatchError::Handler)?,
        _ = cancel.cancelled() => {
            tracing::debug!(pattern = %route.pattern(), "Target aborted by cancellation");
            return Err(DispatchError::Cancelled);
        }
    };

    let status = ctx.response().status().unwrap_or(StatusCode::OK);
    Ok(Reply::json(status, value))
}

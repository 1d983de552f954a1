//! Parameter binding subsystem.
//!
//! # Data Flow
//! ```text
//! Route bindings [ParamBinding; n]
//!     + RequestContext (head, variables, query, body)
//!     → bind()
//!     → [Arg; n] in declaration order
//!     → target(args)
//! ```
//!
//! # Design Decisions
//! - Binding lists are declared per route and validated at registration
//! - The body is read at most once and cached on the context
//! - Binding only reads the context; it never writes the response

pub mod body;
pub mod query;

use crate::error::DispatchError;
use crate::pipeline::context::{CancelSignal, RequestContext, RequestHead, ResponseHandle};

pub use body::RequestBody;
pub use query::QueryMap;

/// How one argument of a target is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// The request head (method, URI, headers).
    Request,
    /// A handle to the response head.
    Response,
    /// Value of a named path variable.
    PathVariable(String),
    /// Decoded query string.
    PathQuery,
    /// Decoded request body.
    RequestBody,
    /// Header value, looked up case-insensitively.
    Header(String),
    /// The request's cancellation signal, for work that outlives the target call.
    Cancel,
}

impl ParamBinding {
    pub fn path_variable(name: impl Into<String>) -> Self {
        ParamBinding::PathVariable(name.into())
    }

    pub fn header(name: impl Into<String>) -> Self {
        ParamBinding::Header(name.into())
    }
}

/// A bound argument handed to a target.
#[derive(Debug, Clone)]
pub enum Arg {
    Request(RequestHead),
    Response(ResponseHandle),
    /// Path variable (always present) or header (absent when not sent).
    Text(Option<String>),
    Query(QueryMap),
    Body(RequestBody),
    Cancel(CancelSignal),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => text.as_deref(),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&QueryMap> {
        match self {
            Arg::Query(query) => Some(query),
            _ => None,
        }
    }

    pub fn as_body(&self) -> Option<&RequestBody> {
        match self {
            Arg::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&RequestHead> {
        match self {
            Arg::Request(head) => Some(head),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&ResponseHandle> {
        match self {
            Arg::Response(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn as_cancel(&self) -> Option<&CancelSignal> {
        match self {
            Arg::Cancel(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Produce the argument list for `bindings`, one entry per binding.
pub async fn bind(
    bindings: &[ParamBinding],
    ctx: &mut RequestContext,
) -> Result<Vec<Arg>, DispatchError> {
    let mut args = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let arg = match binding {
            ParamBinding::Request => Arg::Request(ctx.head().clone()),
            ParamBinding::Response => Arg::Response(ctx.response().clone()),
            ParamBinding::PathVariable(name) => {
                let value = ctx
                    .variable(name)
                    .ok_or_else(|| DispatchError::MissingVariable(name.clone()))?;
                Arg::Text(Some(value.to_string()))
            }
            ParamBinding::PathQuery => {
                Arg::Query(QueryMap::parse(ctx.uri().query().unwrap_or_default()))
            }
            ParamBinding::RequestBody => Arg::Body(ctx.body().await?.clone()),
            ParamBinding::Header(name) => Arg::Text(ctx.header(name).map(str::to_string)),
            ParamBinding::Cancel => Arg::Cancel(ctx.cancel_signal().clone()),
        };
        args.push(arg);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::test_context;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_bind_preserves_declaration_order() {
        let request = Request::post("/user/42/post/7?page=3")
            .header("X-Token", "secret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"title":"hi"}"#))
            .unwrap();
        let mut ctx = test_context(request);
        ctx.set_variables(HashMap::from([
            ("id".to_string(), "42".to_string()),
            ("postId".to_string(), "7".to_string()),
        ]));

        let bindings = vec![
            ParamBinding::path_variable("postId"),
            ParamBinding::header("x-token"),
            ParamBinding::PathQuery,
            ParamBinding::path_variable("id"),
            ParamBinding::RequestBody,
            ParamBinding::header("x-missing"),
            ParamBinding::Request,
            ParamBinding::Response,
        ];
        let args = bind(&bindings, &mut ctx).await.unwrap();

        assert_eq!(args.len(), bindings.len());
        assert_eq!(args[0].as_str(), Some("7"));
        assert_eq!(args[1].as_str(), Some("secret"));
        assert_eq!(args[2].as_query().and_then(|q| q.get("page")), Some("3"));
        assert_eq!(args[3].as_str(), Some("42"));
        assert_eq!(
            args[4].as_body().and_then(RequestBody::as_json),
            Some(&json!({ "title": "hi" }))
        );
        assert_eq!(args[5].as_str(), None);
        assert_eq!(args[6].as_request().map(|h| h.uri.path()), Some("/user/42/post/7"));
        assert!(args[7].as_response().is_some());
    }

    #[tokio::test]
    async fn test_cancel_binding_shares_request_signal() {
        let (trigger, signal) = crate::pipeline::context::cancel_pair();
        let mut ctx = RequestContext::new(
            Request::get("/a").body(Body::empty()).unwrap(),
            1024,
            signal,
        );
        let args = bind(&[ParamBinding::Cancel], &mut ctx).await.unwrap();
        let bound = args[0].as_cancel().unwrap();
        assert!(!bound.is_cancelled());

        trigger.cancel();
        assert!(bound.is_cancelled());
    }

    #[tokio::test]
    async fn test_missing_variable() {
        let mut ctx = test_context(Request::get("/a").body(Body::empty()).unwrap());
        let err = bind(&[ParamBinding::path_variable("x")], &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingVariable(ref name) if name == "x"));
    }

    #[tokio::test]
    async fn test_body_read_once() {
        let request = Request::post("/a")
            .header("content-type", "text/plain")
            .body(Body::from("payload"))
            .unwrap();
        let mut ctx = test_context(request);
        let bindings = [ParamBinding::RequestBody, ParamBinding::RequestBody];
        let args = bind(&bindings, &mut ctx).await.unwrap();
        assert_eq!(args[0].as_body().and_then(RequestBody::as_text), Some("payload"));
        assert_eq!(args[1].as_body().and_then(RequestBody::as_text), Some("payload"));
    }
}

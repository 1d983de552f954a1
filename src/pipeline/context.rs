//! Per-request state threaded through the handler chain.
//!
//! # Responsibilities
//! - Hold the request head and a lazily read body
//! - Share a mutable response head between handlers and targets
//! - Record the resolved route, its variables and the bound arguments
//! - Carry the cancellation signal for the request
//!
//! # Design Decisions
//! - Exactly one context per request, owned by the pool invocation
//! - Handlers borrow the context mutably; they never own it

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri};
use tokio::sync::watch;

use crate::binding::{Arg, RequestBody};
use crate::error::DispatchError;
use crate::routing::router::RouteMatch;
use crate::routing::Route;

/// Snapshot of the request line and headers.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Status and headers accumulated for the response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

/// Shared handle to the response head of one request.
///
/// Cloned into targets bound with `ParamBinding::Response`; writes are
/// visible to the pool when it finalizes the response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    inner: Arc<Mutex<ResponseHead>>,
}

impl ResponseHandle {
    fn lock(&self) -> MutexGuard<'_, ResponseHead> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    pub fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.lock().headers.get(name).cloned()
    }

    pub fn set_status(&self, status: StatusCode) {
        self.lock().status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.lock().status
    }

    pub(crate) fn snapshot(&self) -> ResponseHead {
        self.lock().clone()
    }
}

/// Fires the cancellation signal of a request.
#[derive(Debug)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

impl CancelTrigger {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Guard that cancels when dropped unless disarmed first.
    pub fn on_drop(self) -> CancelGuard {
        CancelGuard {
            trigger: Some(self),
        }
    }
}

/// Cancels the request if the owning future is dropped before completion.
///
/// The chain itself is gone by then; the signal reaches work a target
/// detached from it, through `ParamBinding::Cancel`.
#[derive(Debug)]
pub struct CancelGuard {
    trigger: Option<CancelTrigger>,
}

impl CancelGuard {
    pub fn disarm(mut self) {
        self.trigger = None;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            tracing::debug!("Request dropped before completion, cancelling");
            trigger.cancel();
        }
    }
}

/// Observes whether a request has been cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the request is cancelled; pends forever otherwise.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Trigger dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a connected trigger/signal pair.
pub fn cancel_pair() -> (CancelTrigger, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelTrigger { tx }, CancelSignal { rx })
}

/// Mutable state for a single request.
#[derive(Debug)]
pub struct RequestContext {
    head: RequestHead,
    raw_body: Option<Body>,
    decoded_body: Option<RequestBody>,
    body_limit: usize,
    response: ResponseHandle,
    route: Option<Arc<Route>>,
    variables: HashMap<String, String>,
    args: Vec<Arg>,
    cancel: CancelSignal,
}

impl RequestContext {
    pub fn new(request: Request<Body>, body_limit: usize, cancel: CancelSignal) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            head: RequestHead {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
            },
            raw_body: Some(body),
            decoded_body: None,
            body_limit,
            response: ResponseHandle::default(),
            route: None,
            variables: HashMap::new(),
            args: Vec::new(),
            cancel,
        }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Case-insensitive header lookup; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head
            .headers
            .get(name.to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.head
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }

    /// Route resolved for this request, if any.
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// Arguments bound for the target (empty until terminal dispatch).
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn check_cancelled(&self) -> Result<(), DispatchError> {
        if self.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        Ok(())
    }

    /// Read and decode the body on first use; later calls return the cached value.
    pub async fn body(&mut self) -> Result<&RequestBody, DispatchError> {
        if self.decoded_body.is_none() {
            let content_type = self.content_type().map(str::to_string);
            let raw = self.raw_body.take().unwrap_or_default();
            let bytes = axum::body::to_bytes(raw, self.body_limit)
                .await
                .map_err(|e| DispatchError::BadRequest(format!("unable to read body: {}", e)))?;
            let decoded = RequestBody::decode(content_type.as_deref(), bytes)?;
            self.decoded_body = Some(decoded);
        }
        Ok(self.decoded_body.get_or_insert(RequestBody::Empty))
    }

    pub(crate) fn resolve(&mut self, matched: RouteMatch) {
        self.route = Some(matched.route);
        self.variables = matched.variables;
    }

    pub(crate) fn set_variables(&mut self, variables: HashMap<String, String>) {
        self.variables = variables;
    }

    pub(crate) fn set_args(&mut self, args: Vec<Arg>) {
        self.args = args;
    }
}

#[cfg(test)]
pub(crate) fn test_context(request: Request<Body>) -> RequestContext {
    let (_trigger, signal) = cancel_pair();
    RequestContext::new(request, 1024 * 1024, signal)
}

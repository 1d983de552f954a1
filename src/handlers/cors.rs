//! CORS handler.
//!
//! # Responsibilities
//! - At startup, add an `OPTIONS` companion route for every CORS-enabled path
//! - Per request, attach the configured `Access-Control-*` headers
//!
//! # Design Decisions
//! - CORS is enabled for a route when the handler is global or appears in the
//!   route's handler list (controller handlers are merged into that list)
//! - One companion per normalized pattern, whatever the number of methods
//! - An explicitly registered `OPTIONS` route is never replaced
//! - Companions have no target, so preflights never reach application code
//! - Companions may overlap each other; the registry resolves such paths
//!   deterministically, so every eligible route keeps its preflight

use std::collections::HashSet;

use axum::http::header::{
    InvalidHeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderName, HeaderValue, Method};
use futures_util::future::BoxFuture;

use crate::config::CorsConfig;
use crate::error::RouteError;
use crate::pipeline::{Handler, HandlerId, HandlerResult, HandlerSetup, Next, RequestContext};
use crate::routing::{RegisterMode, Route};

pub const CORS_HANDLER: HandlerId = HandlerId::new("cors");

/// Sets CORS response headers and synthesizes preflight routes.
#[derive(Debug, Clone)]
pub struct CorsHandler {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl CorsHandler {
    pub fn new(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            headers: vec![
                (
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_str(&config.allow_origin)?,
                ),
                (
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_str(&config.allow_methods)?,
                ),
                (
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_str(&config.allow_headers)?,
                ),
                (ACCESS_CONTROL_MAX_AGE, HeaderValue::from(config.max_age)),
            ],
        })
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

impl Default for CorsHandler {
    fn default() -> Self {
        Self {
            headers: vec![
                (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
                (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("*")),
                (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*")),
                (ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400")),
            ],
        }
    }
}

impl Handler for CorsHandler {
    fn id(&self) -> HandlerId {
        CORS_HANDLER
    }

    fn init(&self, setup: &mut HandlerSetup<'_>) -> Result<(), RouteError> {
        let global = setup.is_global(CORS_HANDLER);
        let registry = setup.registry();

        let mut seen = HashSet::new();
        let companions: Vec<Route> = registry
            .routes()
            .iter()
            .filter(|route| route.method() != Method::OPTIONS)
            .filter(|route| global || route.has_handler(CORS_HANDLER))
            .filter(|route| seen.insert(route.pattern().normalized()))
            .filter(|route| !registry.contains(&Method::OPTIONS, &route.pattern().normalized()))
            .map(|route| Route::synthetic(Method::OPTIONS, route))
            .collect();

        let added = companions.len();
        for route in companions {
            registry.insert(route, RegisterMode::Reject)?;
        }

        tracing::info!(routes = added, global, "CORS preflight routes registered");
        Ok(())
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            for (name, value) in &self.headers {
                ctx.response().set_header(name.clone(), value.clone());
            }
            next.run(ctx).await
        })
    }
}

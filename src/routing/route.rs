//! Route definitions and application targets.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::binding::{Arg, ParamBinding};
use crate::error::BoxError;
use crate::pipeline::handler::{Handler, HandlerId};
use crate::routing::pattern::RoutePattern;

/// Future returned by an application target.
pub type TargetFuture = BoxFuture<'static, Result<Value, BoxError>>;

/// Callable application method resolved by a route.
///
/// The result is serialized to JSON as soon as the target completes.
#[derive(Clone)]
pub struct Target(Arc<dyn Fn(Vec<Arg>) -> TargetFuture + Send + Sync>);

impl Target {
    pub fn new<F, Fut, T>(f: F) -> Self
    where
        F: Fn(Vec<Arg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
        T: Serialize,
    {
        Self(Arc::new(move |args| {
            let fut = f(args);
            Box::pin(async move {
                let output = fut.await?;
                Ok(serde_json::to_value(output)?)
            })
        }))
    }

    /// Invoke the target with a bound argument list.
    pub fn call(&self, args: Vec<Arg>) -> TargetFuture {
        (self.0)(args)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Target(..)")
    }
}

/// A registered route. Immutable once stored in the registry.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: RoutePattern,
    handlers: Vec<Arc<dyn Handler>>,
    bindings: Vec<ParamBinding>,
    target: Option<Target>,
    synthetic: bool,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Route-specific handlers, in declaration order.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// `None` for synthetic routes whose terminal step is a no-op.
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Whether the route was added by a handler at startup rather than declared.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn has_handler(&self, id: HandlerId) -> bool {
        self.handlers.iter().any(|h| h.id() == id)
    }

    /// Companion route at the same pattern with no target.
    pub(crate) fn synthetic(method: Method, source: &Route) -> Self {
        Self {
            method,
            pattern: source.pattern.clone(),
            handlers: source.handlers.clone(),
            bindings: Vec::new(),
            target: None,
            synthetic: true,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.id()).collect::<Vec<_>>(),
            )
            .field("bindings", &self.bindings)
            .field("target", &self.target.is_some())
            .field("synthetic", &self.synthetic)
            .finish()
    }
}

/// Declarative description of a route, turned into a [`Route`] at registration.
#[derive(Clone)]
pub struct RouteDefinition {
    pub(crate) method: Method,
    pub(crate) pattern: String,
    pub(crate) handlers: Vec<Arc<dyn Handler>>,
    pub(crate) bindings: Vec<ParamBinding>,
    pub(crate) target: Option<Target>,
}

impl RouteDefinition {
    pub fn new(method: Method, pattern: impl Into<String>) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handlers: Vec::new(),
            bindings: Vec::new(),
            target: None,
        }
    }

    pub fn get(pattern: impl Into<String>) -> Self {
        Self::new(Method::GET, pattern)
    }

    pub fn post(pattern: impl Into<String>) -> Self {
        Self::new(Method::POST, pattern)
    }

    pub fn put(pattern: impl Into<String>) -> Self {
        Self::new(Method::PUT, pattern)
    }

    pub fn delete(pattern: impl Into<String>) -> Self {
        Self::new(Method::DELETE, pattern)
    }

    /// Append the next argument binding of the target.
    pub fn bind(mut self, binding: ParamBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Append a route-specific handler.
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn target<F, Fut, T>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Arg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
        T: Serialize,
    {
        self.target = Some(Target::new(f));
        self
    }

    /// Parse the pattern and validate bindings against it.
    pub(crate) fn build(self) -> Result<Route, crate::error::RouteError> {
        let pattern = RoutePattern::parse(&self.pattern)?;
        for binding in &self.bindings {
            if let ParamBinding::PathVariable(name) = binding {
                if !pattern.has_variable(name) {
                    return Err(crate::error::RouteError::MissingVariable {
                        method: self.method.clone(),
                        pattern: self.pattern.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(Route {
            method: self.method,
            pattern,
            handlers: self.handlers,
            bindings: self.bindings,
            target: self.target,
            synthetic: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;

    #[test]
    fn test_build_validates_path_variables() {
        let err = RouteDefinition::get("/user/{id}")
            .bind(ParamBinding::path_variable("uid"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::MissingVariable { ref name, .. } if name == "uid"));

        let route = RouteDefinition::get("/user/{id}")
            .bind(ParamBinding::path_variable("id"))
            .build()
            .unwrap();
        assert_eq!(route.bindings().len(), 1);
        assert!(route.target().is_none());
    }

    #[tokio::test]
    async fn test_target_serializes_result() {
        let target = Target::new(|args: Vec<Arg>| async move { Ok(args.len()) });
        let value = target.call(vec![Arg::Text(None)]).await.unwrap();
        assert_eq!(value, serde_json::json!(1));
    }
}

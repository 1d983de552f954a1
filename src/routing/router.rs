//! Route registry and lookup.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Reject duplicate and ambiguous registrations
//! - Match a request path and extract path variables
//!
//! # Design Decisions
//! - Built once at startup, then shared via `Arc` without locks
//! - O(n) scan per lookup (acceptable for typical route counts)
//! - Fewest variable segments wins; equal-precedence overlaps between
//!   declared routes are rejected at registration
//! - Synthetic routes may overlap; ties go to declared routes first, then to
//!   the lexically smallest normalized pattern
//! - Explicit `None` rather than a silent default route

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::error::RouteError;
use crate::routing::pattern::{split_path, Segment};
use crate::routing::route::{Route, RouteDefinition};

/// Policy applied when a route with the same method and normalized pattern exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterMode {
    /// Fail with [`RouteError::DuplicateRoute`].
    #[default]
    Reject,
    /// Replace the existing route in place.
    Overwrite,
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Extracted path variables keyed by name (percent-decoded).
    pub variables: HashMap<String, String>,
}

/// Holds every registered route.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, rejecting duplicates.
    pub fn register(&mut self, definition: RouteDefinition) -> Result<Arc<Route>, RouteError> {
        self.register_with(definition, RegisterMode::Reject)
    }

    pub fn register_with(
        &mut self,
        definition: RouteDefinition,
        mode: RegisterMode,
    ) -> Result<Arc<Route>, RouteError> {
        let route = definition.build()?;
        self.insert(route, mode)
    }

    /// Store an already-built route.
    pub fn insert(&mut self, route: Route, mode: RegisterMode) -> Result<Arc<Route>, RouteError> {
        let normalized = route.pattern().normalized();
        let existing = self
            .routes
            .iter()
            .position(|r| r.method() == route.method() && r.pattern().normalized() == normalized);

        if existing.is_some() && mode == RegisterMode::Reject {
            return Err(RouteError::DuplicateRoute {
                method: route.method().clone(),
                pattern: route.pattern().to_string(),
            });
        }

        if let Some(other) = self
            .routes
            .iter()
            .enumerate()
            .filter(|(i, r)| Some(*i) != existing && r.method() == route.method())
            .filter(|(_, r)| !r.is_synthetic() && !route.is_synthetic())
            .map(|(_, r)| r)
            .find(|r| r.pattern().overlaps(route.pattern()))
        {
            return Err(RouteError::AmbiguousRoute {
                method: route.method().clone(),
                pattern: route.pattern().to_string(),
                other: other.pattern().to_string(),
            });
        }

        let route = Arc::new(route);
        match existing {
            Some(index) => {
                tracing::debug!(
                    method = %route.method(),
                    pattern = %route.pattern(),
                    "Route overwritten"
                );
                self.routes[index] = route.clone();
            }
            None => {
                tracing::debug!(
                    method = %route.method(),
                    pattern = %route.pattern(),
                    "Route registered"
                );
                self.routes.push(route.clone());
            }
        }
        Ok(route)
    }

    /// Whether a route exists for this method and normalized pattern.
    pub fn contains(&self, method: &Method, normalized: &str) -> bool {
        self.routes
            .iter()
            .any(|r| r.method() == method && r.pattern().normalized() == normalized)
    }

    /// All routes in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the best route for `method` and `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let parts = split_path(path);

        self.routes
            .iter()
            .filter(|route| route.method() == method)
            .filter_map(|route| {
                match_segments(route.pattern().segments(), &parts).map(|variables| RouteMatch {
                    route: route.clone(),
                    variables,
                })
            })
            .min_by_key(|m| precedence(&m.route))
    }
}

/// Lower sorts first.
fn precedence(route: &Route) -> (usize, bool, String) {
    (
        route.pattern().variable_count(),
        route.is_synthetic(),
        route.pattern().normalized(),
    )
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> Option<HashMap<String, String>> {
    if segments.len() != parts.len() {
        return None;
    }

    let mut variables = HashMap::new();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            Segment::Literal(literal) => {
                if literal != part {
                    return None;
                }
            }
            Segment::Variable(name) => {
                if part.is_empty() {
                    return None;
                }
                let value = urlencoding::decode(part)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| part.to_string());
                variables.insert(name.clone(), value);
            }
        }
    }
    Some(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(patterns: &[(&Method, &str)]) -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        for (method, pattern) in patterns {
            registry
                .register(RouteDefinition::new((*method).clone(), *pattern))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_exact_and_absent() {
        let registry = registry(&[(&Method::GET, "/users"), (&Method::GET, "/user/{id}")]);

        let m = registry.find(&Method::GET, "/users").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/users");
        assert!(m.variables.is_empty());

        assert!(registry.find(&Method::GET, "/user").is_none());
        assert!(registry.find(&Method::GET, "/user/1/extra").is_none());
        assert!(registry.find(&Method::GET, "/accounts").is_none());
        assert!(registry.find(&Method::POST, "/users").is_none());
        assert!(registry.find(&Method::GET, "/user/").is_none());
    }

    #[test]
    fn test_variable_extraction() {
        let registry = registry(&[(&Method::GET, "/user/{id}/post/{postId}")]);
        let m = registry.find(&Method::GET, "/user/42/post/7").unwrap();
        assert_eq!(m.variables.get("id").map(String::as_str), Some("42"));
        assert_eq!(m.variables.get("postId").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_variable_is_percent_decoded() {
        let registry = registry(&[(&Method::GET, "/files/{name}")]);
        let m = registry.find(&Method::GET, "/files/a%20b").unwrap();
        assert_eq!(m.variables["name"], "a b");
    }

    #[test]
    fn test_empty_segment_does_not_bind() {
        let registry = registry(&[(&Method::GET, "/a/{x}/b")]);
        assert!(registry.find(&Method::GET, "/a//b").is_none());
    }

    #[test]
    fn test_literal_precedence() {
        let registry = registry(&[(&Method::GET, "/user/{id}"), (&Method::GET, "/user/me")]);

        let m = registry.find(&Method::GET, "/user/me").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/user/me");

        let m = registry.find(&Method::GET, "/user/5").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/user/{id}");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry(&[(&Method::GET, "/user/{id}")]);
        let err = registry
            .register(RouteDefinition::get("/user/{uid}"))
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));

        // Same pattern under another method is fine.
        registry.register(RouteDefinition::post("/user/{id}")).unwrap();
    }

    #[test]
    fn test_overwrite_replaces() {
        let mut registry = registry(&[(&Method::GET, "/user/{id}")]);
        registry
            .register_with(RouteDefinition::get("/user/{uid}"), RegisterMode::Overwrite)
            .unwrap();
        assert_eq!(registry.len(), 1);
        let m = registry.find(&Method::GET, "/user/9").unwrap();
        assert_eq!(m.variables["uid"], "9");
    }

    #[test]
    fn test_ambiguous_rejected() {
        let mut registry = registry(&[(&Method::GET, "/a/{x}")]);
        let err = registry.register(RouteDefinition::get("/{y}/b")).unwrap_err();
        assert!(matches!(err, RouteError::AmbiguousRoute { .. }));
    }

    #[test]
    fn test_synthetic_overlaps_resolve_deterministically() {
        for reverse in [false, true] {
            let mut sources = vec![
                RouteDefinition::get("/a/{x}").build().unwrap(),
                RouteDefinition::post("/{y}/b").build().unwrap(),
            ];
            if reverse {
                sources.reverse();
            }

            let mut registry = RouteRegistry::new();
            for source in &sources {
                registry
                    .insert(Route::synthetic(Method::OPTIONS, source), RegisterMode::Reject)
                    .unwrap();
            }
            assert_eq!(registry.len(), 2);

            let pattern = |path| {
                registry
                    .find(&Method::OPTIONS, path)
                    .map(|m| m.route.pattern().to_string())
            };
            assert_eq!(pattern("/a/1").as_deref(), Some("/a/{x}"));
            assert_eq!(pattern("/q/b").as_deref(), Some("/{y}/b"));
            assert_eq!(pattern("/a/b").as_deref(), Some("/a/{x}"));
        }
    }

    #[test]
    fn test_declared_route_wins_over_synthetic() {
        let mut registry = registry(&[(&Method::OPTIONS, "/{y}/b")]);
        let source = RouteDefinition::get("/a/{x}").build().unwrap();
        registry
            .insert(Route::synthetic(Method::OPTIONS, &source), RegisterMode::Reject)
            .unwrap();

        let m = registry.find(&Method::OPTIONS, "/a/b").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/{y}/b");
        assert!(!m.route.is_synthetic());

        let m = registry.find(&Method::OPTIONS, "/a/c").unwrap();
        assert!(m.route.is_synthetic());
    }

    #[test]
    fn test_round_trip_independent_of_registration_order() {
        let unrelated = ["/b/{y}", "/a/b/c", "/c", "/a"];
        for shift in 0..unrelated.len() {
            let mut registry = RouteRegistry::new();
            let mut order: Vec<&str> = unrelated.to_vec();
            order.rotate_left(shift);
            order.insert(shift % (order.len() + 1), "/a/{x}");
            for pattern in order {
                registry.register(RouteDefinition::get(pattern)).unwrap();
            }
            for _ in 0..3 {
                let m = registry.find(&Method::GET, "/a/7").unwrap();
                assert_eq!(m.route.pattern().as_str(), "/a/{x}");
                assert_eq!(m.variables["x"], "7");
            }
        }
    }

    #[test]
    fn test_root_route() {
        let registry = registry(&[(&Method::GET, "/")]);
        assert!(registry.find(&Method::GET, "/").is_some());
        assert!(registry.find(&Method::GET, "/x").is_none());
    }
}

//! Route pattern parsing.
//!
//! # Responsibilities
//! - Parse pattern text (`/user/{id}`) into literal and variable segments
//! - Split request paths the same way patterns are split
//! - Provide a normalized form for duplicate detection
//!
//! # Design Decisions
//! - `{name}`, `{{name}}` and `{var:name}` are all variable tokens
//! - Leading `/` and a single trailing `/` are insignificant
//! - Variable names are restricted to ASCII alphanumerics and `_`

use std::fmt;

use crate::error::RouteError;

/// A single segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Matches any non-empty request segment and records it under this name.
    Variable(String),
}

impl Segment {
    pub fn is_variable(&self) -> bool {
        matches!(self, Segment::Variable(_))
    }
}

/// Parsed, immutable route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse pattern text.
    pub fn parse(text: &str) -> Result<Self, RouteError> {
        let invalid = |reason: String| RouteError::InvalidPattern {
            pattern: text.to_string(),
            reason,
        };

        if !text.starts_with('/') {
            return Err(invalid("pattern must start with `/`".into()));
        }

        let mut segments = Vec::new();
        for part in split_path(text) {
            if part.is_empty() {
                return Err(invalid("empty path segment".into()));
            }
            let segment = match variable_name(part) {
                Some(name) => {
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        return Err(invalid(format!("invalid variable name `{}`", name)));
                    }
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Variable(n) if n == name))
                    {
                        return Err(invalid(format!("variable `{}` declared twice", name)));
                    }
                    Segment::Variable(name.to_string())
                }
                None if part.contains('{') || part.contains('}') => {
                    return Err(invalid(format!("malformed variable token `{}`", part)));
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: text.to_string(),
            segments,
        })
    }

    /// Pattern text as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of variable segments; lower means more literal.
    pub fn variable_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_variable()).count()
    }

    /// Whether the pattern declares a variable with this name.
    pub fn has_variable(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Variable(n) if n == name))
    }

    /// Pattern with every variable replaced by `{}`.
    ///
    /// `/user/{id}` and `/user/{uid}` share the normalized form `/user/{}`.
    pub fn normalized(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => format!("/{}", l),
                Segment::Variable(_) => "/{}".to_string(),
            })
            .collect()
    }

    /// True when some concrete path could match both patterns with equal precedence.
    pub fn overlaps(&self, other: &RoutePattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.variable_count() == other.variable_count()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a path into segments, ignoring the leading `/` and one trailing `/`.
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

fn variable_name(part: &str) -> Option<&str> {
    let inner = part
        .strip_prefix("{{")
        .and_then(|p| p.strip_suffix("}}"))
        .or_else(|| part.strip_prefix('{').and_then(|p| p.strip_suffix('}')))?;
    Some(inner.strip_prefix("var:").unwrap_or(inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let pattern = RoutePattern::parse("/user/{id}/post/{postId}").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("user".into()),
                Segment::Variable("id".into()),
                Segment::Literal("post".into()),
                Segment::Variable("postId".into()),
            ]
        );
        assert_eq!(pattern.variable_count(), 2);
        assert_eq!(pattern.normalized(), "/user/{}/post/{}");
    }

    #[test]
    fn test_token_forms() {
        for text in ["/user/{id}", "/user/{{id}}", "/user/{var:id}"] {
            let pattern = RoutePattern::parse(text).unwrap();
            assert!(pattern.has_variable("id"), "{}", text);
        }
    }

    #[test]
    fn test_rejects_bad_patterns() {
        assert!(RoutePattern::parse("user").is_err());
        assert!(RoutePattern::parse("/a//b").is_err());
        assert!(RoutePattern::parse("/a/{}").is_err());
        assert!(RoutePattern::parse("/a/{x-y}").is_err());
        assert!(RoutePattern::parse("/a/{x}/b/{x}").is_err());
        assert!(RoutePattern::parse("/a/{x").is_err());
    }

    #[test]
    fn test_root_and_trailing_slash() {
        assert!(RoutePattern::parse("/").unwrap().segments().is_empty());
        assert_eq!(RoutePattern::parse("/").unwrap().normalized(), "/");
        assert_eq!(split_path("/widgets/"), vec!["widgets"]);
        assert_eq!(split_path("/a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_overlap() {
        let a = RoutePattern::parse("/a/{x}").unwrap();
        let b = RoutePattern::parse("/{y}/b").unwrap();
        let c = RoutePattern::parse("/a/b").unwrap();
        let d = RoutePattern::parse("/c/{z}").unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }
}

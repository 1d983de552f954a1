//! Handler chain results and their HTTP rendering.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::error::DispatchError;
use crate::pipeline::context::ResponseHead;

/// Body of a [`Reply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Empty,
    Json(Value),
    Text(String),
}

/// Value produced by the handler chain for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
}

impl Reply {
    pub fn json(status: StatusCode, value: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(value),
        }
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            body: ReplyBody::Text(text.into()),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: ReplyBody::Empty,
        }
    }

    /// Structured response for an error that reached the exception boundary.
    pub fn from_error(err: &DispatchError) -> Self {
        Self::text(err.status(), err.to_string())
    }

    /// Render the reply, then apply headers accumulated on the response head.
    ///
    /// Headers set by handlers or targets replace headers of the same name.
    pub fn finalize(self, head: ResponseHead) -> Response {
        let mut response = self.into_response();
        let headers = response.headers_mut();
        for name in head.headers.keys() {
            headers.remove(name);
        }
        headers.extend(head.headers);
        response
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let (content_type, body) = match self.body {
            ReplyBody::Empty => (None, Body::empty()),
            ReplyBody::Json(value) => (
                Some(HeaderValue::from_static("application/json")),
                Body::from(value.to_string()),
            ),
            ReplyBody::Text(text) => (
                Some(HeaderValue::from_static("text/plain; charset=utf-8")),
                Body::from(text),
            ),
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[tokio::test]
    async fn test_json_rendering() {
        let response =
            Reply::json(StatusCode::OK, serde_json::json!({ "ok": true })).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }

    #[test]
    fn test_finalize_overrides_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        headers.insert("x-extra", HeaderValue::from_static("1"));
        let head = ResponseHead {
            status: None,
            headers,
        };

        let response = Reply::json(StatusCode::OK, Value::Null).finalize(head);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(response.headers()["x-extra"], "1");
    }
}

//! Content-type aware request body decoding.
//!
//! # Design Decisions
//! - The media type is matched case-insensitively, parameters are ignored
//! - `application/json` and any `+json` suffix decode as JSON
//! - An empty body is `Empty` whatever the declared content type
//! - Unknown media types are kept as raw bytes

use axum::body::Bytes;
use serde_json::Value;

use crate::binding::query::QueryMap;
use crate::error::DispatchError;

/// Decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(QueryMap),
    Text(String),
    Bytes(Bytes),
}

impl RequestBody {
    /// Decode buffered body bytes according to the request `content-type`.
    pub fn decode(content_type: Option<&str>, bytes: Bytes) -> Result<Self, DispatchError> {
        if bytes.is_empty() {
            return Ok(RequestBody::Empty);
        }

        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if media_type == "application/json" || media_type.ends_with("+json") {
            return serde_json::from_slice(&bytes)
                .map(RequestBody::Json)
                .map_err(|e| DispatchError::BadRequest(format!("invalid JSON body: {}", e)));
        }

        if media_type == "application/x-www-form-urlencoded" {
            return Ok(RequestBody::Form(QueryMap::parse_bytes(&bytes)));
        }

        if media_type.starts_with("text/") {
            return String::from_utf8(bytes.to_vec())
                .map(RequestBody::Text)
                .map_err(|_| DispatchError::BadRequest("text body is not valid UTF-8".into()));
        }

        Ok(RequestBody::Bytes(bytes))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&QueryMap> {
        match self {
            RequestBody::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Best-effort JSON view of any body; raw bytes have none.
    pub fn to_json(&self) -> Value {
        match self {
            RequestBody::Empty | RequestBody::Bytes(_) => Value::Null,
            RequestBody::Json(value) => value.clone(),
            RequestBody::Form(form) => form.to_json(),
            RequestBody::Text(text) => Value::String(text.clone()),
        }
    }
}

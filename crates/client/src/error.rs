//! Normalized API errors.
//!
//! Backends answer failures in several shapes (`message`, `error`, `details`,
//! `errors`, `validation`, `code`); every failed call is folded into one
//! [`NormalizedError`] so UI code handles a single type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use tutaller_auth::ResolveError;

/// Shown when neither the body nor the transport gives a usable message.
pub const FALLBACK_MESSAGE: &str = "Request failed. Please try again.";

/// Backend-provided error code, or the HTTP status when the body has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl ErrorCode {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n
                .as_i64()
                .map(ErrorCode::Number)
                .or_else(|| Some(ErrorCode::Text(n.to_string()))),
            Value::String(s) => Some(ErrorCode::Text(s.clone())),
            other => Some(ErrorCode::Text(other.to_string())),
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{n}"),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

/// Uniform record of a failed API call.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct NormalizedError {
    /// HTTP status; `None` for transport failures (unreachable, timeout).
    pub status: Option<u16>,
    pub code: Option<ErrorCode>,
    pub message: String,
    /// Validation payload (`details`, `errors` or `validation`), verbatim.
    pub details: Option<Value>,
    /// Response body, or a description of the transport failure.
    pub raw: Value,
}

impl NormalizedError {
    /// Fold a failure into a normalized error.
    ///
    /// Message precedence: body `message`, body `error`, the transport's
    /// message, then [`FALLBACK_MESSAGE`].
    pub fn normalize(status: Option<u16>, body: Option<&Value>, transport_message: Option<&str>) -> Self {
        let data: Option<&Map<String, Value>> = body.and_then(Value::as_object);
        let field = |key: &str| data.and_then(|d| d.get(key));

        let message = text_field(field("message"))
            .or_else(|| text_field(field("error")))
            .or_else(|| {
                transport_message
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        let details = ["details", "errors", "validation"]
            .iter()
            .find_map(|key| field(*key).filter(|v| is_truthy(v)).cloned());

        let code = field("code")
            .and_then(ErrorCode::from_value)
            .or_else(|| status.map(|s| ErrorCode::Number(i64::from(s))));

        let raw = match body {
            Some(value) => value.clone(),
            None => json!({ "message": transport_message.unwrap_or(FALLBACK_MESSAGE) }),
        };

        Self {
            status,
            code,
            message,
            details,
            raw,
        }
    }

    /// A failure that happened on our side of the wire (e.g. an undecodable body).
    pub fn local(status: Option<u16>, message: impl Into<String>, raw: Value) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
            details: None,
            raw,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl From<ResolveError> for NormalizedError {
    fn from(err: ResolveError) -> Self {
        let status = match err {
            ResolveError::Unauthorized => Some(401),
            ResolveError::UnexpectedStatus(s) => Some(s),
            _ => None,
        };
        NormalizedError::local(status, err.to_string(), Value::Null)
    }
}

/// A usable message out of a body field: a non-empty string, or a list of
/// strings (validation pipes often send `message: [..]`).
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

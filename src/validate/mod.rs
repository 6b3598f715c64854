//! Boundary validation for untrusted request input.
//!
//! Bodies are accepted as JSON or as urlencoded forms. Anything unparseable is
//! treated as an empty object, which then fails required-field checks like
//! any other incomplete payload.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ApiError;

pub const REQUIRED_FIELD: &str = "This field is required";

/// An untyped request body
#[derive(Debug, Clone, Default)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::empty(),
        }
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                tracing::debug!("Treating malformed JSON body as empty: {}", e);
                Self::empty()
            }
        }
    }

    pub fn from_form(form: HashMap<String, String>) -> Self {
        Self {
            fields: form.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
        }
    }

    /// Pair positional values with field names (command line input)
    pub fn from_pairs(names: &[&str], values: &[String]) -> Self {
        Self {
            fields: names
                .iter()
                .zip(values)
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect(),
        }
    }

    /// A field coerced to a trimmed string. Strings, numbers and booleans
    /// coerce; null, arrays, objects and absent fields do not.
    pub fn string(&self, name: &str) -> Option<String> {
        let raw = match self.fields.get(name)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        Some(raw.trim().to_string())
    }

    /// Every named field, trimmed and non-empty, or a validation error
    /// listing each one that is missing.
    pub fn required<const N: usize>(&self, names: [&str; N]) -> Result<[String; N], ApiError> {
        let values = names.map(|name| self.string(name).unwrap_or_default());

        let missing: HashMap<String, String> = names
            .iter()
            .zip(values.iter())
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| (name.to_string(), REQUIRED_FIELD.to_string()))
            .collect();

        if !missing.is_empty() {
            return Err(ApiError::validation_error("Invalid payload", Some(missing)));
        }
        Ok(values)
    }
}

/// Row ids arrive as path text and must be integers
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("Bad id"))
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn too_large(status: StatusCode) -> Option<ApiError> {
    (status == StatusCode::PAYLOAD_TOO_LARGE).then(|| ApiError::payload_too_large("Request body too large"))
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            return match Form::<HashMap<String, String>>::from_request(req, state).await {
                Ok(Form(form)) => Ok(Self::from_form(form)),
                Err(rejection) => match too_large(rejection.status()) {
                    Some(err) => Err(err),
                    None => Ok(Self::empty()),
                },
            };
        }

        match Bytes::from_request(req, state).await {
            Ok(bytes) => Ok(Self::from_json_bytes(&bytes)),
            Err(rejection) => Err(too_large(rejection.status())
                .unwrap_or_else(|| ApiError::bad_request(rejection.body_text()))),
        }
    }
}

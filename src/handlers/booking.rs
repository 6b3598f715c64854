use axum::response::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::validate::Payload;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub datetime: String,
}

const FIELDS: [(&str, &str); 5] = [
    ("firstName", "First name is required"),
    ("lastName", "Last name is required"),
    ("email", "Please enter a valid email"),
    ("phone", "Phone number is required"),
    ("message", "Message is required"),
];

/// Loose `something@host.tld` shape check. Any whitespace-separated word of
/// the value may carry the address.
pub fn looks_like_email(value: &str) -> bool {
    value.split_whitespace().any(|word| {
        let Some(at) = word.char_indices().skip(1).find(|(_, c)| *c == '@').map(|(i, _)| i) else {
            return false;
        };
        let domain = &word[at + 1..];
        domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
    })
}

/// Validate a booking form, stamping it with the submission time
pub fn validate_booking(payload: &Payload, now: DateTime<Utc>) -> Result<Booking, ApiError> {
    let mut errors = HashMap::new();
    let mut values = HashMap::new();

    for (name, message) in FIELDS {
        let value = payload.string(name).unwrap_or_default();
        let valid = match name {
            "email" => looks_like_email(&value),
            _ => !value.is_empty(),
        };
        if !valid {
            errors.insert(name.to_string(), message.to_string());
        }
        values.insert(name, value);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation_error("Invalid payload", Some(errors)));
    }

    let mut take = |name: &str| values.remove(name).unwrap_or_default();
    Ok(Booking {
        first_name: take("firstName"),
        last_name: take("lastName"),
        email: take("email"),
        phone: take("phone"),
        message: take("message"),
        datetime: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// POST /booking
pub async fn submit(payload: Payload) -> Result<Json<Value>, ApiError> {
    let booking = validate_booking(&payload, Utc::now())?;
    tracing::info!(email = %booking.email, datetime = %booking.datetime, "Booking submitted");

    Ok(Json(json!({ "ok": true, "submission": booking })))
}

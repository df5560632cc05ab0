//! Error types for the property admin client.
//!
//! # Design
//! `Unauthorized` and `NotFound` get dedicated variants because callers react
//! to them directly: a 401 sends the user back to the login screen and a 404
//! renders "not found". A 422 carries the backend's field-level messages. All
//! other non-2xx responses land in `Http` with the server's `message` (when
//! the body has one) and the raw body for debugging.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Generic message shown for network failures and unexpected errors.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again";

/// Errors returned by `ApiClient` parse methods and by hosts executing requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 401 (or no token is held); the caller must treat
    /// the user as logged out. Carries the server's message when it sent one.
    #[error("not logged in")]
    Unauthorized(Option<String>),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the payload (422) with per-field messages.
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    /// The server returned a non-2xx status other than 401/404/422.
    #[error("HTTP {status}: {}", http_detail(.message, .body))]
    Http {
        status: u16,
        message: Option<String>,
        body: String,
    },

    /// The request never produced a response (connection refused, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

fn http_detail<'a>(message: &'a Option<String>, body: &'a String) -> &'a str {
    message.as_deref().unwrap_or(body)
}

impl ApiError {
    /// Message supplied by the server, if the response carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(message) => message.as_deref(),
            ApiError::Validation { message, .. } => Some(message),
            ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to render next to a form or list: the server message verbatim,
    /// otherwise `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Build the `ApiError` for a non-success response.
pub(crate) fn from_status(status: u16, body: &str) -> ApiError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    match status {
        401 => ApiError::Unauthorized(parsed.and_then(|b| b.message)),
        404 => ApiError::NotFound,
        422 => {
            let (message, errors) = match parsed {
                Some(b) => (b.message, b.errors),
                None => (None, BTreeMap::new()),
            };
            ApiError::Validation {
                message: message.unwrap_or_else(|| "The given data was invalid.".to_string()),
                errors,
            }
        }
        _ => ApiError::Http {
            status,
            message: parsed.and_then(|b| b.message),
            body: body.to_string(),
        },
    }
}

/// Client-side, field-level validation failures keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Errors raised by form controllers before or after submission.
#[derive(Debug, Error)]
pub enum FormError {
    /// Client-side validation failed; nothing was sent.
    #[error("invalid fields: {}", field_names(.0))]
    Invalid(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn field_names(errors: &FieldErrors) -> String {
    errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl FormError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FormError::Invalid(errors) => Some(errors),
            FormError::Api(_) => None,
        }
    }
}

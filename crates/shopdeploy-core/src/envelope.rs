//! JSON response envelope.
//!
//! Success: `{"success": true, "message": "...", "data": {...}}`
//! Failure: `{"success": false, "kind": "...", "message": "..."}`

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Successful response wrapped in the success envelope.
#[derive(Debug)]
pub struct Envelope<T> {
    pub status: StatusCode,
    pub message: Cow<'static, str>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// `200 OK` with a data payload.
    pub fn ok(message: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    /// `201 Created` with a data payload.
    pub fn created(message: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// `200 OK` carrying only a message.
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Serialize)]
struct SuccessBody<'a, T> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            success: true,
            message: &self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Build a failure envelope response. Used by every error type's `IntoResponse`.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "success": false,
        "kind": kind,
        "message": message,
    });
    (status, Json(body)).into_response()
}

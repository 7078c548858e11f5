//! Terminal responses produced by the admission pipeline.
//!
//! # Design Decisions
//! - Every deny reason maps to 403; only the message and `reason` differ
//! - Provider failures surface as 500 with a generic message; details stay in logs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::admission::DenyReason;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Why the pipeline stopped a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Denied(DenyReason),
    ProviderFailure,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Denied(_) => StatusCode::FORBIDDEN,
            Rejection::ProviderFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = match self {
            Rejection::Denied(reason) => json!({
                "error": reason.message(),
                "reason": reason.as_str(),
            }),
            Rejection::ProviderFailure => json!({ "error": INTERNAL_ERROR_MESSAGE }),
        };
        (self.status(), Json(body)).into_response()
    }
}

//! Errors raised while producing a meeting brief and their HTTP mapping.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Topic is required")]
    Validation,

    #[error("AUTH_REQUIRED")]
    AuthRequired,

    /// Message is whatever the proxy reported.
    #[error("{0}")]
    UpstreamProxy(String),

    #[error("Failed to generate meeting brief")]
    UpstreamFailure,

    #[error("VALYU_API_KEY is not set")]
    MissingApiKey,

    #[error("Upstream answer did not include contents")]
    MissingContents,

    #[error("{}", .0.body_text())]
    RequestBody(#[from] BytesRejection),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BriefError {
    pub fn status(&self) -> StatusCode {
        match self {
            BriefError::Validation => StatusCode::BAD_REQUEST,
            BriefError::AuthRequired => StatusCode::UNAUTHORIZED,
            BriefError::RequestBody(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Ordinary caller mistakes, not service failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BriefError::Validation | BriefError::AuthRequired)
    }
}

impl IntoResponse for BriefError {
    fn into_response(self) -> Response {
        let body = match &self {
            BriefError::AuthRequired => json!({
                "error": "AUTH_REQUIRED",
                "message": "Sign in with Valyu to continue.",
            }),
            other => json!({ "error": other.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

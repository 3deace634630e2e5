//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::Request;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use domain::DomainError;
use serde::{Deserialize, Serialize};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Domain logic error.
    Domain(DomainError),
    /// Malformed body, path or query.
    BadRequest(String),
    /// No route matched.
    NotFound(String),
}

/// JSON error body.
///
/// `path` is filled in by [`stamp_error_path`] once the response leaves the
/// handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: message.into(),
            path: String::new(),
            details,
        }
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Domain(err) => domain_error_to_body(err),
            ApiError::BadRequest(msg) => ErrorResponse::new(StatusCode::BAD_REQUEST, msg, vec![]),
            ApiError::NotFound(msg) => ErrorResponse::new(StatusCode::NOT_FOUND, msg, vec![]),
        };
        body.into_response()
    }
}

fn internal(msg: String) -> ErrorResponse {
    tracing::error!(error = %msg, "internal server error");
    ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("An unexpected error occurred: {msg}"),
        vec![],
    )
}

fn domain_error_to_body(err: DomainError) -> ErrorResponse {
    match err {
        DomainError::NotFound { .. } => {
            ErrorResponse::new(StatusCode::NOT_FOUND, err.to_string(), vec![])
        }
        DomainError::Validation(errors) => ErrorResponse::new(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.iter().map(ToString::to_string).collect(),
        ),
        DomainError::InvalidArgument(msg) => {
            ErrorResponse::new(StatusCode::BAD_REQUEST, msg, vec![])
        }
        DomainError::Store(e) => internal(e.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Middleware that writes the request path into error bodies.
pub async fn stamp_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    match response.extensions().get::<ErrorResponse>() {
        Some(body) => {
            metrics::counter!("http_error_responses_total", "status" => body.status.to_string())
                .increment(1);
            let mut body = body.clone();
            body.path = path;
            body.into_response()
        }
        None => response,
    }
}

//! Error → HTTP response mapping.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::StorefrontError;

const NOT_FOUND_MESSAGE: &str = "Страницата не е намерена.";
const UNAVAILABLE_MESSAGE: &str = "Услугата временно не е налична. Опитайте отново по-късно.";
const BAD_REQUEST_MESSAGE: &str = "Невалидна заявка.";
const INTERNAL_MESSAGE: &str = "Възникна грешка. Моля, опитайте отново по-късно.";

/// Error as returned to a client: status plus a message safe to show.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn not_found() -> Self { Self::new(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE) }
    pub fn unavailable() -> Self { Self::new(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE) }
    /// Malformed request; `status` is the 4xx the extractor chose (400, 415, 422).
    pub fn bad_request(status: StatusCode) -> Self { Self::new(status, BAD_REQUEST_MESSAGE) }
    pub fn internal() -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE) }
}

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::ProductNotFound => Self::not_found(),
            StorefrontError::MissingProductId => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            StorefrontError::StorageUnavailable => Self::unavailable(),
            StorefrontError::Order(_) | StorefrontError::Storage(_) => {
                tracing::error!("request failed: {err}");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": true, "message": self.message, "status": self.status.as_u16() });
        (self.status, Json(body)).into_response()
    }
}

/// Whether the caller asked for JSON rather than a page or redirect.
pub fn wants_json(headers: &HeaderMap) -> bool {
    let xhr = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    let accepts_json = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));
    xhr || accepts_json
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(StorefrontError::ProductNotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StorefrontError::StorageUnavailable).status, StatusCode::SERVICE_UNAVAILABLE);
        let missing = ApiError::from(StorefrontError::MissingProductId);
        assert_eq!((missing.status, missing.message.as_str()), (StatusCode::BAD_REQUEST, "Missing productId"));
        let internal = ApiError::from(StorefrontError::Storage(crate::StorageError::Corrupt { id: "x".into(), reason: "secret".into() }));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.message.contains("secret"));
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert("accept", HeaderValue::from_static("text/html, Application/JSON;q=0.9"));
        assert!(wants_json(&headers));
        let mut xhr = HeaderMap::new();
        xhr.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(wants_json(&xhr));
    }
}

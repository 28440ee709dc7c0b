//! Request extractors whose rejections use the common JSON error body.

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use crate::http::error::ApiError;

/// `axum::Form` answering malformed bodies with [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct Form<T>(pub T);

/// `axum::extract::Query` answering malformed query strings with [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        tracing::debug!("form rejected: {}", rejection.body_text());
        Self::bad_request(rejection.status())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("query rejected: {}", rejection.body_text());
        Self::bad_request(rejection.status())
    }
}

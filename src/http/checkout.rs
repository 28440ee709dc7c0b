//! Checkout and order confirmation.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use crate::checkout::{CheckoutForm, CheckoutOutcome, OrderSuccess};
use crate::http::error::ApiError;
use crate::http::extract::{Form, Query};
use crate::http::AppState;
use crate::session::SessionId;
use crate::StorefrontError;

/// Offline goes home, never back to the checkout page.
pub async fn view(State(state): State<AppState>, Extension(sid): Extension<SessionId>) -> Result<Response, ApiError> {
    match state.checkout.view(&sid).await {
        Ok(Some(view)) => Ok(Json(view).into_response()),
        Ok(None) => Ok(Redirect::to("/").into_response()),
        Err(StorefrontError::StorageUnavailable) => Ok(Redirect::to("/?error=db").into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(sid): Extension<SessionId>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, ApiError> {
    match state.checkout.place(&sid, &form).await {
        Ok(CheckoutOutcome::EmptyCart) => Ok(Redirect::to("/").into_response()),
        Ok(CheckoutOutcome::Rejected(view)) => Ok(Json(view).into_response()),
        Ok(CheckoutOutcome::Placed(order)) => Ok(Redirect::to(&format!("/order-success?id={}", order.id)).into_response()),
        Err(StorefrontError::StorageUnavailable) => Ok(Redirect::to("/checkout?error=db").into_response()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderSuccessQuery {
    pub id: Option<String>,
}

pub async fn order_success(
    State(state): State<AppState>,
    Query(query): Query<OrderSuccessQuery>,
) -> Result<Json<OrderSuccess>, ApiError> {
    Ok(Json(state.checkout.order_success(query.id.as_deref()).await?))
}

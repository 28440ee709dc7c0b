//! Cart endpoints. Each mutation answers with the cart JSON when the caller wants
//! JSON and with a redirect otherwise.

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, REFERER};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use crate::domain::aggregates::Cart;
use crate::domain::value_objects::{parse_int_prefix, Quantity};
use crate::cart::CartPayload;
use crate::http::error::{wants_json, ApiError};
use crate::http::extract::Form;
use crate::http::AppState;
use crate::session::SessionId;
use crate::StorefrontError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddForm {
    pub product_id: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveForm {
    pub index: Option<String>,
}

/// Drawer contents. A session store that cannot be reached reads as an empty cart.
pub async fn api_cart(State(state): State<AppState>, Extension(sid): Extension<SessionId>) -> Result<Response, ApiError> {
    let payload = match state.carts.payload(&sid).await {
        Ok(payload) => payload,
        Err(StorefrontError::StorageUnavailable) => CartPayload::empty(),
        Err(e) => return Err(e.into()),
    };
    Ok(([(CACHE_CONTROL, "no-store")], Json(payload)).into_response())
}

pub async fn cart_page() -> Redirect {
    Redirect::to("/")
}

fn referer(headers: &HeaderMap) -> Option<&str> {
    headers.get(REFERER).and_then(|v| v.to_str().ok()).filter(|r| !r.is_empty())
}

/// Back to where the visitor came from, flagged with the storage error.
fn offline_redirect(headers: &HeaderMap) -> Redirect {
    let back = referer(headers).unwrap_or("/");
    let sep = if back.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{back}{sep}error=db"))
}

fn rejected(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message, "cart": [], "cartCount": 0 }))).into_response()
}

async fn cart_json(state: &AppState, cart: &Cart) -> Result<Response, ApiError> {
    Ok(Json(state.carts.payload_for(cart).await?).into_response())
}

pub async fn add(
    State(state): State<AppState>,
    Extension(sid): Extension<SessionId>,
    headers: HeaderMap,
    Form(form): Form<AddForm>,
) -> Result<Response, ApiError> {
    let json = wants_json(&headers);
    let quantity = Quantity::parse(form.quantity.as_deref());
    match state.carts.add(&sid, form.product_id.as_deref(), quantity).await {
        Ok(cart) if json => cart_json(&state, &cart).await,
        Ok(_) => Ok(Redirect::to(referer(&headers).unwrap_or("/")).into_response()),
        Err(StorefrontError::MissingProductId) if json => Ok(rejected(StatusCode::BAD_REQUEST, "Missing productId")),
        Err(StorefrontError::ProductNotFound) if json => Ok(rejected(StatusCode::NOT_FOUND, "Product not found")),
        Err(StorefrontError::MissingProductId | StorefrontError::ProductNotFound) => Ok(Redirect::to("/produkti").into_response()),
        Err(StorefrontError::StorageUnavailable) if !json => Ok(offline_redirect(&headers).into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(sid): Extension<SessionId>,
    headers: HeaderMap,
    Form(form): Form<RemoveForm>,
) -> Result<Response, ApiError> {
    let json = wants_json(&headers);
    let index = form.index.as_deref().and_then(parse_int_prefix);
    match state.carts.remove(&sid, index).await {
        Ok(cart) if json => cart_json(&state, &cart).await,
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(StorefrontError::StorageUnavailable) if !json => Ok(offline_redirect(&headers).into_response()),
        Err(e) => Err(e.into()),
    }
}

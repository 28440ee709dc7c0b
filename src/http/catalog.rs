//! Catalog pages.

use axum::extract::{Path, RawQuery, State};
use axum::response::Redirect;
use axum::Json;
use serde_json::{json, Value};
use crate::catalog::{CatalogPage, HomePage, ProductPage, QueryParams, Scope};
use crate::http::error::ApiError;
use crate::http::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = if state.liveness.is_available() { "online" } else { "offline" };
    Json(json!({ "status": "healthy", "service": "clima-storefront", "database": database }))
}

pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>, ApiError> {
    Ok(Json(state.catalog.home().await?))
}

/// Listing for one scope; the raw query keeps repeated keys such as `brand`.
pub async fn listing(state: AppState, scope: Scope, query: Option<String>) -> Result<Json<CatalogPage>, ApiError> {
    let params = QueryParams::parse(query.as_deref().unwrap_or_default());
    Ok(Json(state.catalog.list(scope, &params).await?))
}

pub async fn all_products(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<CatalogPage>, ApiError> {
    listing(state, Scope::All, query).await
}

pub async fn product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ProductPage>, ApiError> {
    Ok(Json(state.catalog.product_page(&id).await?))
}

pub async fn product_index() -> Redirect {
    Redirect::to("/produkti")
}

//! HTTP surface.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod extract;
pub mod session;

use axum::extract::{RawQuery, State};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::cart::CartStore;
use crate::catalog::{CatalogService, Scope};
use crate::checkout::CheckoutService;
use crate::domain::value_objects::Category;
use crate::notify::EventPublisher;
use crate::storage::{Liveness, OrderRepository, ProductRepository, SessionStore};

pub use error::{wants_json, ApiError};
pub use session::SessionSettings;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartStore,
    pub checkout: CheckoutService,
    pub liveness: Arc<dyn Liveness>,
    pub session: SessionSettings,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        sessions: Arc<dyn SessionStore>,
        liveness: Arc<dyn Liveness>,
        events: EventPublisher,
        session: SessionSettings,
    ) -> Self {
        let carts = CartStore::new(sessions, products.clone(), liveness.clone());
        Self {
            catalog: CatalogService::new(products, liveness.clone()),
            checkout: CheckoutService::new(carts.clone(), orders, liveness.clone(), events),
            carts,
            liveness,
            session,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(catalog::health))
        .route("/", get(catalog::home))
        .route("/produkti", get(catalog::all_products))
        .route("/product", get(catalog::product_index))
        .route("/product/:id", get(catalog::product))
        .route("/cart", get(cart::cart_page))
        .route("/api/cart", get(cart::api_cart))
        .route("/cart/add", post(cart::add))
        .route("/cart/remove", post(cart::remove))
        .route("/checkout", get(checkout::view).post(checkout::submit))
        .route("/order-success", get(checkout::order_success));

    for category in Category::ALL {
        router = router.route(
            category.path(),
            get(move |State(state): State<AppState>, RawQuery(query): RawQuery| {
                catalog::listing(state, Scope::Category(category), query)
            }),
        );
    }

    router
        .fallback(|| async { ApiError::not_found() })
        .layer(from_fn_with_state(state.clone(), session::session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

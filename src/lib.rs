//! NesebarClima storefront
//!
//! Catalog and storefront service for air-conditioning products.
//!
//! ## Features
//! - Catalog listing with query-string filters, facet options and pagination
//! - Session-scoped shopping cart with live product titles
//! - Two-currency totals (EUR base, BGN at a fixed rate)
//! - Checkout that snapshots the cart into an immutable order

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod http;
pub mod notify;
pub mod session;
pub mod storage;

use thiserror::Error;

pub use domain::aggregates::OrderError;
pub use storage::StorageError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found")]
    ProductNotFound,

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Missing productId")]
    MissingProductId,

    #[error("Storage unavailable")]
    StorageUnavailable,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

//! Storage seam.
//!
//! The storefront reads and writes documents only through these traits. Postgres
//! (`postgres`) is the production backend; `memory` backs tests and database-less
//! local runs.

pub mod health;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use crate::catalog::{ProductFilter, RawFacets, Scope};
use crate::domain::aggregates::{CartLineItem, NewProduct, Order, Product, ProductPatch};
use crate::session::SessionId;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Product>>;

    /// One batched lookup; unknown IDs are simply absent from the result.
    async fn find_by_ids(&self, ids: &[Uuid]) -> StorageResult<Vec<Product>>;

    async fn count(&self, filter: &ProductFilter) -> StorageResult<u64>;

    /// Newest first.
    async fn find_page(&self, filter: &ProductFilter, skip: u64, limit: u64) -> StorageResult<Vec<Product>>;

    /// Products flagged `recommended`, newest first.
    async fn recommended(&self, limit: u64) -> StorageResult<Vec<Product>>;

    /// Any products other than `excluding`.
    async fn others(&self, excluding: Uuid, limit: u64) -> StorageResult<Vec<Product>>;

    /// Distinct facet values present in `scope`.
    async fn facet_values(&self, scope: Scope) -> StorageResult<RawFacets>;

    async fn create(&self, input: NewProduct) -> StorageResult<Product>;

    /// `None` when no product has that ID.
    async fn update(&self, id: Uuid, patch: ProductPatch) -> StorageResult<Option<Product>>;

    async fn delete(&self, id: Uuid) -> StorageResult<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order) -> StorageResult<()>;
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Order>>;
    async fn set_ready(&self, id: Uuid, ready: bool) -> StorageResult<Option<Order>>;
}

/// Per-session cart storage. `save` overwrites the whole value: concurrent writers
/// for the same session are last-write-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> StorageResult<Option<Vec<CartLineItem>>>;
    async fn save(&self, id: &SessionId, cart: &[CartLineItem]) -> StorageResult<()>;

    /// Drops sessions past their TTL; returns how many were removed.
    async fn purge_expired(&self) -> StorageResult<u64>;

    /// True when carts live in process memory and stay reachable while the
    /// database is down.
    fn is_local(&self) -> bool { false }
}

/// Cheap, non-blocking view of whether storage is reachable right now.
pub trait Liveness: Send + Sync {
    fn is_available(&self) -> bool;
}

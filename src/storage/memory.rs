//! In-memory storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::catalog::{ProductFilter, RawFacets, Scope};
use crate::domain::aggregates::{CartLineItem, NewProduct, Order, Product, ProductPatch};
use crate::session::SessionId;
use crate::storage::{Liveness, OrderRepository, ProductRepository, SessionStore, StorageResult};

/// Products in insertion order; later inserts count as newer.
#[derive(Default)]
pub struct MemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductRepository {
    pub async fn insert(&self, input: NewProduct) -> Product {
        let product = Product::create(input);
        self.products.write().await.push(product.clone());
        product
    }

    fn newest_first<'a>(products: &'a [Product]) -> Vec<&'a Product> {
        let mut sorted: Vec<&Product> = products.iter().rev().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }
}

fn window(products: Vec<&Product>, skip: u64, limit: u64) -> Vec<Product> {
    products
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

fn distinct<T: Ord + Clone>(values: impl Iterator<Item = T>) -> Vec<T> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StorageResult<Vec<Product>> {
        Ok(self.products.read().await.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn count(&self, filter: &ProductFilter) -> StorageResult<u64> {
        Ok(self.products.read().await.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_page(&self, filter: &ProductFilter, skip: u64, limit: u64) -> StorageResult<Vec<Product>> {
        let products = self.products.read().await;
        let matching = Self::newest_first(&products).into_iter().filter(|p| filter.matches(p)).collect();
        Ok(window(matching, skip, limit))
    }

    async fn recommended(&self, limit: u64) -> StorageResult<Vec<Product>> {
        let products = self.products.read().await;
        let matching = Self::newest_first(&products).into_iter().filter(|p| p.recommended).collect();
        Ok(window(matching, 0, limit))
    }

    async fn others(&self, excluding: Uuid, limit: u64) -> StorageResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(window(products.iter().filter(|p| p.id != excluding).collect(), 0, limit))
    }

    async fn facet_values(&self, scope: Scope) -> StorageResult<RawFacets> {
        let products = self.products.read().await;
        let in_scope: Vec<&Product> = products.iter().filter(|p| ProductFilter::for_scope(scope).matches(p)).collect();
        Ok(RawFacets {
            availability: distinct(in_scope.iter().filter_map(|p| p.availability)),
            classes: distinct(in_scope.iter().filter_map(|p| p.class)),
            brands: distinct(in_scope.iter().filter(|p| !p.brand.is_empty()).map(|p| p.brand.clone())),
            power: distinct(in_scope.iter().map(|p| p.power).filter(|p| *p > Decimal::ZERO)),
            energy_classes: distinct(in_scope.iter().filter(|p| !p.energy_class.is_empty()).map(|p| p.energy_class.clone())),
            room_sizes: distinct(in_scope.iter().filter_map(|p| p.room_size)),
            price_min: in_scope.iter().map(|p| p.price).min(),
            price_max: in_scope.iter().map(|p| p.price).max(),
        })
    }

    async fn create(&self, input: NewProduct) -> StorageResult<Product> {
        Ok(self.insert(input).await)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> StorageResult<Option<Product>> {
        let mut products = self.products.write().await;
        Ok(products.iter_mut().find(|p| p.id == id).map(|p| {
            p.apply(patch);
            p.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryOrderRepository {
    pub async fn count(&self) -> usize { self.orders.read().await.len() }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create(&self, order: &Order) -> StorageResult<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn set_ready(&self, id: Uuid, ready: bool) -> StorageResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(&id).map(|o| {
            o.set_ready(ready);
            o.take_events();
            o.clone()
        }))
    }
}

/// Process-local session store; carts are lost on restart. Each save pushes the
/// session's expiry out by `ttl`; expired sessions read as absent until purged.
pub struct MemorySessionStore {
    carts: RwLock<HashMap<SessionId, MemorySession>>,
    ttl: Duration,
}

struct MemorySession {
    cart: Vec<CartLineItem>,
    expires_at: DateTime<Utc>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self { Self { carts: RwLock::default(), ttl } }

    pub async fn session_count(&self) -> usize { self.carts.read().await.len() }
}

impl Default for MemorySessionStore {
    fn default() -> Self { Self::new(Duration::hours(24)) }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> StorageResult<Option<Vec<CartLineItem>>> {
        let now = Utc::now();
        Ok(self.carts.read().await.get(id).filter(|s| s.expires_at > now).map(|s| s.cart.clone()))
    }

    async fn save(&self, id: &SessionId, cart: &[CartLineItem]) -> StorageResult<()> {
        let session = MemorySession { cart: cart.to_vec(), expires_at: Utc::now() + self.ttl };
        self.carts.write().await.insert(id.clone(), session);
        Ok(())
    }

    async fn purge_expired(&self) -> StorageResult<u64> {
        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let before = carts.len();
        carts.retain(|_, s| s.expires_at > now);
        Ok((before - carts.len()) as u64)
    }

    fn is_local(&self) -> bool { true }
}

/// Liveness flag set by hand; the in-memory backend is always reachable unless a
/// test says otherwise.
pub struct StaticLiveness(AtomicBool);

impl StaticLiveness {
    pub fn new(available: bool) -> Self { Self(AtomicBool::new(available)) }
    pub fn set_available(&self, available: bool) { self.0.store(available, Ordering::Relaxed); }
}

impl Liveness for StaticLiveness {
    fn is_available(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Customer;
    use crate::domain::value_objects::Money;

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = MemoryProductRepository::default();
        let p = repo.insert(NewProduct { brand: "Midea".into(), ..Default::default() }).await;
        let updated = repo.update(p.id, ProductPatch { model: Some("Breezeless".into()), ..Default::default() }).await.unwrap();
        assert_eq!(updated.unwrap().brand_model().as_deref(), Some("Midea Breezeless"));
        assert!(repo.update(Uuid::now_v7(), ProductPatch::default()).await.unwrap().is_none());
        assert!(repo.delete(p.id).await.unwrap());
        assert!(!repo.delete(p.id).await.unwrap());
        assert!(repo.find_by_id(p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_newest_first() {
        let repo = MemoryProductRepository::default();
        for m in ["a", "b", "c"] {
            repo.create(NewProduct { model: m.into(), recommended: true, ..Default::default() }).await.unwrap();
        }
        let models: Vec<String> = repo.recommended(2).await.unwrap().into_iter().map(|p| p.model).collect();
        assert_eq!(models, ["c", "b"]);
    }

    #[tokio::test]
    async fn test_order_ready_flag() {
        let repo = MemoryOrderRepository::default();
        let customer = Customer { full_name: "A".into(), phone: "1".into(), address: "X".into(), comment: String::new() };
        let item = crate::domain::aggregates::OrderItem {
            product_id: "p".into(), title: "T".into(), price: Decimal::ONE, quantity: 1, img: String::new(),
        };
        let order = Order::place(customer, vec![item], Money::eur(Decimal::ONE)).unwrap();
        repo.create(&order).await.unwrap();
        assert!(repo.set_ready(order.id, true).await.unwrap().unwrap().ready);
        assert!(repo.find_by_id(order.id).await.unwrap().unwrap().ready);
        assert!(repo.set_ready(Uuid::now_v7(), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_overwrite() {
        let store = MemorySessionStore::default();
        let id = SessionId::new("sess_test");
        assert!(store.load(&id).await.unwrap().is_none());
        store.save(&id, &[]).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(vec![]));
        assert!(store.is_local());
    }

    #[tokio::test]
    async fn test_sessions_expire_and_purge() {
        let store = MemorySessionStore::new(Duration::zero());
        for i in 0..1000 {
            store.save(&SessionId::new(format!("sess_{i}")), &[]).await.unwrap();
        }
        assert!(store.load(&SessionId::new("sess_0")).await.unwrap().is_none());
        assert_eq!(store.purge_expired().await.unwrap(), 1000);
        assert_eq!(store.session_count().await, 0);

        let live = MemorySessionStore::default();
        live.save(&SessionId::new("sess_kept"), &[]).await.unwrap();
        assert_eq!(live.purge_expired().await.unwrap(), 0);
        assert_eq!(live.session_count().await, 1);
    }
}

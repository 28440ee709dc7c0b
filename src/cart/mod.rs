//! Session cart store and the JSON payload behind the cart drawer.

pub mod enrich;
pub mod totals;

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use crate::domain::aggregates::{Cart, DEFAULT_PRODUCT_IMAGE};
use crate::domain::value_objects::{format_dual, Quantity};
use crate::session::SessionId;
use crate::storage::{Liveness, ProductRepository, SessionStore};
use crate::{Result, StorefrontError};

pub use enrich::{enrich, model_label, EnrichedLine};
pub use totals::{LineTotal, Totals};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Vec<CartPayloadItem>,
    pub total_eur_formatted: String,
    pub total_bgn_formatted: String,
    pub cart_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayloadItem {
    /// Position in the cart; the handle used by remove.
    pub index: usize,
    pub product_id: String,
    pub quantity: u32,
    pub title: String,
    pub model_label: String,
    pub price: rust_decimal::Decimal,
    pub img: String,
    pub unit_price_formatted: String,
    pub line_total_formatted: String,
}

impl CartPayload {
    pub fn build(lines: &[EnrichedLine]) -> Self {
        let totals = Totals::compute(lines.iter().map(|l| (l.item.price, l.item.quantity)));
        let cart = lines
            .iter()
            .zip(&totals.lines)
            .enumerate()
            .map(|(index, (line, total))| CartPayloadItem {
                index,
                product_id: line.item.product_id.clone(),
                quantity: total.quantity,
                title: line.model_label.clone(),
                model_label: line.model_label.clone(),
                price: line.item.price,
                img: if line.item.img.is_empty() { DEFAULT_PRODUCT_IMAGE.to_string() } else { line.item.img.clone() },
                unit_price_formatted: format_dual(total.unit_price),
                line_total_formatted: format_dual(total.eur),
            })
            .collect();
        Self {
            cart,
            total_eur_formatted: totals.total_eur_formatted(),
            total_bgn_formatted: totals.total_bgn_formatted(),
            cart_count: totals.count,
        }
    }

    pub fn empty() -> Self { Self::build(&[]) }
}

/// Per-session cart operations. The session identity is always passed in; the
/// store holds no ambient request state.
#[derive(Clone)]
pub struct CartStore {
    sessions: Arc<dyn SessionStore>,
    products: Arc<dyn ProductRepository>,
    liveness: Arc<dyn Liveness>,
}

impl CartStore {
    pub fn new(sessions: Arc<dyn SessionStore>, products: Arc<dyn ProductRepository>, liveness: Arc<dyn Liveness>) -> Self {
        Self { sessions, products, liveness }
    }

    /// Fails fast instead of waiting on a database-backed session store that
    /// cannot answer.
    fn ensure_reachable(&self) -> Result<()> {
        if !self.sessions.is_local() && !self.liveness.is_available() {
            return Err(StorefrontError::StorageUnavailable);
        }
        Ok(())
    }

    /// Current cart, never absent. A session without one gets an empty cart saved.
    pub async fn read(&self, sid: &SessionId) -> Result<Cart> {
        self.ensure_reachable()?;
        match self.sessions.load(sid).await? {
            Some(items) => Ok(Cart::from_items(items)),
            None => {
                self.sessions.save(sid, &[]).await?;
                Ok(Cart::new())
            }
        }
    }

    async fn write(&self, sid: &SessionId, cart: &Cart) -> Result<()> {
        self.ensure_reachable()?;
        self.sessions.save(sid, cart.items()).await?;
        Ok(())
    }

    /// Adds `quantity` of a product. The cart is untouched unless the product exists.
    pub async fn add(&self, sid: &SessionId, product_id: Option<&str>, quantity: Quantity) -> Result<Cart> {
        let raw = product_id.map(str::trim).filter(|id| !id.is_empty()).ok_or(StorefrontError::MissingProductId)?;
        if !self.liveness.is_available() {
            return Err(StorefrontError::StorageUnavailable);
        }
        let id = Uuid::parse_str(raw).map_err(|_| StorefrontError::ProductNotFound)?;
        let product = self.products.find_by_id(id).await?.ok_or(StorefrontError::ProductNotFound)?;

        let mut cart = self.read(sid).await?;
        cart.add_product(&product, quantity);
        self.write(sid, &cart).await?;
        tracing::info!(session_id = %sid, product_id = %id, quantity = quantity.value(), "added to cart");
        Ok(cart)
    }

    /// Removes the line at `index`; missing or stale indices leave the cart as is.
    pub async fn remove(&self, sid: &SessionId, index: Option<i64>) -> Result<Cart> {
        let mut cart = self.read(sid).await?;
        let removed = index.and_then(|i| usize::try_from(i).ok()).is_some_and(|i| cart.remove_at(i));
        if removed {
            self.write(sid, &cart).await?;
            tracing::info!(session_id = %sid, ?index, "removed from cart");
        }
        Ok(cart)
    }

    pub async fn clear(&self, sid: &SessionId) -> Result<()> {
        self.write(sid, &Cart::new()).await
    }

    pub async fn enrich(&self, cart: &Cart) -> Result<Vec<EnrichedLine>> {
        Ok(enrich(self.products.as_ref(), self.liveness.as_ref(), cart.items()).await?)
    }

    pub async fn payload_for(&self, cart: &Cart) -> Result<CartPayload> {
        Ok(CartPayload::build(&self.enrich(cart).await?))
    }

    pub async fn payload(&self, sid: &SessionId) -> Result<CartPayload> {
        let cart = self.read(sid).await?;
        self.payload_for(&cart).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::NewProduct;
    use crate::storage::memory::{MemoryProductRepository, MemorySessionStore, StaticLiveness};
    use rust_decimal::Decimal;

    struct Fixture {
        store: CartStore,
        sessions: Arc<MemorySessionStore>,
        products: Arc<MemoryProductRepository>,
        live: Arc<StaticLiveness>,
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(MemorySessionStore::default());
        let products = Arc::new(MemoryProductRepository::default());
        let live = Arc::new(StaticLiveness::new(true));
        Fixture { store: CartStore::new(sessions.clone(), products.clone(), live.clone()), sessions, products, live }
    }

    async fn midea(products: &MemoryProductRepository) -> String {
        products
            .insert(NewProduct { brand: "Midea".into(), model: "MA2-24NXD0-I".into(), price: Decimal::new(1102, 0), ..Default::default() })
            .await
            .id
            .to_string()
    }

    #[tokio::test]
    async fn test_read_initializes_empty_cart() {
        let f = fixture();
        let sid = SessionId::generate();
        assert!(f.store.read(&sid).await.unwrap().is_empty());
        assert_eq!(f.sessions.load(&sid).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_add_twice_merges_lines() {
        let f = fixture();
        let sid = SessionId::generate();
        let id = midea(&f.products).await;

        f.store.add(&sid, Some(&id), Quantity::new(1)).await.unwrap();
        let payload = f.store.payload(&sid).await.unwrap();
        assert_eq!(payload.cart_count, 1);
        assert_eq!(payload.cart[0].title, "Midea MA2-24NXD0-I");
        assert_eq!(payload.cart[0].price, Decimal::new(1102, 0));

        f.store.add(&sid, Some(&id), Quantity::new(1)).await.unwrap();
        let payload = f.store.payload(&sid).await.unwrap();
        assert_eq!(payload.cart_count, 2);
        assert_eq!(payload.cart.len(), 1);
        assert_eq!(payload.cart[0].quantity, 2);
        assert_eq!(payload.cart[0].line_total_formatted, "2.204,00 € / 4310,65 лв.");
    }

    #[tokio::test]
    async fn test_add_failures_leave_cart_untouched() {
        let f = fixture();
        let sid = SessionId::generate();
        let id = midea(&f.products).await;
        f.store.add(&sid, Some(&id), Quantity::new(1)).await.unwrap();

        assert!(matches!(f.store.add(&sid, None, Quantity::new(1)).await, Err(StorefrontError::MissingProductId)));
        assert!(matches!(f.store.add(&sid, Some("  "), Quantity::new(1)).await, Err(StorefrontError::MissingProductId)));
        assert!(matches!(f.store.add(&sid, Some("nope"), Quantity::new(1)).await, Err(StorefrontError::ProductNotFound)));
        let unknown = Uuid::now_v7().to_string();
        assert!(matches!(f.store.add(&sid, Some(&unknown), Quantity::new(1)).await, Err(StorefrontError::ProductNotFound)));
        f.live.set_available(false);
        assert!(matches!(f.store.add(&sid, Some(&id), Quantity::new(1)).await, Err(StorefrontError::StorageUnavailable)));

        assert_eq!(f.store.read(&sid).await.unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_stale_index() {
        let f = fixture();
        let sid = SessionId::generate();
        let id = midea(&f.products).await;
        f.store.add(&sid, Some(&id), Quantity::new(1)).await.unwrap();

        for stale in [Some(5), Some(-1), None] {
            assert_eq!(f.store.remove(&sid, stale).await.unwrap().line_count(), 1);
        }
        assert!(f.store.remove(&sid, Some(0)).await.unwrap().is_empty());
        assert!(f.store.read(&sid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let f = fixture();
        let (a, b) = (SessionId::generate(), SessionId::generate());
        let id = midea(&f.products).await;
        f.store.add(&a, Some(&id), Quantity::new(3)).await.unwrap();
        assert!(f.store.read(&b).await.unwrap().is_empty());
        f.store.clear(&a).await.unwrap();
        assert!(f.store.read(&a).await.unwrap().is_empty());
    }

    /// Database-backed session store whose database is gone.
    struct UnreachableSessions;

    #[async_trait::async_trait]
    impl SessionStore for UnreachableSessions {
        async fn load(&self, _: &SessionId) -> crate::storage::StorageResult<Option<Vec<crate::domain::aggregates::CartLineItem>>> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn save(&self, _: &SessionId, _: &[crate::domain::aggregates::CartLineItem]) -> crate::storage::StorageResult<()> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn purge_expired(&self) -> crate::storage::StorageResult<u64> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
    }

    #[tokio::test]
    async fn test_database_sessions_fail_fast_while_offline() {
        let products = Arc::new(MemoryProductRepository::default());
        let store = CartStore::new(Arc::new(UnreachableSessions), products, Arc::new(StaticLiveness::new(false)));
        let sid = SessionId::generate();
        assert!(matches!(store.read(&sid).await, Err(StorefrontError::StorageUnavailable)));
        assert!(matches!(store.remove(&sid, Some(0)).await, Err(StorefrontError::StorageUnavailable)));
        assert!(matches!(store.clear(&sid).await, Err(StorefrontError::StorageUnavailable)));
    }

    #[tokio::test]
    async fn test_local_sessions_work_while_offline() {
        let f = fixture();
        let sid = SessionId::generate();
        let id = midea(&f.products).await;
        f.store.add(&sid, Some(&id), Quantity::new(2)).await.unwrap();
        f.live.set_available(false);

        let payload = f.store.payload(&sid).await.unwrap();
        assert_eq!(payload.cart_count, 2);
        assert_eq!(payload.cart[0].title, "Midea MA2-24NXD0-I");
        assert!(f.store.remove(&sid, Some(0)).await.unwrap().is_empty());
    }

    #[test]
    fn test_payload_totals() {
        let line = |price: i64, quantity: u32| EnrichedLine {
            item: crate::domain::aggregates::CartLineItem {
                product_id: "p".into(), quantity, title: "t".into(), price: Decimal::new(price, 2), img: String::new(),
            },
            model_label: "t".into(),
        };
        let payload = CartPayload::build(&[line(10000, 2), line(5050, 1)]);
        assert_eq!(payload.total_eur_formatted, "250,50 €");
        assert_eq!(payload.total_bgn_formatted, "489,94 лв.");
        assert_eq!(payload.cart_count, 3);
        assert_eq!(payload.cart[1].index, 1);
        assert_eq!(payload.cart[1].img, DEFAULT_PRODUCT_IMAGE);

        let empty = CartPayload::empty();
        assert_eq!((empty.total_eur_formatted.as_str(), empty.total_bgn_formatted.as_str(), empty.cart_count), ("0,00 €", "0,00 лв.", 0));
    }
}

//! Postgres storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use uuid::Uuid;
use crate::catalog::{ProductFilter, RawFacets, Scope};
use crate::domain::aggregates::{CartLineItem, Customer, NewProduct, Order, OrderItem, Product, ProductPatch};
use crate::domain::value_objects::{Availability, Category, ProductClass};
use crate::session::SessionId;
use crate::storage::{OrderRepository, ProductRepository, SessionStore, StorageError, StorageResult};

const PRODUCT_COLUMNS: &str = "id, category, price, current_offer, description, power, class, img, brand, model, \
     availability, energy_class, wifi, room_size, recommended, created_at, updated_at";

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    category: String,
    price: Decimal,
    current_offer: String,
    description: String,
    power: Decimal,
    class: Option<String>,
    img: String,
    brand: String,
    model: String,
    availability: Option<String>,
    energy_class: String,
    wifi: bool,
    room_size: Option<Decimal>,
    recommended: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_tag<T: FromStr>(id: Uuid, column: &str, raw: &str) -> StorageResult<T> {
    raw.parse().map_err(|_| StorageError::Corrupt { id: id.to_string(), reason: format!("bad {column} {raw:?}") })
}

impl TryFrom<ProductRow> for Product {
    type Error = StorageError;

    fn try_from(row: ProductRow) -> StorageResult<Self> {
        let id = row.id;
        Ok(Product {
            id,
            category: parse_tag::<Category>(id, "category", &row.category)?,
            price: row.price,
            current_offer: row.current_offer,
            description: row.description,
            power: row.power,
            class: row.class.as_deref().map(|c| parse_tag::<ProductClass>(id, "class", c)).transpose()?,
            img: row.img,
            brand: row.brand,
            model: row.model,
            availability: row.availability.as_deref().map(|a| parse_tag::<Availability>(id, "availability", a)).transpose()?,
            energy_class: row.energy_class,
            wifi: row.wifi,
            room_size: row.room_size,
            recommended: row.recommended,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> StorageResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

fn as_i64(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

/// Appends the filter's predicates to a query that already ends in a WHERE clause.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(c) = filter.category {
        qb.push(" AND category = ").push_bind(c.as_str());
    }
    if let Some(a) = filter.availability {
        qb.push(" AND availability = ").push_bind(a.as_str());
    }
    if let Some(c) = filter.class {
        qb.push(" AND class = ").push_bind(c.as_str());
    }
    if !filter.brands.is_empty() {
        qb.push(" AND lower(btrim(brand, E' \\t\\r\\n')) = ANY(").push_bind(filter.brand_keys()).push(")");
    }
    match filter.power.as_slice() {
        [] => {}
        [single] => { qb.push(" AND power = ").push_bind(*single); }
        many => { qb.push(" AND power = ANY(").push_bind(many.to_vec()).push(")"); }
    }
    if let Some(min) = filter.price.min {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.price.max {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(e) = &filter.energy_class {
        qb.push(" AND energy_class = ").push_bind(e.clone());
    }
    if filter.wifi_only {
        qb.push(" AND wifi = TRUE");
    }
    if let Some(size) = filter.room_size {
        qb.push(" AND room_size = ").push_bind(size);
    }
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn distinct<T>(&self, column: &'static str, extra: &'static str, scope: Scope) -> StorageResult<Vec<T>>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Send + Unpin,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT DISTINCT {column} FROM products WHERE {extra}"));
        push_filter(&mut qb, &ProductFilter::for_scope(scope));
        qb.push(format!(" ORDER BY {column}"));
        Ok(qb.build_query_scalar::<T>().fetch_all(&self.pool).await?)
    }

    async fn price_bounds(&self, scope: Scope) -> StorageResult<(Option<Decimal>, Option<Decimal>)> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT MIN(price), MAX(price) FROM products WHERE TRUE");
        push_filter(&mut qb, &ProductFilter::for_scope(scope));
        Ok(qb.build_query_as::<(Option<Decimal>, Option<Decimal>)>().fetch_one(&self.pool).await?)
    }

    async fn write(&self, product: &Product) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO products (id, category, price, current_offer, description, power, class, img, brand, model, \
             availability, energy_class, wifi, room_size, recommended, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (id) DO UPDATE SET category = $2, price = $3, current_offer = $4, description = $5, \
             power = $6, class = $7, img = $8, brand = $9, model = $10, availability = $11, energy_class = $12, \
             wifi = $13, room_size = $14, recommended = $15, updated_at = $17",
        )
        .bind(product.id).bind(product.category.as_str()).bind(product.price).bind(&product.current_offer)
        .bind(&product.description).bind(product.power).bind(product.class.map(|c| c.as_str()))
        .bind(&product.img).bind(&product.brand).bind(&product.model)
        .bind(product.availability.map(|a| a.as_str())).bind(&product.energy_class).bind(product.wifi)
        .bind(product.room_size).bind(product.recommended).bind(product.created_at).bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StorageResult<Vec<Product>> {
        if ids.is_empty() { return Ok(vec![]); }
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    async fn count(&self, filter: &ProductFilter) -> StorageResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_filter(&mut qb, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn find_page(&self, filter: &ProductFilter, skip: u64, limit: u64) -> StorageResult<Vec<Product>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(as_i64(limit));
        qb.push(" OFFSET ").push_bind(as_i64(skip));
        into_products(qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?)
    }

    async fn recommended(&self, limit: u64) -> StorageResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE recommended ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(as_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        into_products(rows)
    }

    async fn others(&self, excluding: Uuid, limit: u64) -> StorageResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id <> $1 ORDER BY created_at LIMIT $2"
        ))
        .bind(excluding)
        .bind(as_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        into_products(rows)
    }

    async fn facet_values(&self, scope: Scope) -> StorageResult<RawFacets> {
        let (availability, classes, brands, power, energy_classes, room_sizes, (price_min, price_max)) = tokio::try_join!(
            self.distinct::<String>("availability", "availability IS NOT NULL", scope),
            self.distinct::<String>("class", "class IS NOT NULL", scope),
            self.distinct::<String>("brand", "brand <> ''", scope),
            self.distinct::<Decimal>("power", "power > 0", scope),
            self.distinct::<String>("energy_class", "energy_class <> ''", scope),
            self.distinct::<Decimal>("room_size", "room_size IS NOT NULL", scope),
            self.price_bounds(scope),
        )?;
        Ok(RawFacets {
            availability: availability.iter().filter_map(|a| a.parse().ok()).collect(),
            classes: classes.iter().filter_map(|c| c.parse().ok()).collect(),
            brands,
            power,
            energy_classes,
            room_sizes,
            price_min,
            price_max,
        })
    }

    async fn create(&self, input: NewProduct) -> StorageResult<Product> {
        let product = Product::create(input);
        self.write(&product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> StorageResult<Option<Product>> {
        let Some(mut product) = self.find_by_id(id).await? else { return Ok(None) };
        product.apply(patch);
        self.write(&product).await?;
        Ok(Some(product))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    full_name: String,
    phone: String,
    address: String,
    comment: String,
    total: Decimal,
    ready: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    title: String,
    price: Decimal,
    quantity: i64,
    img: String,
}

fn order_item(order_id: Uuid, row: OrderItemRow) -> StorageResult<OrderItem> {
    let quantity = u32::try_from(row.quantity).ok().filter(|q| *q >= 1).ok_or_else(|| StorageError::Corrupt {
        id: order_id.to_string(),
        reason: format!("item quantity {} out of range", row.quantity),
    })?;
    Ok(OrderItem { product_id: row.product_id, title: row.title, price: row.price, quantity, img: row.img })
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: &Order) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO orders (id, full_name, phone, address, comment, total, ready, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id).bind(&order.customer.full_name).bind(&order.customer.phone)
        .bind(&order.customer.address).bind(&order.customer.comment).bind(order.total)
        .bind(order.ready).bind(order.created_at).bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, position, product_id, title, price, quantity, img) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(order.id).bind(position as i32).bind(&item.product_id).bind(&item.title)
            .bind(item.price).bind(i64::from(item.quantity)).bind(&item.img)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Order>> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(
            "SELECT id, full_name, phone, address, comment, total, ready, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT product_id, title, price, quantity, img FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let customer = Customer { full_name: row.full_name, phone: row.phone, address: row.address, comment: row.comment };
        Ok(Some(Order::restore(
            row.id, customer, items.into_iter().map(|item| order_item(id, item)).collect::<StorageResult<_>>()?,
            row.total, row.ready, row.created_at, row.updated_at,
        )))
    }

    async fn set_ready(&self, id: Uuid, ready: bool) -> StorageResult<Option<Order>> {
        let updated = sqlx::query("UPDATE orders SET ready = $2, updated_at = NOW() WHERE id = $1 AND ready <> $2")
            .bind(id)
            .bind(ready)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() > 0 {
            tracing::info!(order_id = %id, ready, "order ready flag changed");
        }
        self.find_by_id(id).await
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Carts stored as JSONB, one row per session, expiring after the session TTL.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, ttl: Duration) -> Self { Self { pool, ttl } }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, id: &SessionId) -> StorageResult<Option<Vec<CartLineItem>>> {
        let cart: Option<Json<Vec<CartLineItem>>> =
            sqlx::query_scalar("SELECT cart FROM sessions WHERE id = $1 AND expires_at > NOW()")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(cart.map(|Json(items)| items))
    }

    async fn save(&self, id: &SessionId, cart: &[CartLineItem]) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, cart, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET cart = EXCLUDED.cart, expires_at = EXCLUDED.expires_at",
        )
        .bind(id.as_str())
        .bind(Json(cart))
        .bind(Utc::now() + self.ttl)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::filter::BRAND_PADDING;
    use crate::catalog::QueryParams;

    fn sql_for(query: &str) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_filter(&mut qb, &ProductFilter::build(Scope::Category(Category::Floor), &QueryParams::parse(query)));
        qb.sql().to_string()
    }

    #[test]
    fn test_push_filter_scope_only() {
        assert_eq!(sql_for(""), "SELECT COUNT(*) FROM products WHERE TRUE AND category = $1");
    }

    #[test]
    fn test_push_filter_binds_in_order() {
        let sql = sql_for("brand=LG&moshtnost=9000&moshtnost=12000&minPrice=100&wifi=1");
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM products WHERE TRUE AND category = $1 \
             AND lower(btrim(brand, E' \\t\\r\\n')) = ANY($2) AND power = ANY($3) AND price >= $4 AND wifi = TRUE"
        );
        assert!(sql_for("moshtnost=9000").ends_with("AND power = $2"));
    }

    #[test]
    fn test_corrupt_category_is_reported() {
        let now = Utc::now();
        let row = ProductRow {
            id: Uuid::now_v7(), category: "window".into(), price: Decimal::ZERO, current_offer: String::new(),
            description: String::new(), power: Decimal::ZERO, class: None, img: String::new(), brand: String::new(),
            model: String::new(), availability: None, energy_class: String::new(), wifi: false, room_size: None,
            recommended: false, created_at: now, updated_at: now,
        };
        assert!(matches!(Product::try_from(row), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_brand_trim_matches_rust_side() {
        assert_eq!(BRAND_PADDING, [' ', '\t', '\r', '\n']);
        assert!(sql_for("brand=LG").contains("btrim(brand, E' \\t\\r\\n')"));
    }

    #[test]
    fn test_order_item_quantity_is_kept_exactly() {
        let row = |quantity: i64| OrderItemRow {
            product_id: "p".into(), title: "Midea".into(), price: Decimal::new(1102, 0), quantity, img: String::new(),
        };
        let id = Uuid::now_v7();
        assert_eq!(order_item(id, row(i64::from(u32::MAX))).unwrap().quantity, u32::MAX);
        assert!(matches!(order_item(id, row(0)), Err(StorageError::Corrupt { .. })));
        assert!(matches!(order_item(id, row(i64::from(u32::MAX) + 1)), Err(StorageError::Corrupt { .. })));
    }
}

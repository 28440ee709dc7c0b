//! Order Aggregate
//!
//! Orders are written once at checkout. Items are snapshots of the cart lines and are
//! never recomputed from current product data. Only the `ready` flag changes later.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::cart::CartLineItem;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    /// Grand total in EUR.
    pub total: Decimal,
    pub ready: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
    pub img: String,
}

impl From<&CartLineItem> for OrderItem {
    fn from(line: &CartLineItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            title: line.title.clone(),
            price: line.price,
            quantity: line.quantity,
            img: line.img.clone(),
        }
    }
}

impl OrderItem {
    pub fn line_total(&self) -> Money { Money::eur(self.price).multiply(self.quantity) }
}

impl Order {
    /// Builds a new order from already validated customer data and item snapshots.
    pub fn place(customer: Customer, items: Vec<OrderItem>, total: Money) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::now_v7(), customer, items, total: total.amount(), ready: false,
            created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: order.id,
            item_count: order.items.iter().map(|i| i.quantity).fold(0u32, u32::saturating_add),
            total: order.total,
        }));
        Ok(order)
    }

    /// Rebuilds a stored order; no events are raised.
    pub fn restore(
        id: Uuid, customer: Customer, items: Vec<OrderItem>, total: Decimal, ready: bool,
        created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, customer, items, total, ready, created_at, updated_at, events: vec![] }
    }

    pub fn total(&self) -> Money { Money::eur(self.total) }

    pub fn set_ready(&mut self, ready: bool) {
        if self.ready == ready { return; }
        self.ready = ready;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::ReadyChanged { order_id: self.id, ready }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderError {
    #[error("No items")]
    NoItems,
}

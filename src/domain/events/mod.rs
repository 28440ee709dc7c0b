//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, item_count: u32, total: Decimal },
    ReadyChanged { order_id: Uuid, ready: bool },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            DomainEvent::Order(OrderEvent::Placed { .. }) => "storefront.orders.placed",
            DomainEvent::Order(OrderEvent::ReadyChanged { .. }) => "storefront.orders.ready_changed",
        }
    }
}

//! Domain event publishing over NATS.

use crate::domain::events::DomainEvent;

/// Publishes domain events when a NATS client is configured; otherwise a no-op.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Best effort: failures are logged and never reach the caller.
    pub async fn publish(&self, events: Vec<DomainEvent>) {
        let Some(client) = &self.nats else { return };
        for event in events {
            let payload = match serde_json::to_vec(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(subject = event.subject(), "event encoding failed: {e}");
                    continue;
                }
            };
            if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
                tracing::warn!(subject = event.subject(), "event publish failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::OrderEvent;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_disabled_publisher_is_a_noop() {
        let publisher = EventPublisher::default();
        assert!(!publisher.is_enabled());
        publisher
            .publish(vec![DomainEvent::Order(OrderEvent::Placed { order_id: Uuid::now_v7(), item_count: 1, total: Decimal::ONE })])
            .await;
    }

    #[test]
    fn test_event_wire_format() {
        let event = DomainEvent::Order(OrderEvent::ReadyChanged { order_id: Uuid::nil(), ready: true });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "order");
        assert_eq!(json["type"], "ready_changed");
        assert_eq!(json["ready"], true);
        assert_eq!(event.subject(), "storefront.orders.ready_changed");
    }
}

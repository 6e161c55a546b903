//! Delivery of committed sale events.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::event::DomainEvent;
use crate::sale::SaleEvent;

/// Default capacity of the broadcast channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Sink for sale events.
///
/// Publishing is best-effort: implementations handle their own failures
/// and never report them back to the handler that raised the event.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Delivers one event.
    async fn publish(&self, event: SaleEvent);
}

#[async_trait]
impl<E: EventPublisher + ?Sized> EventPublisher for Arc<E> {
    async fn publish(&self, event: SaleEvent) {
        (**self).publish(event).await
    }
}

/// Publisher that writes every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: SaleEvent) {
        let sale = event.sale();
        tracing::info!(
            event = event.event_type(),
            sale_id = %sale.id(),
            sale_number = sale.sale_number(),
            total_amount = %sale.total_amount(),
            cancelled = sale.is_cancelled(),
            "Domain Event: {}",
            event.event_type()
        );
    }
}

/// Publisher that fans events out to in-process subscribers.
///
/// Subscribers that fall behind by more than the channel capacity lose the
/// oldest events. Events published while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<SaleEvent>,
}

impl BroadcastEventPublisher {
    /// Creates a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SaleEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: SaleEvent) {
        let event_type = event.event_type();
        if self.sender.send(event).is_err() {
            tracing::debug!(event = event_type, "no subscribers for sale event");
        }
    }
}

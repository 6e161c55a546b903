//! Sale domain events.

use common::SaleId;
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::Sale;

/// Events raised after a sale mutation has been committed.
///
/// Each event carries the full post-mutation snapshot of the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SaleEvent {
    /// A sale was recorded.
    SaleCreated(Sale),

    /// Details or items of a sale changed.
    SaleUpdated(Sale),

    /// A sale was cancelled.
    SaleCanceled(Sale),
}

impl DomainEvent for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated(_) => "SaleCreated",
            SaleEvent::SaleUpdated(_) => "SaleUpdated",
            SaleEvent::SaleCanceled(_) => "SaleCanceled",
        }
    }
}

// Constructors
impl SaleEvent {
    pub fn created(sale: &Sale) -> Self {
        SaleEvent::SaleCreated(sale.clone())
    }

    pub fn updated(sale: &Sale) -> Self {
        SaleEvent::SaleUpdated(sale.clone())
    }

    pub fn canceled(sale: &Sale) -> Self {
        SaleEvent::SaleCanceled(sale.clone())
    }
}

impl SaleEvent {
    /// Returns the sale snapshot carried by the event.
    pub fn sale(&self) -> &Sale {
        match self {
            SaleEvent::SaleCreated(sale)
            | SaleEvent::SaleUpdated(sale)
            | SaleEvent::SaleCanceled(sale) => sale,
        }
    }

    /// Returns the id of the sale the event is about.
    pub fn sale_id(&self) -> SaleId {
        self.sale().id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::TieredDiscountPolicy;
    use crate::sale::SaleLine;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn sample_sale() -> Sale {
        Sale::create(
            "S-001",
            Utc::now(),
            "Ana",
            "Downtown",
            &[SaleLine::new("Beer", 2, Decimal::from(10))],
            &TieredDiscountPolicy::standard(),
        )
        .unwrap()
    }

    #[test]
    fn test_event_types() {
        let sale = sample_sale();
        assert_eq!(SaleEvent::created(&sale).event_type(), "SaleCreated");
        assert_eq!(SaleEvent::updated(&sale).event_type(), "SaleUpdated");
        assert_eq!(SaleEvent::canceled(&sale).event_type(), "SaleCanceled");
    }

    #[test]
    fn test_event_carries_snapshot() {
        let sale = sample_sale();
        let event = SaleEvent::created(&sale);

        assert_eq!(event.sale_id(), sale.id());
        assert_eq!(event.sale(), &sale);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let sale = sample_sale();
        let json = serde_json::to_value(SaleEvent::canceled(&sale)).unwrap();

        assert_eq!(json["type"], "SaleCanceled");
        assert_eq!(json["data"]["sale_number"], "S-001");

        let back: SaleEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.sale_id(), sale.id());
    }
}

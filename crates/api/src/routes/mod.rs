//! HTTP route handlers.

pub mod health;
pub mod items;
pub mod metrics;
pub mod sales;

use std::sync::Arc;

use common::{SaleId, SaleItemId};
use domain::{EventPublisher, SaleService, TieredDiscountPolicy, ValidationError};
use sale_store::SaleRepository;

use crate::error::ApiError;

/// Sale handlers as wired into the HTTP layer.
pub type Sales<R> = SaleService<R, TieredDiscountPolicy, Arc<dyn EventPublisher>>;

/// Shared application state accessible from all handlers.
pub struct AppState<R: SaleRepository> {
    pub sales: Sales<R>,
}

impl<R: SaleRepository> AppState<R> {
    /// Creates state using the standard discount tiers.
    pub fn new(repository: R, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            sales: SaleService::new(repository, TieredDiscountPolicy::standard(), publisher),
        }
    }
}

pub(crate) fn parse_sale_id(raw: &str) -> Result<SaleId, ApiError> {
    raw.parse()
        .map_err(|source| ApiError::InvalidId { field: "id", source })
}

pub(crate) fn parse_item_id(raw: &str) -> Result<SaleItemId, ApiError> {
    raw.parse().map_err(|source| ApiError::InvalidId {
        field: "itemId",
        source,
    })
}

/// Rejects the request when validation reported anything.
pub(crate) fn ensure_valid(
    command: &'static str,
    errors: Vec<ValidationError>,
) -> Result<(), ApiError> {
    if errors.is_empty() {
        return Ok(());
    }

    tracing::warn!(command, failures = errors.len(), "request failed validation");
    ::metrics::counter!("sales_requests_invalid_total", "command" => command).increment(1);
    Err(ApiError::Invalid(errors))
}

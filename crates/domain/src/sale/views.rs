//! Read-side shapes returned by the sale queries.

use chrono::{DateTime, Utc};
use common::{SaleId, SaleItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Sale, SaleItem};

/// A sale as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    pub id: SaleId,
    pub sale_number: String,
    pub date: DateTime<Utc>,
    pub customer: String,
    pub branch: String,
    pub total_amount: Decimal,
    pub cancelled: bool,
    pub items: Vec<SaleItemView>,
}

/// A sale item as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemView {
    pub id: SaleItemId,
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub cancelled: bool,
}

impl From<&Sale> for SaleView {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            date: sale.date(),
            customer: sale.customer().to_string(),
            branch: sale.branch().to_string(),
            total_amount: sale.total_amount(),
            cancelled: sale.is_cancelled(),
            items: sale.items().iter().map(SaleItemView::from).collect(),
        }
    }
}

impl From<&SaleItem> for SaleItemView {
    fn from(item: &SaleItem) -> Self {
        Self {
            id: item.id(),
            product: item.product().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            discount: item.discount(),
            total: item.total(),
            cancelled: item.is_cancelled(),
        }
    }
}

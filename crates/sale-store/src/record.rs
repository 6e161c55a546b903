use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{SaleId, SaleItemId};

/// Persisted form of a sale and all of its items.
///
/// Records carry no behavior. Derived amounts (`total_amount`, item
/// `discount` and `total`) are stored as computed by the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// The sale identifier.
    pub id: SaleId,

    /// Caller-supplied business key.
    pub sale_number: String,

    /// When the sale happened.
    pub date: DateTime<Utc>,

    /// Customer name.
    pub customer: String,

    /// Branch where the sale was made.
    pub branch: String,

    /// Sum of all item totals.
    pub total_amount: Decimal,

    /// Whether the sale was cancelled.
    pub cancelled: bool,

    /// Items in insertion order.
    pub items: Vec<SaleItemRecord>,
}

/// Persisted form of a single sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemRecord {
    /// The item identifier.
    pub id: SaleItemId,

    /// The owning sale.
    pub sale_id: SaleId,

    pub product: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub cancelled: bool,
}

//! Sale commands.

use chrono::{DateTime, Utc};
use common::{SaleId, SaleItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product, quantity and unit price for one line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SaleLine {
    /// Creates a new sale line.
    pub fn new(product: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product: product.into(),
            quantity,
            unit_price,
        }
    }
}

/// Command to record a new sale with its items.
#[derive(Debug, Clone)]
pub struct CreateSale {
    /// Caller-supplied business key.
    pub sale_number: String,

    /// When the sale happened.
    pub date: DateTime<Utc>,

    pub customer: String,
    pub branch: String,

    /// Lines in the order they should appear on the sale.
    pub items: Vec<SaleLine>,
}

impl CreateSale {
    /// Creates a new CreateSale command.
    pub fn new(
        sale_number: impl Into<String>,
        date: DateTime<Utc>,
        customer: impl Into<String>,
        branch: impl Into<String>,
        items: Vec<SaleLine>,
    ) -> Self {
        Self {
            sale_number: sale_number.into(),
            date,
            customer: customer.into(),
            branch: branch.into(),
            items,
        }
    }
}

/// Command to replace the details and every item of an existing sale.
///
/// Items are rebuilt from `items` and receive new ids.
#[derive(Debug, Clone)]
pub struct UpdateSale {
    pub sale_id: SaleId,
    pub sale_number: String,
    pub date: DateTime<Utc>,
    pub customer: String,
    pub branch: String,
    pub items: Vec<SaleLine>,
}

impl UpdateSale {
    /// Creates a new UpdateSale command.
    pub fn new(
        sale_id: SaleId,
        sale_number: impl Into<String>,
        date: DateTime<Utc>,
        customer: impl Into<String>,
        branch: impl Into<String>,
        items: Vec<SaleLine>,
    ) -> Self {
        Self {
            sale_id,
            sale_number: sale_number.into(),
            date,
            customer: customer.into(),
            branch: branch.into(),
            items,
        }
    }
}

/// Command to cancel a sale and all of its items.
#[derive(Debug, Clone, Copy)]
pub struct CancelSale {
    pub sale_id: SaleId,
}

impl CancelSale {
    /// Creates a new CancelSale command.
    pub fn new(sale_id: SaleId) -> Self {
        Self { sale_id }
    }
}

/// Command to remove a sale permanently.
#[derive(Debug, Clone, Copy)]
pub struct DeleteSale {
    pub sale_id: SaleId,
}

impl DeleteSale {
    /// Creates a new DeleteSale command.
    pub fn new(sale_id: SaleId) -> Self {
        Self { sale_id }
    }
}

/// Command to append an item to a sale.
#[derive(Debug, Clone)]
pub struct AddSaleItem {
    pub sale_id: SaleId,
    pub line: SaleLine,
}

impl AddSaleItem {
    /// Creates a new AddSaleItem command.
    pub fn new(sale_id: SaleId, line: SaleLine) -> Self {
        Self { sale_id, line }
    }

    /// Creates a new AddSaleItem command from individual fields.
    pub fn with_details(
        sale_id: SaleId,
        product: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            sale_id,
            line: SaleLine::new(product, quantity, unit_price),
        }
    }
}

/// Command to change the quantity and unit price of an item.
#[derive(Debug, Clone, Copy)]
pub struct UpdateSaleItem {
    pub sale_id: SaleId,
    pub item_id: SaleItemId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl UpdateSaleItem {
    /// Creates a new UpdateSaleItem command.
    pub fn new(sale_id: SaleId, item_id: SaleItemId, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            sale_id,
            item_id,
            quantity,
            unit_price,
        }
    }
}

/// Command to remove an item from a sale.
#[derive(Debug, Clone, Copy)]
pub struct RemoveSaleItem {
    pub sale_id: SaleId,
    pub item_id: SaleItemId,
}

impl RemoveSaleItem {
    /// Creates a new RemoveSaleItem command.
    pub fn new(sale_id: SaleId, item_id: SaleItemId) -> Self {
        Self { sale_id, item_id }
    }
}

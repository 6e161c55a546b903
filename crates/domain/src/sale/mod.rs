//! Sale aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod item;
mod service;
mod state;
mod views;

pub use aggregate::Sale;
pub use commands::*;
pub use events::SaleEvent;
pub use item::SaleItem;
pub use service::{AddSaleItemResult, CreateSaleResult, SaleService};
pub use state::SaleState;
pub use views::{SaleItemView, SaleView};

use common::SaleItemId;
use thiserror::Error;

use crate::discount::MAX_ITEM_QUANTITY;

/// Business rule violations raised by the sale aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    /// A line asked for more units than a single sale allows.
    #[error("Cannot sell more than {max} units of {product}", max = MAX_ITEM_QUANTITY)]
    QuantityTooHigh { product: String, quantity: u32 },

    /// Every line carries at least one unit.
    #[error("Quantity of {product} must be at least 1")]
    QuantityTooLow { product: String },

    /// A line or sale amount does not fit the decimal range.
    #[error("Amount for {product} is out of range")]
    AmountOutOfRange { product: String },

    /// The sale was cancelled before.
    #[error("Sale already cancelled")]
    AlreadyCancelled,

    /// Items and details of a cancelled sale are frozen.
    #[error("Sale is cancelled and cannot be modified")]
    SaleCancelled,

    /// No item with this id belongs to the sale.
    #[error("Item not found")]
    ItemNotFound(SaleItemId),
}

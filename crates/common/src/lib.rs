//! Identifier types shared by every crate of the sales service.

mod types;

pub use types::{SaleId, SaleItemId};

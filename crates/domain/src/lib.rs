//! Domain layer for the retail sales service.
//!
//! This crate provides:
//! - Quantity-tiered discount policies and monetary rounding
//! - The Sale aggregate with its items, commands and events
//! - `SaleService`, one handler per sale use case
//! - Event publishers and request validation

pub mod discount;
pub mod error;
pub mod event;
pub mod money;
pub mod outcome;
pub mod publisher;
pub mod sale;
pub mod validation;

pub use discount::{DiscountPolicy, DiscountTier, MAX_ITEM_QUANTITY, TieredDiscountPolicy};
pub use error::DomainError;
pub use event::DomainEvent;
pub use money::round2;
pub use outcome::{AppError, CommandOutcome, ErrorCode};
pub use publisher::{BroadcastEventPublisher, EventPublisher, LoggingEventPublisher};
pub use sale::{
    AddSaleItem, AddSaleItemResult, CancelSale, CreateSale, CreateSaleResult, DeleteSale,
    RemoveSaleItem, Sale, SaleError, SaleEvent, SaleItem, SaleItemView, SaleLine, SaleService,
    SaleState, SaleView, UpdateSale, UpdateSaleItem,
};
pub use validation::ValidationError;

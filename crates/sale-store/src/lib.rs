//! Persistence for sale aggregates.
//!
//! The store only knows plain [`SaleRecord`]s; the domain crate converts
//! between records and the `Sale` aggregate. Writes are staged on a
//! [`UnitOfWork`] and reach the backing repository in a single commit.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod repository;

pub use common::{SaleId, SaleItemId};
pub use error::{Result, StoreError};
pub use memory::InMemorySaleRepository;
pub use postgres::PostgresSaleRepository;
pub use record::{SaleItemRecord, SaleRecord};
pub use repository::{SaleRepository, SaleRepositoryExt, StagedChange, UnitOfWork};

//! Domain error types.

use sale_store::StoreError;
use thiserror::Error;

/// Infrastructure failures surfaced by the sale handlers.
///
/// Business conditions (missing sale, quantity ceiling, cancelled sale) are
/// reported through [`CommandOutcome`](crate::CommandOutcome), never here.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the sale store.
    #[error("Sale store error: {0}")]
    Store(#[from] StoreError),

    /// A stored sale could not be turned back into an aggregate.
    #[error("Corrupt sale aggregate: {0}")]
    CorruptAggregate(String),
}

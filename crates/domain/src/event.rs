//! Domain event trait.

use serde::Serialize;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// Used as the log message and metrics label when the event is published.
    fn event_type(&self) -> &'static str;
}

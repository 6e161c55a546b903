//! Sale state machine.

use serde::{Deserialize, Serialize};

/// The state of a sale in its lifecycle.
///
/// ```text
/// Active ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SaleState {
    /// Sale is open; details and items can change.
    #[default]
    Active,

    /// Sale was cancelled (terminal state).
    Cancelled,
}

impl SaleState {
    /// Returns true if details and items can be modified in this state.
    pub fn can_modify(&self) -> bool {
        matches!(self, SaleState::Active)
    }

    /// Returns true if the sale can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, SaleState::Active)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleState::Cancelled)
    }

    /// Maps the stored cancellation flag to a state.
    pub fn from_cancelled(cancelled: bool) -> Self {
        if cancelled {
            SaleState::Cancelled
        } else {
            SaleState::Active
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleState::Active => "Active",
            SaleState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SaleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

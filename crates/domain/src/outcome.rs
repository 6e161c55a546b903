//! Structured results for sale handlers.

use serde::{Deserialize, Serialize};

use crate::sale::SaleError;

/// Category of an expected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The addressed sale or item doesn't exist.
    NotFound,

    /// The request breaks a sale invariant.
    BusinessRule,

    /// The request is malformed.
    Validation,

    /// The request failed for reasons outside the caller's control.
    Internal,
}

impl ErrorCode {
    /// Returns the code name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NotFound",
            ErrorCode::BusinessRule => "BusinessRule",
            ErrorCode::Validation => "Validation",
            ErrorCode::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One human-readable failure reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,

    /// Request field the error refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: message.into(),
            field: None,
        }
    }

    /// Creates a business-rule error.
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::BusinessRule,
            message: message.into(),
            field: None,
        }
    }

    /// Creates an error for an infrastructure failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: message.into(),
            field: None,
        }
    }

    /// Creates a validation error tied to a request field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Validation,
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl From<&SaleError> for AppError {
    fn from(err: &SaleError) -> Self {
        match err {
            SaleError::ItemNotFound(_) => AppError::not_found(err.to_string()),
            SaleError::QuantityTooHigh { .. } | SaleError::QuantityTooLow { .. } => Self {
                code: ErrorCode::BusinessRule,
                message: err.to_string(),
                field: Some("quantity".to_string()),
            },
            SaleError::AmountOutOfRange { .. } => Self {
                code: ErrorCode::BusinessRule,
                message: err.to_string(),
                field: Some("unitPrice".to_string()),
            },
            SaleError::AlreadyCancelled | SaleError::SaleCancelled => {
                AppError::business_rule(err.to_string())
            }
        }
    }
}

/// Result of a sale handler for expected outcomes.
///
/// `success` is true exactly when `errors` is empty. `data` is only set on
/// success, and only for handlers that return something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome<T> {
    pub success: bool,
    pub errors: Vec<AppError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> CommandOutcome<T> {
    /// A successful outcome carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    /// A failed outcome with one or more errors.
    pub fn fail(errors: Vec<AppError>) -> Self {
        Self {
            success: false,
            errors,
            data: None,
        }
    }

    /// A failed outcome with a single not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::fail(vec![AppError::not_found(message)])
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns true if any error is a not-found.
    pub fn is_not_found(&self) -> bool {
        self.has_code(ErrorCode::NotFound)
    }

    /// Returns true if any error carries the given code.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }

    /// Returns the error messages.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.message.as_str()).collect()
    }

    /// Converts into `Ok(data)` on success or `Err(errors)` on failure.
    pub fn into_result(self) -> Result<Option<T>, Vec<AppError>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.errors)
        }
    }
}

impl CommandOutcome<()> {
    /// A successful outcome with no data.
    pub fn done() -> Self {
        Self::ok(())
    }
}

impl<T> From<SaleError> for CommandOutcome<T> {
    fn from(err: SaleError) -> Self {
        Self::fail(vec![AppError::from(&err)])
    }
}

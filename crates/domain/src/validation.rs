//! Request-shape validation for sale commands.
//!
//! These checks run before a handler is invoked and reject malformed input.
//! The aggregate only guards its own invariants (quantity bounds, amount
//! range and cancellation). Lengths, presence, dates and duplicates are checked here.
//!
//! Every validator collects all failures instead of stopping at the first.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::discount::MAX_ITEM_QUANTITY;
use crate::outcome::AppError;
use crate::sale::{AddSaleItem, CreateSale, SaleLine, UpdateSale, UpdateSaleItem};

/// Maximum length of a sale number.
pub const MAX_SALE_NUMBER_LEN: usize = 50;

/// Maximum length of customer, branch and product names.
pub const MAX_NAME_LEN: usize = 200;

/// How far past the current time a sale date may lie.
pub const MAX_FUTURE_MINUTES: i64 = 5;

/// Largest accepted unit price.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: u32, max: u32 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: Decimal },

    #[error("{field} cannot be in the future")]
    InFuture { field: String },

    #[error("{field} contains duplicate product '{value}'")]
    Duplicate { field: String, value: String },

    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

impl ValidationError {
    /// Returns the request field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::InFuture { field }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::Empty { field } => field,
        }
    }
}

impl From<&ValidationError> for AppError {
    fn from(err: &ValidationError) -> Self {
        AppError::validation(err.field(), err.to_string())
    }
}

/// Validates a create-sale request against the current time.
pub fn validate_create_sale(cmd: &CreateSale, now: DateTime<Utc>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_header(
        &mut errors,
        &cmd.sale_number,
        cmd.date,
        &cmd.customer,
        &cmd.branch,
        now,
    );

    if cmd.items.is_empty() {
        errors.push(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    check_lines(&mut errors, &cmd.items);
    errors
}

/// Validates an update-sale request against the current time.
///
/// An empty item list is allowed and clears the sale.
pub fn validate_update_sale(cmd: &UpdateSale, now: DateTime<Utc>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_header(
        &mut errors,
        &cmd.sale_number,
        cmd.date,
        &cmd.customer,
        &cmd.branch,
        now,
    );
    check_lines(&mut errors, &cmd.items);
    errors
}

/// Validates an add-item request.
pub fn validate_add_item(cmd: &AddSaleItem) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_line(&mut errors, "", &cmd.line);
    errors
}

/// Validates an update-item request.
pub fn validate_update_item(cmd: &UpdateSaleItem) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_quantity(&mut errors, "quantity".to_string(), cmd.quantity);
    check_price(&mut errors, "unitPrice".to_string(), cmd.unit_price);
    errors
}

fn check_header(
    errors: &mut Vec<ValidationError>,
    sale_number: &str,
    date: DateTime<Utc>,
    customer: &str,
    branch: &str,
    now: DateTime<Utc>,
) {
    check_text(errors, "saleNumber", sale_number, MAX_SALE_NUMBER_LEN);

    if date > now + Duration::minutes(MAX_FUTURE_MINUTES) {
        errors.push(ValidationError::InFuture {
            field: "date".to_string(),
        });
    }

    check_text(errors, "customer", customer, MAX_NAME_LEN);
    check_text(errors, "branch", branch, MAX_NAME_LEN);
}

fn check_lines(errors: &mut Vec<ValidationError>, lines: &[SaleLine]) {
    let mut seen = HashSet::new();
    for (index, line) in lines.iter().enumerate() {
        check_line(errors, &format!("items[{index}]."), line);

        if !seen.insert(line.product.as_str()) {
            errors.push(ValidationError::Duplicate {
                field: "items".to_string(),
                value: line.product.clone(),
            });
        }
    }
}

fn check_line(errors: &mut Vec<ValidationError>, prefix: &str, line: &SaleLine) {
    check_text(
        errors,
        &format!("{prefix}product"),
        &line.product,
        MAX_NAME_LEN,
    );
    check_quantity(errors, format!("{prefix}quantity"), line.quantity);
    check_price(errors, format!("{prefix}unitPrice"), line.unit_price);
}

fn check_text(errors: &mut Vec<ValidationError>, field: &str, value: &str, max: usize) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(ValidationError::Required {
            field: field.to_string(),
        });
    } else if value.chars().count() > max {
        errors.push(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
}

fn check_quantity(errors: &mut Vec<ValidationError>, field: String, quantity: u32) {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        errors.push(ValidationError::OutOfRange {
            field,
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
}

fn check_price(errors: &mut Vec<ValidationError>, field: String, amount: Decimal) {
    if amount <= Decimal::ZERO {
        errors.push(ValidationError::MustBePositive { field });
    } else if amount > MAX_UNIT_PRICE {
        errors.push(ValidationError::TooLarge {
            field,
            max: MAX_UNIT_PRICE,
        });
    }
}

//! Sale line items.

use common::{SaleId, SaleItemId};
use rust_decimal::Decimal;
use sale_store::SaleItemRecord;
use serde::{Deserialize, Serialize};

use crate::discount::{DiscountPolicy, MAX_ITEM_QUANTITY};
use crate::error::DomainError;
use crate::money::round2;

use super::SaleError;

/// A single product line of a sale.
///
/// `discount` and `total` are derived from quantity, unit price and the
/// discount policy every time either input changes. They are never set
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    id: SaleItemId,
    product: String,
    quantity: u32,
    unit_price: Decimal,
    discount: Decimal,
    total: Decimal,
    cancelled: bool,
}

impl SaleItem {
    /// Creates a new line with a fresh id.
    pub fn create<P>(
        product: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        policy: &P,
    ) -> Result<Self, SaleError>
    where
        P: DiscountPolicy + ?Sized,
    {
        let product = product.into();
        ensure_quantity(&product, quantity)?;

        let (discount, total) = price_line(&product, quantity, unit_price, policy)?;
        Ok(Self {
            id: SaleItemId::new(),
            product,
            quantity,
            unit_price,
            discount,
            total,
            cancelled: false,
        })
    }

    /// Changes quantity and unit price in place, keeping the item's id.
    pub fn update_values<P>(
        &mut self,
        quantity: u32,
        unit_price: Decimal,
        policy: &P,
    ) -> Result<(), SaleError>
    where
        P: DiscountPolicy + ?Sized,
    {
        ensure_quantity(&self.product, quantity)?;

        let (discount, total) = price_line(&self.product, quantity, unit_price, policy)?;
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.discount = discount;
        self.total = total;
        Ok(())
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn id(&self) -> SaleItemId {
        self.id
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn to_record(&self, sale_id: SaleId) -> SaleItemRecord {
        SaleItemRecord {
            id: self.id,
            sale_id,
            product: self.product.clone(),
            // Bounded by MAX_ITEM_QUANTITY
            quantity: self.quantity as i32,
            unit_price: self.unit_price,
            discount: self.discount,
            total: self.total,
            cancelled: self.cancelled,
        }
    }

    pub(crate) fn from_record(record: SaleItemRecord) -> Result<Self, DomainError> {
        let quantity = u32::try_from(record.quantity).map_err(|_| {
            DomainError::CorruptAggregate(format!(
                "item {} has negative quantity {}",
                record.id, record.quantity
            ))
        })?;

        Ok(Self {
            id: record.id,
            product: record.product,
            quantity,
            unit_price: record.unit_price,
            discount: record.discount,
            total: record.total,
            cancelled: record.cancelled,
        })
    }
}

/// Rejects empty lines and quantities above the per-line ceiling.
pub(crate) fn ensure_quantity(product: &str, quantity: u32) -> Result<(), SaleError> {
    if quantity == 0 {
        return Err(SaleError::QuantityTooLow {
            product: product.to_string(),
        });
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(SaleError::QuantityTooHigh {
            product: product.to_string(),
            quantity,
        });
    }
    Ok(())
}

/// Computes `(discount, total)` for a line.
fn price_line<P>(
    product: &str,
    quantity: u32,
    unit_price: Decimal,
    policy: &P,
) -> Result<(Decimal, Decimal), SaleError>
where
    P: DiscountPolicy + ?Sized,
{
    let out_of_range = || SaleError::AmountOutOfRange {
        product: product.to_string(),
    };

    let gross = Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(out_of_range)?;
    let discount = gross
        .checked_mul(policy.percent(quantity))
        .map(round2)
        .ok_or_else(out_of_range)?;
    let total = gross
        .checked_sub(discount)
        .map(round2)
        .ok_or_else(out_of_range)?;
    Ok((discount, total))
}

//! Quantity-based discount policies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of units of a single product on one sale line.
pub const MAX_ITEM_QUANTITY: u32 = 20;

/// Maps a line quantity to the fraction of the gross amount to discount.
///
/// Implementations must be pure. Any `Fn(u32) -> Decimal` closure is a
/// policy, which makes alternate schedules easy to inject in tests.
pub trait DiscountPolicy: Send + Sync {
    /// Returns the discount fraction for a quantity (`0.10` is ten percent).
    fn percent(&self, quantity: u32) -> Decimal;
}

impl<F> DiscountPolicy for F
where
    F: Fn(u32) -> Decimal + Send + Sync,
{
    fn percent(&self, quantity: u32) -> Decimal {
        self(quantity)
    }
}

/// An inclusive quantity band and the discount it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTier {
    pub min_quantity: u32,
    pub max_quantity: u32,
    pub percent: Decimal,
}

impl DiscountTier {
    /// Creates a new tier covering `min_quantity..=max_quantity`.
    pub fn new(min_quantity: u32, max_quantity: u32, percent: Decimal) -> Self {
        Self {
            min_quantity,
            max_quantity,
            percent,
        }
    }

    /// Returns true if the quantity falls within this tier.
    pub fn contains(&self, quantity: u32) -> bool {
        (self.min_quantity..=self.max_quantity).contains(&quantity)
    }
}

/// Table-driven discount policy.
///
/// The first tier containing the quantity wins. Quantities outside every
/// tier get no discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredDiscountPolicy {
    tiers: Vec<DiscountTier>,
}

impl TieredDiscountPolicy {
    /// Creates a policy from an explicit list of tiers.
    pub fn new(tiers: Vec<DiscountTier>) -> Self {
        Self { tiers }
    }

    /// The standard retail schedule.
    ///
    /// ```text
    /// 1-3   units:  0%
    /// 4-9   units: 10%
    /// 10-20 units: 20%
    /// ```
    pub fn standard() -> Self {
        Self::new(vec![
            DiscountTier::new(1, 3, Decimal::ZERO),
            DiscountTier::new(4, 9, Decimal::new(10, 2)),
            DiscountTier::new(10, MAX_ITEM_QUANTITY, Decimal::new(20, 2)),
        ])
    }

    /// Returns the configured tiers.
    pub fn tiers(&self) -> &[DiscountTier] {
        &self.tiers
    }
}

impl Default for TieredDiscountPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl DiscountPolicy for TieredDiscountPolicy {
    fn percent(&self, quantity: u32) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| tier.contains(quantity))
            .map(|tier| tier.percent)
            .unwrap_or(Decimal::ZERO)
    }
}

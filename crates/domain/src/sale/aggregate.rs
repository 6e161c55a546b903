//! Sale aggregate implementation.

use chrono::{DateTime, Utc};
use common::{SaleId, SaleItemId};
use rust_decimal::Decimal;
use sale_store::SaleRecord;
use serde::{Deserialize, Serialize};

use crate::discount::DiscountPolicy;
use crate::error::DomainError;

use super::item::ensure_quantity;
use super::{SaleError, SaleItem, SaleLine, SaleState};

/// Sale aggregate root.
///
/// Owns its items exclusively and keeps `total_amount` equal to the sum of
/// every item total, cancelled items included. Cancelling a sale cancels all
/// of its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    sale_number: String,
    date: DateTime<Utc>,
    customer: String,
    branch: String,
    total_amount: Decimal,
    state: SaleState,
    items: Vec<SaleItem>,
}

// Query methods
impl Sale {
    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn sale_number(&self) -> &str {
        &self.sale_number
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the sum of all item totals.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Returns the current state.
    pub fn state(&self) -> SaleState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == SaleState::Cancelled
    }

    /// Returns the items in insertion order.
    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    /// Returns an item by id.
    pub fn item(&self, item_id: SaleItemId) -> Option<&SaleItem> {
        self.items.iter().find(|item| item.id() == item_id)
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

// Command methods
impl Sale {
    /// Builds a new active sale with a fresh id.
    ///
    /// Fails on the first line with a quantity outside `1..=20` or an amount
    /// that does not fit a `Decimal`.
    pub fn create<P>(
        sale_number: impl Into<String>,
        date: DateTime<Utc>,
        customer: impl Into<String>,
        branch: impl Into<String>,
        lines: &[SaleLine],
        policy: &P,
    ) -> Result<Self, SaleError>
    where
        P: DiscountPolicy + ?Sized,
    {
        let items = build_items(lines, policy)?;
        let total_amount = sum_totals(&items)?;

        Ok(Self {
            id: SaleId::new(),
            sale_number: sale_number.into(),
            date,
            customer: customer.into(),
            branch: branch.into(),
            total_amount,
            state: SaleState::Active,
            items,
        })
    }

    /// Appends a new item and returns its id.
    pub fn add_item<P>(
        &mut self,
        product: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        policy: &P,
    ) -> Result<SaleItemId, SaleError>
    where
        P: DiscountPolicy + ?Sized,
    {
        self.ensure_modifiable()?;
        let product = product.into();
        ensure_quantity(&product, quantity)?;

        let item = SaleItem::create(product, quantity, unit_price, policy)?;
        let total_amount = sum_totals(self.items.iter().chain([&item]))?;

        let item_id = item.id();
        self.items.push(item);
        self.total_amount = total_amount;
        Ok(item_id)
    }

    /// Changes quantity and unit price of an existing item.
    pub fn update_item<P>(
        &mut self,
        item_id: SaleItemId,
        quantity: u32,
        unit_price: Decimal,
        policy: &P,
    ) -> Result<(), SaleError>
    where
        P: DiscountPolicy + ?Sized,
    {
        self.ensure_modifiable()?;

        let position = self.position(item_id)?;

        let mut updated = self.items[position].clone();
        updated.update_values(quantity, unit_price, policy)?;
        let total_amount = sum_totals(
            self.items
                .iter()
                .enumerate()
                .map(|(index, item)| if index == position { &updated } else { item }),
        )?;

        self.items[position] = updated;
        self.total_amount = total_amount;
        Ok(())
    }

    /// Removes an item from the sale.
    pub fn remove_item(&mut self, item_id: SaleItemId) -> Result<SaleItem, SaleError> {
        self.ensure_modifiable()?;

        let position = self.position(item_id)?;
        let total_amount = sum_totals(
            self.items
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != position)
                .map(|(_, item)| item),
        )?;

        let removed = self.items.remove(position);
        self.total_amount = total_amount;
        Ok(removed)
    }

    /// Cancels the sale and every item on it.
    pub fn cancel(&mut self) -> Result<(), SaleError> {
        if !self.state.can_cancel() {
            return Err(SaleError::AlreadyCancelled);
        }

        self.state = SaleState::Cancelled;
        for item in &mut self.items {
            item.cancel();
        }
        Ok(())
    }

    /// Overwrites the sale details and rebuilds every item from `lines`.
    ///
    /// Replacement items get new ids. On error the sale is left untouched.
    pub fn replace_all<P>(
        &mut self,
        sale_number: impl Into<String>,
        date: DateTime<Utc>,
        customer: impl Into<String>,
        branch: impl Into<String>,
        lines: &[SaleLine],
        policy: &P,
    ) -> Result<(), SaleError>
    where
        P: DiscountPolicy + ?Sized,
    {
        self.ensure_modifiable()?;
        let items = build_items(lines, policy)?;
        let total_amount = sum_totals(&items)?;

        self.sale_number = sale_number.into();
        self.date = date;
        self.customer = customer.into();
        self.branch = branch.into();
        self.items = items;
        self.total_amount = total_amount;
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<(), SaleError> {
        if !self.state.can_modify() {
            return Err(SaleError::SaleCancelled);
        }
        Ok(())
    }

    fn position(&self, item_id: SaleItemId) -> Result<usize, SaleError> {
        self.items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or(SaleError::ItemNotFound(item_id))
    }
}

// Persistence mapping
impl Sale {
    /// Converts the aggregate into its stored form.
    pub fn to_record(&self) -> SaleRecord {
        SaleRecord {
            id: self.id,
            sale_number: self.sale_number.clone(),
            date: self.date,
            customer: self.customer.clone(),
            branch: self.branch.clone(),
            total_amount: self.total_amount,
            cancelled: self.is_cancelled(),
            items: self
                .items
                .iter()
                .map(|item| item.to_record(self.id))
                .collect(),
        }
    }

    /// Rebuilds the aggregate from its stored form.
    ///
    /// A stored total that differs from the sum of the item totals is
    /// reported as corrupt.
    pub fn from_record(record: SaleRecord) -> Result<Self, DomainError> {
        let items = record
            .items
            .into_iter()
            .map(SaleItem::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        let expected = sum_totals(&items).map_err(|err| {
            DomainError::CorruptAggregate(format!("sale {}: {err}", record.id))
        })?;
        if expected != record.total_amount {
            return Err(DomainError::CorruptAggregate(format!(
                "sale {} has total {} but its items sum to {expected}",
                record.id, record.total_amount
            )));
        }

        Ok(Self {
            id: record.id,
            sale_number: record.sale_number,
            date: record.date,
            customer: record.customer,
            branch: record.branch,
            total_amount: record.total_amount,
            state: SaleState::from_cancelled(record.cancelled),
            items,
        })
    }
}

/// Sums item totals, cancelled items included.
fn sum_totals<'a>(items: impl IntoIterator<Item = &'a SaleItem>) -> Result<Decimal, SaleError> {
    items.into_iter().try_fold(Decimal::ZERO, |sum, item| {
        sum.checked_add(item.total())
            .ok_or_else(|| SaleError::AmountOutOfRange {
                product: item.product().to_string(),
            })
    })
}

fn build_items<P>(lines: &[SaleLine], policy: &P) -> Result<Vec<SaleItem>, SaleError>
where
    P: DiscountPolicy + ?Sized,
{
    lines
        .iter()
        .map(|line| SaleItem::create(line.product.as_str(), line.quantity, line.unit_price, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::TieredDiscountPolicy;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn create_test_sale(lines: &[SaleLine]) -> Sale {
        Sale::create(
            "S-001",
            Utc::now(),
            "Ana",
            "Downtown",
            lines,
            &TieredDiscountPolicy::standard(),
        )
        .unwrap()
    }

    fn assert_total_consistent(sale: &Sale) {
        let sum: Decimal = sale.items().iter().map(SaleItem::total).sum();
        assert_eq!(sale.total_amount(), sum);
    }

    #[test]
    fn test_create_sale() {
        let sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);

        assert_eq!(sale.item_count(), 1);
        assert_eq!(sale.items()[0].discount(), Decimal::ZERO);
        assert_eq!(sale.total_amount(), dec("20"));
        assert_eq!(sale.state(), SaleState::Active);
        assert!(!sale.is_cancelled());
    }

    #[test]
    fn test_create_sums_all_lines() {
        let sale = create_test_sale(&[
            SaleLine::new("Beer", 2, dec("10")),
            SaleLine::new("Soda", 5, dec("15")),
            SaleLine::new("Water", 10, dec("3")),
        ]);

        // 20.00 + 67.50 + 24.00
        assert_eq!(sale.total_amount(), dec("111.50"));
        assert_total_consistent(&sale);
    }

    #[test]
    fn test_create_rejects_quantity_above_ceiling() {
        let result = Sale::create(
            "S-001",
            Utc::now(),
            "Ana",
            "Downtown",
            &[SaleLine::new("Beer", 21, dec("10"))],
            &TieredDiscountPolicy::standard(),
        );

        assert!(matches!(result, Err(SaleError::QuantityTooHigh { .. })));
    }

    #[test]
    fn test_create_without_items() {
        let sale = create_test_sale(&[]);
        assert_eq!(sale.item_count(), 0);
        assert_eq!(sale.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_add_item() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[]);

        let item_id = sale.add_item("Beer", 5, dec("15"), &policy).unwrap();

        let item = sale.item(item_id).unwrap();
        assert_eq!(item.total(), dec("67.50"));
        assert_eq!(sale.total_amount(), dec("67.50"));
    }

    #[test]
    fn test_add_item_rejects_quantity_above_ceiling() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let before = sale.clone();

        let result = sale.add_item("Soda", 21, dec("1"), &policy);

        assert!(matches!(result, Err(SaleError::QuantityTooHigh { .. })));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_add_item_rejects_zero_quantity() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let before = sale.clone();

        let result = sale.add_item("Soda", 0, dec("1"), &policy);

        assert!(matches!(result, Err(SaleError::QuantityTooLow { .. })));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_add_item_rejects_total_overflow() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 1, Decimal::MAX)]);
        let before = sale.clone();

        let result = sale.add_item("Soda", 1, Decimal::MAX, &policy);

        assert_eq!(
            result,
            Err(SaleError::AmountOutOfRange {
                product: "Soda".to_string()
            })
        );
        assert_eq!(sale, before);
    }

    #[test]
    fn test_create_rejects_zero_quantity_and_overflow() {
        let policy = TieredDiscountPolicy::standard();

        let zero = Sale::create(
            "S-001",
            Utc::now(),
            "Ana",
            "Downtown",
            &[SaleLine::new("Beer", 0, dec("10"))],
            &policy,
        );
        assert!(matches!(zero, Err(SaleError::QuantityTooLow { .. })));

        let overflow = Sale::create(
            "S-001",
            Utc::now(),
            "Ana",
            "Downtown",
            &[SaleLine::new("Beer", 5, Decimal::MAX)],
            &policy,
        );
        assert!(matches!(overflow, Err(SaleError::AmountOutOfRange { .. })));
    }

    #[test]
    fn test_update_item() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[
            SaleLine::new("Beer", 2, dec("10")),
            SaleLine::new("Soda", 1, dec("5")),
        ]);
        let item_id = sale.items()[0].id();

        sale.update_item(item_id, 10, dec("10"), &policy).unwrap();

        let item = sale.item(item_id).unwrap();
        assert_eq!(item.total(), dec("80.00"));
        assert_eq!(sale.total_amount(), dec("85.00"));
        assert_total_consistent(&sale);
    }

    #[test]
    fn test_update_unknown_item() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let missing = SaleItemId::new();

        let result = sale.update_item(missing, 3, dec("10"), &policy);
        assert_eq!(result, Err(SaleError::ItemNotFound(missing)));
    }

    #[test]
    fn test_update_item_rejects_quantity_above_ceiling() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let item_id = sale.items()[0].id();
        let before = sale.clone();

        let result = sale.update_item(item_id, 30, dec("10"), &policy);

        assert!(matches!(result, Err(SaleError::QuantityTooHigh { .. })));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_update_item_rejects_zero_quantity_and_overflow() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[
            SaleLine::new("Beer", 2, dec("10")),
            SaleLine::new("Soda", 1, Decimal::MAX - dec("100")),
        ]);
        let item_id = sale.items()[0].id();
        let before = sale.clone();

        let result = sale.update_item(item_id, 0, dec("10"), &policy);
        assert!(matches!(result, Err(SaleError::QuantityTooLow { .. })));

        let result = sale.update_item(item_id, 1, Decimal::MAX, &policy);
        assert!(matches!(result, Err(SaleError::AmountOutOfRange { .. })));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_remove_only_item() {
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        assert_eq!(sale.total_amount(), dec("20"));
        let item_id = sale.items()[0].id();

        let removed = sale.remove_item(item_id).unwrap();

        assert_eq!(removed.id(), item_id);
        assert_eq!(sale.item_count(), 0);
        assert_eq!(sale.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let missing = SaleItemId::new();

        let result = sale.remove_item(missing);
        assert!(matches!(result, Err(SaleError::ItemNotFound(id)) if id == missing));
        assert_eq!(sale.item_count(), 1);
    }

    #[test]
    fn test_cancel_cascades_to_items() {
        let mut sale = create_test_sale(&[
            SaleLine::new("Beer", 2, dec("10")),
            SaleLine::new("Soda", 4, dec("5")),
            SaleLine::new("Water", 12, dec("1")),
        ]);
        let total = sale.total_amount();

        sale.cancel().unwrap();

        assert!(sale.is_cancelled());
        assert!(sale.items().iter().all(SaleItem::is_cancelled));
        assert_eq!(sale.total_amount(), total);
    }

    #[test]
    fn test_cancel_twice_is_rejected_and_changes_nothing() {
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        sale.cancel().unwrap();
        let before = sale.clone();

        assert_eq!(sale.cancel(), Err(SaleError::AlreadyCancelled));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_cancelled_sale_rejects_item_changes() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let item_id = sale.items()[0].id();
        sale.cancel().unwrap();

        assert_eq!(
            sale.add_item("Soda", 1, dec("1"), &policy),
            Err(SaleError::SaleCancelled)
        );
        assert_eq!(
            sale.update_item(item_id, 3, dec("1"), &policy),
            Err(SaleError::SaleCancelled)
        );
        assert!(matches!(
            sale.remove_item(item_id),
            Err(SaleError::SaleCancelled)
        ));
        assert_eq!(
            sale.replace_all("S-2", Utc::now(), "Bo", "North", &[], &policy),
            Err(SaleError::SaleCancelled)
        );
    }

    #[test]
    fn test_replace_all_rebuilds_items() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let id = sale.id();
        let old_item_id = sale.items()[0].id();
        let date = Utc::now();

        sale.replace_all(
            "S-002",
            date,
            "Bruno",
            "North",
            &[
                SaleLine::new("Beer", 2, dec("10")),
                SaleLine::new("Soda", 4, dec("5")),
            ],
            &policy,
        )
        .unwrap();

        assert_eq!(sale.id(), id);
        assert_eq!(sale.sale_number(), "S-002");
        assert_eq!(sale.date(), date);
        assert_eq!(sale.customer(), "Bruno");
        assert_eq!(sale.branch(), "North");
        assert_eq!(sale.item_count(), 2);
        assert!(sale.item(old_item_id).is_none());
        assert_eq!(sale.total_amount(), dec("38.00"));
    }

    #[test]
    fn test_replace_all_failure_leaves_sale_untouched() {
        let policy = TieredDiscountPolicy::standard();
        let mut sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let before = sale.clone();

        let result = sale.replace_all(
            "S-002",
            Utc::now(),
            "Bruno",
            "North",
            &[SaleLine::new("Beer", 25, dec("10"))],
            &policy,
        );

        assert!(result.is_err());
        assert_eq!(sale, before);
    }

    #[test]
    fn test_record_roundtrip_preserves_state_and_order() {
        let mut sale = create_test_sale(&[
            SaleLine::new("Beer", 2, dec("10")),
            SaleLine::new("Soda", 4, dec("5")),
        ]);
        sale.cancel().unwrap();

        let record = sale.to_record();
        assert!(record.cancelled);
        assert!(record.items.iter().all(|item| item.sale_id == sale.id()));

        let restored = Sale::from_record(record).unwrap();
        assert_eq!(restored, sale);
    }

    #[test]
    fn test_record_with_mismatched_total_is_corrupt() {
        let sale = create_test_sale(&[
            SaleLine::new("Beer", 2, dec("10")),
            SaleLine::new("Soda", 4, dec("5")),
        ]);
        let mut record = sale.to_record();
        record.total_amount = dec("999.99");

        let result = Sale::from_record(record);
        assert!(matches!(result, Err(DomainError::CorruptAggregate(_))));
    }

    #[test]
    fn test_record_total_compares_by_value() {
        let sale = create_test_sale(&[SaleLine::new("Beer", 2, dec("10"))]);
        let mut record = sale.to_record();
        // NUMERIC(18,2) reads back with two decimal places
        record.total_amount = dec("20.00");

        assert!(Sale::from_record(record).is_ok());
    }
}

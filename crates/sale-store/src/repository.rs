use async_trait::async_trait;

use crate::{Result, SaleId, SaleRecord};

/// A write staged on a [`UnitOfWork`], applied when the unit is saved.
#[derive(Debug, Clone, PartialEq)]
pub enum StagedChange {
    /// Persist a new sale with its items.
    Add(SaleRecord),

    /// Replace the stored state of an existing sale, items included.
    Update(SaleRecord),

    /// Remove a sale and its items. Unknown ids are ignored.
    Delete(SaleId),
}

impl StagedChange {
    /// Returns the id of the sale this change touches.
    pub fn sale_id(&self) -> SaleId {
        match self {
            StagedChange::Add(sale) | StagedChange::Update(sale) => sale.id,
            StagedChange::Delete(id) => *id,
        }
    }
}

/// Core trait for sale storage backends.
///
/// Implementations must be thread-safe. Reads return committed state only;
/// staging happens on a [`UnitOfWork`], which hands the whole batch to
/// [`SaleRepository::commit`].
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Loads a sale with all of its items.
    ///
    /// Returns None if the sale doesn't exist.
    async fn get_by_id(&self, id: SaleId) -> Result<Option<SaleRecord>>;

    /// Loads every stored sale, ordered by date then id.
    async fn get_all(&self) -> Result<Vec<SaleRecord>>;

    /// Applies a batch of staged changes atomically, in order.
    async fn commit(&self, changes: Vec<StagedChange>) -> Result<()>;
}

/// Extension trait providing convenience methods for repositories.
#[async_trait]
pub trait SaleRepositoryExt: SaleRepository {
    /// Starts a new unit of work against this repository.
    fn unit_of_work(&self) -> UnitOfWork<'_, Self> {
        UnitOfWork::new(self)
    }

    /// Checks if a sale exists.
    async fn exists(&self, id: SaleId) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}

// Blanket implementation for all SaleRepository implementations
impl<T: SaleRepository + ?Sized> SaleRepositoryExt for T {}

/// Request-scoped set of staged writes against a repository.
///
/// `add`, `update` and `delete` only record intent; nothing is persisted
/// until [`UnitOfWork::save_changes`] commits the batch. Reads bypass the
/// staged changes and see committed state.
pub struct UnitOfWork<'a, R: SaleRepository + ?Sized> {
    repository: &'a R,
    pending: Vec<StagedChange>,
}

impl<'a, R: SaleRepository + ?Sized> UnitOfWork<'a, R> {
    /// Creates an empty unit of work.
    pub fn new(repository: &'a R) -> Self {
        Self {
            repository,
            pending: Vec::new(),
        }
    }

    /// Loads a committed sale by id.
    pub async fn get_by_id(&self, id: SaleId) -> Result<Option<SaleRecord>> {
        self.repository.get_by_id(id).await
    }

    /// Loads every committed sale.
    pub async fn get_all(&self) -> Result<Vec<SaleRecord>> {
        self.repository.get_all().await
    }

    /// Stages a new sale.
    pub fn add(&mut self, sale: SaleRecord) {
        self.pending.push(StagedChange::Add(sale));
    }

    /// Stages changes to an existing sale.
    pub fn update(&mut self, sale: SaleRecord) {
        self.pending.push(StagedChange::Update(sale));
    }

    /// Stages removal of a sale.
    pub fn delete(&mut self, id: SaleId) {
        self.pending.push(StagedChange::Delete(id));
    }

    /// Returns the changes staged so far.
    pub fn pending(&self) -> &[StagedChange] {
        &self.pending
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Commits all staged changes as one unit.
    ///
    /// Returns the number of changes written. With nothing staged the
    /// repository is not called at all.
    pub async fn save_changes(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let changes = std::mem::take(&mut self.pending);
        let count = changes.len();
        tracing::debug!(changes = count, "committing unit of work");
        self.repository.commit(changes).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemorySaleRepository;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn sample_sale() -> SaleRecord {
        SaleRecord {
            id: SaleId::new(),
            sale_number: "S-001".to_string(),
            date: Utc::now(),
            customer: "Ana".to_string(),
            branch: "Downtown".to_string(),
            total_amount: Decimal::ZERO,
            cancelled: false,
            items: vec![],
        }
    }

    #[tokio::test]
    async fn staged_changes_are_invisible_until_saved() {
        let repo = InMemorySaleRepository::new();
        let sale = sample_sale();

        let mut uow = repo.unit_of_work();
        uow.add(sale.clone());
        assert_eq!(uow.pending().len(), 1);
        assert!(uow.get_by_id(sale.id).await.unwrap().is_none());

        let written = uow.save_changes().await.unwrap();
        assert_eq!(written, 1);
        assert!(uow.is_empty());
        assert_eq!(repo.get_by_id(sale.id).await.unwrap(), Some(sale));
    }

    #[tokio::test]
    async fn empty_unit_of_work_does_not_commit() {
        let repo = InMemorySaleRepository::new();

        let mut uow = repo.unit_of_work();
        assert_eq!(uow.save_changes().await.unwrap(), 0);
        assert_eq!(repo.commit_count(), 0);
    }

    #[tokio::test]
    async fn changes_apply_in_staging_order() {
        let repo = InMemorySaleRepository::new();
        let sale = sample_sale();

        let mut uow = repo.unit_of_work();
        uow.add(sale.clone());
        uow.delete(sale.id);
        uow.save_changes().await.unwrap();

        assert!(!repo.exists(sale.id).await.unwrap());
        assert_eq!(repo.commit_count(), 1);
    }

    #[test]
    fn staged_change_reports_sale_id() {
        let sale = sample_sale();
        let id = sale.id;
        assert_eq!(StagedChange::Add(sale.clone()).sale_id(), id);
        assert_eq!(StagedChange::Update(sale).sale_id(), id);
        assert_eq!(StagedChange::Delete(id).sale_id(), id);
    }
}

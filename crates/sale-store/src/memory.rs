use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Result, SaleId, SaleRecord,
    repository::{SaleRepository, StagedChange},
};

/// In-memory sale repository.
///
/// Provides the same interface as the PostgreSQL implementation. Clones
/// share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemorySaleRepository {
    sales: Arc<RwLock<HashMap<SaleId, SaleRecord>>>,
    commits: Arc<AtomicUsize>,
}

impl InMemorySaleRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sales.
    pub async fn sale_count(&self) -> usize {
        self.sales.read().await.len()
    }

    /// Returns how many commits have been applied.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Removes all sales.
    pub async fn clear(&self) {
        self.sales.write().await.clear();
    }
}

#[async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn get_by_id(&self, id: SaleId) -> Result<Option<SaleRecord>> {
        let sales = self.sales.read().await;
        Ok(sales.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<SaleRecord>> {
        let sales = self.sales.read().await;
        let mut all: Vec<_> = sales.values().cloned().collect();
        all.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn commit(&self, changes: Vec<StagedChange>) -> Result<()> {
        // Single write guard keeps the batch atomic for readers
        let mut sales = self.sales.write().await;

        for change in changes {
            match change {
                StagedChange::Add(sale) | StagedChange::Update(sale) => {
                    sales.insert(sale.id, sale);
                }
                StagedChange::Delete(id) => {
                    sales.remove(&id);
                }
            }
        }

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

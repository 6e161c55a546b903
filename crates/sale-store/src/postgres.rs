use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, SaleId, SaleItemId, SaleItemRecord, SaleRecord,
    repository::{SaleRepository, StagedChange},
};

const SELECT_SALES: &str = r#"
    SELECT id, sale_number, date, customer, branch, total_amount, cancelled
    FROM sales
"#;

const SELECT_ITEMS: &str = r#"
    SELECT id, sale_id, product, quantity, unit_price, discount, total, cancelled
    FROM sale_items
"#;

/// PostgreSQL-backed sale repository.
///
/// Sales live in `sales`, items in `sale_items` with a `position` column
/// that preserves the aggregate's item order.
#[derive(Clone)]
pub struct PostgresSaleRepository {
    pool: PgPool,
}

impl PostgresSaleRepository {
    /// Creates a new PostgreSQL sale repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_sale(row: &PgRow) -> Result<SaleRecord> {
        Ok(SaleRecord {
            id: SaleId::from_uuid(row.try_get::<Uuid, _>("id")?),
            sale_number: row.try_get("sale_number")?,
            date: row.try_get("date")?,
            customer: row.try_get("customer")?,
            branch: row.try_get("branch")?,
            total_amount: row.try_get("total_amount")?,
            cancelled: row.try_get("cancelled")?,
            items: Vec::new(),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<SaleItemRecord> {
        Ok(SaleItemRecord {
            id: SaleItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            sale_id: SaleId::from_uuid(row.try_get::<Uuid, _>("sale_id")?),
            product: row.try_get("product")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            discount: row.try_get("discount")?,
            total: row.try_get("total")?,
            cancelled: row.try_get("cancelled")?,
        })
    }

    async fn insert_sale(conn: &mut PgConnection, sale: &SaleRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, sale_number, date, customer, branch, total_amount, cancelled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(sale.id.as_uuid())
        .bind(&sale.sale_number)
        .bind(sale.date)
        .bind(&sale.customer)
        .bind(&sale.branch)
        .bind(sale.total_amount)
        .bind(sale.cancelled)
        .execute(&mut *conn)
        .await?;

        Self::insert_items(conn, sale).await
    }

    async fn update_sale(conn: &mut PgConnection, sale: &SaleRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, sale_number, date, customer, branch, total_amount, cancelled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                sale_number = EXCLUDED.sale_number,
                date = EXCLUDED.date,
                customer = EXCLUDED.customer,
                branch = EXCLUDED.branch,
                total_amount = EXCLUDED.total_amount,
                cancelled = EXCLUDED.cancelled
            "#,
        )
        .bind(sale.id.as_uuid())
        .bind(&sale.sale_number)
        .bind(sale.date)
        .bind(&sale.customer)
        .bind(&sale.branch)
        .bind(sale.total_amount)
        .bind(sale.cancelled)
        .execute(&mut *conn)
        .await?;

        // The aggregate owns its items, so the stored set is replaced wholesale
        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
            .bind(sale.id.as_uuid())
            .execute(&mut *conn)
            .await?;

        Self::insert_items(conn, sale).await
    }

    async fn insert_items(conn: &mut PgConnection, sale: &SaleRecord) -> Result<()> {
        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, position, product, quantity, unit_price, discount, total, cancelled)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(sale.id.as_uuid())
            .bind(position as i32)
            .bind(&item.product)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.discount)
            .bind(item.total)
            .bind(item.cancelled)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SaleRepository for PostgresSaleRepository {
    async fn get_by_id(&self, id: SaleId) -> Result<Option<SaleRecord>> {
        let row = sqlx::query(&format!("{SELECT_SALES} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut sale = Self::row_to_sale(&row)?;

        let item_rows = sqlx::query(&format!(
            "{SELECT_ITEMS} WHERE sale_id = $1 ORDER BY position ASC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        sale.items = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<_>>()?;

        Ok(Some(sale))
    }

    async fn get_all(&self) -> Result<Vec<SaleRecord>> {
        let sale_rows = sqlx::query(&format!("{SELECT_SALES} ORDER BY date ASC, id ASC"))
            .fetch_all(&self.pool)
            .await?;

        let item_rows = sqlx::query(&format!(
            "{SELECT_ITEMS} ORDER BY sale_id ASC, position ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_sale: HashMap<SaleId, Vec<SaleItemRecord>> = HashMap::new();
        for row in &item_rows {
            let item = Self::row_to_item(row)?;
            items_by_sale.entry(item.sale_id).or_default().push(item);
        }

        sale_rows
            .iter()
            .map(|row| {
                let mut sale = Self::row_to_sale(row)?;
                sale.items = items_by_sale.remove(&sale.id).unwrap_or_default();
                Ok(sale)
            })
            .collect()
    }

    async fn commit(&self, changes: Vec<StagedChange>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for change in &changes {
            match change {
                StagedChange::Add(sale) => Self::insert_sale(&mut tx, sale).await?,
                StagedChange::Update(sale) => Self::update_sale(&mut tx, sale).await?,
                StagedChange::Delete(id) => {
                    // sale_items rows go with it through ON DELETE CASCADE
                    sqlx::query("DELETE FROM sales WHERE id = $1")
                        .bind(id.as_uuid())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(changes = changes.len(), "sale changes committed");
        Ok(())
    }
}

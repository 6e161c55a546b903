//! Sale service: one handler per sale use case.

use common::{SaleId, SaleItemId};
use rust_decimal::Decimal;
use sale_store::{SaleRepository, SaleRepositoryExt, UnitOfWork};
use serde::{Deserialize, Serialize};

use crate::discount::{DiscountPolicy, TieredDiscountPolicy};
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::outcome::{AppError, CommandOutcome};
use crate::publisher::{EventPublisher, LoggingEventPublisher};

use super::item::ensure_quantity;
use super::{
    AddSaleItem, CancelSale, CreateSale, DeleteSale, RemoveSaleItem, Sale, SaleError, SaleEvent,
    SaleView, UpdateSale, UpdateSaleItem,
};

const SALE_NOT_FOUND: &str = "Sale not found";

/// Data returned by a successful `create_sale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleResult {
    pub sale_id: SaleId,
    pub sale_number: String,
    pub total_amount: Decimal,
}

/// Data returned by a successful `add_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSaleItemResult {
    pub item_id: SaleItemId,
}

/// Service for managing sales.
///
/// Every handler loads what it needs, applies one aggregate operation, stages
/// the result on a fresh unit of work and commits it. Events go out only
/// after the commit succeeded. Expected failures come back as a failed
/// [`CommandOutcome`]; `Err` is reserved for infrastructure failures.
pub struct SaleService<R, P = TieredDiscountPolicy, E = LoggingEventPublisher> {
    repository: R,
    policy: P,
    publisher: E,
}

impl<R: SaleRepository> SaleService<R> {
    /// Creates a service with the standard discount schedule and a logging publisher.
    pub fn with_defaults(repository: R) -> Self {
        Self::new(
            repository,
            TieredDiscountPolicy::standard(),
            LoggingEventPublisher,
        )
    }
}

impl<R, P, E> SaleService<R, P, E>
where
    R: SaleRepository,
    P: DiscountPolicy,
    E: EventPublisher,
{
    /// Creates a new sale service.
    pub fn new(repository: R, policy: P, publisher: E) -> Self {
        Self {
            repository,
            policy,
            publisher,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns a reference to the discount policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Returns a reference to the event publisher.
    pub fn publisher(&self) -> &E {
        &self.publisher
    }

    /// Records a new sale with its items.
    ///
    /// Every line over the quantity ceiling is reported, and nothing is
    /// persisted if any line is.
    #[tracing::instrument(skip(self, cmd), fields(sale_number = %cmd.sale_number))]
    pub async fn create_sale(
        &self,
        cmd: CreateSale,
    ) -> Result<CommandOutcome<CreateSaleResult>, DomainError> {
        observe("create_sale", self.handle_create_sale(cmd).await)
    }

    /// Replaces the details and items of a sale.
    #[tracing::instrument(skip(self, cmd), fields(sale_id = %cmd.sale_id))]
    pub async fn update_sale(&self, cmd: UpdateSale) -> Result<CommandOutcome<()>, DomainError> {
        let UpdateSale {
            sale_id,
            sale_number,
            date,
            customer,
            branch,
            items,
        } = cmd;

        let result = self
            .modify(sale_id, SaleEvent::updated, move |sale, policy| {
                sale.replace_all(sale_number, date, customer, branch, &items, policy)
            })
            .await;
        observe("update_sale", result)
    }

    /// Cancels a sale and all of its items.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_sale(&self, cmd: CancelSale) -> Result<CommandOutcome<()>, DomainError> {
        let result = self
            .modify(cmd.sale_id, SaleEvent::canceled, |sale, _| sale.cancel())
            .await;
        observe("cancel_sale", result)
    }

    /// Deletes a sale. Unknown ids succeed without effect.
    #[tracing::instrument(skip(self))]
    pub async fn delete_sale(&self, cmd: DeleteSale) -> Result<CommandOutcome<()>, DomainError> {
        observe("delete_sale", self.handle_delete_sale(cmd).await)
    }

    /// Appends an item to a sale.
    #[tracing::instrument(skip(self, cmd), fields(sale_id = %cmd.sale_id))]
    pub async fn add_item(
        &self,
        cmd: AddSaleItem,
    ) -> Result<CommandOutcome<AddSaleItemResult>, DomainError> {
        let AddSaleItem { sale_id, line } = cmd;

        let result = self
            .modify(sale_id, SaleEvent::updated, move |sale, policy| {
                let item_id = sale.add_item(line.product, line.quantity, line.unit_price, policy)?;
                Ok(AddSaleItemResult { item_id })
            })
            .await;
        observe("add_item", result)
    }

    /// Changes quantity and unit price of an item.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        cmd: UpdateSaleItem,
    ) -> Result<CommandOutcome<()>, DomainError> {
        let result = self
            .modify(cmd.sale_id, SaleEvent::updated, |sale, policy| {
                sale.update_item(cmd.item_id, cmd.quantity, cmd.unit_price, policy)
            })
            .await;
        observe("update_item", result)
    }

    /// Removes an item from a sale.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        cmd: RemoveSaleItem,
    ) -> Result<CommandOutcome<()>, DomainError> {
        let result = self
            .modify(cmd.sale_id, SaleEvent::updated, |sale, _| {
                sale.remove_item(cmd.item_id).map(|_| ())
            })
            .await;
        observe("remove_item", result)
    }

    /// Loads a sale by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: SaleId) -> Result<CommandOutcome<SaleView>, DomainError> {
        let result = match self.repository.get_by_id(sale_id).await {
            Ok(Some(record)) => {
                Sale::from_record(record).map(|sale| CommandOutcome::ok(SaleView::from(&sale)))
            }
            Ok(None) => Ok(CommandOutcome::not_found(SALE_NOT_FOUND)),
            Err(err) => Err(err.into()),
        };
        observe("get_sale", result)
    }

    /// Loads every sale, ordered by date.
    #[tracing::instrument(skip(self))]
    pub async fn list_sales(&self) -> Result<CommandOutcome<Vec<SaleView>>, DomainError> {
        observe("list_sales", self.handle_list_sales().await)
    }

    async fn handle_create_sale(
        &self,
        cmd: CreateSale,
    ) -> Result<CommandOutcome<CreateSaleResult>, DomainError> {
        let violations: Vec<AppError> = cmd
            .items
            .iter()
            .filter_map(|line| ensure_quantity(&line.product, line.quantity).err())
            .map(|err| AppError::from(&err))
            .collect();

        if !violations.is_empty() {
            tracing::warn!(count = violations.len(), "sale rejected: quantity out of bounds");
            return Ok(CommandOutcome::fail(violations));
        }

        let sale = match Sale::create(
            cmd.sale_number,
            cmd.date,
            cmd.customer,
            cmd.branch,
            &cmd.items,
            &self.policy,
        ) {
            Ok(sale) => sale,
            Err(err) => return Ok(err.into()),
        };

        let mut uow = self.repository.unit_of_work();
        uow.add(sale.to_record());
        uow.save_changes().await?;

        tracing::info!(sale_id = %sale.id(), total_amount = %sale.total_amount(), "sale created");
        self.publish(SaleEvent::created(&sale)).await;

        Ok(CommandOutcome::ok(CreateSaleResult {
            sale_id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            total_amount: sale.total_amount(),
        }))
    }

    async fn handle_delete_sale(&self, cmd: DeleteSale) -> Result<CommandOutcome<()>, DomainError> {
        let mut uow = self.repository.unit_of_work();
        uow.delete(cmd.sale_id);
        uow.save_changes().await?;

        tracing::info!(sale_id = %cmd.sale_id, "sale deleted");
        Ok(CommandOutcome::done())
    }

    async fn handle_list_sales(&self) -> Result<CommandOutcome<Vec<SaleView>>, DomainError> {
        let records = self.repository.get_all().await?;
        let views = records
            .into_iter()
            .map(|record| Sale::from_record(record).map(|sale| SaleView::from(&sale)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandOutcome::ok(views))
    }

    /// Loads a sale, applies `change`, commits it and publishes `raise(sale)`.
    async fn modify<T, F>(
        &self,
        sale_id: SaleId,
        raise: fn(&Sale) -> SaleEvent,
        change: F,
    ) -> Result<CommandOutcome<T>, DomainError>
    where
        F: FnOnce(&mut Sale, &P) -> Result<T, SaleError> + Send,
    {
        let mut uow = self.repository.unit_of_work();

        let Some(mut sale) = load(&uow, sale_id).await? else {
            tracing::warn!(%sale_id, "sale not found");
            return Ok(CommandOutcome::not_found(SALE_NOT_FOUND));
        };

        let data = match change(&mut sale, &self.policy) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%sale_id, reason = %err, "sale change rejected");
                return Ok(err.into());
            }
        };

        uow.update(sale.to_record());
        uow.save_changes().await?;

        tracing::info!(%sale_id, total_amount = %sale.total_amount(), "sale changed");
        self.publish(raise(&sale)).await;

        Ok(CommandOutcome::ok(data))
    }

    async fn publish(&self, event: SaleEvent) {
        let event_type = event.event_type();
        self.publisher.publish(event).await;
        metrics::counter!("sales_events_published_total", "event" => event_type).increment(1);
    }
}

async fn load<R>(uow: &UnitOfWork<'_, R>, sale_id: SaleId) -> Result<Option<Sale>, DomainError>
where
    R: SaleRepository + ?Sized,
{
    uow.get_by_id(sale_id)
        .await?
        .map(Sale::from_record)
        .transpose()
}

/// Records the handler outcome as a metric and passes it through.
fn observe<T>(
    command: &'static str,
    result: Result<CommandOutcome<T>, DomainError>,
) -> Result<CommandOutcome<T>, DomainError> {
    let outcome = match &result {
        Ok(outcome) if outcome.is_success() => "success",
        Ok(outcome) if outcome.is_not_found() => "not_found",
        Ok(_) => "rejected",
        Err(err) => {
            tracing::error!(command, error = %err, "sale command failed");
            "error"
        }
    };
    metrics::counter!("sales_commands_total", "command" => command, "outcome" => outcome)
        .increment(1);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorCode;
    use crate::publisher::BroadcastEventPublisher;
    use crate::sale::SaleLine;
    use chrono::Utc;
    use sale_store::InMemorySaleRepository;

    type TestService =
        SaleService<InMemorySaleRepository, TieredDiscountPolicy, BroadcastEventPublisher>;

    fn create_service() -> TestService {
        SaleService::new(
            InMemorySaleRepository::new(),
            TieredDiscountPolicy::standard(),
            BroadcastEventPublisher::default(),
        )
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn create_cmd(lines: Vec<SaleLine>) -> CreateSale {
        CreateSale::new("S-001", Utc::now(), "Ana", "Downtown", lines)
    }

    async fn create_sale(service: &TestService, lines: Vec<SaleLine>) -> SaleId {
        let outcome = service.create_sale(create_cmd(lines)).await.unwrap();
        assert!(outcome.is_success());
        outcome.data.unwrap().sale_id
    }

    #[tokio::test]
    async fn test_create_sale() {
        let service = create_service();
        let mut events = service.publisher().subscribe();

        let outcome = service
            .create_sale(create_cmd(vec![SaleLine::new("Beer", 2, dec("10"))]))
            .await
            .unwrap();

        assert!(outcome.is_success());
        let data = outcome.data.unwrap();
        assert_eq!(data.sale_number, "S-001");
        assert_eq!(data.total_amount, dec("20"));

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "SaleCreated");
        assert_eq!(event.sale_id(), data.sale_id);
        assert_eq!(service.repository().commit_count(), 1);
    }

    #[tokio::test]
    async fn test_create_sale_reports_each_line_over_ceiling() {
        let service = create_service();

        let outcome = service
            .create_sale(create_cmd(vec![
                SaleLine::new("Beer", 21, dec("10")),
                SaleLine::new("Soda", 2, dec("1")),
                SaleLine::new("Water", 30, dec("1")),
            ]))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            outcome.messages(),
            vec![
                "Cannot sell more than 20 units of Beer",
                "Cannot sell more than 20 units of Water"
            ]
        );
        assert_eq!(service.repository().commit_count(), 0);
    }

    #[tokio::test]
    async fn test_update_sale_replaces_items() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;

        let outcome = service
            .update_sale(UpdateSale::new(
                sale_id,
                "S-002",
                Utc::now(),
                "Bruno",
                "North",
                vec![SaleLine::new("Soda", 4, dec("5"))],
            ))
            .await
            .unwrap();
        assert!(outcome.is_success());

        let view = service.get_sale(sale_id).await.unwrap().data.unwrap();
        assert_eq!(view.sale_number, "S-002");
        assert_eq!(view.customer, "Bruno");
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product, "Soda");
        assert_eq!(view.total_amount, dec("18.00"));
    }

    #[tokio::test]
    async fn test_update_missing_sale() {
        let service = create_service();

        let outcome = service
            .update_sale(UpdateSale::new(
                SaleId::new(),
                "S-002",
                Utc::now(),
                "Bruno",
                "North",
                vec![],
            ))
            .await
            .unwrap();

        assert!(outcome.is_not_found());
        assert_eq!(outcome.messages(), vec!["Sale not found"]);
        assert_eq!(service.repository().commit_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_sale_publishes_snapshot() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;
        let mut events = service.publisher().subscribe();

        let outcome = service.cancel_sale(CancelSale::new(sale_id)).await.unwrap();
        assert!(outcome.is_success());

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "SaleCanceled");
        assert!(event.sale().is_cancelled());
        assert!(event.sale().items().iter().all(|item| item.is_cancelled()));
    }

    #[tokio::test]
    async fn test_cancel_twice() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;
        service.cancel_sale(CancelSale::new(sale_id)).await.unwrap();
        let commits = service.repository().commit_count();

        let outcome = service.cancel_sale(CancelSale::new(sale_id)).await.unwrap();

        assert!(outcome.has_code(ErrorCode::BusinessRule));
        assert_eq!(outcome.messages(), vec!["Sale already cancelled"]);
        assert_eq!(service.repository().commit_count(), commits);
    }

    #[tokio::test]
    async fn test_delete_sale_is_unconditional() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;

        assert!(service.delete_sale(DeleteSale::new(sale_id)).await.unwrap().is_success());
        assert!(service.get_sale(sale_id).await.unwrap().is_not_found());

        let outcome = service.delete_sale(DeleteSale::new(SaleId::new())).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;

        let item_id = service
            .add_item(AddSaleItem::with_details(sale_id, "Soda", 5, dec("15")))
            .await
            .unwrap()
            .data
            .unwrap()
            .item_id;

        let view = service.get_sale(sale_id).await.unwrap().data.unwrap();
        assert_eq!(view.total_amount, dec("87.50"));

        service
            .update_item(UpdateSaleItem::new(sale_id, item_id, 10, dec("15")))
            .await
            .unwrap();
        let view = service.get_sale(sale_id).await.unwrap().data.unwrap();
        assert_eq!(view.total_amount, dec("140.00"));

        service
            .remove_item(RemoveSaleItem::new(sale_id, item_id))
            .await
            .unwrap();
        let view = service.get_sale(sale_id).await.unwrap().data.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_amount, dec("20"));
    }

    #[tokio::test]
    async fn test_add_item_out_of_range_is_a_business_rule() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;
        let mut events = service.publisher().subscribe();

        let outcome = service
            .add_item(AddSaleItem::with_details(sale_id, "Soda", 2, Decimal::MAX))
            .await
            .unwrap();

        assert!(outcome.has_code(ErrorCode::BusinessRule));
        assert_eq!(outcome.messages(), vec!["Amount for Soda is out of range"]);
        assert_eq!(service.repository().commit_count(), 1);
        assert!(events.try_recv().is_err());

        let view = service.get_sale(sale_id).await.unwrap().data.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_amount, dec("20"));
    }

    #[tokio::test]
    async fn test_create_sale_reports_zero_quantity() {
        let service = create_service();

        let outcome = service
            .create_sale(create_cmd(vec![SaleLine::new("Beer", 0, dec("10"))]))
            .await
            .unwrap();

        assert!(outcome.has_code(ErrorCode::BusinessRule));
        assert_eq!(outcome.messages(), vec!["Quantity of Beer must be at least 1"]);
        assert_eq!(service.repository().commit_count(), 0);
    }

    #[tokio::test]
    async fn test_item_handlers_report_missing_item() {
        let service = create_service();
        let sale_id = create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;
        let missing = SaleItemId::new();

        let outcome = service
            .update_item(UpdateSaleItem::new(sale_id, missing, 1, dec("1")))
            .await
            .unwrap();
        assert!(outcome.is_not_found());
        assert_eq!(outcome.messages(), vec!["Item not found"]);

        let outcome = service
            .remove_item(RemoveSaleItem::new(sale_id, missing))
            .await
            .unwrap();
        assert!(outcome.is_not_found());
    }

    #[tokio::test]
    async fn test_list_sales() {
        let service = create_service();
        assert!(service.list_sales().await.unwrap().data.unwrap().is_empty());

        create_sale(&service, vec![SaleLine::new("Beer", 2, dec("10"))]).await;
        create_sale(&service, vec![SaleLine::new("Soda", 1, dec("3"))]).await;

        let sales = service.list_sales().await.unwrap().data.unwrap();
        assert_eq!(sales.len(), 2);
    }

    #[tokio::test]
    async fn test_custom_policy_is_used() {
        let service = SaleService::new(
            InMemorySaleRepository::new(),
            |_quantity: u32| dec("0.5"),
            BroadcastEventPublisher::default(),
        );

        let outcome = service
            .create_sale(create_cmd(vec![SaleLine::new("Beer", 2, dec("10"))]))
            .await
            .unwrap();

        assert_eq!(outcome.data.unwrap().total_amount, dec("10.00"));
    }
}

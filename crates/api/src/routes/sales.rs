//! Sale CRUD and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::SaleId;
use domain::validation::{validate_create_sale, validate_update_sale};
use domain::{CancelSale, CreateSale, DeleteSale, SaleLine, SaleView, UpdateSale};
use rust_decimal::Decimal;
use sale_store::SaleRepository;
use serde::Deserialize;

use super::{AppState, ensure_valid, parse_sale_id};
use crate::error::{ApiError, accept};

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    #[serde(default)]
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl From<SaleLineRequest> for SaleLine {
    fn from(req: SaleLineRequest) -> Self {
        SaleLine::new(req.product, req.quantity, req.unit_price)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub sale_number: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    /// Optional; must match the path id when present.
    #[serde(default)]
    pub id: Option<SaleId>,
    #[serde(default)]
    pub sale_number: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
}

fn lines(items: Vec<SaleLineRequest>) -> Vec<SaleLine> {
    items.into_iter().map(SaleLine::from).collect()
}

// -- Handlers --

/// POST /api/sales: records a sale with its items.
#[tracing::instrument(skip(state, body))]
pub async fn create<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    body: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let cmd = CreateSale::new(
        req.sale_number,
        req.date,
        req.customer,
        req.branch,
        lines(req.items),
    );
    ensure_valid("create_sale", validate_create_sale(&cmd, Utc::now()))?;

    let created = accept(state.sales.create_sale(cmd).await?)?;

    let location = created
        .as_ref()
        .and_then(|c| HeaderValue::from_str(&format!("/api/sales/{}", c.sale_id)).ok());
    let mut response = (StatusCode::CREATED, Json(created)).into_response();
    if let Some(location) = location {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

/// GET /api/sales: lists every sale, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<SaleView>>, ApiError> {
    let sales = accept(state.sales.list_sales().await?)?;
    Ok(Json(sales.unwrap_or_default()))
}

/// GET /api/sales/{id}: fetches one sale with its items.
#[tracing::instrument(skip(state))]
pub async fn get<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Option<SaleView>>, ApiError> {
    let sale_id = parse_sale_id(&id)?;
    let sale = accept(state.sales.get_sale(sale_id).await?)?;
    Ok(Json(sale))
}

/// PUT /api/sales/{id}: replaces the details and items of a sale.
#[tracing::instrument(skip(state, body))]
pub async fn update<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateSaleRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let sale_id = parse_sale_id(&id)?;
    let Json(req) = body?;
    if req.id.is_some_and(|body_id| body_id != sale_id) {
        return Err(ApiError::IdMismatch);
    }

    let cmd = UpdateSale::new(
        sale_id,
        req.sale_number,
        req.date,
        req.customer,
        req.branch,
        lines(req.items),
    );
    ensure_valid("update_sale", validate_update_sale(&cmd, Utc::now()))?;

    accept(state.sales.update_sale(cmd).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/sales/{id}/cancel: cancels a sale and all of its items.
#[tracing::instrument(skip(state))]
pub async fn cancel<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let sale_id = parse_sale_id(&id)?;
    accept(state.sales.cancel_sale(CancelSale::new(sale_id)).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/sales/{id}: removes a sale. Unknown ids still answer 204.
#[tracing::instrument(skip(state))]
pub async fn delete<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let sale_id = parse_sale_id(&id)?;
    accept(state.sales.delete_sale(DeleteSale::new(sale_id)).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

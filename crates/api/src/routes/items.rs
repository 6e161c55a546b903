//! Endpoints for the items of a sale.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::validation::{validate_add_item, validate_update_item};
use domain::{AddSaleItem, AddSaleItemResult, RemoveSaleItem, UpdateSaleItem};
use rust_decimal::Decimal;
use sale_store::SaleRepository;
use serde::Deserialize;

use super::sales::SaleLineRequest;
use super::{AppState, ensure_valid, parse_item_id, parse_sale_id};
use crate::error::{ApiError, accept};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// POST /api/sales/{id}/items: appends an item to a sale.
#[tracing::instrument(skip(state, body))]
pub async fn add<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    body: Result<Json<SaleLineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Option<AddSaleItemResult>>), ApiError> {
    let sale_id = parse_sale_id(&id)?;
    let Json(req) = body?;

    let cmd = AddSaleItem::new(sale_id, req.into());
    ensure_valid("add_item", validate_add_item(&cmd))?;

    let added = accept(state.sales.add_item(cmd).await?)?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// PATCH /api/sales/{id}/items/{item_id}: changes quantity and unit price.
#[tracing::instrument(skip(state, body))]
pub async fn update<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path((id, item_id)): Path<(String, String)>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let sale_id = parse_sale_id(&id)?;
    let item_id = parse_item_id(&item_id)?;
    let Json(req) = body?;

    let cmd = UpdateSaleItem::new(sale_id, item_id, req.quantity, req.unit_price);
    ensure_valid("update_item", validate_update_item(&cmd))?;

    accept(state.sales.update_item(cmd).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/sales/{id}/items/{item_id}: removes an item.
#[tracing::instrument(skip(state))]
pub async fn remove<R: SaleRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let sale_id = parse_sale_id(&id)?;
    let item_id = parse_item_id(&item_id)?;

    accept(
        state
            .sales
            .remove_item(RemoveSaleItem::new(sale_id, item_id))
            .await?,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

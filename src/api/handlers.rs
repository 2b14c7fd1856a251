use crate::error::{EntryError, ReconciliationError};
use crate::models::MappingAssignment;
use crate::service::{Partition, StockEntryService};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

type Service = State<Arc<StockEntryService>>;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Response {
        let response = ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        };
        (StatusCode::OK, Json(response)).into_response()
    }
}

impl IntoResponse for EntryError {
    fn into_response(self) -> Response {
        let status = match &self {
            EntryError::Parse(_) | EntryError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EntryError::Reconciliation(ReconciliationError::ItemNotFound(_))
            | EntryError::WorkspaceNotFound(_) => StatusCode::NOT_FOUND,
            EntryError::Reconciliation(_) | EntryError::StaleGeneration(_) => StatusCode::CONFLICT,
            EntryError::Store(_) | EntryError::Submission(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let response = ApiResponse::<()> {
            success: false,
            message: format!("Error: {}", self),
            data: None,
        };
        (status, Json(response)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub xml: String,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub received_quantity: BigDecimal,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub selected: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkSelectionRequest {
    pub partition: Partition,
    pub selected: bool,
}

#[derive(Debug, Deserialize)]
pub struct EntryDateRequest {
    pub entry_date: NaiveDate,
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn import_document(
    State(service): Service,
    Path(workspace): Path<Uuid>,
    Json(req): Json<ImportRequest>,
) -> Result<Response, EntryError> {
    let snapshot = service.import_document(workspace, &req.xml).await?;
    let message = format!(
        "Loaded {} with {} items, {} mapped",
        snapshot.document_number, snapshot.summary.total, snapshot.summary.mapped
    );
    Ok(ApiResponse::ok(message, snapshot))
}

pub async fn get_workspace(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    Ok(ApiResponse::ok("OK", service.snapshot(workspace)?))
}

pub async fn discard_workspace(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    service.discard(workspace)?;
    Ok(ApiResponse::ok("Working set discarded", ()))
}

pub async fn register_supplier(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    let status = service.register_supplier(workspace).await?;
    Ok(ApiResponse::ok("Supplier registered", status))
}

pub async fn set_entry_date(
    State(service): Service,
    Path(workspace): Path<Uuid>,
    Json(req): Json<EntryDateRequest>,
) -> Result<Response, EntryError> {
    service.set_entry_date(workspace, req.entry_date)?;
    Ok(ApiResponse::ok(format!("Entry date set to {}", req.entry_date), ()))
}

pub async fn assign_mapping(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
    Json(req): Json<MappingAssignment>,
) -> Result<Response, EntryError> {
    let item = service.assign_mapping(workspace, sequence, req).await?;
    Ok(ApiResponse::ok(format!("Item {} mapped", sequence), item))
}

pub async fn reset_mapping(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
) -> Result<Response, EntryError> {
    let item = service.reset_mapping(workspace, sequence)?;
    Ok(ApiResponse::ok(format!("Item {} unmapped", sequence), item))
}

pub async fn confirm_item(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
) -> Result<Response, EntryError> {
    let item = service.confirm(workspace, sequence)?;
    Ok(ApiResponse::ok(format!("Item {} confirmed", sequence), item))
}

pub async fn unconfirm_item(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
) -> Result<Response, EntryError> {
    let item = service.unconfirm(workspace, sequence)?;
    Ok(ApiResponse::ok(format!("Item {} back to pending", sequence), item))
}

pub async fn acknowledge_divergence(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
) -> Result<Response, EntryError> {
    let item = service.acknowledge_divergence(workspace, sequence)?;
    Ok(ApiResponse::ok(format!("Divergence on item {} acknowledged", sequence), item))
}

pub async fn set_received_quantity(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
    Json(req): Json<QuantityRequest>,
) -> Result<Response, EntryError> {
    let item = service.set_received_quantity(workspace, sequence, &req.received_quantity)?;
    Ok(ApiResponse::ok(format!("Item {} quantity updated", sequence), item))
}

pub async fn select_item(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
    Json(req): Json<SelectionRequest>,
) -> Result<Response, EntryError> {
    service.select(workspace, sequence, req.selected)?;
    Ok(ApiResponse::ok("OK", ()))
}

pub async fn remove_item(
    State(service): Service,
    Path((workspace, sequence)): Path<(Uuid, u32)>,
) -> Result<Response, EntryError> {
    let item = service.remove_item(workspace, sequence)?;
    Ok(ApiResponse::ok(format!("Item {} removed", sequence), item))
}

pub async fn select_all(
    State(service): Service,
    Path(workspace): Path<Uuid>,
    Json(req): Json<BulkSelectionRequest>,
) -> Result<Response, EntryError> {
    let changed = service.select_all(workspace, req.partition, req.selected)?;
    Ok(ApiResponse::ok(format!("{} items updated", changed), changed))
}

pub async fn bulk_confirm(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    let outcome = service.bulk_confirm(workspace)?;
    let message = format!(
        "{} confirmed, {} skipped",
        outcome.applied.len(),
        outcome.skipped.len()
    );
    Ok(ApiResponse::ok(message, outcome))
}

pub async fn bulk_unconfirm(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    let outcome = service.bulk_unconfirm(workspace)?;
    Ok(ApiResponse::ok(format!("{} back to pending", outcome.applied.len()), outcome))
}

pub async fn bulk_reset_quantity(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    let outcome = service.bulk_reset_quantity(workspace)?;
    Ok(ApiResponse::ok(format!("{} quantities reset", outcome.applied.len()), outcome))
}

pub async fn submit(
    State(service): Service,
    Path(workspace): Path<Uuid>,
) -> Result<Response, EntryError> {
    let receipt = service.submit(workspace).await?;
    let message = format!(
        "Stock entry {} created with {} items",
        receipt.entry_id, receipt.items_processed
    );
    Ok(ApiResponse::ok(message, receipt))
}

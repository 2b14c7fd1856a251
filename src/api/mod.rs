pub mod handlers;

pub use handlers::*;

use crate::service::StockEntryService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Invoice XML with hundreds of items runs well past axum's 2 MB default.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn router(service: Arc<StockEntryService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/workspaces/:ws",
            get(get_workspace).delete(discard_workspace),
        )
        .route("/api/workspaces/:ws/document", put(import_document))
        .route("/api/workspaces/:ws/supplier", post(register_supplier))
        .route("/api/workspaces/:ws/entry-date", put(set_entry_date))
        .route("/api/workspaces/:ws/selection", post(select_all))
        .route("/api/workspaces/:ws/bulk/confirm", post(bulk_confirm))
        .route("/api/workspaces/:ws/bulk/unconfirm", post(bulk_unconfirm))
        .route(
            "/api/workspaces/:ws/bulk/reset-quantity",
            post(bulk_reset_quantity),
        )
        .route("/api/workspaces/:ws/submit", post(submit))
        .route("/api/workspaces/:ws/items/:seq", delete(remove_item))
        .route(
            "/api/workspaces/:ws/items/:seq/mapping",
            put(assign_mapping).delete(reset_mapping),
        )
        .route("/api/workspaces/:ws/items/:seq/confirm", post(confirm_item))
        .route("/api/workspaces/:ws/items/:seq/unconfirm", post(unconfirm_item))
        .route(
            "/api/workspaces/:ws/items/:seq/acknowledge",
            post(acknowledge_divergence),
        )
        .route(
            "/api/workspaces/:ws/items/:seq/quantity",
            put(set_received_quantity),
        )
        .route("/api/workspaces/:ws/items/:seq/selection", put(select_item))
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_BODY_BYTES)))
        .with_state(service)
}

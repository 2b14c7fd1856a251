use bigdecimal::BigDecimal;
use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::mapping::MappingResolver;
use super::ports::{MappingStore, StockSubmission, SupplierDirectory};
use super::reconciliation::{BulkOutcome, Partition, ReconciliationSet, ReconciliationSnapshot};
use super::submission;
use crate::config::EntryConfig;
use crate::db::export_to_csv;
use crate::error::{EntryError, ReconciliationError, StoreError, SubmissionError};
use crate::models::{
    MappingAssignment, NewSupplier, ReconciliationItem, SubmissionReceipt, SupplierStatus,
};
use crate::parser;

/// Stock entry workflow, one reconciliation set per workspace.
///
/// Every import gets a new generation. Async results (supplier check,
/// mapping lookup, mapping assignment) are written back only if the
/// workspace still holds the generation they were started for; anything
/// else is a stale response from a replaced document and is dropped.
pub struct StockEntryService {
    workspaces: DashMap<Uuid, ReconciliationSet>,
    generations: AtomicU64,
    resolver: MappingResolver,
    suppliers: Arc<dyn SupplierDirectory>,
    submission: Arc<dyn StockSubmission>,
    config: EntryConfig,
}

impl StockEntryService {
    pub fn new(
        mappings: Arc<dyn MappingStore>,
        suppliers: Arc<dyn SupplierDirectory>,
        submission: Arc<dyn StockSubmission>,
        config: EntryConfig,
    ) -> Self {
        Self {
            workspaces: DashMap::new(),
            generations: AtomicU64::new(0),
            resolver: MappingResolver::new(mappings, config.lookup_timeout()),
            suppliers,
            submission,
            config,
        }
    }

    /// Parses `xml` and replaces the workspace's working set with it.
    ///
    /// A parse error leaves the previous working set untouched. Lookup
    /// failures only produce warnings.
    pub async fn import_document(
        &self,
        workspace: Uuid,
        xml: &str,
    ) -> Result<ReconciliationSnapshot, EntryError> {
        let document = parser::parse_document(xml)?;
        let tax_id = document.supplier.tax_id.clone();
        let skus = document.supplier_skus();
        let number = document.number.clone();

        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let set = ReconciliationSet::from_document(document, generation, Local::now().date_naive());
        if self.workspaces.insert(workspace, set).is_some() {
            tracing::info!("Workspace {} reloaded with NFe {}", workspace, number);
        }
        tracing::info!(
            "Imported NFe {} into workspace {} (generation {}, {} SKUs)",
            number,
            workspace,
            generation,
            skus.len()
        );

        let (status, warning) = self.check_supplier(&tax_id).await;
        self.apply_if_current(workspace, generation, |set| {
            set.set_supplier(status);
            if let Some(warning) = warning {
                set.push_warning(warning);
            }
        })?;

        let resolution = self.resolver.resolve(&tax_id, &skus).await;
        let mapped = self.apply_if_current(workspace, generation, |set| {
            set.apply_resolution(&resolution)
        })?;
        tracing::info!(
            "Workspace {}: {}/{} SKUs mapped automatically",
            workspace,
            mapped,
            skus.len()
        );

        self.snapshot(workspace)
    }

    async fn check_supplier(&self, tax_id: &str) -> (SupplierStatus, Option<String>) {
        let check = tokio::time::timeout(
            self.config.lookup_timeout(),
            self.suppliers.check_supplier_exists(tax_id),
        )
        .await;
        match check {
            Ok(Ok(check)) => (SupplierStatus::from(check), None),
            Ok(Err(e)) => {
                tracing::warn!("Supplier check for {} failed: {}", tax_id, e);
                (
                    SupplierStatus::Unknown,
                    Some(format!("supplier check failed: {e}")),
                )
            }
            Err(_) => {
                tracing::warn!("Supplier check for {} timed out", tax_id);
                (
                    SupplierStatus::Unknown,
                    Some("supplier check timed out".to_string()),
                )
            }
        }
    }

    /// Registers the document's issuer in the supplier directory.
    pub async fn register_supplier(&self, workspace: Uuid) -> Result<SupplierStatus, EntryError> {
        let (generation, identity) =
            self.read(workspace, |set| (set.generation(), set.document().supplier.clone()))?;

        let supplier = self
            .suppliers
            .create_supplier(&NewSupplier {
                tax_id: identity.tax_id,
                legal_name: identity.legal_name,
                trade_name: identity.trade_name,
            })
            .await?;
        tracing::info!("Supplier {} registered as {}", supplier.tax_id, supplier.id);

        let status = SupplierStatus::Registered { supplier };
        self.apply_if_current(workspace, generation, |set| set.set_supplier(status.clone()))?;
        Ok(status)
    }

    /// Maps one item by hand and stores the mapping for future imports.
    pub async fn assign_mapping(
        &self,
        workspace: Uuid,
        sequence: u32,
        assignment: MappingAssignment,
    ) -> Result<ReconciliationItem, EntryError> {
        let (generation, tax_id, sku) = self.read(workspace, |set| {
            set.item(sequence)
                .map(|item| {
                    (
                        set.generation(),
                        set.document().supplier.tax_id.clone(),
                        item.line.supplier_sku.clone(),
                    )
                })
                .ok_or(ReconciliationError::ItemNotFound(sequence))
        })??;

        let mapping = self.resolver.assign(&tax_id, &sku, &assignment).await?;
        tracing::info!(
            "Workspace {}: item {} ({}) mapped to {}",
            workspace,
            sequence,
            sku,
            mapping.internal_product_id
        );

        let item = self.apply_if_current(workspace, generation, |set| {
            set.assign_mapping(sequence, &mapping).cloned()
        })??;
        Ok(item)
    }

    /// Unmaps an item, sending it back to pending if it was confirmed. The
    /// stored mapping is kept for later imports.
    pub fn reset_mapping(&self, workspace: Uuid, sequence: u32) -> Result<ReconciliationItem, EntryError> {
        self.mutate(workspace, |set| set.reset_mapping(sequence).cloned())
    }

    /// Moves a mapped item to the confirmed partition.
    pub fn confirm(&self, workspace: Uuid, sequence: u32) -> Result<ReconciliationItem, EntryError> {
        self.mutate(workspace, |set| set.confirm(sequence).cloned())
    }

    /// Returns a confirmed item to pending.
    pub fn unconfirm(&self, workspace: Uuid, sequence: u32) -> Result<ReconciliationItem, EntryError> {
        self.mutate(workspace, |set| set.unconfirm(sequence).cloned())
    }

    /// Records the physically received quantity of a pending item, rounded
    /// to its unit's precision. Landed cost and delta follow, and any earlier
    /// divergence acknowledgment is cleared.
    pub fn set_received_quantity(
        &self,
        workspace: Uuid,
        sequence: u32,
        quantity: &BigDecimal,
    ) -> Result<ReconciliationItem, EntryError> {
        self.mutate(workspace, |set| {
            set.set_received_quantity(sequence, quantity).cloned()
        })
    }

    /// Accepts the item's quantity divergence for submission. A no-op on an
    /// item whose received quantity matches the invoice.
    pub fn acknowledge_divergence(
        &self,
        workspace: Uuid,
        sequence: u32,
    ) -> Result<ReconciliationItem, EntryError> {
        self.mutate(workspace, |set| set.acknowledge_divergence(sequence).cloned())
    }

    /// Takes the item out of the entry entirely.
    pub fn remove_item(&self, workspace: Uuid, sequence: u32) -> Result<ReconciliationItem, EntryError> {
        let removed = self.mutate(workspace, |set| set.remove(sequence))?;
        tracing::info!("Workspace {}: item {} removed", workspace, sequence);
        Ok(removed)
    }

    pub fn select(&self, workspace: Uuid, sequence: u32, selected: bool) -> Result<(), EntryError> {
        self.mutate(workspace, |set| set.select(sequence, selected))
    }

    /// Sets the selection flag on every item of one partition and returns
    /// how many flags changed.
    pub fn select_all(
        &self,
        workspace: Uuid,
        partition: Partition,
        selected: bool,
    ) -> Result<usize, EntryError> {
        self.mutate(workspace, |set| Ok(set.select_all(partition, selected)))
    }

    /// Confirms the selected pending items. Unmapped ones are skipped and
    /// listed in the outcome.
    pub fn bulk_confirm(&self, workspace: Uuid) -> Result<BulkOutcome, EntryError> {
        let outcome = self.mutate(workspace, |set| Ok(set.bulk_confirm()))?;
        if !outcome.skipped.is_empty() {
            tracing::info!(
                "Workspace {}: bulk confirm skipped {} unmapped item(s)",
                workspace,
                outcome.skipped.len()
            );
        }
        Ok(outcome)
    }

    /// Returns the selected confirmed items to pending.
    pub fn bulk_unconfirm(&self, workspace: Uuid) -> Result<BulkOutcome, EntryError> {
        self.mutate(workspace, |set| Ok(set.bulk_unconfirm()))
    }

    /// Sets received back to invoiced on the selected pending items.
    pub fn bulk_reset_quantity(&self, workspace: Uuid) -> Result<BulkOutcome, EntryError> {
        self.mutate(workspace, |set| Ok(set.bulk_reset_quantity()))
    }

    /// Date stamped on the entry header; defaults to the import day.
    pub fn set_entry_date(&self, workspace: Uuid, date: NaiveDate) -> Result<(), EntryError> {
        self.mutate(workspace, |set| {
            set.set_entry_date(date);
            Ok(())
        })
    }

    pub fn snapshot(&self, workspace: Uuid) -> Result<ReconciliationSnapshot, EntryError> {
        self.read(workspace, ReconciliationSet::snapshot)
    }

    /// Drops the workspace's working set without submitting it.
    pub fn discard(&self, workspace: Uuid) -> Result<(), EntryError> {
        self.workspaces
            .remove(&workspace)
            .map(|_| ())
            .ok_or(EntryError::WorkspaceNotFound(workspace))
    }

    /// Validates and submits the working set. The set is discarded only when
    /// the submission collaborator accepts it within `submit_timeout`; a
    /// timeout is reported as an unavailable store and keeps the set.
    pub async fn submit(&self, workspace: Uuid) -> Result<SubmissionReceipt, EntryError> {
        let (generation, payload) = self.read(workspace, |set| {
            submission::build_payload(set).map(|payload| (set.generation(), payload))
        })??;

        let receipt = tokio::time::timeout(
            self.config.submit_timeout(),
            self.submission.submit_entry(&payload),
        )
        .await
        .unwrap_or(Err(StoreError::Timeout))
        .map_err(SubmissionError::from)
        .inspect_err(|e| tracing::warn!("Workspace {}: submission failed: {}", workspace, e))?;

        tracing::info!(
            "Workspace {}: NFe {} submitted as entry {} ({} items)",
            workspace,
            payload.header.document_number,
            receipt.entry_id,
            receipt.items_processed
        );
        self.workspaces
            .remove_if(&workspace, |_, set| set.generation() == generation);

        if let Some(dir) = &self.config.export_dir {
            let path = dir.join(format!("entry-{}.csv", receipt.entry_id));
            // the entry is already stored; an export failure is only logged
            if let Err(e) = export_to_csv(&payload, &path) {
                tracing::error!("Export of entry {} to {:?} failed: {}", receipt.entry_id, path, e);
            }
        }

        Ok(receipt)
    }

    fn read<R>(
        &self,
        workspace: Uuid,
        f: impl FnOnce(&ReconciliationSet) -> R,
    ) -> Result<R, EntryError> {
        self.workspaces
            .get(&workspace)
            .map(|set| f(&set))
            .ok_or(EntryError::WorkspaceNotFound(workspace))
    }

    fn mutate<R>(
        &self,
        workspace: Uuid,
        f: impl FnOnce(&mut ReconciliationSet) -> Result<R, ReconciliationError>,
    ) -> Result<R, EntryError> {
        let mut set = self
            .workspaces
            .get_mut(&workspace)
            .ok_or(EntryError::WorkspaceNotFound(workspace))?;
        Ok(f(&mut set)?)
    }

    fn apply_if_current<R>(
        &self,
        workspace: Uuid,
        generation: u64,
        f: impl FnOnce(&mut ReconciliationSet) -> R,
    ) -> Result<R, EntryError> {
        match self.workspaces.get_mut(&workspace) {
            Some(mut set) if set.generation() == generation => Ok(f(&mut set)),
            _ => {
                tracing::warn!(
                    "Workspace {}: discarding stale response for generation {}",
                    workspace,
                    generation
                );
                Err(EntryError::StaleGeneration(workspace))
            }
        }
    }
}

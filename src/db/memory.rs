//! In-process collaborators, used when no database is configured and by the
//! integration tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::StoreError;
use crate::models::{
    MappingAssignment, NewSupplier, ProductMapping, SubmissionPayload, SubmissionReceipt,
    Supplier, SupplierCheck,
};
use crate::service::ports::{MappingStore, StockSubmission, SupplierDirectory};

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    /// (supplier tax id, supplier sku) -> mapping
    mappings: DashMap<(String, String), ProductMapping>,
    suppliers: DashMap<String, Supplier>,
    entries: DashMap<i64, SubmissionPayload>,
    next_id: AtomicI64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_mapping(&self, mapping: ProductMapping) {
        self.mappings.insert(
            (mapping.supplier_tax_id.clone(), mapping.supplier_sku.clone()),
            mapping,
        );
    }

    pub fn insert_supplier(&self, supplier: NewSupplier) -> Supplier {
        let record = Supplier {
            id: self.next_id(),
            tax_id: supplier.tax_id,
            legal_name: supplier.legal_name,
            trade_name: supplier.trade_name,
        };
        self.suppliers.insert(record.tax_id.clone(), record.clone());
        record
    }

    /// Submitted entry by id.
    pub fn entry(&self, entry_id: i64) -> Option<SubmissionPayload> {
        self.entries.get(&entry_id).map(|e| e.clone())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl MappingStore for MemoryCatalog {
    async fn lookup_mappings(
        &self,
        supplier_tax_id: &str,
        skus: &[String],
    ) -> Result<Vec<ProductMapping>, StoreError> {
        Ok(skus
            .iter()
            .filter_map(|sku| {
                self.mappings
                    .get(&(supplier_tax_id.to_string(), sku.clone()))
                    .map(|m| m.clone())
            })
            .collect())
    }

    async fn assign_mapping(
        &self,
        supplier_tax_id: &str,
        supplier_sku: &str,
        assignment: &MappingAssignment,
    ) -> Result<ProductMapping, StoreError> {
        if assignment.internal_product_id.trim().is_empty() {
            return Err(StoreError::Rejected("internal product id is required".into()));
        }
        let mapping = ProductMapping {
            supplier_tax_id: supplier_tax_id.to_string(),
            supplier_sku: supplier_sku.to_string(),
            internal_product_id: assignment.internal_product_id.clone(),
            description: assignment.description.clone().unwrap_or_default(),
            category: assignment.category.clone(),
            unit_of_measure: assignment.unit_of_measure.clone(),
        };
        self.insert_mapping(mapping.clone());
        Ok(mapping)
    }
}

#[async_trait]
impl SupplierDirectory for MemoryCatalog {
    async fn check_supplier_exists(&self, tax_id: &str) -> Result<SupplierCheck, StoreError> {
        let supplier = self.suppliers.get(tax_id).map(|s| s.clone());
        Ok(SupplierCheck {
            exists: supplier.is_some(),
            supplier,
        })
    }

    async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, StoreError> {
        if self.suppliers.contains_key(&supplier.tax_id) {
            return Err(StoreError::Rejected(format!(
                "supplier {} already registered",
                supplier.tax_id
            )));
        }
        Ok(self.insert_supplier(supplier.clone()))
    }
}

#[async_trait]
impl StockSubmission for MemoryCatalog {
    async fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, StoreError> {
        let access_key = &payload.header.access_key;
        if !access_key.is_empty()
            && self
                .entries
                .iter()
                .any(|e| &e.value().header.access_key == access_key)
        {
            return Err(StoreError::Rejected(format!(
                "invoice {access_key} already entered"
            )));
        }

        let entry_id = self.next_id();
        self.entries.insert(entry_id, payload.clone());
        tracing::info!("Stock entry {} stored in memory, {} items", entry_id, payload.items.len());

        Ok(SubmissionReceipt {
            entry_id,
            items_processed: payload.items.len(),
        })
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::ports::MappingStore;
use crate::error::{MappingLookupError, StoreError};
use crate::models::{MappingAssignment, ProductMapping};

/// Outcome of the batch lookup done at import time.
#[derive(Debug, Clone, Default)]
pub struct MappingResolution {
    /// Keyed by supplier SKU.
    pub mappings: HashMap<String, ProductMapping>,
    /// Set when the lookup failed and every item was left unmapped.
    pub warning: Option<String>,
}

impl MappingResolution {
    pub fn get(&self, sku: &str) -> Option<&ProductMapping> {
        self.mappings.get(sku)
    }
}

/// Resolves supplier SKUs through the mapping store.
pub struct MappingResolver {
    store: Arc<dyn MappingStore>,
    timeout: Duration,
}

impl MappingResolver {
    pub fn new(store: Arc<dyn MappingStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Batch lookup that never fails: on error every SKU stays unmapped and
    /// the error is reported as a warning.
    pub async fn resolve(&self, supplier_tax_id: &str, skus: &[String]) -> MappingResolution {
        match self.try_resolve(supplier_tax_id, skus).await {
            Ok(mappings) => {
                tracing::info!(
                    "Resolved {}/{} SKUs for supplier {}",
                    mappings.len(),
                    skus.len(),
                    supplier_tax_id
                );
                MappingResolution {
                    mappings,
                    warning: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Mapping lookup for supplier {} failed, all items left unmapped: {}",
                    supplier_tax_id,
                    e
                );
                MappingResolution {
                    mappings: HashMap::new(),
                    warning: Some(format!("{e}; all items were left unmapped")),
                }
            }
        }
    }

    pub async fn try_resolve(
        &self,
        supplier_tax_id: &str,
        skus: &[String],
    ) -> Result<HashMap<String, ProductMapping>, MappingLookupError> {
        if skus.is_empty() {
            return Ok(HashMap::new());
        }

        let found = tokio::time::timeout(
            self.timeout,
            self.store.lookup_mappings(supplier_tax_id, skus),
        )
        .await
        .map_err(|_| MappingLookupError::Timeout(self.timeout.as_secs()))??;

        Ok(found
            .into_iter()
            // stores may return more than was asked for
            .filter(|m| skus.contains(&m.supplier_sku))
            .map(|m| (m.supplier_sku.clone(), m))
            .collect())
    }

    /// Targeted assignment for one supplier SKU.
    pub async fn assign(
        &self,
        supplier_tax_id: &str,
        supplier_sku: &str,
        assignment: &MappingAssignment,
    ) -> Result<ProductMapping, StoreError> {
        tokio::time::timeout(
            self.timeout,
            self.store
                .assign_mapping(supplier_tax_id, supplier_sku, assignment),
        )
        .await
        .map_err(|_| StoreError::Timeout)?
    }
}

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    MappingAssignment, NewSupplier, ProductMapping, SubmissionPayload, SubmissionReceipt,
    Supplier, SupplierCheck,
};

/// Supplier SKU -> internal product mappings.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Known mappings for `skus` of one supplier. SKUs without a mapping are
    /// simply absent from the result.
    async fn lookup_mappings(
        &self,
        supplier_tax_id: &str,
        skus: &[String],
    ) -> Result<Vec<ProductMapping>, StoreError>;

    /// Creates or replaces the mapping of one supplier SKU.
    async fn assign_mapping(
        &self,
        supplier_tax_id: &str,
        supplier_sku: &str,
        assignment: &MappingAssignment,
    ) -> Result<ProductMapping, StoreError>;
}

#[async_trait]
pub trait SupplierDirectory: Send + Sync {
    async fn check_supplier_exists(&self, tax_id: &str) -> Result<SupplierCheck, StoreError>;
    async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, StoreError>;
}

#[async_trait]
pub trait StockSubmission: Send + Sync {
    async fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, StoreError>;
}

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DocumentTotals, SupplierIdentity};

/// Stock entry handed to the submission collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub header: EntryHeader,
    pub items: Vec<EntryLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Invoice number without the display prefix.
    pub document_number: String,
    pub series: String,
    pub access_key: String,
    pub entry_date: NaiveDate,
    pub issue_date: Option<NaiveDate>,
    pub supplier: SupplierIdentity,
    pub totals: DocumentTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryLine {
    pub internal_product_id: String,
    pub supplier_sku: String,
    pub received_quantity: BigDecimal,
    pub unit_of_measure: String,
    pub landed_unit_cost: BigDecimal,
}

/// Acknowledgment returned by the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub entry_id: i64,
    pub items_processed: usize,
}

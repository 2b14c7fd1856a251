use super::reconciliation::ReconciliationSet;
use crate::error::ValidationError;
use crate::models::{strip_number_prefix, EntryHeader, EntryLine, SubmissionPayload};

/// Checks the submission preconditions, in order: not empty, all mapped,
/// all confirmed, divergences acknowledged.
pub fn validate(set: &ReconciliationSet) -> Result<(), ValidationError> {
    if set.is_empty() {
        return Err(ValidationError::EmptyEntry);
    }

    let unmapped: Vec<u32> = set.unmapped().iter().map(|i| i.sequence()).collect();
    if !unmapped.is_empty() {
        return Err(ValidationError::UnmappedItems { items: unmapped });
    }

    let pending: Vec<u32> = set.pending().iter().map(|i| i.sequence()).collect();
    if !pending.is_empty() {
        return Err(ValidationError::PendingItems { items: pending });
    }

    let unacknowledged: Vec<u32> = set
        .items()
        .filter(|i| i.needs_acknowledgment())
        .map(|i| i.sequence())
        .collect();
    if !unacknowledged.is_empty() {
        return Err(ValidationError::UnacknowledgedDivergence {
            items: unacknowledged,
        });
    }

    Ok(())
}

/// Assembles the stock entry payload from a fully reconciled set.
pub fn build_payload(set: &ReconciliationSet) -> Result<SubmissionPayload, ValidationError> {
    validate(set)?;

    let document = set.document();
    let header = EntryHeader {
        document_number: strip_number_prefix(&document.display_number()),
        series: document.series.clone(),
        access_key: document.access_key.clone(),
        entry_date: set.entry_date(),
        issue_date: document.issue_date,
        supplier: document.supplier.clone(),
        totals: document.totals.clone(),
    };

    let items = set
        .items()
        .filter_map(|item| {
            // validate() guarantees every item is mapped
            let internal_product_id = item.internal_product_id.clone()?;
            Some(EntryLine {
                internal_product_id,
                supplier_sku: item.line.supplier_sku.clone(),
                received_quantity: item.received_quantity.clone(),
                unit_of_measure: item.effective_unit().to_string(),
                landed_unit_cost: item.landed_unit_cost.clone(),
            })
        })
        .collect();

    Ok(SubmissionPayload { header, items })
}

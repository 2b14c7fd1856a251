use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use super::{InvoiceLineItem, ProductMapping};

/// Working entity of the reconciliation: one per invoice line.
///
/// Only the reconciliation set hands out mutable access, so the
/// `is_confirmed => is_mapped` invariant is kept there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationItem {
    #[serde(flatten)]
    pub line: InvoiceLineItem,
    pub is_mapped: bool,
    pub internal_product_id: Option<String>,
    pub mapped_description: Option<String>,
    pub category: Option<String>,
    pub canonical_unit: Option<String>,
    pub apportioned_freight: BigDecimal,
    pub apportioned_ipi: BigDecimal,
    pub apportioned_other_expenses: BigDecimal,
    pub landed_unit_cost: BigDecimal,
    pub received_quantity: BigDecimal,
    pub quantity_delta: BigDecimal,
    pub is_confirmed: bool,
    pub selected: bool,
    pub divergence_acknowledged: bool,
}

impl ReconciliationItem {
    pub fn sequence(&self) -> u32 {
        self.line.sequence
    }

    pub fn supplier_sku(&self) -> &str {
        &self.line.supplier_sku
    }

    /// Canonical unit once mapped, invoice unit otherwise.
    pub fn effective_unit(&self) -> &str {
        self.canonical_unit
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.line.unit_of_measure)
    }

    pub fn is_divergent(&self) -> bool {
        !self.quantity_delta.is_zero()
    }

    pub fn needs_acknowledgment(&self) -> bool {
        self.is_divergent() && !self.divergence_acknowledged
    }

    /// Sum of the apportioned document charges.
    pub fn apportioned_charges(&self) -> BigDecimal {
        &self.apportioned_freight + &self.apportioned_ipi + &self.apportioned_other_expenses
    }

    pub(crate) fn apply_mapping(&mut self, mapping: &ProductMapping) {
        self.is_mapped = true;
        self.internal_product_id = Some(mapping.internal_product_id.clone());
        self.mapped_description = Some(mapping.description.clone());
        self.category = mapping.category.clone();
        self.canonical_unit = mapping.unit_of_measure.clone();
    }

    pub(crate) fn clear_mapping(&mut self) {
        self.is_mapped = false;
        self.internal_product_id = None;
        self.mapped_description = None;
        self.category = None;
        self.canonical_unit = None;
        self.is_confirmed = false;
    }
}

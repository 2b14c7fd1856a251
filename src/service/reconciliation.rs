//! Reconciliation working set.
//!
//! Per item state is {unmapped, mapped} x {pending, confirmed}. All items live
//! in one ordered map; pending/confirmed partitions and the two selection
//! sets are views over it, never separate collections.

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::apportionment::{self, Apportionment, ChargeTotals};
use super::mapping::MappingResolution;
use super::quantity::{normalize_quantity, within_input_scale};
use crate::error::ReconciliationError;
use crate::models::{
    DocumentTotals, InvoiceDocument, InvoiceLineItem, ProductMapping, ReconciliationItem,
    SupplierIdentity, SupplierStatus,
};

/// Which side of the pending/confirmed split an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub applied: Vec<u32>,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub sequence: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub divergent: usize,
    pub selected_pending: usize,
    pub selected_confirmed: usize,
}

/// Serializable view handed to the API.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationSnapshot {
    pub generation: u64,
    pub access_key: String,
    pub document_number: String,
    pub series: String,
    pub issue_date: Option<NaiveDate>,
    pub entry_date: NaiveDate,
    pub supplier_identity: SupplierIdentity,
    pub supplier: SupplierStatus,
    pub totals: DocumentTotals,
    pub warnings: Vec<String>,
    pub summary: ReconciliationSummary,
    pub items: Vec<ReconciliationItem>,
}

#[derive(Debug, Clone)]
pub struct ReconciliationSet {
    generation: u64,
    document: InvoiceDocument,
    items: IndexMap<u32, ReconciliationItem>,
    entry_date: NaiveDate,
    supplier: SupplierStatus,
    warnings: Vec<String>,
}

impl ReconciliationSet {
    /// Builds the working set for a freshly parsed document: apportions the
    /// document charges and normalizes quantities. Every item starts
    /// unmapped and pending, with received = invoiced.
    pub fn from_document(document: InvoiceDocument, generation: u64, entry_date: NaiveDate) -> Self {
        let charges = ChargeTotals::from(&document.totals);
        let values: Vec<BigDecimal> = document
            .items
            .iter()
            .map(|i| i.line_product_value.clone())
            .collect();
        let shares = apportionment::apportion(&charges, &values);

        let mut items = IndexMap::with_capacity(document.items.len());
        for (line, share) in document.items.iter().cloned().zip(shares) {
            let item = new_item(line, share);
            if items.insert(item.sequence(), item).is_some() {
                tracing::warn!("Duplicate nItem in document {}, keeping the last one", document.number);
            }
        }

        Self {
            generation,
            document,
            items,
            entry_date,
            supplier: SupplierStatus::Unknown,
            warnings: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn document(&self) -> &InvoiceDocument {
        &self.document
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn set_entry_date(&mut self, date: NaiveDate) {
        self.entry_date = date;
    }

    pub fn supplier(&self) -> &SupplierStatus {
        &self.supplier
    }

    pub fn set_supplier(&mut self, status: SupplierStatus) {
        self.supplier = status;
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &ReconciliationItem> {
        self.items.values()
    }

    pub fn item(&self, sequence: u32) -> Option<&ReconciliationItem> {
        self.items.get(&sequence)
    }

    pub fn pending(&self) -> Vec<&ReconciliationItem> {
        self.items().filter(|i| !i.is_confirmed).collect()
    }

    pub fn confirmed(&self) -> Vec<&ReconciliationItem> {
        self.items().filter(|i| i.is_confirmed).collect()
    }

    pub fn unmapped(&self) -> Vec<&ReconciliationItem> {
        self.items().filter(|i| !i.is_mapped).collect()
    }

    pub fn divergent(&self) -> Vec<&ReconciliationItem> {
        self.items().filter(|i| i.is_divergent()).collect()
    }

    /// Sequences selected within `partition`.
    pub fn selected(&self, partition: Partition) -> Vec<u32> {
        self.items()
            .filter(|i| i.selected && in_partition(i, partition))
            .map(ReconciliationItem::sequence)
            .collect()
    }

    /// Applies the import-time lookup. Only positive results are written, so
    /// a mapping assigned by hand meanwhile is kept unless the lookup knows
    /// better. Returns how many items were mapped.
    pub fn apply_resolution(&mut self, resolution: &MappingResolution) -> usize {
        let mut mapped = 0;
        for item in self.items.values_mut() {
            if let Some(mapping) = resolution.get(&item.line.supplier_sku) {
                map_item(item, mapping);
                mapped += 1;
            }
        }
        if let Some(warning) = &resolution.warning {
            self.warnings.push(warning.clone());
        }
        mapped
    }

    /// unmapped -> mapped (or remap). Confirmation is left as is; the
    /// received quantity follows the precision of the canonical unit.
    pub fn assign_mapping(
        &mut self,
        sequence: u32,
        mapping: &ProductMapping,
    ) -> Result<&ReconciliationItem, ReconciliationError> {
        let item = self.get_mut(sequence)?;
        map_item(item, mapping);
        Ok(item)
    }

    /// mapped -> unmapped; a confirmed item falls back to pending and the
    /// received quantity goes back to the invoice unit's precision.
    pub fn reset_mapping(&mut self, sequence: u32) -> Result<&ReconciliationItem, ReconciliationError> {
        let item = self.get_mut(sequence)?;
        if item.is_confirmed {
            item.selected = false;
        }
        item.clear_mapping();
        renormalize_received(item);
        Ok(item)
    }

    /// pending -> confirmed, only for mapped items.
    pub fn confirm(&mut self, sequence: u32) -> Result<&ReconciliationItem, ReconciliationError> {
        let item = self.get_mut(sequence)?;
        if !item.is_mapped {
            return Err(ReconciliationError::NotMapped(sequence));
        }
        if !item.is_confirmed {
            item.is_confirmed = true;
            item.selected = false;
        }
        Ok(item)
    }

    /// confirmed -> pending.
    pub fn unconfirm(&mut self, sequence: u32) -> Result<&ReconciliationItem, ReconciliationError> {
        let item = self.get_mut(sequence)?;
        if item.is_confirmed {
            item.is_confirmed = false;
            item.selected = false;
        }
        Ok(item)
    }

    /// Edits the received quantity of a pending item. The value is rounded
    /// to the precision of the item's unit.
    pub fn set_received_quantity(
        &mut self,
        sequence: u32,
        raw: &BigDecimal,
    ) -> Result<&ReconciliationItem, ReconciliationError> {
        let item = self.get_mut(sequence)?;
        if item.is_confirmed {
            return Err(ReconciliationError::Confirmed(sequence));
        }
        if *raw < BigDecimal::zero() {
            return Err(ReconciliationError::NegativeQuantity(sequence));
        }
        if !within_input_scale(raw) {
            return Err(ReconciliationError::QuantityOutOfRange(sequence));
        }
        let quantity = normalize_quantity(raw, item.effective_unit());
        update_received(item, quantity);
        Ok(item)
    }

    /// Accepts the quantity divergence of an item for submission.
    pub fn acknowledge_divergence(
        &mut self,
        sequence: u32,
    ) -> Result<&ReconciliationItem, ReconciliationError> {
        let item = self.get_mut(sequence)?;
        if item.is_divergent() {
            item.divergence_acknowledged = true;
        }
        Ok(item)
    }

    pub fn remove(&mut self, sequence: u32) -> Result<ReconciliationItem, ReconciliationError> {
        self.items
            .shift_remove(&sequence)
            .ok_or(ReconciliationError::ItemNotFound(sequence))
    }

    pub fn select(&mut self, sequence: u32, selected: bool) -> Result<(), ReconciliationError> {
        self.get_mut(sequence)?.selected = selected;
        Ok(())
    }

    /// Selects or clears every item of `partition`. Returns how many changed.
    pub fn select_all(&mut self, partition: Partition, selected: bool) -> usize {
        let mut changed = 0;
        for item in self.items.values_mut() {
            if in_partition(item, partition) && item.selected != selected {
                item.selected = selected;
                changed += 1;
            }
        }
        changed
    }

    /// Confirms the pending selection. Unmapped members are skipped and
    /// reported; the rest are confirmed.
    pub fn bulk_confirm(&mut self) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for sequence in self.selected(Partition::Pending) {
            match self.confirm(sequence) {
                Ok(_) => outcome.applied.push(sequence),
                Err(e) => outcome.skipped.push(SkippedItem {
                    sequence,
                    reason: e.to_string(),
                }),
            }
        }
        outcome
    }

    /// Moves the confirmed selection back to pending.
    pub fn bulk_unconfirm(&mut self) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for sequence in self.selected(Partition::Confirmed) {
            if self.unconfirm(sequence).is_ok() {
                outcome.applied.push(sequence);
            }
        }
        outcome
    }

    /// Resets received = invoiced on the pending selection, in the item's
    /// effective unit.
    pub fn bulk_reset_quantity(&mut self) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for sequence in self.selected(Partition::Pending) {
            if let Ok(item) = self.get_mut(sequence) {
                let invoiced =
                    normalize_quantity(&item.line.invoiced_quantity, item.effective_unit());
                update_received(item, invoiced);
                outcome.applied.push(sequence);
            }
        }
        outcome
    }

    pub fn summary(&self) -> ReconciliationSummary {
        let mut summary = ReconciliationSummary {
            total: self.items.len(),
            ..Default::default()
        };
        for item in self.items() {
            if item.is_mapped {
                summary.mapped += 1;
            } else {
                summary.unmapped += 1;
            }
            if item.is_confirmed {
                summary.confirmed += 1;
                if item.selected {
                    summary.selected_confirmed += 1;
                }
            } else {
                summary.pending += 1;
                if item.selected {
                    summary.selected_pending += 1;
                }
            }
            if item.is_divergent() {
                summary.divergent += 1;
            }
        }
        summary
    }

    pub fn snapshot(&self) -> ReconciliationSnapshot {
        ReconciliationSnapshot {
            generation: self.generation,
            access_key: self.document.access_key.clone(),
            document_number: self.document.display_number(),
            series: self.document.series.clone(),
            issue_date: self.document.issue_date,
            entry_date: self.entry_date,
            supplier_identity: self.document.supplier.clone(),
            supplier: self.supplier.clone(),
            totals: self.document.totals.clone(),
            warnings: self.warnings.clone(),
            summary: self.summary(),
            items: self.items.values().cloned().collect(),
        }
    }

    /// `confirmed => mapped` and `delta = received - invoiced` for every item.
    pub fn invariants_hold(&self) -> bool {
        self.items().all(|i| {
            (!i.is_confirmed || i.is_mapped)
                && i.quantity_delta == &i.received_quantity - &i.line.invoiced_quantity
        })
    }

    fn get_mut(&mut self, sequence: u32) -> Result<&mut ReconciliationItem, ReconciliationError> {
        self.items
            .get_mut(&sequence)
            .ok_or(ReconciliationError::ItemNotFound(sequence))
    }
}

fn in_partition(item: &ReconciliationItem, partition: Partition) -> bool {
    match partition {
        Partition::Pending => !item.is_confirmed,
        Partition::Confirmed => item.is_confirmed,
    }
}

fn new_item(mut line: InvoiceLineItem, share: Apportionment) -> ReconciliationItem {
    line.invoiced_quantity = normalize_quantity(&line.invoiced_quantity, &line.unit_of_measure);
    let received = line.invoiced_quantity.clone();
    let landed = apportionment::landed_unit_cost(
        &line.line_product_value,
        &share,
        &received,
        &line.unit_price,
    );

    ReconciliationItem {
        line,
        is_mapped: false,
        internal_product_id: None,
        mapped_description: None,
        category: None,
        canonical_unit: None,
        apportioned_freight: share.freight,
        apportioned_ipi: share.ipi,
        apportioned_other_expenses: share.other_expenses,
        landed_unit_cost: landed,
        received_quantity: received,
        quantity_delta: BigDecimal::zero(),
        is_confirmed: false,
        selected: false,
        divergence_acknowledged: false,
    }
}

fn map_item(item: &mut ReconciliationItem, mapping: &ProductMapping) {
    item.apply_mapping(mapping);
    renormalize_received(item);
}

/// Re-rounds the received quantity after the effective unit changed. Left
/// alone (acknowledgment included) when the value is already representable.
fn renormalize_received(item: &mut ReconciliationItem) {
    let quantity = normalize_quantity(&item.received_quantity, item.effective_unit());
    if quantity != item.received_quantity {
        update_received(item, quantity);
    }
}

fn update_received(item: &mut ReconciliationItem, quantity: BigDecimal) {
    let share = Apportionment {
        freight: item.apportioned_freight.clone(),
        ipi: item.apportioned_ipi.clone(),
        other_expenses: item.apportioned_other_expenses.clone(),
    };
    item.landed_unit_cost = apportionment::landed_unit_cost(
        &item.line.line_product_value,
        &share,
        &quantity,
        &item.line.unit_price,
    );
    item.quantity_delta = &quantity - &item.line.invoiced_quantity;
    item.received_quantity = quantity;
    item.divergence_acknowledged = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentTotals, SupplierIdentity, TaxDetail};
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn line(sequence: u32, sku: &str, unit: &str, qty: &str, value: &str) -> InvoiceLineItem {
        InvoiceLineItem {
            sequence,
            supplier_sku: sku.into(),
            description: format!("item {sku}"),
            unit_of_measure: unit.into(),
            invoiced_quantity: dec(qty),
            unit_price: &dec(value) / &dec(qty),
            line_product_value: dec(value),
            icms: TaxDetail::Absent,
            ipi: TaxDetail::Absent,
        }
    }

    fn document(items: Vec<InvoiceLineItem>, freight: &str) -> InvoiceDocument {
        InvoiceDocument {
            access_key: "3524".into(),
            number: "55".into(),
            series: "1".into(),
            issue_date: None,
            supplier: SupplierIdentity {
                tax_id: "12345678000190".into(),
                legal_name: "Fornecedor".into(),
                trade_name: None,
            },
            totals: DocumentTotals {
                freight_total: dec(freight),
                ..Default::default()
            },
            items,
        }
    }

    fn mapping(sku: &str) -> ProductMapping {
        ProductMapping {
            supplier_tax_id: "12345678000190".into(),
            supplier_sku: sku.into(),
            internal_product_id: format!("INT-{sku}"),
            description: "Internal".into(),
            category: Some("Hydraulics".into()),
            unit_of_measure: None,
        }
    }

    fn two_item_set() -> ReconciliationSet {
        let doc = document(
            vec![
                line(1, "A", "UN", "10", "60"),
                line(2, "B", "KG", "2.5", "40"),
            ],
            "10",
        );
        ReconciliationSet::from_document(doc, 1, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
    }

    #[test]
    fn import_builds_pending_unmapped_items_with_landed_cost() {
        let set = two_item_set();

        let a = set.item(1).unwrap();
        assert!(!a.is_mapped && !a.is_confirmed);
        assert_eq!(a.apportioned_freight, dec("6.00"));
        assert_eq!(a.received_quantity, dec("10"));
        assert_eq!(a.landed_unit_cost, dec("6.6"));
        assert!(a.quantity_delta.is_zero());

        let b = set.item(2).unwrap();
        assert_eq!(b.apportioned_freight, dec("4.00"));
        assert_eq!(b.landed_unit_cost, dec("17.6"));
        assert!(set.invariants_hold());
    }

    #[test]
    fn confirm_requires_mapping() {
        let mut set = two_item_set();

        assert_eq!(set.confirm(1).unwrap_err(), ReconciliationError::NotMapped(1));
        let a = set.item(1).unwrap();
        assert!(!a.is_confirmed && !a.is_mapped);

        set.assign_mapping(1, &mapping("A")).unwrap();
        assert!(set.confirm(1).unwrap().is_confirmed);
        assert!(set.invariants_hold());
    }

    #[test]
    fn resetting_mapping_unconfirms() {
        let mut set = two_item_set();
        set.assign_mapping(1, &mapping("A")).unwrap();
        set.confirm(1).unwrap();

        let a = set.reset_mapping(1).unwrap();
        assert!(!a.is_mapped);
        assert!(!a.is_confirmed);
        assert!(a.internal_product_id.is_none());
        assert!(set.invariants_hold());
    }

    #[test]
    fn assigning_keeps_confirmation() {
        let mut set = two_item_set();
        set.assign_mapping(1, &mapping("A")).unwrap();
        set.confirm(1).unwrap();

        let mut other = mapping("A");
        other.internal_product_id = "INT-OTHER".into();
        let a = set.assign_mapping(1, &other).unwrap();
        assert!(a.is_confirmed);
        assert_eq!(a.internal_product_id.as_deref(), Some("INT-OTHER"));
    }

    #[test]
    fn quantity_edits_only_while_pending() {
        let mut set = two_item_set();

        let a = set.set_received_quantity(1, &dec("8.4")).unwrap();
        assert_eq!(a.received_quantity, dec("8"));
        assert_eq!(a.quantity_delta, dec("-2"));
        assert_eq!(a.landed_unit_cost, dec("8.25"));
        assert!(a.is_divergent());

        set.assign_mapping(1, &mapping("A")).unwrap();
        set.confirm(1).unwrap();
        assert_eq!(
            set.set_received_quantity(1, &dec("10")).unwrap_err(),
            ReconciliationError::Confirmed(1)
        );
        assert_eq!(set.item(1).unwrap().received_quantity, dec("8"));

        set.unconfirm(1).unwrap();
        assert!(set.set_received_quantity(1, &dec("10")).is_ok());
    }

    #[test]
    fn quantity_uses_canonical_unit_once_mapped() {
        let mut set = two_item_set();
        let mut kg = mapping("A");
        kg.unit_of_measure = Some("KG".into());
        set.assign_mapping(1, &kg).unwrap();

        let a = set.set_received_quantity(1, &dec("9.87654")).unwrap();
        assert_eq!(a.received_quantity, dec("9.877"));
    }

    #[test]
    fn mapping_to_a_count_unit_rounds_the_received_quantity() {
        let doc = document(vec![line(1, "A", "KG", "2.345", "23.45")], "0");
        let mut set =
            ReconciliationSet::from_document(doc, 1, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let mut un = mapping("A");
        un.unit_of_measure = Some("UN".into());

        let a = set.assign_mapping(1, &un).unwrap();
        assert_eq!(a.effective_unit(), "UN");
        assert_eq!(a.received_quantity.to_string(), "2");
        assert_eq!(a.quantity_delta, dec("-0.345"));
        assert_eq!(a.landed_unit_cost, dec("11.725"));
        assert!(a.needs_acknowledgment());

        set.set_received_quantity(1, &dec("3")).unwrap();
        set.select(1, true).unwrap();
        assert_eq!(set.bulk_reset_quantity().applied, vec![1]);
        assert_eq!(set.item(1).unwrap().received_quantity.to_string(), "2");

        let a = set.reset_mapping(1).unwrap();
        assert_eq!(a.effective_unit(), "KG");
        assert_eq!(a.received_quantity, dec("2"));
        assert!(set.invariants_hold());
    }

    #[test]
    fn negative_quantities_are_rejected() {
        let mut set = two_item_set();
        assert_eq!(
            set.set_received_quantity(2, &dec("-1")).unwrap_err(),
            ReconciliationError::NegativeQuantity(2)
        );
    }

    #[test]
    fn extreme_exponents_are_rejected() {
        let mut set = two_item_set();
        for raw in ["1e-200000000", "1e200000000"] {
            assert_eq!(
                set.set_received_quantity(2, &dec(raw)).unwrap_err(),
                ReconciliationError::QuantityOutOfRange(2)
            );
        }
        assert_eq!(set.item(2).unwrap().received_quantity, dec("2.5"));
    }

    #[test]
    fn zero_received_falls_back_to_unit_price() {
        let mut set = two_item_set();
        let b = set.set_received_quantity(2, &BigDecimal::zero()).unwrap();
        assert_eq!(b.landed_unit_cost, dec("16"));
    }

    #[test]
    fn acknowledgment_is_cleared_by_new_edits() {
        let mut set = two_item_set();
        set.set_received_quantity(1, &dec("9")).unwrap();
        assert!(set.acknowledge_divergence(1).unwrap().divergence_acknowledged);

        let a = set.set_received_quantity(1, &dec("7")).unwrap();
        assert!(a.needs_acknowledgment());

        // nothing to acknowledge when quantities agree
        assert!(!set.acknowledge_divergence(2).unwrap().divergence_acknowledged);
    }

    #[test]
    fn bulk_confirm_skips_unmapped_members() {
        let mut set = two_item_set();
        set.assign_mapping(2, &mapping("B")).unwrap();
        assert_eq!(set.select_all(Partition::Pending, true), 2);

        let outcome = set.bulk_confirm();

        assert_eq!(outcome.applied, vec![2]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].sequence, 1);
        assert!(!set.item(1).unwrap().is_confirmed);
        assert!(set.item(1).unwrap().selected);
        assert!(set.item(2).unwrap().is_confirmed);
        assert!(!set.item(2).unwrap().selected);
        assert!(set.invariants_hold());
    }

    #[test]
    fn selections_are_views_over_one_collection() {
        let mut set = two_item_set();
        set.assign_mapping(1, &mapping("A")).unwrap();
        set.confirm(1).unwrap();
        set.select(1, true).unwrap();
        set.select(2, true).unwrap();

        assert_eq!(set.selected(Partition::Confirmed), vec![1]);
        assert_eq!(set.selected(Partition::Pending), vec![2]);

        let outcome = set.bulk_unconfirm();
        assert_eq!(outcome.applied, vec![1]);
        assert!(set.selected(Partition::Confirmed).is_empty());
        assert_eq!(set.selected(Partition::Pending), vec![2]);
        assert_eq!(set.summary().selected_pending, 1);
    }

    #[test]
    fn bulk_reset_restores_invoiced_quantity() {
        let mut set = two_item_set();
        set.set_received_quantity(1, &dec("3")).unwrap();
        set.set_received_quantity(2, &dec("1")).unwrap();
        set.select(1, true).unwrap();

        let outcome = set.bulk_reset_quantity();

        assert_eq!(outcome.applied, vec![1]);
        assert!(!set.item(1).unwrap().is_divergent());
        assert!(set.item(2).unwrap().is_divergent());
    }

    #[test]
    fn remove_drops_the_item() {
        let mut set = two_item_set();
        let removed = set.remove(1).unwrap();
        assert_eq!(removed.supplier_sku(), "A");
        assert_eq!(set.len(), 1);
        assert_eq!(set.remove(1).unwrap_err(), ReconciliationError::ItemNotFound(1));
        assert_eq!(set.confirm(1).unwrap_err(), ReconciliationError::ItemNotFound(1));
    }

    #[test]
    fn resolution_maps_known_skus_and_records_warning() {
        let mut set = two_item_set();
        let mut resolution = MappingResolution::default();
        resolution.mappings.insert("B".into(), mapping("B"));

        assert_eq!(set.apply_resolution(&resolution), 1);
        assert!(!set.item(1).unwrap().is_mapped);
        assert!(set.item(2).unwrap().is_mapped);
        assert_eq!(set.item(2).unwrap().category.as_deref(), Some("Hydraulics"));

        let failed = MappingResolution {
            warning: Some("lookup down".into()),
            ..Default::default()
        };
        set.apply_resolution(&failed);
        assert_eq!(set.warnings(), ["lookup down".to_string()]);
    }

    #[test]
    fn summary_counts_each_state() {
        let mut set = two_item_set();
        set.assign_mapping(1, &mapping("A")).unwrap();
        set.confirm(1).unwrap();
        set.set_received_quantity(2, &dec("3")).unwrap();

        let summary = set.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.mapped, 1);
        assert_eq!(summary.unmapped, 1);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.divergent, 1);
    }
}

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parsed NFe, immutable once built by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub access_key: String,
    pub number: String,
    pub series: String,
    pub issue_date: Option<NaiveDate>,
    pub supplier: SupplierIdentity,
    pub totals: DocumentTotals,
    pub items: Vec<InvoiceLineItem>,
}

impl InvoiceDocument {
    /// Distinct supplier SKUs, in document order.
    pub fn supplier_skus(&self) -> Vec<String> {
        let mut skus: Vec<String> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !skus.contains(&item.supplier_sku) {
                skus.push(item.supplier_sku.clone());
            }
        }
        skus
    }

    /// Number as shown to the user, e.g. `NF-e 000123`.
    pub fn display_number(&self) -> String {
        format!("{}{}", NUMBER_DISPLAY_PREFIX, self.number)
    }
}

pub const NUMBER_DISPLAY_PREFIX: &str = "NF-e ";

/// Issuer (emitente) block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierIdentity {
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
}

/// Document totals (ICMSTot). Absent values are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub product_total: BigDecimal,
    pub freight_total: BigDecimal,
    pub ipi_total: BigDecimal,
    pub other_expenses_total: BigDecimal,
    pub discount_total: BigDecimal,
    pub icms_total: BigDecimal,
    pub icms_st_total: BigDecimal,
    pub approx_tax_total: BigDecimal,
    pub grand_total: BigDecimal,
}

/// One `det` entry of the invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub sequence: u32,
    pub supplier_sku: String,
    pub description: String,
    pub unit_of_measure: String,
    pub invoiced_quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub line_product_value: BigDecimal,
    pub icms: TaxDetail,
    pub ipi: TaxDetail,
}

impl InvoiceLineItem {
    pub fn line_icms(&self) -> BigDecimal {
        self.icms.value()
    }

    pub fn line_ipi(&self) -> BigDecimal {
        self.ipi.value()
    }
}

/// Tax group of a line item. The child tag that carries the value depends on
/// the tax regime (ICMS00, ICMS20, ICMSSN101, IPITrib, IPINT, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxDetail {
    /// Regime block carrying a value leaf.
    Taxed { regime: String, value: BigDecimal },
    /// Regime block present but without a value leaf (exempt, suspended, ...).
    Untaxed { regime: String },
    Absent,
}

impl TaxDetail {
    pub fn value(&self) -> BigDecimal {
        match self {
            TaxDetail::Taxed { value, .. } => value.clone(),
            TaxDetail::Untaxed { .. } | TaxDetail::Absent => BigDecimal::zero(),
        }
    }

    pub fn regime(&self) -> Option<&str> {
        match self {
            TaxDetail::Taxed { regime, .. } | TaxDetail::Untaxed { regime } => Some(regime),
            TaxDetail::Absent => None,
        }
    }
}

/// Strips a display prefix (`NF-e`, `NFe`, `NF`, `Nº`, `N°`, `#`) from a
/// document number.
pub fn strip_number_prefix(number: &str) -> String {
    let trimmed = number.trim();
    let upper = trimmed.to_uppercase();
    for prefix in ["NF-E", "NFE", "NF", "Nº", "N°", "NO.", "#"] {
        if upper.starts_with(prefix) {
            // Prefixes are matched on the uppercased copy; slice the original by char count.
            let skip = prefix.chars().count();
            let rest: String = trimmed.chars().skip(skip).collect();
            return rest
                .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == '.')
                .to_string();
        }
    }
    trimmed.to_string()
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Supplier SKU -> internal product, as kept by the mapping store.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProductMapping {
    pub supplier_tax_id: String,
    pub supplier_sku: String,
    pub internal_product_id: String,
    pub description: String,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
}

/// Manual mapping chosen by the user for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingAssignment {
    pub internal_product_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
}

/// Supplier directory record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSupplier {
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
}

/// Result of a supplier existence check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierCheck {
    pub exists: bool,
    pub supplier: Option<Supplier>,
}

/// What the working set knows about the issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SupplierStatus {
    /// Check not done yet or failed.
    #[default]
    Unknown,
    Registered { supplier: Supplier },
    Unregistered,
}

impl From<SupplierCheck> for SupplierStatus {
    fn from(check: SupplierCheck) -> Self {
        match (check.exists, check.supplier) {
            (true, Some(supplier)) => SupplierStatus::Registered { supplier },
            // exists without a record: keep it unknown rather than guessing
            (true, None) => SupplierStatus::Unknown,
            (false, _) => SupplierStatus::Unregistered,
        }
    }
}

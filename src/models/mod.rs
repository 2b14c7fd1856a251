pub mod document;
pub mod item;
pub mod mapping;
pub mod submission;

pub use document::{
    strip_number_prefix, DocumentTotals, InvoiceDocument, InvoiceLineItem, SupplierIdentity,
    TaxDetail, NUMBER_DISPLAY_PREFIX,
};
pub use item::ReconciliationItem;
pub use mapping::{
    MappingAssignment, NewSupplier, ProductMapping, Supplier, SupplierCheck, SupplierStatus,
};
pub use submission::{EntryHeader, EntryLine, SubmissionPayload, SubmissionReceipt};

pub mod apportionment;
pub mod mapping;
pub mod ports;
pub mod quantity;
pub mod reconciliation;
pub mod submission;
pub mod workflow;

pub use mapping::{MappingResolution, MappingResolver};
pub use ports::{MappingStore, StockSubmission, SupplierDirectory};
pub use reconciliation::{
    BulkOutcome, Partition, ReconciliationSet, ReconciliationSnapshot, ReconciliationSummary,
    SkippedItem,
};
pub use workflow::StockEntryService;

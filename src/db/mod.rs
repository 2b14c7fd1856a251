pub mod export;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use export::export_to_csv;
pub use memory::MemoryCatalog;
pub use pool::create_pool;
pub use postgres::PgCatalog;

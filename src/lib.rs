pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod parser;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, MemoryCatalog, PgCatalog};
pub use error::EntryError;
pub use service::StockEntryService;

use nfe_stock_entry::{api, create_pool, AppConfig, MemoryCatalog, PgCatalog, StockEntryService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    let service = match &config.database.url {
        Some(url) => {
            let pool = create_pool(url).await?;
            info!("Database pool created");
            let catalog = Arc::new(PgCatalog::new(pool));
            StockEntryService::new(
                catalog.clone(),
                catalog.clone(),
                catalog,
                config.entry.clone(),
            )
        }
        None => {
            warn!("No database configured, mappings and entries are kept in memory");
            let catalog = Arc::new(MemoryCatalog::new());
            StockEntryService::new(
                catalog.clone(),
                catalog.clone(),
                catalog,
                config.entry.clone(),
            )
        }
    };

    let app = api::router(Arc::new(service));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("  PUT  /api/workspaces/:ws/document  - import NF-e XML");
    info!("  POST /api/workspaces/:ws/submit    - submit stock entry");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

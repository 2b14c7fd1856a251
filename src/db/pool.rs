use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Statements slower than this are logged at WARN.
const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_secs(2);

/// Creates the Postgres pool backing the mapping store, supplier directory
/// and stock submission.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let connect_options = PgConnectOptions::from_str(database_url)?
        .log_slow_statements(tracing::log::LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD);

    // one editor per workspace, so a handful of connections is plenty
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}

use std::str::FromStr;
use std::time::Duration;

use catalog_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a pool with default sizing for `database_url`.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    open_pool(&DatabaseConfig { url: database_url.to_string(), ..DatabaseConfig::default() }).await
}

/// Opens a pool for `settings`.
///
/// An in-memory database lives only as long as its connection, so such pools are
/// pinned to one connection that is never recycled.
pub async fn open_pool(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool_options =
        SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(settings.timeout_secs.max(1)));

    let pool_options = if is_in_memory(&settings.url) {
        pool_options.max_connections(1).min_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
        pool_options.max_connections(settings.max_connections.max(1))
    };

    pool_options.connect_with(options).await
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

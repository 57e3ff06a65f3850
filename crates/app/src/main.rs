use std::{net::SocketAddr, time::Duration};

use engine::{Engine, SqlStorage};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, DatabaseConnection};
use settings::Database;

mod settings;

const MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "merchcoin={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server_settings) = settings.server else {
        tracing::warn!("no [server] settings found, nothing to run");
        return Ok(());
    };

    let db = parse_database(&server_settings.database).await?;
    let mut builder = Engine::builder(SqlStorage::new(db));
    if let Some(coins) = settings.engine.initial_balance {
        builder = builder.initial_balance(coins);
    }
    if let Some(timeout) = settings.engine.operation_timeout_ms {
        builder = builder.operation_timeout(Duration::from_millis(timeout));
    }
    let engine = builder.build().await?;

    let bind = server_settings
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server_settings.port).parse()?;
    server::run(engine, addr).await?;

    Ok(())
}

/// Connects and migrates. A single pooled connection keeps SQLite writers
/// from contending for the file lock.
async fn parse_database(
    config: &Database,
) -> Result<DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = match config {
        Database::Memory => {
            // The in-memory database lives exactly as long as its connection.
            let mut options = ConnectOptions::new("sqlite::memory:");
            options
                .min_connections(1)
                .max_lifetime(MEMORY_CONNECTION_LIFETIME);
            options
        }
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{}?mode=rwc", path)),
    };
    options.max_connections(1).sqlx_logging(false);
    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}

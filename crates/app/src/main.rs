use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pocketledger={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let thresholds = engine::Thresholds::from_ratio(settings.budget.warning_ratio)?;
    let db = parse_database(&settings.server.database).await?;

    let engine = engine::Engine::builder()
        .database(db)
        .thresholds(thresholds)
        .timeout(Duration::from_millis(settings.budget.timeout_ms))
        .build();

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, settings.server.port).parse()?;
    tracing::info!(
        "warning threshold at {:.0}%, collaborator timeout {}ms",
        thresholds.warning_ratio() * 100.0,
        settings.budget.timeout_ms
    );

    let mut tasks = tokio::task::JoinSet::new();
    tasks.spawn(server::run(engine, addr));
    tasks.spawn(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {err}");
            return;
        }
        tracing::info!("shutting down");
    });

    // Whichever finishes first (server failure or ctrl-c) stops the rest.
    if tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(&url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready at {url}");
    Ok(database)
}

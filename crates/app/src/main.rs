use std::net::SocketAddr;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

/// Personal expenditure tracker backend.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file, without extension
    #[arg(long, env = "EXPENDITURE_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expenditure={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database()).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .config(settings.engine_config())
        .build()
        .await?;

    if let Err(err) = engine.check_schema_version().await {
        tracing::error!("refusing to start: {err}");
        return Err(err.into());
    }

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, settings.server.port).parse()?;
    server::run(engine, addr, &settings.server.root_url).await;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

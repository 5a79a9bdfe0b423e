use clap::{Parser, Subcommand};
use config::{Config, ConfigError, Environment, File};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

/// Apply or inspect the expenditure schema migrations.
#[derive(Parser, Debug)]
struct Cli {
    /// Connection string; when absent the sqlite path comes from the app settings.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// App settings file, without extension.
    #[arg(long, env = "EXPENDITURE_CONFIG", default_value = "settings")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    #[default]
    Up,
    /// Roll back `steps` migrations, or all of them.
    Down {
        #[arg(long)]
        steps: Option<u32>,
    },
    Fresh,
    Status,
}

/// Same lookup as the app: `[database] sqlite = "<path>"`, overridable with
/// `EXPENDITURE__DATABASE__SQLITE`.
fn settings_url(path: &str) -> Result<String, ConfigError> {
    let settings = Config::builder()
        .set_default("database.sqlite", "expenditure.db")?
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::with_prefix("EXPENDITURE").separator("__"))
        .build()?;
    let sqlite = settings.get_string("database.sqlite")?;
    Ok(format!("sqlite:{sqlite}?mode=rwc"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let db_url = match cli.database_url {
        Some(url) => url,
        None => settings_url(&cli.config)?,
    };

    let db = Database::connect(&db_url).await?;
    match cli.command.unwrap_or_default() {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down { steps } => migration::Migrator::down(&db, steps).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}

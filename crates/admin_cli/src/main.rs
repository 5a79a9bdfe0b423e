use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{AccountRole, Engine, EngineConfig, SCHEMA_VERSION};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

mod prompt;

#[derive(Parser, Debug)]
#[command(name = "expenditure_admin")]
#[command(about = "Admin utilities for the expenditure tracker (accounts, schema)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./expenditure.db?mode=rwc"
    )]
    database_url: String,

    /// bcrypt cost for new password hashes.
    #[arg(long, default_value_t = 14)]
    bcrypt_cost: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Schema(Schema),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create an account; the password is asked interactively.
    Create(AccountCreateArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long, value_enum, default_value_t = Role::User)]
    role: Role,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Role {
    Admin,
    User,
}

impl From<Role> for AccountRole {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => AccountRole::Admin,
            Role::User => AccountRole::User,
        }
    }
}

#[derive(Args, Debug)]
struct Schema {
    #[command(subcommand)]
    command: SchemaCommand,
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Apply pending migrations and print the current schema version.
    Version,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .config(EngineConfig {
            bcrypt_cost: cli.bcrypt_cost,
            ..Default::default()
        })
        .build()
        .await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let password = prompt::new_password()?;
            match engine
                .insert_account(&args.email, &password, args.role.into())
                .await
            {
                Ok(id) => println!("created account: {} ({id})", args.email),
                Err(engine::EngineError::ConstraintViolation(_)) => {
                    eprintln!("account already exists: {}", args.email);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Schema(Schema {
            command: SchemaCommand::Version,
        }) => {
            let version = engine.schema_version().await?;
            println!("schema version: {version} (expected {SCHEMA_VERSION})");
        }
    }

    Ok(())
}

//! Handles settings for the application. Configuration is read from
//! `settings.toml` (or the file given with `--config`), then overridden by
//! `EXPENDITURE__<SECTION>__<KEY>` environment variables.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8080
//! root_url = "/api"
//!
//! [database]
//! sqlite = "expenditure.db"
//!
//! [session]
//! bcrypt_cost = 14
//! timeout_secs = 3600
//! refresh_secs = 900
//! ```
use config::{Config, ConfigError, Environment, File};
use engine::EngineConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub root_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub bcrypt_cost: u32,
    pub timeout_secs: i64,
    pub refresh_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    database: Option<Database>,
    pub session: Session,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 8080)?
            .set_default("server.root_url", "/api")?
            .set_default("session.bcrypt_cost", 14)?
            .set_default("session.timeout_secs", 3600)?
            .set_default("session.refresh_secs", 900)?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("EXPENDITURE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn database(&self) -> Database {
        self.database
            .clone()
            .unwrap_or_else(|| Database::Sqlite("expenditure.db".to_string()))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            bcrypt_cost: self.session.bcrypt_cost,
            session_timeout: chrono::Duration::seconds(self.session.timeout_secs),
            refresh_window: chrono::Duration::seconds(self.session.refresh_secs),
        }
    }
}

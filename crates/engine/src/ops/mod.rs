use sea_orm::DatabaseConnection;

use crate::{EngineConfig, EngineError, ResultEngine};

mod accounts;
mod products;
mod purchases;
mod schema;
mod sessions;
mod tags;

use accounts::hash_password;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// An early `?` inside the block drops the transaction, which rolls it back as well.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = $tx.rollback().await {
                    tracing::warn!("rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
    // Verified against when the email is unknown, so both paths pay for one hash.
    dummy_hash: String,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override hashing cost and session timings.
    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let dummy_hash = hash_password("not-a-real-password", self.config.bcrypt_cost).await?;
        Ok(Engine {
            database: self.database,
            config: self.config,
            dummy_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            normalize_required_name("  Milk ", "product").unwrap(),
            "Milk"
        );
        assert!(matches!(
            normalize_required_name("   ", "tag"),
            Err(EngineError::InvalidName(_))
        ));
    }
}

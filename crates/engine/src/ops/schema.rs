use sea_orm::{QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, SCHEMA_VERSION, metadata};

use super::Engine;

impl Engine {
    /// Version of the schema currently marked as current.
    pub async fn schema_version(&self) -> ResultEngine<i32> {
        metadata::Entity::find()
            .filter(metadata::Column::IsCurrent.eq(true))
            .one(&self.database)
            .await?
            .map(|row| row.version)
            .ok_or(EngineError::MissingSchemaVersion)
    }

    /// Fail unless the database is exactly at [`SCHEMA_VERSION`].
    ///
    /// Must succeed before any other operation is served.
    pub async fn check_schema_version(&self) -> ResultEngine<()> {
        let found = self.schema_version().await?;
        if found != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        tracing::debug!(version = found, "schema version checked");
        Ok(())
    }
}

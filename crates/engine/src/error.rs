//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`InvalidCredentials`] when an email/password pair does not match.
//! - [`InvalidSession`] and [`SessionExpired`] for session validation.
//! - [`NotFound`] when a targeted id + account filter affected no rows.
//! - [`ConstraintViolation`] when the storage layer rejected a domain rule.
//!
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
//!  [`InvalidSession`]: EngineError::InvalidSession
//!  [`SessionExpired`]: EngineError::SessionExpired
//!  [`NotFound`]: EngineError::NotFound
//!  [`ConstraintViolation`]: EngineError::ConstraintViolation
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("missing or invalid session token")]
    InvalidSession,
    #[error("session has been expired")]
    SessionExpired,
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("mismatching DB version: expected {expected}, found {found}")]
    SchemaVersion { expected: i32, found: i32 },
    #[error("DB schema version is missing")]
    MissingSchemaVersion,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Classify a storage error raised by a statement.
    ///
    /// Constraint failures (CHECK, UNIQUE, FOREIGN KEY) become
    /// [`EngineError::ConstraintViolation`]; anything else stays a database
    /// error and propagates unmodified.
    pub(crate) fn from_statement(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return Self::ConstraintViolation(msg);
            }
            _ => {}
        }
        let message = err.to_string();
        if is_check_violation(&message) {
            return Self::ConstraintViolation(message);
        }
        Self::Database(err)
    }
}

// SQLite: "CHECK constraint failed: ...", PostgreSQL: "violates check constraint".
fn is_check_violation(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("check constraint failed")
        || lower.contains("violates check constraint")
        || lower.contains("foreign key constraint failed")
}

impl From<bcrypt::BcryptError> for EngineError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::PasswordHash(value.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::InvalidSession, Self::InvalidSession) => true,
            (Self::SessionExpired, Self::SessionExpired) => true,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ConstraintViolation(a), Self::ConstraintViolation(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (
                Self::SchemaVersion {
                    expected: e1,
                    found: f1,
                },
                Self::SchemaVersion {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (Self::MissingSchemaVersion, Self::MissingSchemaVersion) => true,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::RuntimeErr;

    use super::*;

    #[test]
    fn check_failure_is_a_constraint_violation() {
        let err = DbErr::Exec(RuntimeErr::Internal(
            "CHECK constraint failed: quantity > 0".to_string(),
        ));
        assert!(matches!(
            EngineError::from_statement(err),
            EngineError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn postgres_check_failure_is_a_constraint_violation() {
        let err = DbErr::Exec(RuntimeErr::Internal(
            "new row for relation \"purchases\" violates check constraint \"purchases_price_check\""
                .to_string(),
        ));
        assert!(matches!(
            EngineError::from_statement(err),
            EngineError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn other_failures_stay_database_errors() {
        let err = DbErr::Conn(RuntimeErr::Internal("connection reset".to_string()));
        assert!(matches!(
            EngineError::from_statement(err),
            EngineError::Database(_)
        ));
    }
}

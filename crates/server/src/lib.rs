use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{
    ServerState, SessionToken, router, run, run_with_listener, spawn_with_listener,
};

mod account;
mod products;
mod purchases;
mod server;
mod tags;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidCredentials
        | EngineError::InvalidSession
        | EngineError::SessionExpired => StatusCode::UNAUTHORIZED,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ConstraintViolation(_) => StatusCode::CONFLICT,
        EngineError::InvalidAmount(_) | EngineError::InvalidName(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::SchemaVersion { .. }
        | EngineError::MissingSchemaVersion
        | EngineError::PasswordHash(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("password hashing error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_map_to_401() {
        for err in [
            EngineError::InvalidCredentials,
            EngineError::InvalidSession,
            EngineError::SessionExpired,
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("purchase 1".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_constraint_violation_maps_to_409() {
        let res = ServerError::from(EngineError::ConstraintViolation("x".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidName("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn schema_mismatch_maps_to_500() {
        let res = ServerError::from(EngineError::SchemaVersion {
            expected: 2,
            found: 1,
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

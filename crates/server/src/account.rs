//! Login, logout and password change.

use api_types::account::{Login, LoginResponse, PasswordChange};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::SessionInfo;

use crate::{ServerError, server::ServerState};

/// Exchange email and password for a session token
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<LoginResponse>, ServerError> {
    let session = state
        .engine
        .create_session(&payload.email, &payload.password)
        .await?;
    tracing::info!(account_id = session.account_id, "login");

    Ok(Json(LoginResponse {
        token: session.token,
        expiry_time: session.expiry_time,
    }))
}

pub async fn logout(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_session(session.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<StatusCode, ServerError> {
    if payload.new_password.is_empty() {
        return Err(ServerError::Generic("new password must not be empty".to_string()));
    }
    state
        .engine
        .change_password(
            session.account_id,
            &payload.old_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

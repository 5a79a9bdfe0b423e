//! Tag API endpoints

use api_types::tag::{TagList, TagView, TagsCreated, TagsNew};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{SessionInfo, Tag};

use crate::{ServerError, server::ServerState};

pub(crate) fn tag_view(tag: Tag) -> TagView {
    TagView {
        id: tag.id,
        name: tag.name,
    }
}

pub async fn list(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
) -> Result<Json<TagList>, ServerError> {
    let tags = state.engine.get_tags_by_account(session.account_id).await?;

    Ok(Json(TagList {
        tags: tags.into_iter().map(tag_view).collect(),
    }))
}

pub async fn create(
    Extension(session): Extension<SessionInfo>,
    State(state): State<ServerState>,
    Json(payload): Json<TagsNew>,
) -> Result<(StatusCode, Json<TagsCreated>), ServerError> {
    if payload.names.is_empty() {
        return Err(ServerError::Generic("at least one tag name is required".to_string()));
    }
    let ids = state
        .engine
        .insert_tags(session.account_id, &payload.names)
        .await?;

    Ok((StatusCode::CREATED, Json(TagsCreated { ids })))
}

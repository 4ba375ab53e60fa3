use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentAccount;
use super::validation::validate_avatar_id;
use super::{ApiError, ApiResponse, AppState, AvatarDto};
use crate::models::avatar::AvatarPatch;

/// GET /avatars
pub async fn list_avatars(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<Vec<AvatarDto>>>, ApiError> {
    let avatars = state.shared.avatars.list(current.0.id).await?;

    Ok(Json(ApiResponse::success(
        avatars.into_iter().map(AvatarDto::from).collect(),
    )))
}

/// GET /avatars/{id}
pub async fn get_avatar(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AvatarDto>>, ApiError> {
    let id = validate_avatar_id(id)?;
    let avatar = state.shared.avatars.get(&current.0, id).await?;
    Ok(Json(ApiResponse::success(avatar.into())))
}

/// PUT /avatars/{id}
/// Whole-field overwrite per provided section; last writer wins.
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
    Json(patch): Json<AvatarPatch>,
) -> Result<Json<ApiResponse<AvatarDto>>, ApiError> {
    let id = validate_avatar_id(id)?;
    let avatar = state.shared.avatars.update(&current.0, id, patch).await?;
    Ok(Json(ApiResponse::success(avatar.into())))
}

/// DELETE /avatars/{id}
/// Removes the avatar row only; ledger history is untouched.
pub async fn delete_avatar(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_avatar_id(id)?;
    state.shared.avatars.delete(&current.0, id).await?;
    Ok(Json(ApiResponse::success(())))
}

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentAccount;
use super::validation::{validate_avatar_id, validate_generation_input};
use super::{ApiError, ApiResponse, AppState, AvatarDto, GenerateRequest, ImageDto};
use crate::models::avatar::{SectionContent, SectionKind};

/// POST /generate
/// Runs the full generation pipeline; one credit per successful run.
pub async fn generate_avatar(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<AvatarDto>>, ApiError> {
    let (target_audience, help_description) =
        validate_generation_input(&payload.target_audience, &payload.help_description)?;

    let avatar = state
        .shared
        .generation
        .generate(&current.0, target_audience, help_description)
        .await?;

    Ok(Json(ApiResponse::success(avatar.into())))
}

/// POST /avatars/{id}/image
/// Regenerates the portrait for an existing avatar (no credit charge).
pub async fn regenerate_image(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ImageDto>>, ApiError> {
    let id = validate_avatar_id(id)?;

    let avatar = state
        .shared
        .generation
        .regenerate_image(&current.0, id)
        .await?;

    let image_url = avatar
        .image_url
        .ok_or_else(|| ApiError::internal("Image regeneration produced no URL"))?;

    Ok(Json(ApiResponse::success(ImageDto { image_url })))
}

/// POST /avatars/{id}/sections/{section}
/// Regenerates one narrative section; the client saves it via the avatar
/// update endpoint if it wants to keep the result.
pub async fn generate_section(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path((id, section)): Path<(i32, String)>,
) -> Result<Json<ApiResponse<SectionContent>>, ApiError> {
    let id = validate_avatar_id(id)?;

    let kind = SectionKind::parse(&section)
        .ok_or_else(|| ApiError::validation(format!("Unknown section: {section}")))?;

    let content = state
        .shared
        .generation
        .generate_section(&current.0, id, kind)
        .await?;

    Ok(Json(ApiResponse::success(content)))
}

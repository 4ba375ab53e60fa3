use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentAccount;
use super::validation::validate_account_id;
use super::{
    AccountDto, AdjustCreditsRequest, ApiError, ApiResponse, AppState, BulkCreateRequest,
    CreditLogDto, ToggleRequest,
};

/// GET /admin/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let accounts = state.shared.admin.list_accounts(&current.0).await?;

    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountDto::from).collect(),
    )))
}

/// PUT /admin/accounts/{id}/credits
pub async fn adjust_credits(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
    Json(payload): Json<AdjustCreditsRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_account_id(id)?;

    let account = state
        .shared
        .admin
        .adjust_credits(&current.0, id, payload.amount, payload.is_add)
        .await?;

    Ok(Json(ApiResponse::success(account.into())))
}

/// GET /admin/accounts/{id}/credits/history
pub async fn credit_history(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<CreditLogDto>>>, ApiError> {
    let id = validate_account_id(id)?;

    let entries = state.shared.admin.credit_history(&current.0, id).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(CreditLogDto::from).collect(),
    )))
}

/// PUT /admin/accounts/{id}/active
pub async fn set_active(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_account_id(id)?;

    let account = state
        .shared
        .admin
        .set_active(&current.0, id, payload.value)
        .await?;

    Ok(Json(ApiResponse::success(account.into())))
}

/// PUT /admin/accounts/{id}/authenticated
pub async fn set_authenticated(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_account_id(id)?;

    let account = state
        .shared
        .admin
        .set_authenticated(&current.0, id, payload.value)
        .await?;

    Ok(Json(ApiResponse::success(account.into())))
}

/// PUT /admin/accounts/{id}/admin
/// Restricted to the configured super-admin, enforced server-side.
pub async fn set_admin(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = validate_account_id(id)?;

    let account = state
        .shared
        .admin
        .set_admin(&current.0, id, payload.value)
        .await?;

    Ok(Json(ApiResponse::success(account.into())))
}

/// POST /admin/accounts/bulk
pub async fn bulk_create(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let default_credits = payload
        .default_credits
        .unwrap_or(state.shared.config.access.bulk_default_credits);

    let accounts = state
        .shared
        .admin
        .bulk_create(&current.0, &payload.emails, default_credits)
        .await?;

    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountDto::from).collect(),
    )))
}

/// POST /admin/accounts/import
/// Raw CSV body: one email per line.
pub async fn import_accounts(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    body: String,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let default_credits = state.shared.config.access.bulk_default_credits;

    let accounts = state
        .shared
        .admin
        .import_accounts_csv(&current.0, &body, default_credits)
        .await?;

    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountDto::from).collect(),
    )))
}

/// DELETE /admin/accounts/{id}
/// Cascades over avatars and ledger rows in one transaction.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_account_id(id)?;
    state.shared.admin.delete_account(&current.0, id).await?;
    Ok(Json(ApiResponse::success(())))
}

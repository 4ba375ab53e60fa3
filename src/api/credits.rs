use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentAccount;
use super::{ApiError, ApiResponse, AppState, BalanceDto, CreditLogDto};

/// GET /credits
/// Re-reads the balance so it reflects any charge applied earlier in the
/// session, not the value captured at provisioning.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<BalanceDto>>, ApiError> {
    let credits = state.shared.credits.balance(current.0.id).await?;
    Ok(Json(ApiResponse::success(BalanceDto { credits })))
}

/// GET /credits/history
/// The caller's own ledger, newest first, unbounded.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<Vec<CreditLogDto>>>, ApiError> {
    let entries = state.shared.credits.history(current.0.id).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(CreditLogDto::from).collect(),
    )))
}

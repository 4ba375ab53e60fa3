use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MeDto};
use crate::entities::users;
use crate::services::is_authorized;

/// The caller's account, resolved through the identity provider and
/// provisioned for this request. Inserted by [`identity_middleware`]; no
/// ambient singleton holds it.
#[derive(Clone)]
pub struct CurrentAccount(pub users::Model);

/// Resolves `Authorization: Bearer <token>` into an account:
/// 1. the identity provider vouches for the token,
/// 2. the matching account is provisioned (created on first contact),
/// 3. the account rides along in request extensions.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let identity = state
        .shared
        .identity
        .verify_token(&token)
        .await
        .map_err(|e| ApiError::identity_error(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

    let account = state
        .shared
        .provisioning
        .ensure_account(&identity.external_id, &identity.email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to provision account: {e}")))?;

    tracing::Span::current().record("user_id", account.id);

    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

/// Product gate: active + authenticated, or admin. Gated-off callers get the
/// "pending approval" refusal and never reach the product surface.
pub async fn gate_middleware(
    Extension(current): Extension<CurrentAccount>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_authorized(&current.0) {
        return Err(ApiError::Forbidden(
            "Account is pending approval".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// First of the two admin checks; the admin service re-checks at the
/// operation boundary.
pub async fn admin_middleware(
    Extension(current): Extension<CurrentAccount>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !current.0.is_admin {
        return Err(ApiError::Forbidden(
            "Administrator rights required".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// GET /me
/// The provisioned account plus the gate verdict.
pub async fn get_me(
    Extension(current): Extension<CurrentAccount>,
) -> Json<ApiResponse<MeDto>> {
    let authorized = is_authorized(&current.0);
    Json(ApiResponse::success(MeDto {
        account: current.0.into(),
        authorized,
    }))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use skillswap_auth::extract_bearer_token;
use skillswap_common::AppError;

use crate::extract::CurrentUser;
use crate::state::AppState;

// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or_else(|| {
        AppError::Authentication("Missing or invalid authorization header".to_string())
    })?;

    let user_id = state
        .jwt_service
        .extract_user_id(token)
        .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))?;

    if user.is_banned {
        return Err(AppError::Authorization("Your account has been banned".to_string()));
    }

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

// Must run after `auth_middleware`
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.is_admin)
        .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;

    if !is_admin {
        return Err(AppError::Authorization("Administrator access required".to_string()));
    }

    Ok(next.run(request).await)
}

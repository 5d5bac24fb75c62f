//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::validate_access_token;

/// Authenticated caller, inserted into request extensions by
/// [`auth_middleware`] and read in handlers with `Extension<AuthUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
}

/// Requires `Authorization: Bearer <token>` and resolves the caller.
///
/// # Errors
/// 401 Unauthorized when the header is missing or malformed, or the token
/// fails signature, expiry or subject checks.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })?;

    let claims = validate_access_token(token, &state.jwt_config.secret)?;
    let auth_user = AuthUser {
        user_id: claims.user_id()?,
    };
    tracing::debug!(user_id = auth_user.user_id, "Request authenticated");

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

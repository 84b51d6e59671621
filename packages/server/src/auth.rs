//! Bearer-token authentication for the endpoints that mutate case state.

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use crime_dashboard_crime_models::UserRole;
use crime_dashboard_database::accounts::UserRecord;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Role {role} may not {action}")]
    Forbidden { role: UserRole, action: &'static str },
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the request's session to its account.
///
/// # Errors
///
/// * [`ApiError::Unauthorized`] if the token is missing, unknown, or expired
/// * [`ApiError::Storage`] if the lookup fails
pub async fn authenticate(req: &HttpRequest, state: &AppState) -> Result<UserRecord, ApiError> {
    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    state
        .accounts
        .user_for_token(token)
        .await?
        .ok_or_else(|| AuthError::InvalidSession.into())
}

/// Like [`authenticate`], additionally requiring a role that may move FIRs
/// through their lifecycle.
///
/// # Errors
///
/// As [`authenticate`], plus [`ApiError::Forbidden`] for read-only roles.
pub async fn require_status_updater(
    req: &HttpRequest,
    state: &AppState,
) -> Result<UserRecord, ApiError> {
    let user = authenticate(req, state).await?;
    if !user.role.can_update_status() {
        log::warn!("{} ({}) tried to change a FIR status", user.email, user.role);
        return Err(AuthError::Forbidden {
            role: user.role,
            action: "change FIR status",
        }
        .into());
    }
    Ok(user)
}

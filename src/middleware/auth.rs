use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::{AppError, AuthError};
use crate::models::CurrentSession;
use crate::AppState;

/// Cookie carrying the access token for browser clients
pub const SESSION_COOKIE: &str = "fs_session";

/// Authentication middleware
/// Resolves the access token from the Authorization header or the session cookie
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Auth(AuthError::Unauthenticated))?;

    let identity = match state.gate.resolve(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            if matches!(e, AuthError::Unauthenticated) {
                state.workspaces.close_token(&token);
            }
            return Err(e.into());
        }
    };

    request.extensions_mut().insert(CurrentSession {
        identity,
        access_token: token,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

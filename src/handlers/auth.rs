use axum::{extract::State, response::IntoResponse, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::{ApiResponse, Result};
use crate::middleware::auth::SESSION_COOKIE;
use crate::models::{AuthMode, AuthRequest, AuthResponse, Credentials, CurrentSession, SignOutResponse};
use crate::services::auth::{AUTHENTICATED_ROUTE, ENTRY_ROUTE};
use crate::services::GateOutcome;
use crate::AppState;

/// Submit the login form in either mode
/// POST /api/v1/auth
pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<AuthRequest>,
) -> Result<impl IntoResponse> {
    respond(&state, jar, req.mode, &req.credentials).await
}

/// Sign in with email and password
/// POST /api/v1/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse> {
    respond(&state, jar, AuthMode::SignIn, &credentials).await
}

/// Register a new account
/// POST /api/v1/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse> {
    respond(&state, jar, AuthMode::SignUp, &credentials).await
}

async fn respond(
    state: &AppState,
    jar: CookieJar,
    mode: AuthMode,
    credentials: &Credentials,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>)> {
    match state.gate.submit(mode, credentials).await? {
        GateOutcome::Authenticated(session) => {
            let cookie = Cookie::build((SESSION_COOKIE, session.access_token.clone()))
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.config.session.cookie_secure)
                .path("/api/v1")
                .build();

            let response = AuthResponse::Authenticated {
                identity: session.identity,
                access_token: session.access_token,
                expires_in: session.expires_in,
                redirect_to: AUTHENTICATED_ROUTE.to_string(),
            };
            Ok((jar.add(cookie), Json(ApiResponse::success(response))))
        }
        GateOutcome::PendingConfirmation { notice } => {
            // No session yet: stay on the login screen, switched to the other form
            let response = AuthResponse::PendingConfirmation {
                notice,
                next_mode: mode.toggled(),
            };
            Ok((jar, Json(ApiResponse::success(response))))
        }
    }
}

/// Sign out and return to the entry point
/// POST /api/v1/auth/sign-out
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    jar: CookieJar,
) -> impl IntoResponse {
    // The local session ends even if the auth service could not be told
    let warning = state
        .gate
        .sign_out(&session)
        .await
        .err()
        .map(|e| e.to_string());
    state.workspaces.close(&session.identity.id);

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/api/v1"));
    let response = SignOutResponse {
        redirect_to: ENTRY_ROUTE.to_string(),
        warning,
    };
    (jar, Json(ApiResponse::success(response)))
}

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;

use crate::error::AuthError;
use crate::models::{AuthMode, Claims, Credentials, CurrentSession, Identity, Session};

/// Notice shown after a successful sign-up
pub const SIGN_UP_NOTICE: &str = "Sign-up successful! Check your email to confirm your account.";

/// Route a signed-in user is sent to
pub const AUTHENTICATED_ROUTE: &str = "/dashboard";

/// Route shown after signing out
pub const ENTRY_ROUTE: &str = "/";

/// External auth service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Register an account. Success never yields a usable session: the
    /// address has to be confirmed out of band first.
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Identity behind an access token
    async fn current_identity(&self, access_token: &str) -> Result<Identity, AuthError>;
}

/// Outcome of a login form submission
#[derive(Debug, Clone)]
pub enum GateOutcome {
    Authenticated(Session),
    PendingConfirmation { notice: String },
}

/// Session/identity gate: one auth call per submission, no retries, nothing stored locally
pub struct SessionGate {
    provider: Arc<dyn AuthProvider>,
    jwt_secret: Option<String>,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn AuthProvider>, jwt_secret: Option<String>) -> Self {
        Self {
            provider,
            jwt_secret,
        }
    }

    /// Submit the login form in its current mode
    pub async fn submit(&self, mode: AuthMode, credentials: &Credentials) -> Result<GateOutcome, AuthError> {
        match mode {
            AuthMode::SignIn => self.sign_in(credentials).await.map(GateOutcome::Authenticated),
            AuthMode::SignUp => {
                self.sign_up(credentials).await?;
                Ok(GateOutcome::PendingConfirmation {
                    notice: SIGN_UP_NOTICE.to_string(),
                })
            }
        }
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        validate_credentials(credentials)?;

        match self
            .provider
            .sign_in_with_password(credentials.email.trim(), &credentials.password)
            .await
        {
            Ok(session) => {
                tracing::info!(identity = %session.identity.id, "Signed in");
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(email = %credentials.email, "Sign-in failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<(), AuthError> {
        validate_credentials(credentials)?;

        self.provider
            .sign_up(credentials.email.trim(), &credentials.password)
            .await
            .map_err(|e| {
                tracing::warn!(email = %credentials.email, "Sign-up failed: {}", e);
                e
            })?;

        tracing::info!(email = %credentials.email, "Sign-up pending confirmation");
        Ok(())
    }

    pub async fn sign_out(&self, session: &CurrentSession) -> Result<(), AuthError> {
        self.provider
            .sign_out(&session.access_token)
            .await
            .map_err(|e| {
                tracing::warn!(identity = %session.identity.id, "Sign-out failed: {}", e);
                e
            })
    }

    /// Identity behind an access token: verified locally when a signing secret is
    /// configured, otherwise asked of the auth service
    pub async fn resolve(&self, access_token: &str) -> Result<Identity, AuthError> {
        match &self.jwt_secret {
            Some(secret) => validate_token(access_token, secret),
            None => self.provider.current_identity(access_token).await,
        }
    }
}

/// Validate a platform-issued HS256 access token
pub fn validate_token(token: &str, secret: &str) -> Result<Identity, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    // Platform tokens carry an audience we don't pin
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| {
            tracing::debug!("Rejected access token: {}", e);
            AuthError::Unauthenticated
        })?;

    Ok(Identity {
        id: data.claims.sub,
        email: data.claims.email,
    })
}

fn validate_credentials(credentials: &Credentials) -> Result<(), AuthError> {
    let email = credentials.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidInput("Invalid email format".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(AuthError::InvalidInput("Password is required".to_string()));
    }
    Ok(())
}

use serde::{Deserialize, Serialize};

/// Authenticated user reference as issued by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// Signed-in session returned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Session attached to a request by the auth middleware
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub identity: Identity,
    pub access_token: String,
}

impl From<&Session> for CurrentSession {
    fn from(session: &Session) -> Self {
        Self {
            identity: session.identity.clone(),
            access_token: session.access_token.clone(),
        }
    }
}

/// Which form the login screen is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign in",
            AuthMode::SignUp => "Sign up",
        }
    }
}

/// Email and password as typed into the login form
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login form submission carrying its mode
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// Result of a login form submission
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthResponse {
    Authenticated {
        identity: Identity,
        access_token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_in: Option<u64>,
        redirect_to: String,
    },
    PendingConfirmation {
        notice: String,
        /// Form to show next, so the user can sign in once confirmed
        next_mode: AuthMode,
    },
}

/// Sign-out response
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Claims of a platform-issued access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub exp: usize,
}

//! Authentication request and response bodies

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::Credential;

// ============================================================================
// Request Models
// ============================================================================

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username_or_email", &self.username_or_email)
            .field("password", &"****")
            .finish()
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

impl fmt::Debug for RefreshTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenRequest")
            .field("refresh_token", &"****")
            .finish()
    }
}

// ============================================================================
// Response Models
// ============================================================================

/// Token pair returned by login and refresh
///
/// Consumed immediately to populate the credential store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    pub fn credential(&self) -> Credential {
        Credential::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"****")
            .field("refresh_token", &"****")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Account details from `/auth/register` and `/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    /// Server timestamp, passed through verbatim
    pub created_at: String,
}

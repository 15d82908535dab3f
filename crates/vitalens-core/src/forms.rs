//! Login and registration form validation
//!
//! Forms are checked before any network call. The first failing rule wins and
//! its message is returned as [`Error::Validation`].

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{LoginRequest, RegisterRequest};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Z0-9a-z._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$")
            .expect("email pattern is valid")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

fn check_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::validation("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

// ============================================================================
// Login
// ============================================================================

#[derive(Clone, Default)]
pub struct LoginForm {
    pub username_or_email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }

    /// Validate and build the request body; the identifier is trimmed
    pub fn validate(&self) -> Result<LoginRequest> {
        let username_or_email = self.username_or_email.trim();
        if username_or_email.is_empty() {
            return Err(Error::validation("Username or email is required"));
        }
        check_password(&self.password)?;

        Ok(LoginRequest {
            username_or_email: username_or_email.to_string(),
            password: self.password.clone(),
        })
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username_or_email", &self.username_or_email)
            .field("password", &"****")
            .finish()
    }
}

// ============================================================================
// Register
// ============================================================================

#[derive(Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Validate and build the request body
    ///
    /// The email is trimmed and lowercased, the username trimmed.
    pub fn validate(&self) -> Result<RegisterRequest> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(Error::validation("Email is required"));
        }
        if !is_valid_email(email) {
            return Err(Error::validation("Please enter a valid email address"));
        }

        let username = self.username.trim();
        if username.is_empty() {
            return Err(Error::validation("Username is required"));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(Error::validation(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }

        check_password(&self.password)?;

        if self.confirm_password.is_empty() {
            return Err(Error::validation("Please confirm your password"));
        }
        if self.password != self.confirm_password {
            return Err(Error::validation("Passwords do not match"));
        }

        Ok(RegisterRequest {
            email: email.to_lowercase(),
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

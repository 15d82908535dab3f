//! Auth commands
//!
//! Commands for signing in and out: login, register, logout, status, me,
//! refresh.

use std::io::{BufRead, IsTerminal, Write};

use anyhow::{Context as _, Result};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use vitalens_core::{LoginForm, RegisterForm, UserProfile};

use super::Context;
use crate::output::{print_single, print_success};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and store the tokens
    Login {
        /// Username or email
        #[arg(short, long)]
        username: String,

        /// Password; read from stdin when omitted (pipe it, input is not hidden)
        #[arg(short, long, env = "VITALENS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Username (at least 3 characters)
        #[arg(short, long)]
        username: String,

        /// Password; read from stdin when omitted (pipe it, input is not hidden)
        #[arg(short, long, env = "VITALENS_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Password confirmation; read from stdin when omitted
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Log out on the server and erase stored tokens
    Logout,

    /// Show whether a session is stored
    Status,

    /// Show the logged-in account
    Me,

    /// Exchange the refresh token for a new token pair
    Refresh,
}

/// Session status row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct StatusRow {
    #[tabled(rename = "Authenticated")]
    pub authenticated: bool,
    #[tabled(rename = "Store")]
    pub store: String,
    #[tabled(rename = "API URL")]
    pub api_url: String,
}

/// Account row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Active")]
    pub is_active: bool,
    #[tabled(rename = "Member Since")]
    pub created_at: String,
}

impl From<UserProfile> for UserRow {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at.chars().take(10).collect(),
        }
    }
}

pub async fn execute(ctx: &Context, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { username, password } => login(ctx, username, password).await,
        AuthAction::Register {
            email,
            username,
            password,
            confirm_password,
        } => register(ctx, email, username, password, confirm_password).await,
        AuthAction::Logout => logout(ctx).await,
        AuthAction::Status => status(ctx),
        AuthAction::Me => me(ctx).await,
        AuthAction::Refresh => refresh(ctx).await,
    }
}

async fn login(ctx: &Context, username: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_secret("Password")?,
    };

    let form = LoginForm::new(username, password);
    ctx.services.session.login(&form).await?;
    print_success("Logged in", ctx.quiet);
    Ok(())
}

async fn register(
    ctx: &Context,
    email: String,
    username: String,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_secret("Password")?,
    };
    let confirm_password = match confirm_password {
        Some(p) => p,
        None => prompt_secret("Confirm password")?,
    };

    let form = RegisterForm::new(email, username, password, confirm_password);
    let user = ctx.services.session.register(&form).await?;
    print_success(
        &format!("Registered {} and logged in", user.username),
        ctx.quiet,
    );
    Ok(())
}

async fn logout(ctx: &Context) -> Result<()> {
    ctx.services.session.logout().await?;
    print_success("Logged out", ctx.quiet);
    Ok(())
}

fn status(ctx: &Context) -> Result<()> {
    let session = &ctx.services.session;
    let row = StatusRow {
        authenticated: session.check_authentication_status(),
        store: session.store().backend_name().to_string(),
        api_url: ctx.config.base_url.clone(),
    };
    print_single(&row, ctx.format)
}

async fn me(ctx: &Context) -> Result<()> {
    let user = ctx.services.session.current_user().await?;
    print_single(&UserRow::from(user), ctx.format)
}

async fn refresh(ctx: &Context) -> Result<()> {
    ctx.services.session.refresh().await?;
    print_success("Access token refreshed", ctx.quiet);
    Ok(())
}

/// Read one line from stdin after printing `label` to stderr
///
/// Input is not masked. Scripts should pipe the secret or set
/// `VITALENS_PASSWORD`; an interactive terminal gets a warning first.
fn prompt_secret(label: &str) -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Input will be visible; set VITALENS_PASSWORD or pipe it to hide it.");
    }
    eprint!("{}: ", label);
    std::io::stderr().flush()?;

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

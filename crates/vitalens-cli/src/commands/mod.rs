//! CLI commands module
//!
//! Contains all CLI command implementations.

pub mod auth;
pub mod config;
pub mod meal;
pub mod nutrition;

use crate::output::OutputFormat;
use vitalens_core::{AppServices, ClientConfig};

/// Shared context for commands that talk to the backend
pub struct Context {
    pub services: AppServices,
    pub config: ClientConfig,
    pub format: OutputFormat,
    pub quiet: bool,
}

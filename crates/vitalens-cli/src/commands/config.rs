//! Config commands
//!
//! Commands for inspecting the effective CLI configuration.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use vitalens_core::config::{ENV_API_URL, ENV_STORE, ENV_TIMEOUT_SECS};
use vitalens_core::{ClientConfig, StoreBackend};

use crate::output::{print_output, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}

/// Config row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

pub fn execute(config: &ClientConfig, format: OutputFormat, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(config, format),
    }
}

fn show_config(config: &ClientConfig, format: OutputFormat) -> Result<()> {
    let rows = config_rows(config, |key| std::env::var(key).ok());
    print_output(&rows, format)
}

/// Where a value came from: env var, command-line flag or built-in default
fn source(value: &str, default: &str, env_value: Option<String>) -> String {
    match env_value {
        Some(v) if v.trim() == value => "env".to_string(),
        _ if value == default => "default".to_string(),
        _ => "flag".to_string(),
    }
}

fn config_rows<F>(config: &ClientConfig, lookup: F) -> Vec<ConfigRow>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ClientConfig::default();
    let timeout = config.request_timeout.as_secs().to_string();
    let store = config.store_backend.to_string();

    vec![
        ConfigRow {
            key: "api_url".to_string(),
            value: config.base_url.clone(),
            source: source(&config.base_url, &defaults.base_url, lookup(ENV_API_URL)),
        },
        ConfigRow {
            key: "timeout_secs".to_string(),
            source: source(
                &timeout,
                &defaults.request_timeout.as_secs().to_string(),
                lookup(ENV_TIMEOUT_SECS),
            ),
            value: timeout,
        },
        ConfigRow {
            key: "store".to_string(),
            source: source(
                &store,
                &defaults.store_backend.to_string(),
                lookup(ENV_STORE)
                    .and_then(|v| v.parse::<StoreBackend>().ok())
                    .map(|b| b.to_string()),
            ),
            value: store,
        },
        ConfigRow {
            key: "credential_service".to_string(),
            value: config.credential_service.clone(),
            source: "default".to_string(),
        },
    ]
}

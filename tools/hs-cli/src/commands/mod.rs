//! CLI command implementations.

pub mod config;
pub mod fragment;
pub mod key;
pub mod query;

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};
use hs_data::{Endpoint, QueryParams};

/// Endpoint and parameters shared by `query` and `key`.
#[derive(Args)]
pub struct RequestArgs {
    /// Query name (e.g. `list_decks_by_win_rate`) or absolute path.
    pub endpoint: String,

    /// Query parameter as `key=value` (repeatable).
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Query parameters as a flat JSON object; `-p` values take precedence.
    #[arg(long, value_name = "JSON")]
    pub params_json: Option<String>,
}

impl RequestArgs {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::from(self.endpoint.as_str())
    }

    pub fn params(&self) -> Result<QueryParams> {
        let mut params = match &self.params_json {
            Some(raw) => {
                let value: serde_json::Value =
                    serde_json::from_str(raw).context("Invalid --params-json")?;
                QueryParams::from_json(&value)?
            }
            None => QueryParams::new(),
        };
        for pair in &self.params {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("Invalid parameter '{}': expected KEY=VALUE", pair);
            };
            params.insert(key, value);
        }
        Ok(params)
    }
}

/// Arguments for the query command.
#[derive(Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Origin to resolve paths against (e.g. https://hsreplay.net).
    #[arg(long)]
    pub origin: Option<String>,

    /// Override the number of retries while the query is processing.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Override the delay between retries, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Only print the load status, not the payload.
    #[arg(long)]
    pub status_only: bool,
}

/// Arguments for the key command.
#[derive(Args)]
pub struct KeyArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the fragment command.
#[derive(Args)]
pub struct FragmentArgs {
    #[command(subcommand)]
    pub command: FragmentCommand,
}

#[derive(Subcommand)]
pub enum FragmentCommand {
    /// Build the URL for a set of field values
    Encode {
        /// Schema file (TOML or JSON) declaring the fields.
        #[arg(short, long)]
        schema: String,

        /// Current URL whose fragment is updated.
        #[arg(long, default_value = "")]
        url: String,

        /// Field value as `key=value` (repeatable).
        #[arg(value_name = "KEY=VALUE")]
        values: Vec<String>,
    },

    /// Show the field values a URL or fragment carries
    Decode {
        /// Schema file (TOML or JSON) declaring the fields.
        #[arg(short, long)]
        schema: String,

        /// URL or bare fragment (e.g. `#sortBy=winrate&page=3`).
        input: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Check the configuration for invalid values
    Validate,
}

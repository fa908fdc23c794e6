//! Configuration commands.

use anyhow::{Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;
use crate::output::format_millis;

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show(ctx),
        Some(ConfigCommand::Validate) => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    if ctx.output.is_json() {
        ctx.output.json(config);
        return Ok(());
    }

    ctx.output.header("Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "defaults"),
    }
    ctx.output.kv("analytics_base", &config.analytics_base);
    ctx.output
        .kv("origin", config.origin.as_deref().unwrap_or("(none)"));
    ctx.output
        .kv("retry.max_retries", &config.retry.max_retries.to_string());
    ctx.output
        .kv("retry.delay", &format_millis(config.retry.delay_ms));
    ctx.output
        .kv("fragments.debounce", &format_millis(config.fragments.debounce_ms));
    ctx.output.kv(
        "fragments.keep_defaults",
        &config.fragments.keep_defaults.to_string(),
    );
    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    ctx.config.validate().context("Invalid configuration")?;
    ctx.output.success("Configuration is valid");
    Ok(())
}

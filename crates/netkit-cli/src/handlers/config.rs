//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigShowArgs};
use crate::config::Config;
use crate::error::Result;
use crate::logging::redaction;
use crate::output::OutputWriter;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Validate => handle_config_validate(config, output),
    }
}

/// Print the effective configuration with sensitive values masked
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let mut value = serde_json::to_value(config)?;
    redaction::redact_json_value(&mut value);

    output.section("Effective Configuration")?;
    let rendered = match args.format {
        ConfigFormat::Json => serde_json::to_string_pretty(&value)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&value)?,
    };
    output.writeln(rendered.trim_end())
}

fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    config.validate()?;
    output.success("✓ Configuration is valid")?;
    match &config.network.base_url {
        Some(base_url) => output.info(&format!("Base URL: {}", base_url))?,
        None => output.warning("No base_url configured; only absolute URLs can be called")?,
    }
    Ok(())
}

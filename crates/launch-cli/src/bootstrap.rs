use std::path::Path;

use anyhow::{Context, Result};
use launch_provisioner::ProvisionerSettings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Loads settings from `path`, or the built-in defaults when no file is given.
pub(crate) fn load_settings(path: Option<&Path>) -> Result<ProvisionerSettings> {
    let Some(path) = path else {
        return Ok(ProvisionerSettings::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    ProvisionerSettings::from_toml_str(&raw)
        .with_context(|| format!("invalid settings file {}", path.display()))
}

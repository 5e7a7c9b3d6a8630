mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./file-manager.toml",
        "~/.config/file-manager/config.toml",
        "/etc/file-manager/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Apply command-line / environment overrides on top of a loaded config,
/// then re-validate the result.
pub fn apply_overrides(mut config: Config, overrides: Overrides) -> Result<Config> {
    if let Some(host) = overrides.host {
        config.server.host = host;
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(path) = overrides.resources_path {
        config.storage.resources_path = path;
    }
    if let Some(host) = overrides.crud_host {
        config.crud.host = host;
    }
    if let Some(port) = overrides.crud_port {
        config.crud.port = port;
    }

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn expand_paths(config: &mut Config) {
    let raw = config.storage.resources_path.to_string_lossy().into_owned();
    config.storage.resources_path = PathBuf::from(shellexpand::tilde(&raw).as_ref());
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.crud.host.trim().is_empty() {
        anyhow::bail!("Metadata service host cannot be empty");
    }

    if config.crud.port == 0 {
        anyhow::bail!("Metadata service port cannot be 0");
    }

    let root = &config.storage.resources_path;
    if !root.exists() {
        tracing::warn!("Resources path does not exist: {:?}", root);
    } else if !root.join("default").join("default.png").exists() {
        tracing::warn!("Default image missing under resources path: {:?}", root);
    }

    Ok(())
}

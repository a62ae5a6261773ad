//! Configuration loading.
//!
//! Order of precedence, lowest to highest: schema defaults, the TOML file
//! named by `GATEWAY_CONFIG` (if set), upstream URL environment variables.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the environment, and validate the configuration.
pub fn load() -> Result<GatewayConfig, ConfigError> {
    let mut config = match env::var("GATEWAY_CONFIG") {
        Ok(path) => load_file(Path::new(&path))?,
        Err(_) => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from a TOML file without environment overrides.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Apply the deployment's environment variable convention.
///
/// `GAME_SERVICE1_URL`, `GAME_SERVICE2_URL`, ... replace pool entries by
/// position. Each slot is read independently, so setting only
/// `GAME_SERVICE2_URL` overrides the second entry and leaves the rest at
/// their defaults. Variables beyond the configured pool append, stopping
/// at the first unset one. `LOBBY_SERVICE_URL` replaces the lobby target.
fn apply_env_overrides(config: &mut GatewayConfig) {
    for slot in 0..config.upstream.game_instances.len() {
        if let Ok(url) = env::var(format!("GAME_SERVICE{}_URL", slot + 1)) {
            config.upstream.game_instances[slot] = url;
        }
    }

    for n in config.upstream.game_instances.len() + 1.. {
        let Ok(url) = env::var(format!("GAME_SERVICE{n}_URL")) else {
            break;
        };
        config.upstream.game_instances.push(url);
    }

    if let Ok(url) = env::var("LOBBY_SERVICE_URL") {
        config.upstream.lobby_url = url;
    }
}

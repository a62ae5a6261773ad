//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Returns all validation
//! errors, not just the first, so a broken deployment can be fixed in one
//! pass.

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic configuration error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("game instance pool is empty")]
    EmptyPool,

    #[error("invalid game instance URL {url:?}: {source}")]
    InvalidGameUrl { url: String, source: url::ParseError },

    #[error("invalid lobby URL {url:?}: {source}")]
    InvalidLobbyUrl { url: String, source: url::ParseError },

    #[error("unsupported scheme {scheme:?} for {url:?} (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("duplicate game instance URL {url:?}")]
    DuplicateInstance { url: String },

    #[error("{field} must be at least 1")]
    ZeroBound { field: &'static str },
}

/// Validate the configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.game_instances.is_empty() {
        errors.push(ValidationError::EmptyPool);
    }

    let mut seen = Vec::new();
    for url in &config.upstream.game_instances {
        match Url::parse(url) {
            Ok(parsed) => {
                check_scheme(url, &parsed, &mut errors);
                if seen.contains(url) {
                    errors.push(ValidationError::DuplicateInstance { url: url.clone() });
                }
                seen.push(url.clone());
            }
            Err(source) => errors.push(ValidationError::InvalidGameUrl {
                url: url.clone(),
                source,
            }),
        }
    }

    match Url::parse(&config.upstream.lobby_url) {
        Ok(parsed) => check_scheme(&config.upstream.lobby_url, &parsed, &mut errors),
        Err(source) => errors.push(ValidationError::InvalidLobbyUrl {
            url: config.upstream.lobby_url.clone(),
            source,
        }),
    }

    for (value, field) in [
        (config.breaker.instance_fail_max as usize, "breaker.instance_fail_max"),
        (config.breaker.global_fail_max as usize, "breaker.global_fail_max"),
        (config.retry.max_retries as usize, "retry.max_retries"),
        (config.retry.max_reroutes, "retry.max_reroutes"),
        (config.timeouts.forward_secs as usize, "timeouts.forward_secs"),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroBound { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_scheme(raw: &str, parsed: &Url, errors: &mut Vec<ValidationError>) {
    if !matches!(parsed.scheme(), "http" | "https") {
        errors.push(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: parsed.scheme().to_string(),
        });
    }
}

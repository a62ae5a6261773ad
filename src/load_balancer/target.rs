//! Game-service target abstraction.
//!
//! # Responsibilities
//! - Represent one backend instance by its base URL
//! - Own that instance's circuit breaker
//! - Build absolute request URLs from a relative path + query

use std::time::Duration;

use url::Url;

use crate::resilience::CircuitBreaker;

/// One backend instance. Immutable for the process lifetime apart from its
/// breaker's interior state.
#[derive(Debug)]
pub struct Target {
    /// Logical name used in logs and error messages (the base URL string).
    pub name: String,

    /// Base URL, normalized to end with a trailing slash.
    pub base_url: Url,

    /// This instance's circuit breaker.
    pub breaker: CircuitBreaker,
}

impl Target {
    /// Build a target from a configured base URL and breaker settings.
    pub fn from_config(
        base_url: &str,
        fail_max: u32,
        open_duration: Duration,
    ) -> Result<Self, url::ParseError> {
        let mut url = Url::parse(base_url)?;
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        let name = base_url.to_string();
        let breaker = CircuitBreaker::new(format!("cb_{name}"), fail_max, open_duration);
        Ok(Self {
            name,
            base_url: url,
            breaker,
        })
    }

    /// Absolute URL for a proxied request.
    ///
    /// `path_and_query` arrives without a leading slash (the route prefix is
    /// already stripped) and is appended to the base URL verbatim.
    pub fn request_url(&self, path_and_query: &str) -> String {
        format!(
            "{}{}",
            self.base_url,
            path_and_query.trim_start_matches('/')
        )
    }
}

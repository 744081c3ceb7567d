//! Base URL configuration, resolved once per process.

use std::sync::OnceLock;

use thiserror::Error;

/// Environment variable naming the API base URL.
pub const BASE_URL_VAR: &str = "PHOTOS_API_BASE_URL";

static GLOBAL: OnceLock<Config> = OnceLock::new();

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable 'PHOTOS_API_BASE_URL' is not set")]
    MissingBaseUrl,

    #[error("environment variable 'PHOTOS_API_BASE_URL' is empty")]
    EmptyBaseUrl,
}

/// Resolved client configuration. Read-only once installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    base_url: String,
}

impl Config {
    pub fn new<S>(base_url: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads the configuration from the environment, loading a `.env` file
    /// first when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        match std::env::var(BASE_URL_VAR) {
            Ok(value) if value.is_empty() => Err(ConfigError::EmptyBaseUrl),
            Ok(value) => Ok(Self { base_url: value }),
            Err(_) => Err(ConfigError::MissingBaseUrl),
        }
    }

    /// The base URL every request target is concatenated onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Installs the process-wide configuration. Call once during startup; later
/// calls keep the first value.
pub fn init(config: Config) {
    if GLOBAL.set(config).is_err() {
        log::warn!("api configuration already initialised, keeping the first value");
    }
}

/// Resolves the configuration from the environment and installs it, unless
/// one is already in place.
pub fn init_from_env() -> Result<&'static Config, ConfigError> {
    if GLOBAL.get().is_none() {
        init(Config::from_env()?);
    }

    Ok(global())
}

/// The process-wide configuration.
///
/// # Panics
///
/// Panics when [`init`] was never called. A missing configuration is a
/// deployment defect, not a runtime condition, so aborting is deliberate.
pub fn global() -> &'static Config {
    GLOBAL
        .get()
        .expect("api configuration missing, call config::init during startup")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_requires_the_variable() {
        std::env::remove_var(BASE_URL_VAR);
        assert_eq!(Config::from_env(), Err(ConfigError::MissingBaseUrl));

        std::env::set_var(BASE_URL_VAR, "");
        assert_eq!(Config::from_env(), Err(ConfigError::EmptyBaseUrl));

        std::env::set_var(BASE_URL_VAR, "https://photos.test/api");
        assert_eq!(
            Config::from_env(),
            Ok(Config::new("https://photos.test/api"))
        );
        std::env::remove_var(BASE_URL_VAR);
    }

    #[test]
    fn first_init_wins() {
        init(Config::new("https://photos.test/api"));
        init(Config::new("https://elsewhere.test"));

        assert_eq!(global().base_url(), "https://photos.test/api");
    }
}

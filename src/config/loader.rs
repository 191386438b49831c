//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, StorageDriver};
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ConfigIssue>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value {:?} for environment variable {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
///
/// `env` is the variable lookup, normally `|k| std::env::var(k).ok()`.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment environment variables on top of `config`.
///
/// Recognized: `DB_DRIVER`, `DB_PATH`, `DB_HOST`, `DB_PORT`, `DB_NAME`,
/// `DB_USER`, `DB_PASS`, `ADMIN_EMAIL`, `APP_CSRF_ENABLED`, `BIND_ADDRESS`.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(driver) = env("DB_DRIVER") {
        config.storage.driver = StorageDriver::from_name(&driver).ok_or(ConfigError::Env {
            var: "DB_DRIVER",
            value: driver,
        })?;
    }
    if let Some(path) = env("DB_PATH") {
        config.storage.sqlite_path = path;
    }
    if let Some(host) = env("DB_HOST") {
        config.storage.host = host;
    }
    if let Some(port) = env("DB_PORT") {
        config.storage.port = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "DB_PORT",
            value: port.clone(),
        })?;
    }
    if let Some(name) = env("DB_NAME") {
        config.storage.database = name;
    }
    if let Some(user) = env("DB_USER") {
        config.storage.user = user;
    }
    if let Some(pass) = env("DB_PASS") {
        config.storage.password = pass;
    }
    if let Some(admin) = env("ADMIN_EMAIL").filter(|v| !v.trim().is_empty()) {
        config.notifications.admin_email = admin.trim().to_string();
    }
    if let Some(flag) = env("APP_CSRF_ENABLED") {
        // Only the literal "1" turns it on.
        config.security.csrf_enabled = flag.trim() == "1";
    }
    if let Some(bind) = env("BIND_ADDRESS") {
        config.listener.bind_address = bind;
    }
    Ok(())
}

//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RiddlePayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `network.contract_address`.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "RIDDLEPAY_CONTRACT_ADDRESS";
/// Environment variable overriding `network.primary_rpc_url`.
pub const PRIMARY_RPC_ENV_VAR: &str = "RIDDLEPAY_PRIMARY_RPC_URL";
/// Environment variable overriding `network.fallback_rpc_url`.
pub const FALLBACK_RPC_ENV_VAR: &str = "RIDDLEPAY_FALLBACK_RPC_URL";
/// Environment variable overriding `network.token_address`.
pub const TOKEN_ADDRESS_ENV_VAR: &str = "RIDDLEPAY_TOKEN_ADDRESS";
/// Environment variable overriding `network.notification_api_key`.
pub const NOTIFICATION_KEY_ENV_VAR: &str = "RIDDLEPAY_NOTIFICATION_API_KEY";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<RiddlePayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            parse_config(&content)?
        }
        None => RiddlePayConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        contract = %config.network.contract_address,
        chain_id = config.network.chain_id,
        has_primary = config.network.primary_rpc_url.is_some(),
        "Configuration loaded"
    );

    Ok(config)
}

/// Parse configuration text without touching the environment.
pub fn parse_config(content: &str) -> Result<RiddlePayConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Apply overrides from a key lookup. Empty values are ignored.
pub fn apply_overrides<F>(config: &mut RiddlePayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let network = &mut config.network;

    if let Some(v) = get(CONTRACT_ADDRESS_ENV_VAR) {
        network.contract_address = v;
    }
    if let Some(v) = get(PRIMARY_RPC_ENV_VAR) {
        network.primary_rpc_url = Some(v);
    }
    if let Some(v) = get(FALLBACK_RPC_ENV_VAR) {
        network.fallback_rpc_url = Some(v);
    }
    if let Some(v) = get(TOKEN_ADDRESS_ENV_VAR) {
        network.token_address = v;
    }
    if let Some(v) = get(NOTIFICATION_KEY_ENV_VAR) {
        network.notification_api_key = Some(v);
    }
}

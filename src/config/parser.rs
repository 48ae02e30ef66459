use crate::config::types::PartialConfig;
use crate::{ConfigError, DefaultsError};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Location of the defaults file shipped with the crate
pub const DEFAULTS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/etc/defaults.toml");

/// Loads and parses a user configuration file from the given path
///
/// The file is a JSON object with any of the [`PartialConfig`] fields.
/// Dates and the other fields are validated later, when the crawler is
/// constructed and when defaults are merged in.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use datecrawl::config::load_config;
///
/// let config = load_config(Path::new("crawl.json")).unwrap();
/// println!("start: {:?}", config.start);
/// ```
pub fn load_config(path: &Path) -> Result<PartialConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: PartialConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(PartialConfig, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads the named defaults file (TOML) without blocking the runtime
pub async fn load_defaults(path: &Path) -> Result<PartialConfig, DefaultsError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DefaultsError::Read {
            path: path.display().to_string(),
            source,
        })?;

    toml::from_str(&contents).map_err(|source| DefaultsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

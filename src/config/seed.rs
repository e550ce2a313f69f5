//! Seed configuration loading from `config.toml`.
//!
//! The seed file describes the initial art-type catalog, the initial accounts and
//! optional system settings. Seeding only fills empty tables, so editing the file
//! after the first run has no effect on existing data.

use crate::entities::Role;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::env::VarError;
use std::path::Path;

/// Environment variable naming the seed file
pub const CONFIG_PATH_VAR: &str = "POINTBOARD_CONFIG";

/// Configuration structure representing the entire seed file
#[derive(Debug, Deserialize, Default)]
pub struct SeedConfig {
    /// Catalog entries, in display order
    #[serde(default)]
    pub art_types: Vec<ArtTypeSeed>,
    /// Initial accounts
    #[serde(default)]
    pub users: Vec<UserSeed>,
    /// Initial system settings
    #[serde(default)]
    pub settings: Option<SettingsSeed>,
}

/// Configuration for a single catalog entry
#[derive(Debug, Deserialize, Clone)]
pub struct ArtTypeSeed {
    /// Catalog label
    pub label: String,
    /// Points per unit
    pub points: i64,
}

/// Configuration for a single account
#[derive(Debug, Deserialize, Clone)]
pub struct UserSeed {
    /// Display name
    pub name: String,
    /// `"ADM"` or `"DESIGNER"`
    pub role: Role,
}

/// Initial values for the settings singleton
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsSeed {
    pub brand_title: Option<String>,
    pub logo_url: Option<String>,
    pub login_subtitle: Option<String>,
    pub variation_points: Option<i64>,
}

/// Loads the seed configuration from a TOML file.
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read, the TOML syntax is
/// invalid, or a required field is missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load seed configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses seed configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<SeedConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed config: {e}"),
    })
}

/// Loads the seed file named by `POINTBOARD_CONFIG`, or `./config.toml`.
///
/// A missing default file is not an error and yields an empty configuration.
///
/// # Errors
/// Returns `Error::EnvVar` if `POINTBOARD_CONFIG` is set but not valid Unicode,
/// or `Error::Config` if the chosen file cannot be read or parsed.
pub fn load_default_config() -> Result<SeedConfig> {
    match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => load_config(path),
        Err(e @ VarError::NotUnicode(_)) => Err(e.into()),
        Err(VarError::NotPresent) if Path::new("config.toml").exists() => {
            load_config("config.toml")
        }
        Err(VarError::NotPresent) => {
            tracing::info!("No seed configuration found, starting with empty tables");
            Ok(SeedConfig::default())
        }
    }
}

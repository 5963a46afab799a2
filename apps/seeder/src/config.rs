use std::path::{Path, PathBuf};

use crate::errors::SeedError;

pub const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";

/// Seeder configuration loaded from environment variables.
/// Fails before any I/O if the credential path is missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute path to the service-account JSON key.
    pub credentials_path: PathBuf,
    /// `host:port` of a local Firestore emulator, if one is in use.
    pub emulator_host: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, SeedError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_path = require_var(&lookup, CREDENTIALS_VAR)?;

        Ok(Config {
            credentials_path: absolutize(Path::new(&raw_path))?,
            emulator_host: optional_var(&lookup, EMULATOR_HOST_VAR),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_var<F>(lookup: &F, key: &str) -> Result<String, SeedError>
where
    F: Fn(&str) -> Option<String>,
{
    optional_var(lookup, key).ok_or_else(|| {
        SeedError::Configuration(format!(
            "Set {key} to the path of your Firebase service account JSON file"
        ))
    })
}

fn optional_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn absolutize(path: &Path) -> Result<PathBuf, SeedError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| {
        SeedError::Configuration(format!("Cannot resolve working directory: {e}"))
    })?;
    Ok(cwd.join(path))
}

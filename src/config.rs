//! Startup settings.
//!
//! Values come from an optional `appsettings.json` in the working directory,
//! then from environment variables (which win per key). The API key finally
//! falls back to `OPENAI_API_KEY`.

use crate::providers::openai::MODEL_GPT4O_MINI;
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "appsettings.json";

pub const ENV_API_KEY: &str = "OpenAI__ApiKey";
pub const ENV_MODEL_ID: &str = "OpenAI__ModelId";
pub const ENV_OPENAI_BASE_URL: &str = "OpenAI__BaseUrl";
pub const ENV_REGISTRY_BASE_URL: &str = "Registry__BaseUrl";
pub const ENV_API_KEY_FALLBACK: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "OpenAI API key not found. Copy appsettings.template.json to appsettings.json and add your key, or set OPENAI_API_KEY environment variable."
    )]
    MissingApiKey,

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolved settings for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub model_id: String,
    /// Alternative OpenAI-compatible endpoint.
    pub openai_base_url: Option<String>,
    /// Mirror of the parish registry.
    pub registry_base_url: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"[REDACTED]")
            .field("model_id", &self.model_id)
            .field("openai_base_url", &self.openai_base_url)
            .field("registry_base_url", &self.registry_base_url)
            .finish()
    }
}

/// Shape of `appsettings.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsFile {
    #[serde(default, rename = "OpenAI")]
    openai: OpenAISection,
    #[serde(default)]
    registry: RegistrySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OpenAISection {
    api_key: Option<String>,
    model_id: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegistrySection {
    base_url: Option<String>,
}

impl Settings {
    /// Load from `appsettings.json` in the current directory and the process
    /// environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or if no API key is configured anywhere.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
    }

    /// Load from `path` (optional) and a custom environment lookup.
    ///
    /// # Errors
    /// See [`Settings::load`].
    pub fn load_from<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = read_settings_file(path)?;
        Self::resolve(file, env)
    }

    fn resolve<F>(file: SettingsFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| non_blank(env(key));

        let api_key = env(ENV_API_KEY)
            .or_else(|| non_blank(file.openai.api_key))
            .or_else(|| env(ENV_API_KEY_FALLBACK))
            .ok_or(ConfigError::MissingApiKey)?;

        let model_id = env(ENV_MODEL_ID)
            .or_else(|| non_blank(file.openai.model_id))
            .unwrap_or_else(|| MODEL_GPT4O_MINI.to_owned());

        let openai_base_url =
            env(ENV_OPENAI_BASE_URL).or_else(|| non_blank(file.openai.base_url));
        let registry_base_url =
            env(ENV_REGISTRY_BASE_URL).or_else(|| non_blank(file.registry.base_url));

        Ok(Self {
            api_key,
            model_id,
            openai_base_url,
            registry_base_url,
        })
    }
}

fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    if !path.exists() {
        debug!("No settings file at {}, using environment only", path.display());
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Loaded settings from {}", path.display());
    Ok(file)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

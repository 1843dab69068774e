use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variables checked, in order, for the AI credential.
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ai: AiSettings,
    /// Where exported images are written when no directory is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    /// Extra font directories loaded on top of the system fonts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub font_dirs: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("settings could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Resolve the configuration directory (~/.dimov/).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dimov")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings from the default location with the environment applied.
pub fn read_settings() -> Settings {
    let mut settings = read_settings_from(&settings_path());
    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings
}

/// Read settings from `path`. A missing or unreadable file yields defaults.
pub fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match fs::read_to_string(path).map(|s| serde_json::from_str::<Settings>(&s)) {
        Ok(Ok(settings)) => settings,
        Ok(Err(e)) => {
            log::warn!("ignoring malformed settings at {}: {}", path.display(), e);
            Settings::default()
        }
        Err(e) => {
            log::warn!("could not read settings at {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

/// Override the API key from the first non-empty variable in `API_KEY_VARS`.
pub fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|v| !v.trim().is_empty())
    {
        settings.ai.api_key = key;
    }
}

/// Write settings via temp file + rename so readers never see a partial file.
pub fn write_settings_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Error as SerdeError;
use tracing::{debug, info};

use crate::domain::CalculatorSettings;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "CommerceCrafted";
const APP_NAME: &str = "FbaFeeCalculator";

/// Location of `settings.json` in the platform config directory.
pub fn settings_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

/// Loads settings from the config directory; a missing file yields defaults.
pub fn load_settings() -> Result<CalculatorSettings, SettingsError> {
    let path = settings_file().ok_or(SettingsError::StorageUnavailable)?;
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Result<CalculatorSettings, SettingsError> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(CalculatorSettings::default());
    }
    let data = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&data)?;
    info!(path = %path.display(), "loaded settings");
    Ok(settings)
}

pub fn save_settings_to(path: &Path, settings: &CalculatorSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "saved settings");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("config directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

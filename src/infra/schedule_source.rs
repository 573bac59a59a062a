//! Loading fee schedules from the embedded assets or from disk.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::domain::{FeeSchedule, ScheduleError};
use crate::util::assets::{self, DEFAULT_SCHEDULE};

#[derive(Debug, Error)]
pub enum ScheduleLoadError {
    #[error("embedded fee schedule not found: {0}")]
    MissingAsset(String),
    #[error("failed to read fee schedule {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse fee schedule: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid fee schedule: {0}")]
    Invalid(#[from] ScheduleError),
}

/// Where a fee schedule comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleSource {
    /// A schedule bundled with the binary, by name (e.g. `2024`).
    Embedded(String),
    File(PathBuf),
}

impl ScheduleSource {
    pub fn load(&self) -> Result<FeeSchedule, ScheduleLoadError> {
        match self {
            Self::Embedded(name) => load_embedded_schedule(&assets::schedule_asset_path(name)),
            Self::File(path) => load_schedule_file(path),
        }
    }
}

impl Default for ScheduleSource {
    fn default() -> Self {
        Self::Embedded("2024".to_string())
    }
}

impl fmt::Display for ScheduleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded(name) => write!(f, "embedded:{name}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The bundled 2024 schedule.
pub fn load_default_schedule() -> Result<FeeSchedule, ScheduleLoadError> {
    load_embedded_schedule(DEFAULT_SCHEDULE)
}

pub fn load_schedule_file(path: &Path) -> Result<FeeSchedule, ScheduleLoadError> {
    let bytes = fs::read(path).map_err(|source| ScheduleLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schedule = parse_schedule(&bytes)?;
    info!(path = %path.display(), name = %schedule.name, "loaded fee schedule");
    Ok(schedule)
}

fn load_embedded_schedule(asset: &str) -> Result<FeeSchedule, ScheduleLoadError> {
    let bytes =
        assets::load_asset(asset).ok_or_else(|| ScheduleLoadError::MissingAsset(asset.to_string()))?;
    parse_schedule(&bytes)
}

/// Deserializes and validates a schedule.
pub fn parse_schedule(bytes: &[u8]) -> Result<FeeSchedule, ScheduleLoadError> {
    let schedule: FeeSchedule = serde_json::from_slice(bytes)?;
    schedule.validate()?;
    Ok(schedule)
}

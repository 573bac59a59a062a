use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::entities::CalculationOptions;

/// User defaults persisted between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSettings {
    /// Fee schedule JSON used instead of the embedded one.
    #[serde(default)]
    pub schedule_path: Option<PathBuf>,
    #[serde(default = "default_include_returns")]
    pub include_returns: bool,
    #[serde(default)]
    pub target_margin: Option<f64>,
}

fn default_include_returns() -> bool {
    true
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            schedule_path: None,
            include_returns: default_include_returns(),
            target_margin: None,
        }
    }
}

impl CalculatorSettings {
    /// Baseline options; per-call flags are layered on top by the caller.
    pub fn base_options(&self) -> CalculationOptions {
        CalculationOptions {
            include_returns: self.include_returns,
            target_margin: self.target_margin,
            ..CalculationOptions::default()
        }
    }
}

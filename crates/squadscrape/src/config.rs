use std::fs;
use std::path::Path;

use crate::parser::ContractWindow;
use crate::validator::ValidationPolicy;

use serde::{Deserialize, Serialize};

/// Marker of the squad table on the source site.
pub const DEFAULT_TABLE_SELECTOR: &str = "table.items";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables of one scrape pass. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub table_selector: String,
    pub validation: ValidationPolicy,
    pub contract_window: ContractWindow,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table_selector: DEFAULT_TABLE_SELECTOR.to_string(),
            validation: ValidationPolicy::default(),
            contract_window: ContractWindow::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Self::from_json_str(&json)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.table_selector.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Table selector cannot be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.validation.min_age_ratio) {
            return Err(ConfigError::Invalid(format!(
                "Minimum age ratio must be between 0 and 1, got {}",
                self.validation.min_age_ratio
            )));
        }
        if self.validation.min_distinct_positions > 4 {
            return Err(ConfigError::Invalid(format!(
                "Only 4 positions exist, cannot require {}",
                self.validation.min_distinct_positions
            )));
        }
        if self.contract_window.years_ahead < 0 {
            return Err(ConfigError::Invalid(format!(
                "Contract window cannot look backwards ({} years)",
                self.contract_window.years_ahead
            )));
        }
        Ok(self)
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Engine settings. Every key is optional in the JSON document; absent keys keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Statuses counted as open tickets, matched ignoring case and padding.
    pub open_statuses: Vec<String>,
    /// Statuses counted as resolved tickets, matched ignoring case and padding.
    pub resolved_statuses: Vec<String>,
    pub csv_delimiter: char,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            open_statuses: vec![
                "open".into(),
                "in review".into(),
                "hold".into(),
                "in progress".into(),
            ],
            resolved_statuses: vec!["closed".into()],
            csv_delimiter: ',',
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The delimiter as the single byte the CSV reader expects; non-ASCII
    /// delimiters fall back to a comma.
    pub fn delimiter_byte(&self) -> u8 {
        if self.csv_delimiter.is_ascii() {
            self.csv_delimiter as u8
        } else {
            b','
        }
    }
}

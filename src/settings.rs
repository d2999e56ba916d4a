//! Persistent user settings.

use dirs_next as dirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::units::WeightUnit;

fn default_weight_step() -> f64 {
    0.5
}

fn default_chart_height() -> f32 {
    320.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Unit preselected for new sets; updated whenever a set is committed.
    #[serde(default)]
    pub last_unit: WeightUnit,
    #[serde(default = "default_weight_step")]
    pub weight_step: f64,
    #[serde(default)]
    pub database_url: Option<String>,
    /// Overrides the default location of the local store.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default = "default_chart_height")]
    pub chart_height: f32,
    #[serde(default)]
    pub progress_exercise: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_unit: WeightUnit::Lb,
            weight_step: default_weight_step(),
            database_url: None,
            data_file: None,
            chart_height: default_chart_height(),
            progress_exercise: None,
        }
    }
}

impl Settings {
    const FILE: &'static str = "pumping_iron_settings.json";

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load settings from the JSON configuration file.
    ///
    /// A missing or unreadable file yields defaults; missing fields take their
    /// defaults individually.
    pub fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid settings file {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        log::error!("Failed to write settings {}: {e}", path.display());
                    }
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }

    /// Location of the local store, honouring the override.
    pub fn data_path(&self) -> Option<PathBuf> {
        self.data_file
            .clone()
            .or_else(crate::storage::JsonFileStore::default_path)
    }
}

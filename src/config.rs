// ⚙️ Configuration - data locations and display defaults, read from TOML

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILTER: &str = "olympics_dashboard=info";

/// Reference date for athlete ages (opening ceremony)
pub fn olympics_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 26).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding athletes.csv, medals.csv, ...
    pub data_dir: PathBuf,

    /// Per-sport results; `<data_dir>/results` when unset
    pub results_dir: Option<PathBuf>,

    pub olympics_start_date: NaiveDate,

    pub top_n_countries: usize,

    pub top_n_athletes: usize,

    pub log_filter: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            results_dir: None,
            olympics_start_date: olympics_start_date(),
            top_n_countries: 10,
            top_n_athletes: 10,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Defaults when the file does not exist; a present but broken file is still an error
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn results_dir(&self) -> PathBuf {
        self.results_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("results"))
    }
}

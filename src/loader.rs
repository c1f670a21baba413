// 📂 Dataset Loader - CSV files → Tables, fail-soft and cached
//
// A missing or malformed file never aborts the caller: it yields an empty
// table plus the reason, and the reason is logged. Each file is read once
// per store; `invalidate()` drops everything.

use crate::config::DashboardConfig;
use crate::table::Table;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// DATASETS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Athletes,
    Medals,
    Medallists,
    MedalsTotal,
    Events,
    Nocs,
    Schedules,
    SchedulesPreliminary,
    Venues,
    Teams,
    Coaches,
    TechnicalOfficials,
    TorchRoute,
}

impl Dataset {
    pub const ALL: [Dataset; 13] = [
        Dataset::Athletes,
        Dataset::Medals,
        Dataset::Medallists,
        Dataset::MedalsTotal,
        Dataset::Events,
        Dataset::Nocs,
        Dataset::Schedules,
        Dataset::SchedulesPreliminary,
        Dataset::Venues,
        Dataset::Teams,
        Dataset::Coaches,
        Dataset::TechnicalOfficials,
        Dataset::TorchRoute,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Athletes => "athletes",
            Dataset::Medals => "medals",
            Dataset::Medallists => "medallists",
            Dataset::MedalsTotal => "medals_total",
            Dataset::Events => "events",
            Dataset::Nocs => "nocs",
            Dataset::Schedules => "schedules",
            Dataset::SchedulesPreliminary => "schedules_preliminary",
            Dataset::Venues => "venues",
            Dataset::Teams => "teams",
            Dataset::Coaches => "coaches",
            Dataset::TechnicalOfficials => "technical_officials",
            Dataset::TorchRoute => "torch_route",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }
}

// ============================================================================
// LOAD RESULT
// ============================================================================

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },
}

/// Table plus the reason it is empty, when loading failed
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: Table,
    pub problem: Option<LoadError>,
}

impl LoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.problem.is_none()
    }
}

/// Strict read: the error says why
pub fn read_table(path: &Path) -> Result<Table, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Table::from_csv_reader(file).map_err(|e| LoadError::Csv {
        path: path.to_path_buf(),
        message: format!("{:#}", e),
    })
}

/// Fail-soft read: empty table on any failure, with the failure logged
pub fn load_table(path: &Path) -> LoadOutcome {
    match read_table(path) {
        Ok(table) => {
            debug!(path = %path.display(), rows = table.len(), "loaded table");
            LoadOutcome {
                table,
                problem: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "using empty table");
            LoadOutcome {
                table: Table::default(),
                problem: Some(e),
            }
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataAvailability {
    /// Dataset name → file exists
    pub files: BTreeMap<String, bool>,
    pub results_count: usize,
    pub results_available: bool,
}

impl DataAvailability {
    pub fn any_available(&self) -> bool {
        self.results_available || self.files.values().any(|exists| *exists)
    }

    pub fn missing(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|(_, exists)| !**exists)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
}

// ============================================================================
// STORE
// ============================================================================

/// Cached access to every dataset under one data directory
pub struct DatasetStore {
    data_dir: PathBuf,
    results_dir: PathBuf,
    cache: RwLock<HashMap<Dataset, Arc<LoadOutcome>>>,
    results: RwLock<Option<Arc<BTreeMap<String, Table>>>>,
}

impl DatasetStore {
    pub fn new(data_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        DatasetStore {
            data_dir: data_dir.into(),
            results_dir: results_dir.into(),
            cache: RwLock::new(HashMap::new()),
            results: RwLock::new(None),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        DatasetStore::new(config.data_dir.clone(), config.results_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, dataset: Dataset) -> PathBuf {
        self.data_dir.join(dataset.file_name())
    }

    /// Load once, then serve from cache
    pub fn load(&self, dataset: Dataset) -> Arc<LoadOutcome> {
        {
            let cache = self.cache.read().unwrap_or_else(|p| p.into_inner());
            if let Some(outcome) = cache.get(&dataset) {
                return Arc::clone(outcome);
            }
        }

        let outcome = Arc::new(load_table(&self.path(dataset)));
        let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
        Arc::clone(cache.entry(dataset).or_insert(outcome))
    }

    pub fn table(&self, dataset: Dataset) -> Table {
        self.load(dataset).table.clone()
    }

    /// Every `results/*.csv`, keyed by file stem. Unreadable files are skipped.
    pub fn sport_results(&self) -> Arc<BTreeMap<String, Table>> {
        {
            let results = self.results.read().unwrap_or_else(|p| p.into_inner());
            if let Some(results) = results.as_ref() {
                return Arc::clone(results);
            }
        }

        let loaded = Arc::new(self.read_results_dir());
        let mut results = self.results.write().unwrap_or_else(|p| p.into_inner());
        Arc::clone(results.get_or_insert(loaded))
    }

    /// Results for one sport; empty when the file is missing
    pub fn sport_result(&self, sport: &str) -> Table {
        self.sport_results()
            .get(sport)
            .cloned()
            .unwrap_or_else(|| load_table(&self.results_dir.join(format!("{}.csv", sport))).table)
    }

    fn result_files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.results_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "csv"))
            .collect();
        files.sort();
        files
    }

    fn read_results_dir(&self) -> BTreeMap<String, Table> {
        if !self.results_dir.is_dir() {
            warn!(path = %self.results_dir.display(), "results directory not found");
            return BTreeMap::new();
        }

        let mut all = BTreeMap::new();
        for path in self.result_files() {
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            let outcome = load_table(&path);
            if outcome.is_ok() {
                all.insert(stem, outcome.table);
            }
        }

        info!(sports = all.len(), "loaded sport results");
        all
    }

    /// Forget every cached table
    pub fn invalidate(&self) {
        self.cache.write().unwrap_or_else(|p| p.into_inner()).clear();
        *self.results.write().unwrap_or_else(|p| p.into_inner()) = None;
        debug!("dataset cache cleared");
    }

    /// Failures among the datasets loaded so far
    pub fn problems(&self) -> Vec<(Dataset, String)> {
        let cache = self.cache.read().unwrap_or_else(|p| p.into_inner());
        let mut problems: Vec<(Dataset, String)> = cache
            .iter()
            .filter_map(|(dataset, outcome)| {
                outcome.problem.as_ref().map(|e| (*dataset, e.to_string()))
            })
            .collect();
        problems.sort_by_key(|(dataset, _)| *dataset);
        problems
    }

    /// Which files exist, without loading them
    pub fn availability(&self) -> DataAvailability {
        let files = Dataset::ALL
            .iter()
            .map(|d| (d.name().to_string(), self.path(*d).exists()))
            .collect();
        let results_count = self.result_files().len();

        DataAvailability {
            files,
            results_count,
            results_available: results_count > 0,
        }
    }

    /// Row/column counts per dataset (loads everything)
    pub fn summary(&self) -> BTreeMap<String, DatasetSummary> {
        Dataset::ALL
            .iter()
            .map(|d| {
                let outcome = self.load(*d);
                let summary = DatasetSummary {
                    rows: outcome.table.len(),
                    columns: outcome.table.columns().len(),
                    column_names: outcome.table.columns().to_vec(),
                };
                (d.name().to_string(), summary)
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Paris 2024 Olympics Dashboard - Core Library
// Loading, filtering and medal aggregation shared by the CLI and tests

pub mod table;
pub mod columns;
pub mod config;
pub mod logging;
pub mod loader;
pub mod continents;     // Country code → continent registry
pub mod normalizer;     // medals_total column canonicalisation
pub mod filters;        // FilterSelection + FilterEngine
pub mod athletes;       // Age derivation, typed athlete records
pub mod deduplication;  // One row per team medal
pub mod aggregator;     // Country tallies
pub mod kpis;
pub mod pipeline;
pub mod analytics;
pub mod country;        // Follow-up profile + head-to-head
pub mod export;

// Re-export commonly used types
pub use table::{Cell, RowView, Table};
pub use config::DashboardConfig;
pub use loader::{
    Dataset, DatasetStore, DatasetSummary, DataAvailability,
    LoadError, LoadOutcome,
    load_table, read_table,
};
pub use continents::{
    ContinentRegistry,
    add_continent, all_continents, continent_of, countries_in,
};
pub use normalizer::{normalize, attach_country_names, to_tallies};
pub use filters::{
    FilterEngine, FilterSelection, Selection,
    AgeRange, Gender, MedalType,
};
pub use athletes::{AthleteRecord, prepare_athletes, derive_age};
pub use deduplication::{
    DeduplicationEngine, DeduplicationReport, DuplicateMedal,
    deduplicate_team_medals,
};
pub use aggregator::{
    CountryMedalTally, MedalRecord, TallySource,
    recompute_tally, tally_for,
};
pub use kpis::{KpiInputs, KpiSummary};
pub use pipeline::{DashboardData, DashboardView, FilterOptions, evaluate};
pub use analytics::{
    AgeStats, AthleteMedalCount, ContinentStat, Efficiency, HierarchyNode,
    MedalDistribution, TallySummary, TimelinePoint,
};
pub use country::{
    Comparison, CountryProfile, CountrySide, Opponent,
    compare_countries, extract_opponents,
};
pub use export::{export_tally, write_tally_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

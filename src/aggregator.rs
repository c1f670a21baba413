// 📊 Aggregator - Medal tallies consistent with the active filters
//
// Two sources for the same tally:
//   - medals_total (pre-aggregated), usable when no athlete-level filter is set
//   - medallists (one row per athlete per medal), filtered, de-duplicated, recounted
// The second is the only one that can honour gender and age.

use crate::athletes::parse_date;
use crate::columns;
use crate::continents::continent_of;
use crate::deduplication::DeduplicationEngine;
use crate::filters::{self, FilterSelection, MedalType};
use crate::normalizer::{normalize, to_tallies};
use crate::table::{Cell, RowView, Table};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// TYPED ROWS
// ============================================================================

/// One row of the medal table. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMedalTally {
    pub country: String,
    pub country_code: String,
    pub continent: String,

    #[serde(rename = "Gold")]
    pub gold: i64,

    #[serde(rename = "Silver")]
    pub silver: i64,

    #[serde(rename = "Bronze")]
    pub bronze: i64,

    #[serde(rename = "Total")]
    pub total: i64,
}

impl CountryMedalTally {
    /// Total is always derived, never taken from input
    pub fn new(
        country: String,
        country_code: String,
        continent: String,
        gold: i64,
        silver: i64,
        bronze: i64,
    ) -> Self {
        CountryMedalTally {
            country,
            country_code,
            continent,
            gold,
            silver,
            bronze,
            total: gold + silver + bronze,
        }
    }

    pub fn count(&self, medal: MedalType) -> i64 {
        match medal {
            MedalType::Gold => self.gold,
            MedalType::Silver => self.silver,
            MedalType::Bronze => self.bronze,
        }
    }

    pub fn has_medals(&self) -> bool {
        self.total > 0
    }
}

/// One medal won (or one medallist row)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedalRecord {
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub continent: String,
    pub discipline: Option<String>,
    pub event: Option<String>,
    pub medal_type: Option<MedalType>,
    pub athlete: Option<String>,
    pub gender: Option<String>,
    pub medal_date: Option<NaiveDate>,
}

impl MedalRecord {
    fn from_row(row: RowView<'_>) -> Self {
        let country_code = row.text(columns::COUNTRY_CODE_STRICT);
        let continent = row
            .text(&[columns::CONTINENT])
            .unwrap_or_else(|| continent_of(country_code.as_deref().unwrap_or_default()).to_string());

        MedalRecord {
            continent,
            country: row.text(columns::COUNTRY_NAME),
            discipline: row.text(columns::DISCIPLINE),
            event: row.text(columns::EVENT),
            medal_type: row.first_of(columns::MEDAL_TYPE).and_then(MedalType::from_cell),
            athlete: row.text(columns::ATHLETE_NAME),
            gender: row.text(columns::GENDER),
            medal_date: row.text(columns::MEDAL_DATE).and_then(|raw| parse_date(&raw)),
            country_code,
        }
    }

    pub fn from_table(table: &Table) -> Vec<MedalRecord> {
        table.records().map(MedalRecord::from_row).collect()
    }
}

// ============================================================================
// TALLY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TallySource {
    /// Filtered medals_total
    Aggregated,
    /// Recounted from medallists
    Recomputed,
}

impl TallySource {
    pub fn for_selection(selection: &FilterSelection) -> Self {
        if selection.has_athlete_filters() {
            TallySource::Recomputed
        } else {
            TallySource::Aggregated
        }
    }
}

#[derive(Default)]
struct Counter {
    country: Option<String>,
    gold: i64,
    silver: i64,
    bronze: i64,
}

/// Sort descending by total (stable) and drop medal-less rows
fn finish(mut tallies: Vec<CountryMedalTally>) -> Vec<CountryMedalTally> {
    tallies.retain(CountryMedalTally::has_medals);
    tallies.sort_by(|a, b| b.total.cmp(&a.total));
    tallies
}

/// Recount medals from medallist rows under a selection
///
/// Filter, collapse team rows to one medal, count per country and type.
pub fn recompute_tally(medallists: &Table, selection: &FilterSelection) -> Vec<CountryMedalTally> {
    let filtered = filters::apply(medallists, selection);
    let (unique, report) = DeduplicationEngine::new().deduplicate(&filtered);
    debug!(
        rows = report.input_rows,
        medals = report.unique_medals,
        "recounting tally from medallists"
    );

    let code_idx = unique.resolve(columns::COUNTRY_CODE_STRICT);
    let name_idx = unique.resolve(columns::COUNTRY_NAME);
    let medal_idx = match unique.resolve(columns::MEDAL_TYPE) {
        Some(idx) => idx,
        None => return Vec::new(),
    };

    let mut counters: BTreeMap<String, Counter> = BTreeMap::new();
    for row in unique.rows() {
        let medal = match MedalType::from_cell(&row[medal_idx]) {
            Some(medal) => medal,
            None => continue,
        };
        let name = name_idx.and_then(|idx| row[idx].trimmed_text());
        let key = match code_idx.and_then(|idx| row[idx].trimmed_text()).or_else(|| name.clone()) {
            Some(key) => key,
            None => continue,
        };

        let counter = counters.entry(key).or_default();
        if counter.country.is_none() {
            counter.country = name;
        }
        match medal {
            MedalType::Gold => counter.gold += 1,
            MedalType::Silver => counter.silver += 1,
            MedalType::Bronze => counter.bronze += 1,
        }
    }

    let tallies = counters
        .into_iter()
        .map(|(code, c)| {
            let continent = continent_of(&code).to_string();
            let country = c.country.unwrap_or_else(|| code.clone());
            CountryMedalTally::new(country, code, continent, c.gold, c.silver, c.bronze)
        })
        .collect();

    finish(tallies)
}

/// Tally for the current selection, choosing the source the selection allows
pub fn tally_for(
    selection: &FilterSelection,
    medals_total: &Table,
    medallists: &Table,
) -> Vec<CountryMedalTally> {
    match TallySource::for_selection(selection) {
        TallySource::Recomputed => recompute_tally(medallists, selection),
        TallySource::Aggregated => {
            let filtered = filters::apply(&normalize(medals_total), selection);
            finish(to_tallies(&filtered))
        }
    }
}

/// Canonical table form of a tally, one row per country
pub fn tally_table(tallies: &[CountryMedalTally]) -> Table {
    let mut table = Table::with_columns([
        "country",
        "country_code",
        columns::CONTINENT,
        columns::GOLD,
        columns::SILVER,
        columns::BRONZE,
        columns::TOTAL,
    ]);

    for t in tallies {
        table.push_row(vec![
            Cell::from(t.country.as_str()),
            Cell::from(t.country_code.as_str()),
            Cell::from(t.continent.as_str()),
            Cell::Int(t.gold),
            Cell::Int(t.silver),
            Cell::Int(t.bronze),
            Cell::Int(t.total),
        ]);
    }

    table
}

// ============================================================================
// TESTS
// ============================================================================

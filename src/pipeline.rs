// 🔄 Pipeline - load once, evaluate per selection
//
// `DashboardData` is the prepared, unfiltered state (built once per store).
// `evaluate` is one render cycle: filter → aggregate → KPIs, no mutation.

use crate::aggregator::{tally_for, CountryMedalTally, TallySource};
use crate::athletes::{add_age, prepare_athletes};
use crate::columns;
use crate::continents::add_continent;
use crate::filters::{self, FilterSelection};
use crate::kpis::{self, KpiInputs, KpiSummary};
use crate::loader::{Dataset, DatasetStore};
use crate::normalizer::{attach_country_names, normalize};
use crate::table::Table;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// PREPARED DATA
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub athletes: Table,
    pub medals: Table,
    pub medallists: Table,
    pub medals_total: Table,
    pub events: Table,
    pub nocs: Table,
    pub results: Arc<BTreeMap<String, Table>>,
}

impl DashboardData {
    /// Read every table the dashboard uses from the store, then prepare them
    pub fn load(store: &DatasetStore, start_date: NaiveDate) -> Self {
        let raw = DashboardData {
            athletes: store.table(Dataset::Athletes),
            medals: store.table(Dataset::Medals),
            medallists: store.table(Dataset::Medallists),
            medals_total: store.table(Dataset::MedalsTotal),
            events: store.table(Dataset::Events),
            nocs: store.table(Dataset::Nocs),
            results: store.sport_results(),
        };

        let data = raw.prepared(start_date);
        info!(
            athletes = data.athletes.len(),
            medallists = data.medallists.len(),
            countries = data.medals_total.len(),
            sports_with_results = data.results.len(),
            "dashboard data ready"
        );
        data
    }

    /// Derived columns and canonical names on raw tables
    ///
    /// Athletes and medallists get `age`, medal tables get `continent`,
    /// medals_total gets canonical medal columns and country names.
    pub fn prepared(self, start_date: NaiveDate) -> Self {
        let medals_total = if self.medals_total.is_empty() {
            self.medals_total
        } else {
            let named = attach_country_names(&normalize(&self.medals_total), &self.nocs);
            add_continent(&named, "country_code")
        };

        DashboardData {
            athletes: prepare_athletes(&self.athletes, start_date),
            medals: add_continent(&self.medals, "country_code"),
            medallists: add_age(&add_continent(&self.medallists, "country_code"), start_date),
            medals_total,
            events: self.events,
            nocs: self.nocs,
            results: self.results,
        }
    }

    /// False only when every source is empty
    pub fn has_any_data(&self) -> bool {
        !(self.athletes.is_empty()
            && self.medals.is_empty()
            && self.medallists.is_empty()
            && self.medals_total.is_empty()
            && self.events.is_empty()
            && self.nocs.is_empty()
            && self.results.is_empty())
    }

    /// Distinct values offered by the sidebar selectors
    pub fn filter_options(&self) -> FilterOptions {
        let distinct = |table: &Table, candidates: &[&str]| -> Vec<String> {
            let mut values: Vec<String> = match table.resolve(candidates) {
                Some(idx) => table.column(idx).filter_map(|c| c.trimmed_text()).collect(),
                None => Vec::new(),
            };
            values.sort();
            values.dedup();
            values
        };

        let mut sports = distinct(&self.events, columns::SPORT);
        if sports.is_empty() {
            sports = distinct(&self.medallists, columns::DISCIPLINE);
        }

        FilterOptions {
            continents: crate::continents::all_continents()
                .into_iter()
                .map(str::to_string)
                .collect(),
            countries: distinct(&self.medallists, columns::COUNTRY_NAME),
            sports,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub continents: Vec<String>,
    pub countries: Vec<String>,
    pub sports: Vec<String>,
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Everything one render cycle derives from a selection
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub selection: FilterSelection,
    pub source: TallySource,
    pub tally: Vec<CountryMedalTally>,
    pub kpis: KpiSummary,
    pub athletes: Table,
    pub medals: Table,
    pub medallists: Table,
    pub events: Table,
}

impl DashboardView {
    /// "Showing X of Y countries" line plus active filters
    pub fn summary_line(&self, unfiltered_countries: usize) -> String {
        let active = self.selection.active_filters();
        let filters = if active.is_empty() {
            "no filters".to_string()
        } else {
            active.join(", ")
        };
        format!(
            "Showing {} of {} countries ({})",
            self.tally.len(),
            unfiltered_countries,
            filters
        )
    }
}

pub fn evaluate(data: &DashboardData, selection: &FilterSelection) -> DashboardView {
    let source = TallySource::for_selection(selection);
    let tally = tally_for(selection, &data.medals_total, &data.medallists);

    let kpis = kpis::compute(
        &KpiInputs {
            athletes: &data.athletes,
            medallists: &data.medallists,
            events: &data.events,
            results: &data.results,
            tallies: &tally,
        },
        selection,
    );

    debug!(?source, countries = tally.len(), "evaluated selection");

    DashboardView {
        selection: selection.clone(),
        source,
        kpis,
        athletes: filters::apply(&data.athletes, selection),
        medals: filters::apply(&data.medals, selection),
        medallists: filters::apply(&data.medallists, selection),
        events: filters::apply(&data.events, selection),
        tally,
    }
}

// ============================================================================
// TESTS
// ============================================================================

// 🎯 KPI scalars - the five headline numbers
//
// Each number is derived from the same filtered data the tally uses, so the
// headline and the table never disagree.

use crate::aggregator::CountryMedalTally;
use crate::columns;
use crate::continents::countries_in;
use crate::filters::{self, FilterSelection, Selection};
use crate::table::Table;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KpiSummary {
    pub total_athletes: usize,
    pub total_countries: usize,
    pub total_sports: usize,
    pub total_medals: i64,
    pub total_events: usize,
}

/// Everything the KPIs read; tables are the prepared, unfiltered ones
pub struct KpiInputs<'a> {
    pub athletes: &'a Table,
    pub medallists: &'a Table,
    pub events: &'a Table,
    pub results: &'a BTreeMap<String, Table>,
    pub tallies: &'a [CountryMedalTally],
}

fn normalize_sport(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalised values of the first present candidate column
fn distinct_normalized(table: &Table, candidates: &[&str]) -> BTreeSet<String> {
    match table.resolve(candidates) {
        Some(idx) => table
            .column(idx)
            .filter_map(|cell| cell.trimmed_text())
            .map(|s| normalize_sport(&s))
            .collect(),
        None => BTreeSet::new(),
    }
}

// ============================================================================
// INDIVIDUAL KPIs
// ============================================================================

/// Athlete rows under the selection
///
/// Athletes carry no sport or medal columns, so sport and narrowed medal
/// filters are applied through the codes of matching medallists.
pub fn total_athletes(athletes: &Table, medallists: &Table, selection: &FilterSelection) -> usize {
    let filtered = filters::apply(athletes, selection);

    let needs_medallist_match = !selection.sports.is_all() || selection.narrows_medal_types();
    if !needs_medallist_match || athletes.resolve(columns::SPORT).is_some() {
        return filtered.len();
    }

    let (athlete_idx, medallist_idx) = match (
        filtered.resolve(columns::ATHLETE_CODE),
        medallists.resolve(columns::ATHLETE_CODE),
    ) {
        (Some(a), Some(m)) => (a, m),
        _ => return filtered.len(),
    };

    let matching = filters::apply(medallists, selection);
    let codes: HashSet<String> = matching
        .column(medallist_idx)
        .filter_map(|cell| cell.trimmed_text())
        .collect();

    filtered
        .column(athlete_idx)
        .filter(|cell| cell.trimmed_text().map_or(false, |code| codes.contains(&code)))
        .count()
}

/// Distinct countries that still hold a medal
pub fn total_countries(tallies: &[CountryMedalTally]) -> usize {
    tallies
        .iter()
        .filter(|t| t.has_medals())
        .map(|t| t.country_code.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Country codes the participation scope refers to; None when unconstrained
fn scoped_country_codes(medallists: &Table, selection: &FilterSelection) -> Option<HashSet<String>> {
    if let Selection::Only(countries) = &selection.countries {
        let name_idx = medallists.resolve(columns::COUNTRY_NAME);
        let code_idx = medallists.resolve(columns::COUNTRY_CODE_STRICT);
        let mut codes = HashSet::new();

        for country in countries {
            let matched: Vec<String> = match (name_idx, code_idx) {
                (Some(n), Some(c)) => medallists
                    .rows()
                    .iter()
                    .filter(|row| row[n].trimmed_text().as_deref() == Some(country.as_str()))
                    .filter_map(|row| row[c].trimmed_text())
                    .collect(),
                _ => Vec::new(),
            };

            // Not a known country name: take the value as a code
            if matched.is_empty() {
                codes.insert(country.clone());
            } else {
                codes.extend(matched);
            }
        }

        return Some(codes);
    }

    if let Selection::Only(continents) = &selection.continents {
        return Some(continents.iter().flat_map(|c| countries_in(c)).collect());
    }

    None
}

/// Sports with participation under the continent/country/gender scope
///
/// Union of medallist disciplines and result tables the scoped countries
/// appear in, compared case-insensitively.
pub fn total_sports(
    medallists: &Table,
    results: &BTreeMap<String, Table>,
    selection: &FilterSelection,
) -> usize {
    let scope = selection.participation_scope();
    let scoped_medallists = filters::apply(medallists, &scope);
    let mut sports = distinct_normalized(&scoped_medallists, columns::DISCIPLINE);

    let codes = scoped_country_codes(medallists, selection);
    for (sport, table) in results {
        let idx = match table.column_index(columns::PARTICIPANT_COUNTRY_CODE) {
            Some(idx) if !table.is_empty() => idx,
            _ => continue,
        };

        let participated = match &codes {
            Some(codes) => table
                .column(idx)
                .any(|cell| cell.trimmed_text().map_or(false, |code| codes.contains(&code))),
            None => true,
        };

        if participated {
            sports.insert(normalize_sport(sport));
        }
    }

    sports.len()
}

/// Medals in the tally, limited to the selected types when narrowed
pub fn total_medals(tallies: &[CountryMedalTally], selection: &FilterSelection) -> i64 {
    if selection.narrows_medal_types() {
        tallies
            .iter()
            .map(|t| selection.medal_types().iter().map(|m| t.count(*m)).sum::<i64>())
            .sum()
    } else {
        tallies.iter().map(|t| t.total).sum()
    }
}

/// Event rows under the selection, limited to sports the scoped medallists
/// competed in when a continent/country/gender constraint is active
pub fn total_events(events: &Table, medallists: &Table, selection: &FilterSelection) -> usize {
    let filtered = filters::apply(events, selection);

    if !selection.has_participation_filters() || medallists.is_empty() {
        return filtered.len();
    }

    let scoped = filters::apply(medallists, &selection.participation_scope());
    let valid_sports = distinct_normalized(&scoped, columns::SPORT);

    match filtered.resolve(columns::SPORT) {
        Some(idx) => filtered
            .column(idx)
            .filter(|cell| {
                cell.trimmed_text()
                    .map_or(false, |s| valid_sports.contains(&normalize_sport(&s)))
            })
            .count(),
        None => filtered.len(),
    }
}

/// All five KPIs for one selection
pub fn compute(inputs: &KpiInputs<'_>, selection: &FilterSelection) -> KpiSummary {
    KpiSummary {
        total_athletes: total_athletes(inputs.athletes, inputs.medallists, selection),
        total_countries: total_countries(inputs.tallies),
        total_sports: total_sports(inputs.medallists, inputs.results, selection),
        total_medals: total_medals(inputs.tallies, selection),
        total_events: total_events(inputs.events, inputs.medallists, selection),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{Gender, MedalType};
    use crate::table::Cell;

    fn create_test_athletes() -> Table {
        Table::from_rows(
            vec!["code".into(), "name".into(), "gender".into(), "country_code".into(), "country".into()],
            vec![
                vec![Cell::Int(1), "Leon".into(), "Male".into(), "FRA".into(), "France".into()],
                vec![Cell::Int(2), "Clarisse".into(), "Female".into(), "FRA".into(), "France".into()],
                vec![Cell::Int(3), "Katie".into(), "Female".into(), "USA".into(), "United States".into()],
                vec![Cell::Int(4), "Noah".into(), "Male".into(), "USA".into(), "United States".into()],
            ],
        )
    }

    fn create_test_medallists() -> Table {
        Table::from_rows(
            vec![
                "code_athlete".into(),
                "gender".into(),
                "country_code".into(),
                "country".into(),
                "medal_type".into(),
                "discipline".into(),
                "event".into(),
            ],
            vec![
                vec![Cell::Int(1), "Male".into(), "FRA".into(), "France".into(), "Gold Medal".into(), "Swimming".into(), "200m IM".into()],
                vec![Cell::Int(2), "Female".into(), "FRA".into(), "France".into(), "Silver Medal".into(), "Judo".into(), "Mixed Team".into()],
                vec![Cell::Int(3), "Female".into(), "USA".into(), "United States".into(), "Gold Medal".into(), "Swimming".into(), "800m".into()],
            ],
        )
    }

    fn create_test_events() -> Table {
        Table::from_rows(
            vec!["event".into(), "sport".into()],
            vec![
                vec!["200m IM".into(), "Swimming".into()],
                vec!["800m".into(), "Swimming".into()],
                vec!["Mixed Team".into(), "Judo".into()],
                vec!["100m".into(), "Athletics".into()],
            ],
        )
    }

    fn create_test_results() -> BTreeMap<String, Table> {
        let mut results = BTreeMap::new();
        results.insert(
            "Athletics".to_string(),
            Table::from_rows(
                vec!["participant_country_code".into(), "stage_code".into()],
                vec![vec!["USA".into(), "FINAL".into()]],
            ),
        );
        results.insert(
            "Swimming".to_string(),
            Table::from_rows(
                vec!["participant_country_code".into(), "stage_code".into()],
                vec![vec!["FRA".into(), "FINAL".into()]],
            ),
        );
        results
    }

    fn create_test_tallies() -> Vec<CountryMedalTally> {
        vec![
            CountryMedalTally::new("United States".into(), "USA".into(), "North America".into(), 40, 44, 42),
            CountryMedalTally::new("France".into(), "FRA".into(), "Europe".into(), 16, 26, 22),
            CountryMedalTally::new("Nowhere".into(), "ZZZ".into(), "Unknown".into(), 0, 0, 0),
        ]
    }

    #[test]
    fn test_total_athletes_plain_filters() {
        let selection = FilterSelection::default().with_gender(Gender::Female);
        assert_eq!(total_athletes(&create_test_athletes(), &create_test_medallists(), &selection), 2);
    }

    #[test]
    fn test_total_athletes_through_medallist_codes() {
        let selection = FilterSelection::default().with_sports(["Swimming"]);
        assert_eq!(total_athletes(&create_test_athletes(), &create_test_medallists(), &selection), 2);

        let selection = FilterSelection::default().with_medal_types([MedalType::Silver]);
        assert_eq!(total_athletes(&create_test_athletes(), &create_test_medallists(), &selection), 1);
    }

    #[test]
    fn test_total_countries_ignores_zero_rows() {
        assert_eq!(total_countries(&create_test_tallies()), 2);
        assert_eq!(total_countries(&[]), 0);
    }

    #[test]
    fn test_total_medals() {
        assert_eq!(total_medals(&create_test_tallies(), &FilterSelection::default()), 190);

        let gold = FilterSelection::default().with_medal_types([MedalType::Gold]);
        assert_eq!(total_medals(&create_test_tallies(), &gold), 56);
    }

    #[test]
    fn test_total_sports_unconstrained_unions_everything() {
        let sports = total_sports(&create_test_medallists(), &create_test_results(), &FilterSelection::default());
        // swimming, judo, athletics
        assert_eq!(sports, 3);
    }

    #[test]
    fn test_total_sports_by_country_name() {
        let selection = FilterSelection::default().with_countries(["France"]);
        // swimming (medals and results) + judo
        assert_eq!(total_sports(&create_test_medallists(), &create_test_results(), &selection), 2);
    }

    #[test]
    fn test_total_sports_by_continent() {
        let selection = FilterSelection::default().with_continents(["North America"]);
        // swimming medal + athletics result
        assert_eq!(total_sports(&create_test_medallists(), &create_test_results(), &selection), 2);
    }

    #[test]
    fn test_total_events_restricted_by_scope() {
        assert_eq!(total_events(&create_test_events(), &create_test_medallists(), &FilterSelection::default()), 4);

        let selection = FilterSelection::default().with_countries(["United States"]);
        assert_eq!(total_events(&create_test_events(), &create_test_medallists(), &selection), 2);
    }

    #[test]
    fn test_compute_on_empty_data() {
        let empty = Table::default();
        let results = BTreeMap::new();
        let inputs = KpiInputs {
            athletes: &empty,
            medallists: &empty,
            events: &empty,
            results: &results,
            tallies: &[],
        };
        assert_eq!(compute(&inputs, &FilterSelection::default()), KpiSummary::default());
    }
}

// 🌍 Country follow-up and head-to-head comparison
//
// A country is addressed by its NOC code. Medal counts in the comparison
// come from the one-row-per-medal `medals` table, so team medals count once.

use crate::aggregator::CountryMedalTally;
use crate::analytics::MedalDistribution;
use crate::columns;
use crate::filters::{title_case, MedalType};
use crate::normalizer::to_tallies;
use crate::pipeline::DashboardData;
use crate::table::{Cell, Table};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const TOP_DISCIPLINES: usize = 5;

fn normalize_sport(name: &str) -> String {
    name.trim().to_lowercase()
}

fn cell_is_code(cell: &Cell, code: &str) -> bool {
    cell.trimmed_text().map_or(false, |c| c.eq_ignore_ascii_case(code))
}

/// Rows whose country code column equals `code`
fn rows_for_code(table: &Table, candidates: &[&str], code: &str) -> Table {
    match table.resolve(candidates) {
        Some(idx) => table.filter(|row| cell_is_code(&row[idx], code)),
        None => Table::with_columns(table.columns().to_vec()),
    }
}

/// Distinct values in first-seen order
fn distinct_in_order<I: IntoIterator<Item = String>>(values: I) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

// ============================================================================
// FOLLOW-UP
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedalSummary {
    pub gold: usize,
    pub silver: usize,
    pub bronze: usize,
    /// Raw row count, including rows with an unreadable medal label
    pub total: usize,
}

/// Medallist rows of one country in one discipline
///
/// Counts raw rows, so a team gold shows once per team member.
pub fn medal_summary_for_sport(medallists: &Table, code: &str, sport: &str) -> Option<MedalSummary> {
    let discipline_idx = medallists.resolve(columns::DISCIPLINE)?;
    let medal_idx = medallists.resolve(columns::MEDAL_TYPE);
    let wanted = normalize_sport(sport);

    let rows = rows_for_code(medallists, columns::COUNTRY_CODE_STRICT, code);
    let mut summary = MedalSummary::default();
    for row in rows.rows() {
        let matches = row[discipline_idx]
            .trimmed_text()
            .map_or(false, |d| normalize_sport(&d) == wanted);
        if !matches {
            continue;
        }
        summary.total += 1;
        match medal_idx.and_then(|idx| MedalType::from_cell(&row[idx])) {
            Some(MedalType::Gold) => summary.gold += 1,
            Some(MedalType::Silver) => summary.silver += 1,
            Some(MedalType::Bronze) => summary.bronze += 1,
            None => {}
        }
    }

    (summary.total > 0).then_some(summary)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opponent {
    pub stage_code: String,
    pub participant_name: String,
    pub opponent_countries: Vec<String>,
    pub opponent_names: Vec<String>,
}

/// For every result row of `code`, the other participants of the same stage
pub fn extract_opponents(results: &Table, code: &str) -> Vec<Opponent> {
    let (stage_idx, country_idx) = match (
        results.column_index(columns::STAGE_CODE),
        results.column_index(columns::PARTICIPANT_COUNTRY_CODE),
    ) {
        (Some(s), Some(c)) => (s, c),
        _ => return Vec::new(),
    };
    let name_idx = results.column_index(columns::PARTICIPANT_NAME);

    let mut stages: HashMap<String, Vec<&Vec<Cell>>> = HashMap::new();
    for row in results.rows() {
        stages.entry(row[stage_idx].key()).or_default().push(row);
    }

    results
        .rows()
        .iter()
        .filter(|row| cell_is_code(&row[country_idx], code))
        .map(|row| {
            let others: Vec<&&Vec<Cell>> = stages
                .get(&row[stage_idx].key())
                .map(|rows| rows.iter().filter(|r| !cell_is_code(&r[country_idx], code)).collect())
                .unwrap_or_default();

            Opponent {
                stage_code: row[stage_idx].key(),
                participant_name: name_idx
                    .and_then(|idx| row[idx].trimmed_text())
                    .unwrap_or_default(),
                opponent_countries: distinct_in_order(
                    others.iter().filter_map(|r| r[country_idx].trimmed_text()),
                ),
                opponent_names: distinct_in_order(
                    others
                        .iter()
                        .filter_map(|r| name_idx.and_then(|idx| r[idx].trimmed_text())),
                ),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SportParticipation {
    pub sport: String,
    pub participants: Vec<Participant>,
    pub medals: Option<MedalSummary>,
    pub opponents: Vec<Opponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryProfile {
    pub code: String,
    pub name: String,
    pub tally: Option<CountryMedalTally>,
    pub athletes: usize,
    pub medallist_rows: usize,
    pub sports: Vec<SportParticipation>,
}

impl CountryProfile {
    pub fn build(code: &str, data: &DashboardData) -> Self {
        let code = code.trim().to_uppercase();

        let tally = to_tallies(&data.medals_total)
            .into_iter()
            .find(|t| t.country_code.eq_ignore_ascii_case(&code));
        let medallists = rows_for_code(&data.medallists, columns::COUNTRY_CODE_STRICT, &code);
        let athletes = rows_for_code(&data.athletes, columns::COUNTRY_CODE_STRICT, &code);

        let name = tally
            .as_ref()
            .map(|t| t.country.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| {
                medallists
                    .resolve(columns::COUNTRY_NAME)
                    .and_then(|idx| medallists.column(idx).find_map(|c| c.trimmed_text()))
            })
            .unwrap_or_else(|| code.clone());

        // Sports keyed by normalised name, labelled by the results file when one exists
        let mut sports: BTreeMap<String, Option<&str>> = BTreeMap::new();
        if let Some(idx) = medallists.resolve(columns::DISCIPLINE) {
            for discipline in medallists.column(idx).filter_map(|c| c.trimmed_text()) {
                sports.entry(normalize_sport(&discipline)).or_insert(None);
            }
        }
        for (sport, table) in data.results.iter() {
            if let Some(idx) = table.column_index(columns::PARTICIPANT_COUNTRY_CODE) {
                if table.column(idx).any(|c| cell_is_code(c, &code)) {
                    sports.insert(normalize_sport(sport), Some(sport.as_str()));
                }
            }
        }
        for (norm, label) in sports.iter_mut() {
            if label.is_none() {
                *label = data
                    .results
                    .keys()
                    .find(|k| normalize_sport(k) == *norm)
                    .map(String::as_str);
            }
        }

        let sports = sports
            .into_iter()
            .map(|(norm, key)| {
                let label = key.map(str::to_string).unwrap_or_else(|| title_case(&norm));
                let results = key.and_then(|k| data.results.get(k));
                SportParticipation {
                    participants: participants_for(results, &athletes, &code, &label),
                    medals: medal_summary_for_sport(&data.medallists, &code, &label),
                    opponents: results.map(|r| extract_opponents(r, &code)).unwrap_or_default(),
                    sport: label,
                }
            })
            .collect();

        CountryProfile {
            name,
            tally,
            athletes: athletes.len(),
            medallist_rows: medallists.len(),
            sports,
            code,
        }
    }
}

/// Participants from the results table, else athletes listing the sport
fn participants_for(results: Option<&Table>, athletes: &Table, code: &str, sport: &str) -> Vec<Participant> {
    let mut participants = Vec::new();

    if let Some(results) = results {
        if let (Some(country_idx), Some(name_idx)) = (
            results.column_index(columns::PARTICIPANT_COUNTRY_CODE),
            results.column_index(columns::PARTICIPANT_NAME),
        ) {
            let type_idx = results.column_index(columns::PARTICIPANT_TYPE);
            for row in results.rows().iter().filter(|r| cell_is_code(&r[country_idx], code)) {
                participants.push(Participant {
                    name: row[name_idx].trimmed_text().unwrap_or_default(),
                    kind: type_idx
                        .and_then(|idx| row[idx].trimmed_text())
                        .unwrap_or_default(),
                });
            }
        }
    }

    if participants.is_empty() {
        if let (Some(disc_idx), Some(name_idx)) = (
            athletes.column_index("disciplines"),
            athletes.resolve(columns::ATHLETE_NAME),
        ) {
            let gender_idx = athletes.resolve(columns::GENDER);
            let wanted = sport.to_lowercase();
            for row in athletes.rows() {
                let listed = row[disc_idx]
                    .as_text()
                    .map_or(false, |d| d.to_lowercase().contains(&wanted));
                if listed {
                    participants.push(Participant {
                        name: row[name_idx].trimmed_text().unwrap_or_default(),
                        kind: gender_idx
                            .and_then(|idx| row[idx].trimmed_text())
                            .unwrap_or_default(),
                    });
                }
            }
        }
    }

    let mut seen = BTreeSet::new();
    participants.retain(|p| seen.insert((p.name.clone(), p.kind.clone())));
    participants
}

// ============================================================================
// COMPARISON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySide {
    pub code: String,
    pub name: String,
    pub medals: MedalDistribution,
    pub athletes: usize,
    pub average_age: Option<f64>,
    pub gender_split: BTreeMap<String, usize>,
    pub top_disciplines: Vec<(String, usize)>,
}

impl CountrySide {
    fn build(code: &str, data: &DashboardData) -> Self {
        let code = code.trim().to_uppercase();
        let medals = rows_for_code(&data.medals, columns::COUNTRY_CODE_STRICT, &code);
        let athletes = rows_for_code(&data.athletes, columns::COUNTRY_CODE_STRICT, &code);

        let mut distribution = MedalDistribution::default();
        if let Some(idx) = medals.resolve(columns::MEDAL_TYPE) {
            for medal in medals.column(idx).filter_map(MedalType::from_cell) {
                match medal {
                    MedalType::Gold => distribution.gold += 1,
                    MedalType::Silver => distribution.silver += 1,
                    MedalType::Bronze => distribution.bronze += 1,
                }
            }
        }

        let mut by_discipline: BTreeMap<String, usize> = BTreeMap::new();
        if let Some(idx) = medals.resolve(columns::DISCIPLINE) {
            for discipline in medals.column(idx).filter_map(|c| c.trimmed_text()) {
                *by_discipline.entry(discipline).or_insert(0) += 1;
            }
        }
        let mut top_disciplines: Vec<(String, usize)> = by_discipline.into_iter().collect();
        top_disciplines.sort_by(|a, b| b.1.cmp(&a.1));
        top_disciplines.truncate(TOP_DISCIPLINES);

        let name = [&medals, &athletes]
            .iter()
            .find_map(|t| {
                t.resolve(columns::COUNTRY_NAME)
                    .and_then(|idx| t.column(idx).find_map(|c| c.trimmed_text()))
            })
            .unwrap_or_else(|| code.clone());

        CountrySide {
            name,
            medals: distribution,
            athletes: athletes.len(),
            average_age: crate::analytics::age_statistics(&athletes).map(|s| s.mean),
            gender_split: crate::analytics::gender_distribution(&athletes),
            top_disciplines,
            code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub first: CountrySide,
    pub second: CountrySide,
}

impl Comparison {
    /// Side ahead on golds, then on total medals; None on a full tie
    pub fn leader(&self) -> Option<&CountrySide> {
        let key = |side: &CountrySide| (side.medals.gold, side.medals.total());
        match key(&self.first).cmp(&key(&self.second)) {
            Ordering::Greater => Some(&self.first),
            Ordering::Less => Some(&self.second),
            Ordering::Equal => None,
        }
    }
}

pub fn compare_countries(first: &str, second: &str, data: &DashboardData) -> Comparison {
    Comparison {
        first: CountrySide::build(first, data),
        second: CountrySide::build(second, data),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::olympics_start_date;
    use std::sync::Arc;

    fn create_test_results() -> Table {
        Table::from_rows(
            vec!["stage_code".into(), "participant_country_code".into(), "participant_name".into(), "participant_type".into()],
            vec![
                vec!["JUDM60-R16".into(), "FRA".into(), "Luka Mkheidze".into(), "Person".into()],
                vec!["JUDM60-R16".into(), "JPN".into(), "Ryuju Nagayama".into(), "Person".into()],
                vec!["JUDM60-FNL".into(), "FRA".into(), "Luka Mkheidze".into(), "Person".into()],
                vec!["JUDM60-FNL".into(), "KAZ".into(), "Yeldos Smetov".into(), "Person".into()],
                vec!["JUDM60-FNL".into(), "KAZ".into(), "Yeldos Smetov".into(), "Person".into()],
            ],
        )
    }

    fn create_test_data() -> DashboardData {
        let medals_total = Table::from_rows(
            vec!["country_code".into(), "Gold Medal".into(), "Silver Medal".into(), "Bronze Medal".into()],
            vec![
                vec!["FRA".into(), Cell::Int(16), Cell::Int(26), Cell::Int(22)],
                vec!["JPN".into(), Cell::Int(20), Cell::Int(12), Cell::Int(13)],
            ],
        );
        let nocs = Table::from_rows(
            vec!["code".into(), "country".into()],
            vec![vec!["FRA".into(), "France".into()], vec!["JPN".into(), "Japan".into()]],
        );
        let medallists = Table::from_rows(
            vec!["name".into(), "country_code".into(), "country".into(), "medal_type".into(), "discipline".into()],
            vec![
                vec!["Teddy Riner".into(), "FRA".into(), "France".into(), "Gold Medal".into(), "Judo".into()],
                vec!["Clarisse Agbegnenou".into(), "FRA".into(), "France".into(), "Gold".into(), "Judo".into()],
                vec!["Leon Marchand".into(), "FRA".into(), "France".into(), "Gold Medal".into(), "Swimming".into()],
                vec!["Uta Abe".into(), "JPN".into(), "Japan".into(), "Silver Medal".into(), "Judo".into()],
            ],
        );
        let medals = Table::from_rows(
            vec!["medal_type".into(), "country_code".into(), "country".into(), "discipline".into()],
            vec![
                vec!["Gold Medal".into(), "FRA".into(), "France".into(), "Judo".into()],
                vec!["Gold Medal".into(), "FRA".into(), "France".into(), "Swimming".into()],
                vec!["Bronze Medal".into(), "FRA".into(), "France".into(), "Judo".into()],
                vec!["Gold Medal".into(), "JPN".into(), "Japan".into(), "Judo".into()],
                vec!["Gold Medal".into(), "JPN".into(), "Japan".into(), "Wrestling".into()],
                vec!["Silver Medal".into(), "JPN".into(), "Japan".into(), "Judo".into()],
            ],
        );
        let athletes = Table::from_rows(
            vec!["name".into(), "gender".into(), "country_code".into(), "birth_date".into(), "disciplines".into()],
            vec![
                vec!["Teddy Riner".into(), "male".into(), "FRA".into(), "1989-04-07".into(), "['Judo']".into()],
                vec!["Leon Marchand".into(), "male".into(), "FRA".into(), "2002-05-17".into(), "['Swimming']".into()],
                vec!["Uta Abe".into(), "female".into(), "JPN".into(), "2000-07-14".into(), "['Judo']".into()],
            ],
        );

        let mut results = BTreeMap::new();
        results.insert("Judo".to_string(), create_test_results());

        DashboardData {
            athletes,
            medals,
            medallists,
            medals_total,
            nocs,
            results: Arc::new(results),
            ..DashboardData::default()
        }
        .prepared(olympics_start_date())
    }

    #[test]
    fn test_medal_summary_for_sport() {
        let data = create_test_data();

        let judo = medal_summary_for_sport(&data.medallists, "FRA", "judo").unwrap();
        assert_eq!(judo.gold, 2);
        assert_eq!(judo.total, 2);
        assert!(medal_summary_for_sport(&data.medallists, "FRA", "Fencing").is_none());
    }

    #[test]
    fn test_extract_opponents() {
        let opponents = extract_opponents(&create_test_results(), "FRA");

        assert_eq!(opponents.len(), 2);
        assert_eq!(opponents[0].opponent_countries, vec!["JPN"]);
        assert_eq!(opponents[1].stage_code, "JUDM60-FNL");
        assert_eq!(opponents[1].opponent_names, vec!["Yeldos Smetov"]);
        assert!(extract_opponents(&Table::default(), "FRA").is_empty());
    }

    #[test]
    fn test_country_profile() {
        let profile = CountryProfile::build("fra", &create_test_data());

        assert_eq!(profile.code, "FRA");
        assert_eq!(profile.name, "France");
        assert_eq!(profile.tally.as_ref().map(|t| t.total), Some(64));
        assert_eq!(profile.athletes, 2);
        assert_eq!(profile.medallist_rows, 3);

        let sports: Vec<&str> = profile.sports.iter().map(|s| s.sport.as_str()).collect();
        assert_eq!(sports, vec!["Judo", "Swimming"]);

        let judo = &profile.sports[0];
        assert_eq!(judo.participants.len(), 1);
        assert_eq!(judo.participants[0].name, "Luka Mkheidze");
        assert_eq!(judo.opponents.len(), 2);

        // No results file: participants come from the athlete list
        let swimming = &profile.sports[1];
        assert_eq!(swimming.participants[0].name, "Leon Marchand");
        assert_eq!(swimming.medals.map(|m| m.gold), Some(1));
    }

    #[test]
    fn test_unknown_country_profile() {
        let profile = CountryProfile::build("XYZ", &create_test_data());

        assert_eq!(profile.name, "XYZ");
        assert!(profile.tally.is_none());
        assert!(profile.sports.is_empty());
    }

    #[test]
    fn test_compare_countries() {
        let comparison = compare_countries("FRA", "JPN", &create_test_data());

        assert_eq!(comparison.first.medals.gold, 2);
        assert_eq!(comparison.first.medals.bronze, 1);
        assert_eq!(comparison.second.medals.silver, 1);
        assert_eq!(comparison.first.top_disciplines[0], ("Judo".to_string(), 2));
        assert_eq!(comparison.second.gender_split["Female"], 1);
        assert!(comparison.second.average_age.is_some());

        // Equal golds; France has the same total too
        assert!(comparison.leader().is_none());
    }

    #[test]
    fn test_compare_leader_on_total() {
        let mut data = create_test_data();
        data.medals = data.medals.filter(|row| row[1].as_text().as_deref() != Some("JPN") || row[0].as_text().as_deref() != Some("Silver Medal"));

        let comparison = compare_countries("FRA", "JPN", &data);
        assert_eq!(comparison.leader().map(|s| s.code.as_str()), Some("FRA"));
    }
}

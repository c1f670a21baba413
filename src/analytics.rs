// 📈 Analytics - chart-ready summaries over filtered tables
//
// Every function is total: empty input gives an empty (or zeroed) result.

use crate::aggregator::CountryMedalTally;
use crate::athletes::parse_date;
use crate::columns;
use crate::continents::continent_of;
use crate::filters::MedalType;
use crate::table::Table;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// MEDAL TABLE SUMMARIES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedalDistribution {
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
}

impl MedalDistribution {
    pub fn total(&self) -> i64 {
        self.gold + self.silver + self.bronze
    }

    pub fn count(&self, medal: MedalType) -> i64 {
        match medal {
            MedalType::Gold => self.gold,
            MedalType::Silver => self.silver,
            MedalType::Bronze => self.bronze,
        }
    }

    /// Fraction of all medals, 0 when there are none
    pub fn share(&self, medal: MedalType) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(medal) as f64 / total as f64,
        }
    }

    /// Ties resolve towards the more valuable medal
    pub fn most_common(&self) -> Option<MedalType> {
        if self.total() == 0 {
            return None;
        }
        MedalType::ALL
            .into_iter()
            .rev()
            .max_by_key(|m| self.count(*m))
    }
}

pub fn medal_distribution(tallies: &[CountryMedalTally]) -> MedalDistribution {
    tallies.iter().fold(MedalDistribution::default(), |acc, t| MedalDistribution {
        gold: acc.gold + t.gold,
        silver: acc.silver + t.silver,
        bronze: acc.bronze + t.bronze,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinentStat {
    pub continent: String,
    pub countries: usize,
    pub gold: i64,
    pub silver: i64,
    pub bronze: i64,
    pub total: i64,
}

/// Medals per continent, most golds first
pub fn continent_stats(tallies: &[CountryMedalTally]) -> Vec<ContinentStat> {
    let mut by_continent: BTreeMap<&str, ContinentStat> = BTreeMap::new();

    for t in tallies {
        let stat = by_continent
            .entry(t.continent.as_str())
            .or_insert_with(|| ContinentStat {
                continent: t.continent.clone(),
                countries: 0,
                gold: 0,
                silver: 0,
                bronze: 0,
                total: 0,
            });
        stat.countries += 1;
        stat.gold += t.gold;
        stat.silver += t.silver;
        stat.bronze += t.bronze;
        stat.total += t.total;
    }

    let mut stats: Vec<ContinentStat> = by_continent.into_values().collect();
    stats.sort_by(|a, b| b.gold.cmp(&a.gold).then(b.total.cmp(&a.total)));
    stats
}

pub fn top_countries(tallies: &[CountryMedalTally], n: usize) -> Vec<CountryMedalTally> {
    let mut sorted = tallies.to_vec();
    sorted.sort_by(|a, b| b.total.cmp(&a.total));
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallySummary {
    pub countries: usize,
    pub total_medals: i64,
    pub leader: Option<String>,
    pub mean_medals: f64,
    pub median_medals: f64,
}

pub fn tally_summary(tallies: &[CountryMedalTally]) -> TallySummary {
    let totals: Vec<f64> = tallies.iter().map(|t| t.total as f64).collect();

    TallySummary {
        countries: tallies.len(),
        total_medals: tallies.iter().map(|t| t.total).sum(),
        leader: top_countries(tallies, 1).into_iter().next().map(|t| t.country),
        mean_medals: mean(&totals).unwrap_or(0.0),
        median_medals: median(&totals).unwrap_or(0.0),
    }
}

// ============================================================================
// MEDAL ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AthleteMedalCount {
    pub name: String,
    pub country_code: String,
    pub medals: usize,
    pub gold: usize,
    pub silver: usize,
    pub bronze: usize,
}

/// Athletes with the most medallist rows, with per-type breakdown
pub fn top_athletes(medallists: &Table, n: usize) -> Vec<AthleteMedalCount> {
    let name_idx = match medallists.resolve(columns::ATHLETE_NAME) {
        Some(idx) => idx,
        None => return Vec::new(),
    };
    let code_idx = medallists.resolve(columns::COUNTRY_CODE_STRICT);
    let medal_idx = medallists.resolve(columns::MEDAL_TYPE);

    let mut counts: HashMap<(String, String), AthleteMedalCount> = HashMap::new();
    for row in medallists.rows() {
        let name = match row[name_idx].trimmed_text() {
            Some(name) => name,
            None => continue,
        };
        let code = code_idx
            .and_then(|idx| row[idx].trimmed_text())
            .unwrap_or_default();

        let entry = counts
            .entry((name.clone(), code.clone()))
            .or_insert_with(|| AthleteMedalCount {
                name,
                country_code: code,
                medals: 0,
                gold: 0,
                silver: 0,
                bronze: 0,
            });
        entry.medals += 1;
        match medal_idx.and_then(|idx| MedalType::from_cell(&row[idx])) {
            Some(MedalType::Gold) => entry.gold += 1,
            Some(MedalType::Silver) => entry.silver += 1,
            Some(MedalType::Bronze) => entry.bronze += 1,
            None => {}
        }
    }

    let mut athletes: Vec<AthleteMedalCount> = counts.into_values().collect();
    athletes.sort_by(|a, b| {
        b.medals
            .cmp(&a.medals)
            .then(b.gold.cmp(&a.gold))
            .then(a.name.cmp(&b.name))
    });
    athletes.truncate(n);
    athletes
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub continent: String,
    pub country: String,
    pub sport: String,
    pub medal_count: usize,
}

/// Continent → country → sport medal counts for drill-down charts
pub fn medal_hierarchy(medals: &Table) -> Vec<HierarchyNode> {
    let sport_idx = match medals.resolve(columns::DISCIPLINE) {
        Some(idx) => idx,
        None => return Vec::new(),
    };
    let code_idx = medals.resolve(columns::COUNTRY_CODE_STRICT);
    let name_idx = medals.resolve(columns::COUNTRY_NAME).or(code_idx);
    let continent_idx = medals.column_index(columns::CONTINENT);

    let mut counts: BTreeMap<(String, String, String), usize> = BTreeMap::new();
    for row in medals.rows() {
        let country = name_idx.and_then(|i| row[i].trimmed_text());
        let (country, sport) = match (country, row[sport_idx].trimmed_text()) {
            (Some(country), Some(sport)) => (country, sport),
            _ => continue,
        };
        let continent = continent_idx
            .and_then(|i| row[i].trimmed_text())
            .unwrap_or_else(|| {
                let code = code_idx.and_then(|i| row[i].trimmed_text()).unwrap_or_default();
                continent_of(&code).to_string()
            });

        *counts.entry((continent, country, sport)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((continent, country, sport), medal_count)| HierarchyNode {
            continent,
            country,
            sport,
            medal_count,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub daily: usize,
    pub cumulative: usize,
}

/// Medals per day plus running total; rows without a parseable date are skipped
pub fn medal_timeline(medals: &Table) -> Vec<TimelinePoint> {
    let idx = match medals.resolve(columns::MEDAL_DATE) {
        Some(idx) => idx,
        None => return Vec::new(),
    };

    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for cell in medals.column(idx) {
        if let Some(date) = cell.as_text().and_then(|raw| parse_date(&raw)) {
            *daily.entry(date).or_insert(0) += 1;
        }
    }

    let mut cumulative = 0;
    daily
        .into_iter()
        .map(|(date, count)| {
            cumulative += count;
            TimelinePoint {
                date,
                daily: count,
                cumulative,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Efficiency {
    pub country_code: String,
    pub athletes: usize,
    pub medals: usize,
    pub efficiency: f64,
}

/// Medal rows per athlete, by country, best first
pub fn medal_efficiency(medals: &Table, athletes: &Table) -> Vec<Efficiency> {
    let count_by = |table: &Table| -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        if let Some(idx) = table.resolve(columns::COUNTRY_CODE_STRICT) {
            for code in table.column(idx).filter_map(|c| c.trimmed_text()) {
                *counts.entry(code).or_insert(0) += 1;
            }
        }
        counts
    };

    if medals.is_empty() || athletes.is_empty() {
        return Vec::new();
    }

    let medal_counts = count_by(medals);
    let mut efficiency: Vec<Efficiency> = count_by(athletes)
        .into_iter()
        .map(|(country_code, athletes)| {
            let medals = medal_counts.get(&country_code).copied().unwrap_or(0);
            Efficiency {
                efficiency: medals as f64 / athletes as f64,
                country_code,
                athletes,
                medals,
            }
        })
        .collect();

    efficiency.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
    efficiency
}

// ============================================================================
// DEMOGRAPHICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; None below two values
    pub std: Option<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn describe(ages: &[f64]) -> Option<AgeStats> {
    let mean_age = mean(ages)?;
    let std = if ages.len() > 1 {
        let var = ages.iter().map(|a| (a - mean_age).powi(2)).sum::<f64>() / (ages.len() - 1) as f64;
        Some(var.sqrt())
    } else {
        None
    };

    Some(AgeStats {
        count: ages.len(),
        mean: mean_age,
        median: median(ages)?,
        min: ages.iter().copied().fold(f64::INFINITY, f64::min),
        max: ages.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std,
    })
}

fn valid_age(age: f64) -> bool {
    age > 0.0 && age < 100.0
}

/// Age statistics over plausible ages (0 < age < 100)
pub fn age_statistics(athletes: &Table) -> Option<AgeStats> {
    let idx = athletes.column_index(columns::AGE)?;
    let ages: Vec<f64> = athletes
        .column(idx)
        .filter_map(|c| c.as_f64())
        .filter(|a| valid_age(*a))
        .collect();
    describe(&ages)
}

/// Age statistics per value of the first present `group_by` column
pub fn age_statistics_by(athletes: &Table, group_by: &[&str]) -> BTreeMap<String, AgeStats> {
    let (age_idx, group_idx) = match (athletes.column_index(columns::AGE), athletes.resolve(group_by)) {
        (Some(a), Some(g)) => (a, g),
        _ => return BTreeMap::new(),
    };

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in athletes.rows() {
        if let (Some(group), Some(age)) = (row[group_idx].trimmed_text(), row[age_idx].as_f64()) {
            if valid_age(age) {
                groups.entry(group).or_default().push(age);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|(group, ages)| describe(&ages).map(|stats| (group, stats)))
        .collect()
}

/// Row count per gender value
pub fn gender_distribution(table: &Table) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    if let Some(idx) = table.resolve(columns::GENDER) {
        for gender in table.column(idx).filter_map(|c| c.trimmed_text()) {
            *counts.entry(gender).or_insert(0) += 1;
        }
    }
    counts
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn create_test_tallies() -> Vec<CountryMedalTally> {
        vec![
            CountryMedalTally::new("France".into(), "FRA".into(), "Europe".into(), 16, 26, 22),
            CountryMedalTally::new("United States".into(), "USA".into(), "North America".into(), 40, 44, 42),
            CountryMedalTally::new("Great Britain".into(), "GBR".into(), "Europe".into(), 14, 22, 29),
            CountryMedalTally::new("China".into(), "CHN".into(), "Asia".into(), 40, 27, 24),
        ]
    }

    fn create_test_medals() -> Table {
        Table::from_rows(
            vec!["name".into(), "country_code".into(), "country".into(), "medal_type".into(), "discipline".into(), "medal_date".into()],
            vec![
                vec!["Leon".into(), "FRA".into(), "France".into(), "Gold Medal".into(), "Swimming".into(), "2024-07-28".into()],
                vec!["Leon".into(), "FRA".into(), "France".into(), "Gold Medal".into(), "Swimming".into(), "2024-07-31".into()],
                vec!["Leon".into(), "FRA".into(), "France".into(), "Bronze Medal".into(), "Swimming".into(), "2024-07-31".into()],
                vec!["Teddy".into(), "FRA".into(), "France".into(), "Gold Medal".into(), "Judo".into(), "2024-08-02".into()],
                vec!["Katie".into(), "USA".into(), "United States".into(), "Gold Medal".into(), "Swimming".into(), Cell::Null],
            ],
        )
    }

    #[test]
    fn test_medal_distribution() {
        let dist = medal_distribution(&create_test_tallies());

        assert_eq!(dist.gold, 110);
        assert_eq!(dist.total(), 346);
        assert_eq!(dist.most_common(), Some(MedalType::Silver));
        assert!((dist.share(MedalType::Gold) - 110.0 / 346.0).abs() < 1e-9);
        assert_eq!(medal_distribution(&[]).most_common(), None);
    }

    #[test]
    fn test_most_common_tie_prefers_gold() {
        let dist = MedalDistribution { gold: 3, silver: 3, bronze: 1 };
        assert_eq!(dist.most_common(), Some(MedalType::Gold));
    }

    #[test]
    fn test_continent_stats_sorted_by_gold() {
        let stats = continent_stats(&create_test_tallies());

        assert_eq!(stats[0].continent, "North America");
        assert_eq!(stats[1].continent, "Asia");
        assert_eq!(stats[2].continent, "Europe");
        assert_eq!(stats[2].countries, 2);
        assert_eq!(stats[2].total, 129);
    }

    #[test]
    fn test_top_countries_and_summary() {
        let top = top_countries(&create_test_tallies(), 2);
        assert_eq!(top[0].country_code, "USA");
        assert_eq!(top[1].country_code, "CHN");

        let summary = tally_summary(&create_test_tallies());
        assert_eq!(summary.leader.as_deref(), Some("United States"));
        assert_eq!(summary.median_medals, 78.0);
        assert_eq!(tally_summary(&[]).leader, None);
    }

    #[test]
    fn test_top_athletes() {
        let athletes = top_athletes(&create_test_medals(), 2);

        assert_eq!(athletes.len(), 2);
        assert_eq!(athletes[0].name, "Leon");
        assert_eq!(athletes[0].medals, 3);
        assert_eq!(athletes[0].gold, 2);
        assert_eq!(athletes[0].bronze, 1);
        // One gold each: name order breaks the tie
        assert_eq!(athletes[1].name, "Katie");
    }

    #[test]
    fn test_medal_hierarchy() {
        let nodes = medal_hierarchy(&create_test_medals());

        assert_eq!(nodes.len(), 3);
        let swimming = nodes
            .iter()
            .find(|n| n.country == "France" && n.sport == "Swimming")
            .unwrap();
        assert_eq!(swimming.continent, "Europe");
        assert_eq!(swimming.medal_count, 3);
    }

    #[test]
    fn test_medal_timeline_cumulative() {
        let timeline = medal_timeline(&create_test_medals());

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[1].daily, 2);
        assert_eq!(timeline[2].cumulative, 4);
    }

    #[test]
    fn test_medal_efficiency() {
        let athletes = Table::from_rows(
            vec!["country_code".into()],
            vec![vec!["FRA".into()], vec!["FRA".into()], vec!["USA".into()], vec!["KEN".into()]],
        );
        let efficiency = medal_efficiency(&create_test_medals(), &athletes);

        assert_eq!(efficiency[0].country_code, "FRA");
        assert_eq!(efficiency[0].efficiency, 2.0);
        assert_eq!(efficiency.last().unwrap().country_code, "KEN");
        assert_eq!(efficiency.last().unwrap().medals, 0);
    }

    #[test]
    fn test_age_statistics() {
        let athletes = Table::from_rows(
            vec!["age".into(), "gender".into()],
            vec![
                vec![Cell::Int(20), "Male".into()],
                vec![Cell::Int(30), "Female".into()],
                vec![Cell::Int(25), "Female".into()],
                vec![Cell::Int(150), "Male".into()],
                vec![Cell::Null, "Male".into()],
            ],
        );

        let stats = age_statistics(&athletes).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 25.0);
        assert_eq!(stats.median, 25.0);
        assert_eq!(stats.min, 20.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.std, Some(5.0));

        let by_gender = age_statistics_by(&athletes, columns::GENDER);
        assert_eq!(by_gender["Female"].count, 2);
        assert_eq!(by_gender["Male"].std, None);

        assert_eq!(gender_distribution(&athletes)["Male"], 3);
        assert!(age_statistics(&Table::default()).is_none());
    }
}

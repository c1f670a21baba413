// 🎯 Filter Engine - One selection, applied to any table
//
// Every filter is an independent row predicate; a row survives when all
// active predicates hold. Columns are sniffed once per table.

use crate::columns;
use crate::continents::add_continent;
use crate::table::{Cell, Table};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Sentinel meaning "unconstrained" in multi-select inputs
pub const ALL: &str = "All";

// ============================================================================
// MEDAL TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MedalType {
    Gold,
    Silver,
    Bronze,
}

impl MedalType {
    pub const ALL: [MedalType; 3] = [MedalType::Gold, MedalType::Silver, MedalType::Bronze];

    /// Bare label, also the canonical tally column name
    pub fn as_str(&self) -> &'static str {
        match self {
            MedalType::Gold => columns::GOLD,
            MedalType::Silver => columns::SILVER,
            MedalType::Bronze => columns::BRONZE,
        }
    }

    /// Label in the "Gold Medal" convention
    pub fn suffixed(&self) -> String {
        format!("{} Medal", self.as_str())
    }

    /// Numeric medal code (1 = gold)
    pub fn code(&self) -> i64 {
        match self {
            MedalType::Gold => 1,
            MedalType::Silver => 2,
            MedalType::Bronze => 3,
        }
    }

    /// Parse either convention ("Gold", "Gold Medal") or a medal code
    pub fn from_label(raw: &str) -> Option<MedalType> {
        let lower = raw.trim().to_lowercase();
        let base = lower.strip_suffix(" medal").unwrap_or(&lower).trim();

        match base {
            "gold" | "1" => Some(MedalType::Gold),
            "silver" | "2" => Some(MedalType::Silver),
            "bronze" | "3" => Some(MedalType::Bronze),
            _ => None,
        }
    }

    pub fn from_cell(cell: &Cell) -> Option<MedalType> {
        cell.as_text().and_then(|label| MedalType::from_label(&label))
    }
}

impl fmt::Display for MedalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MedalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MedalType::from_label(s).ok_or_else(|| format!("unknown medal type: {}", s))
    }
}

// ============================================================================
// GENDER
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    All,
    Male,
    Female,
    Mixed,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::All => ALL,
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Mixed => "Mixed",
        }
    }

    pub fn is_all(&self) -> bool {
        *self == Gender::All
    }

    /// Compare against a raw gender value, trimmed and title-cased
    pub fn matches(&self, raw: &str) -> bool {
        self.is_all() || title_case(raw.trim()) == self.as_str()
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match title_case(s.trim()).as_str() {
            "" | ALL => Ok(Gender::All),
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Mixed" => Ok(Gender::Mixed),
            _ => Err(format!("unknown gender: {}", s)),
        }
    }
}

/// Upper-case the first letter of each alphabetic run, lower-case the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_alpha = false;

    for ch in s.chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(ch);
            previous_alpha = false;
        }
    }

    out
}

// ============================================================================
// SELECTION
// ============================================================================

/// Multi-select value: unconstrained, or a non-empty set of accepted values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    /// Build from raw picks. "All" next to other picks is dropped and an
    /// empty pick list means unconstrained, never "match nothing".
    pub fn from_values<I, S>(values: I) -> Selection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut picked: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        if picked.len() > 1 {
            picked.remove(ALL);
        }

        if picked.is_empty() || picked.contains(ALL) {
            Selection::All
        } else {
            Selection::Only(picked)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => values.contains(value),
        }
    }

    pub fn values(&self) -> Option<&BTreeSet<String>> {
        match self {
            Selection::All => None,
            Selection::Only(values) => Some(values),
        }
    }

    fn admits(&self, cell: &Cell) -> bool {
        cell.trimmed_text().map_or(false, |v| self.contains(&v))
    }
}

/// Inclusive age bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    min: i64,
    max: i64,
}

impl AgeRange {
    pub fn new(a: i64, b: i64) -> Self {
        AgeRange {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, age: f64) -> bool {
        age >= self.min as f64 && age <= self.max as f64
    }
}

// ============================================================================
// FILTER SELECTION
// ============================================================================

/// The active query. Built fresh for every evaluation; `default()` is the reset state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub continents: Selection,
    pub countries: Selection,
    pub sports: Selection,
    medal_types: BTreeSet<MedalType>,
    pub gender: Gender,
    pub age_range: Option<AgeRange>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        FilterSelection {
            continents: Selection::All,
            countries: Selection::All,
            sports: Selection::All,
            medal_types: MedalType::ALL.into_iter().collect(),
            gender: Gender::All,
            age_range: None,
        }
    }
}

impl FilterSelection {
    pub fn with_continents<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.continents = Selection::from_values(values);
        self
    }

    pub fn with_countries<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.countries = Selection::from_values(values);
        self
    }

    pub fn with_sports<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sports = Selection::from_values(values);
        self
    }

    /// Unticking every medal box means all medal types
    pub fn with_medal_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = MedalType>,
    {
        let picked: BTreeSet<MedalType> = types.into_iter().collect();
        self.medal_types = if picked.is_empty() {
            MedalType::ALL.into_iter().collect()
        } else {
            picked
        };
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_age_range(mut self, min: i64, max: i64) -> Self {
        self.age_range = Some(AgeRange::new(min, max));
        self
    }

    /// Back to the unconstrained defaults
    pub fn reset(&mut self) {
        *self = FilterSelection::default();
    }

    pub fn medal_types(&self) -> &BTreeSet<MedalType> {
        &self.medal_types
    }

    pub fn narrows_medal_types(&self) -> bool {
        self.medal_types.len() < MedalType::ALL.len()
    }

    /// Gender/age live only on athlete-level rows
    pub fn has_athlete_filters(&self) -> bool {
        !self.gender.is_all() || self.age_range.is_some()
    }

    /// Continent, country or gender constraints
    pub fn has_participation_filters(&self) -> bool {
        !self.continents.is_all() || !self.countries.is_all() || !self.gender.is_all()
    }

    /// Only the continent/country/gender part of this selection
    pub fn participation_scope(&self) -> FilterSelection {
        FilterSelection {
            continents: self.continents.clone(),
            countries: self.countries.clone(),
            gender: self.gender,
            ..FilterSelection::default()
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == FilterSelection::default()
    }

    /// Short labels for the active constraints
    pub fn active_filters(&self) -> Vec<String> {
        let mut labels = Vec::new();

        if let Some(values) = self.continents.values() {
            labels.push(format!("{} Continents", values.len()));
        }
        if let Some(values) = self.countries.values() {
            labels.push(format!("{} Countries", values.len()));
        }
        if let Some(values) = self.sports.values() {
            labels.push(format!("{} Sports", values.len()));
        }
        if self.narrows_medal_types() {
            let names: Vec<&str> = self.medal_types.iter().map(MedalType::as_str).collect();
            labels.push(names.join(", "));
        }
        if !self.gender.is_all() {
            labels.push(self.gender.as_str().to_string());
        }
        if let Some(range) = self.age_range {
            labels.push(format!("Age {}-{}", range.min(), range.max()));
        }

        labels
    }
}

// ============================================================================
// FILTER ENGINE
// ============================================================================

/// How medal information is laid out in a table
#[derive(Debug, Clone, Copy)]
enum MedalShape {
    /// Gold/Silver/Bronze count columns
    Aggregated { gold: usize, silver: usize, bronze: usize },
    /// One medal label per row
    PerRecord(usize),
    Absent,
}

/// Column positions resolved once for a table
struct FilterPlan<'s> {
    selection: &'s FilterSelection,
    continent: Option<usize>,
    country: Option<usize>,
    sport: Option<usize>,
    medal: MedalShape,
    gender: Option<usize>,
    age: Option<usize>,
}

impl<'s> FilterPlan<'s> {
    fn resolve(table: &Table, selection: &'s FilterSelection) -> Self {
        let medal = match (
            table.column_index(columns::GOLD),
            table.column_index(columns::SILVER),
            table.column_index(columns::BRONZE),
        ) {
            (Some(gold), Some(silver), Some(bronze)) => MedalShape::Aggregated { gold, silver, bronze },
            _ => table
                .resolve(columns::MEDAL_TYPE)
                .map(MedalShape::PerRecord)
                .unwrap_or(MedalShape::Absent),
        };

        FilterPlan {
            selection,
            continent: table.column_index(columns::CONTINENT),
            country: table.resolve(columns::COUNTRY),
            sport: table.resolve(columns::SPORT),
            medal,
            gender: table.resolve(columns::GENDER),
            age: table.column_index(columns::AGE),
        }
    }

    fn keeps(&self, row: &[Cell]) -> bool {
        let s = self.selection;

        if let (false, Some(idx)) = (s.continents.is_all(), self.continent) {
            if !s.continents.admits(&row[idx]) {
                return false;
            }
        }

        if let (false, Some(idx)) = (s.countries.is_all(), self.country) {
            if !s.countries.admits(&row[idx]) {
                return false;
            }
        }

        if let (false, Some(idx)) = (s.sports.is_all(), self.sport) {
            if !s.sports.admits(&row[idx]) {
                return false;
            }
        }

        match self.medal {
            MedalShape::Aggregated { gold, silver, bronze } => {
                let selected: f64 = s
                    .medal_types
                    .iter()
                    .map(|m| match m {
                        MedalType::Gold => gold,
                        MedalType::Silver => silver,
                        MedalType::Bronze => bronze,
                    })
                    .map(|idx| row[idx].as_f64().unwrap_or(0.0))
                    .sum();
                if selected <= 0.0 {
                    return false;
                }
            }
            MedalShape::PerRecord(idx) => {
                let matched = MedalType::from_cell(&row[idx])
                    .map_or(false, |m| s.medal_types.contains(&m));
                if !matched {
                    return false;
                }
            }
            MedalShape::Absent => {}
        }

        if let (false, Some(idx)) = (s.gender.is_all(), self.gender) {
            let matched = row[idx].as_text().map_or(false, |g| s.gender.matches(&g));
            if !matched {
                return false;
            }
        }

        if let (Some(range), Some(idx)) = (s.age_range, self.age) {
            if !row[idx].as_f64().map_or(false, |age| range.contains(age)) {
                return false;
            }
        }

        true
    }
}

/// Holds one selection and applies it to any table
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    selection: FilterSelection,
}

impl FilterEngine {
    pub fn new(selection: FilterSelection) -> Self {
        FilterEngine { selection }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn apply(&self, table: &Table) -> Table {
        apply(table, &self.selection)
    }
}

/// Apply a selection to a table, returning the surviving rows
///
/// The continent column is derived first when a continent constraint is
/// active, so later predicates can rely on it. Empty in, empty out.
pub fn apply(table: &Table, selection: &FilterSelection) -> Table {
    if table.is_empty() {
        return table.clone();
    }

    let prepared: Cow<'_, Table> = if selection.continents.is_all() {
        Cow::Borrowed(table)
    } else {
        Cow::Owned(add_continent(table, "country_code"))
    };

    let plan = FilterPlan::resolve(&prepared, selection);
    prepared.filter(|row| plan.keeps(row))
}

// ============================================================================
// TESTS
// ============================================================================

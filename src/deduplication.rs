// 🔍 Deduplication Engine - One team medal, many medallist rows
// A relay squad of four produces four medallist rows but one medal.
// Rows sharing country, medal type, discipline and event collapse to the first.

use crate::columns;
use crate::filters::MedalType;
use crate::table::{Cell, Table};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMedal {
    /// Row that represents the medal
    pub kept_index: usize,

    /// Row collapsed into it
    pub duplicate_index: usize,

    /// Human-readable key
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeduplicationReport {
    pub input_rows: usize,
    pub unique_medals: usize,
    pub collapsed_rows: usize,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

/// Resolved key columns for one table; None means the part is absent
struct KeyColumns {
    parts: [Option<usize>; 5],
    medal: Option<usize>,
}

pub struct DeduplicationEngine {
    pub country_code: &'static [&'static str],
    pub country: &'static [&'static str],
    pub medal_type: &'static [&'static str],
    pub discipline: &'static [&'static str],
    pub event: &'static [&'static str],
}

impl DeduplicationEngine {
    /// Key on (country_code, country, medal_type, discipline, event)
    pub fn new() -> Self {
        DeduplicationEngine {
            country_code: columns::COUNTRY_CODE_STRICT,
            country: columns::COUNTRY_NAME,
            medal_type: columns::MEDAL_TYPE,
            discipline: columns::DISCIPLINE,
            event: columns::EVENT,
        }
    }

    fn key_columns(&self, table: &Table) -> KeyColumns {
        let medal = table.resolve(self.medal_type);
        KeyColumns {
            parts: [
                table.resolve(self.country_code),
                table.resolve(self.country),
                medal,
                table.resolve(self.discipline),
                table.resolve(self.event),
            ],
            medal,
        }
    }

    /// Medal identity of one row. Missing cells still form a key, so such
    /// rows only collapse with rows missing the same parts.
    fn medal_key(&self, keys: &KeyColumns, row: &[Cell]) -> Vec<String> {
        keys.parts
            .iter()
            .map(|part| match part {
                None => String::new(),
                Some(idx) if Some(*idx) == keys.medal => MedalType::from_cell(&row[*idx])
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| row[*idx].key()),
                Some(idx) => row[*idx].key(),
            })
            .collect()
    }

    /// Every row that repeats an earlier row's medal
    pub fn find_duplicates(&self, table: &Table) -> Vec<DuplicateMedal> {
        let keys = self.key_columns(table);
        let mut first_seen: HashMap<Vec<String>, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (i, row) in table.rows().iter().enumerate() {
            let key = self.medal_key(&keys, row);
            match first_seen.get(&key) {
                Some(&kept) => duplicates.push(DuplicateMedal {
                    kept_index: kept,
                    duplicate_index: i,
                    reason: format!(
                        "Same medal: {}",
                        key.iter()
                            .filter(|k| !k.is_empty())
                            .map(|k| k.replace('\u{0}', "?"))
                            .collect::<Vec<_>>()
                            .join(" | ")
                    ),
                }),
                None => {
                    first_seen.insert(key, i);
                }
            }
        }

        duplicates
    }

    /// One row per medal, first occurrence kept, original order preserved
    pub fn deduplicate(&self, table: &Table) -> (Table, DeduplicationReport) {
        let keys = self.key_columns(table);
        let mut seen = HashSet::new();

        let unique = table.filter(|row| seen.insert(self.medal_key(&keys, row)));
        let report = DeduplicationReport {
            input_rows: table.len(),
            unique_medals: unique.len(),
            collapsed_rows: table.len() - unique.len(),
        };

        (unique, report)
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse team-event rows with the default key
pub fn deduplicate_team_medals(table: &Table) -> Table {
    DeduplicationEngine::new().deduplicate(table).0
}

// ============================================================================
// TESTS
// ============================================================================

// 🏅 Medal Normalizer - canonical medal/country column names
//
// Source tables say "Gold Medal", "gold", "GOLD_count", "NOC", "code"...
// Everything downstream reads Gold/Silver/Bronze/Total/country_code/country.

use crate::aggregator::CountryMedalTally;
use crate::columns;
use crate::continents::continent_of;
use crate::filters::MedalType;
use crate::table::{Cell, Table};
use std::collections::{BTreeMap, HashMap};

const CODE_ALIASES: &[&str] = &["code", "noc", "NOC"];

/// Renames needed to reach canonical names; targets never collide with an existing column
fn plan_renames(table: &Table) -> BTreeMap<usize, String> {
    let cols = table.columns();
    let lower: Vec<String> = cols.iter().map(|c| c.trim().to_lowercase()).collect();
    let mut renames: BTreeMap<usize, String> = BTreeMap::new();

    let claim = |idx: usize, target: &str, renames: &mut BTreeMap<usize, String>| {
        if cols[idx] != target && !renames.contains_key(&idx) {
            renames.insert(idx, target.to_string());
        }
    };

    if !table.has_column(columns::TOTAL) {
        if let Some(idx) = lower.iter().position(|c| c == "total") {
            claim(idx, columns::TOTAL, &mut renames);
        }
    }

    for medal in MedalType::ALL {
        let target = medal.as_str();
        if table.has_column(target) {
            continue;
        }
        let needle = target.to_lowercase();
        let found = lower
            .iter()
            .enumerate()
            .find(|(idx, c)| c.contains(&needle) && !renames.contains_key(idx))
            .map(|(idx, _)| idx);
        if let Some(idx) = found {
            claim(idx, target, &mut renames);
        }
    }

    if !table.has_column("country_code") {
        if let Some(idx) = cols.iter().position(|c| CODE_ALIASES.contains(&c.as_str())) {
            if !renames.contains_key(&idx) {
                claim(idx, "country_code", &mut renames);
            }
        }
    }

    if !table.has_column("country") {
        if let Some(idx) = lower.iter().position(|c| c == "country") {
            if !renames.contains_key(&idx) {
                claim(idx, "country", &mut renames);
            }
        }
    }

    renames
}

fn sum_cells(cells: &[&Cell]) -> Cell {
    let ints: Option<Vec<i64>> = cells.iter().map(|c| c.as_i64()).collect();
    match ints {
        Some(values) => Cell::Int(values.iter().sum()),
        None => Cell::Float(cells.iter().map(|c| c.as_f64().unwrap_or(0.0)).sum()),
    }
}

/// Canonicalise medal and country column names, fill a missing Total,
/// sort descending by Total. Applying it twice changes nothing.
pub fn normalize(table: &Table) -> Table {
    let renames = plan_renames(table);
    let mut normalized = if renames.is_empty() {
        table.clone()
    } else {
        table.renamed(&renames)
    };

    if !normalized.has_column(columns::TOTAL) {
        if let (Some(g), Some(s), Some(b)) = (
            normalized.column_index(columns::GOLD),
            normalized.column_index(columns::SILVER),
            normalized.column_index(columns::BRONZE),
        ) {
            normalized = normalized.with_column(columns::TOTAL, |row| sum_cells(&[&row[g], &row[s], &row[b]]));
        }
    }

    match normalized.column_index(columns::TOTAL) {
        Some(idx) => normalized.sorted_desc_by(idx),
        None => normalized,
    }
}

/// Fill a `country` column from a NOC reference table when it is missing
pub fn attach_country_names(table: &Table, nocs: &Table) -> Table {
    if table.has_column("country") {
        return table.clone();
    }

    let (code_idx, noc_code, noc_name) = match (
        table.resolve(columns::COUNTRY_CODE_STRICT),
        nocs.resolve(&["code", "country_code"]),
        nocs.resolve(columns::COUNTRY_NAME),
    ) {
        (Some(c), Some(nc), Some(nn)) => (c, nc, nn),
        _ => return table.clone(),
    };

    let names: HashMap<String, Cell> = nocs
        .rows()
        .iter()
        .filter_map(|row| row[noc_code].trimmed_text().map(|code| (code, row[noc_name].clone())))
        .collect();

    table.with_column("country", |row| {
        row[code_idx]
            .trimmed_text()
            .and_then(|code| names.get(&code).cloned())
            .unwrap_or(Cell::Null)
    })
}

/// Typed tally rows from a canonical table; Total is recomputed
pub fn to_tallies(table: &Table) -> Vec<CountryMedalTally> {
    let count = |cell: Option<&Cell>| -> i64 {
        cell.and_then(Cell::as_f64).map(|v| v.round() as i64).unwrap_or(0)
    };

    table
        .records()
        .map(|row| {
            let country_code = row.text(columns::COUNTRY_CODE).unwrap_or_default();
            let country = row
                .text(columns::COUNTRY_NAME)
                .unwrap_or_else(|| country_code.clone());
            let continent = row
                .text(&[columns::CONTINENT])
                .unwrap_or_else(|| continent_of(&country_code).to_string());

            CountryMedalTally::new(
                country,
                country_code,
                continent,
                count(row.get(columns::GOLD)),
                count(row.get(columns::SILVER)),
                count(row.get(columns::BRONZE)),
            )
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

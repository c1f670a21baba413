// 🌍 Continent Mapper - NOC code → continent
//
// The lookup is assembled from one block per continent. A code listed in two
// blocks is a data bug: the first block keeps it and the conflict is recorded
// (and logged) when the registry is built.

use crate::columns;
use crate::table::{Cell, Table};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

pub const UNKNOWN: &str = "Unknown";

// ============================================================================
// STATIC TABLE
// ============================================================================

const EUROPE: &[&str] = &[
    "ALB", "AND", "ARM", "AUT", "AZE", "BLR", "BEL", "BIH", "BUL", "CRO", "CYP", "CZE",
    "DEN", "ESP", "EST", "FIN", "FRA", "GBR", "GEO", "GER", "GRE", "HUN", "IRL", "ISL",
    "ISR", "ITA", "KOS", "LAT", "LIE", "LTU", "LUX", "MDA", "MKD", "MLT", "MON", "MNE",
    "NED", "NOR", "POL", "POR", "ROU", "RUS", "SRB", "SVK", "SLO", "SMR", "SUI", "SWE",
    "TUR", "UKR",
];

const ASIA: &[&str] = &[
    "AFG", "BAN", "BRN", "BHU", "BRU", "CAM", "CHN", "TPE", "HKG", "IND", "INA", "IRI",
    "IRQ", "JOR", "JPN", "KAZ", "KGZ", "KOR", "KSA", "KUW", "LAO", "LBN", "MAS", "MDV",
    "MGL", "MYA", "NEP", "OMA", "PAK", "PLE", "PHI", "PRK", "QAT", "SGP", "SRI", "SYR",
    "TJK", "THA", "TLS", "TKM", "UAE", "UZB", "VIE", "YEM",
];

const AFRICA: &[&str] = &[
    "ALG", "ANG", "BEN", "BOT", "BUR", "BDI", "CMR", "CPV", "CAF", "CHA", "CGO", "COM",
    "CIV", "COD", "DJI", "EGY", "GEQ", "ERI", "ETH", "GAB", "GAM", "GHA", "GUI", "GBS",
    "KEN", "LES", "LBR", "LBA", "MAD", "MAW", "MLI", "MRI", "MTN", "MAR", "MOZ", "NAM",
    "NIG", "NGR", "RWA", "STP", "SEN", "SEY", "SLE", "SOM", "RSA", "SSD", "SUD", "SWZ",
    "TAN", "TOG", "TUN", "UGA", "ZAM", "ZIM",
];

const NORTH_AMERICA: &[&str] = &[
    "ANT", "ARU", "BAH", "BAR", "BIZ", "BER", "CAN", "CAY", "CRC", "CUB", "DMA", "DOM",
    "ESA", "GRN", "GUA", "HAI", "HON", "JAM", "MEX", "NCA", "PAN", "PUR", "SKN", "LCA",
    "VIN", "TTO", "USA", "ISV", "IVB",
];

const SOUTH_AMERICA: &[&str] = &[
    "ARG", "BOL", "BRA", "CHI", "COL", "ECU", "GUY", "PAR", "PER", "SUR", "URU", "VEN",
];

const OCEANIA: &[&str] = &[
    "ASA", "AUS", "COK", "FIJ", "GUM", "KIR", "MHL", "FSM", "NRU", "NZL", "PLW", "PNG",
    "SAM", "SOL", "TGA", "TUV", "VAN",
];

pub const CONTINENT_BLOCKS: &[(&str, &[&str])] = &[
    ("Europe", EUROPE),
    ("Asia", ASIA),
    ("Africa", AFRICA),
    ("North America", NORTH_AMERICA),
    ("South America", SOUTH_AMERICA),
    ("Oceania", OCEANIA),
];

static REGISTRY: Lazy<ContinentRegistry> = Lazy::new(|| {
    let registry = ContinentRegistry::from_blocks(CONTINENT_BLOCKS);
    for conflict in registry.conflicts() {
        warn!(
            code = %conflict.code,
            kept = conflict.kept,
            ignored = conflict.ignored,
            "country code listed under two continents"
        );
    }
    registry
});

// ============================================================================
// REGISTRY
// ============================================================================

/// A code that appeared in more than one continent block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinentConflict {
    pub code: String,
    pub kept: &'static str,
    pub ignored: &'static str,
}

#[derive(Debug, Clone)]
pub struct ContinentRegistry {
    by_code: HashMap<String, &'static str>,
    conflicts: Vec<ContinentConflict>,
}

impl ContinentRegistry {
    /// Build from continent blocks; first block wins on duplicate codes
    pub fn from_blocks(blocks: &[(&'static str, &[&'static str])]) -> Self {
        let mut by_code: HashMap<String, &'static str> = HashMap::new();
        let mut conflicts = Vec::new();

        for (continent, codes) in blocks {
            for code in codes.iter() {
                let code = code.trim().to_uppercase();
                match by_code.get(&code) {
                    Some(existing) if existing != continent => conflicts.push(ContinentConflict {
                        code,
                        kept: *existing,
                        ignored: *continent,
                    }),
                    Some(_) => {}
                    None => {
                        by_code.insert(code, *continent);
                    }
                }
            }
        }

        ContinentRegistry { by_code, conflicts }
    }

    /// Shared registry built from the static table
    pub fn global() -> &'static ContinentRegistry {
        &REGISTRY
    }

    pub fn continent_of(&self, code: &str) -> &'static str {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return UNKNOWN;
        }
        self.by_code.get(&code).copied().unwrap_or(UNKNOWN)
    }

    pub fn countries_in(&self, continent: &str) -> BTreeSet<String> {
        self.by_code
            .iter()
            .filter(|(_, c)| **c == continent)
            .map(|(code, _)| code.clone())
            .collect()
    }

    /// Sorted distinct continent names
    pub fn continents(&self) -> Vec<&'static str> {
        let set: BTreeSet<&'static str> = self.by_code.values().copied().collect();
        set.into_iter().collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(&code.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn conflicts(&self) -> &[ContinentConflict] {
        &self.conflicts
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Continent for a NOC code; "Unknown" for misses and blank input
pub fn continent_of(code: &str) -> &'static str {
    ContinentRegistry::global().continent_of(code)
}

/// Continent for a cell; Null maps to "Unknown"
pub fn continent_of_cell(cell: &Cell) -> &'static str {
    cell.as_text()
        .map(|code| continent_of(&code))
        .unwrap_or(UNKNOWN)
}

pub fn countries_in(continent: &str) -> BTreeSet<String> {
    ContinentRegistry::global().countries_in(continent)
}

pub fn all_continents() -> Vec<&'static str> {
    ContinentRegistry::global().continents()
}

pub fn is_known_code(code: &str) -> bool {
    ContinentRegistry::global().contains(code)
}

/// Copy of `table` with a `continent` column mapped from `country_column`
///
/// Falls back to the usual country code column names when `country_column`
/// is absent. Returns the input unchanged when no code column is found or a
/// continent column already exists.
pub fn add_continent(table: &Table, country_column: &str) -> Table {
    if table.has_column(columns::CONTINENT) {
        return table.clone();
    }

    let source = table
        .column_index(country_column)
        .or_else(|| table.resolve(columns::COUNTRY_CODE));

    match source {
        Some(idx) => table.with_column(columns::CONTINENT, |row| {
            Cell::from(continent_of_cell(&row[idx]))
        }),
        None => table.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continent_of_normalizes_code() {
        assert_eq!(continent_of("FRA"), "Europe");
        assert_eq!(continent_of(" usa "), "North America");
        assert_eq!(continent_of("ken"), "Africa");
    }

    #[test]
    fn test_continent_of_unknown() {
        assert_eq!(continent_of("XYZ"), UNKNOWN);
        assert_eq!(continent_of(""), UNKNOWN);
        assert_eq!(continent_of_cell(&Cell::Null), UNKNOWN);
    }

    #[test]
    fn test_is_known_code() {
        assert!(is_known_code("FRA"));
        assert!(is_known_code(" fra "));
        assert!(!is_known_code("XYZ"));
        assert!(!is_known_code(""));
    }

    #[test]
    fn test_static_table_has_no_duplicate_codes() {
        let registry = ContinentRegistry::from_blocks(CONTINENT_BLOCKS);
        assert!(registry.conflicts().is_empty(), "{:?}", registry.conflicts());
        assert!(registry.len() > 200);
        assert_eq!(registry.continent_of("RSA"), "Africa");
    }

    #[test]
    fn test_duplicate_codes_are_flagged_first_wins() {
        let blocks: &[(&str, &[&str])] = &[("Europe", &["RSA", "FRA"][..]), ("Africa", &["RSA"][..])];
        let registry = ContinentRegistry::from_blocks(blocks);

        assert_eq!(registry.continent_of("RSA"), "Europe");
        assert_eq!(
            registry.conflicts(),
            &[ContinentConflict {
                code: "RSA".to_string(),
                kept: "Europe",
                ignored: "Africa",
            }]
        );
    }

    #[test]
    fn test_countries_in_inverts_table() {
        let oceania = countries_in("Oceania");
        assert!(oceania.contains("AUS"));
        assert!(oceania.contains("NZL"));
        assert!(!oceania.contains("FRA"));
        assert!(countries_in("Atlantis").is_empty());
    }

    #[test]
    fn test_all_continents_sorted() {
        assert_eq!(
            all_continents(),
            vec!["Africa", "Asia", "Europe", "North America", "Oceania", "South America"]
        );
    }

    #[test]
    fn test_add_continent_uses_fallback_column() {
        let table = Table::from_rows(
            vec!["noc".into(), "Gold".into()],
            vec![vec!["JPN".into(), Cell::Int(20)], vec!["XYZ".into(), Cell::Int(1)]],
        );
        let result = add_continent(&table, "country_code");

        let idx = result.column_index("continent").unwrap();
        assert_eq!(result.rows()[0][idx], Cell::from("Asia"));
        assert_eq!(result.rows()[1][idx], Cell::from("Unknown"));
        // Input untouched
        assert!(!table.has_column("continent"));
    }

    #[test]
    fn test_add_continent_without_code_column_is_noop() {
        let table = Table::from_rows(vec!["sport".into()], vec![vec!["Judo".into()]]);
        assert_eq!(add_continent(&table, "country_code"), table);
        assert_eq!(add_continent(&Table::default(), "country_code"), Table::default());
    }
}

// 🏃 Athlete Preparation - cleanup + derived age
//
// Runs once per load: exact duplicate rows dropped, gender title-cased,
// `age` derived from `birth_date` against the opening ceremony date.

use crate::columns;
use crate::filters::title_case;
use crate::table::{Cell, RowView, Table};
use chrono::NaiveDate;
use serde::Serialize;

/// Ages outside (0, MAX_AGE] are treated as bad birth dates
pub const MAX_AGE: i64 = 100;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

// ============================================================================
// DERIVATION
// ============================================================================

/// Parse a calendar date; a trailing time part ("2000-01-01 00:00:00") is ignored
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(|c: char| c == ' ' || c == 'T').next()?;

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Whole years (365-day) between birth and `reference`, None when implausible
pub fn derive_age(birth: NaiveDate, reference: NaiveDate) -> Option<i64> {
    let days = (reference - birth).num_days();
    let age = days.div_euclid(365);

    if age <= 0 || age > MAX_AGE {
        None
    } else {
        Some(age)
    }
}

fn age_cell(cell: &Cell, reference: NaiveDate) -> Cell {
    cell.as_text()
        .and_then(|raw| parse_date(&raw))
        .and_then(|birth| derive_age(birth, reference))
        .into()
}

/// Clean an athletes table and attach `age`
pub fn prepare_athletes(table: &Table, start_date: NaiveDate) -> Table {
    let mut prepared = table.distinct();

    if let Some(idx) = table.resolve(columns::GENDER) {
        prepared = prepared.with_column(&table.columns()[idx], |row| match &row[idx] {
            Cell::Text(raw) => Cell::Text(title_case(raw.trim())),
            other => other.clone(),
        });
    }

    add_age(&prepared, start_date)
}

/// Copy of `table` with `age` derived from `birth_date`; unchanged without one
pub fn add_age(table: &Table, start_date: NaiveDate) -> Table {
    match table.column_index(columns::BIRTH_DATE) {
        Some(idx) => table.with_column(columns::AGE, |row| age_cell(&row[idx], start_date)),
        None => table.clone(),
    }
}

// ============================================================================
// TYPED RECORDS
// ============================================================================

/// Parse list-like strings such as `['Athletics', 'Swimming']`
pub fn parse_disciplines(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|part| part.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteRecord {
    pub code: Option<String>,
    pub name: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub age: Option<i64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub disciplines: Vec<String>,
}

impl AthleteRecord {
    fn from_row(row: RowView<'_>) -> Self {
        let birth_date = row
            .get(columns::BIRTH_DATE)
            .and_then(Cell::as_text)
            .and_then(|raw| parse_date(&raw));

        AthleteRecord {
            code: row.text(columns::ATHLETE_CODE),
            name: row.text(columns::ATHLETE_NAME),
            country_code: row.text(columns::COUNTRY_CODE_STRICT),
            country: row.text(columns::COUNTRY_NAME),
            gender: row.text(columns::GENDER),
            birth_date,
            age: row.get(columns::AGE).and_then(Cell::as_i64),
            height: row.get("height").and_then(Cell::as_f64).filter(|h| *h > 0.0),
            weight: row.get("weight").and_then(Cell::as_f64).filter(|w| *w > 0.0),
            disciplines: row
                .get("disciplines")
                .and_then(Cell::as_text)
                .map(|raw| parse_disciplines(&raw))
                .unwrap_or_default(),
        }
    }

    /// One record per row; best effort, missing fields are None
    pub fn from_table(table: &Table) -> Vec<AthleteRecord> {
        table.records().map(AthleteRecord::from_row).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::olympics_start_date;

    fn create_test_athletes() -> Table {
        Table::from_rows(
            vec![
                "code".into(),
                "name".into(),
                "gender".into(),
                "country_code".into(),
                "birth_date".into(),
                "disciplines".into(),
            ],
            vec![
                vec![Cell::Int(1), "Leon".into(), " male".into(), "FRA".into(), "2002-08-10".into(), "['Swimming']".into()],
                vec![Cell::Int(1), "Leon".into(), " male".into(), "FRA".into(), "2002-08-10".into(), "['Swimming']".into()],
                vec![Cell::Int(2), "Simone".into(), "FEMALE".into(), "USA".into(), "1997-03-14".into(), "['Artistic Gymnastics']".into()],
                vec![Cell::Int(3), "Ghost".into(), Cell::Null, "XYZ".into(), "1900-01-01".into(), Cell::Null],
                vec![Cell::Int(4), "Future".into(), "Female".into(), "JPN".into(), "2030-01-01".into(), Cell::Null],
                vec![Cell::Int(5), "Nobody".into(), "Male".into(), "KEN".into(), "not a date".into(), Cell::Null],
            ],
        )
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2000, 1, 31);
        assert_eq!(parse_date("2000-01-31"), expected);
        assert_eq!(parse_date("01/31/2000"), expected);
        assert_eq!(parse_date("2000-01-31 00:00:00"), expected);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_derive_age_floors_whole_years() {
        let start = olympics_start_date();
        // 22 years minus fifteen days
        let birth = NaiveDate::from_ymd_opt(2002, 8, 10).unwrap();
        assert_eq!(derive_age(birth, start), Some(21));

        let birth = NaiveDate::from_ymd_opt(1997, 3, 14).unwrap();
        assert_eq!(derive_age(birth, start), Some(27));
    }

    #[test]
    fn test_derive_age_sentinels() {
        let start = olympics_start_date();
        assert_eq!(derive_age(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(), start), None);
        assert_eq!(derive_age(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), start), None);
        assert_eq!(derive_age(start, start), None);
    }

    #[test]
    fn test_prepare_athletes() {
        let prepared = prepare_athletes(&create_test_athletes(), olympics_start_date());

        assert_eq!(prepared.len(), 5);
        let gender = prepared.column_index("gender").unwrap();
        let age = prepared.column_index("age").unwrap();

        assert_eq!(prepared.rows()[0][gender], Cell::from("Male"));
        assert_eq!(prepared.rows()[1][gender], Cell::from("Female"));
        assert_eq!(prepared.rows()[2][gender], Cell::Null);

        let ages: Vec<Cell> = prepared.column(age).cloned().collect();
        assert_eq!(ages, vec![Cell::Int(21), Cell::Int(27), Cell::Null, Cell::Null, Cell::Null]);
    }

    #[test]
    fn test_prepare_without_birth_date_keeps_columns() {
        let table = Table::from_rows(vec!["name".into()], vec![vec!["A".into()]]);
        let prepared = prepare_athletes(&table, olympics_start_date());
        assert_eq!(prepared, table);
    }

    #[test]
    fn test_add_age_keeps_every_row() {
        let medallists = Table::from_rows(
            vec!["name".into(), "birth_date".into()],
            vec![
                vec!["Relay".into(), "2002-08-10".into()],
                vec!["Relay".into(), "2002-08-10".into()],
                vec!["Unknown".into(), Cell::Null],
            ],
        );
        let with_age = add_age(&medallists, olympics_start_date());

        let idx = with_age.column_index("age").unwrap();
        let ages: Vec<Cell> = with_age.column(idx).cloned().collect();
        assert_eq!(ages, vec![Cell::Int(21), Cell::Int(21), Cell::Null]);
    }

    #[test]
    fn test_parse_disciplines() {
        assert_eq!(parse_disciplines("['Athletics', 'Swimming']"), vec!["Athletics", "Swimming"]);
        assert_eq!(parse_disciplines("Judo"), vec!["Judo"]);
        assert!(parse_disciplines("[]").is_empty());
    }

    #[test]
    fn test_athlete_records() {
        let prepared = prepare_athletes(&create_test_athletes(), olympics_start_date());
        let records = AthleteRecord::from_table(&prepared);

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].code.as_deref(), Some("1"));
        assert_eq!(records[0].country_code.as_deref(), Some("FRA"));
        assert_eq!(records[0].age, Some(21));
        assert_eq!(records[1].disciplines, vec!["Artistic Gymnastics"]);
        assert_eq!(records[4].birth_date, None);
    }
}

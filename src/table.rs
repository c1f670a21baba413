// 📋 Table - Loosely-schemaed tabular data
// Rows of typed cells addressed by column name. Every transform returns a new table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

// ============================================================================
// CELL
// ============================================================================

/// One value of a table. CSV text is typed per cell when read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

/// Only digits, signs, a decimal point or an exponent, and no zero padding
fn looks_numeric(s: &str) -> bool {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let bytes = unsigned.as_bytes();

    let padded = bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit();
    let digits = bytes.iter().any(u8::is_ascii_digit);
    let charset = bytes
        .iter()
        .all(|b| b.is_ascii_digit() || matches!(*b, b'.' | b'e' | b'E' | b'-' | b'+'));

    digits && charset && !padded
}

impl Cell {
    /// Type a raw CSV field: empty → Null, integer → Int, float → Float, else Text
    ///
    /// Only plain decimal literals become numbers. Words such as "NaN" or
    /// "inf" and zero-padded codes such as "007" stay Text, so they survive
    /// a write back to CSV unchanged.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Cell::Null;
        }
        if !looks_numeric(trimmed) {
            return Cell::Text(raw.to_string());
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }

        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Cell::Float(f),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Cell::Float(_) => None,
            Cell::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Text rendering used for matching against user selections (None for Null)
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Text rendering, trimmed, with Null and blank text collapsed to None
    pub fn trimmed_text(&self) -> Option<String> {
        self.as_text()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Grouping key: distinguishes Null from empty text
    pub fn key(&self) -> String {
        match self {
            Cell::Null => "\u{0}".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

// ============================================================================
// ROW VIEW
// ============================================================================

/// Borrowed view of one row with by-name access
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> RowView<'a> {
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }

    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.cells.get(idx))
    }

    /// First non-null value among candidate columns
    pub fn first_of(&self, candidates: &[&str]) -> Option<&'a Cell> {
        candidates
            .iter()
            .filter_map(|name| self.get(name))
            .find(|cell| !cell.is_null())
    }

    pub fn text(&self, candidates: &[&str]) -> Option<String> {
        self.first_of(candidates).and_then(Cell::trimmed_text)
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor: `Table::with_columns(["country_code", "Gold"])`
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table::new(columns.into_iter().map(Into::into).collect())
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, padding with Null or truncating to the column count
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Resolve a semantic field to the first candidate column present
    pub fn resolve(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|name| self.column_index(name))
    }

    pub fn records(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |cells| RowView {
            columns: &self.columns,
            cells,
        })
    }

    /// All values of one column, in row order
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Keep rows satisfying the predicate
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }

    /// Add (or replace) a column computed from each row
    pub fn with_column<F>(&self, name: &str, compute: F) -> Table
    where
        F: Fn(&[Cell]) -> Cell,
    {
        let mut result = self.clone();

        match self.column_index(name) {
            Some(idx) => {
                for row in result.rows.iter_mut() {
                    let value = compute(row);
                    row[idx] = value;
                }
            }
            None => {
                result.columns.push(name.to_string());
                for row in result.rows.iter_mut() {
                    let value = compute(row);
                    row.push(value);
                }
            }
        }

        result
    }

    /// Rename columns by position
    pub fn renamed(&self, renames: &BTreeMap<usize, String>) -> Table {
        let mut result = self.clone();
        for (idx, name) in renames {
            if let Some(column) = result.columns.get_mut(*idx) {
                *column = name.clone();
            }
        }
        result
    }

    /// Stable sort by a numeric column, descending, Null last
    pub fn sorted_desc_by(&self, idx: usize) -> Table {
        let mut result = self.clone();
        result.rows.sort_by(|a, b| {
            match (a[idx].as_f64(), b[idx].as_f64()) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        result
    }

    /// Drop exact duplicate rows, keeping the first occurrence
    pub fn distinct(&self) -> Table {
        let mut seen = HashSet::new();
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| seen.insert(row.iter().map(Cell::key).collect::<Vec<_>>()))
                .cloned()
                .collect(),
        }
    }

    // ========================================================================
    // CSV
    // ========================================================================

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut table = Table::new(columns);

        for (line_num, result) in reader.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to parse CSV line {}", line_num + 2))?;
            table.push_row(record.iter().map(Cell::parse).collect());
        }

        Ok(table)
    }

    pub fn from_csv_path(path: &Path) -> Result<Table> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        Table::from_csv_reader(file)
            .with_context(|| format!("Failed to load CSV: {}", path.display()))
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

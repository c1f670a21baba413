// 💾 Tally export - CSV with a header row, UTF-8

use crate::aggregator::CountryMedalTally;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const EXPORT_HEADER: &str = "country,country_code,continent,Gold,Silver,Bronze,Total";

/// Serialize tallies as CSV; the header row is written even for an empty tally
pub fn write_tally_csv<W: Write>(tallies: &[CountryMedalTally], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(EXPORT_HEADER.split(','))
        .context("Failed to write CSV header")?;
    for tally in tallies {
        wtr.serialize(tally)
            .with_context(|| format!("Failed to write row for {}", tally.country_code))?;
    }
    wtr.flush().context("Failed to flush CSV output")?;

    Ok(())
}

pub fn tally_to_csv_string(tallies: &[CountryMedalTally]) -> Result<String> {
    let mut buffer = Vec::new();
    write_tally_csv(tallies, &mut buffer)?;
    String::from_utf8(buffer).context("CSV output is not valid UTF-8")
}

pub fn export_tally(tallies: &[CountryMedalTally], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_tally_csv(tallies, file)
        .with_context(|| format!("Failed to export tally to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn test_csv_layout() {
        let tallies = vec![CountryMedalTally::new(
            "Côte d'Ivoire".into(),
            "CIV".into(),
            "Africa".into(),
            0,
            0,
            1,
        )];

        let csv = tally_to_csv_string(&tallies).unwrap();
        assert_eq!(
            csv,
            "country,country_code,continent,Gold,Silver,Bronze,Total\nCôte d'Ivoire,CIV,Africa,0,0,1,1\n"
        );
    }

    #[test]
    fn test_empty_tally_still_has_header() {
        assert_eq!(tally_to_csv_string(&[]).unwrap(), format!("{}\n", EXPORT_HEADER));
    }

    #[test]
    fn test_export_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.csv");
        let tallies = vec![
            CountryMedalTally::new("United States".into(), "USA".into(), "North America".into(), 40, 44, 42),
            CountryMedalTally::new("France, Republic of".into(), "FRA".into(), "Europe".into(), 16, 26, 22),
        ];

        export_tally(&tallies, &path).unwrap();
        let table = Table::from_csv_path(&path).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][0].as_text().as_deref(), Some("France, Republic of"));
        assert_eq!(table.rows()[0][6].as_i64(), Some(126));
    }
}

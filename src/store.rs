//! Flat-file copy of parsed readings.
//!
//! One `;`-separated row per reading, under the header
//! `date;type;total;usage;cum_hours;hours`. Rows end with a trailing `;`.

use std::{
    fs::File,
    io,
    num::ParseIntError,
    path::{Path, PathBuf},
};

use csv::StringRecord;
use miette::Diagnostic;
use thiserror::Error;
use time::Date;

use crate::reading::{format_date, parse_date, Reading};

pub const HEADER: [&str; 6] = ["date", "type", "total", "usage", "cum_hours", "hours"];

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("Could not access {path}")]
    #[diagnostic(code(fjernvarme::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    #[diagnostic(code(fjernvarme::store::csv))]
    Csv(#[from] csv::Error),
    #[error("Line {line}: expected 6 fields, found {found}")]
    #[diagnostic(code(fjernvarme::store::fields))]
    FieldCount { line: u64, found: usize },
    #[error("Line {line}: invalid date `{text}`")]
    #[diagnostic(code(fjernvarme::store::date))]
    Date {
        line: u64,
        text: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("Line {line}: invalid {column} `{text}`")]
    #[diagnostic(code(fjernvarme::store::integer))]
    Integer {
        line: u64,
        column: &'static str,
        text: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Could not format date")]
    #[diagnostic(code(fjernvarme::store::format))]
    Format(#[from] time::error::Format),
}

/// `fjernvarmedata_<yyyy-mm-dd>.csv`
pub fn default_file_name(today: Date) -> PathBuf {
    PathBuf::from(format!("fjernvarmedata_{today}.csv"))
}

/// Writes `readings` to `path`, replacing the file if it exists.
pub fn save(readings: &[Reading], path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write(readings, file)?;
    tracing::info!(path = %path.display(), rows = readings.len(), "readings saved");
    Ok(())
}

pub fn write<W: io::Write>(readings: &[Reading], writer: W) -> Result<(), StoreError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(writer);
    wtr.write_record(HEADER)?;

    for reading in readings {
        wtr.write_record([
            format_date(reading.date)?,
            reading.description.clone(),
            reading.total.to_string(),
            reading.usage.to_string(),
            reading.cumulative_hours.to_string(),
            reading.hours.to_string(),
            String::new(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<Reading>, StoreError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let readings = read(file)?;
    tracing::info!(path = %path.display(), rows = readings.len(), "readings loaded");
    Ok(readings)
}

/// Reads rows written by [`write`]. The header row and blank lines are skipped.
pub fn read<R: io::Read>(reader: R) -> Result<Vec<Reading>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut readings = Vec::new();
    for record in rdr.records() {
        readings.push(record_to_reading(&record?)?);
    }
    Ok(readings)
}

fn record_to_reading(record: &StringRecord) -> Result<Reading, StoreError> {
    let line = record.position().map_or(0, |p| p.line());

    // The trailing separator leaves one empty field behind.
    let found = match record.len() {
        n if n == HEADER.len() + 1 && record[HEADER.len()].is_empty() => HEADER.len(),
        n => n,
    };
    if found != HEADER.len() {
        return Err(StoreError::FieldCount { line, found });
    }

    let integer = |idx: usize| -> Result<i64, StoreError> {
        let text = record[idx].trim();
        text.parse().map_err(|source| StoreError::Integer {
            line,
            column: HEADER[idx],
            text: text.to_string(),
            source,
        })
    };

    let date = parse_date(record[0].trim()).map_err(|source| StoreError::Date {
        line,
        text: record[0].to_string(),
        source,
    })?;

    Ok(Reading {
        date,
        description: record[1].to_string(),
        total: integer(2)?,
        usage: integer(3)?,
        cumulative_hours: integer(4)?,
        hours: integer(5)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use time::macros::date;

    use super::*;

    fn readings() -> Vec<Reading> {
        vec![
            Reading {
                date: date!(2024 - 01 - 01),
                description: String::from("Mellemafl."),
                total: 12000,
                usage: 42,
                cumulative_hours: 50000,
                hours: 24,
            },
            Reading {
                date: date!(2023 - 12 - 31),
                description: String::from("Årsafl."),
                total: 11958,
                usage: 0,
                cumulative_hours: 49976,
                hours: 0,
            },
        ]
    }

    #[test]
    fn writes_the_expected_layout() {
        let mut out = Vec::new();
        write(&readings(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "date;type;total;usage;cum_hours;hours\n\
             01-01-2024;Mellemafl.;12000;42;50000;24;\n\
             31-12-2023;Årsafl.;11958;0;49976;0;\n"
        );
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");

        save(&readings(), &path).unwrap();
        assert_eq!(load(&path).unwrap(), readings());
    }

    #[test]
    fn save_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");

        save(&readings(), &path).unwrap();
        save(&readings()[..1], &path).unwrap();
        assert_eq!(load(&path).unwrap(), readings()[..1].to_vec());
    }

    #[test]
    fn skips_blank_lines() {
        let text = "date;type;total;usage;cum_hours;hours\n\n\
                    01-01-2024;Mellemafl.;1;2;3;4;\n\n";
        let loaded = read(text.as_bytes()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].hours, 4);
    }

    #[test]
    fn accepts_rows_without_trailing_separator() {
        let text = "date;type;total;usage;cum_hours;hours\n01-01-2024;x;1;2;3;4\n";
        assert_eq!(read(text.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn rejects_short_rows() {
        let text = "date;type;total;usage;cum_hours;hours\n01-01-2024;x;1;2\n";
        assert!(matches!(
            read(text.as_bytes()),
            Err(StoreError::FieldCount { line: 2, found: 4 })
        ));
    }

    #[test]
    fn rejects_bad_values() {
        let text = "date;type;total;usage;cum_hours;hours\n01-13-2024;x;1;2;3;4;\n";
        assert!(matches!(
            read(text.as_bytes()),
            Err(StoreError::Date { .. })
        ));

        let text = "date;type;total;usage;cum_hours;hours\n01-01-2024;x;1;;3;4;\n";
        assert!(matches!(
            read(text.as_bytes()),
            Err(StoreError::Integer { column: "usage", .. })
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.csv");
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn default_name_carries_the_date() {
        assert_eq!(
            default_file_name(date!(2024 - 05 - 17)),
            PathBuf::from("fjernvarmedata_2024-05-17.csv")
        );
    }
}

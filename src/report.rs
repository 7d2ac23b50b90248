use std::{collections::BTreeMap, fmt, num::ParseIntError, str::FromStr};

use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;
use time::Date;

use crate::reading::{parse_date, Reading};

/// Metadata key holding the meter number.
pub const METER_NUMBER_KEY: &str = "Målernummer";

/// Field count of a `key;value;` line.
pub const METADATA_FIELDS: usize = 3;
/// Field count of a reading line.
pub const READING_FIELDS: usize = 31;

const LINE_END: &str = "\r\n";

#[derive(Logos, Debug, PartialEq)]
enum Token {
    #[token(";")]
    Separator,
    #[regex("[^;]+")]
    Text,
}

/// Splits one report line into its `;`-separated fields, keeping empty ones.
pub fn fields(line: &str) -> Vec<&str> {
    let mut lexer = Token::lexer(line);
    let mut fields = Vec::new();
    let mut current = "";

    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Separator) => fields.push(std::mem::take(&mut current)),
            Ok(Token::Text) | Err(()) => current = lexer.slice(),
        }
    }
    fields.push(current);

    fields
}

/// Named positions inside a reading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    MeterNumber,
    Date,
    Description,
    Total,
    Usage,
    CumulativeHours,
    Hours,
}

impl Column {
    pub const fn index(self) -> usize {
        match self {
            Column::MeterNumber => 0,
            Column::Date => 1,
            Column::Description => 2,
            Column::Total => 3,
            Column::Usage => 4,
            Column::CumulativeHours => 10,
            Column::Hours => 11,
        }
    }

    /// Optional columns decode an empty field as 0.
    pub const fn is_optional(self) -> bool {
        matches!(self, Column::Usage | Column::Hours)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::MeterNumber => "meter number",
            Column::Date => "date",
            Column::Description => "description",
            Column::Total => "total",
            Column::Usage => "usage",
            Column::CumulativeHours => "cumulative hours",
            Column::Hours => "hours",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Line {line}: invalid date `{text}`")]
    #[diagnostic(code(fjernvarme::parse::date), help("dates are expected as dd-mm-yyyy"))]
    Date {
        line: usize,
        text: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("Line {line}: invalid {column} `{text}`")]
    #[diagnostic(code(fjernvarme::parse::integer))]
    Integer {
        line: usize,
        column: Column,
        text: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Line {line}: invalid meter number `{text}`")]
    #[diagnostic(code(fjernvarme::parse::meter_number))]
    MeterNumber { line: usize, text: String },
}

/// Free-form header values of a report. Later keys overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// `None` when absent or wider than a `u64`, the full value stays
    /// available under [`METER_NUMBER_KEY`].
    pub fn meter_number(&self) -> Option<u64> {
        self.get(METER_NUMBER_KEY)?.trim().parse().ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub metadata: Metadata,
    // In the order of the raw report
    pub readings: Vec<Reading>,
}

impl Report {
    /// Parses a raw provider report. Lines that are neither metadata nor
    /// readings are dropped, a bad value inside a reading fails the whole
    /// report.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut report = Report::default();
        if raw.is_empty() {
            return Ok(report);
        }

        for (idx, line) in raw.split(LINE_END).enumerate() {
            let line_number = idx + 1;
            let fields = fields(line);

            match fields.len() {
                METADATA_FIELDS => report.metadata.insert(fields[0], fields[1]),
                READING_FIELDS => {
                    let line = ReadingLine {
                        line: line_number,
                        fields,
                    };
                    if report.readings.is_empty() && !report.metadata.contains_key(METER_NUMBER_KEY)
                    {
                        let meter_number = line.meter_number()?;
                        report.metadata.insert(METER_NUMBER_KEY, meter_number);
                    }
                    report.readings.push(line.reading()?);
                }
                n => tracing::trace!(line = line_number, fields = n, "skipping line"),
            }
        }

        for (key, value) in report.metadata.iter() {
            tracing::debug!(key, value, "report metadata");
        }
        tracing::debug!(
            metadata = report.metadata.len(),
            readings = report.readings.len(),
            "parsed report"
        );
        Ok(report)
    }

    pub fn first_date(&self) -> Option<Date> {
        self.readings.first().map(|reading| reading.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.readings.last().map(|reading| reading.date)
    }
}

impl FromStr for Report {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct ReadingLine<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> ReadingLine<'a> {
    fn get(&self, column: Column) -> &'a str {
        self.fields[column.index()]
    }

    fn integer(&self, column: Column) -> Result<i64, ParseError> {
        let text = self.get(column).trim();
        if text.is_empty() && column.is_optional() {
            return Ok(0);
        }
        text.parse().map_err(|source| ParseError::Integer {
            line: self.line,
            column,
            text: text.to_string(),
            source,
        })
    }

    /// The meter number in canonical decimal form, of any length.
    fn meter_number(&self) -> Result<String, ParseError> {
        let text = self.get(Column::MeterNumber).trim();
        let (sign, digits) = match text.strip_prefix('-') {
            Some(digits) => ("-", digits),
            None => ("", text.strip_prefix('+').unwrap_or(text)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::MeterNumber {
                line: self.line,
                text: text.to_string(),
            });
        }

        let digits = digits.trim_start_matches('0');
        Ok(match digits {
            "" => String::from("0"),
            digits => format!("{sign}{digits}"),
        })
    }

    fn date(&self) -> Result<Date, ParseError> {
        let text = self.get(Column::Date);
        parse_date(text.trim()).map_err(|source| ParseError::Date {
            line: self.line,
            text: text.to_string(),
            source,
        })
    }

    fn reading(&self) -> Result<Reading, ParseError> {
        Ok(Reading {
            date: self.date()?,
            description: self.get(Column::Description).to_string(),
            total: self.integer(Column::Total)?,
            usage: self.integer(Column::Usage)?,
            cumulative_hours: self.integer(Column::CumulativeHours)?,
            hours: self.integer(Column::Hours)?,
        })
    }
}

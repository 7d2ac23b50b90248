use time::{macros::format_description, Date};

/// Description tag of a reading that closes a metering interval.
pub const SETTLEMENT_MARKER: &str = "Mellemafl.";

/// One row of the provider report, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub date: Date,
    pub description: String,
    /// Cumulative meter value.
    pub total: i64,
    /// Consumption over the period, 0 when the provider left it empty.
    pub usage: i64,
    /// Lifetime hours-run counter.
    pub cumulative_hours: i64,
    /// Hours covered by the period, 0 when the provider left it empty.
    pub hours: i64,
}

impl Reading {
    pub fn is_settlement(&self, marker: &str) -> bool {
        self.description == marker
    }
}

/// Parses a `dd-mm-yyyy` date. Day and month may omit their leading zero.
pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(
        s,
        format_description!("[day padding:none]-[month padding:none]-[year]"),
    )
}

/// Formats a date as `dd-mm-yyyy`.
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(format_description!("[day]-[month]-[year]"))
}

use std::{collections::BTreeMap, fmt};

use time::{Date, Duration, Month};

use crate::reading::Reading;

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(Date);

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Option<Self> {
        Date::from_calendar_date(year, month, 1).ok().map(Self)
    }

    /// The month `date` falls in.
    pub fn of(date: Date) -> Self {
        Self(date.saturating_sub(Duration::days(i64::from(date.day()) - 1)))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> Month {
        self.0.month()
    }

    pub fn first_day(self) -> Date {
        self.0
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), u8::from(self.month()))
    }
}

/// Sums the usage of the readings tagged `marker` per calendar month.
///
/// Months without any matching reading, or whose usage sums to zero, are left
/// out of the result.
pub fn aggregate_monthly(readings: &[Reading], marker: &str) -> BTreeMap<YearMonth, i64> {
    let mut months: BTreeMap<YearMonth, i64> = BTreeMap::new();
    for reading in readings.iter().filter(|r| r.is_settlement(marker)) {
        *months.entry(YearMonth::of(reading.date)).or_default() += reading.usage;
    }
    months.retain(|_, usage| *usage != 0);
    months
}

use time::{Date, Duration, Month};

use crate::{aggregate::YearMonth, reading::Reading};

/// Inclusive band on [`Reading::hours`].
///
/// The default, 22 to 26 hours, keeps full-day readings and drops the partial
/// intervals around meter restarts and clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursBand {
    pub lo: i64,
    pub hi: i64,
}

impl HoursBand {
    pub const fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, hours: i64) -> bool {
        self.lo <= hours && hours <= self.hi
    }
}

impl Default for HoursBand {
    fn default() -> Self {
        Self::new(22, 26)
    }
}

/// Inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub const fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// First of the month up to and including `today`.
    pub fn month_to_date(today: Date) -> Self {
        Self::new(YearMonth::of(today).first_day(), today)
    }

    /// The whole calendar month before `today`'s.
    pub fn previous_month(today: Date) -> Self {
        let last = YearMonth::of(today)
            .first_day()
            .saturating_sub(Duration::DAY);
        Self::new(YearMonth::of(last).first_day(), last)
    }

    /// January 1st up to and including `today`.
    pub fn year_to_date(today: Date) -> Self {
        Self::new(january_first(today), today)
    }

    /// January 1st up to the first of `today`'s month, for monthly series.
    pub fn year_to_month(today: Date) -> Self {
        Self::new(january_first(today), YearMonth::of(today).first_day())
    }
}

fn january_first(date: Date) -> Date {
    YearMonth::new(date.year(), Month::January)
        .map(YearMonth::first_day)
        .unwrap_or(date)
}

/// Keeps the readings inside both ranges, in their original order. A missing
/// range does not restrict anything.
pub fn select<'a>(
    readings: &'a [Reading],
    dates: Option<DateRange>,
    hours: Option<HoursBand>,
) -> Vec<&'a Reading> {
    readings
        .iter()
        .filter(|reading| hours.map_or(true, |band| band.contains(reading.hours)))
        .filter(|reading| dates.map_or(true, |range| range.contains(reading.date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn reading(date: Date, hours: i64) -> Reading {
        Reading {
            date,
            description: String::from("Mellemafl."),
            total: 0,
            usage: 1,
            cumulative_hours: 0,
            hours,
        }
    }

    #[test]
    fn default_band_keeps_full_days() {
        let readings: Vec<Reading> = [0, 21, 22, 24, 26, 27, 48]
            .into_iter()
            .map(|hours| reading(date!(2024 - 01 - 01), hours))
            .collect();
        let kept: Vec<i64> = select(&readings, None, Some(HoursBand::default()))
            .into_iter()
            .map(|r| r.hours)
            .collect();
        assert_eq!(kept, vec![22, 24, 26]);
    }

    #[test]
    fn no_filter_keeps_everything_in_order() {
        let readings = vec![
            reading(date!(2024 - 03 - 01), 1),
            reading(date!(2024 - 01 - 01), 100),
            reading(date!(2024 - 02 - 01), 24),
        ];
        let all = select(&readings, None, None);
        assert_eq!(all.len(), readings.len());
        assert!(all.into_iter().zip(&readings).all(|(a, b)| a == b));
    }

    #[test]
    fn date_range_is_inclusive() {
        let readings = vec![
            reading(date!(2023 - 12 - 31), 24),
            reading(date!(2024 - 01 - 01), 24),
            reading(date!(2024 - 01 - 31), 24),
            reading(date!(2024 - 02 - 01), 24),
        ];
        let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 31));
        let dates: Vec<Date> = select(&readings, Some(range), None)
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![date!(2024 - 01 - 01), date!(2024 - 01 - 31)]);
    }

    #[test]
    fn filters_compose() {
        let readings = vec![
            reading(date!(2024 - 01 - 01), 24),
            reading(date!(2024 - 01 - 02), 12),
            reading(date!(2024 - 02 - 01), 24),
        ];
        let range = DateRange::month_to_date(date!(2024 - 01 - 20));
        let kept = select(&readings, Some(range), Some(HoursBand::default()));
        assert_eq!(kept, vec![&readings[0]]);
    }

    #[test]
    fn empty_selection_is_not_an_error() {
        let readings = vec![reading(date!(2024 - 01 - 01), 5)];
        assert!(select(&readings, None, Some(HoursBand::default())).is_empty());
        assert!(select(&[], None, None).is_empty());
    }

    #[test]
    fn calendar_ranges() {
        let today = date!(2024 - 03 - 15);
        assert_eq!(
            DateRange::month_to_date(today),
            DateRange::new(date!(2024 - 03 - 01), today)
        );
        assert_eq!(
            DateRange::previous_month(today),
            DateRange::new(date!(2024 - 02 - 01), date!(2024 - 02 - 29))
        );
        assert_eq!(
            DateRange::year_to_date(today),
            DateRange::new(date!(2024 - 01 - 01), today)
        );
        assert_eq!(
            DateRange::year_to_month(today),
            DateRange::new(date!(2024 - 01 - 01), date!(2024 - 03 - 01))
        );
    }

    #[test]
    fn previous_month_crosses_the_year() {
        assert_eq!(
            DateRange::previous_month(date!(2024 - 01 - 10)),
            DateRange::new(date!(2023 - 12 - 01), date!(2023 - 12 - 31))
        );
    }
}

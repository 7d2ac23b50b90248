//! Scatter charts of heat usage and the HTML page holding them.

use std::{collections::BTreeMap, fmt::Display, fs, path::Path};

use chrono::NaiveDate;
use plotters::prelude::*;
use time::Date;

use crate::{
    aggregate::YearMonth,
    error::{Error, Result},
    reading::Reading,
    select::{select, DateRange, HoursBand},
    store,
};

const SIZE: (u32, u32) = (960, 540);
const X_LABEL: &str = "Dato";
const Y_LABEL: &str = "Forbrug (kWh)";

/// One rendered chart, as an inline SVG fragment.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub svg: String,
}

/// A titled series of (date, kWh) points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub title: String,
    pub points: Vec<(Date, i64)>,
}

impl Series {
    /// Usage per reading.
    pub fn daily(title: impl Into<String>, readings: &[&Reading]) -> Self {
        Self {
            title: title.into(),
            points: readings.iter().map(|r| (r.date, r.usage)).collect(),
        }
    }

    /// Usage per month, each month placed on its first day.
    pub fn monthly(
        title: impl Into<String>,
        months: &BTreeMap<YearMonth, i64>,
        range: Option<DateRange>,
    ) -> Self {
        Self {
            title: title.into(),
            points: months
                .iter()
                .map(|(month, usage)| (month.first_day(), *usage))
                .filter(|(date, _)| range.map_or(true, |range| range.contains(*date)))
                .collect(),
        }
    }

    /// Draws the series, `None` when there is nothing to draw.
    pub fn render(&self) -> Result<Option<Chart>> {
        if self.points.is_empty() {
            tracing::warn!(title = %self.title, "no data, skipping chart");
            return Ok(None);
        }
        let svg = self.draw().map_err(|e| Error::Chart {
            title: self.title.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(Chart {
            title: self.title.clone(),
            svg,
        }))
    }

    fn draw(&self) -> std::result::Result<String, Box<dyn std::error::Error>> {
        let points = self
            .points
            .iter()
            .map(|(date, usage)| Ok((to_chrono(*date)?, *usage)))
            .collect::<std::result::Result<Vec<_>, String>>()?;

        let first = points.iter().map(|(d, _)| *d).min().ok_or("empty series")?;
        let last = points.iter().map(|(d, _)| *d).max().ok_or("empty series")?;
        let low = points.iter().map(|(_, u)| *u).min().unwrap_or(0).min(0);
        let high = points.iter().map(|(_, u)| *u).max().unwrap_or(0).max(0);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
            root.fill(&WHITE)?;
            let mut chart = ChartBuilder::on(&root)
                .caption(&self.title, ("sans-serif", 24).into_font())
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(
                    first.pred_opt().unwrap_or(first)..last.succ_opt().unwrap_or(last),
                    low..high + 1,
                )?;

            chart
                .configure_mesh()
                .x_desc(X_LABEL)
                .y_desc(Y_LABEL)
                .draw()?;

            chart.draw_series(
                points
                    .iter()
                    .map(|(date, usage)| Circle::new((*date, *usage), 3, BLUE.filled())),
            )?;

            root.present()?;
        }
        Ok(svg)
    }
}

fn to_chrono(date: Date) -> std::result::Result<NaiveDate, String> {
    NaiveDate::from_ymd_opt(date.year(), date.month() as u32, u32::from(date.day()))
        .ok_or_else(|| format!("date out of range: {date}"))
}

/// The series of the usage page: daily charts over the current month, the
/// previous month, the current year and all time, then monthly sums over the
/// current year and all time.
///
/// `settlements` should only hold settlement readings, the daily charts keep
/// the ones inside `band`.
pub fn usage_series(
    settlements: &[Reading],
    months: &BTreeMap<YearMonth, i64>,
    band: HoursBand,
    today: Date,
) -> Vec<Series> {
    let daily = |title: &str, range: Option<DateRange>| {
        Series::daily(title, &select(settlements, range, Some(band)))
    };

    vec![
        daily(
            "Forbrug per dag i indeværende måned",
            Some(DateRange::month_to_date(today)),
        ),
        daily(
            "Forbrug per dag i forrige måned",
            Some(DateRange::previous_month(today)),
        ),
        daily(
            "Forbrug per dag i indeværende år",
            Some(DateRange::year_to_date(today)),
        ),
        daily("Forbrug per dag altid", None),
        Series::monthly(
            "Forbrug per måned i indeværende år",
            months,
            Some(DateRange::year_to_month(today)),
        ),
        Series::monthly("Forbrug per måned altid", months, None),
    ]
}

/// Renders every non-empty series.
pub fn render_all(series: &[Series]) -> Result<Vec<Chart>> {
    let mut charts = Vec::new();
    for s in series {
        if let Some(chart) = s.render()? {
            charts.push(chart);
        }
    }
    Ok(charts)
}

/// A standalone HTML page with the charts in order.
pub fn html(title: impl Display, charts: &[Chart]) -> String {
    let mut page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n"
    );
    for chart in charts {
        page.push_str("<div class=\"chart\">\n");
        page.push_str(&chart.svg);
        page.push_str("\n</div>\n");
    }
    page.push_str("</body>\n</html>\n");
    page
}

/// Writes the page to `path`, replacing any existing file.
pub fn write_html(path: impl AsRef<Path>, charts: &[Chart]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, html("Fjernvarme", charts))?;
    tracing::info!(path = %path.display(), charts = charts.len(), "page written");
    Ok(())
}

/// Writes the page, then the readings file when one is asked for. A page
/// that cannot be written leaves no readings file behind.
pub fn publish(
    path: impl AsRef<Path>,
    charts: &[Chart],
    saved: Option<(&Path, &[Reading])>,
) -> Result<()> {
    write_html(path, charts)?;
    if let Some((save_path, readings)) = saved {
        store::save(readings, save_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::aggregate::aggregate_monthly;
    use crate::reading::SETTLEMENT_MARKER;

    fn reading(date: Date, usage: i64, hours: i64) -> Reading {
        Reading {
            date,
            description: String::from(SETTLEMENT_MARKER),
            total: 0,
            usage,
            cumulative_hours: 0,
            hours,
        }
    }

    #[test]
    fn empty_series_is_skipped() {
        let series = Series::daily("nothing", &[]);
        assert!(series.render().unwrap().is_none());
    }

    #[test]
    fn renders_svg_with_title() {
        let readings = [
            reading(date!(2024 - 01 - 01), 40, 24),
            reading(date!(2024 - 01 - 02), 55, 24),
        ];
        let refs: Vec<&Reading> = readings.iter().collect();
        let chart = Series::daily("January", &refs).render().unwrap().unwrap();

        assert_eq!(chart.title, "January");
        assert!(chart.svg.contains("<svg"));
        assert!(chart.svg.contains("January"));
        assert!(chart.svg.contains("<circle"));
    }

    #[test]
    fn single_point_renders() {
        let readings = [reading(date!(2024 - 01 - 01), 0, 24)];
        let refs: Vec<&Reading> = readings.iter().collect();
        assert!(Series::daily("one", &refs).render().unwrap().is_some());
    }

    #[test]
    fn monthly_series_honours_the_range() {
        let readings = [
            reading(date!(2023 - 12 - 10), 10, 24),
            reading(date!(2024 - 01 - 10), 20, 24),
            reading(date!(2024 - 02 - 10), 30, 24),
        ];
        let months = aggregate_monthly(&readings, SETTLEMENT_MARKER);
        let today = date!(2024 - 02 - 15);

        let series = Series::monthly("m", &months, Some(DateRange::year_to_month(today)));
        assert_eq!(
            series.points,
            vec![(date!(2024 - 01 - 01), 20), (date!(2024 - 02 - 01), 30)]
        );
        assert_eq!(Series::monthly("m", &months, None).points.len(), 3);
    }

    #[test]
    fn usage_series_layout() {
        let readings = [
            reading(date!(2023 - 06 - 01), 10, 24),
            reading(date!(2024 - 01 - 05), 20, 24),
            reading(date!(2024 - 02 - 03), 30, 24),
            reading(date!(2024 - 02 - 04), 99, 12),
        ];
        let months = aggregate_monthly(&readings, SETTLEMENT_MARKER);
        let today = date!(2024 - 02 - 10);
        let series = usage_series(&readings, &months, HoursBand::default(), today);

        let counts: Vec<usize> = series.iter().map(|s| s.points.len()).collect();
        assert_eq!(counts, vec![1, 1, 2, 3, 2, 3]);
        assert_eq!(series[3].title, "Forbrug per dag altid");
    }

    #[test]
    fn page_holds_every_chart() {
        let charts = vec![
            Chart {
                title: String::from("a"),
                svg: String::from("<svg id=\"a\"></svg>"),
            },
            Chart {
                title: String::from("b"),
                svg: String::from("<svg id=\"b\"></svg>"),
            },
        ];
        let page = html("Fjernvarme", &charts);

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Fjernvarme</title>"));
        let a = page.find("id=\"a\"").unwrap();
        let b = page.find("id=\"b\"").unwrap();
        assert!(a < b);
    }

    #[test]
    fn publish_writes_page_and_readings() {
        let dir = tempfile::TempDir::new().unwrap();
        let page = dir.path().join("index.html");
        let saved = dir.path().join("data.csv");
        let readings = [reading(date!(2024 - 01 - 01), 40, 24)];

        publish(&page, &[], Some((saved.as_path(), &readings[..]))).unwrap();
        assert!(page.exists());
        assert_eq!(crate::store::load(&saved).unwrap(), readings.to_vec());
    }

    #[test]
    fn failed_page_leaves_no_readings_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let page = dir.path().join("missing").join("index.html");
        let saved = dir.path().join("data.csv");
        let readings = [reading(date!(2024 - 01 - 01), 40, 24)];

        let err = publish(&page, &[], Some((saved.as_path(), &readings[..]))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!saved.exists());
    }

    #[test]
    fn write_html_replaces_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "old content").unwrap();

        write_html(&path, &[]).unwrap();
        let page = fs::read_to_string(&path).unwrap();
        assert!(!page.contains("old content"));
        assert!(page.contains("<body>"));
    }
}

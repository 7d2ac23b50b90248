use clap::Parser;
use fjernvarme::{
    aggregate_monthly, chart, cli::Cli, report::METER_NUMBER_KEY, store, Provider, Reading, Report,
};
use time::{Date, OffsetDateTime};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let today = today();
    let readings = match &cli.load {
        Some(path) => store::load(path)?,
        None => download(&cli)?,
    };

    let settlements: Vec<Reading> = readings
        .iter()
        .filter(|r| r.is_settlement(&cli.marker))
        .cloned()
        .collect();
    let months = aggregate_monthly(&readings, &cli.marker);
    tracing::info!(
        readings = readings.len(),
        settlements = settlements.len(),
        months = months.len(),
        "data ready"
    );

    let series = chart::usage_series(&settlements, &months, cli.hours_band(), today);
    let charts = chart::render_all(&series)?;

    let save_path = cli
        .save
        .then(|| cli.save_path.clone().unwrap_or_else(|| store::default_file_name(today)));
    chart::publish(
        &cli.output,
        &charts,
        save_path.as_deref().map(|path| (path, readings.as_slice())),
    )?;

    Ok(())
}

fn download(cli: &Cli) -> miette::Result<Vec<Reading>> {
    let provider = Provider::new(cli.provider_config()?);
    let raw = provider.retrieve()?;
    let report = Report::parse(&raw)?;
    if report.readings.is_empty() {
        tracing::warn!("the report holds no readings");
    }
    if let Some(meter) = report.metadata.get(METER_NUMBER_KEY) {
        tracing::info!(meter, "report parsed");
    }
    Ok(report.readings)
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

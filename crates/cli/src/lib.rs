//! Parking Data Quality Report
//!
//! Loads a parking-event CSV, classifies it for the requested date window,
//! and prints the report as text or JSON.

mod render;
mod settings;

pub use render::{write_text, RunSummary, EMPTY_STATE};
pub use settings::{LoggingConfig, Settings, ENV_PREFIX};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use data_validator::{Classifier, DateRange, ParkingEvent, ValidationConfig};
use dataset::{
    write_multi_entry_csv, write_rejected_csv, ClassificationCache, DatasetCache, DatasetError,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reporting::Report;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Named fence strictness presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// k = 4.5
    Standard,
    /// k = 1.5
    Classic,
    /// k = 6.0
    Lenient,
}

impl Preset {
    fn config(self) -> ValidationConfig {
        match self {
            Preset::Standard => ValidationConfig::default(),
            Preset::Classic => ValidationConfig::classic(),
            Preset::Lenient => ValidationConfig::lenient(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "parking-report", version, about = "Parking event data-quality report")]
pub struct Cli {
    /// Parking events CSV
    #[arg(short, long)]
    pub input: PathBuf,

    /// Settings file (TOML, YAML, or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// First arrival date to include (UTC), defaults to the earliest in the data
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Last arrival date to include (UTC), defaults to the latest in the data
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,

    /// Fence strictness preset, applied before --fence-multiplier
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// IQR fence multiplier k
    #[arg(short = 'k', long)]
    pub fence_multiplier: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write rejected rows with their reasons to this CSV
    #[arg(long)]
    pub rejected_out: Option<PathBuf>,

    /// Write vehicles with multiple entries to this CSV
    #[arg(long)]
    pub multi_entry_out: Option<PathBuf>,

    /// Print Prometheus metrics after the report
    #[arg(long)]
    pub emit_metrics: bool,

    /// Log level override
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Layered settings with command-line overrides applied last
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        self.apply_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(preset) = self.preset {
            settings.validation.fence_multiplier = preset.config().fence_multiplier;
        }
        if let Some(k) = self.fence_multiplier {
            settings.validation.fence_multiplier = k;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }
}

/// Initialize logging to stderr
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(config.max_level()?)
        .with_target(true)
        .with_writer(io::stderr);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

fn install_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    metrics::describe_counter!(
        "parking_records_classified_total",
        "Records passed through classification"
    );
    metrics::describe_counter!("parking_records_accepted_total", "Records with no rejection reason");
    metrics::describe_counter!(
        "parking_records_rejected_total",
        "Rejected records carrying each reason"
    );
    Ok(handle)
}

/// Date window for a run. Missing ends default to the data's own span,
/// clamped so a defaulted end never inverts the range; with no arrival times
/// at all and no flags, every row is classified.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    events: &[ParkingEvent],
) -> Result<Option<DateRange>> {
    let span = DateRange::spanning(events);
    let start = from.or_else(|| span.map(|r| to.map_or(r.start(), |to| r.start().min(to))));
    let end = to.or_else(|| span.map(|r| from.map_or(r.end(), |from| r.end().max(from))));

    let range = match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end)?,
        (Some(day), None) | (None, Some(day)) => DateRange::new(day, day)?,
        (None, None) => {
            warn!("No arrival times in the data; classifying all rows");
            return Ok(None);
        }
    };
    Ok(Some(range))
}

fn export<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<(), DatasetError>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write(BufWriter::new(file)).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Load, classify, report, and export, writing the report to `out`
pub fn execute<W: Write>(
    cli: &Cli,
    settings: &Settings,
    metrics: Option<&PrometheusHandle>,
    out: &mut W,
) -> Result<()> {
    let classifier = Classifier::new(&settings.validation).context("Invalid validation settings")?;
    let datasets = DatasetCache::new();
    let runs = ClassificationCache::new();

    let dataset = datasets.get_or_load(&cli.input, classifier.normalizer())?;
    let range = resolve_range(cli.from, cli.to, &dataset.events)?;
    let run = runs.get_or_classify(&dataset, range, &classifier)?;
    let report = Report::build(
        &run.filtered,
        &run.classification,
        dataset.offset,
        &settings.report,
    );

    if let Some(path) = &cli.rejected_out {
        export(path, |w| write_rejected_csv(w, &run.classification.rejected))?;
    }
    if let Some(path) = &cli.multi_entry_out {
        export(path, |w| write_multi_entry_csv(w, &report.multi_entry_vehicles))?;
    }

    let input = cli.input.display().to_string();
    let summary = RunSummary {
        input: &input,
        range,
        fence_multiplier: classifier.multiplier(),
        normalization: dataset.stats,
        filtered_rows: run.filtered.len(),
        report: &report,
    };

    match cli.format {
        OutputFormat::Text => {
            let mut text = String::new();
            write_text(&mut text, &summary)?;
            out.write_all(text.as_bytes())?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &summary)?;
            writeln!(out)?;
        }
    }

    if let Some(handle) = metrics {
        writeln!(out, "\n{}", handle.render())?;
    }
    Ok(())
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;
    init_logging(&settings.logging)?;
    info!("parking-report v{}", env!("CARGO_PKG_VERSION"));

    let metrics = if cli.emit_metrics {
        Some(install_metrics()?)
    } else {
        None
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &settings, metrics.as_ref(), &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;

    const SAMPLE: &str = "\
arrival_time,duration_seconds,latitude,longitude,bay_id,license_plate
2024-03-01T02:30:00Z,3600,-31.9402,115.9671,A12,AAA111
2024-03-01T05:00:00Z,1800,,115.9672,A13,BBB222
2024-03-02T04:00:00Z,7200,-31.9404,115.9673,A14,AAA111
2024-03-03T04:00:00Z,90000,-31.9403,115.9674,A15,
2024-03-04T04:00:00Z,600,-33.8688,151.2093,A16,CCC333
";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn arrival(d: u32) -> ParkingEvent {
        ParkingEvent {
            arrival_time: Some(Utc.with_ymd_and_hms(2024, 3, d, 1, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["parking-report"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse(&[
            "--input",
            "parking.csv",
            "--from",
            "2024-03-01",
            "-k",
            "1.5",
            "--format",
            "json",
        ]);
        assert_eq!(cli.input, PathBuf::from("parking.csv"));
        assert_eq!(cli.from, Some(day(1)));
        assert_eq!(cli.to, None);
        assert_eq!(cli.fence_multiplier, Some(1.5));
        assert_eq!(cli.format, OutputFormat::Json);

        assert!(Cli::try_parse_from(["parking-report", "--input", "x.csv", "--from", "March"]).is_err());
    }

    #[test]
    fn test_overrides_apply_in_order() {
        let cli = parse(&["-i", "x.csv", "--preset", "lenient", "--log-json"]);
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.validation.fence_multiplier, 6.0);
        assert!(settings.logging.json);

        let cli = parse(&["-i", "x.csv", "--preset", "classic", "-k", "3.0"]);
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.validation.fence_multiplier, 3.0);
    }

    #[test]
    fn test_resolve_range() {
        let events = vec![arrival(3), arrival(1), ParkingEvent::default(), arrival(5)];

        let range = resolve_range(None, None, &events).unwrap().unwrap();
        assert_eq!((range.start(), range.end()), (day(1), day(5)));

        let range = resolve_range(Some(day(2)), None, &events).unwrap().unwrap();
        assert_eq!((range.start(), range.end()), (day(2), day(5)));

        assert!(resolve_range(Some(day(4)), Some(day(2)), &events).is_err());
        assert_eq!(resolve_range(None, None, &[ParkingEvent::default()]).unwrap(), None);
    }

    #[test]
    fn test_one_sided_range_outside_the_data_is_empty_not_an_error() {
        let events = vec![arrival(1), arrival(5)];

        let after = resolve_range(Some(day(20)), None, &events).unwrap().unwrap();
        assert_eq!((after.start(), after.end()), (day(20), day(20)));
        assert!(after.apply(&events).is_empty());

        let before = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let range = resolve_range(None, Some(before), &events).unwrap().unwrap();
        assert_eq!((range.start(), range.end()), (before, before));
        assert!(range.apply(&events).is_empty());

        // Defaults inside the data are left alone
        let range = resolve_range(None, Some(day(3)), &events).unwrap().unwrap();
        assert_eq!((range.start(), range.end()), (day(1), day(3)));
    }

    #[test]
    fn test_execute_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("parking.csv");
        let rejected = dir.path().join("rejected.csv");
        let multi = dir.path().join("multi.csv");
        fs::write(&input, SAMPLE).unwrap();

        let cli = parse(&[
            "-i",
            input.to_str().unwrap(),
            "--preset",
            "classic",
            "--rejected-out",
            rejected.to_str().unwrap(),
            "--multi-entry-out",
            multi.to_str().unwrap(),
        ]);
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);

        let mut out = Vec::new();
        execute(&cli, &settings, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Date range:   2024-03-01 to 2024-03-04"));
        assert!(text.contains("Total stays:          2"));
        assert!(text.contains("Rejected rows:        3"));

        let rejected = fs::read_to_string(rejected).unwrap();
        assert_eq!(rejected.lines().count(), 4);
        assert!(rejected.contains("\"LAT_OUTLIER,LON_OUTLIER\""));

        let multi = fs::read_to_string(multi).unwrap();
        assert_eq!(multi.lines().count(), 2);
        assert!(multi.contains("AAA111,2,"));
    }

    #[test]
    fn test_execute_json_for_empty_window() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("parking.csv");
        fs::write(&input, SAMPLE).unwrap();

        let cli = parse(&[
            "-i",
            input.to_str().unwrap(),
            "--from",
            "2025-01-01",
            "--to",
            "2025-01-31",
            "--format",
            "json",
        ]);
        let mut out = Vec::new();
        execute(&cli, &Settings::default(), None, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["filtered_rows"], 0);
        assert_eq!(value["report"]["kpis"]["total_stays"], 0);
        assert_eq!(value["report"]["fences"]["lat_low"], -90.0);
        assert_eq!(value["range"]["start"], "2025-01-01");
    }
}

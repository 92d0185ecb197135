use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gpmf_export::{
    export_all, extract, AltitudeMode, Config, ContainerFormatError, Error, ExportFormat, GoProSession,
    TelemetryTimeline,
};

/// Extract GoPro GPMF telemetry and export it as JSON, GPX, KML, GeoJSON, and CSV.
///
/// A single input is exported on its own. Several inputs, or a directory
/// with several clips, are merged into one timeline in path order.
#[derive(Parser, Debug)]
#[command(name = "gpmf-export")]
#[command(version, about, long_about)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// GoPro MP4/LRV clips, raw GPMF files, or directories.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML config. Flags override config values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Export format. Repeat for several formats. Default: all.
    #[arg(short, long = "format", value_parser = parse_format)]
    formats: Vec<ExportFormat>,

    /// KML altitude mode: absolute, relative_to_ground, clamp_to_ground.
    #[arg(long, value_parser = parse_altitude_mode)]
    kml_altitude_mode: Option<AltitudeMode>,

    /// Time gap in seconds that starts a new GPX track segment.
    #[arg(long)]
    gpx_gap: Option<f64>,

    /// Distance in metres between clips that is reported as a gap.
    #[arg(long)]
    merge_gap: Option<f64>,

    /// Output basename for merged clips.
    #[arg(long)]
    merged_name: Option<String>,

    /// Print a telemetry summary.
    #[arg(short, long)]
    summary: bool,

    /// Debug logging. `RUST_LOG` takes precedence.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    value.parse().map_err(|err: Error| err.to_string())
}

fn parse_altitude_mode(value: &str) -> Result<AltitudeMode, String> {
    value.parse().map_err(|err: Error| err.to_string())
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_path(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.to_owned();
        }
        if !self.formats.is_empty() {
            config.formats = self.formats.to_owned();
        }
        if let Some(mode) = self.kml_altitude_mode {
            config.kml_altitude_mode = mode;
        }
        if let Some(gap) = self.gpx_gap {
            config.gpx_segment_gap_secs = gap;
        }
        if let Some(gap) = self.merge_gap {
            config.merge_gap_threshold_m = gap;
        }
        if let Some(name) = &self.merged_name {
            config.merged_name = name.to_owned();
        }
        config.formats.sort();
        config.formats.dedup();
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        let level = if cli.verbose { "debug" } else { "info" };
        EnvFilter::builder().parse_lossy(format!("gpmf_export={level}"))
    };
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .try_init();

    let config = cli.config()?;
    let session = GoProSession::from_inputs(&cli.inputs);

    let timeline = match session.paths() {
        [] => bail!("No MP4/LRV clips found in input"),
        [path] => match extract(path) {
            Ok(timeline) => timeline,
            Err(err) => {
                for hint in hints(&err) {
                    eprintln!("  hint: {hint}");
                }
                return Err(err).with_context(|| format!("Failed to extract telemetry from {}", path.display()));
            }
        },
        paths => {
            info!("Merging {} clips", paths.len());
            let progress = ProgressBar::new(paths.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40}] {pos}/{len} clips")?,
            );
            let batch = session
                .merge_with_progress(&config.merge_options(), &progress)
                .context("No clip could be read")?;
            for (path, err) in batch.failures.iter() {
                warn!("Skipped {}: {err}", path.display());
            }
            batch.timeline
        }
    };

    if cli.summary {
        print_summary(&timeline);
    }

    let artifacts = export_all(&timeline, &config.formats, &config.export_options())?;
    for artifact in artifacts.iter() {
        let path = artifact
            .write_to(&config.output_dir)
            .with_context(|| format!("Failed to write {}", artifact.name))?;
        if artifact.has_warning() {
            println!("Wrote {} (no samples)", path.display());
        } else {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Likely causes for a failed extraction.
fn hints(err: &Error) -> Vec<&'static str> {
    match err {
        Error::Container(ContainerFormatError::NoMetadataTrack) => vec![
            "no GPMF track found: the file was not recorded on a GoPro, or was edited/re-encoded",
            "some recording modes (e.g. time lapse on older models) do not log telemetry",
        ],
        Error::Container(ContainerFormatError::NoTelemetry) => vec![
            "GPS may have been turned off on the camera",
            "the camera may not have acquired satellite lock, e.g. indoors or in QuickCapture mode",
            "the recording mode may be incompatible with telemetry logging",
        ],
        Error::Container(
            ContainerFormatError::Malformed { .. } | ContainerFormatError::MaxDepthExceeded { .. },
        ) => vec!["the file may be corrupt or truncated, e.g. from an interrupted copy"],
        Error::Container(ContainerFormatError::MaxFileSizeExceeded { .. }) => {
            vec!["raw GPMF input is unusually large: is it really a GPMF file?"]
        }
        _ => Vec::new(),
    }
}

fn print_summary(timeline: &TelemetryTimeline) {
    println!("Name:     {}", timeline.name);
    println!("Device:   {}", timeline.device.as_deref().unwrap_or("unknown"));
    println!("Sources:  {}", timeline.sources.len());
    println!("Duration: {:.3}s", timeline.end().as_seconds_f64());
    for stream in timeline.streams.values() {
        let rate = stream
            .sample_rate
            .map(|r| format!("{r:.1} Hz"))
            .unwrap_or_else(|| "-".to_owned());
        println!("  {:<5} {:>8} samples  {rate}", stream.kind.to_str(), stream.len());
    }
    let gps = timeline.gps();
    println!("GPS fixed: {}/{}", gps.fixed().len(), gps.len());
    if let Some(t0) = gps.t0() {
        println!("Start:    {t0}");
    }
    if let Some((first, last)) = gps.datetime_range() {
        println!("UTC:      {first} - {last}");
    }
    if !timeline.warnings.is_empty() {
        println!("Warnings: {}", timeline.warnings.len());
        for warning in timeline.warnings.iter() {
            println!("  {warning}");
        }
    }
}

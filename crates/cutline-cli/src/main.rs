//! Cutline CLI
//!
//! Headless access to the timeline ruler math and the ffmpeg wrappers.

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use cutline_core::core::ffmpeg::{resolve_ffmpeg, FFmpegRunner, TransitionKind, TransitionRequest};
use cutline_core::core::settings::{AppSettings, SettingsManager};
use cutline_core::core::timeline::{format_timecode, is_visible, TimecodeFormat};
use cutline_core::{
    generate_marks, percent_to_time, time_to_percent, StepConfig, TickSpec, TimeRange,
    TimeWindow, TimelineScale,
};

#[derive(Parser, Debug)]
#[command(name = "cutline", version, about = "Timeline ruler and media tooling", long_about = None)]
struct Cli {
    /// Directory holding settings.json (default: platform config dir)
    #[arg(long, value_name = "DIR", global = true)]
    settings_dir: Option<PathBuf>,

    /// Also write daily rolling log files to DIR
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate ruler ticks for a visible window
    Marks {
        /// Window start in seconds
        #[arg(long, allow_negative_numbers = true)]
        start: f64,

        /// Window end in seconds
        #[arg(long, allow_negative_numbers = true)]
        end: f64,

        /// Timeline zoom used to pick the steps (default: settings initial scale)
        #[arg(long, conflicts_with = "steps")]
        zoom: Option<f64>,

        /// Explicit steps, coarsest first: L1,L2,L3,L4
        #[arg(long, value_name = "L1,L2,L3,L4", value_parser = parse_steps)]
        steps: Option<StepConfig>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert between time and percent over a set of ranges
    Map {
        /// Range as START:END, repeatable
        #[arg(long = "range", value_name = "START:END", required = true, value_parser = parse_range, allow_negative_numbers = true)]
        ranges: Vec<TimeRange>,

        /// Time in seconds to convert to percent
        #[arg(long, allow_negative_numbers = true, required_unless_present = "percent", conflicts_with = "percent")]
        time: Option<f64>,

        /// Percent to convert to time
        #[arg(long, allow_negative_numbers = true)]
        percent: Option<f64>,
    },

    /// Print ffprobe information as JSON
    Probe {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Sample a thumbnail strip from a video
    Thumbnails {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory (default: <thumbnails root>/<file stem>)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Number of frames (default: settings thumbnail count)
        #[arg(long)]
        count: Option<u32>,
    },

    /// Extract a single frame
    Frame {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Time in seconds
        #[arg(long)]
        at: f64,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Render an xfade transition from SOURCE into TARGET
    Transition {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// fade, dissolve, wipeleft, wiperight, slideleft, slideright, circleopen
        #[arg(long, default_value = "fade")]
        kind: TransitionKind,

        /// Transition length in seconds
        #[arg(long, default_value_t = 1.0)]
        duration: f64,

        /// Start offset into SOURCE (default: its last DURATION seconds)
        #[arg(long)]
        offset: Option<f64>,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Print the effective settings
    Settings {
        /// Delete the settings file and print the defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Parses `START:END`. Reversed bounds are swapped by [`TimeRange::new`].
fn parse_range(value: &str) -> Result<TimeRange, String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{value}'"))?;
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|e| format!("bad range start '{start}': {e}"))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|e| format!("bad range end '{end}': {e}"))?;
    Ok(TimeRange::new(start, end))
}

/// Parses `L1,L2,L3,L4` into a validated step config.
fn parse_steps(value: &str) -> Result<StepConfig, String> {
    let steps = value
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad step in '{value}': {e}"))?;
    match steps.as_slice() {
        [l1, l2, l3, l4] => StepConfig::new(*l1, *l2, *l3, *l4).map_err(|e| e.to_string()),
        _ => Err(format!("expected four steps, got {}", steps.len())),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarksOutput<'a> {
    start: f64,
    end: f64,
    steps: &'a StepConfig,
    grid_origin: f64,
    ticks: &'a [TickSpec],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOutput {
    time: f64,
    percent: f64,
    visible: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.log_dir.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = SettingsManager::new(
        cli.settings_dir
            .clone()
            .unwrap_or_else(SettingsManager::default_dir),
    );

    match cli.command {
        Commands::Marks {
            start,
            end,
            zoom,
            steps,
            json,
        } => cmd_marks(&manager.load(), start, end, zoom, steps, json),
        Commands::Map {
            ranges,
            time,
            percent,
        } => cmd_map(&ranges, time, percent),
        Commands::Probe { file } => {
            let runner = runner(&manager.load())?;
            let media = runner.probe(&file).await?;
            print_json(&media)
        }
        Commands::Thumbnails { file, out, count } => {
            cmd_thumbnails(&manager, &file, out.as_deref(), count).await
        }
        Commands::Frame { file, at, out } => {
            let runner = runner(&manager.load())?;
            runner.extract_frame(&file, at, &out).await?;
            println!("{}", out.display());
            Ok(())
        }
        Commands::Transition {
            source,
            target,
            kind,
            duration,
            offset,
            out,
        } => {
            let mut request = TransitionRequest::new(kind, duration)?;
            if let Some(offset) = offset {
                request = request.with_offset(offset)?;
            }
            let runner = runner(&manager.load())?;
            runner
                .render_transition(&source, &target, &request, &out)
                .await?;
            println!("{}", out.display());
            Ok(())
        }
        Commands::Settings { reset } => {
            let settings = if reset {
                manager.reset()?
            } else {
                manager.try_load()?
            };
            debug!("Settings file: {}", manager.settings_path().display());
            print_json(&settings)
        }
    }
}

fn runner(settings: &AppSettings) -> Result<FFmpegRunner> {
    let info = resolve_ffmpeg(&settings.media)?;
    info!("Using ffmpeg {}", info.version);
    let runner = FFmpegRunner::new(info);
    Ok(match settings.media.timeout() {
        Some(limit) => runner.with_timeout(limit),
        None => runner,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_marks(
    settings: &AppSettings,
    start: f64,
    end: f64,
    zoom: Option<f64>,
    steps: Option<StepConfig>,
    json: bool,
) -> Result<()> {
    let window = TimeWindow::new(start, end)?;
    let steps = match (steps, zoom) {
        (Some(steps), _) => steps,
        (None, Some(zoom)) => StepConfig::for_zoom(zoom)?,
        (None, None) => TimelineScale::new(&settings.timeline).step_config()?,
    };

    let marks = generate_marks(&window, &steps)?;
    let max_ticks = settings.timeline.max_ticks;
    if marks.len() > max_ticks {
        bail!(
            "window {}~{}s would produce {} ticks at a {}s step (limit {}); use a coarser step",
            start,
            end,
            marks.len(),
            steps.level4_step(),
            max_ticks
        );
    }

    let grid_origin = marks.grid_origin();
    let ticks: Vec<TickSpec> = marks.collect();

    if json {
        return print_json(&MarksOutput {
            start,
            end,
            steps: &steps,
            grid_origin,
            ticks: &ticks,
        });
    }

    println!("{:>14}  {:>9}  {:<8}  LABEL", "TIME", "PERCENT", "LEVEL");
    for tick in &ticks {
        println!(
            "{:>14}  {:>8.3}%  {:<8}  {}",
            format_timecode(tick.timestamp, TimecodeFormat::FULL),
            tick.position_percent,
            tick.level.as_str(),
            tick.label().unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_map(ranges: &[TimeRange], time: Option<f64>, percent: Option<f64>) -> Result<()> {
    let output = match (time, percent) {
        (Some(time), _) => {
            let percent = time_to_percent(ranges, time)?;
            MapOutput {
                time,
                percent,
                visible: is_visible(percent),
            }
        }
        (None, Some(percent)) => MapOutput {
            time: percent_to_time(ranges, percent)?,
            percent,
            visible: is_visible(percent),
        },
        (None, None) => bail!("either --time or --percent is required"),
    };
    print_json(&output)
}

async fn cmd_thumbnails(
    manager: &SettingsManager,
    file: &Path,
    out: Option<&Path>,
    count: Option<u32>,
) -> Result<()> {
    let settings = manager.load();
    let count = count.unwrap_or(settings.media.thumbnail_count);
    if count == 0 {
        bail!("--count must be at least 1");
    }

    let runner = runner(&settings)?;
    let media = runner.probe(file).await?;

    let files = match out {
        Some(dir) => {
            runner
                .generate_thumbnails(file, dir, media.duration, count)
                .await?
        }
        None => {
            let name = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .with_context(|| format!("{} has no file name", file.display()))?;
            let root = settings.media.thumbnails_root(manager.config_dir());
            runner
                .thumbnails_for(file, &root, &name, media.duration, count)
                .await?
        }
    };

    for path in &files {
        println!("{}", path.display());
    }
    Ok(())
}

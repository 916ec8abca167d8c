use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use escapement::analysis::DriftMeter;
use escapement::audio::{DeviceSource, SampleSource, WavFileSource};
use escapement::cancel::CancelToken;
use escapement::config::{EscapementConfig, TickRate};
use escapement::output::{DriftReport, OutputFormat, create_formatter};
use escapement::vu::run_vu_meter;

#[derive(Parser, Debug)]
#[command(name = "escapement")]
#[command(about = "Measure a clock's drift rate from its audible tick", long_about = None)]
struct Args {
    /// Read samples from a sound file instead of the default input device
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Nominal tick rate of the clock (e.g., "3600", "18000/h", "5/s")
    #[arg(short = 't', long, default_value = "3600")]
    ticks_per_hour: TickRate,

    /// Print one line per analyzed tick
    #[arg(long)]
    ticks: bool,

    /// Print periodic running drift statistics
    #[arg(long)]
    stats: bool,

    /// Output format for the final report
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Show a VU meter for the selected source instead of measuring
    #[arg(long)]
    vu: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = EscapementConfig::default();
    config.analysis.ticks_per_hour = args.ticks_per_hour;
    config.report.show_ticks = args.ticks;
    config.report.show_stats = args.stats;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted; finishing up");
        handler_token.cancel();
    })
    .context("Failed to install interrupt handler")?;

    let mut source: Box<dyn SampleSource> = match args.file {
        Some(ref path) => Box::new(
            WavFileSource::new(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(DeviceSource::new(&config.audio).context("Failed to open input device")?),
    };

    if args.vu {
        run_vu_meter(source.as_mut(), &cancel)?;
        return Ok(());
    }

    let frames_per_second = source.sample_rate();
    log::info!(
        "measuring at {} ticks/hour, {} frames/sec",
        config.analysis.ticks_per_hour.per_hour(),
        frames_per_second
    );

    let mut meter = DriftMeter::new(&config, frames_per_second)?;
    log::info!("samples per tick: {}", meter.samples_per_tick());

    let estimate = meter.run(source.as_mut(), &cancel)?;

    let report = DriftReport::new(&estimate, meter.ticks_analyzed(), meter.interrupted());
    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }
    println!("{}", formatter.format(&report));

    Ok(())
}

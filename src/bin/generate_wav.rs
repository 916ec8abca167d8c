use anyhow::{Context, Result};
use clap::Parser;
use escapement::config::TickRate;
use escapement::save_wav;
use escapement::simulation::{TickTrainConfig, generate_tick_train};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Generate synthetic tick-train WAV files for drift-meter testing")]
struct Args {
    /// TOML tick-shape/noise configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// True drift rates in seconds/day, comma-separated (e.g., "-5,0,2.5")
    #[arg(short, long, default_value = "0")]
    drifts: String,

    /// Number of trials per drift rate
    #[arg(short, long, default_value_t = 1)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Signal duration in seconds
    #[arg(long, default_value_t = 120.0)]
    duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Nominal tick rate (e.g., "3600", "5/s")
    #[arg(long, default_value = "3600")]
    ticks_per_hour: TickRate,

    /// Output filename prefix
    #[arg(long, default_value = "ticks")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,

    /// Tick transient peak amplitude (CLI override)
    #[arg(long)]
    amplitude: Option<i16>,

    /// Background noise standard deviation in sample units (CLI override)
    #[arg(long)]
    noise_floor: Option<f64>,

    /// Per-tick timing jitter standard deviation in samples (CLI override)
    #[arg(long)]
    jitter: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    tick: Option<TickSection>,
    noise: Option<NoiseSection>,
}

#[derive(Debug, Deserialize)]
struct TickSection {
    amplitude: Option<i16>,
    jitter_samples: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NoiseSection {
    floor: f64,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    drift_seconds_per_day: f64,
    trial: u32,
    seed: u64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    sample_rate: u32,
    ticks_per_hour: u32,
    duration: f64,
    files: Vec<ManifestEntry>,
}

fn parse_drifts(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid drift value: {}", part))
        })
        .collect()
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_train_config(toml: &TomlConfig, args: &Args) -> TickTrainConfig {
    let mut config = TickTrainConfig {
        sample_rate: args.sample_rate,
        ticks_per_hour: args.ticks_per_hour.per_hour(),
        duration_secs: args.duration,
        ..Default::default()
    };

    if let Some(ref tick) = toml.tick {
        if let Some(amplitude) = tick.amplitude {
            config.tick_amplitude = amplitude;
        }
        if let Some(jitter) = tick.jitter_samples {
            config.jitter_samples = jitter;
        }
    }
    if let Some(ref noise) = toml.noise {
        config.noise_floor = noise.floor;
    }

    if let Some(amplitude) = args.amplitude {
        config.tick_amplitude = amplitude;
    }
    if let Some(noise_floor) = args.noise_floor {
        config.noise_floor = noise_floor;
    }
    if let Some(jitter) = args.jitter {
        config.jitter_samples = jitter;
    }

    config
}

fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let drifts = parse_drifts(&args.drifts)?;
    let base_seed = args.seed.unwrap_or(1);

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let mut manifest_files = Vec::new();

    for &drift in &drifts {
        for trial in 0..args.trials {
            let seed = base_seed
                .wrapping_add((drift.to_bits() & 0xFFFF) ^ trial as u64)
                .wrapping_add(trial as u64);

            let mut train_config = build_train_config(&toml_config, &args);
            train_config.drift_seconds_per_day = drift;
            train_config.seed = Some(seed);

            let samples = generate_tick_train(&train_config);

            let filename = format!("{}_{:+.2}spd_t{:02}.wav", args.prefix, drift, trial);
            let path = args.output_dir.join(&filename);
            save_wav(
                path.to_str().context("non-UTF8 output path")?,
                &samples,
                args.sample_rate,
            )
            .with_context(|| format!("Failed to write {}", path.display()))?;

            println!("wrote {} ({} samples)", path.display(), samples.len());

            manifest_files.push(ManifestEntry {
                file: filename,
                drift_seconds_per_day: drift,
                trial,
                seed,
            });
        }
    }

    if args.manifest {
        let manifest = Manifest {
            sample_rate: args.sample_rate,
            ticks_per_hour: args.ticks_per_hour.per_hour(),
            duration: args.duration,
            files: manifest_files,
        };
        let path = args.output_dir.join("manifest.json");
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

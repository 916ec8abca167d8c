//! Configuration for the escapement drift meter.
//!
//! The measurement core only needs two numbers: the source's sample rate
//! and the clock's nominal tick rate. Everything else here is plumbing for
//! the CLI and reporting layers.

use std::fmt;
use std::str::FromStr;

use crate::error::{EscapementError, Result};

/// Nominal tick rate of the clock under measurement
///
/// Stored as ticks per hour. Can be parsed from a plain ticks-per-hour
/// count or from a ticks-per-second form, which is often how clock
/// movements are described.
///
/// # Parsing formats
/// - `3600` - ticks per hour
/// - `5/s` - ticks per second (multiplied out to 18000 per hour)
///
/// # Example
/// ```
/// use escapement::config::TickRate;
///
/// let rate: TickRate = "5/s".parse().unwrap();
/// assert_eq!(rate.per_hour(), 18000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(u32);

impl TickRate {
    /// Create from a ticks-per-hour count
    pub fn from_per_hour(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Create from a ticks-per-second count
    pub fn from_per_second(ticks: u32) -> Self {
        Self(ticks * 3600)
    }

    /// Get the rate in ticks per hour
    pub fn per_hour(&self) -> u32 {
        self.0
    }

    /// Nominal seconds between ticks
    #[allow(dead_code)]
    pub fn tick_interval_secs(&self) -> f64 {
        3600.0 / self.0 as f64
    }

    /// Samples in one nominal tick interval at `sample_rate`.
    ///
    /// The tick rate must divide an hour of samples evenly; a fractional
    /// tick length cannot keep the analysis window aligned over a run.
    pub fn samples_per_tick(&self, sample_rate: u32) -> Result<usize> {
        let ticks_per_hour = self.0 as u64;
        if ticks_per_hour == 0 {
            return Err(EscapementError::Config(
                "ticks per hour must be positive".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(EscapementError::Config(
                "sample rate must be positive".to_string(),
            ));
        }
        let samples_per_hour = 3600 * sample_rate as u64;
        if !samples_per_hour.is_multiple_of(ticks_per_hour) {
            return Err(EscapementError::Config(format!(
                "can't process {} ticks/hour at {} samples/sec: tick length is not a whole \
                 number of samples",
                ticks_per_hour, sample_rate
            )));
        }
        Ok((samples_per_hour / ticks_per_hour) as usize)
    }
}

impl Default for TickRate {
    fn default() -> Self {
        // One tick per second, the common seconds-pendulum case
        Self::from_per_hour(3600)
    }
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/h", self.0)
    }
}

impl FromStr for TickRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("/s") {
            let per_second: u32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid tick rate: {}", s))?;
            if per_second == 0 {
                return Err("tick rate must be positive".to_string());
            }
            return Ok(Self::from_per_second(per_second));
        }

        let num = s.strip_suffix("/h").unwrap_or(s);
        let per_hour: u32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid tick rate: {}", s))?;
        if per_hour == 0 {
            return Err("tick rate must be positive".to_string());
        }
        Ok(Self::from_per_hour(per_hour))
    }
}

/// System-wide configuration
///
/// Use `EscapementConfig::default()` for sensible defaults and override
/// individual fields from CLI options.
#[derive(Debug, Clone, Default)]
pub struct EscapementConfig {
    /// Audio input configuration
    pub audio: AudioConfig,
    /// Tick analysis configuration
    pub analysis: AnalysisConfig,
    /// Reporting configuration
    pub report: ReportConfig,
}

/// Audio input configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Audio sample rate in Hz (typically 44100)
    pub sample_rate: u32,
    /// Capture buffer size in samples
    pub buffer_size: usize,
    /// Number of capture channels (mono analysis; extra channels dropped)
    pub channels: u16,
}

/// Tick analysis configuration
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// Nominal tick rate of the clock under measurement
    pub ticks_per_hour: TickRate,
}

/// Reporting configuration
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    /// Print one line per analyzed tick
    pub show_ticks: bool,
    /// Print periodic running drift statistics
    pub show_stats: bool,
}

impl EscapementConfig {
    /// Samples in one nominal tick interval at the configured sample rate
    pub fn samples_per_tick(&self) -> Result<usize> {
        self.analysis
            .ticks_per_hour
            .samples_per_tick(self.audio.sample_rate)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 1024,
            channels: 1,
        }
    }
}

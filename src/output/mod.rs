mod csv;
mod json;
mod text;

use chrono::Utc;
use serde::Serialize;

use crate::analysis::DriftEstimate;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Final (or interrupt-time partial) result of one measurement run
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub timestamp: String,
    pub seconds_per_day: f64,
    pub direction: String,
    pub good_ticks: usize,
    pub ticks_analyzed: u64,
    pub interrupted: bool,
}

impl DriftReport {
    pub fn new(estimate: &DriftEstimate, ticks_analyzed: u64, interrupted: bool) -> Self {
        Self {
            timestamp: iso8601_timestamp(),
            seconds_per_day: estimate.seconds_per_day,
            direction: estimate.direction().to_string(),
            good_ticks: estimate.good_ticks,
            ticks_analyzed,
            interrupted,
        }
    }
}

pub trait Formatter: Send {
    fn format(&self, report: &DriftReport) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

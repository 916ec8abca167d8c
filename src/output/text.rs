use super::{DriftReport, Formatter};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &DriftReport) -> String {
        let partial = if report.interrupted {
            " [interrupted, partial data]"
        } else {
            ""
        };
        if self.verbose {
            format!(
                "Drift: {:+.3} s/day ({}) [good ticks: {}, analyzed: {}]{}",
                report.seconds_per_day,
                report.direction,
                report.good_ticks,
                report.ticks_analyzed,
                partial
            )
        } else {
            format!(
                "Drift: {:+.3} s/day ({}){}",
                report.seconds_per_day, report.direction, partial
            )
        }
    }
}

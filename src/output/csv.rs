use super::{DriftReport, Formatter};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, report: &DriftReport) -> String {
        format!(
            "{},{:.6},{},{},{},{}",
            report.timestamp,
            report.seconds_per_day,
            report.direction,
            report.good_ticks,
            report.ticks_analyzed,
            report.interrupted
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("timestamp,seconds_per_day,direction,good_ticks,ticks_analyzed,interrupted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_row_matches_header_arity() {
        let report = DriftReport {
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            seconds_per_day: -0.25,
            direction: "slow".to_string(),
            good_ticks: 3,
            ticks_analyzed: 4,
            interrupted: false,
        };
        let header_fields = CsvFormatter.header().unwrap().split(',').count();
        let row_fields = CsvFormatter.format(&report).split(',').count();
        assert_eq!(header_fields, row_fields);
    }
}

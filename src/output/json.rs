use super::{DriftReport, Formatter};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, report: &DriftReport) -> String {
        serde_json::to_string(report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

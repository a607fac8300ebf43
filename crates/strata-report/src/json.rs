use serde::Serialize;

use strata_core::report::Report;
use strata_core::types::Severity;

fn to_json<T: Serialize>(value: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(value).expect("report types should be serializable")
    } else {
        serde_json::to_string_pretty(value).expect("report types should be serializable")
    }
}

/// Format a full analysis report as JSON.
pub fn format_report(report: &Report, compact: bool) -> String {
    to_json(report, compact)
}

/// Wrapper for check output that adds pass/fail metadata.
#[derive(Debug, Serialize)]
pub struct CheckOutput<'a> {
    #[serde(flatten)]
    pub report: &'a Report,
    pub check: CheckStatus,
}

#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub passed: bool,
    pub fail_on: Severity,
    pub failing_violation_count: usize,
}

/// Format a check result as JSON. Returns (json_string, passed).
pub fn format_check(report: &Report, fail_on: Severity, compact: bool) -> (String, bool) {
    let failing = report.count_at_least(fail_on);
    let passed = failing == 0;

    let output = CheckOutput {
        report,
        check: CheckStatus {
            passed,
            fail_on,
            failing_violation_count: failing,
        },
    };

    (to_json(&output, compact), passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{clean_report, sample_report};

    #[test]
    fn test_format_report_valid_json() {
        let json = format_report(&sample_report(), false);
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
        assert_eq!(parsed["metrics"]["total_files"], 4);
        assert_eq!(parsed["graph_metrics"]["edge_count"], 4);
        assert_eq!(
            parsed["violations"]["layer-direction"][0]["severity"],
            "critical"
        );
        assert_eq!(
            parsed["violations"]["circular-dependency"][0]["kind"]["CircularDependency"]["cycle"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
        assert!(parsed["violations"]["naming"].as_array().is_some_and(Vec::is_empty));
        assert_eq!(parsed["units"].as_array().map(Vec::len), Some(4));
        assert!(parsed["units"][0].get("content").is_none());
        assert_eq!(parsed["graph"][0]["path"], "src/domain/order/Order.ts");
    }

    #[test]
    fn test_format_report_compact_is_single_line() {
        let json = format_report(&clean_report(), true);
        assert!(!json.contains('\n'), "compact JSON should be single line");
        let _: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
    }

    #[test]
    fn test_format_check_passed() {
        let (json, passed) = format_check(&clean_report(), Severity::Low, false);
        assert!(passed);
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
        assert_eq!(parsed["check"]["passed"], true);
        assert_eq!(parsed["check"]["failing_violation_count"], 0);
        assert_eq!(parsed["check"]["fail_on"], "low");
    }

    #[test]
    fn test_format_check_failed_keeps_report_fields() {
        let (json, passed) = format_check(&sample_report(), Severity::Medium, true);
        assert!(!passed);
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
        assert_eq!(parsed["check"]["passed"], false);
        assert_eq!(parsed["check"]["failing_violation_count"], 4);
        assert!(parsed.get("violations").is_some());
        assert!(parsed.get("metrics").is_some());
    }
}

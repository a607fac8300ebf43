use colored::Colorize;

use strata_core::report::Report;
use strata_core::types::{RuleCategory, Severity, Violation, ViolationKind};

/// Display filters for the text report. They never change what was analyzed.
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    /// Hide violations less severe than this.
    pub min_severity: Option<Severity>,
    /// Show at most this many violations per category.
    pub limit: Option<usize>,
}

fn category_title(category: RuleCategory) -> &'static str {
    match category {
        RuleCategory::LayerDirection => "Layer direction",
        RuleCategory::CircularDependency => "Circular dependencies",
        RuleCategory::AggregateBoundary => "Aggregate boundaries",
        RuleCategory::Naming => "Naming",
        RuleCategory::ForbiddenPackage => "Forbidden packages",
        RuleCategory::HardcodedSecret => "Hardcoded secrets",
    }
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => "CRITICAL".red().bold().to_string(),
        Severity::High => "HIGH".red().to_string(),
        Severity::Medium => "MEDIUM".yellow().to_string(),
        Severity::Low => "LOW".blue().to_string(),
    }
}

/// Format a full analysis report for terminal output.
pub fn format_report(report: &Report, options: &TextOptions) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "Strata - Layered Architecture Analysis".bold()
    ));
    out.push_str(&format!("{}\n", "=".repeat(40)));

    let metrics = &report.metrics;
    out.push_str(&format!(
        "\n{}: {} files, {} imports, {} functions\n",
        "Summary".bold(),
        metrics.total_files,
        metrics.total_imports,
        metrics.total_functions,
    ));

    out.push_str(&format!("\n{}\n{}\n", "Metrics".bold(), "-".repeat(40)));
    out.push_str("  Files by layer:\n");
    for (layer, count) in &metrics.files_by_layer {
        out.push_str(&format!("    {layer}: {count}\n"));
    }
    out.push_str(&format!(
        "  Layer coverage: {:.1}%\n",
        metrics.classification_coverage()
    ));
    let graph = &report.graph_metrics;
    out.push_str(&format!(
        "  Dependency graph: {} edges, out-degree avg={:.2} max={}\n",
        graph.edge_count, graph.avg_out_degree, graph.max_out_degree
    ));

    let total = report.total_violations();
    if total == 0 {
        out.push_str(&format!("\n{}\n", "No violations found!".green().bold()));
        out.push('\n');
        return out;
    }

    let counts = report.severity_counts();
    out.push_str(&format!(
        "\n{} ({} found: {} critical, {} high, {} medium, {} low)\n{}\n",
        "Violations".red().bold(),
        total,
        counts[&Severity::Critical],
        counts[&Severity::High],
        counts[&Severity::Medium],
        counts[&Severity::Low],
        "-".repeat(40),
    ));

    for (category, violations) in &report.violations {
        let shown: Vec<&Violation> = violations
            .iter()
            .filter(|v| {
                options
                    .min_severity
                    .map_or(true, |min| v.severity.is_at_least(min))
            })
            .collect();
        if shown.is_empty() {
            continue;
        }

        out.push_str(&format!(
            "\n{} ({})\n",
            category_title(*category).bold(),
            shown.len()
        ));

        let limit = options.limit.unwrap_or(usize::MAX);
        for v in shown.iter().take(limit) {
            out.push_str(&format_violation(v));
        }
        if shown.len() > limit {
            out.push_str(&format!(
                "  {}\n",
                format!("... and {} more", shown.len() - limit).dimmed()
            ));
        }
    }

    out.push('\n');
    out
}

fn format_violation(v: &Violation) -> String {
    let detail = match &v.kind {
        ViolationKind::LayerDirection {
            from_layer,
            to_layer,
            ..
        } => format!("{from_layer} -> {to_layer}"),
        ViolationKind::CircularDependency { cycle } => format!("{} files", cycle.len()),
        ViolationKind::AggregateBoundary {
            from_aggregate,
            to_aggregate,
            ..
        } => format!("{from_aggregate} -> {to_aggregate}"),
        ViolationKind::Naming { suggested, .. } => format!("rename to {suggested}"),
        ViolationKind::ForbiddenPackage { package, .. } => package.clone(),
        ViolationKind::HardcodedSecret {
            secret_type,
            column,
        } => format!("{secret_type} at column {column}"),
    };

    let mut out = format!(
        "\n  {} [{}] {}\n",
        severity_label(v.severity),
        detail,
        v.location
    );
    out.push_str(&format!("    {}\n", v.message));
    if let Some(ref suggestion) = v.suggestion {
        out.push_str(&format!("    {}: {}\n", "Suggestion".cyan(), suggestion));
    }
    out
}

/// Format a check result for CI use. Returns (text, passed).
pub fn format_check(report: &Report, fail_on: Severity) -> (String, bool) {
    let failing = report.count_at_least(fail_on);
    let passed = failing == 0;

    let mut out = format_report(report, &TextOptions::default());

    if passed {
        out.push_str(&format!("{}\n", "CHECK PASSED".green().bold()));
    } else {
        out.push_str(&format!(
            "{}: {} violation(s) at severity {} or above\n",
            "CHECK FAILED".red().bold(),
            failing,
            fail_on,
        ));
    }

    (out, passed)
}

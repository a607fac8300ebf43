use std::collections::BTreeMap;

use serde::Serialize;

use crate::detectors::DetectorOutput;
use crate::graph::{DependencyGraph, GraphMetrics};
use crate::metrics::ProjectMetrics;
use crate::source::SourceUnit;
use crate::types::{RuleCategory, Severity, Violation};

/// Everything one analysis run produced. The only value handed to
/// presentation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub units: Vec<SourceUnit>,
    pub graph: DependencyGraph,
    /// Every category is present; each list is sorted by severity.
    pub violations: BTreeMap<RuleCategory, Vec<Violation>>,
    pub metrics: ProjectMetrics,
    pub graph_metrics: GraphMetrics,
}

/// Merge detector outputs into a report.
///
/// Metrics come from `units` alone, so they are correct even when every
/// detector returned nothing. Each category is sorted by severity rank with
/// a stable sort, keeping detector order within a tier.
pub fn aggregate(
    outputs: Vec<DetectorOutput>,
    units: Vec<SourceUnit>,
    graph: DependencyGraph,
) -> Report {
    let mut violations: BTreeMap<RuleCategory, Vec<Violation>> = RuleCategory::ALL
        .into_iter()
        .map(|c| (c, Vec::new()))
        .collect();

    for output in outputs {
        for violation in output.violations {
            violations.entry(violation.rule).or_default().push(violation);
        }
    }
    for list in violations.values_mut() {
        list.sort_by_key(|v| v.severity.rank());
    }

    let metrics = ProjectMetrics::compute(&units);
    let graph_metrics = graph.metrics();

    Report {
        units,
        graph,
        violations,
        metrics,
        graph_metrics,
    }
}

impl Report {
    pub fn total_violations(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }

    /// All violations, category by category.
    pub fn all_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.values().flatten()
    }

    pub fn violations_for(&self, category: RuleCategory) -> &[Violation] {
        self.violations
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of violations at `threshold` or more severe.
    pub fn count_at_least(&self, threshold: Severity) -> usize {
        self.all_violations()
            .filter(|v| v.severity.is_at_least(threshold))
            .count()
    }

    /// Violation counts per severity, every severity present.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> = [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .into_iter()
        .map(|s| (s, 0))
        .collect();
        for v in self.all_violations() {
            *counts.entry(v.severity).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceLocation, ViolationKind};

    fn naming(file: &str, severity: Severity) -> Violation {
        Violation {
            rule: RuleCategory::Naming,
            kind: ViolationKind::Naming {
                actual: file.to_string(),
                suggested: format!("{file}Service"),
            },
            severity,
            location: SourceLocation::file(file),
            message: String::new(),
            suggestion: None,
        }
    }

    #[test]
    fn test_sort_is_by_severity_and_stable() {
        let output = DetectorOutput {
            category: RuleCategory::Naming,
            violations: vec![
                naming("low-1", Severity::Low),
                naming("high-1", Severity::High),
                naming("crit-1", Severity::Critical),
                naming("low-2", Severity::Low),
                naming("high-2", Severity::High),
            ],
        };
        let report = aggregate(vec![output], Vec::new(), DependencyGraph::new());

        let files: Vec<_> = report
            .violations_for(RuleCategory::Naming)
            .iter()
            .map(|v| v.location.file.as_str())
            .collect();
        assert_eq!(files, vec!["crit-1", "high-1", "high-2", "low-1", "low-2"]);
    }

    #[test]
    fn test_every_category_present_and_counts() {
        let output = DetectorOutput {
            category: RuleCategory::Naming,
            violations: vec![naming("a", Severity::Low), naming("b", Severity::High)],
        };
        let report = aggregate(vec![output], Vec::new(), DependencyGraph::new());

        assert_eq!(report.violations.len(), RuleCategory::ALL.len());
        assert!(report.violations_for(RuleCategory::LayerDirection).is_empty());
        assert_eq!(report.total_violations(), 2);
        assert_eq!(report.count_at_least(Severity::High), 1);
        assert_eq!(report.count_at_least(Severity::Low), 2);
        assert_eq!(report.severity_counts()[&Severity::Medium], 0);
    }

    #[test]
    fn test_metrics_do_not_depend_on_detectors() {
        let classifier = crate::layer::LayerClassifier::default();
        let units = vec![SourceUnit::from_content(
            "src/domain/a.ts",
            "import x from './b';".to_string(),
            &classifier,
        )];
        let report = aggregate(Vec::new(), units, DependencyGraph::new());
        assert_eq!(report.metrics.total_files, 1);
        assert_eq!(report.metrics.total_imports, 1);
        assert_eq!(report.total_violations(), 0);
    }
}

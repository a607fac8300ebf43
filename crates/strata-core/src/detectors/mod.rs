//! Rule detectors.
//!
//! Each detector is a pure function over the built source model and graph.
//! None of them mutate shared state, so the pipeline runs them in parallel
//! and collects their outputs in registration order.

mod aggregate;
mod cycles;
mod layering;
mod naming;
mod packages;
mod secrets;

use std::sync::Arc;

pub use aggregate::{infer_aggregate, AggregateBoundaryDetector};
pub use cycles::{render_cycle, CycleDetector};
pub use layering::LayerDirectionDetector;
pub use naming::NamingDetector;
pub use packages::{package_name, ForbiddenPackageDetector};
pub use secrets::SecretDetector;

use crate::config::Config;
use crate::graph::DependencyGraph;
use crate::layer::LayerClassifier;
use crate::secrets::SecretScanner;
use crate::source::SourceUnit;
use crate::types::{RuleCategory, SeverityMap, Violation};

/// Read-only inputs shared by every detector in a run.
#[derive(Clone, Copy)]
pub struct DetectionContext<'a> {
    pub units: &'a [SourceUnit],
    pub graph: &'a DependencyGraph,
    pub classifier: &'a LayerClassifier,
    pub severities: &'a SeverityMap,
}

/// A rule detector.
pub trait Detector: Send + Sync {
    /// Category every violation from this detector belongs to.
    fn category(&self) -> RuleCategory;

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation>;
}

/// Output of one detector, tagged with the category it covers.
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    pub category: RuleCategory,
    pub violations: Vec<Violation>,
}

/// The built-in detectors for `config`, minus any listed in `rules.disabled`.
pub fn default_detectors(
    config: &Config,
    scanner: Arc<dyn SecretScanner>,
) -> Vec<Box<dyn Detector>> {
    let all: Vec<Box<dyn Detector>> = vec![
        Box::new(LayerDirectionDetector::new(config.layers.allowed.clone())),
        Box::new(CycleDetector),
        Box::new(AggregateBoundaryDetector::new(config.aggregates.clone())),
        Box::new(NamingDetector::new(config.naming.clone())),
        Box::new(ForbiddenPackageDetector::new(config.packages.clone())),
        Box::new(SecretDetector::new(scanner)),
    ];

    all.into_iter()
        .filter(|d| {
            let enabled = config.rules.is_enabled(d.category());
            if !enabled {
                tracing::debug!(rule = %d.category(), "rule disabled");
            }
            enabled
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn units(files: &[(&str, &str)]) -> Vec<SourceUnit> {
        let classifier = LayerClassifier::default();
        files
            .iter()
            .map(|(path, content)| SourceUnit::from_content(path, content.to_string(), &classifier))
            .collect()
    }

    /// Run one detector over in-memory files with default classification.
    pub fn run(detector: &dyn Detector, files: &[(&str, &str)]) -> Vec<Violation> {
        run_with(detector, files, &SeverityMap::new())
    }

    pub fn run_with(
        detector: &dyn Detector,
        files: &[(&str, &str)],
        severities: &SeverityMap,
    ) -> Vec<Violation> {
        let units = units(files);
        let graph = DependencyGraph::build(&units);
        let classifier = LayerClassifier::default();
        let ctx = DetectionContext {
            units: &units,
            graph: &graph,
            classifier: &classifier,
            severities,
        };
        detector.detect(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::RegexSecretScanner;

    #[test]
    fn test_default_detectors_cover_every_category() {
        let detectors = default_detectors(&Config::default(), Arc::new(RegexSecretScanner));
        let categories: Vec<_> = detectors.iter().map(|d| d.category()).collect();
        assert_eq!(categories, RuleCategory::ALL.to_vec());
    }

    #[test]
    fn test_disabled_rules_are_not_registered() {
        let mut config = Config::default();
        config.rules.disabled = vec!["naming".to_string(), "hardcoded_secret".to_string()];
        let detectors = default_detectors(&config, Arc::new(RegexSecretScanner));
        let categories: Vec<_> = detectors.iter().map(|d| d.category()).collect();
        assert!(!categories.contains(&RuleCategory::Naming));
        assert!(!categories.contains(&RuleCategory::HardcodedSecret));
        assert_eq!(categories.len(), 4);
    }
}

//! Renderers for strata reports. Nothing here analyzes; every function
//! takes a finished [`strata_core::Report`] and returns a string.

pub mod dot;
pub mod json;
pub mod text;

#[cfg(test)]
pub(crate) mod fixtures {
    use strata_core::detectors::{
        AggregateBoundaryDetector, CycleDetector, DetectionContext, Detector, DetectorOutput,
        LayerDirectionDetector,
    };
    use strata_core::report::aggregate;
    use strata_core::{DependencyGraph, LayerClassifier, Report, SeverityMap, SourceUnit};

    /// A small report with one layer violation, one cycle and one
    /// cross-aggregate import.
    pub fn sample_report() -> Report {
        report_for(&[
            (
                "src/domain/order/Order.ts",
                "import { Db } from '../../infrastructure/Db';\nimport { User } from '../user/User';\n",
            ),
            (
                "src/domain/user/User.ts",
                "import { Order } from '../order/Order';\n",
            ),
            ("src/infrastructure/Db.ts", "export class Db {}\n"),
            ("src/main.ts", "import { Db } from './infrastructure/Db';\n"),
        ])
    }

    pub fn clean_report() -> Report {
        report_for(&[
            ("src/domain/Order.ts", "import { Money } from '../shared/Money';\n"),
            ("src/shared/Money.ts", "export class Money {}\n"),
        ])
    }

    fn report_for(files: &[(&str, &str)]) -> Report {
        let classifier = LayerClassifier::default();
        let units: Vec<SourceUnit> = files
            .iter()
            .map(|(p, c)| SourceUnit::from_content(p, c.to_string(), &classifier))
            .collect();
        let graph = DependencyGraph::build(&units);
        let severities = SeverityMap::new();
        let ctx = DetectionContext {
            units: &units,
            graph: &graph,
            classifier: &classifier,
            severities: &severities,
        };
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(LayerDirectionDetector::default()),
            Box::new(CycleDetector),
            Box::new(AggregateBoundaryDetector::default()),
        ];
        let outputs = detectors
            .iter()
            .map(|d| DetectorOutput {
                category: d.category(),
                violations: d.detect(&ctx),
            })
            .collect();
        aggregate(outputs, units, graph)
    }
}

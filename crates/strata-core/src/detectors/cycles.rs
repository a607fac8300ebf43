use crate::types::{RuleCategory, SourceLocation, Violation, ViolationKind};

use super::{DetectionContext, Detector};

/// One violation per cycle reported by the dependency graph.
pub struct CycleDetector;

/// `a → b → c → a`
pub fn render_cycle(cycle: &[String]) -> String {
    let mut chain: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        chain.push(first);
    }
    chain.join(" → ")
}

impl Detector for CycleDetector {
    fn category(&self) -> RuleCategory {
        RuleCategory::CircularDependency
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation> {
        ctx.graph
            .find_cycles()
            .into_iter()
            .filter_map(|cycle| {
                let start = cycle.first()?.clone();
                let message = format!("Circular dependency detected: {}", render_cycle(&cycle));
                Some(
                    Violation::new(
                        ViolationKind::CircularDependency { cycle },
                        SourceLocation::file(&start),
                        message,
                        ctx.severities,
                    )
                    .with_suggestion(
                        "Break the cycle by extracting the shared part or depending on an abstraction",
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::run;
    use crate::types::Severity;

    #[test]
    fn test_three_file_cycle_message_closes_loop() {
        let violations = run(
            &CycleDetector,
            &[
                ("src/a.ts", "import { b } from './b';\n"),
                ("src/b.ts", "import { c } from './c';\n"),
                ("src/c.ts", "import { a } from './a';\n"),
            ],
        );
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(
            v.message,
            "Circular dependency detected: src/a.ts → src/b.ts → src/c.ts → src/a.ts"
        );
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.location, SourceLocation::file("src/a.ts"));
        assert_eq!(
            v.kind,
            ViolationKind::CircularDependency {
                cycle: vec!["src/a.ts".into(), "src/b.ts".into(), "src/c.ts".into()],
            }
        );
    }

    #[test]
    fn test_no_imports_no_violations() {
        let violations = run(&CycleDetector, &[("src/a.ts", ""), ("src/b.ts", "")]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_render_self_loop() {
        assert_eq!(render_cycle(&["a.ts".to_string()]), "a.ts → a.ts");
        assert_eq!(render_cycle(&[]), "");
    }
}

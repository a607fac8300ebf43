use std::sync::Arc;

use rayon::prelude::*;

use crate::secrets::SecretScanner;
use crate::types::{RuleCategory, SourceLocation, Violation, ViolationKind};

use super::{DetectionContext, Detector};

/// Wraps the secret scanning collaborator, one scan per file.
pub struct SecretDetector {
    scanner: Arc<dyn SecretScanner>,
}

impl SecretDetector {
    pub fn new(scanner: Arc<dyn SecretScanner>) -> Self {
        Self { scanner }
    }
}

impl Detector for SecretDetector {
    fn category(&self) -> RuleCategory {
        RuleCategory::HardcodedSecret
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation> {
        let per_file: Vec<Vec<Violation>> = ctx
            .units
            .par_iter()
            .map(|unit| {
                let findings = match self.scanner.detect_secrets(&unit.content, &unit.path) {
                    Ok(findings) => findings,
                    Err(e) => {
                        tracing::warn!("secret scan failed for {}: {e:#}", unit.path);
                        return Vec::new();
                    }
                };
                findings
                    .into_iter()
                    .map(|f| {
                        Violation::new(
                            ViolationKind::HardcodedSecret {
                                secret_type: f.secret_type,
                                column: f.column,
                            },
                            SourceLocation::at(&unit.path, f.line),
                            f.message,
                            ctx.severities,
                        )
                        .with_suggestion("Load the value from the environment or a secret store")
                    })
                    .collect()
            })
            .collect();

        per_file.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::run;
    use crate::secrets::{RegexSecretScanner, SecretFinding};
    use crate::types::Severity;

    struct FlakyScanner;

    impl SecretScanner for FlakyScanner {
        fn detect_secrets(&self, _content: &str, path: &str) -> anyhow::Result<Vec<SecretFinding>> {
            if path.contains("broken") {
                anyhow::bail!("scanner crashed");
            }
            Ok(vec![SecretFinding {
                line: 3,
                column: 9,
                secret_type: "Fake".to_string(),
                message: "Hardcoded Fake detected".to_string(),
            }])
        }
    }

    #[test]
    fn test_findings_become_violations() {
        let detector = SecretDetector::new(Arc::new(RegexSecretScanner));
        let violations = run(
            &detector,
            &[
                ("src/config.ts", "export const password = \"supersecret123\";\n"),
                ("src/clean.ts", "export const x = 1;\n"),
            ],
        );
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.location, SourceLocation::at("src/config.ts", 1));
        assert!(matches!(
            &v.kind,
            ViolationKind::HardcodedSecret { secret_type, .. } if secret_type == "Password or secret"
        ));
    }

    #[test]
    fn test_scanner_failure_is_zero_findings_for_that_file() {
        let detector = SecretDetector::new(Arc::new(FlakyScanner));
        let violations = run(&detector, &[("a.ts", ""), ("broken.ts", ""), ("c.ts", "")]);
        let files: Vec<_> = violations.iter().map(|v| v.location.file.as_str()).collect();
        assert_eq!(files, vec!["a.ts", "c.ts"]);
        assert_eq!(violations[0].location.line, Some(3));
        assert!(matches!(
            violations[0].kind,
            ViolationKind::HardcodedSecret { column: 9, .. }
        ));
    }
}

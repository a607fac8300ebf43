use crate::config::AllowedLayers;
use crate::types::{RuleCategory, SourceLocation, Violation, ViolationKind};

use super::{DetectionContext, Detector};

/// Flags imports that point into a layer the importing layer may not depend on.
///
/// The target layer is inferred from the specifier text alone, so an import
/// that names no layer keyword is never flagged.
pub struct LayerDirectionDetector {
    allowed: AllowedLayers,
}

impl LayerDirectionDetector {
    pub fn new(allowed: AllowedLayers) -> Self {
        Self { allowed }
    }
}

impl Default for LayerDirectionDetector {
    fn default() -> Self {
        Self::new(AllowedLayers::default())
    }
}

impl Detector for LayerDirectionDetector {
    fn category(&self) -> RuleCategory {
        RuleCategory::LayerDirection
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for unit in ctx.units {
            let Some(from_layer) = unit.layer else {
                continue;
            };
            for import in &unit.imports {
                let Some(to_layer) = ctx.classifier.classify(&import.specifier) else {
                    continue;
                };
                if self.allowed.permits(from_layer, to_layer) {
                    continue;
                }

                let allowed = self
                    .allowed
                    .for_layer(from_layer)
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>();
                let suggestion = if allowed.is_empty() {
                    format!("{from_layer} code should not import from other layers")
                } else {
                    format!(
                        "{from_layer} may only depend on: {}. Invert the dependency behind an interface owned by {from_layer}",
                        allowed.join(", ")
                    )
                };

                violations.push(
                    Violation::new(
                        ViolationKind::LayerDirection {
                            from_layer,
                            to_layer,
                            import: import.specifier.clone(),
                        },
                        SourceLocation::at(&unit.path, import.line),
                        format!(
                            "{from_layer} layer imports {to_layer} layer ('{}')",
                            import.specifier
                        ),
                        ctx.severities,
                    )
                    .with_suggestion(suggestion),
                );
            }
        }

        violations
    }
}

use crate::config::AggregatesConfig;
use crate::graph::join_relative;
use crate::source::SourceUnit;
use crate::types::{RuleCategory, SourceLocation, Violation, ViolationKind};

use super::{DetectionContext, Detector};

/// Infer the aggregate (bounded context) a path belongs to.
///
/// Directory segments after the first root marker are walked, skipping
/// structural folders; the first remaining segment names the aggregate.
/// The last path segment is treated as the file name and never names one.
pub fn infer_aggregate(path: &str, config: &AggregatesConfig) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (_, dirs) = segments.split_last()?;

    let marker = dirs
        .iter()
        .position(|seg| contains_ignore_case(&config.root_markers, seg))?;

    dirs[marker + 1..]
        .iter()
        .find(|seg| !contains_ignore_case(&config.structural_folders, seg))
        .map(|seg| seg.to_string())
}

fn contains_ignore_case(list: &[String], seg: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(seg))
}

/// Flags relative imports that reach into a sibling aggregate.
///
/// Purely path based: imports are joined lexically, never resolved against
/// the file system or the graph.
pub struct AggregateBoundaryDetector {
    config: AggregatesConfig,
}

impl AggregateBoundaryDetector {
    pub fn new(config: AggregatesConfig) -> Self {
        Self { config }
    }

    /// True if the target directory path passes through a shared structural
    /// folder after the root marker (e.g. `domain/user/value-objects/UserId`).
    fn is_shared_target(&self, target: &str) -> bool {
        let segments: Vec<&str> = target.split('/').collect();
        let Some((_, dirs)) = segments.split_last() else {
            return false;
        };
        let Some(marker) = dirs
            .iter()
            .position(|seg| contains_ignore_case(&self.config.root_markers, seg))
        else {
            return false;
        };
        dirs[marker + 1..]
            .iter()
            .any(|seg| contains_ignore_case(&self.config.shared_folders, seg))
    }

    /// `../X` or `../<structural>/X` written from inside one of the
    /// aggregate's own structural folders.
    fn is_internal_reference(&self, unit: &SourceUnit, specifier: &str) -> bool {
        let own_folder = unit.dir().rsplit('/').next().unwrap_or("");
        if !contains_ignore_case(&self.config.structural_folders, own_folder) {
            return false;
        }
        let Some(rest) = specifier.strip_prefix("../") else {
            return false;
        };
        match rest.split('/').collect::<Vec<_>>().as_slice() {
            [name] => !name.is_empty() && *name != "..",
            [folder, name] => {
                contains_ignore_case(&self.config.structural_folders, folder) && !name.is_empty()
            }
            _ => false,
        }
    }
}

impl Default for AggregateBoundaryDetector {
    fn default() -> Self {
        Self::new(AggregatesConfig::default())
    }
}

impl Detector for AggregateBoundaryDetector {
    fn category(&self) -> RuleCategory {
        RuleCategory::AggregateBoundary
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for unit in ctx.units {
            let Some(from_aggregate) = infer_aggregate(&unit.path, &self.config) else {
                continue;
            };

            for import in unit.imports.iter().filter(|i| i.is_relative()) {
                let Some(target) = join_relative(unit.dir(), &import.specifier) else {
                    continue;
                };
                let Some(to_aggregate) = infer_aggregate(&target, &self.config) else {
                    continue;
                };
                if to_aggregate == from_aggregate
                    || self.is_shared_target(&target)
                    || self.is_internal_reference(unit, &import.specifier)
                {
                    continue;
                }

                violations.push(
                    Violation::new(
                        ViolationKind::AggregateBoundary {
                            from_aggregate: from_aggregate.clone(),
                            to_aggregate: to_aggregate.clone(),
                            import: import.specifier.clone(),
                        },
                        SourceLocation::at(&unit.path, import.line),
                        format!(
                            "Aggregate '{from_aggregate}' imports from aggregate '{to_aggregate}' ('{}')",
                            import.specifier
                        ),
                        ctx.severities,
                    )
                    .with_suggestion(format!(
                        "Reference '{to_aggregate}' by identity or through a domain event instead of importing it"
                    )),
                );
            }
        }

        violations
    }
}

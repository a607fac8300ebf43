use crate::config::PackagesConfig;
use crate::types::{RuleCategory, SourceLocation, Violation, ViolationKind};

use super::{DetectionContext, Detector};

/// Package name of a bare import specifier.
///
/// `@scope/name/deep` -> `@scope/name`, `name/deep` -> `name`. Relative,
/// absolute, `node:` builtin and `@/` / `~/` alias specifiers have none.
pub fn package_name(specifier: &str) -> Option<&str> {
    if specifier.is_empty()
        || specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with('~')
        || specifier.starts_with("node:")
    {
        return None;
    }

    if let Some(scoped) = specifier.strip_prefix('@') {
        let mut parts = scoped.splitn(3, '/');
        let scope = parts.next().filter(|s| !s.is_empty())?;
        return match parts.next() {
            Some(name) if !name.is_empty() => Some(&specifier[..scope.len() + name.len() + 2]),
            _ => Some(specifier),
        };
    }

    specifier.split('/').next()
}

/// Flags third-party packages a layer is not allowed to use.
pub struct ForbiddenPackageDetector {
    config: PackagesConfig,
}

impl ForbiddenPackageDetector {
    pub fn new(config: PackagesConfig) -> Self {
        Self { config }
    }
}

impl Default for ForbiddenPackageDetector {
    fn default() -> Self {
        Self::new(PackagesConfig::default())
    }
}

impl Detector for ForbiddenPackageDetector {
    fn category(&self) -> RuleCategory {
        RuleCategory::ForbiddenPackage
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for unit in ctx.units {
            let Some(layer) = unit.layer else { continue };
            let denied = self.config.denied(layer);
            if denied.is_empty() {
                continue;
            }

            for import in &unit.imports {
                let Some(package) = package_name(&import.specifier) else {
                    continue;
                };
                if !denied.iter().any(|d| d == package) {
                    continue;
                }
                violations.push(
                    Violation::new(
                        ViolationKind::ForbiddenPackage {
                            package: package.to_string(),
                            layer,
                        },
                        SourceLocation::at(&unit.path, import.line),
                        format!("{layer} layer depends on forbidden package '{package}'"),
                        ctx.severities,
                    )
                    .with_suggestion(format!(
                        "Move the '{package}' usage to the infrastructure layer behind a port"
                    )),
                );
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::run;
    use crate::types::Layer;

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("typeorm"), Some("typeorm"));
        assert_eq!(package_name("lodash/fp"), Some("lodash"));
        assert_eq!(package_name("@prisma/client"), Some("@prisma/client"));
        assert_eq!(package_name("@aws-sdk/client-s3/dist/x"), Some("@aws-sdk/client-s3"));
        assert_eq!(package_name("@scope"), Some("@scope"));
        assert_eq!(package_name("./local"), None);
        assert_eq!(package_name("../up"), None);
        assert_eq!(package_name("/abs/path"), None);
        assert_eq!(package_name("node:fs"), None);
        assert_eq!(package_name("@/components/Button"), None);
        assert_eq!(package_name("~/utils"), None);
    }

    #[test]
    fn test_domain_using_orm_is_flagged() {
        let violations = run(
            &ForbiddenPackageDetector::default(),
            &[(
                "src/domain/order/Order.ts",
                "import { z } from 'zod';\nimport { Entity } from 'typeorm';\nimport { PrismaClient } from '@prisma/client';\n",
            )],
        );
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0].kind,
            ViolationKind::ForbiddenPackage {
                package: "typeorm".to_string(),
                layer: Layer::Domain,
            }
        );
        assert_eq!(violations[0].location.line, Some(2));
        assert_eq!(violations[1].location.line, Some(3));
    }

    #[test]
    fn test_infrastructure_may_use_anything() {
        let violations = run(
            &ForbiddenPackageDetector::default(),
            &[(
                "src/infrastructure/db/OrderRepo.ts",
                "import { Entity } from 'typeorm';\nimport express from 'express';\n",
            )],
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_application_may_use_http_client() {
        let violations = run(
            &ForbiddenPackageDetector::default(),
            &[("src/application/Sync.ts", "import axios from 'axios';\n")],
        );
        assert!(violations.is_empty());
    }
}

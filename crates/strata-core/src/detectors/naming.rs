use crate::config::NamingConfig;
use crate::source::SourceUnit;
use crate::types::{Layer, RuleCategory, SourceLocation, Violation, ViolationKind};

use super::{DetectionContext, Detector};

/// File naming conventions for layered code.
///
/// Files directly inside a conventional folder (`repositories`, `services`,
/// ...) must carry the folder's suffix. Domain files must not use a vague
/// suffix such as `Manager` or `Helper`. At most one violation per file.
pub struct NamingDetector {
    config: NamingConfig,
    /// Vague suffixes longest first so `Utils` wins over `Util`.
    vague: Vec<(String, String)>,
}

impl NamingDetector {
    pub fn new(config: NamingConfig) -> Self {
        let mut vague: Vec<(String, String)> = config
            .vague_suffixes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        vague.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { config, vague }
    }

    fn check(&self, unit: &SourceUnit, ctx: &DetectionContext<'_>) -> Option<Violation> {
        let layer = unit.layer?;
        let stem = unit.stem();
        if stem.is_empty() || stem.eq_ignore_ascii_case("index") {
            return None;
        }
        let extension = unit.path.rsplit_once('.').map(|(_, e)| e).unwrap_or("ts");

        if layer == Layer::Domain {
            if let Some((vague, preferred)) = self
                .vague
                .iter()
                .find(|(suffix, _)| stem.len() > suffix.len() && stem.ends_with(suffix.as_str()))
            {
                let base = &stem[..stem.len() - vague.len()];
                let suggested = format!("{base}{preferred}.{extension}");
                return Some(self.violation(
                    unit,
                    suggested,
                    format!("'{stem}' uses the vague suffix '{vague}' in the domain layer"),
                    ctx,
                ));
            }
        }

        let folder = unit.dir().rsplit('/').next().unwrap_or("").to_lowercase();
        let suffix = self.config.suffixes.get(&folder)?;
        if normalized(stem).ends_with(&suffix.to_lowercase()) {
            return None;
        }
        let suggested = format!("{stem}{suffix}.{extension}");
        Some(self.violation(
            unit,
            suggested,
            format!("'{stem}' in '{folder}' should end with '{suffix}'"),
            ctx,
        ))
    }

    fn violation(
        &self,
        unit: &SourceUnit,
        suggested: String,
        message: String,
        ctx: &DetectionContext<'_>,
    ) -> Violation {
        let actual = unit.path.rsplit('/').next().unwrap_or(&unit.path).to_string();
        let suggestion = format!("Rename to '{suggested}'");
        Violation::new(
            ViolationKind::Naming { actual, suggested },
            SourceLocation::file(&unit.path),
            message,
            ctx.severities,
        )
        .with_suggestion(suggestion)
    }
}

impl Default for NamingDetector {
    fn default() -> Self {
        Self::new(NamingConfig::default())
    }
}

/// Lower-case with separators removed: `order.repository` -> `orderrepository`.
fn normalized(stem: &str) -> String {
    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

impl Detector for NamingDetector {
    fn category(&self) -> RuleCategory {
        RuleCategory::Naming
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<Violation> {
        ctx.units
            .iter()
            .filter_map(|unit| self.check(unit, ctx))
            .collect()
    }
}

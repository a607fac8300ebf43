use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Architectural layer a source file belongs to.
/// Declaration order is the classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Domain,
    Application,
    Infrastructure,
    Shared,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Domain,
        Layer::Application,
        Layer::Infrastructure,
        Layer::Shared,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Domain => "domain",
            Layer::Application => "application",
            Layer::Infrastructure => "infrastructure",
            Layer::Shared => "shared",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Layer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "domain" => Ok(Layer::Domain),
            "application" => Ok(Layer::Application),
            "infrastructure" => Ok(Layer::Infrastructure),
            "shared" => Ok(Layer::Shared),
            _ => Err(anyhow::anyhow!("unknown layer: {s}")),
        }
    }
}

/// Severity of a violation. `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank: 0 = critical.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// True if `self` is as severe as `threshold` or more.
    pub fn is_at_least(&self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" | "med" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(anyhow::anyhow!("unknown severity: {s}")),
        }
    }
}

/// Rule category. Every violation belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    LayerDirection,
    CircularDependency,
    AggregateBoundary,
    Naming,
    ForbiddenPackage,
    HardcodedSecret,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 6] = [
        RuleCategory::LayerDirection,
        RuleCategory::CircularDependency,
        RuleCategory::AggregateBoundary,
        RuleCategory::Naming,
        RuleCategory::ForbiddenPackage,
        RuleCategory::HardcodedSecret,
    ];

    /// Stable rule identifier used in config and output.
    pub fn id(&self) -> &'static str {
        match self {
            RuleCategory::LayerDirection => "layer-direction",
            RuleCategory::CircularDependency => "circular-dependency",
            RuleCategory::AggregateBoundary => "aggregate-boundary",
            RuleCategory::Naming => "naming",
            RuleCategory::ForbiddenPackage => "forbidden-package",
            RuleCategory::HardcodedSecret => "hardcoded-secret",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            RuleCategory::LayerDirection => Severity::Critical,
            RuleCategory::HardcodedSecret => Severity::Critical,
            RuleCategory::CircularDependency => Severity::High,
            RuleCategory::ForbiddenPackage => Severity::High,
            RuleCategory::AggregateBoundary => Severity::Medium,
            RuleCategory::Naming => Severity::Low,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('_', "-");
        RuleCategory::ALL
            .into_iter()
            .find(|c| c.id() == normalized)
            .ok_or_else(|| anyhow::anyhow!("unknown rule: {s}"))
    }
}

/// Fixed mapping from rule category to severity.
///
/// Built once per run and passed to every detector, so two runs with
/// different configs never observe each other's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityMap {
    entries: BTreeMap<RuleCategory, Severity>,
}

impl SeverityMap {
    pub fn new() -> Self {
        let entries = RuleCategory::ALL
            .into_iter()
            .map(|c| (c, c.default_severity()))
            .collect();
        Self { entries }
    }

    /// Defaults overlaid with `rule id -> severity` overrides. Unknown ids are ignored.
    pub fn with_overrides(overrides: &HashMap<String, Severity>) -> Self {
        let mut map = Self::new();
        for (id, severity) in overrides {
            match id.parse::<RuleCategory>() {
                Ok(category) => map.set(category, *severity),
                Err(_) => tracing::warn!(rule = %id, "ignoring severity for unknown rule"),
            }
        }
        map
    }

    pub fn get(&self, category: RuleCategory) -> Severity {
        self.entries
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_severity())
    }

    pub fn set(&mut self, category: RuleCategory, severity: Severity) {
        self.entries.insert(category, severity);
    }
}

impl Default for SeverityMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of a violation: a project-relative path and an optional 1-based line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl SourceLocation {
    pub fn file(path: &str) -> Self {
        Self {
            file: path.to_string(),
            line: None,
        }
    }

    pub fn at(path: &str, line: usize) -> Self {
        Self {
            file: path.to_string(),
            line: Some(line),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// Detector-specific payload of a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    LayerDirection {
        from_layer: Layer,
        to_layer: Layer,
        import: String,
    },
    CircularDependency {
        cycle: Vec<String>,
    },
    AggregateBoundary {
        from_aggregate: String,
        to_aggregate: String,
        import: String,
    },
    Naming {
        actual: String,
        suggested: String,
    },
    ForbiddenPackage {
        package: String,
        layer: Layer,
    },
    HardcodedSecret {
        secret_type: String,
        column: usize,
    },
}

impl ViolationKind {
    pub fn category(&self) -> RuleCategory {
        match self {
            ViolationKind::LayerDirection { .. } => RuleCategory::LayerDirection,
            ViolationKind::CircularDependency { .. } => RuleCategory::CircularDependency,
            ViolationKind::AggregateBoundary { .. } => RuleCategory::AggregateBoundary,
            ViolationKind::Naming { .. } => RuleCategory::Naming,
            ViolationKind::ForbiddenPackage { .. } => RuleCategory::ForbiddenPackage,
            ViolationKind::HardcodedSecret { .. } => RuleCategory::HardcodedSecret,
        }
    }
}

/// A reported rule breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleCategory,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Violation {
    /// Build a violation whose rule and severity are derived from its kind.
    pub fn new(
        kind: ViolationKind,
        location: SourceLocation,
        message: impl Into<String>,
        severities: &SeverityMap,
    ) -> Self {
        let rule = kind.category();
        Self {
            rule,
            kind,
            severity: severities.get(rule),
            location,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

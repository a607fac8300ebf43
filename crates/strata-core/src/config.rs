use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::types::{Layer, RuleCategory, Severity, SeverityMap};

/// Name of the configuration file looked up in the project root and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".strata.toml";

/// Top-level configuration from `.strata.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub layers: LayersConfig,
    #[serde(default)]
    pub aggregates: AggregatesConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_include_patterns")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude_patterns")]
    pub exclude: Vec<String>,
    /// Upper bound on concurrent file reads. 0 lets rayon decide.
    #[serde(default)]
    pub max_workers: usize,
}

fn default_include_patterns() -> Vec<String> {
    vec![
        "**/*.ts".to_string(),
        "**/*.tsx".to_string(),
        "**/*.js".to_string(),
        "**/*.jsx".to_string(),
    ]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/dist/**".to_string(),
        "**/build/**".to_string(),
        "**/*.d.ts".to_string(),
        "**/*.spec.*".to_string(),
        "**/*.test.*".to_string(),
    ]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            include: default_include_patterns(),
            exclude: default_exclude_patterns(),
            max_workers: 0,
        }
    }
}

/// Path-segment keywords per layer, plus the allowed dependency directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(default = "default_domain_keywords")]
    pub domain: Vec<String>,
    #[serde(default = "default_application_keywords")]
    pub application: Vec<String>,
    #[serde(default = "default_infrastructure_keywords")]
    pub infrastructure: Vec<String>,
    #[serde(default = "default_shared_keywords")]
    pub shared: Vec<String>,
    #[serde(default)]
    pub allowed: AllowedLayers,
}

fn default_domain_keywords() -> Vec<String> {
    vec!["domain".to_string()]
}

fn default_application_keywords() -> Vec<String> {
    vec!["application".to_string()]
}

fn default_infrastructure_keywords() -> Vec<String> {
    vec!["infrastructure".to_string()]
}

fn default_shared_keywords() -> Vec<String> {
    vec!["shared".to_string()]
}

impl LayersConfig {
    pub fn keywords(&self, layer: Layer) -> &[String] {
        match layer {
            Layer::Domain => &self.domain,
            Layer::Application => &self.application,
            Layer::Infrastructure => &self.infrastructure,
            Layer::Shared => &self.shared,
        }
    }
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            domain: default_domain_keywords(),
            application: default_application_keywords(),
            infrastructure: default_infrastructure_keywords(),
            shared: default_shared_keywords(),
            allowed: AllowedLayers::default(),
        }
    }
}

/// Which layers each layer may import from. Same-layer imports are always allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedLayers {
    #[serde(default = "default_domain_allowed")]
    pub domain: Vec<Layer>,
    #[serde(default = "default_application_allowed")]
    pub application: Vec<Layer>,
    #[serde(default = "default_infrastructure_allowed")]
    pub infrastructure: Vec<Layer>,
    #[serde(default)]
    pub shared: Vec<Layer>,
}

fn default_domain_allowed() -> Vec<Layer> {
    vec![Layer::Shared]
}

fn default_application_allowed() -> Vec<Layer> {
    vec![Layer::Domain, Layer::Shared]
}

fn default_infrastructure_allowed() -> Vec<Layer> {
    vec![Layer::Domain, Layer::Application, Layer::Shared]
}

impl AllowedLayers {
    pub fn for_layer(&self, layer: Layer) -> &[Layer] {
        match layer {
            Layer::Domain => &self.domain,
            Layer::Application => &self.application,
            Layer::Infrastructure => &self.infrastructure,
            Layer::Shared => &self.shared,
        }
    }

    pub fn permits(&self, from: Layer, to: Layer) -> bool {
        from == to || self.for_layer(from).contains(&to)
    }
}

impl Default for AllowedLayers {
    fn default() -> Self {
        Self {
            domain: default_domain_allowed(),
            application: default_application_allowed(),
            infrastructure: default_infrastructure_allowed(),
            shared: Vec::new(),
        }
    }
}

/// Settings for inferring aggregate (bounded context) names from paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatesConfig {
    /// Segments after which aggregate names start.
    #[serde(default = "default_root_markers")]
    pub root_markers: Vec<String>,
    /// Folder names that organize code inside an aggregate without naming one.
    #[serde(default = "default_structural_folders")]
    pub structural_folders: Vec<String>,
    /// Structural folders that may be imported across aggregates.
    #[serde(default = "default_shared_folders")]
    pub shared_folders: Vec<String>,
}

fn default_root_markers() -> Vec<String> {
    vec!["domain".to_string()]
}

fn default_structural_folders() -> Vec<String> {
    [
        "aggregates",
        "entities",
        "entity",
        "value-objects",
        "value_objects",
        "valueobjects",
        "events",
        "repositories",
        "services",
        "specifications",
        "errors",
        "exceptions",
        "factories",
        "policies",
        "models",
        "types",
        "interfaces",
        "ports",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_shared_folders() -> Vec<String> {
    [
        "value-objects",
        "value_objects",
        "valueobjects",
        "events",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for AggregatesConfig {
    fn default() -> Self {
        Self {
            root_markers: default_root_markers(),
            structural_folders: default_structural_folders(),
            shared_folders: default_shared_folders(),
        }
    }
}

/// File naming conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Folder name -> required file-name suffix.
    #[serde(default = "default_suffixes")]
    pub suffixes: BTreeMap<String, String>,
    /// Suffixes too vague for domain code, mapped to the preferred replacement.
    #[serde(default = "default_vague_suffixes")]
    pub vague_suffixes: BTreeMap<String, String>,
}

fn default_suffixes() -> BTreeMap<String, String> {
    [
        ("repositories", "Repository"),
        ("services", "Service"),
        ("events", "Event"),
        ("specifications", "Specification"),
        ("errors", "Error"),
        ("exceptions", "Error"),
        ("factories", "Factory"),
        ("policies", "Policy"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_vague_suffixes() -> BTreeMap<String, String> {
    [
        ("Manager", "Service"),
        ("Helper", "Service"),
        ("Util", "Service"),
        ("Utils", "Service"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
            vague_suffixes: default_vague_suffixes(),
        }
    }
}

/// Package deny-lists per layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    #[serde(default = "default_domain_denied")]
    pub domain: Vec<String>,
    #[serde(default = "default_application_denied")]
    pub application: Vec<String>,
    #[serde(default)]
    pub infrastructure: Vec<String>,
    #[serde(default)]
    pub shared: Vec<String>,
}

const PERSISTENCE_PACKAGES: &[&str] = &[
    "typeorm",
    "mongoose",
    "mongodb",
    "sequelize",
    "@prisma/client",
    "prisma",
    "knex",
    "pg",
    "mysql",
    "mysql2",
    "sqlite3",
    "redis",
    "ioredis",
    "@mikro-orm/core",
];

const HTTP_PACKAGES: &[&str] = &["express", "fastify", "koa", "@nestjs/common", "hapi"];

fn default_domain_denied() -> Vec<String> {
    PERSISTENCE_PACKAGES
        .iter()
        .chain(HTTP_PACKAGES)
        .chain(["axios", "aws-sdk", "@aws-sdk/client-s3", "node-fetch"].iter())
        .map(|s| s.to_string())
        .collect()
}

fn default_application_denied() -> Vec<String> {
    PERSISTENCE_PACKAGES
        .iter()
        .chain(HTTP_PACKAGES)
        .map(|s| s.to_string())
        .collect()
}

impl PackagesConfig {
    pub fn denied(&self, layer: Layer) -> &[String] {
        match layer {
            Layer::Domain => &self.domain,
            Layer::Application => &self.application,
            Layer::Infrastructure => &self.infrastructure,
            Layer::Shared => &self.shared,
        }
    }
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            domain: default_domain_denied(),
            application: default_application_denied(),
            infrastructure: Vec::new(),
            shared: Vec::new(),
        }
    }
}

/// Rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_severities")]
    pub severities: HashMap<String, Severity>,
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    /// Rule ids that are not run.
    #[serde(default)]
    pub disabled: Vec<String>,
}

fn default_severities() -> HashMap<String, Severity> {
    RuleCategory::ALL
        .into_iter()
        .map(|c| (c.id().to_string(), c.default_severity()))
        .collect()
}

fn default_fail_on() -> Severity {
    Severity::High
}

impl RulesConfig {
    pub fn is_enabled(&self, category: RuleCategory) -> bool {
        !self
            .disabled
            .iter()
            .any(|id| id.parse::<RuleCategory>().ok() == Some(category))
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            severities: default_severities(),
            fail_on: default_fail_on(),
            disabled: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a `.strata.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `strata init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.strata.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let Some(config_path) = find_config_file(dir) else {
            return Self::default();
        };
        match Self::load(&config_path) {
            Ok(config) => {
                tracing::debug!(path = %config_path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(
                    "failed to load config from '{}': {e:#}. Using defaults.",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// The severity table the detectors use for this config.
    pub fn severity_map(&self) -> SeverityMap {
        SeverityMap::with_overrides(&self.rules.severities)
    }

    /// Generate default TOML content for `strata init`.
    pub fn default_toml() -> String {
        r#"# Strata - Layered Architecture Analysis Configuration

[project]
include = ["**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx"]
exclude = ["**/node_modules/**", "**/dist/**", "**/build/**", "**/*.d.ts", "**/*.spec.*", "**/*.test.*"]
# Concurrent file reads (0 = one per CPU)
max_workers = 0

[layers]
# Path segments that put a file into a layer. Checked in this order:
# domain, application, infrastructure, shared.
domain = ["domain"]
application = ["application"]
infrastructure = ["infrastructure"]
shared = ["shared"]

[layers.allowed]
# Layers each layer may import from (same-layer imports are always allowed)
domain = ["shared"]
application = ["domain", "shared"]
infrastructure = ["domain", "application", "shared"]
shared = []

[aggregates]
root_markers = ["domain"]
structural_folders = ["aggregates", "entities", "entity", "value-objects", "value_objects", "valueobjects", "events", "repositories", "services", "specifications", "errors", "exceptions", "factories", "policies", "models", "types", "interfaces", "ports"]
# Folders other aggregates may import from
shared_folders = ["value-objects", "value_objects", "valueobjects", "events"]

[naming.suffixes]
repositories = "Repository"
services = "Service"
events = "Event"
specifications = "Specification"
errors = "Error"
exceptions = "Error"
factories = "Factory"
policies = "Policy"

[naming.vague_suffixes]
Manager = "Service"
Helper = "Service"
Util = "Service"
Utils = "Service"

[packages]
domain = ["typeorm", "mongoose", "mongodb", "sequelize", "@prisma/client", "prisma", "knex", "pg", "mysql", "mysql2", "sqlite3", "redis", "ioredis", "@mikro-orm/core", "express", "fastify", "koa", "@nestjs/common", "hapi", "axios", "aws-sdk", "@aws-sdk/client-s3", "node-fetch"]
application = ["typeorm", "mongoose", "mongodb", "sequelize", "@prisma/client", "prisma", "knex", "pg", "mysql", "mysql2", "sqlite3", "redis", "ioredis", "@mikro-orm/core", "express", "fastify", "koa", "@nestjs/common", "hapi"]

[rules]
# Severity levels: "critical", "high", "medium", "low"
fail_on = "high"
# disabled = ["naming"]

[rules.severities]
layer-direction = "critical"
hardcoded-secret = "critical"
circular-dependency = "high"
forbidden-package = "high"
aggregate-boundary = "medium"
naming = "low"
"#
        .to_string()
    }
}

/// Walk up from `dir` looking for `.strata.toml`.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let mut current = start.as_path();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.layers.domain, vec!["domain"]);
        assert!(config.project.include.contains(&"**/*.ts".to_string()));
        assert_eq!(config.rules.fail_on, Severity::High);
        assert_eq!(config.layers.allowed.domain, vec![Layer::Shared]);
    }

    #[test]
    fn test_allowed_layers_table() {
        let allowed = AllowedLayers::default();
        assert!(allowed.permits(Layer::Domain, Layer::Shared));
        assert!(allowed.permits(Layer::Domain, Layer::Domain));
        assert!(!allowed.permits(Layer::Domain, Layer::Infrastructure));
        assert!(!allowed.permits(Layer::Domain, Layer::Application));
        assert!(allowed.permits(Layer::Application, Layer::Domain));
        assert!(!allowed.permits(Layer::Application, Layer::Infrastructure));
        assert!(allowed.permits(Layer::Infrastructure, Layer::Application));
        assert!(!allowed.permits(Layer::Shared, Layer::Domain));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[layers]
domain = ["core"]

[layers.allowed]
domain = []

[rules]
fail_on = "medium"
disabled = ["naming"]

[rules.severities]
aggregate-boundary = "high"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.layers.domain, vec!["core"]);
        assert_eq!(config.layers.application, vec!["application"]);
        assert!(config.layers.allowed.domain.is_empty());
        assert_eq!(
            config.layers.allowed.application,
            vec![Layer::Domain, Layer::Shared]
        );
        assert_eq!(config.rules.fail_on, Severity::Medium);
        assert!(!config.rules.is_enabled(RuleCategory::Naming));
        assert!(config.rules.is_enabled(RuleCategory::LayerDirection));

        let severities = config.severity_map();
        assert_eq!(severities.get(RuleCategory::AggregateBoundary), Severity::High);
        // Categories missing from the partial table keep their defaults
        assert_eq!(severities.get(RuleCategory::Naming), Severity::Low);
    }

    #[test]
    fn test_default_toml_is_valid() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.layers.allowed, defaults.layers.allowed);
        assert_eq!(config.packages.domain, defaults.packages.domain);
        assert_eq!(config.naming.suffixes, defaults.naming.suffixes);
        assert_eq!(
            config.aggregates.structural_folders,
            defaults.aggregates.structural_folders
        );
        assert_eq!(config.severity_map(), SeverityMap::new());
    }

    #[test]
    fn test_unknown_layer_in_allowed_is_rejected() {
        let toml_str = r#"
[layers.allowed]
domain = ["presentation"]
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_load_or_default_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[rules]\nfail_on = \"low\"\n",
        )
        .unwrap();
        let nested = tmp.path().join("src/domain");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load_or_default(&nested);
        assert_eq!(config.rules.fail_on, Severity::Low);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[rules\nfail_on = ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("strata init"));
    }
}

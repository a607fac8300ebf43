use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::Config;
use crate::detectors::{default_detectors, DetectionContext, Detector, DetectorOutput};
use crate::error::AnalysisError;
use crate::fs::{FileAccess, FsFileAccess};
use crate::graph::DependencyGraph;
use crate::layer::LayerClassifier;
use crate::parser::{SourceParser, TypeScriptParser};
use crate::report::{aggregate, Report};
use crate::secrets::{RegexSecretScanner, SecretScanner};
use crate::source::SourceModelBuilder;

/// Reusable analysis pipeline: source model, graph, detectors, report.
///
/// Collaborators default to the local file system, the tree-sitter
/// TypeScript parser and the regex secret scanner; each can be swapped.
pub struct AnalysisPipeline {
    config: Config,
    classifier: LayerClassifier,
    file_access: Arc<dyn FileAccess>,
    parser: Option<Arc<dyn SourceParser>>,
    scanner: Arc<dyn SecretScanner>,
    detectors: Option<Vec<Box<dyn Detector>>>,
}

impl AnalysisPipeline {
    pub fn new(config: Config) -> Self {
        let classifier = LayerClassifier::new(&config.layers);
        Self {
            config,
            classifier,
            file_access: Arc::new(FsFileAccess::new()),
            parser: Some(Arc::new(TypeScriptParser::new())),
            scanner: Arc::new(RegexSecretScanner::new()),
            detectors: None,
        }
    }

    pub fn with_file_access(mut self, access: Arc<dyn FileAccess>) -> Self {
        self.file_access = access;
        self
    }

    /// `None` skips function counting.
    pub fn with_parser(mut self, parser: Option<Arc<dyn SourceParser>>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_secret_scanner(mut self, scanner: Arc<dyn SecretScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replace the built-in detector set.
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn Detector>>) -> Self {
        self.detectors = Some(detectors);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze `root`. `include`/`exclude` override the configured patterns.
    ///
    /// Only a failure to scan the root is an error. Unreadable files and
    /// collaborator failures on single files reduce what is reported.
    pub fn analyze(
        &self,
        root: &Path,
        include: Option<&[String]>,
        exclude: Option<&[String]>,
    ) -> Result<Report, AnalysisError> {
        let include = include.unwrap_or(&self.config.project.include);
        let exclude = exclude.unwrap_or(&self.config.project.exclude);

        let mut builder = SourceModelBuilder::new(self.file_access.as_ref(), &self.classifier)
            .with_max_workers(self.config.project.max_workers);
        if let Some(parser) = &self.parser {
            builder = builder.with_parser(parser.as_ref());
        }
        let units = builder
            .build(root, include, exclude)
            .map_err(|e| AnalysisError::scan(root, &e))?;

        let graph = DependencyGraph::build(&units);
        let severities = self.config.severity_map();

        let defaults;
        let detectors: &[Box<dyn Detector>] = match &self.detectors {
            Some(custom) => custom,
            None => {
                defaults = default_detectors(&self.config, Arc::clone(&self.scanner));
                &defaults
            }
        };

        let ctx = DetectionContext {
            units: &units,
            graph: &graph,
            classifier: &self.classifier,
            severities: &severities,
        };
        let outputs: Vec<DetectorOutput> = detectors
            .par_iter()
            .map(|detector| {
                let violations = detector.detect(&ctx);
                tracing::debug!(
                    rule = %detector.category(),
                    violations = violations.len(),
                    "detector finished"
                );
                DetectorOutput {
                    category: detector.category(),
                    violations,
                }
            })
            .collect();

        let report = aggregate(outputs, units, graph);
        tracing::info!(
            files = report.metrics.total_files,
            edges = report.graph_metrics.edge_count,
            violations = report.total_violations(),
            "analysis complete"
        );
        Ok(report)
    }
}

/// Analyze `root` with the configuration found at or above it and the
/// default collaborators.
pub fn analyze(
    root: &Path,
    include: Option<&[String]>,
    exclude: Option<&[String]>,
) -> Result<Report, AnalysisError> {
    AnalysisPipeline::new(Config::load_or_default(root)).analyze(root, include, exclude)
}

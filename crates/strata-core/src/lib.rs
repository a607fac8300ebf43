pub mod config;
pub mod detectors;
pub mod error;
pub mod fs;
pub mod graph;
pub mod layer;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod secrets;
pub mod source;
pub mod types;

pub use config::Config;
pub use detectors::{DetectionContext, Detector};
pub use error::AnalysisError;
pub use graph::{DependencyGraph, GraphMetrics};
pub use layer::LayerClassifier;
pub use metrics::ProjectMetrics;
pub use pipeline::{analyze, AnalysisPipeline};
pub use report::Report;
pub use source::{Import, SourceUnit};
pub use types::*;

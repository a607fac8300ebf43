use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::SourceUnit;
use crate::types::Layer;

/// Key used in `files_by_layer` for files with no layer.
pub const UNCLASSIFIED: &str = "none";

/// Project-wide counts, derived from the unit list on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub total_files: usize,
    pub total_functions: usize,
    pub total_imports: usize,
    /// Layer name (or `none`) -> file count. Every layer is present.
    pub files_by_layer: BTreeMap<String, usize>,
}

impl ProjectMetrics {
    pub fn compute(units: &[SourceUnit]) -> Self {
        let mut files_by_layer: BTreeMap<String, usize> = Layer::ALL
            .iter()
            .map(|l| (l.as_str().to_string(), 0))
            .chain(std::iter::once((UNCLASSIFIED.to_string(), 0)))
            .collect();

        for unit in units {
            let key = unit.layer.map(|l| l.as_str()).unwrap_or(UNCLASSIFIED);
            *files_by_layer.entry(key.to_string()).or_insert(0) += 1;
        }

        Self {
            total_files: units.len(),
            total_functions: units.iter().map(|u| u.functions).sum(),
            total_imports: units.iter().map(|u| u.imports.len()).sum(),
            files_by_layer,
        }
    }

    /// Share of files that landed in some layer, 0-100.
    pub fn classification_coverage(&self) -> f64 {
        if self.total_files == 0 {
            return 100.0;
        }
        let unclassified = self.files_by_layer.get(UNCLASSIFIED).copied().unwrap_or(0);
        (self.total_files - unclassified) as f64 / self.total_files as f64 * 100.0
    }
}

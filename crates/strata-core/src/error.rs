use std::path::PathBuf;

use thiserror::Error;

/// Whole-run failures. Per-file problems never surface here; they are
/// logged and the file is left out of the model.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The project root could not be scanned at all.
    #[error("failed to scan {}: {message}", .root.display())]
    Scan {
        /// Root directory that was requested.
        root: PathBuf,
        /// Flattened error chain from the file-access collaborator.
        message: String,
    },
}

impl AnalysisError {
    pub(crate) fn scan(root: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        AnalysisError::Scan {
            root: root.into(),
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_message_keeps_chain() {
        let inner = anyhow::anyhow!("directory does not exist").context("walking tree");
        let err = AnalysisError::scan("/tmp/nope", &inner);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/nope"));
        assert!(msg.contains("walking tree"));
        assert!(msg.contains("directory does not exist"));
    }
}

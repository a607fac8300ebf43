use std::path::Path;

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// File-system capabilities the analysis consumes.
///
/// Paths returned by `scan` are relative to `root`, use `/` separators,
/// and are sorted so every run sees the same order.
pub trait FileAccess: Send + Sync {
    fn scan(&self, root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<String>>;

    fn read_file(&self, root: &Path, rel_path: &str) -> Result<String>;
}

/// `FileAccess` backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileAccess;

impl FsFileAccess {
    pub fn new() -> Self {
        Self
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("invalid glob '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build glob set")
}

impl FileAccess for FsFileAccess {
    fn scan(&self, root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<String>> {
        if !root.exists() {
            bail!("directory '{}' does not exist", root.display());
        }
        if !root.is_dir() {
            bail!("'{}' is not a directory", root.display());
        }

        let include_set = build_globset(include)?;
        let exclude_set = build_globset(exclude)?;

        let mut paths = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    // The root itself failing means nothing can be analyzed
                    if e.depth() == 0 {
                        return Err(e).with_context(|| {
                            format!("failed to scan '{}'", root.display())
                        });
                    }
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if !include.is_empty() && !include_set.is_match(&rel) {
                continue;
            }
            if exclude_set.is_match(&rel) {
                continue;
            }
            paths.push(rel);
        }

        paths.sort();
        Ok(paths)
    }

    fn read_file(&self, root: &Path, rel_path: &str) -> Result<String> {
        let full = root.join(rel_path);
        std::fs::read_to_string(&full).with_context(|| format!("failed to read {}", full.display()))
    }
}

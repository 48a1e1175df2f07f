//! File discovery by exact file name.

use crate::error::{MigrateError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Predicates for finding target files under a root directory.
#[derive(Debug, Default, Clone)]
pub struct FileMatcher {
    file_name: String,
    exclude_globs: Vec<String>,
}

impl FileMatcher {
    /// Creates a matcher for files named exactly `file_name`.
    pub fn named(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            exclude_globs: Vec::new(),
        }
    }

    /// Excludes paths matching the glob pattern (relative to the root).
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_globs.push(pattern.into());
        self
    }

    /// Excludes paths matching any of the glob patterns.
    pub fn excludes(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_globs
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Returns the file name this matcher looks for.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Tests a single path against the name predicate.
    pub fn matches_name(&self, path: &Path) -> bool {
        path.file_name().and_then(|n| n.to_str()) == Some(self.file_name.as_str())
    }

    /// Collects all matching files under `root`, depth-first.
    ///
    /// Symbolic links are never followed. Entries are visited in file-name
    /// order so the result is stable for an unchanged tree. Unreadable
    /// subdirectories are logged and skipped; only a missing or unreadable
    /// root is an error.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let metadata = match fs::metadata(root) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MigrateError::RootNotFound(root.to_path_buf()));
            }
            Err(source) => {
                return Err(MigrateError::Discovery {
                    path: root.to_path_buf(),
                    source,
                });
            }
        };
        if !metadata.is_dir() {
            return Err(MigrateError::RootNotFound(root.to_path_buf()));
        }
        if let Err(source) = fs::read_dir(root) {
            return Err(MigrateError::Discovery {
                path: root.to_path_buf(),
                source,
            });
        }

        let exclude_set = self.build_glob_set()?;
        let mut matched = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let rel_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
                rel_path.as_os_str().is_empty() || !exclude_set.is_match(rel_path)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!(path = %path, error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if self.matches_name(entry.path()) {
                debug!(path = %entry.path().display(), "discovered");
                matched.push(entry.into_path());
            }
        }

        Ok(matched)
    }

    fn build_glob_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            builder.add(Glob::new(pattern)?);
            // `**/dir/**` should also prune `dir` itself while walking.
            if let Some(dir) = pattern.strip_suffix("/**") {
                builder.add(Glob::new(dir)?);
            }
        }
        Ok(builder.build()?)
    }
}

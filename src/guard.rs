//! Syntax guard for rewritten files.
//!
//! Text rules cannot see structure, so before a rewrite is written back the
//! guard parses both versions. A rewrite that introduces parse errors the
//! original did not have is refused.

use crate::error::{MigrateError, Result};
use crate::lang::LanguageRegistry;
use std::path::Path;
use tracing::debug;

/// Checks rewritten sources for new syntax errors.
pub struct SyntaxGuard {
    registry: LanguageRegistry,
}

impl SyntaxGuard {
    pub fn new() -> Self {
        Self {
            registry: LanguageRegistry::new(),
        }
    }

    /// Verifies that `after` parses at least as cleanly as `before`.
    ///
    /// Files in languages without a grammar pass unchecked, as do files whose
    /// original already failed to parse.
    pub fn verify(&self, path: &Path, before: &str, after: &str) -> Result<()> {
        let Some(lang) = self.registry.detect(path) else {
            debug!(path = %path.display(), "no grammar, skipping syntax check");
            return Ok(());
        };

        if lang.parse(before, path)?.root_node().has_error() {
            debug!(path = %path.display(), "original has parse errors, skipping syntax check");
            return Ok(());
        }

        if lang.parse(after, path)?.root_node().has_error() {
            return Err(MigrateError::SyntaxRegression {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }
}

impl Default for SyntaxGuard {
    fn default() -> Self {
        Self::new()
    }
}

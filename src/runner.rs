//! Batch runner: discovery, rewrite and write-back over a page tree.

use crate::config::MigrationConfig;
use crate::diff::{DiffSummary, colorized_diff, unified_diff};
use crate::error::{MigrateError, Result};
use crate::guard::SyntaxGuard;
use crate::matcher;
use crate::migration::{ConfigMigration, Migration, find_residue, find_unbound};
use crate::transform::RuleSet;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// What happened to a single discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum FileStatus {
    /// No rule matched; the file was not opened for writing.
    Unchanged,
    /// Rewritten on disk.
    Rewritten,
    /// Would be rewritten (dry run).
    WouldRewrite,
    /// Could not be read, or is not UTF-8.
    ReadFailed(String),
    /// Rewrite computed but the write-back failed; the original is intact.
    WriteFailed(String),
    /// Rewrite refused because it would leave a retired name unbound or
    /// introduce syntax errors. The file is left as it was.
    Rejected(String),
}

impl FileStatus {
    pub fn is_changed(&self) -> bool {
        matches!(self, FileStatus::Rewritten | FileStatus::WouldRewrite)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileStatus::ReadFailed(_) | FileStatus::WriteFailed(_) | FileStatus::Rejected(_)
        )
    }

    /// The failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            FileStatus::ReadFailed(e) | FileStatus::WriteFailed(e) | FileStatus::Rejected(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

/// A computed rewrite of one file.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub original: String,
    pub transformed: String,
}

impl FileChange {
    /// Returns true if the content differs.
    pub fn is_modified(&self) -> bool {
        self.original != self.transformed
    }

    pub fn diff(&self) -> String {
        unified_diff(&self.original, &self.transformed, &self.path)
    }

    pub fn colorized_diff(&self) -> String {
        colorized_diff(&self.original, &self.transformed, &self.path)
    }
}

/// Per-file result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Path relative to the base directory, used in reports.
    pub relative_path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    pub rules_applied: Vec<String>,
    /// Foreign module specifiers still present after the rewrite.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub residue: Vec<String>,
    #[serde(skip)]
    pub change: Option<FileChange>,
}

impl FileOutcome {
    fn new(path: &Path, relative_path: PathBuf, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            relative_path,
            status,
            rules_applied: Vec::new(),
            residue: Vec::new(),
            change: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.status.is_changed()
    }
}

/// Summary of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub dry_run: bool,
    pub total_discovered: usize,
    pub total_changed: usize,
    /// Relative paths of changed files, in discovery order.
    pub changed_paths: Vec<PathBuf>,
    /// Relative paths of files that failed, in discovery order.
    pub failed_paths: Vec<PathBuf>,
    pub outcomes: Vec<FileOutcome>,
    pub stats: DiffSummary,
}

impl RunSummary {
    fn new(root: PathBuf, dry_run: bool, outcomes: Vec<FileOutcome>) -> Self {
        let mut stats = DiffSummary::default();
        let mut changed_paths = Vec::new();
        let mut failed_paths = Vec::new();

        for outcome in &outcomes {
            if outcome.changed() {
                changed_paths.push(outcome.relative_path.clone());
                if let Some(change) = &outcome.change {
                    stats.merge(&DiffSummary::from_diff(&change.original, &change.transformed));
                }
            } else if outcome.status.is_failure() {
                failed_paths.push(outcome.relative_path.clone());
            }
        }

        Self {
            root,
            dry_run,
            total_discovered: outcomes.len(),
            total_changed: changed_paths.len(),
            changed_paths,
            failed_paths,
            outcomes,
            stats,
        }
    }

    /// Outcomes whose status is a failure.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    /// Outcomes with residue left for manual follow-up.
    pub fn with_residue(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.residue.is_empty())
    }

    /// Generates a unified diff of all changes.
    pub fn diff(&self) -> String {
        self.changes()
            .map(FileChange::diff)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Generates a colorized diff for terminal display.
    pub fn colorized_diff(&self) -> String {
        self.changes()
            .map(FileChange::colorized_diff)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn changes(&self) -> impl Iterator<Item = &FileChange> {
        self.outcomes
            .iter()
            .filter(|o| o.changed())
            .filter_map(|o| o.change.as_ref())
    }
}

/// Runs a migration over every matching file under a root.
///
/// # Example
///
/// ```rust,no_run
/// use pagemod::prelude::*;
///
/// let summary = Migrator::new(MigrationConfig::default())?
///     .base_dir("/path/to/web")
///     .dry_run()
///     .run()?;
///
/// for path in &summary.changed_paths {
///     println!("would convert {}", path.display());
/// }
/// # Ok::<(), pagemod::MigrateError>(())
/// ```
pub struct Migrator {
    config: MigrationConfig,
    migration: Box<dyn Migration>,
    base_dir: Option<PathBuf>,
    dry_run: bool,
}

impl Migrator {
    /// Creates a runner for the preset and rules a configuration describes.
    pub fn new(config: MigrationConfig) -> Result<Self> {
        let migration = ConfigMigration::new(config.clone())?;
        Ok(Self::with_migration(config, migration))
    }

    /// Creates a runner that applies a custom migration. Discovery and
    /// write-back options still come from `config`.
    pub fn with_migration(config: MigrationConfig, migration: impl Migration + 'static) -> Self {
        Self {
            config,
            migration: Box::new(migration),
            base_dir: None,
            dry_run: false,
        }
    }

    /// Sets the directory the root and reported paths are relative to.
    /// Defaults to the current directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Enables dry-run mode (compute rewrites without writing).
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Disables the tree-sitter syntax check.
    pub fn without_syntax_guard(mut self) -> Self {
        self.config.syntax_guard = false;
        self
    }

    /// The migration this runner applies.
    pub fn migration(&self) -> &dyn Migration {
        self.migration.as_ref()
    }

    /// Runs discovery and processes each file in order.
    ///
    /// Only discovery errors abort the run. Per-file failures are recorded
    /// in the summary and the remaining files are still processed.
    pub fn run(&self) -> Result<RunSummary> {
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let root = self.config.resolve_root(&base);

        let files = matcher::from_config(&self.config).collect(&root)?;
        info!(
            root = %root.display(),
            migration = self.migration.name(),
            count = files.len(),
            "discovered files"
        );

        let rules = self.migration.rules()?;
        let residue = self.migration.residue();
        let retired = self.migration.retired_names();
        let guard = self.config.syntax_guard.then(SyntaxGuard::new);

        let outcomes: Vec<FileOutcome> = files
            .iter()
            .map(|path| {
                let relative = path.strip_prefix(&base).unwrap_or(path).to_path_buf();
                self.process_file(path, relative, &rules, &residue, &retired, guard.as_ref())
            })
            .collect();

        let summary = RunSummary::new(root, self.dry_run, outcomes);
        info!(
            discovered = summary.total_discovered,
            changed = summary.total_changed,
            failed = summary.failed_paths.len(),
            dry_run = self.dry_run,
            "migration finished"
        );
        Ok(summary)
    }

    fn process_file(
        &self,
        path: &Path,
        relative: PathBuf,
        rules: &RuleSet,
        residue: &[String],
        retired: &[String],
        guard: Option<&SyntaxGuard>,
    ) -> FileOutcome {
        let original = match read_source(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                return FileOutcome::new(path, relative, FileStatus::ReadFailed(e.to_string()));
            }
        };

        let transformed = rules.apply(&original);
        let mut outcome = FileOutcome::new(path, relative, FileStatus::Unchanged);
        outcome.residue = find_residue(&transformed.content, residue);
        if !outcome.residue.is_empty() {
            warn!(
                path = %path.display(),
                residue = ?outcome.residue,
                "foreign imports remain, finish by hand"
            );
        }

        if !transformed.changed {
            debug!(path = %path.display(), "no rule matched");
            return outcome;
        }
        outcome.rules_applied = transformed.applied;

        let unbound = find_unbound(&original, &transformed.content, retired);
        let verdict = if unbound.is_empty() {
            match guard {
                Some(guard) => guard.verify(path, &original, &transformed.content),
                None => Ok(()),
            }
        } else {
            Err(MigrateError::UnboundNames {
                path: path.to_path_buf(),
                names: unbound,
            })
        };
        if let Err(e) = verdict {
            warn!(path = %path.display(), error = %e, "rewrite rejected");
            // Nothing is written, so the residue is whatever the original holds.
            outcome.residue = find_residue(&original, residue);
            outcome.status = FileStatus::Rejected(e.to_string());
            return outcome;
        }

        let change = FileChange {
            path: outcome.relative_path.clone(),
            original,
            transformed: transformed.content,
        };

        outcome.status = if self.dry_run {
            debug!(path = %path.display(), rules = ?outcome.rules_applied, "would rewrite");
            FileStatus::WouldRewrite
        } else {
            match write_atomic(path, &change.transformed) {
                Ok(()) => {
                    debug!(path = %path.display(), rules = ?outcome.rules_applied, "rewritten");
                    FileStatus::Rewritten
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "write-back failed, original kept");
                    FileStatus::WriteFailed(e.to_string())
                }
            }
        };
        if outcome.status.is_changed() {
            outcome.change = Some(change);
        }
        outcome
    }
}

/// Reads a file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String> {
    let read_error = |source| MigrateError::Read {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(read_error)?;
    String::from_utf8(bytes).map_err(|e| read_error(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Replaces a file's content atomically.
///
/// The new content goes to a temporary file next to the target, which is
/// synced, given the original's permissions and renamed over the target. On
/// failure the temporary file is removed and the target is left as it was.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = temp_path_next_to(path);

    let result = write_temp(&tmp, path, contents).and_then(|()| fs::rename(&tmp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(MigrateError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn write_temp(tmp: &Path, target: &Path, contents: &str) -> io::Result<()> {
    let permissions = fs::metadata(target)?.permissions();
    let mut file = File::create(tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::set_permissions(tmp, permissions)
}

/// `.<name>.pagemod-tmp` in the target's directory.
pub fn temp_path_next_to(path: &Path) -> PathBuf {
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!(".{file_name}.pagemod-tmp"))
}

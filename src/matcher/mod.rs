//! Discovery of the files a migration operates on.

pub mod file;

pub use file::FileMatcher;

use crate::config::MigrationConfig;

/// Builds the discovery matcher described by a configuration.
pub fn from_config(config: &MigrationConfig) -> FileMatcher {
    FileMatcher::named(&config.target_filename).excludes(config.exclude_patterns.iter().cloned())
}

//! Migration configuration.
//!
//! Every option has a default matching the original page-tree conversion, so
//! running without a config file migrates `src/app/**/page.tsx` from Next.js
//! navigation APIs to React Router.
//!
//! # Example YAML
//!
//! ```yaml
//! target_filename: page.tsx
//! root_directory: src/app
//! exclude_patterns:
//!   - "**/node_modules/**"
//!   - "**/legacy/**"
//! preset: next-to-react-router
//! rules:
//!   - type: named_import
//!     from: next/navigation
//!     to: react-router-dom
//!     names:
//!       - { from: redirect, to: redirect }
//!   - type: default_import
//!     from: next/image
//!     to: "@/components/Image"
//!     name: Image
//! ```

use crate::error::{MigrateError, Result};
use crate::transform::{
    DefaultImportRewrite, NamedImportRewrite, Rule, StripDirective, TextTransform,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name discovered by default: the App Router page convention.
pub const DEFAULT_TARGET_FILENAME: &str = "page.tsx";

/// Walk root used by default, relative to the base directory.
pub const DEFAULT_ROOT_DIRECTORY: &str = "src/app";

/// Built-in rule presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Next.js navigation APIs to React Router.
    #[default]
    NextToReactRouter,
    /// No built-in rules; only `rules` from the config apply.
    None,
}

/// A name pair for a named-import rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMapping {
    pub from: String,
    pub to: String,
}

/// A serializable rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleSpec {
    /// Remove a leading directive literal.
    #[serde(rename = "strip_directive")]
    StripDirective { directive: String },

    /// Rebind named imports from one module to another.
    #[serde(rename = "named_import")]
    NamedImport {
        from: String,
        to: String,
        names: Vec<NameMapping>,
    },

    /// Turn a default import into a named import from another module.
    #[serde(rename = "default_import")]
    DefaultImport {
        from: String,
        to: String,
        name: String,
    },

    /// Replace a literal string with another.
    #[serde(rename = "replace_literal")]
    ReplaceLiteral { from: String, to: String },

    /// Replace using a regex pattern.
    #[serde(rename = "replace_pattern")]
    ReplacePattern { pattern: String, replacement: String },
}

impl RuleSpec {
    /// Builds the rule this definition describes.
    pub fn to_rule(&self) -> Result<Box<dyn Rule>> {
        let rule: Box<dyn Rule> = match self {
            RuleSpec::StripDirective { directive } => Box::new(StripDirective::new(directive)),
            RuleSpec::NamedImport { from, to, names } => Box::new(NamedImportRewrite::new(
                from,
                to,
                names.iter().map(|n| (n.from.as_str(), n.to.as_str())),
            )),
            RuleSpec::DefaultImport { from, to, name } => {
                Box::new(DefaultImportRewrite::new(from, to, name))
            }
            RuleSpec::ReplaceLiteral { from, to } => {
                Box::new(TextTransform::replace_literal(from, to))
            }
            RuleSpec::ReplacePattern {
                pattern,
                replacement,
            } => Box::new(TextTransform::replace(pattern, replacement)?),
        };
        Ok(rule)
    }

    /// Module specifier this rule migrates away from, if any.
    pub fn source_module(&self) -> Option<&str> {
        match self {
            RuleSpec::NamedImport { from, .. } | RuleSpec::DefaultImport { from, .. } => {
                Some(from.as_str())
            }
            _ => None,
        }
    }

    /// Names this rule renames away. They must not be left in use unbound.
    pub fn retired_names(&self) -> Vec<&str> {
        match self {
            RuleSpec::NamedImport { names, .. } => names
                .iter()
                .filter(|n| n.from != n.to)
                .map(|n| n.from.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Configuration for a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Exact file name that discovery matches.
    pub target_filename: String,

    /// Walk root; relative paths are resolved against the base directory.
    pub root_directory: PathBuf,

    /// Glob patterns (relative to the root) pruned from the walk.
    pub exclude_patterns: Vec<String>,

    /// Built-in rule set applied before `rules`.
    pub preset: Preset,

    /// Extra rules, applied in order after the preset.
    pub rules: Vec<RuleSpec>,

    /// Refuse rewrites that introduce parse errors.
    pub syntax_guard: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            target_filename: DEFAULT_TARGET_FILENAME.to_string(),
            root_directory: PathBuf::from(DEFAULT_ROOT_DIRECTORY),
            exclude_patterns: vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()],
            preset: Preset::default(),
            rules: Vec::new(),
            syntax_guard: true,
        }
    }
}

impl MigrationConfig {
    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load config, choosing the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(path)?,
            Some("json") => Self::from_json(path)?,
            _ => {
                return Err(MigrateError::InvalidConfig(format!(
                    "Unsupported config format: {} (expected .yaml, .yml or .json)",
                    path.display()
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.target_filename.is_empty()
            || self.target_filename.contains('/')
            || self.target_filename.contains('\\')
        {
            return Err(MigrateError::InvalidConfig(format!(
                "target_filename must be a bare file name, got '{}'",
                self.target_filename
            )));
        }
        for rule in &self.rules {
            rule.to_rule()?;
        }
        Ok(())
    }

    /// Resolves the walk root against a base directory.
    pub fn resolve_root(&self, base: &Path) -> PathBuf {
        if self.root_directory.is_absolute() {
            self.root_directory.clone()
        } else {
            base.join(&self.root_directory)
        }
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        MigrateError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {}: {}", path.display(), e),
        ))
    })
}

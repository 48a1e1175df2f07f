//! # pagemod
//!
//! Batch, idempotent source rewriting for page trees.
//!
//! This crate walks a directory for files with one exact name (by default
//! every `page.tsx` under `src/app`), runs an ordered set of text rewrite
//! rules over each, and writes back only the files that changed. The built-in
//! preset moves Next.js App Router pages onto React Router:
//!
//! - removes the leading `"use client"` directive
//! - rewrites `next/navigation` and `next/link` imports to `react-router-dom`
//! - turns `const router = useRouter()` plus `router.push(x)` / `router.back()`
//!   into `const navigate = useNavigate()` / `navigate(x)` / `navigate(-1)`
//!
//! Every rule is conservative: if it cannot tell exactly what a piece of
//! code means it leaves the file alone. An import only moves together with
//! the call sites that depend on it. Running a migration twice is the
//! same as running it once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagemod::prelude::*;
//!
//! let summary = Migrator::new(MigrationConfig::default())?
//!     .base_dir("./web")
//!     .dry_run()
//!     .run()?;
//!
//! println!("{}", summary.diff());
//! println!("{} of {} files would change", summary.total_changed, summary.total_discovered);
//! # Ok::<(), pagemod::MigrateError>(())
//! ```
//!
//! ## Using the rule engine directly
//!
//! ```rust
//! use pagemod::prelude::*;
//!
//! let rules = RuleSet::new()
//!     .strip_directive("use client")
//!     .rewrite_named_import("next/navigation", "react-router-dom", [("useRouter", "useNavigate")]);
//!
//! let outcome = rules.apply("\"use client\"\nimport { useRouter } from \"next/navigation\"\n");
//!
//! assert!(outcome.changed);
//! assert_eq!(outcome.content, "import { useNavigate } from 'react-router-dom'\n");
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod guard;
pub mod lang;
pub mod matcher;
pub mod migration;
pub mod runner;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{MigrationConfig, NameMapping, Preset, RuleSpec};
    pub use crate::diff::DiffSummary;
    pub use crate::error::{MigrateError, Result};
    pub use crate::guard::SyntaxGuard;
    pub use crate::lang::{Language, LanguageRegistry, Tsx, TypeScript};
    pub use crate::matcher::FileMatcher;
    pub use crate::migration::{
        ConfigMigration, Migration, NextToReactRouter, REACT_ROUTER_MODULE, next_to_react_router,
    };
    pub use crate::runner::{FileChange, FileOutcome, FileStatus, Migrator, RunSummary};
    pub use crate::transform::{
        DefaultImportRewrite, LinkHref, NamedImportRewrite, PathnameCallSites, RouterCallSites,
        Rule, RuleGroup, RuleSet, SearchParamsCallSites, StripDirective, TextTransform,
        TransformOutcome,
    };
}

pub use prelude::*;

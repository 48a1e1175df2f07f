//! Migration definitions and the built-in preset.

use crate::config::{MigrationConfig, Preset};
use crate::error::Result;
use crate::transform::import::is_unbound;
use crate::transform::{
    LinkHref, PathnameCallSites, RouterCallSites, RuleGroup, RuleSet, SearchParamsCallSites,
};

/// Module the preset points navigation imports at.
pub const REACT_ROUTER_MODULE: &str = "react-router-dom";

const NEXT_TO_REACT_ROUTER: &str = "next-to-react-router";
const NEXT_TO_REACT_ROUTER_DESCRIPTION: &str =
    "Convert Next.js App Router pages to React Router (navigation hooks, Link, client directive)";

/// `[params] = useSearchParams()` ending a statement, the only React Router
/// use the preset produces.
const SEARCH_PARAMS_DESTRUCTURED: &str = r"(?m)\[[ \t]*[A-Za-z_$][A-Za-z0-9_$]*[ \t]*\][ \t]*=[ \t]*useSearchParams\([ \t]*\)[ \t]*(?:;|$)";

/// A reusable migration: an ordered rule set plus the module specifiers that
/// should be gone once it has run.
///
/// # Example
///
/// ```rust
/// use pagemod::migration::Migration;
/// use pagemod::transform::RuleSet;
///
/// struct DropLegacyHelpers;
///
/// impl Migration for DropLegacyHelpers {
///     fn name(&self) -> &str {
///         "drop-legacy-helpers"
///     }
///
///     fn description(&self) -> &str {
///         "Point helper imports at the new package"
///     }
///
///     fn rules(&self) -> pagemod::Result<RuleSet> {
///         Ok(RuleSet::new().replace_literal("'@/legacy/helpers'", "'@/lib/helpers'"))
///     }
///
///     fn residue(&self) -> Vec<String> {
///         vec!["@/legacy/helpers".to_string()]
///     }
/// }
/// ```
pub trait Migration: Send + Sync {
    /// Unique name for this migration.
    fn name(&self) -> &str;

    /// Human-readable description of what this migration does.
    fn description(&self) -> &str;

    /// The rules to apply, in order.
    fn rules(&self) -> Result<RuleSet>;

    /// Module specifiers that should no longer be imported after the rules
    /// ran. Files still mentioning one need manual attention.
    fn residue(&self) -> Vec<String> {
        Vec::new()
    }

    /// Identifiers the rules replace. A rewrite that leaves one of them in
    /// use with no import binding it is refused.
    fn retired_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Next.js App Router pages to React Router.
///
/// Migrates:
/// - the leading `"use client"` directive (removed)
/// - `next/navigation` hooks to their `react-router-dom` counterparts
/// - `next/link` default imports to the `Link` named import
/// - `router.push/replace/back/forward` to `navigate(...)`
/// - `usePathname()` and `useSearchParams()` call conventions
/// - `<Link href=...>` to `<Link to=...>`
pub struct NextToReactRouter;

impl Migration for NextToReactRouter {
    fn name(&self) -> &str {
        NEXT_TO_REACT_ROUTER
    }

    fn description(&self) -> &str {
        NEXT_TO_REACT_ROUTER_DESCRIPTION
    }

    fn rules(&self) -> Result<RuleSet> {
        // An import only moves together with every call site that depends on it.
        let hooks = RuleGroup::new(
            "navigation-hooks",
            RuleSet::new()
                .rewrite_named_import(
                    "next/navigation",
                    REACT_ROUTER_MODULE,
                    [
                        ("useRouter", "useNavigate"),
                        ("usePathname", "useLocation"),
                        ("useSearchParams", "useSearchParams"),
                        ("useParams", "useParams"),
                    ],
                )
                .rule(RouterCallSites::new(REACT_ROUTER_MODULE))
                .rule(PathnameCallSites::new(REACT_ROUTER_MODULE))
                .rule(SearchParamsCallSites::new(REACT_ROUTER_MODULE)),
        )
        .require_bound("useRouter")
        .require_bound("usePathname")
        .require_form("useSearchParams", SEARCH_PARAMS_DESTRUCTURED);

        let link = RuleGroup::new(
            "link",
            RuleSet::new()
                .rewrite_default_import("next/link", REACT_ROUTER_MODULE, "Link")
                .rule(LinkHref::new(REACT_ROUTER_MODULE)),
        )
        .forbid_attribute(REACT_ROUTER_MODULE, "Link", "href");

        Ok(RuleSet::new()
            .strip_directive("use client")
            .rule(hooks)
            .rule(link))
    }

    fn residue(&self) -> Vec<String> {
        ["next/navigation", "next/link", "next/router"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn retired_names(&self) -> Vec<String> {
        vec!["useRouter".to_string(), "usePathname".to_string()]
    }
}

/// Convenience function to create the Next.js to React Router preset.
pub fn next_to_react_router() -> NextToReactRouter {
    NextToReactRouter
}

/// A migration assembled from a [`MigrationConfig`]: the configured preset
/// followed by the config's own rules.
pub struct ConfigMigration {
    config: MigrationConfig,
}

impl ConfigMigration {
    /// Wraps a configuration, rejecting rules that cannot be built.
    pub fn new(config: MigrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The wrapped configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }
}

impl Migration for ConfigMigration {
    fn name(&self) -> &str {
        match self.config.preset {
            Preset::NextToReactRouter if self.config.rules.is_empty() => NEXT_TO_REACT_ROUTER,
            Preset::NextToReactRouter => "next-to-react-router+config",
            Preset::None => "config",
        }
    }

    fn description(&self) -> &str {
        match self.config.preset {
            Preset::NextToReactRouter => NEXT_TO_REACT_ROUTER_DESCRIPTION,
            Preset::None => "Rules defined in the configuration file",
        }
    }

    fn rules(&self) -> Result<RuleSet> {
        let mut rules = match self.config.preset {
            Preset::NextToReactRouter => NextToReactRouter.rules()?,
            Preset::None => RuleSet::new(),
        };
        for spec in &self.config.rules {
            rules = rules.boxed(spec.to_rule()?);
        }
        Ok(rules)
    }

    fn residue(&self) -> Vec<String> {
        let mut residue = match self.config.preset {
            Preset::NextToReactRouter => NextToReactRouter.residue(),
            Preset::None => Vec::new(),
        };
        for module in self.config.rules.iter().filter_map(|r| r.source_module()) {
            if !residue.iter().any(|m| m == module) {
                residue.push(module.to_string());
            }
        }
        residue
    }

    fn retired_names(&self) -> Vec<String> {
        let mut names = match self.config.preset {
            Preset::NextToReactRouter => NextToReactRouter.retired_names(),
            Preset::None => Vec::new(),
        };
        for name in self.config.rules.iter().flat_map(|r| r.retired_names()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

/// Returns the residue modules still imported or referenced as a quoted
/// specifier in `source`.
pub fn find_residue(source: &str, modules: &[String]) -> Vec<String> {
    modules
        .iter()
        .filter(|m| source.contains(&format!("'{m}'")) || source.contains(&format!("\"{m}\"")))
        .cloned()
        .collect()
}

/// Returns the retired names that `after` uses without an import binding
/// them, where `before` still had them bound.
pub fn find_unbound(before: &str, after: &str, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| is_unbound(after, name) && !is_unbound(before, name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NameMapping, RuleSpec};

    const CLIENT_PAGE: &str = r#""use client"

import { useRouter } from 'next/navigation'

export default function Page() {
  const router = useRouter()
  return (
    <div>
      <button onClick={() => router.push('/x')}>Go</button>
      <button onClick={() => router.back()}>Back</button>
    </div>
  )
}
"#;

    const CLIENT_PAGE_MIGRATED: &str = r#"import { useNavigate } from 'react-router-dom'

export default function Page() {
  const navigate = useNavigate()
  return (
    <div>
      <button onClick={() => navigate('/x')}>Go</button>
      <button onClick={() => navigate(-1)}>Back</button>
    </div>
  )
}
"#;

    const FULL_PAGE: &str = r#"'use client';

import Link from "next/link";
import { usePathname, useRouter, useSearchParams } from "next/navigation";
import { Button } from '@/components/ui/button';

export default function OrdersPage() {
  const router = useRouter();
  const pathname = usePathname();
  const params = useSearchParams();

  const open = (id: string) => router.push('/orders/' + id);

  return (
    <main>
      <Link href="/orders/new" className="btn">New order</Link>
      <p>{pathname} {params.get('tab')}</p>
      <Button onClick={() => router.replace('/orders')}>Reset</Button>
    </main>
  );
}
"#;

    const SERVER_PAGE: &str = r#"import { db } from '@/lib/db'

export default async function Page() {
  const orders = await db.orders.findMany()
  return <ul>{orders.map((o) => <li key={o.id}>{o.name}</li>)}</ul>
}
"#;

    const ROUTER_IN_DEPENDENCIES: &str = r#"import { useEffect } from 'react'
import { useRouter } from 'next/navigation'

export default function Page() {
  const router = useRouter()
  useEffect(() => {
    router.push('/login')
  }, [router])
  return null
}
"#;

    const PATHNAME_AS_VALUE: &str = r#"import { usePathname } from 'next/navigation'

const hook = usePathname

export default function Page() {
  return <p>{hook()}</p>
}
"#;

    const TWO_ROUTERS: &str = r#"import { useRouter } from 'next/navigation'

export default function Page() {
  const a = useRouter()
  const b = useRouter()
  return <button onClick={() => (a.back(), b.back())}>Back</button>
}
"#;

    const SEARCH_PARAMS_CHAINED: &str = r#"import { useSearchParams } from 'next/navigation'

export default function Page() {
  const tab = useSearchParams().get('tab')
  return <p>{tab}</p>
}
"#;

    fn migrate(source: &str) -> crate::transform::TransformOutcome {
        NextToReactRouter.rules().unwrap().apply(source)
    }

    #[test]
    fn test_client_page_end_to_end() {
        let outcome = migrate(CLIENT_PAGE);

        assert!(outcome.changed);
        assert_eq!(outcome.content, CLIENT_PAGE_MIGRATED);
        assert_eq!(
            outcome.applied,
            vec!["strip-directive", "named-import", "router-call-sites"]
        );
    }

    #[test]
    fn test_full_page() {
        let outcome = migrate(FULL_PAGE);

        assert!(outcome.changed);
        let out = &outcome.content;
        assert!(out.starts_with("import { Link } from 'react-router-dom';\n"));
        assert!(out.contains(
            "import { useLocation, useNavigate, useSearchParams } from 'react-router-dom';"
        ));
        assert!(out.contains("const navigate = useNavigate();"));
        assert!(out.contains("const pathname = useLocation().pathname;"));
        assert!(out.contains("const [params] = useSearchParams();"));
        assert!(out.contains("navigate('/orders/' + id)"));
        assert!(out.contains("navigate('/orders', { replace: true })"));
        assert!(out.contains(r#"<Link to="/orders/new" className="btn">"#));
        assert!(out.contains("import { Button } from '@/components/ui/button';"));
        assert!(find_residue(out, &NextToReactRouter.residue()).is_empty());
    }

    #[test]
    fn test_idempotent_over_corpus() {
        let partial = "import { useRouter as useNextRouter } from 'next/navigation'\n\nconst r = useNextRouter()\n";
        for source in [CLIENT_PAGE, FULL_PAGE, SERVER_PAGE, CLIENT_PAGE_MIGRATED, partial] {
            let once = migrate(source).content;
            let twice = migrate(&once);

            assert_eq!(twice.content, once);
            assert!(!twice.changed, "second pass changed:\n{once}");
        }
    }

    #[test]
    fn test_hooks_keep_their_import_when_call_sites_decline() {
        let residue = NextToReactRouter.residue();
        let retired = NextToReactRouter.retired_names();

        for page in [
            ROUTER_IN_DEPENDENCIES,
            PATHNAME_AS_VALUE,
            TWO_ROUTERS,
            SEARCH_PARAMS_CHAINED,
        ] {
            let outcome = migrate(page);

            assert!(!outcome.changed, "rewrote:\n{}", outcome.content);
            assert_eq!(outcome.content, page);
            assert_eq!(
                find_residue(&outcome.content, &residue),
                vec!["next/navigation".to_string()]
            );
            assert!(find_unbound(page, &outcome.content, &retired).is_empty());
        }
    }

    #[test]
    fn test_declined_hooks_do_not_hold_back_other_rules() {
        let page = format!("'use client'\n\nimport Link from 'next/link'\n{PATHNAME_AS_VALUE}");
        let page = page.replace("<p>{hook()}</p>", "<Link href=\"/a\">{hook()}</Link>");

        let outcome = migrate(&page);

        assert_eq!(
            outcome.applied,
            vec!["strip-directive", "default-import", "link-href"]
        );
        let out = &outcome.content;
        assert!(out.starts_with("import { Link } from 'react-router-dom'\n"));
        assert!(out.contains("import { usePathname } from 'next/navigation'"));
        assert!(out.contains("const hook = usePathname\n"));
        assert!(out.contains("<Link to=\"/a\">"));
        assert_eq!(
            find_residue(out, &NextToReactRouter.residue()),
            vec!["next/navigation".to_string()]
        );
    }

    #[test]
    fn test_find_unbound() {
        let names = NextToReactRouter.retired_names();
        let before = "import { useRouter } from 'next/navigation'\nconst r = useRouter()\n";
        let after = "import { useNavigate } from 'react-router-dom'\nconst r = useRouter()\n";

        assert_eq!(find_unbound(before, after, &names), vec!["useRouter".to_string()]);
        // Already unbound before the rewrite: not this rewrite's doing.
        assert!(find_unbound(after, after, &names).is_empty());
    }

    #[test]
    fn test_no_op_safety() {
        let outcome = migrate(SERVER_PAGE);

        assert!(!outcome.changed);
        assert_eq!(outcome.content, SERVER_PAGE);
        assert!(outcome.applied.is_empty());
    }

    #[test]
    fn test_quoting_equivalence() {
        let single = "import { useRouter } from 'next/navigation'\n";
        let double = "import { useRouter } from \"next/navigation\"\n";

        assert_eq!(migrate(single).content, migrate(double).content);
        assert_eq!(
            migrate(double).content,
            "import { useNavigate } from 'react-router-dom'\n"
        );
    }

    #[test]
    fn test_residue_reports_leftovers() {
        let source = "import { useRouter as useNextRouter } from 'next/navigation'\nimport Head from \"next/head\"\n";
        let out = migrate(source).content;

        assert_eq!(
            find_residue(&out, &NextToReactRouter.residue()),
            vec!["next/navigation".to_string()]
        );
    }

    #[test]
    fn test_config_migration_appends_rules() {
        let config = MigrationConfig {
            rules: vec![RuleSpec::NamedImport {
                from: "next/navigation".to_string(),
                to: REACT_ROUTER_MODULE.to_string(),
                names: vec![NameMapping {
                    from: "redirect".to_string(),
                    to: "redirect".to_string(),
                }],
            }],
            ..Default::default()
        };
        let migration = ConfigMigration::new(config).unwrap();
        let rules = migration.rules().unwrap();

        assert_eq!(rules.len(), NextToReactRouter.rules().unwrap().len() + 1);
        assert_eq!(migration.name(), "next-to-react-router+config");
        assert_eq!(
            rules
                .apply("import { redirect } from 'next/navigation'\n")
                .content,
            "import { redirect } from 'react-router-dom'\n"
        );
        assert_eq!(migration.residue(), NextToReactRouter.residue());
        assert_eq!(migration.retired_names(), NextToReactRouter.retired_names());
    }

    #[test]
    fn test_config_migration_without_preset() {
        let config = MigrationConfig {
            preset: Preset::None,
            rules: vec![RuleSpec::ReplaceLiteral {
                from: "'next/head'".to_string(),
                to: "'react-helmet'".to_string(),
            }],
            ..Default::default()
        };
        let migration = ConfigMigration::new(config).unwrap();
        let rules = migration.rules().unwrap();

        assert_eq!(rules.names(), vec!["replace-literal"]);
        assert!(migration.residue().is_empty());
        assert!(!rules.apply(CLIENT_PAGE).changed);
    }
}

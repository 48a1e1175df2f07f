//! Rules that take effect together or not at all.

use super::import::{import_spans, is_unbound, local_names};
use super::{Rule, RuleSet};
use regex::Regex;
use tracing::debug;

/// A condition the grouped rewrite must satisfy to be kept.
enum Requirement {
    /// The identifier may not be left in use without an import binding it.
    Bound(String),
    /// Every use of the identifier outside imports sits inside a match of `form`.
    Form {
        name: String,
        name_word: Regex,
        form: Regex,
    },
    /// No element bound to `export` from `module` carries `attr`.
    NoAttribute {
        module: String,
        export: String,
        attr: String,
    },
}

impl Requirement {
    fn holds(&self, before: &str, after: &str) -> bool {
        match self {
            Requirement::Bound(name) => !is_unbound(after, name) || is_unbound(before, name),
            Requirement::Form {
                name_word, form, ..
            } => {
                let imports = import_spans(after);
                let allowed: Vec<_> = form.find_iter(after).map(|m| m.range()).collect();
                name_word.find_iter(after).all(|m| {
                    imports.iter().any(|s| s.contains(&m.start()))
                        || allowed.iter().any(|s| s.contains(&m.start()))
                })
            }
            Requirement::NoAttribute {
                module,
                export,
                attr,
            } => local_names(after, module, export).iter().all(|local| {
                let tag = format!(
                    r"<{}\s[^<]*?\b{}=",
                    regex::escape(local),
                    regex::escape(attr)
                );
                Regex::new(&tag).is_ok_and(|tag| !tag.is_match(after))
            }),
        }
    }

    fn describe(&self) -> String {
        match self {
            Requirement::Bound(name) => format!("`{name}` stays bound"),
            Requirement::Form { name, .. } => format!("every `{name}` use is converted"),
            Requirement::NoAttribute { export, attr, .. } => {
                format!("no `<{export} {attr}=>` is left")
            }
        }
    }
}

/// An all-or-nothing group of rules.
///
/// The member rules run in order on a scratch copy. The result is kept only
/// if every requirement holds afterwards; otherwise the group leaves the text
/// exactly as it found it. Reports name the members that changed the text,
/// not the group.
///
/// # Example
///
/// ```rust
/// use pagemod::transform::{RouterCallSites, RuleGroup, RuleSet};
///
/// let hooks = RuleGroup::new(
///     "navigation-hooks",
///     RuleSet::new()
///         .rewrite_named_import("next/navigation", "react-router-dom", [("useRouter", "useNavigate")])
///         .rule(RouterCallSites::new("react-router-dom")),
/// )
/// .require_bound("useRouter");
///
/// // `router` escapes into a dependency array, so nothing moves.
/// let page = "import { useRouter } from 'next/navigation'\nconst router = useRouter()\nuseEffect(() => {}, [router])\n";
/// assert_eq!(RuleSet::new().rule(hooks).apply(page).content, page);
/// ```
pub struct RuleGroup {
    name: String,
    rules: RuleSet,
    requirements: Vec<Requirement>,
}

impl RuleGroup {
    pub fn new(name: &str, rules: RuleSet) -> Self {
        Self {
            name: name.to_string(),
            rules,
            requirements: Vec::new(),
        }
    }

    /// Requires that `name` is not left in use with no import binding it,
    /// unless it already was before the group ran.
    pub fn require_bound(mut self, name: &str) -> Self {
        self.requirements.push(Requirement::Bound(name.to_string()));
        self
    }

    /// Requires every use of `name` outside imports to match `form`.
    pub fn require_form(mut self, name: &str, form: &str) -> Self {
        self.requirements.push(Requirement::Form {
            name: name.to_string(),
            name_word: Regex::new(&format!(r"\b{}\b", regex::escape(name)))
                .expect("invalid regex"),
            form: Regex::new(form).expect("invalid regex"),
        });
        self
    }

    /// Requires that no element imported as `export` from `module` still
    /// carries the attribute `attr`.
    pub fn forbid_attribute(mut self, module: &str, export: &str, attr: &str) -> Self {
        self.requirements.push(Requirement::NoAttribute {
            module: module.to_string(),
            export: export.to_string(),
            attr: attr.to_string(),
        });
        self
    }
}

impl Rule for RuleGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        self.rewrite_traced(source).map(|(content, _)| content)
    }

    fn rewrite_traced(&self, source: &str) -> Option<(String, Vec<String>)> {
        let outcome = self.rules.apply(source);
        if !outcome.changed {
            return None;
        }

        if let Some(failed) = self
            .requirements
            .iter()
            .find(|r| !r.holds(source, &outcome.content))
        {
            debug!(
                group = %self.name,
                requirement = %failed.describe(),
                "group rolled back"
            );
            return None;
        }

        Some((outcome.content, outcome.applied))
    }

    fn describe(&self) -> String {
        format!("All or nothing: {}", self.rules.names().join(", "))
    }
}

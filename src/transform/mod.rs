//! Rule engine for text rewrites.
//!
//! A [`Rule`] is a pure text-to-text rewrite. A [`RuleSet`] applies its rules
//! in a fixed order, feeding each rule the output of the previous one, and
//! records which rules actually changed the text.

pub mod call_site;
pub mod directive;
pub mod group;
pub mod import;
pub mod text;

pub use call_site::{LinkHref, PathnameCallSites, RouterCallSites, SearchParamsCallSites};
pub use directive::StripDirective;
pub use group::RuleGroup;
pub use import::{DefaultImportRewrite, NamedImportRewrite};
pub use text::TextTransform;

use crate::error::Result;
use tracing::debug;

/// A single rewrite rule.
///
/// Rules see only the text they are given. Returning `None` means the rule
/// did not apply; a rule that is unsure whether it matches must return `None`
/// rather than guess.
pub trait Rule: Send + Sync {
    /// Short, stable identifier used in reports.
    fn name(&self) -> &str;

    /// Rewrites the source, or returns `None` if nothing matched.
    fn rewrite(&self, source: &str) -> Option<String>;

    /// Returns a description of the rule.
    fn describe(&self) -> String;

    /// Like [`Rule::rewrite`], but also names the rules that made the change.
    /// Composite rules report their members instead of themselves.
    fn rewrite_traced(&self, source: &str) -> Option<(String, Vec<String>)> {
        self.rewrite(source)
            .map(|content| (content, vec![self.name().to_string()]))
    }
}

/// Result of running a rule set over one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub content: String,
    pub changed: bool,
    /// Names of the rules that changed the text, in application order.
    pub applied: Vec<String>,
}

/// An ordered list of rules.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leading-directive removal rule.
    pub fn strip_directive(self, directive: &str) -> Self {
        self.rule(StripDirective::new(directive))
    }

    /// Adds a named-import rewrite from `from` to `to`.
    pub fn rewrite_named_import<'a>(
        self,
        from: &str,
        to: &str,
        names: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.rule(NamedImportRewrite::new(from, to, names))
    }

    /// Adds a default-import to named-import rewrite.
    pub fn rewrite_default_import(self, from: &str, to: &str, name: &str) -> Self {
        self.rule(DefaultImportRewrite::new(from, to, name))
    }

    /// Adds a literal string replacement.
    pub fn replace_literal(self, needle: &str, replacement: &str) -> Self {
        self.rule(TextTransform::replace_literal(needle, replacement))
    }

    /// Adds a regex replacement.
    pub fn replace_pattern(self, pattern: &str, replacement: &str) -> Result<Self> {
        Ok(self.rule(TextTransform::replace(pattern, replacement)?))
    }

    /// Adds any rule.
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds an already boxed rule, such as one built from configuration.
    pub fn boxed(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends all rules of another set after this one's.
    pub fn extend(mut self, other: RuleSet) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Applies every rule in order.
    pub fn apply(&self, source: &str) -> TransformOutcome {
        let mut content = source.to_string();
        let mut applied = Vec::new();

        for rule in &self.rules {
            if let Some((rewritten, names)) = rule.rewrite_traced(&content)
                && rewritten != content
            {
                for name in &names {
                    debug!(rule = %name, "rule applied");
                }
                applied.extend(names);
                content = rewritten;
            }
        }

        TransformOutcome {
            changed: !applied.is_empty(),
            content,
            applied,
        }
    }

    /// Returns descriptions of all rules.
    pub fn describe(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.describe()).collect()
    }

    /// Returns the rule names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Matches a quoted module specifier in either quote style.
pub(crate) fn quoted_module(module: &str) -> String {
    let escaped = regex::escape(module);
    format!(r#"(?:'{escaped}'|"{escaped}")"#)
}

//! Import statement rewrites.

use super::{Rule, quoted_module};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

/// Rewrites `import { a, b } from '<from>'` to the equivalent names from `<to>`.
///
/// A statement is only rewritten when every bound name is a plain identifier
/// with a known equivalent. Aliased bindings, type imports, comments inside
/// the braces and unknown names leave the statement untouched.
pub struct NamedImportRewrite {
    from: String,
    to: String,
    names: Vec<(String, String)>,
    pattern: Regex,
}

impl NamedImportRewrite {
    /// Creates a rule mapping each `(foreign, target)` name pair.
    pub fn new<'a>(
        from: &str,
        to: &str,
        names: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let pattern = format!(
            r"(?m)^(?P<indent>[ \t]*)import[ \t]*\{{(?P<names>[^{{}}]*)\}}[ \t]*from[ \t]*{}(?P<semi>[ \t]*;)?",
            quoted_module(from)
        );
        Self {
            from: from.to_string(),
            to: to.to_string(),
            names: names
                .into_iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            pattern: Regex::new(&pattern).expect("invalid regex"),
        }
    }

    fn equivalent(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|(foreign, _)| foreign == name)
            .map(|(_, target)| target.as_str())
    }

    fn map_names(&self, list: &str) -> Option<Vec<&str>> {
        let mut mapped: Vec<&str> = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !is_identifier(item) {
                return None;
            }
            let target = self.equivalent(item)?;
            if !mapped.contains(&target) {
                mapped.push(target);
            }
        }
        (!mapped.is_empty()).then_some(mapped)
    }
}

impl Rule for NamedImportRewrite {
    fn name(&self) -> &str {
        "named-import"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        let mut matched = false;
        let rewritten = self.pattern.replace_all(source, |caps: &Captures| {
            match self.map_names(&caps["names"]) {
                Some(names) => {
                    matched = true;
                    render_named_import(
                        &caps["indent"],
                        &names,
                        &self.to,
                        caps.name("semi").is_some(),
                    )
                }
                None => caps[0].to_string(),
            }
        });
        matched.then(|| rewritten.into_owned())
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self
            .names
            .iter()
            .map(|(a, b)| format!("{a} -> {b}"))
            .collect();
        format!(
            "Rewrite named imports from '{}' to '{}' ({})",
            self.from,
            self.to,
            names.join(", ")
        )
    }
}

/// Rewrites `import Local from '<from>'` to `import { Name } from '<to>'`.
///
/// When the local binding differs from the target name the binding is kept
/// with an alias, so no usage in the file has to change.
pub struct DefaultImportRewrite {
    from: String,
    to: String,
    name: String,
    pattern: Regex,
}

impl DefaultImportRewrite {
    pub fn new(from: &str, to: &str, name: &str) -> Self {
        let pattern = format!(
            r"(?m)^(?P<indent>[ \t]*)import[ \t]+(?P<local>[A-Za-z_$][A-Za-z0-9_$]*)[ \t]+from[ \t]*{}(?P<semi>[ \t]*;)?",
            quoted_module(from)
        );
        Self {
            from: from.to_string(),
            to: to.to_string(),
            name: name.to_string(),
            pattern: Regex::new(&pattern).expect("invalid regex"),
        }
    }
}

impl Rule for DefaultImportRewrite {
    fn name(&self) -> &str {
        "default-import"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        let mut matched = false;
        let rewritten = self.pattern.replace_all(source, |caps: &Captures| {
            let local = &caps["local"];
            if local == "type" {
                return caps[0].to_string();
            }
            matched = true;
            let binding = if local == self.name {
                self.name.clone()
            } else {
                format!("{} as {local}", self.name)
            };
            render_named_import(
                &caps["indent"],
                &[binding.as_str()],
                &self.to,
                caps.name("semi").is_some(),
            )
        });
        matched.then(|| rewritten.into_owned())
    }

    fn describe(&self) -> String {
        format!(
            "Rewrite default import from '{}' to named import {{ {} }} from '{}'",
            self.from, self.name, self.to
        )
    }
}

/// Renders an import in the canonical single-quoted form.
fn render_named_import(indent: &str, names: &[&str], module: &str, semi: bool) -> String {
    format!(
        "{indent}import {{ {} }} from '{module}'{}",
        names.join(", "),
        if semi { ";" } else { "" }
    )
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A parsed, line-leading ES import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportStatement {
    pub module: String,
    pub default: Option<String>,
    /// `(imported, local)` pairs from the braces.
    pub named: Vec<(String, String)>,
}

impl ImportStatement {
    /// Returns true if the statement introduces `local` into scope.
    pub fn binds(&self, local: &str) -> bool {
        self.default.as_deref() == Some(local) || self.named.iter().any(|(_, l)| l == local)
    }
}

static IMPORT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import[ \t]+(?:type[ \t]+)?(?P<clause>[^'";]*?)[ \t]*\bfrom[ \t]*(?:'(?P<sq>[^'\n]*)'|"(?P<dq>[^"\n]*)")"#,
    )
    .expect("invalid regex")
});

/// Extracts the import statements of a file.
pub(crate) fn parse_imports(source: &str) -> Vec<ImportStatement> {
    IMPORT_STATEMENT
        .captures_iter(source)
        .map(|caps| {
            let module = caps
                .name("sq")
                .or_else(|| caps.name("dq"))
                .map_or("", |m| m.as_str())
                .to_string();
            let (default, named) = parse_clause(&caps["clause"]);
            ImportStatement {
                module,
                default,
                named,
            }
        })
        .collect()
}

fn parse_clause(clause: &str) -> (Option<String>, Vec<(String, String)>) {
    let (head, braces) = match clause.split_once('{') {
        Some((head, rest)) => (head, rest.split_once('}').map_or(rest, |(inner, _)| inner)),
        None => (clause, ""),
    };

    let default = head
        .trim()
        .trim_end_matches(',')
        .trim()
        .to_string();
    let default = is_identifier(&default).then_some(default);

    let named = braces
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|item| {
            let item = item.strip_prefix("type ").map_or(item, str::trim);
            match item.split_once(" as ") {
                Some((imported, local)) => Some((imported.trim().to_string(), local.trim().to_string())),
                None => is_identifier(item).then(|| (item.to_string(), item.to_string())),
            }
        })
        .collect();

    (default, named)
}

/// Byte ranges covered by import statements.
pub(crate) fn import_spans(source: &str) -> Vec<Range<usize>> {
    IMPORT_STATEMENT
        .find_iter(source)
        .map(|m| m.range())
        .collect()
}

/// Returns true if `module` provides a binding named `local`.
pub(crate) fn imports_from(source: &str, module: &str, local: &str) -> bool {
    parse_imports(source)
        .iter()
        .any(|stmt| stmt.module == module && stmt.binds(local))
}

/// Returns true if any module other than `module` provides a binding named `local`.
pub(crate) fn imported_elsewhere(source: &str, module: &str, local: &str) -> bool {
    parse_imports(source)
        .iter()
        .any(|stmt| stmt.module != module && stmt.binds(local))
}

/// Local names bound to `imported` from `module` (including aliases).
pub(crate) fn local_names(source: &str, module: &str, imported: &str) -> Vec<String> {
    parse_imports(source)
        .into_iter()
        .filter(|stmt| stmt.module == module)
        .flat_map(|stmt| stmt.named)
        .filter(|(name, _)| name == imported)
        .map(|(_, local)| local)
        .collect()
}

/// Returns true if `name` is used outside import statements while no import
/// binds it. Member accesses such as `x.name` are not uses.
pub(crate) fn is_unbound(source: &str, name: &str) -> bool {
    if parse_imports(source).iter().any(|stmt| stmt.binds(name)) {
        return false;
    }
    let spans = import_spans(source);
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name))).expect("invalid regex");
    pattern.find_iter(source).any(|m| {
        let before = source[..m.start()].bytes().next_back();
        let after = source[m.end()..].bytes().next();
        !spans.iter().any(|span| span.contains(&m.start()))
            && !matches!(before, Some(b'.' | b'$'))
            && after != Some(b'$')
    })
}

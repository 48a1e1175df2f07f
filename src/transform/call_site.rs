//! Call-site rewrites for hooks whose calling convention changed.
//!
//! Each rule here only runs once the file imports the replacement from the
//! target module and no other module still provides the old name. In the
//! preset they share a [`RuleGroup`](super::RuleGroup) with that import
//! rewrite, so a declined call site also keeps the old import.

use super::Rule;
use super::import::{import_spans, imported_elsewhere, imports_from, local_names};
use regex::{Captures, Regex};

/// Rewrites a router binding and its navigation calls.
///
/// ```text
/// const router = useRouter()      ->  const navigate = useNavigate()
/// router.push(to)                 ->  navigate(to)
/// router.replace(to)              ->  navigate(to, { replace: true })
/// router.back()                   ->  navigate(-1)
/// router.forward()                ->  navigate(1)
/// ```
///
/// The rewrite is all-or-nothing per file: if the binding is used in any
/// other way the file is left as it is.
pub struct RouterCallSites {
    module: String,
    old_hook: String,
    new_hook: String,
    binding: String,
    declaration: Regex,
    old_hook_word: Regex,
    binding_word: Regex,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

impl RouterCallSites {
    pub fn new(module: &str) -> Self {
        Self::with_names(module, "useRouter", "useNavigate", "navigate")
    }

    /// Creates the rule with explicit hook and binding names.
    pub fn with_names(module: &str, old_hook: &str, new_hook: &str, binding: &str) -> Self {
        let declaration = format!(
            r"\b(?P<kw>const|let|var)[ \t]+(?P<binding>[A-Za-z_][A-Za-z0-9_]*)[ \t]*=[ \t]*{}\([ \t]*\)",
            regex::escape(old_hook)
        );
        Self {
            module: module.to_string(),
            old_hook: old_hook.to_string(),
            new_hook: new_hook.to_string(),
            binding: binding.to_string(),
            declaration: Regex::new(&declaration).expect("invalid regex"),
            old_hook_word: word(old_hook),
            binding_word: word(binding),
        }
    }

    fn call_edit(&self, source: &str, start: usize, after: usize) -> Option<Edit> {
        let rest = &source[after..];
        let target = &self.binding;

        if rest.starts_with(".back()") {
            return Some(Edit {
                start,
                end: after + ".back()".len(),
                replacement: format!("{target}(-1)"),
            });
        }
        if rest.starts_with(".forward()") {
            return Some(Edit {
                start,
                end: after + ".forward()".len(),
                replacement: format!("{target}(1)"),
            });
        }

        let (open, replace) = if rest.starts_with(".push(") {
            (after + ".push".len(), false)
        } else if rest.starts_with(".replace(") {
            (after + ".replace".len(), true)
        } else {
            return None;
        };

        let (close, has_comma) = scan_call_args(source, open)?;
        let args = source[open + 1..close].trim();
        if args.is_empty() || has_comma {
            return None;
        }

        let replacement = if replace {
            format!("{target}({args}, {{ replace: true }})")
        } else {
            format!("{target}({args})")
        };
        Some(Edit {
            start,
            end: close + 1,
            replacement,
        })
    }
}

impl Rule for RouterCallSites {
    fn name(&self) -> &str {
        "router-call-sites"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        if !imports_from(source, &self.module, &self.new_hook)
            || imported_elsewhere(source, &self.module, &self.old_hook)
        {
            return None;
        }

        let mut declarations = self.declaration.captures_iter(source);
        let decl = declarations.next()?;
        if declarations.next().is_some() {
            return None;
        }
        let decl_span = decl.get(0)?.range();
        let old_binding = &decl["binding"];

        if old_binding != self.binding && self.binding_word.is_match(source) {
            return None;
        }
        let imports = import_spans(source);
        let outside = |start: usize| {
            !decl_span.contains(&start) && !imports.iter().any(|span| span.contains(&start))
        };

        // Any other mention of the old hook (e.g. `useRouter().push(...)`) would dangle.
        if self.old_hook_word.find_iter(source).any(|m| outside(m.start())) {
            return None;
        }

        let mut edits = vec![Edit {
            start: decl_span.start,
            end: decl_span.end,
            replacement: format!("{} {} = {}()", &decl["kw"], self.binding, self.new_hook),
        }];

        let usage = word(old_binding);
        for m in usage.find_iter(source) {
            if !outside(m.start()) {
                continue;
            }
            if is_member_or_extended(source, m.start(), m.end()) {
                return None;
            }
            edits.push(self.call_edit(source, m.start(), m.end())?);
        }

        apply_edits(source, edits)
    }

    fn describe(&self) -> String {
        format!(
            "Replace `{}()` bindings with `{} = {}()` and rewrite push/replace/back/forward calls",
            self.old_hook, self.binding, self.new_hook
        )
    }
}

/// Rewrites `usePathname()` to `useLocation().pathname`.
pub struct PathnameCallSites {
    module: String,
    hook_word: Regex,
}

impl PathnameCallSites {
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            hook_word: word("usePathname"),
        }
    }
}

impl Rule for PathnameCallSites {
    fn name(&self) -> &str {
        "pathname-call-sites"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        if !imports_from(source, &self.module, "useLocation")
            || imported_elsewhere(source, &self.module, "usePathname")
        {
            return None;
        }

        let imports = import_spans(source);
        let mut edits = Vec::new();
        for m in self.hook_word.find_iter(source) {
            if imports.iter().any(|span| span.contains(&m.start())) {
                continue;
            }
            if is_member_or_extended(source, m.start(), m.end()) {
                return None;
            }
            let rest = &source[m.end()..];
            let args = rest.strip_prefix('(')?;
            let close = args.find(')')?;
            if !args[..close].trim().is_empty() {
                return None;
            }
            edits.push(Edit {
                start: m.start(),
                end: m.end() + 1 + close + 1,
                replacement: "useLocation().pathname".to_string(),
            });
        }

        if edits.is_empty() {
            return None;
        }
        apply_edits(source, edits)
    }

    fn describe(&self) -> String {
        "Replace `usePathname()` with `useLocation().pathname`".to_string()
    }
}

/// Destructures search-param bindings: `const p = useSearchParams()` becomes
/// `const [p] = useSearchParams()`.
///
/// The call must end the statement; chained uses such as
/// `useSearchParams().get(..)` are not declarations and stay as they are.
pub struct SearchParamsCallSites {
    module: String,
    declaration: Regex,
}

impl SearchParamsCallSites {
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            declaration: Regex::new(
                r"(?m)\b(?P<kw>const|let|var)[ \t]+(?P<binding>[A-Za-z_$][A-Za-z0-9_$]*)[ \t]*=[ \t]*useSearchParams\([ \t]*\)(?P<tail>[ \t]*(?:;|$))",
            )
            .expect("invalid regex"),
        }
    }
}

impl Rule for SearchParamsCallSites {
    fn name(&self) -> &str {
        "search-params-call-sites"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        if !imports_from(source, &self.module, "useSearchParams")
            || imported_elsewhere(source, &self.module, "useSearchParams")
            || !self.declaration.is_match(source)
        {
            return None;
        }

        let rewritten = self.declaration.replace_all(source, |caps: &Captures| {
            format!(
                "{} [{}] = useSearchParams(){}",
                &caps["kw"], &caps["binding"], &caps["tail"]
            )
        });
        Some(rewritten.into_owned())
    }

    fn describe(&self) -> String {
        "Destructure `useSearchParams()` results into `[params]`".to_string()
    }
}

/// Renames `href=` to `to=` on `<Link>` elements imported from the router.
///
/// Only opening tags without expression braces before the attribute are
/// touched, so a `>` inside an expression cannot confuse the match.
pub struct LinkHref {
    module: String,
}

impl LinkHref {
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
        }
    }
}

impl Rule for LinkHref {
    fn name(&self) -> &str {
        "link-href"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        let mut current = source.to_string();
        let mut matched = false;

        for local in local_names(source, &self.module, "Link") {
            // The name must end at whitespace, so `<Link.Item href=..>` is not a match.
            let tag = Regex::new(&format!(
                r"(?P<head><{}\s(?:[^<>{{}}]*?\s)?)href=",
                regex::escape(&local)
            ))
            .ok()?;
            if tag.is_match(&current) {
                matched = true;
                current = tag.replace_all(&current, "${head}to=").into_owned();
            }
        }

        matched.then_some(current)
    }

    fn describe(&self) -> String {
        "Rename `href` to `to` on router `<Link>` elements".to_string()
    }
}

fn word(name: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(name))).expect("invalid regex")
}

/// True if the identifier at `start..end` is a member access (`x.router`) or
/// part of a longer `$`-identifier, which `\b` does not see.
fn is_member_or_extended(source: &str, start: usize, end: usize) -> bool {
    let before = source[..start].bytes().next_back();
    let after = source[end..].bytes().next();
    matches!(before, Some(b'.') | Some(b'$')) || after == Some(b'$')
}

/// Applies non-overlapping edits, or returns `None` if any two overlap.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Option<String> {
    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.start < cursor {
            return None;
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    Some(out)
}

/// Finds the `)` closing the call whose `(` is at `open`.
///
/// Returns the index of the closing paren and whether a top-level comma was
/// seen. Gives up (returns `None`) on unbalanced brackets, comments, line
/// breaks inside string literals and template literals with substitutions.
fn scan_call_args(source: &str, open: usize) -> Option<(usize, bool)> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let mut stack: Vec<u8> = Vec::new();
    let mut top_level_comma = false;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => stack.push(b')'),
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            c @ (b')' | b']' | b'}') => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some((i, top_level_comma));
                }
            }
            b',' if stack.len() == 1 => top_level_comma = true,
            q @ (b'\'' | b'"') => i = skip_string(bytes, i, q)?,
            b'`' => i = skip_template(bytes, i)?,
            b'/' if matches!(bytes.get(i + 1), Some(b'/' | b'*')) => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\n' => return None,
            c if c == quote => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_template(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'`' => return Some(i),
            b'$' if bytes.get(i + 1) == Some(&b'{') => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

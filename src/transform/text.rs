//! Plain text rules using regex or literal replacement.

use super::Rule;
use crate::error::Result;
use regex::Regex;
use std::borrow::Cow;

/// Text-based rule using regex or literal replacement.
///
/// These carry no structural knowledge; they are what configuration files
/// use for one-off renames.
pub struct TextTransform {
    kind: TextTransformKind,
}

enum TextTransformKind {
    Replace { pattern: Regex, replacement: String },
    ReplaceLiteral { needle: String, replacement: String },
}

impl TextTransform {
    /// Creates a regex replacement rule.
    pub fn replace(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self::replace_regex(Regex::new(pattern)?, replacement))
    }

    /// Creates a replacement rule from a pre-compiled regex.
    pub fn replace_regex(pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            kind: TextTransformKind::Replace {
                pattern,
                replacement: replacement.into(),
            },
        }
    }

    /// Creates a literal string replacement rule.
    pub fn replace_literal(needle: &str, replacement: &str) -> Self {
        Self {
            kind: TextTransformKind::ReplaceLiteral {
                needle: needle.to_string(),
                replacement: replacement.to_string(),
            },
        }
    }
}

impl Rule for TextTransform {
    fn name(&self) -> &str {
        match &self.kind {
            TextTransformKind::Replace { .. } => "replace-pattern",
            TextTransformKind::ReplaceLiteral { .. } => "replace-literal",
        }
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        match &self.kind {
            TextTransformKind::Replace { pattern, replacement } => {
                match pattern.replace_all(source, replacement.as_str()) {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(rewritten) => Some(rewritten),
                }
            }
            TextTransformKind::ReplaceLiteral { needle, replacement } => {
                if needle.is_empty() || !source.contains(needle.as_str()) {
                    return None;
                }
                Some(source.replace(needle.as_str(), replacement))
            }
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            TextTransformKind::Replace { pattern, replacement } => {
                format!("Replace pattern '{}' with '{}'", pattern.as_str(), replacement)
            }
            TextTransformKind::ReplaceLiteral { needle, replacement } => {
                format!("Replace literal '{}' with '{}'", needle, replacement)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_pattern() {
        let rule = TextTransform::replace(r"router\.refresh\(\)", "window.location.reload()").unwrap();

        let out = rule.rewrite("onClick={() => router.refresh()}").unwrap();

        assert_eq!(out, "onClick={() => window.location.reload()}");
    }

    #[test]
    fn test_replace_pattern_with_captures() {
        let rule = TextTransform::replace(r"getServerSession\((\w+)\)", "useSession($1)").unwrap();

        assert_eq!(
            rule.rewrite("const s = getServerSession(opts)").unwrap(),
            "const s = useSession(opts)"
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let rule = TextTransform::replace(r"\bfoo\b", "bar").unwrap();
        assert!(rule.rewrite("food").is_none());

        let rule = TextTransform::replace_literal("next/image", "./Image");
        assert!(rule.rewrite("import x from 'y'").is_none());
    }

    #[test]
    fn test_empty_needle_never_matches() {
        let rule = TextTransform::replace_literal("", "x");
        assert!(rule.rewrite("abc").is_none());
    }

    #[test]
    fn test_describe() {
        let rule = TextTransform::replace_literal("a", "b");
        assert_eq!(rule.describe(), "Replace literal 'a' with 'b'");
    }
}

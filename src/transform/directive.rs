//! Removal of leading module directives such as `"use client"`.

use super::Rule;
use regex::Regex;

/// Strips a directive literal from the start of a file.
///
/// Only directives in leading statement position are removed: each one must
/// stand alone on its own line, before any other code or comment. A
/// directive may be followed by one blank line, which is removed with it.
/// A byte-order mark at the start of the file is kept.
pub struct StripDirective {
    directive: String,
    pattern: Regex,
}

impl StripDirective {
    /// Creates a rule for the given directive text (without quotes).
    pub fn new(directive: &str) -> Self {
        let escaped = regex::escape(directive);
        let pattern = format!(
            r#"\A(?P<bom>\x{{FEFF}}?)(?:[ \t]*(?:"{escaped}"|'{escaped}')[ \t]*;?[ \t]*(?:\r?\n|\z)(?:[ \t]*\r?\n)?)+"#
        );
        Self {
            directive: directive.to_string(),
            pattern: Regex::new(&pattern).expect("invalid regex"),
        }
    }
}

impl Rule for StripDirective {
    fn name(&self) -> &str {
        "strip-directive"
    }

    fn rewrite(&self, source: &str) -> Option<String> {
        let caps = self.pattern.captures(source)?;
        let whole = caps.get(0)?;
        let bom = caps.name("bom").map_or("", |m| m.as_str());
        Some(format!("{bom}{}", &source[whole.end()..]))
    }

    fn describe(&self) -> String {
        format!("Remove leading \"{}\" directive", self.directive)
    }
}

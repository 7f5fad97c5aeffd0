//!
//! Link Dictionary Compiler: parses entries of the form `PATTERN --FLAGS-> REPLACEMENT`
//! into an ordered sequence of compiled rules. Declaration order is preservation-critical —
//! the applier walks rules in this order and the first matching rule wins per pass.

mod parser;

pub use parser::{ParsedEntry, parse_entries};

use crate::error::ConvertError;
use fancy_regex::Regex;
use std::path::Path;

/// Per-rule flags, named per the Design Notes rather than left as a bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleSwitches {
    pub nocase: bool,
    pub eval: bool,
    pub html: bool,
    pub once: bool,
    pub sect_once: bool,
}

impl RuleSwitches {
    pub fn parse(flags: &str) -> Self {
        let mut s = RuleSwitches::default();
        for c in flags.chars() {
            match c {
                'i' => s.nocase = true,
                'e' => s.eval = true,
                'h' => s.html = true,
                'o' => s.once = true,
                's' => s.sect_once = true,
                _ => {}
            }
        }
        s
    }
}

/// How a rule rewrites a match. The source language builds this dynamically via
/// `eval`; here it is a closed enum dispatched by the applier (Design Notes,
/// "Dynamic-dispatch replacement closures").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Wrap the match in `<a href="REPLACEMENT">MATCH</a>`, after backreference
    /// substitution in REPLACEMENT.
    AnchorWrap { href_template: String },
    /// Insert REPLACEMENT verbatim (after backreference substitution) in place of
    /// the match.
    HtmlTemplate { template: String },
}

#[derive(Debug, Clone)]
pub struct LinkRule {
    pub pattern: String,
    pub switches: RuleSwitches,
    pub action: RuleAction,
    pub regex: Regex,
}

#[derive(Debug, Clone, Default)]
pub struct LinkDictionary {
    pub rules: Vec<LinkRule>,
}

impl LinkDictionary {
    pub fn compile(
        source: &str,
        path: &Path,
        allow_eval_rules: bool,
        dict_debug: u32,
    ) -> Result<LinkDictionary, ConvertError> {
        let entries = parse_entries(source, path)?;
        let mut rules = Vec::with_capacity(entries.len());
        let mut seen_keys = std::collections::HashSet::new();

        for entry in entries {
            let switches = RuleSwitches::parse(&entry.flags);
            if switches.eval && !allow_eval_rules {
                return Err(ConvertError::DictionaryParseError {
                    path: path.to_path_buf(),
                    line: entry.line,
                    raw: entry.raw.clone(),
                    message: "the 'e' (eval) flag requires allow_eval_rules and an embedded \
                              expression evaluator, which this build does not provide"
                        .to_string(),
                });
            }

            let dedup_key = entry.key.clone();
            if !seen_keys.insert(dedup_key) {
                log::debug!(
                    "{}:{}: dropping duplicate dictionary entry for key {:?}",
                    path.display(),
                    entry.line,
                    entry.key
                );
                continue;
            }

            let compiled_pattern = build_pattern(&entry, switches.nocase).map_err(|e| ConvertError::DictionaryParseError {
                path: path.to_path_buf(),
                line: entry.line,
                raw: entry.raw.clone(),
                message: format!("invalid pattern: {e}"),
            })?;

            let regex = Regex::new(&compiled_pattern).map_err(|e| ConvertError::DictionaryParseError {
                path: path.to_path_buf(),
                line: entry.line,
                raw: entry.raw.clone(),
                message: format!("regex compile error: {e}"),
            })?;

            let action = if switches.html {
                RuleAction::HtmlTemplate {
                    template: entry.replacement.clone(),
                }
            } else {
                RuleAction::AnchorWrap {
                    href_template: entry.replacement.clone(),
                }
            };

            if dict_debug > 0 {
                log::trace!(
                    "{}:{}: compiled rule {:?} ({:?}) -> {:?}",
                    path.display(),
                    entry.line,
                    entry.key,
                    switches,
                    action
                );
            }

            rules.push(LinkRule {
                pattern: entry.key,
                switches,
                action,
                regex,
            });
        }

        Ok(LinkDictionary { rules })
    }
}

/// Builds the final regex source from a parsed key, applying the three key forms
/// of the grammar: delimited regex, quoted literal, or bare glob.
fn build_pattern(entry: &ParsedEntry, nocase: bool) -> Result<String, String> {
    let key = entry.key.trim();
    let body = if let Some(rest) = key.strip_prefix('/') {
        rest.strip_suffix('/').unwrap_or(rest).to_string()
    } else if let Some(rest) = key.strip_prefix('|') {
        rest.strip_suffix('|').unwrap_or(rest).to_string()
    } else if let Some(rest) = key.strip_prefix('"') {
        let literal = rest.strip_suffix('"').unwrap_or(rest);
        format!(r"\b{}\b", fancy_regex::escape(literal))
    } else {
        glob_to_regex(key)
    };

    if body.is_empty() {
        return Err("empty pattern".to_string());
    }

    Ok(if nocase { format!("(?i){body}") } else { body })
}

/// Bare-text glob form: `?` -> `.`, `*` -> `.*`, everything else that isn't already
/// a word character gets escaped, and the whole thing is wrapped in word boundaries.
fn glob_to_regex(text: &str) -> String {
    let mut out = String::from(r"\b");
    for ch in text.chars() {
        match ch {
            '?' => out.push('.'),
            '*' => out.push_str(".*"),
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out.push_str(r"\b");
    out
}

//!
//! Link/Markup Applier: walks the compiled link dictionary over analyzer output,
//! one rule at a time in declaration order, skipping text already inside a tag or
//! an existing anchor so link rules never nest inside each other's output.

use crate::dict::{LinkDictionary, RuleAction};
use std::collections::HashSet;

/// Tracks which `once`/`sect_once` rules have already fired. `once` persists for
/// the whole document; `sect_once` is cleared at every paragraph boundary.
#[derive(Debug, Clone, Default)]
pub struct OnceMemo {
    fired_once: HashSet<usize>,
    fired_sect_once: HashSet<usize>,
}

impl OnceMemo {
    pub fn start_paragraph(&mut self) {
        self.fired_sect_once.clear();
    }

    fn is_available(&self, idx: usize, once: bool, sect_once: bool) -> bool {
        (!once || !self.fired_once.contains(&idx)) && (!sect_once || !self.fired_sect_once.contains(&idx))
    }

    fn record(&mut self, idx: usize, once: bool, sect_once: bool) {
        if once {
            self.fired_once.insert(idx);
        }
        if sect_once {
            self.fired_sect_once.insert(idx);
        }
    }
}

/// Applies every rule in `dict` to `line`, in declaration order. Each rule scans
/// the whole line and may match more than once, except `once`/`sect_once` rules
/// which stop firing for the rest of the document/paragraph after their first hit.
pub fn apply_rules(line: &str, dict: &LinkDictionary, memo: &mut OnceMemo, make_links: bool) -> String {
    if !make_links || dict.rules.is_empty() {
        return line.to_string();
    }

    let mut text = line.to_string();
    for (idx, rule) in dict.rules.iter().enumerate() {
        if !memo.is_available(idx, rule.switches.once, rule.switches.sect_once) {
            continue;
        }
        let (replaced, matched) = apply_single_rule(&text, rule, idx, memo);
        text = replaced;
        if matched && (rule.switches.once || rule.switches.sect_once) {
            memo.record(idx, rule.switches.once, rule.switches.sect_once);
        }
    }
    text
}

fn apply_single_rule(text: &str, rule: &crate::dict::LinkRule, idx: usize, memo: &OnceMemo) -> (String, bool) {
    let guarded = guarded_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut matched_once = false;
    let stop_after_first = rule.switches.once || rule.switches.sect_once;

    loop {
        if stop_after_first && matched_once {
            break;
        }
        let Ok(Some(m)) = rule.regex.find_from_pos(text, cursor) else {
            break;
        };
        if m.start() >= text.len() {
            break;
        }
        if in_guarded_span(&guarded, m.start(), m.end()) {
            cursor = m.end().max(m.start() + 1);
            if cursor > text.len() {
                break;
            }
            continue;
        }

        out.push_str(&text[cursor..m.start()]);
        out.push_str(&render_replacement(text, rule, &m));
        cursor = m.end();
        matched_once = true;
        let _ = idx;
        let _ = memo;
        if cursor >= text.len() {
            break;
        }
    }
    out.push_str(&text[cursor.min(text.len())..]);
    (out, matched_once)
}

fn render_replacement(text: &str, rule: &crate::dict::LinkRule, m: &fancy_regex::Match) -> String {
    let matched_text = &text[m.start()..m.end()];
    let template = match &rule.action {
        RuleAction::AnchorWrap { href_template } => href_template,
        RuleAction::HtmlTemplate { template } => template,
    };
    let expanded = expand_backreferences(template, text, rule, m);

    match &rule.action {
        RuleAction::AnchorWrap { .. } => format!(r#"<a href="{expanded}">{matched_text}</a>"#),
        RuleAction::HtmlTemplate { .. } => expanded,
    }
}

/// `\0` is the whole match, `\1`..`\9` are capture groups. Unknown backreferences
/// expand to the empty string rather than erroring, matching the forgiving
/// behavior of the classic dictionary format.
fn expand_backreferences(template: &str, text: &str, rule: &crate::dict::LinkRule, m: &fancy_regex::Match) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(d) = chars.peek().copied() {
                if d.is_ascii_digit() {
                    chars.next();
                    let group = d.to_digit(10).unwrap() as usize;
                    if group == 0 {
                        out.push_str(&text[m.start()..m.end()]);
                    } else if let Ok(Some(caps)) = rule.regex.captures(&text[m.start()..m.end()]) {
                        if let Some(g) = caps.get(group) {
                            out.push_str(g.as_str());
                        }
                    }
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Byte ranges of the line that must not be matched into: existing tags
/// (`<...>`) and the contents of existing anchors (`<a ...>...</a>`).
fn guarded_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut anchor_depth = 0usize;
    let mut anchor_start: Option<usize> = None;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            let tag_start = i;
            let Some(rel_end) = text[i..].find('>') else {
                spans.push((tag_start, text.len()));
                break;
            };
            let tag_end = i + rel_end + 1;
            spans.push((tag_start, tag_end));

            let inner = &text[tag_start + 1..tag_end - 1];
            let lower = inner.to_ascii_lowercase();
            if lower.starts_with("a ") || lower == "a" {
                if anchor_depth == 0 {
                    anchor_start = Some(tag_start);
                }
                anchor_depth += 1;
            } else if lower == "/a" {
                anchor_depth = anchor_depth.saturating_sub(1);
                if anchor_depth == 0 {
                    if let Some(start) = anchor_start.take() {
                        spans.push((start, tag_end));
                    }
                }
            }
            i = tag_end;
        } else {
            i += 1;
        }
    }
    spans
}

fn in_guarded_span(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && end > s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::LinkDictionary;
    use std::path::PathBuf;

    fn dict_from(src: &str) -> LinkDictionary {
        LinkDictionary::compile(src, &PathBuf::from("t.dict"), false, 0).unwrap()
    }

    #[test]
    fn wraps_matched_text_in_anchor() {
        let dict = dict_from("HTML::TextToHTML -> http://example/\n");
        let mut memo = OnceMemo::default();
        let out = apply_rules("see HTML::TextToHTML here", &dict, &mut memo, true);
        assert_eq!(out, r#"see <a href="http://example/">HTML::TextToHTML</a> here"#);
    }

    #[test]
    fn does_not_rematch_inside_existing_anchor() {
        let dict = dict_from("foo -> http://x/\n");
        let mut memo = OnceMemo::default();
        let out = apply_rules(r#"<a href="y">foo</a> foo"#, &dict, &mut memo, true);
        assert_eq!(out, r#"<a href="y">foo</a> <a href="http://x/">foo</a>"#);
    }

    #[test]
    fn once_flag_fires_only_first_document_match() {
        let dict = dict_from("foo -o-> http://x/\n");
        let mut memo = OnceMemo::default();
        let first = apply_rules("foo and foo", &dict, &mut memo, true);
        assert_eq!(first, r#"<a href="http://x/">foo</a> and foo"#);
        memo.start_paragraph();
        let second = apply_rules("another foo", &dict, &mut memo, true);
        assert_eq!(second, "another foo");
    }

    #[test]
    fn sect_once_resets_each_paragraph() {
        let dict = dict_from("foo -s-> http://x/\n");
        let mut memo = OnceMemo::default();
        let first = apply_rules("foo foo", &dict, &mut memo, true);
        assert_eq!(first, r#"<a href="http://x/">foo</a> foo"#);
        memo.start_paragraph();
        let second = apply_rules("foo again", &dict, &mut memo, true);
        assert_eq!(second, r#"<a href="http://x/">foo</a> again"#);
    }

    #[test]
    fn html_template_backreference_expansion() {
        let dict = dict_from(r"/(\w+)@(\w+)/ -h-> <b>\1 at \2</b>");
        let mut memo = OnceMemo::default();
        let out = apply_rules("mail me at bob@example", &dict, &mut memo, true);
        assert!(out.contains("<b>bob at example</b>"));
    }

    #[test]
    fn make_links_false_disables_application() {
        let dict = dict_from("foo -> http://x/\n");
        let mut memo = OnceMemo::default();
        let out = apply_rules("foo", &dict, &mut memo, false);
        assert_eq!(out, "foo");
    }
}

//!
//! Line Normalizer: tab expansion, trailing CR/whitespace removal, indent counting,
//! and the blank-line predicate used throughout the analyzer.

/// A normalized input line: tabs expanded, trailing CR and trailing whitespace
/// trimmed, with derived indent and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub indent: usize,
    pub length: usize,
    pub blank: bool,
}

impl Line {
    pub fn normalize(raw: &str, tab_width: usize, prev_indent: usize) -> Self {
        let expanded = expand_tabs(raw, tab_width);
        let trimmed_end = expanded.trim_end_matches(['\r', '\n']);
        let text = rstrip_inline_whitespace(trimmed_end);
        let blank = text.trim().is_empty();
        let indent = if blank {
            prev_indent
        } else {
            text.chars().take_while(|c| *c == ' ').count()
        };
        let length = text.chars().count();
        Line {
            text,
            indent,
            length,
            blank,
        }
    }
}

/// Expands horizontal tabs to the next multiple of `tab_width`.
pub fn expand_tabs(s: &str, tab_width: usize) -> String {
    if tab_width == 0 {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut col = 0usize;
    for ch in s.chars() {
        if ch == '\t' {
            let spaces = tab_width - (col % tab_width);
            for _ in 0..spaces {
                out.push(' ');
            }
            col += spaces;
        } else if ch == '\n' {
            out.push(ch);
            col = 0;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// Trims trailing whitespace from a single line (not newline-aware; callers
/// split on lines first).
fn rstrip_inline_whitespace(s: &str) -> String {
    s.trim_end_matches([' ', '\t']).to_string()
}

/// A paragraph is a maximal run of non-blank lines, delimited by blank lines.
/// Splits raw multi-line text into paragraphs, each a vector of normalized `Line`s,
/// carrying indent propagation across any blank lines an input source embeds
/// mid-paragraph (not expected, but kept defensive per the blank-line indent rule).
pub fn split_paragraphs(input: &str, tab_width: usize) -> Vec<Vec<Line>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();
    let mut prev_indent = 0usize;

    for raw in input.lines() {
        let line = Line::normalize(raw, tab_width, prev_indent);
        prev_indent = line.indent;
        if line.blank {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tabs_to_next_stop() {
        assert_eq!(expand_tabs("a\tb", 8), "a       b");
        assert_eq!(expand_tabs("ab\tc", 4), "ab  c");
    }

    #[test]
    fn blank_line_inherits_previous_indent() {
        let a = Line::normalize("    indented", 8, 0);
        let b = Line::normalize("   ", 8, a.indent);
        assert!(b.blank);
        assert_eq!(b.indent, 4);
    }

    #[test]
    fn splits_paragraphs_on_blank_runs() {
        let paras = split_paragraphs("one\ntwo\n\n\nthree\n", 8);
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].len(), 2);
        assert_eq!(paras[1].len(), 1);
    }

    #[test]
    fn trims_trailing_cr_and_whitespace() {
        let l = Line::normalize("hello   \r", 8, 0);
        assert_eq!(l.text, "hello");
    }
}

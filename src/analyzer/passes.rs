//!
//! The thirteen analysis passes, run in order by `Analyzer::analyze_paragraph`.
//! Each pass mutates the paragraph's lines and actions in place, guarding itself
//! with the current `Mode` and prior `LineAction`s to avoid double-handling —
//! table detection dominates list detection, which dominates paragraph detection.

use super::{AnalyzedLine, HeadingCounters, HeadingStyleKey, HeadingStyleTable, ListFrame, ListKind, ListStack, Mode};
use crate::config::Config;
use crate::html::{close_tag, escape_html, open_tag, tag_name};
use fancy_regex::Regex;

const UNDERLINE_CHARS: &[char] = &['=', '-', '*', '.', '~', '+'];
const MOSAIC_UNDERLINE_CHARS: &[char] = &['=', '-'];

// ---------------------------------------------------------------------------
// Pass 1 — table detection
// ---------------------------------------------------------------------------

pub fn pass1_tables(para: &mut Vec<AnalyzedLine>, mode: &mut Mode, out_prefix: &mut Vec<String>, out_suffix: &mut Vec<String>, cfg: &Config) {
    if para.len() < 2 {
        return;
    }
    let rows: Vec<Vec<char>> = para.iter().map(|l| l.text.chars().collect()).collect();
    let min_len = rows.iter().map(|r| r.len()).min().unwrap_or(0);
    if min_len == 0 {
        return;
    }

    let mut col_is_space = vec![true; min_len];
    for row in &rows {
        for (i, slot) in col_is_space.iter_mut().enumerate() {
            if row[i] != ' ' {
                *slot = false;
            }
        }
    }

    let fields = find_fields(&col_is_space);
    if cfg.debug > 0 {
        log::trace!("table heuristic: {} rows, {} candidate columns", rows.len(), fields.len());
    }
    if fields.len() < 2 {
        return;
    }

    let alignments: Vec<Alignment> = fields
        .iter()
        .enumerate()
        .map(|(i, &(start, end))| {
            let is_last = i == fields.len() - 1;
            column_alignment(&rows, start, if is_last { None } else { Some(end) })
        })
        .collect();

    let td = tag_name("TD", cfg);
    let tr = tag_name("TR", cfg);
    let mut rendered_rows = Vec::with_capacity(para.len());
    for row in &rows {
        let mut cells = String::new();
        for (i, &(start, end)) in fields.iter().enumerate() {
            let is_last = i == fields.len() - 1;
            let raw: String = if is_last {
                row.iter().skip(start).collect()
            } else {
                row.iter().skip(start).take(end - start).collect()
            };
            let cell = escape_html(raw.trim());
            cells.push_str(&format!("<{td} align=\"{}\">{cell}</{td}>", alignments[i].as_str()));
        }
        rendered_rows.push(format!("<{tr}>{cells}</{tr}>"));
    }

    out_prefix.push(open_tag("TABLE", cfg));
    for (i, line) in para.iter_mut().enumerate() {
        line.text = rendered_rows[i].clone();
    }
    out_suffix.push(close_tag("TABLE", cfg));
    mode.table = true;
}

#[derive(Clone, Copy)]
enum Alignment {
    Left,
    Right,
    Center,
}

impl Alignment {
    fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Center => "center",
        }
    }
}

/// Maximal runs of non-gap columns, where a gap column is a position that is a
/// space in every row (up to the shortest row).
fn find_fields(col_is_space: &[bool]) -> Vec<(usize, usize)> {
    let mut fields = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &gap) in col_is_space.iter().enumerate() {
        match (gap, start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                fields.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        fields.push((s, col_is_space.len()));
    }
    fields
}

fn column_alignment(rows: &[Vec<char>], start: usize, end: Option<usize>) -> Alignment {
    let mut left = 0;
    let mut right = 0;
    let mut center = 0;
    for row in rows {
        let slice: Vec<char> = match end {
            Some(e) if e <= row.len() => row[start..e].to_vec(),
            _ => row.iter().skip(start).cloned().collect(),
        };
        let text: String = slice.iter().collect();
        if text.trim().is_empty() {
            continue;
        }
        let lead = text.starts_with(' ');
        let trail = text.ends_with(' ');
        match (lead, trail) {
            (true, true) => center += 1,
            (false, true) => left += 1,
            (true, false) => right += 1,
            (false, false) => left += 1,
        }
    }
    if center >= left && center >= right && center > 0 {
        Alignment::Center
    } else if right > left {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

// ---------------------------------------------------------------------------
// Pass 2 — HTML character escaping
// ---------------------------------------------------------------------------

pub fn pass2_escape(para: &mut [AnalyzedLine]) {
    for line in para.iter_mut() {
        line.text = escape_html(&line.text);
    }
}

// ---------------------------------------------------------------------------
// Pass 3 — mail handling
// ---------------------------------------------------------------------------

pub fn pass3_mail(para: &mut [AnalyzedLine], out_prefix: &mut Vec<String>, cfg: &Config) {
    let p = tag_name("P", cfg);
    let br = tag_name("BR", cfg);
    let a = tag_name("A", cfg);
    let name_attr = if cfg.lower_case_tags || cfg.xhtml { "name" } else { "NAME" };
    let mut quote_run_open = false;
    let mut header_active = false;

    for (i, line) in para.iter_mut().enumerate() {
        let trimmed = line.text.trim_start();
        let is_quote = trimmed.starts_with('>') || trimmed.starts_with('|') || trimmed.starts_with(':');

        if is_quote {
            if !quote_run_open {
                line.text = format!("<{p}>{}<{br}>", line.text);
                quote_run_open = true;
            } else {
                line.text = format!("{}<{br}>", line.text);
            }
            line.action.mailquote = true;
            header_active = false;
            continue;
        }
        quote_run_open = false;

        let starts_message = line.text.starts_with("From:") || line.text.starts_with("Newsgroups:");
        if starts_message {
            if i == 0 {
                out_prefix.push("<!-- New Message -->".to_string());
            } else {
                line.text = format!("<!-- New Message -->\n{}", line.text);
            }
            line.text = format!("<{p}><{a} {name_attr}=\"msg\">{}</{a}><{br}>", line.text);
            line.action.mailheader = true;
            header_active = true;
            continue;
        }

        if header_active {
            let is_continuation = line.indent > 0 || looks_like_mail_header(&line.text);
            if is_continuation {
                line.text = format!("{}<{br}>", line.text);
                line.action.mailheader = true;
                continue;
            }
            header_active = false;
        }
    }
}

fn looks_like_mail_header(text: &str) -> bool {
    match text.find(':') {
        Some(pos) => pos > 0 && text[..pos].chars().all(|c| c.is_alphanumeric() || c == '-'),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Pass 4 — end of preformat
// ---------------------------------------------------------------------------

pub fn pass4_end_preformat(
    para: &mut [AnalyzedLine],
    mode: &mut Mode,
    cfg: &Config,
    start_marker: &Regex,
    end_marker: &Regex,
) {
    let mut start_at = 0;
    if !mode.pre {
        if !cfg.use_preformat_marker {
            return;
        }
        // Pass 2 (escaping) has already run by this point, so a literal "<pre>"
        // in the input now reads "&lt;pre&gt;"; unescape angle brackets just for
        // the marker match, since the marker regexes (like the spec's defaults)
        // are written against the literal tag form.
        match para.iter().position(|l| start_marker.is_match(&unescape_angle_brackets(l.text.trim())).unwrap_or(false)) {
            Some(i) => {
                mode.pre = true;
                mode.pre_explicit = true;
                para[i].action.pre = true;
                para[i].action.end = true;
                start_at = i + 1;
            }
            None => return,
        }
    }

    if mode.pre_explicit {
        for line in para.iter_mut().skip(start_at) {
            if end_marker.is_match(&unescape_angle_brackets(line.text.trim())).unwrap_or(false) {
                line.action.end = true;
                line.action.pre = true;
                mode.pre = false;
                mode.pre_explicit = false;
                return;
            }
            line.action.pre = true;
        }
        return;
    }

    for i in 0..para.len() {
        if !mode.pre {
            break;
        }
        let looking = is_preformat_looking(&para[i].text, cfg);
        if looking {
            para[i].action.pre = true;
            continue;
        }
        let next_also_not_looking = match para.get(i + 1) {
            Some(next) => !is_preformat_looking(&next.text, cfg),
            None => true,
        };
        if cfg.endpreformat_trigger_lines == 1 || next_also_not_looking || i + 1 == para.len() {
            mode.pre = false;
            para[i].action.end = true;
        } else {
            para[i].action.pre = true;
        }
    }
}

fn unescape_angle_brackets(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">")
}

pub fn is_preformat_looking(text: &str, cfg: &Config) -> bool {
    let min = cfg.preformat_whitespace_min.max(1);
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == ' ' || ch == '.' {
            run += 1;
        } else {
            if run >= min {
                return true;
            }
            run = 0;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Pass 5 — horizontal rules
// ---------------------------------------------------------------------------

pub fn pass5_hrule(para: &mut [AnalyzedLine], cfg: &Config) {
    let hr = format!("<{}/>", tag_name("HR", cfg));
    for line in para.iter_mut() {
        if line.text.contains('\u{0c}') {
            line.text = hr.clone();
            line.action.hrule = true;
            continue;
        }
        let stripped: String = line.text.chars().filter(|c| *c != ' ').collect();
        if stripped.len() >= cfg.hrule_min && stripped.chars().all(|c| "-_~=*".contains(c)) {
            line.text = hr.clone();
            line.action.hrule = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 6 — custom headings
// ---------------------------------------------------------------------------

pub fn pass6_custom_headings(
    para: &mut [AnalyzedLine],
    patterns: &[Regex],
    styles: &mut HeadingStyleTable,
    counters: &mut HeadingCounters,
    cfg: &Config,
) {
    if patterns.is_empty() {
        return;
    }
    for line in para.iter_mut() {
        if line.action.header || line.action.pre || line.action.mailquote {
            continue;
        }
        for (idx, pattern) in patterns.iter().enumerate() {
            if pattern.is_match(&line.text).unwrap_or(false) {
                let level = if cfg.explicit_headings {
                    HeadingStyleTable::explicit_level(idx)
                } else {
                    styles.level_for(HeadingStyleKey::Custom(idx))
                };
                let anchor = if cfg.make_anchors {
                    format!(" id=\"{}\"", counters.anchor_for_level(level))
                } else {
                    String::new()
                };
                let h = tag_name("H", cfg);
                line.text = format!("<{h}{level}{anchor}>{}</{h}{level}>", line.text);
                line.action.header = true;
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 7 — lists
// ---------------------------------------------------------------------------

struct ListMarker {
    prefix: String,
    kind: ListKind,
    content_start: usize,
    /// For ordered markers: true iff the marker is "1", "a", or "A" — the only
    /// forms allowed to *open* a new ordered list. Continuing items ("2.", "3.",
    /// ...) still match this struct (so an already-open list recognizes them as
    /// items) but cannot open one on their own. Always true for unordered markers.
    ordered_is_first: bool,
}

fn detect_list_marker(text: &str, indent: usize) -> Option<ListMarker> {
    let rest = &text[indent..];
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;

    if "-*=".contains(first) || (first == 'o' && looks_like_bullet_o(rest)) || first == '\u{b7}' {
        let (pos, ch) = chars.next()?;
        if ch == ' ' {
            let content_start = indent + pos + 1;
            let prefix = text[..content_start].to_string();
            return Some(ListMarker {
                prefix,
                kind: ListKind::Unordered,
                content_start,
                ordered_is_first: true,
            });
        }
        return None;
    }

    let mut digits_end = 0usize;
    let mut is_digit_form = false;
    for (i, ch) in rest.char_indices() {
        if ch.is_ascii_digit() {
            digits_end = i + ch.len_utf8();
            is_digit_form = true;
        } else {
            break;
        }
    }
    let ordered_is_first;
    if is_digit_form {
        ordered_is_first = &rest[..digits_end] == "1";
    } else {
        let first_char = rest.chars().next()?;
        if !(first_char.is_ascii_alphabetic() && (first_char == 'a' || first_char == 'A')) {
            return None;
        }
        digits_end = first_char.len_utf8();
        ordered_is_first = true;
    }

    let after = rest[digits_end..].chars().next();
    match after {
        Some('.') | Some(')') => {
            let sep_len = 1;
            let space_pos = digits_end + sep_len;
            if rest.as_bytes().get(space_pos) == Some(&b' ') {
                let content_start = indent + space_pos + 1;
                let prefix = text[..content_start].to_string();
                Some(ListMarker {
                    prefix,
                    kind: ListKind::Ordered,
                    content_start,
                    ordered_is_first,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

fn looks_like_bullet_o(rest: &str) -> bool {
    rest.len() > 1 && rest.as_bytes()[1] == b' '
}

pub fn pass7_lists(
    para: &mut [AnalyzedLine],
    mode: &mut Mode,
    stack: &mut ListStack,
    prev_last_action: &super::LineAction,
    cfg: &Config,
    out_prefix: &mut Vec<String>,
) {
    // A list carried over from a prior paragraph only continues if this
    // paragraph's very first line is itself a recognizable list item; otherwise
    // the list closes here, at the first paragraph boundary that doesn't
    // continue it (spec §4.3: "close_all occurs at paragraph end when the next
    // paragraph is not a list continuation").
    if !stack.is_empty() {
        let continues = para
            .first()
            .map(|l| detect_list_marker(&l.text, l.indent).is_some())
            .unwrap_or(false);
        if !continues {
            super::list::close_list(stack, out_prefix, cfg);
        }
    }

    let li = tag_name("LI", cfg);
    let mut prev_blank_or_boundary = stack.is_empty();
    let mut first_line = true;

    for i in 0..para.len() {
        let indent = para[i].indent;
        let text = para[i].text.clone();
        let Some(marker) = detect_list_marker(&text, indent) else {
            prev_blank_or_boundary = false;
            first_line = false;
            continue;
        };

        if stack.is_empty() {
            if !marker.ordered_is_first {
                // A bare "2.", "3.", ... with no open ordered list to continue is
                // not a list start (spec: ordered lists must start with 1/a/A).
                prev_blank_or_boundary = false;
                first_line = false;
                continue;
            }
            let prev_action = if first_line {
                *prev_last_action
            } else {
                para[i - 1].action
            };
            let should_open = indent > 0
                || first_line
                || prev_action.brk
                || prev_action.header
                || prev_action.caps
                || prev_blank_or_boundary;
            if !should_open {
                first_line = false;
                continue;
            }
            if cfg.debug > 0 {
                log::trace!("list heuristic: opening {:?} list at indent {indent}", marker.kind);
            }
            stack.push(ListFrame {
                prefix: marker.prefix.clone(),
                kind: marker.kind,
                indent,
            });
            mode.list = true;
            para[i].text = format!("{}<{li}>{}", open_tag(tag_for(marker.kind), cfg), &text[marker.content_start..]);
            para[i].action.list = true;
            para[i].action.list_start = true;
            para[i].action.list_item = true;
        } else if let Some(depth) = stack.find_ancestor(indent) {
            // Closing to an ancestor frame must emit a closing tag for every
            // inner frame popped — `ListStack::pop_to` alone only adjusts the
            // bookkeeping, it does not know how to write HTML.
            let mut closing = String::new();
            while stack.depth() > depth {
                if let Some(frame) = stack.pop() {
                    closing.push_str(&close_tag(tag_for(frame.kind), cfg));
                }
            }
            para[i].text = format!("{closing}<{li}>{}", &text[marker.content_start..]);
            para[i].action.list_item = true;
            para[i].action.list = true;
        } else if marker.ordered_is_first || marker.kind == ListKind::Unordered {
            // A new nested frame needs at least `indent_width` more leading
            // whitespace than its parent frame opened at, not just "more than
            // the parent's marker text is wide" — otherwise a narrow parent
            // marker (e.g. "- ") would let a barely-indented sibling read as
            // a nested child.
            let nest_threshold = stack.top().map(|f| f.indent + cfg.indent_width).unwrap_or(0);
            if indent >= nest_threshold {
                stack.push(ListFrame {
                    prefix: marker.prefix.clone(),
                    kind: marker.kind,
                    indent,
                });
                para[i].text = format!("{}<{li}>{}", open_tag(tag_for(marker.kind), cfg), &text[marker.content_start..]);
                para[i].action.list_start = true;
                para[i].action.list_item = true;
                para[i].action.list = true;
            } else {
                para[i].text = format!("<{li}>{}", &text[marker.content_start..]);
                para[i].action.list_item = true;
                para[i].action.list = true;
            }
        } else {
            para[i].text = format!("<{li}>{}", &text[marker.content_start..]);
            para[i].action.list_item = true;
            para[i].action.list = true;
        }

        prev_blank_or_boundary = false;
        first_line = false;
    }

    mode.list = !stack.is_empty();
}

fn tag_for(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Ordered => "OL",
        ListKind::Unordered => "UL",
    }
}

// ---------------------------------------------------------------------------
// Pass 8 — preformatting (unmarked)
// ---------------------------------------------------------------------------

pub fn pass8_preformat_unmarked(para: &mut [AnalyzedLine], mode: &mut Mode, cfg: &Config, out_prefix: &mut Vec<String>) {
    if mode.pre {
        return;
    }
    let open_p = open_tag("P", cfg);
    if cfg.preformat_trigger_lines == 0 {
        mode.pre = true;
        for line in para.iter_mut() {
            line.action.pre = true;
        }
        if out_prefix.last().map(|l| *l == open_p).unwrap_or(false) {
            out_prefix.pop();
        }
        return;
    }

    for i in 0..para.len() {
        if para[i].action.mailquote {
            continue;
        }
        if is_preformat_looking(&para[i].text, cfg) {
            let next_ok = cfg.preformat_trigger_lines == 1
                || para
                    .get(i + 1)
                    .map(|n| is_preformat_looking(&n.text, cfg))
                    .unwrap_or(false);
            if next_ok {
                mode.pre = true;
                for line in para.iter_mut().skip(i) {
                    if line.action.mailquote {
                        break;
                    }
                    line.action.pre = true;
                }
                if out_prefix.last().map(|l| *l == open_p).unwrap_or(false) {
                    out_prefix.pop();
                }
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 9 — underlined headings
// ---------------------------------------------------------------------------

pub fn pass9_underline_headings(
    para: &mut [AnalyzedLine],
    cfg: &Config,
    styles: &mut HeadingStyleTable,
    counters: &mut HeadingCounters,
) {
    let allowed: &[char] = if cfg.use_mosaic_header {
        MOSAIC_UNDERLINE_CHARS
    } else {
        UNDERLINE_CHARS
    };

    let mut i = 0;
    while i + 1 < para.len() {
        if para[i].action.header || para[i].action.pre || para[i].action.mailquote || para[i].action.list {
            i += 1;
            continue;
        }
        let heading_text = para[i].text.clone();
        let next_text = para[i + 1].text.clone();
        let trimmed_next = next_text.trim();
        if !trimmed_next.is_empty() {
            let underline_char = trimmed_next.chars().next().unwrap();
            let is_uniform = allowed.contains(&underline_char) && trimmed_next.chars().all(|c| c == underline_char);
            if is_uniform {
                let len_diff = (trimmed_next.len() as i64 - heading_text.trim().len() as i64).unsigned_abs() as usize;
                let offset_diff = (para[i + 1].indent as i64 - para[i].indent as i64).unsigned_abs() as usize;
                if len_diff <= cfg.underline_length_tolerance && offset_diff <= cfg.underline_offset_tolerance {
                    let is_caps = is_all_caps_text(heading_text.trim(), cfg.min_caps_length);
                    let key = if is_caps {
                        HeadingStyleKey::UnderlineCaps(underline_char)
                    } else {
                        HeadingStyleKey::Underline(underline_char)
                    };
                    let level = styles.level_for(key);
                    let anchor = if cfg.make_anchors {
                        format!(" id=\"{}\"", counters.anchor_for_level(level))
                    } else {
                        String::new()
                    };
                    let h = tag_name("H", cfg);
                    para[i].text = format!("<{h}{level}{anchor}>{}</{h}{level}>", heading_text);
                    para[i].action.header = true;
                    para[i + 1].text = " ".to_string();
                    i += 2;
                    continue;
                }
            }
        }
        i += 1;
    }
}

fn is_all_caps_text(text: &str, min_len: usize) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= min_len && letters.iter().all(|c| !c.is_lowercase())
}

// ---------------------------------------------------------------------------
// Pass 10 — paragraph starts
// ---------------------------------------------------------------------------

pub fn pass10_paragraph_starts(para: &mut [AnalyzedLine], mode: &mut Mode, cfg: &Config, prev_last_action: &super::LineAction) {
    if mode.pre {
        return;
    }
    // Unlike LIST/PRE/TABLE, a paragraph's <P> never carries past the blank
    // line that ends it, so this tracks the currently open one purely within
    // this single call.
    let mut par_open = false;
    for i in 0..para.len() {
        let a = para[i].action;
        if a.end || a.mailquote || a.caps || a.brk || a.header || a.list_item || a.hrule || a.pre {
            if par_open {
                para[i].text = format!("{}{}", close_tag("P", cfg), para[i].text);
                par_open = false;
            }
            continue;
        }
        let prev_indent = if i == 0 { None } else { Some(para[i - 1].indent) };
        let prev_action = if i == 0 { *prev_last_action } else { para[i - 1].action };
        let is_first = i == 0;
        let prev_blank_equivalent = is_first || prev_action.end;
        let indented_more = prev_indent
            .map(|p| para[i].indent > p + cfg.par_indent)
            .unwrap_or(false);

        if !(prev_blank_equivalent || indented_more) {
            continue;
        }

        if cfg.indent_par_break {
            let close = if par_open { close_tag("P", cfg) } else { String::new() };
            par_open = false;
            let pad = "&nbsp;".repeat(para[i].indent);
            let stripped = strip_leading_spaces(&para[i].text, para[i].indent);
            para[i].text = format!("{close}{}\n{pad}{stripped}", open_tag("BR", cfg));
            para[i].action.ind_break = true;
        } else if cfg.preserve_indent {
            let pad = "&nbsp;".repeat(para[i].indent);
            let stripped = strip_leading_spaces(&para[i].text, para[i].indent);
            let close = if par_open { close_tag("P", cfg) } else { String::new() };
            para[i].text = format!("{close}{}{pad}{stripped}", open_tag("P", cfg));
            par_open = true;
        } else {
            let close = if par_open { close_tag("P", cfg) } else { String::new() };
            para[i].text = format!("{close}{}{}", open_tag("P", cfg), para[i].text);
            par_open = true;
        }
        para[i].action.par = true;
    }
    if par_open {
        if let Some(last) = para.last_mut() {
            last.text.push_str(&close_tag("P", cfg));
        }
    }
}

fn strip_leading_spaces(text: &str, n: usize) -> String {
    let mut count = 0;
    let mut chars = text.chars();
    let mut rest = text;
    for (idx, ch) in text.char_indices() {
        if count >= n || ch != ' ' {
            rest = &text[idx..];
            break;
        }
        count += 1;
        rest = &text[idx + 1..];
    }
    let _ = &mut chars;
    rest.to_string()
}

// ---------------------------------------------------------------------------
// Pass 11 — short-line breaks
// ---------------------------------------------------------------------------

pub fn pass11_short_line_breaks(para: &mut [AnalyzedLine], mode: &Mode, cfg: &Config) {
    if mode.pre || mode.list {
        return;
    }
    for i in 0..para.len().saturating_sub(1) {
        let cur = para[i].action;
        let next = para[i + 1].action;
        if cur.brk || cur.end || cur.header || cur.hrule || cur.list_item || cur.mailquote || cur.pre {
            continue;
        }
        if next.header || next.list_item || next.mailquote || next.pre {
            continue;
        }
        if para[i].text.trim().len() < cfg.short_line_length {
            para[i].text.push_str(&open_tag("BR", cfg));
            para[i].action.brk = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 12 — all-caps lines
// ---------------------------------------------------------------------------

pub fn pass12_all_caps(para: &mut [AnalyzedLine], cfg: &Config) {
    for line in para.iter_mut() {
        if line.action.header || line.action.pre || line.action.hrule || line.action.list_item || line.action.mailquote {
            continue;
        }
        if is_all_caps_text(line.text.trim(), cfg.min_caps_length) {
            let tag = tag_name(&cfg.caps_tag, cfg);
            line.text = format!("<{tag}>{}</{tag}>", line.text);
            line.action.caps = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 13 — hyphenation
// ---------------------------------------------------------------------------

pub fn pass13_hyphenation(para: &mut [AnalyzedLine], mode: &Mode) {
    if mode.pre {
        return;
    }
    for i in 0..para.len().saturating_sub(1) {
        let a = para[i].action;
        if a.header || a.mailheader || a.pre || a.brk {
            continue;
        }
        let Some(word_start) = trailing_word_start(&para[i].text) else {
            continue;
        };
        let word = &para[i].text[word_start..];
        if word.len() < 2 || !word.ends_with('-') {
            continue;
        }
        let stem = &word[..word.len() - 1];
        if stem.is_empty() || !stem.chars().all(|c| c.is_alphanumeric()) {
            continue;
        }
        let next_indent = para[i + 1].indent;
        let next_text = para[i + 1].text.trim_start();
        let Some(next_word_end) = next_text.find(|c: char| !c.is_alphanumeric()) else {
            continue;
        };
        if next_word_end == 0 {
            continue;
        }
        let next_word = &next_text[..next_word_end];
        let remainder = &next_text[next_word_end..];

        para[i].text = format!("{}{}", &para[i].text[..word_start], stem.to_string() + next_word);
        para[i + 1].text = " ".repeat(next_indent) + remainder;
    }
}

fn trailing_word_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut idx = bytes.len();
    while idx > 0 && (bytes[idx - 1] as char).is_alphanumeric() {
        idx -= 1;
    }
    if idx > 0 && bytes[idx - 1] == b'-' {
        Some(idx - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Line;

    fn lines(raws: &[&str]) -> Vec<AnalyzedLine> {
        raws.iter().map(|r| Line::normalize(r, 8, 0)).map(|l| AnalyzedLine::from_line(&l)).collect()
    }

    #[test]
    fn detects_simple_table() {
        let mut para = lines(&[
            "-e  File exists.",
            "-z  File has zero size.",
            "-s  File has nonzero size (returns size).",
        ]);
        let mut mode = Mode::default();
        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        pass1_tables(&mut para, &mut mode, &mut prefix, &mut suffix, &Config::default());
        assert!(mode.table);
        assert_eq!(prefix, vec!["<TABLE>".to_string()]);
        assert_eq!(suffix, vec!["</TABLE>".to_string()]);
        assert!(para[0].text.starts_with("<TR><TD"));
    }

    #[test]
    fn escapes_ampersand_and_angle_brackets() {
        let mut para = lines(&["R&D <tag>"]);
        pass2_escape(&mut para);
        assert_eq!(para[0].text, "R&amp;D &lt;tag&gt;");
    }

    #[test]
    fn detects_unordered_bullet_opening_new_list() {
        let mut para = lines(&["- one", "- two"]);
        let mut mode = Mode::default();
        let mut stack = ListStack::default();
        let prev = super::super::LineAction::default();
        let mut prefix = Vec::new();
        pass7_lists(&mut para, &mut mode, &mut stack, &prev, &Config::default(), &mut prefix);
        assert!(mode.list);
        assert!(para[0].text.starts_with("<UL><LI>"));
        assert!(para[1].text.starts_with("<LI>"));
    }

    #[test]
    fn ordered_list_must_start_at_one() {
        // "5." is still a recognizable ordered marker (so it can continue an
        // already-open list), but it isn't eligible to *open* one.
        let marker = detect_list_marker("5. five", 0).unwrap();
        assert!(!marker.ordered_is_first);
        let marker = detect_list_marker("1. one", 0).unwrap();
        assert!(marker.ordered_is_first);
    }

    #[test]
    fn numbered_list_continues_past_the_first_item() {
        let mut para = lines(&["1. Spam", "2. Jam", "3. Ham", "4. Pickles"]);
        let mut mode = Mode::default();
        let mut stack = ListStack::default();
        let prev = super::super::LineAction::default();
        let mut prefix = Vec::new();
        pass7_lists(&mut para, &mut mode, &mut stack, &prev, &Config::default(), &mut prefix);
        assert!(para[0].text.starts_with("<OL><LI>Spam"));
        assert_eq!(para[1].text, "<LI>Jam");
        assert_eq!(para[2].text, "<LI>Ham");
        assert_eq!(para[3].text, "<LI>Pickles");
    }

    #[test]
    fn bare_non_first_ordered_marker_does_not_open_a_list() {
        let mut para = lines(&["5. five"]);
        let mut mode = Mode::default();
        let mut stack = ListStack::default();
        let prev = super::super::LineAction::default();
        let mut prefix = Vec::new();
        pass7_lists(&mut para, &mut mode, &mut stack, &prev, &Config::default(), &mut prefix);
        assert!(!mode.list);
        assert_eq!(para[0].text, "5. five");
    }

    #[test]
    fn hrule_detects_dash_run() {
        let mut para = lines(&["----"]);
        pass5_hrule(&mut para, &Config::default());
        assert!(para[0].action.hrule);
        assert_eq!(para[0].text, "<HR/>");
    }

    #[test]
    fn all_caps_wraps_in_configured_tag() {
        let mut para = lines(&["WARNING"]);
        pass12_all_caps(&mut para, &Config::default());
        assert_eq!(para[0].text, "<STRONG>WARNING</STRONG>");
        assert!(para[0].action.caps);
    }

    #[test]
    fn underline_heading_detected() {
        let mut para = lines(&["Introduction", "============"]);
        let mut styles = HeadingStyleTable::default();
        let mut counters = HeadingCounters::default();
        pass9_underline_headings(&mut para, &Config::default(), &mut styles, &mut counters);
        assert!(para[0].action.header);
        assert!(para[0].text.starts_with("<H1"));
        assert_eq!(para[1].text, " ");
    }

    #[test]
    fn hyphenation_joins_split_word() {
        let mut para = lines(&["this is a trun-", "  cated word"]);
        pass13_hyphenation(&mut para, &Mode::default());
        assert!(para[0].text.ends_with("truncated"));
    }

    #[test]
    fn preformat_looking_detects_whitespace_run() {
        let cfg = Config::default();
        assert!(is_preformat_looking("a     b", &cfg));
        assert!(!is_preformat_looking("a b", &cfg));
    }

    #[test]
    fn explicit_preformat_marker_opens_and_closes_pre() {
        let mut cfg = Config::default();
        cfg.use_preformat_marker = true;
        let start = Regex::new(&cfg.preformat_start_marker).unwrap();
        let end = Regex::new(&cfg.preformat_end_marker).unwrap();
        let mut para = lines(&["&lt;pre&gt;", "  code line", "&lt;/pre&gt;"]);
        let mut mode = Mode::default();
        pass4_end_preformat(&mut para, &mut mode, &cfg, &start, &end);
        assert!(!mode.pre);
        assert!(!mode.pre_explicit);
        assert!(para[0].action.pre);
        assert!(!para[1].action.end);
        assert!(para[2].action.end);
    }

    #[test]
    fn without_use_preformat_marker_a_pre_line_is_left_alone() {
        let cfg = Config::default();
        let start = Regex::new(&cfg.preformat_start_marker).unwrap();
        let end = Regex::new(&cfg.preformat_end_marker).unwrap();
        let mut para = lines(&["&lt;pre&gt;"]);
        let mut mode = Mode::default();
        pass4_end_preformat(&mut para, &mut mode, &cfg, &start, &end);
        assert!(!mode.pre);
    }

    #[test]
    fn nested_list_requires_indent_width_more_than_parent() {
        let mut cfg = Config::default();
        cfg.indent_width = 4;
        let mut para = lines(&["- a", "  - b"]);
        let mut mode = Mode::default();
        let mut stack = ListStack::default();
        let prev = super::super::LineAction::default();
        let mut prefix = Vec::new();
        pass7_lists(&mut para, &mut mode, &mut stack, &prev, &cfg, &mut prefix);
        // only 2 of indent (less than indent_width=4 more than parent's 0) -> not nested
        assert_eq!(stack.depth(), 1);
        assert_eq!(para[1].text, "<LI>b");
    }

    #[test]
    fn nested_list_closes_inner_frame_tags_when_continuing_ancestor() {
        let mut para = lines(&["- a", "  - b", "- c"]);
        let mut mode = Mode::default();
        let mut stack = ListStack::default();
        let prev = super::super::LineAction::default();
        let mut prefix = Vec::new();
        pass7_lists(&mut para, &mut mode, &mut stack, &prev, &Config::default(), &mut prefix);
        assert_eq!(stack.depth(), 1);
        assert!(para[2].text.starts_with("</UL><LI>c"));
        assert_eq!(
            para.iter().map(|l| l.text.matches("<UL>").count()).sum::<usize>(),
            para.iter().map(|l| l.text.matches("</UL>").count()).sum::<usize>()
                + 1 // the outermost frame is still open, closed later by Analyzer::finish
        );
    }

    #[test]
    fn pass10_closes_paragraph_at_end_of_single_line_paragraph() {
        let mut para = lines(&["Here is my list:"]);
        let mut mode = Mode::default();
        let prev = super::super::LineAction::default();
        pass10_paragraph_starts(&mut para, &mut mode, &Config::default(), &prev);
        assert_eq!(para[0].text, "<P>Here is my list:</P>");
    }

    #[test]
    fn pass10_closes_paragraph_before_a_later_list_item() {
        let mut para = lines(&["A line before.", "- one"]);
        para[1].action.list_item = true;
        para[1].action.list = true;
        let mut mode = Mode::default();
        let prev = super::super::LineAction::default();
        pass10_paragraph_starts(&mut para, &mut mode, &Config::default(), &prev);
        assert_eq!(para[0].text, "<P>A line before.");
        assert!(para[1].text.starts_with("</P>"));
    }

    #[test]
    fn pass10_leaves_multi_line_paragraph_under_one_open_tag() {
        let mut para = lines(&["line one", "line two", "line three"]);
        let mut mode = Mode::default();
        let prev = super::super::LineAction::default();
        pass10_paragraph_starts(&mut para, &mut mode, &Config::default(), &prev);
        assert_eq!(para[0].text, "<P>line one");
        assert_eq!(para[1].text, "line two");
        assert_eq!(para[2].text, "line three</P>");
    }
}

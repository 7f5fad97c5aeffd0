//!
//! Paragraph Analyzer: the multi-pass, context-sensitive state machine that turns
//! one paragraph's normalized lines into annotated HTML lines, carrying `Mode`
//! across paragraph boundaries. See passes.rs for the thirteen passes and list.rs
//! for the list-nesting state machine.

mod list;
mod passes;

pub use list::{ListFrame, ListKind, ListStack};

use crate::config::Config;
use crate::line::Line;
use fancy_regex::Regex;

/// Per-line record of what the analyzer has done to it, so later passes can avoid
/// conflicting transformations. Named boolean fields rather than a bitset, per the
/// Design Notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineAction {
    pub par: bool,
    pub brk: bool,
    pub header: bool,
    pub mailheader: bool,
    pub mailquote: bool,
    pub hrule: bool,
    pub list: bool,
    pub list_start: bool,
    pub list_item: bool,
    pub caps: bool,
    pub link: bool,
    pub pre: bool,
    pub end: bool,
    pub ind_break: bool,
}

/// Structural context carried across lines and paragraphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode {
    pub list: bool,
    pub pre: bool,
    pub pre_explicit: bool,
    pub table: bool,
}

/// Heading underline-character (or custom-regex) to heading-level assignment,
/// in first-encounter order, unless `explicit_headings` fixes the level directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingStyleKey {
    Underline(char),
    UnderlineCaps(char),
    Custom(usize),
}

#[derive(Debug, Clone, Default)]
pub struct HeadingStyleTable {
    order: Vec<HeadingStyleKey>,
}

impl HeadingStyleTable {
    /// Returns the 1..=6 level for `key`, assigning the next unused level on first
    /// encounter. Levels beyond 6 saturate at 6 (HTML has no H7+).
    pub fn level_for(&mut self, key: HeadingStyleKey) -> u8 {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            return (pos + 1).min(6) as u8;
        }
        self.order.push(key);
        self.order.len().min(6) as u8
    }

    /// Explicit-headings mode: the level is the regex's ordinal directly, never
    /// learned from encounter order.
    pub fn explicit_level(index: usize) -> u8 {
        ((index + 1).min(6)) as u8
    }
}

/// Per-level counters for synthesizing anchor names `section_N[_M[_K...]]`.
#[derive(Debug, Clone, Default)]
pub struct HeadingCounters {
    counters: Vec<usize>,
}

impl HeadingCounters {
    pub fn anchor_for_level(&mut self, level: u8) -> String {
        let level = level as usize;
        if self.counters.len() < level {
            self.counters.resize(level, 0);
        }
        self.counters[level - 1] += 1;
        for deeper in self.counters.iter_mut().skip(level) {
            *deeper = 0;
        }
        let parts: Vec<String> = self.counters[..level].iter().map(|c| c.to_string()).collect();
        format!("section_{}", parts.join("_"))
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzedLine {
    pub text: String,
    pub indent: usize,
    pub action: LineAction,
}

impl AnalyzedLine {
    fn from_line(line: &Line) -> Self {
        AnalyzedLine {
            text: line.text.clone(),
            indent: line.indent,
            action: LineAction::default(),
        }
    }
}

struct CompiledHeadingMarkers {
    custom: Vec<Regex>,
    preformat_start: Regex,
    preformat_end: Regex,
}

/// The converter-instance-scoped analyzer: carries `Mode`, the list stack, and
/// heading bookkeeping across calls, per the spec's "analyzer carries state across
/// calls" control-flow note.
pub struct Analyzer {
    pub mode: Mode,
    pub list_stack: ListStack,
    pub heading_styles: HeadingStyleTable,
    pub heading_counters: HeadingCounters,
    prev_last_action: LineAction,
    markers: CompiledHeadingMarkers,
}

impl Analyzer {
    pub fn new(cfg: &Config) -> Self {
        let custom = cfg
            .custom_heading_regexp
            .iter()
            .filter_map(|pat| Regex::new(pat).ok())
            .collect();
        let preformat_start =
            Regex::new(&cfg.preformat_start_marker).unwrap_or_else(|_| Regex::new(r"^\s*<pre>\s*$").unwrap());
        let preformat_end =
            Regex::new(&cfg.preformat_end_marker).unwrap_or_else(|_| Regex::new(r"^\s*</pre>\s*$").unwrap());

        Analyzer {
            mode: Mode::default(),
            list_stack: ListStack::default(),
            heading_styles: HeadingStyleTable::default(),
            heading_counters: HeadingCounters::default(),
            prev_last_action: LineAction::default(),
            markers: CompiledHeadingMarkers {
                custom,
                preformat_start,
                preformat_end,
            },
        }
    }

    /// Runs all thirteen passes over one paragraph and returns the emitted HTML
    /// lines. Table detection dominates list detection, which dominates paragraph
    /// detection, per the failure semantics: ambiguous input always resolves to the
    /// earliest-listed rule.
    pub fn analyze_paragraph(&mut self, lines: &[Line], cfg: &Config) -> Vec<String> {
        let mut para: Vec<AnalyzedLine> = lines.iter().map(AnalyzedLine::from_line).collect();
        if para.is_empty() {
            return Vec::new();
        }

        let mut out_prefix: Vec<String> = Vec::new();
        let mut out_suffix: Vec<String> = Vec::new();

        // Tables are always self-contained within a single paragraph, unlike PRE/LIST
        // which legitimately carry across the blank-line boundary.
        self.mode.table = false;

        if cfg.make_tables && !self.mode.pre {
            passes::pass1_tables(&mut para, &mut self.mode, &mut out_prefix, &mut out_suffix, cfg);
        }

        if cfg.escape_html_chars && !self.mode.table {
            passes::pass2_escape(&mut para);
        }

        if cfg.mailmode {
            passes::pass3_mail(&mut para, &mut out_prefix, cfg);
        }

        passes::pass4_end_preformat(
            &mut para,
            &mut self.mode,
            cfg,
            &self.markers.preformat_start,
            &self.markers.preformat_end,
        );

        if !self.mode.table {
            passes::pass5_hrule(&mut para, cfg);
        }

        if !self.mode.table && !self.mode.pre {
            passes::pass6_custom_headings(
                &mut para,
                &self.markers.custom,
                &mut self.heading_styles,
                &mut self.heading_counters,
                cfg,
            );
        }

        if !self.mode.table && !self.mode.pre {
            passes::pass7_lists(
                &mut para,
                &mut self.mode,
                &mut self.list_stack,
                &self.prev_last_action,
                cfg,
                &mut out_prefix,
            );
        }

        if !self.mode.table {
            passes::pass8_preformat_unmarked(&mut para, &mut self.mode, cfg, &mut out_prefix);
        }

        if !self.mode.table && !self.mode.pre {
            passes::pass9_underline_headings(
                &mut para,
                cfg,
                &mut self.heading_styles,
                &mut self.heading_counters,
            );
        }

        if !self.mode.table {
            passes::pass10_paragraph_starts(&mut para, &mut self.mode, cfg, &self.prev_last_action);
        }

        if !self.mode.table && !self.mode.list {
            passes::pass11_short_line_breaks(&mut para, &self.mode, cfg);
        }

        passes::pass12_all_caps(&mut para, cfg);

        if cfg.unhyphenation {
            passes::pass13_hyphenation(&mut para, &self.mode);
        }

        self.prev_last_action = para.last().map(|l| l.action).unwrap_or_default();

        let mut result = out_prefix;
        result.extend(para.into_iter().map(|l| l.text));
        result.extend(out_suffix);
        result
    }

    /// Closes any remaining open lists and clears carry-over pre/table mode, used
    /// at end of input by the assembler.
    pub fn finish(&mut self, cfg: &Config) -> Vec<String> {
        let mut out = Vec::new();
        list::close_list(&mut self.list_stack, &mut out, cfg);
        self.mode = Mode::default();
        out
    }
}

//!
//! Grammar-level parsing of link-dictionary entries: comment/ignored-line
//! recognition, arrow-splitting, and sep/flags extraction. Kept separate from
//! compilation (mod.rs) so the grammar can be tested without a regex engine.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub key: String,
    pub flags: String,
    pub replacement: String,
    pub line: usize,
    pub raw: String,
}

/// Parses every non-comment, non-blank line of `source` as a dictionary entry.
pub fn parse_entries(source: &str, path: &Path) -> Result<Vec<ParsedEntry>, ConvertError> {
    let mut entries = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line_num = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }
        entries.push(parse_entry(trimmed, line_num, path)?);
    }
    Ok(entries)
}

fn is_comment_line(line: &str) -> bool {
    if line.starts_with('#') {
        return true;
    }
    ends_with_unescaped_colon(line)
}

fn ends_with_unescaped_colon(line: &str) -> bool {
    match line.strip_suffix(':') {
        Some(rest) => !rest.ends_with('\\'),
        None => false,
    }
}

fn parse_entry(line: &str, line_num: usize, path: &Path) -> Result<ParsedEntry, ConvertError> {
    let arrow_count = line.matches("->").count();
    if arrow_count == 0 {
        return parse_error(path, line_num, line, "missing '->' arrow");
    }
    if arrow_count > 1 {
        return parse_error(path, line_num, line, "two consecutive '->' arrows are ambiguous");
    }

    let arrow_pos = line.find("->").unwrap();
    // `arrow_pos` points at the '-' of "->". That dash always belongs to the
    // delimiter itself, so it is included in what we hand to the splitter
    // rather than trimmed away with the rest of the prefix.
    let delimiter_prefix = &line[..=arrow_pos];
    let replacement = line[arrow_pos + 2..].trim().to_string();

    let (key, flags) = match split_sep_and_flags(delimiter_prefix) {
        Some(parts) => parts,
        None => return parse_error(path, line_num, line, "missing '-' separator before '->'"),
    };

    if key.trim().is_empty() {
        return parse_error(path, line_num, line, "empty key");
    }

    Ok(ParsedEntry {
        key: key.trim().to_string(),
        flags,
        replacement,
        line: line_num,
        raw: line.to_string(),
    })
}

fn parse_error<T>(path: &Path, line: usize, raw: &str, message: &str) -> Result<T, ConvertError> {
    Err(ConvertError::DictionaryParseError {
        path: path.to_path_buf(),
        line,
        raw: raw.to_string(),
        message: message.to_string(),
    })
}

/// Splits `delimiter_prefix` (everything up to and including the arrow's own
/// `-`) into `(key, flags)`.
///
/// The delimiter is `-FLAGS->` with the flags optional: written out in full
/// that's a mandatory leading `-`, zero or more letters from `iehos`, zero or
/// more further `-`, then the arrow itself. When flags are empty the leading
/// dash and the arrow's dash are the same character ("foo -> x"); when flags
/// are present they sit strictly between two distinct dashes ("foo -io-> x").
/// Scanning back from the arrow's dash, we first peel off that trailing run
/// of `-` (always at least one: the arrow's own), then speculatively peel off
/// flag letters before it. If a further `-` precedes the flags, they're real
/// flags; otherwise the speculative read is abandoned and flags is empty. A
/// key must also be `-`-delimited from the rest of the line by whitespace —
/// "cats->" is rejected as a missing separator, not parsed as key "cat" with
/// flag "s".
fn split_sep_and_flags(delimiter_prefix: &str) -> Option<(String, String)> {
    let chars: Vec<char> = delimiter_prefix.chars().collect();
    debug_assert_eq!(chars.last().copied(), Some('-'));
    let mut i = chars.len();

    while i > 0 && chars[i - 1] == '-' {
        i -= 1;
    }
    let no_flags_boundary = i;

    let mut flags_end = i;
    while flags_end > 0 && "iehos".contains(chars[flags_end - 1]) {
        flags_end -= 1;
    }
    let (key_boundary, flags): (usize, String) = if flags_end < no_flags_boundary && flags_end > 0 && chars[flags_end - 1] == '-' {
        (flags_end - 1, chars[flags_end..no_flags_boundary].iter().collect())
    } else {
        (no_flags_boundary, String::new())
    };

    if key_boundary > 0 && chars[key_boundary - 1] != ' ' && chars[key_boundary - 1] != '\t' {
        return None;
    }

    let key: String = chars[..key_boundary].iter().collect::<String>().trim_end().to_string();
    Some((key, flags))
}

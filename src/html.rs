//!
//! Small shared HTML helpers: entity escaping and tag-name casing. Centralized
//! here since both the analyzer passes and the document assembler need to respect
//! `lower_case_tags`/`xhtml` consistently.

use crate::config::Config;

/// `&` -> `&amp;`, then `<` -> `&lt;`, `>` -> `&gt;`, in that order (escaping `&`
/// first would double-escape the entities it produces for `<`/`>`).
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Tags are emitted upper-case by default, matching classic HTML 3.2 output;
/// `lower_case_tags` or `xhtml` (which implies it) switch to lower-case.
pub fn tag_name(base: &str, cfg: &Config) -> String {
    if cfg.lower_case_tags || cfg.xhtml {
        base.to_lowercase()
    } else {
        base.to_uppercase()
    }
}

pub fn open_tag(base: &str, cfg: &Config) -> String {
    format!("<{}>", tag_name(base, cfg))
}

pub fn close_tag(base: &str, cfg: &Config) -> String {
    format!("</{}>", tag_name(base, cfg))
}

pub fn open_tag_attrs(base: &str, attrs: &str, cfg: &Config) -> String {
    if attrs.is_empty() {
        open_tag(base, cfg)
    } else {
        format!("<{} {}>", tag_name(base, cfg), attrs)
    }
}

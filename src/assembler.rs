//!
//! Document Assembler: wraps the analyzer/applier's paragraph output in doctype,
//! head, and body scaffolding, splices prepend/append files verbatim, and closes
//! whatever the analyzer left open at end of input.

use crate::config::Config;
use crate::entities::encode_latin1_entities;
use crate::error::ConvertError;
use crate::html::{escape_html, tag_name};
use std::fs;
use std::path::Path;

/// Picks the document title: the explicitly configured `title` wins; otherwise,
/// when `titlefirst` is set, the first non-blank input line; otherwise none.
pub fn resolve_title(cfg: &Config, input: &str) -> Option<String> {
    if let Some(t) = &cfg.title {
        return Some(t.clone());
    }
    if cfg.titlefirst {
        return input.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string);
    }
    None
}

fn read_auxiliary(path: &Path) -> Result<String, ConvertError> {
    fs::read_to_string(path).map_err(|source| ConvertError::AuxiliaryNotReadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an auxiliary file (prepend/append/append-head), logging and continuing
/// with empty content on failure rather than aborting the whole conversion.
fn read_auxiliary_lenient(path: &Option<std::path::PathBuf>, kind: &str) -> String {
    match path {
        None => String::new(),
        Some(p) => match read_auxiliary(p) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("skipping unreadable {kind} file: {e}");
                String::new()
            }
        },
    }
}

/// Emits `<!DOCTYPE ...>` through the opening `<body ...>` tag: title, the
/// literal `append_head` splice, a `<meta name=generator>`, and any `style_url`
/// link, in that order (spec §4.5).
pub fn emit_head(cfg: &Config, title: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("<!DOCTYPE HTML PUBLIC \"{}\">\n", cfg.doctype));
    out.push_str(&format!("<{}>\n", tag_name("HTML", cfg)));
    out.push_str(&format!("<{}>\n", tag_name("HEAD", cfg)));

    let resolved_title = title.or(cfg.title.as_deref()).unwrap_or("");
    let escaped_title = escape_html(resolved_title);
    let displayed_title = if cfg.eight_bit_clean {
        escaped_title
    } else {
        encode_latin1_entities(&escaped_title)
    };
    out.push_str(&format!(
        "<{tag}>{displayed_title}</{tag}>\n",
        tag = tag_name("TITLE", cfg),
    ));

    let append_head = read_auxiliary_lenient(&cfg.append_head, "append_head");
    if !append_head.is_empty() {
        out.push_str(append_head.trim_end());
        out.push('\n');
    }

    out.push_str(&format!(
        "<{} name=\"generator\" content=\"txt2html\">\n",
        tag_name("META", cfg)
    ));

    if let Some(style) = &cfg.style_url {
        out.push_str(&format!(
            "<{} rel=\"stylesheet\" href=\"{}\" type=\"text/css\"/>\n",
            tag_name("LINK", cfg),
            style
        ));
    }

    out.push_str(&format!("</{}>\n", tag_name("HEAD", cfg)));

    let body_open = if cfg.body_deco.is_empty() {
        format!("<{}>", tag_name("BODY", cfg))
    } else {
        format!("<{} {}>", tag_name("BODY", cfg), cfg.body_deco)
    };
    out.push_str(&body_open);
    out.push('\n');
    out
}

pub fn emit_prepend(cfg: &Config) -> String {
    let text = read_auxiliary_lenient(&cfg.prepend_file, "prepend_file");
    if text.is_empty() {
        String::new()
    } else {
        format!("{}\n", text.trim_end())
    }
}

pub fn emit_append(cfg: &Config) -> String {
    let text = read_auxiliary_lenient(&cfg.append_file, "append_file");
    if text.is_empty() {
        String::new()
    } else {
        format!("{}\n", text.trim_end())
    }
}

/// Closes the body/html wrapper. `analyzer_tail` is whatever `Analyzer::finish`
/// produced (closing any list still open at end of input).
pub fn emit_tail(cfg: &Config, analyzer_tail: &[String]) -> String {
    let mut out = String::new();
    for line in analyzer_tail {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&format!("</{}>\n", tag_name("BODY", cfg)));
    out.push_str(&format!("</{}>\n", tag_name("HTML", cfg)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_includes_doctype_and_title() {
        let cfg = Config::default();
        let head = emit_head(&cfg, Some("My Doc"));
        assert!(head.contains("DOCTYPE"));
        assert!(head.contains("My Doc"));
        assert!(head.ends_with("<BODY>\n") || head.contains("<BODY"));
    }

    #[test]
    fn head_includes_generator_meta_tag() {
        let cfg = Config::default();
        let head = emit_head(&cfg, Some("My Doc"));
        assert!(head.contains(r#"<META name="generator" content="txt2html">"#));
    }

    #[test]
    fn resolve_title_prefers_explicit_title_over_titlefirst() {
        let mut cfg = Config::default();
        cfg.title = Some("Configured".to_string());
        cfg.titlefirst = true;
        assert_eq!(resolve_title(&cfg, "First Line\nmore text"), Some("Configured".to_string()));
    }

    #[test]
    fn resolve_title_uses_first_nonblank_line_when_titlefirst_set() {
        let mut cfg = Config::default();
        cfg.titlefirst = true;
        assert_eq!(resolve_title(&cfg, "\n  First Line  \nmore text"), Some("First Line".to_string()));
    }

    #[test]
    fn resolve_title_is_none_without_title_or_titlefirst() {
        let cfg = Config::default();
        assert_eq!(resolve_title(&cfg, "First Line\nmore text"), None);
    }

    #[test]
    fn xhtml_lowercases_scaffolding_tags() {
        let mut cfg = Config::default();
        cfg.xhtml = true;
        let head = emit_head(&cfg, None);
        assert!(head.contains("<html>"));
        assert!(head.contains("<body>") || head.contains("<body "));
    }

    #[test]
    fn body_deco_is_emitted_as_attributes() {
        let mut cfg = Config::default();
        cfg.body_deco = r#"bgcolor="white""#.to_string();
        let head = emit_head(&cfg, None);
        assert!(head.contains(r#"<BODY bgcolor="white">"#));
    }

    #[test]
    fn tail_closes_body_and_html() {
        let cfg = Config::default();
        let tail = emit_tail(&cfg, &["</UL>".to_string()]);
        assert_eq!(tail, "</UL>\n</BODY>\n</HTML>\n");
    }
}

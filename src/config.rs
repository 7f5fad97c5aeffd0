//!
//! Configuration structures and loading logic, mirroring the option table in the
//! spec's external-interfaces section. Defaults overridden by a TOML file, in turn
//! overridden by CLI flags, the way the teacher's `Config`/`GlobalConfig` pair merges
//! file and CLI sources.

use crate::error::{ConvertError, ConvertResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub append_file: Option<PathBuf>,
    pub append_head: Option<PathBuf>,
    pub prepend_file: Option<PathBuf>,
    pub body_deco: String,
    pub caps_tag: String,
    pub custom_heading_regexp: Vec<String>,
    pub default_link_dict: Option<PathBuf>,
    pub system_link_dict: Option<PathBuf>,
    pub dict_debug: u32,
    pub debug: u32,
    pub doctype: String,
    pub eight_bit_clean: bool,
    pub escape_html_chars: bool,
    pub explicit_headings: bool,
    pub extract: bool,
    pub hrule_min: usize,
    pub indent_width: usize,
    pub indent_par_break: bool,
    pub links_dictionaries: Vec<PathBuf>,
    pub link_only: bool,
    pub lower_case_tags: bool,
    pub mailmode: bool,
    pub make_anchors: bool,
    pub make_links: bool,
    pub make_tables: bool,
    pub min_caps_length: usize,
    pub par_indent: usize,
    pub preformat_trigger_lines: u8,
    pub endpreformat_trigger_lines: u8,
    pub preformat_start_marker: String,
    pub preformat_end_marker: String,
    pub preformat_whitespace_min: usize,
    pub preserve_indent: bool,
    pub short_line_length: usize,
    pub style_url: Option<String>,
    pub tab_width: usize,
    pub title: Option<String>,
    pub titlefirst: bool,
    pub underline_length_tolerance: usize,
    pub underline_offset_tolerance: usize,
    pub unhyphenation: bool,
    pub use_mosaic_header: bool,
    pub use_preformat_marker: bool,
    pub xhtml: bool,
    /// Unsafe opt-in for the `e` (eval) link-dictionary flag; see DESIGN.md Open
    /// Question (a). Off by default — rules using `e` are rejected at compile time.
    pub allow_eval_rules: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            append_file: None,
            append_head: None,
            prepend_file: None,
            body_deco: String::new(),
            caps_tag: "strong".to_string(),
            custom_heading_regexp: Vec::new(),
            default_link_dict: None,
            system_link_dict: None,
            dict_debug: 0,
            debug: 0,
            doctype: "-//W3C//DTD HTML 3.2 Final//EN".to_string(),
            eight_bit_clean: false,
            escape_html_chars: true,
            explicit_headings: false,
            extract: false,
            hrule_min: 4,
            indent_width: 2,
            indent_par_break: false,
            links_dictionaries: Vec::new(),
            link_only: false,
            lower_case_tags: false,
            mailmode: false,
            make_anchors: true,
            make_links: true,
            make_tables: false,
            min_caps_length: 3,
            par_indent: 2,
            preformat_trigger_lines: 2,
            endpreformat_trigger_lines: 2,
            preformat_start_marker: r"^\s*<pre>\s*$".to_string(),
            preformat_end_marker: r"^\s*</pre>\s*$".to_string(),
            preformat_whitespace_min: 5,
            preserve_indent: false,
            short_line_length: 40,
            style_url: None,
            tab_width: 8,
            title: None,
            titlefirst: false,
            underline_length_tolerance: 1,
            underline_offset_tolerance: 1,
            unhyphenation: true,
            use_mosaic_header: false,
            use_preformat_marker: false,
            xhtml: false,
            allow_eval_rules: false,
        }
    }
}

impl Config {
    /// Loads a config from a TOML file, layered on top of defaults. Mirrors the
    /// teacher's "missing config file is fine, malformed one is an error" behavior.
    pub fn load_from_file(path: &Path) -> ConvertResult<Config> {
        let text = std::fs::read_to_string(path).map_err(|source| ConvertError::AuxiliaryNotReadable {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConvertError::InvalidConfig(format!("{path:?}: {e}")))
    }

    /// Applies the `xhtml` option's implications: forces `lower_case_tags` and
    /// overrides `doctype` unless the caller already set a custom one explicitly
    /// via `doctype_overridden`.
    pub fn normalize(&mut self) {
        if self.xhtml {
            self.lower_case_tags = true;
            self.doctype = "-//W3C//DTD XHTML 1.0 Transitional//EN".to_string();
        }
        self.preformat_trigger_lines = self.preformat_trigger_lines.min(2);
        self.endpreformat_trigger_lines = self.endpreformat_trigger_lines.min(2);
        if self.preformat_trigger_lines == 0 {
            self.endpreformat_trigger_lines = 1;
        }
    }
}

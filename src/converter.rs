//!
//! The public `Converter`: owns one analyzer/dictionary/memo instance and exposes
//! the document- and fragment-level conversion entry points. A single instance is
//! not meant to be shared across threads (see the concurrency model): callers that
//! want parallel conversion create one `Converter` per worker.

use crate::analyzer::Analyzer;
use crate::applier::{self, OnceMemo};
use crate::assembler;
use crate::config::Config;
use crate::dict::LinkDictionary;
use crate::entities::encode_latin1_entities;
use crate::error::{ConvertError, ConvertResult};
use crate::line::split_paragraphs;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Returned alongside a fragment when `close_open_tags` is false, so callers
/// threading several `convert_fragment` calls together can inspect what is still
/// open without re-deriving it from the converter's internals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Continuation {
    pub list_open: bool,
    pub preformat_open: bool,
    pub table_open: bool,
}

pub struct Converter {
    cfg: Config,
    analyzer: Analyzer,
    dict: LinkDictionary,
    memo: OnceMemo,
}

impl Converter {
    pub fn new(mut cfg: Config) -> Self {
        cfg.normalize();
        let analyzer = Analyzer::new(&cfg);
        Converter {
            cfg,
            analyzer,
            dict: LinkDictionary::default(),
            memo: OnceMemo::default(),
        }
    }

    /// Replaces the active configuration, recompiling analyzer-side regexes but
    /// keeping accumulated `OnceMemo`/list state (a config change mid-document is
    /// unusual but not forbidden).
    pub fn set_options(&mut self, mut cfg: Config) {
        cfg.normalize();
        self.analyzer = Analyzer::new(&cfg);
        self.cfg = cfg;
    }

    /// Loads and compiles every dictionary named in `cfg.links_dictionaries` (plus
    /// `default_link_dict`/`system_link_dict` if set), in order, concatenating
    /// their compiled rules. An unreadable dictionary is fatal (unlike prepend/
    /// append files, a missing link dictionary is a configuration error).
    pub fn load_dictionaries(&mut self) -> ConvertResult<()> {
        let mut paths: Vec<&Path> = Vec::new();
        if let Some(p) = &self.cfg.system_link_dict {
            paths.push(p);
        }
        if let Some(p) = &self.cfg.default_link_dict {
            paths.push(p);
        }
        for p in &self.cfg.links_dictionaries {
            paths.push(p);
        }

        let mut rules = Vec::new();
        for path in paths {
            let source = fs::read_to_string(path).map_err(|source| ConvertError::InputNotReadable {
                path: path.to_path_buf(),
                source,
            })?;
            let dict = LinkDictionary::compile(&source, path, self.cfg.allow_eval_rules, self.cfg.dict_debug)?;
            log::debug!("loaded {} link rules from {}", dict.rules.len(), path.display());
            rules.extend(dict.rules);
        }
        self.dict = LinkDictionary { rules };
        Ok(())
    }

    /// Converts one or more input files into a single HTML document written to
    /// `output`. Files unreadable after the first are logged and skipped; the
    /// first file's unreadability is fatal (there is nothing to convert).
    pub fn convert_document<W: Write>(&mut self, inputs: &[&Path], output: &mut W) -> ConvertResult<()> {
        let mut combined = String::new();
        for (i, path) in inputs.iter().enumerate() {
            match fs::read_to_string(path) {
                Ok(text) => {
                    if !combined.is_empty() {
                        combined.push('\n');
                    }
                    combined.push_str(&text);
                }
                Err(source) if i == 0 => {
                    return Err(ConvertError::InputNotReadable {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                Err(source) => {
                    log::warn!("skipping unreadable input {}: {source}", path.display());
                }
            }
        }

        let title = assembler::resolve_title(&self.cfg, &combined);
        let body = self.render_body(&combined);

        write!(output, "{}", assembler::emit_head(&self.cfg, title.as_deref())).map_err(ConvertError::WriteError)?;
        write!(output, "{}", assembler::emit_prepend(&self.cfg)).map_err(ConvertError::WriteError)?;
        write!(output, "{body}").map_err(ConvertError::WriteError)?;
        write!(output, "{}", assembler::emit_append(&self.cfg)).map_err(ConvertError::WriteError)?;
        let tail = self.analyzer.finish(&self.cfg);
        write!(output, "{}", assembler::emit_tail(&self.cfg, &tail)).map_err(ConvertError::WriteError)?;
        Ok(())
    }

    /// Convenience wrapper for in-memory callers that don't want to manage
    /// `Read`/`Write` streams themselves.
    pub fn convert_document_str(&mut self, input: &str) -> ConvertResult<String> {
        let title = assembler::resolve_title(&self.cfg, input);
        let mut out = String::new();
        out.push_str(&assembler::emit_head(&self.cfg, title.as_deref()));
        out.push_str(&assembler::emit_prepend(&self.cfg));
        out.push_str(&self.render_body(input));
        out.push_str(&assembler::emit_append(&self.cfg));
        let tail = self.analyzer.finish(&self.cfg);
        out.push_str(&assembler::emit_tail(&self.cfg, &tail));
        Ok(out)
    }

    /// Converts one fragment of plain text to HTML without document scaffolding.
    /// When `close_open_tags` is false, any list/preformat/table left open is
    /// reported via the returned `Continuation` rather than force-closed, so a
    /// caller can thread several fragments together and close only at the end.
    pub fn convert_fragment(&mut self, text: &str, close_open_tags: bool) -> (String, Continuation) {
        let body = self.render_body(text);
        if close_open_tags {
            let tail = self.analyzer.finish(&self.cfg);
            let mut out = body;
            for line in &tail {
                out.push_str(line);
                out.push('\n');
            }
            (out, Continuation::default())
        } else {
            let cont = Continuation {
                list_open: !self.analyzer.list_stack.is_empty(),
                preformat_open: self.analyzer.mode.pre,
                table_open: self.analyzer.mode.table,
            };
            (body, cont)
        }
    }

    fn render_body(&mut self, text: &str) -> String {
        let paragraphs = split_paragraphs(text, self.cfg.tab_width);
        let mut out = String::new();
        for para in paragraphs {
            self.memo.start_paragraph();
            // `link_only` skips the whole structural analyzer (spec §6: "skip all
            // structural analysis") — lines pass through untouched but for HTML
            // escaping, then only the link dictionary runs over them.
            let lines: Vec<String> = if self.cfg.link_only {
                para.iter()
                    .map(|l| {
                        if self.cfg.escape_html_chars {
                            crate::html::escape_html(&l.text)
                        } else {
                            l.text.clone()
                        }
                    })
                    .collect()
            } else {
                self.analyzer.analyze_paragraph(&para, &self.cfg)
            };
            for line in lines {
                let linked = applier::apply_rules(&line, &self.dict, &mut self.memo, self.cfg.make_links);
                let rendered = if self.cfg.eight_bit_clean {
                    linked
                } else {
                    encode_latin1_entities(&linked)
                };
                out.push_str(&rendered);
                out.push('\n');
            }
        }
        out
    }
}

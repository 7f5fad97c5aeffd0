//!
//! Command-line surface: a `convert` subcommand (also the default when no
//! subcommand is given) and a `dict` subcommand group for validating a link
//! dictionary standalone, mirroring the option table in the configuration module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "txt2html", version, about = "Converts plain text to HTML")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub convert: ConvertArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert one or more text files to HTML (the default action).
    Convert(ConvertArgs),
    /// Operate on a link dictionary file without converting any document.
    Dict {
        #[command(subcommand)]
        action: DictAction,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum DictAction {
    /// Parse and compile a dictionary file, reporting any syntax errors.
    Check { path: PathBuf },
    /// Compile a dictionary file and print the number of rules and their order.
    Compile { path: PathBuf },
}

#[derive(Debug, Args, Default)]
pub struct ConvertArgs {
    /// Input text file(s). Reads standard input when omitted.
    pub inputs: Vec<PathBuf>,

    /// Output file (writes to standard output when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Link dictionary file(s), applied in the given order.
    #[arg(short = 'd', long = "dict")]
    pub dictionaries: Vec<PathBuf>,

    /// Document title (overrides any title inferred from the text).
    #[arg(long)]
    pub title: Option<String>,

    /// Text to insert verbatim before the converted body.
    #[arg(long)]
    pub prepend_file: Option<PathBuf>,

    /// Text to insert verbatim after the converted body.
    #[arg(long)]
    pub append_file: Option<PathBuf>,

    /// Emit XHTML instead of HTML 3.2.
    #[arg(long)]
    pub xhtml: bool,

    /// Detect paragraphs of aligned columns and emit `<table>` markup.
    #[arg(long)]
    pub tables: bool,

    /// Disable link-dictionary application entirely.
    #[arg(long)]
    pub no_links: bool,

    /// Treat the input as mail/news (quote and header handling).
    #[arg(long)]
    pub mailmode: bool,

    /// Emit a bare fragment instead of a full document envelope.
    #[arg(long)]
    pub extract: bool,

    /// Skip structural analysis entirely; only HTML-escape and apply the link
    /// dictionary.
    #[arg(long)]
    pub link_only: bool,
}

impl ConvertArgs {
    /// Layers CLI flags on top of an already-loaded (or default) `Config`. CLI
    /// flags only ever turn options on/override values explicitly given; a flag
    /// left unset never clobbers a value the config file supplied.
    pub fn apply_to(&self, cfg: &mut crate::config::Config) {
        if let Some(title) = &self.title {
            cfg.title = Some(title.clone());
        }
        if let Some(path) = &self.prepend_file {
            cfg.prepend_file = Some(path.clone());
        }
        if let Some(path) = &self.append_file {
            cfg.append_file = Some(path.clone());
        }
        if !self.dictionaries.is_empty() {
            cfg.links_dictionaries = self.dictionaries.clone();
        }
        if self.xhtml {
            cfg.xhtml = true;
        }
        if self.tables {
            cfg.make_tables = true;
        }
        if self.no_links {
            cfg.make_links = false;
        }
        if self.mailmode {
            cfg.mailmode = true;
        }
        if self.extract {
            cfg.extract = true;
        }
        if self.link_only {
            cfg.link_only = true;
        }
    }
}

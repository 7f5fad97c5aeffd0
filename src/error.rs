//!
//! Error taxonomy for the converter, matching the recoverable/fatal split of the design:
//! unreadable inputs and auxiliary files are reported and skipped, dictionary syntax
//! errors are fatal with context, and write failures propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read input {path}: {source}")]
    InputNotReadable { path: PathBuf, source: std::io::Error },

    #[error("cannot read auxiliary file {path}: {source}")]
    AuxiliaryNotReadable { path: PathBuf, source: std::io::Error },

    #[error("dictionary parse error in {path}:{line}: {message}\n  {raw}")]
    DictionaryParseError {
        path: PathBuf,
        line: usize,
        raw: String,
        message: String,
    },

    #[error("write error: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

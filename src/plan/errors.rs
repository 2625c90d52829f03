use crate::syntax::SyntaxError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rewrite plan JSON: {source}")]
    Json {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    #[error("unhandled directive kind '{kind}' in {file}")]
    UnknownDirective { kind: String, file: PathBuf },

    #[error("file {file} is not part of any package in the plan")]
    UnknownFile { file: PathBuf },

    #[error("file {file} is listed twice")]
    DuplicateFile { file: PathBuf },

    #[error("package {import_path} is not part of the plan")]
    UnknownPackage { import_path: String },

    #[error("remote call in {file} targets unknown procedure '{target}'")]
    UnknownRpc { target: String, file: PathBuf },

    #[error("procedure '{target}' is declared twice")]
    DuplicateRpc { target: String },

    #[error("remote call at {file}:{start} has no target")]
    MissingTarget { file: PathBuf, start: usize },

    #[error("span {start}..{end} is out of range for {file}")]
    InvalidSpan {
        file: PathBuf,
        start: usize,
        end: usize,
    },

    #[error("no {expected} node spans {start}..{end} in {file}")]
    UnresolvedSpan {
        file: PathBuf,
        start: usize,
        end: usize,
        expected: &'static str,
    },

    #[error("node at {file}:{start} has more than one directive")]
    DuplicateDirective { file: PathBuf, start: usize },
}

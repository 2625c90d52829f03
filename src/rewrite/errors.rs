use crate::edit::EditError;
use crate::model::NodeRef;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("{directive} directive on unsupported {kind} node at {file}:{byte_start}")]
    UnsupportedNode {
        directive: &'static str,
        kind: &'static str,
        file: PathBuf,
        byte_start: usize,
    },

    #[error("package {package} has no service but {file} acquires a database handle")]
    MissingService { package: String, file: PathBuf },

    #[error("no node id registered for {node:?} in {file}")]
    MissingNodeId { node: NodeRef, file: PathBuf },

    #[error("secret declaration at {file}:{byte_start} must have a type and no initializer")]
    InvalidSecretSpec { file: PathBuf, byte_start: usize },

    #[error("{file} has no top-level declaration to place the runtime import before")]
    NoDeclaration { file: PathBuf },

    #[error("position {pos} is outside {file}")]
    PositionOutOfRange { pos: usize, file: PathBuf },

    #[error("edit conflict in {file}: {source}")]
    Edit {
        file: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

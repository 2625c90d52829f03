//! Inputs of a rewrite run: packages, files, directives and the node id
//! registry. All of these are read-only while rewriting.

use crate::syntax::{NodeId, SyntaxTree};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Identifies a source file across all packages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A syntax node identified across files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub file: FileId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(file: FileId, node: NodeId) -> Self {
        Self { file, node }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
}

/// Name and import path of a package, as referenced from other packages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub name: String,
    pub import_path: String,
}

/// Go types of a remote procedure as they must be spelled inside the
/// calling package's wrapper unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Signature {
    /// Parameter types; a `...T` final entry is variadic
    pub params: Vec<String>,
    pub results: Vec<String>,
    /// Extra import paths the types above need
    pub imports: Vec<String>,
}

/// A remote procedure `service.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTarget {
    pub service: String,
    pub name: String,
    /// The procedure's function declaration
    pub definition: NodeRef,
    /// Package that defines the procedure
    pub home: PackageRef,
    pub signature: Signature,
}

impl RpcTarget {
    /// Deduplication key for wrapper generation.
    pub fn key(&self) -> (&str, &str) {
        (&self.service, &self.name)
    }
}

/// What to do with one syntax node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Call acquiring a database handle; gets the service name prepended.
    DatabaseHandle,
    /// Logging annotation; left untouched, children included.
    LogAnnotation,
    /// Call of a remote procedure; routed through a generated wrapper.
    RemoteCall(RpcTarget),
    /// Definition site of a remote procedure.
    RemoteCallDefinition,
    /// Secrets declaration (`var secrets struct { ... }`).
    SecretDeclaration,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::DatabaseHandle => "database_handle",
            Directive::LogAnnotation => "log_annotation",
            Directive::RemoteCall(_) => "remote_call",
            Directive::RemoteCallDefinition => "remote_call_definition",
            Directive::SecretDeclaration => "secret_declaration",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub tree: SyntaxTree,
    /// Nodes without an entry are left untouched
    pub directives: HashMap<NodeId, Directive>,
}

impl SourceFile {
    pub fn contents(&self) -> &str {
        self.tree.source()
    }

    /// Offset of this file's first byte in the run-wide position space.
    pub fn base(&self) -> usize {
        self.tree.base()
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub import_path: String,
    /// Directory holding the package's sources
    pub dir: PathBuf,
    pub service: Option<Service>,
    /// Secret names declared by the package, in declaration order
    pub secrets: Vec<String>,
    pub files: Vec<SourceFile>,
}

/// Read-only access to the ids assigned to syntax nodes upstream.
pub trait NodeIds {
    fn id(&self, node: NodeRef) -> Option<u64>;
}

/// `HashMap`-backed [`NodeIds`].
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: HashMap<NodeRef, u64>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, node: NodeRef, id: u64) {
        self.ids.insert(node, id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl NodeIds for IdRegistry {
    fn id(&self, node: NodeRef) -> Option<u64> {
        self.ids.get(&node).copied()
    }
}

//! Per-node rewrite dispatch.
//!
//! Walks a file's tree in document order and turns each directive into edits.

use crate::config::RewriteConfig;
use crate::edit::EditBuffer;
use crate::marker::{LineIndex, LineMarker};
use crate::model::{Directive, NodeIds, NodeRef, Package, PackageRef, RpcTarget, SourceFile};
use crate::rewrite::errors::RewriteError;
use crate::rewrite::wrappers::{wrapper_name, WrapperSet};
use crate::syntax::{quote, NodeDetail, NodeId};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Edits and import bookkeeping produced by one dispatch pass.
pub(crate) struct DispatchOutcome<'a> {
    pub edits: EditBuffer<'a>,
    /// Packages whose import may have lost its last use, first-seen order
    pub candidates: Vec<PackageRef>,
    /// Selector nodes replaced by remote call rewrites
    pub consumed: HashSet<NodeId>,
}

pub(crate) struct Dispatcher<'a, 'w> {
    pkg: &'a Package,
    file: &'a SourceFile,
    ids: &'a dyn NodeIds,
    config: &'a RewriteConfig,
    lines: LineIndex,
    wrappers: &'w mut WrapperSet,
    edits: EditBuffer<'a>,
    candidates: Vec<PackageRef>,
    consumed: HashSet<NodeId>,
    runtime_imported: bool,
}

impl<'a, 'w> Dispatcher<'a, 'w> {
    pub fn new(
        pkg: &'a Package,
        file: &'a SourceFile,
        ids: &'a dyn NodeIds,
        config: &'a RewriteConfig,
        wrappers: &'w mut WrapperSet,
    ) -> Self {
        Self {
            pkg,
            file,
            ids,
            config,
            lines: LineIndex::new(file.contents(), file.base()),
            wrappers,
            edits: EditBuffer::new(file.contents().as_bytes(), file.base()),
            candidates: Vec::new(),
            consumed: HashSet::new(),
            runtime_imported: false,
        }
    }

    pub fn run(mut self) -> Result<DispatchOutcome<'a>, RewriteError> {
        let file = self.file;
        let tree = &file.tree;

        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let descend = match file.directives.get(&id) {
                Some(directive) => self.apply(id, directive)?,
                None => true,
            };
            if descend {
                stack.extend(tree.node(id).children.iter().rev().copied());
            }
        }

        Ok(DispatchOutcome {
            edits: self.edits,
            candidates: self.candidates,
            consumed: self.consumed,
        })
    }

    /// Returns whether to descend into the node's children.
    fn apply(&mut self, id: NodeId, directive: &'a Directive) -> Result<bool, RewriteError> {
        trace!(node = id.0, directive = directive.name(), "dispatch");
        match directive {
            Directive::DatabaseHandle => {
                self.database_handle(id)?;
                Ok(true)
            }
            Directive::LogAnnotation => Ok(false),
            Directive::RemoteCall(target) => {
                self.remote_call(id, target)?;
                Ok(true)
            }
            Directive::RemoteCallDefinition => Ok(true),
            Directive::SecretDeclaration => {
                self.secret_declaration(id)?;
                Ok(true)
            }
        }
    }

    fn database_handle(&mut self, id: NodeId) -> Result<(), RewriteError> {
        let (_, lparen) = self.call_parts(id, "database_handle")?;
        let pkg = self.pkg;
        let service = pkg
            .service
            .as_ref()
            .ok_or_else(|| RewriteError::MissingService {
                package: pkg.import_path.clone(),
                file: self.file.path.clone(),
            })?;

        let marker = self.marker(lparen + 1)?;
        self.insert(lparen + 1, format!("{},{marker}", quote(&service.name)))
    }

    fn remote_call(&mut self, id: NodeId, target: &'a RpcTarget) -> Result<(), RewriteError> {
        let (function, lparen) = self.call_parts(id, "remote_call")?;
        let file = self.file;
        let tree = &file.tree;

        // Same-package calls are plain identifiers and never touch an import.
        if let NodeDetail::Selector { .. } = tree.node(function).detail {
            self.consumed.insert(function);
            if !self.candidates.contains(&target.home) {
                self.candidates.push(target.home.clone());
            }
        }

        let callee = tree.node(function).span;
        let name = wrapper_name(&self.config.wrappers.prefix, target);
        self.replace(callee.start, callee.end, name)?;

        let call_id = self.lookup(NodeRef::new(file.id, id))?;
        let rpc_id = self.lookup(target.definition)?;
        let marker = self.marker(lparen + 1)?;
        self.insert(lparen + 1, format!("{call_id}, {rpc_id},{marker}"))?;

        if self.wrappers.insert(target) {
            debug!(
                service = %target.service,
                procedure = %target.name,
                "new rpc wrapper"
            );
        }
        Ok(())
    }

    fn secret_declaration(&mut self, id: NodeId) -> Result<(), RewriteError> {
        let (file, pkg, config) = (self.file, self.pkg, self.config);
        let tree = &file.tree;
        let node = tree.node(id);
        let NodeDetail::ValueSpec { ty, has_value } = node.detail else {
            return Err(self.unsupported(id, "secret_declaration"));
        };
        let ty = match ty {
            Some(ty) if !has_value => ty,
            _ => {
                return Err(RewriteError::InvalidSecretSpec {
                    file: file.path.clone(),
                    byte_start: node.span.start - file.base(),
                })
            }
        };

        self.insert(tree.node(ty).span.start, "= ")?;

        let alias = &config.runtime.alias;
        let mut init = String::from("{\n");
        for secret in &pkg.secrets {
            init.push_str(&format!(
                "\t{secret}: {alias}.LoadSecret({}),\n",
                quote(secret)
            ));
        }
        init.push('}');
        init.push_str(&self.marker(node.span.end)?.to_string());
        self.insert(node.span.end, init)?;

        self.inject_runtime_import()
    }

    /// Import the runtime package before the first declaration, once per file.
    fn inject_runtime_import(&mut self) -> Result<(), RewriteError> {
        if self.runtime_imported {
            return Ok(());
        }
        let file = self.file;
        let tree = &file.tree;
        let decl = tree
            .first_declaration()
            .ok_or_else(|| RewriteError::NoDeclaration {
                file: file.path.clone(),
            })?;

        let start = tree.node(decl).span.start;
        let marker = self.marker(start)?;
        let runtime = &self.config.runtime;
        let import = format!(
            "import {} {}\n{marker}",
            runtime.alias,
            quote(&runtime.import_path)
        );
        self.insert(start, import)?;
        self.runtime_imported = true;
        Ok(())
    }

    fn call_parts(
        &self,
        id: NodeId,
        directive: &'static str,
    ) -> Result<(NodeId, usize), RewriteError> {
        match self.file.tree.node(id).detail {
            NodeDetail::Call { function, lparen } => Ok((function, lparen)),
            _ => Err(self.unsupported(id, directive)),
        }
    }

    fn unsupported(&self, id: NodeId, directive: &'static str) -> RewriteError {
        let node = self.file.tree.node(id);
        RewriteError::UnsupportedNode {
            directive,
            kind: node.kind,
            file: self.file.path.clone(),
            byte_start: node.span.start - self.file.base(),
        }
    }

    fn lookup(&self, node: NodeRef) -> Result<u64, RewriteError> {
        self.ids.id(node).ok_or_else(|| RewriteError::MissingNodeId {
            node,
            file: self.file.path.clone(),
        })
    }

    fn marker(&self, pos: usize) -> Result<LineMarker, RewriteError> {
        self.lines
            .position(pos)
            .ok_or_else(|| RewriteError::PositionOutOfRange {
                pos,
                file: self.file.path.clone(),
            })
    }

    fn insert(&mut self, pos: usize, text: impl Into<String>) -> Result<(), RewriteError> {
        self.edits
            .insert(pos, text)
            .map_err(|source| RewriteError::Edit {
                file: self.file.path.clone(),
                source,
            })
    }

    fn replace(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), RewriteError> {
        self.edits
            .replace(start, end, text)
            .map_err(|source| RewriteError::Edit {
                file: self.file.path.clone(),
                source,
            })
    }
}

use crate::model::{
    Directive, FileId, IdRegistry, NodeRef, Package, PackageRef, RpcTarget, Service, SourceFile,
};
use crate::plan::errors::PlanError;
use crate::plan::schema::{DirectivePlan, RewritePlan, RpcPlan};
use crate::syntax::{GoParser, NodeId, Span, SyntaxTree};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CALL_KINDS: &[&str] = &["call_expression"];
const SECRET_KINDS: &[&str] = &["var_spec"];
const DEFINITION_KINDS: &[&str] = &["function_declaration", "method_declaration"];

/// Directive kinds the rewriter dispatches on.
const DIRECTIVE_KINDS: &[&str] = &[
    "database_handle",
    "log_annotation",
    "remote_call",
    "remote_call_definition",
    "secret_declaration",
];

/// Parsed packages together with the node id registry, ready to rewrite.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub packages: Vec<Package>,
    pub ids: IdRegistry,
}

/// Load a plan file. Relative paths inside it resolve against the plan's
/// directory.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Workspace, PlanError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let plan: RewritePlan = serde_json::from_str(&contents).map_err(|source| PlanError::Json {
        path: Some(path.to_path_buf()),
        source,
    })?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    resolve(plan, root)
}

pub fn load_from_str(input: &str, root: &Path) -> Result<Workspace, PlanError> {
    let plan: RewritePlan =
        serde_json::from_str(input).map_err(|source| PlanError::Json { path: None, source })?;
    resolve(plan, root)
}

struct ParsedFile {
    id: FileId,
    /// Path as written in the plan
    key: PathBuf,
    path: PathBuf,
    tree: SyntaxTree,
    directives: HashMap<NodeId, Directive>,
}

/// Parse every file named by `plan` and resolve its spans.
///
/// Files get consecutive bases in declaration order: the first starts at 1 and
/// each next one at the previous base plus its length plus one, so no two
/// files share a position.
pub fn resolve(plan: RewritePlan, root: &Path) -> Result<Workspace, PlanError> {
    check_directive_kinds(&plan)?;

    let mut parser = GoParser::new().map_err(|source| PlanError::Syntax {
        path: root.to_path_buf(),
        source,
    })?;

    let mut parsed: Vec<Vec<ParsedFile>> = Vec::with_capacity(plan.packages.len());
    let mut index: HashMap<PathBuf, (usize, usize)> = HashMap::new();
    let mut base = 1;
    let mut next_id = 0;

    for (pkg_idx, pkg) in plan.packages.iter().enumerate() {
        let mut files = Vec::with_capacity(pkg.files.len());
        for (file_idx, file) in pkg.files.iter().enumerate() {
            if index
                .insert(file.path.clone(), (pkg_idx, file_idx))
                .is_some()
            {
                return Err(PlanError::DuplicateFile {
                    file: file.path.clone(),
                });
            }
            let path = root.join(&file.path);
            let source = fs::read_to_string(&path).map_err(|source| PlanError::Io {
                path: path.clone(),
                source,
            })?;
            let len = source.len();
            let tree = parser
                .parse_strict(source, base)
                .map_err(|source| PlanError::Syntax {
                    path: path.clone(),
                    source,
                })?;
            base += len + 1;

            files.push(ParsedFile {
                id: FileId(next_id),
                key: file.path.clone(),
                path,
                tree,
                directives: HashMap::new(),
            });
            next_id += 1;
        }
        parsed.push(files);
    }

    let homes: HashMap<&str, PackageRef> = plan
        .packages
        .iter()
        .map(|pkg| {
            (
                pkg.import_path.as_str(),
                PackageRef {
                    name: pkg.name.clone(),
                    import_path: pkg.import_path.clone(),
                },
            )
        })
        .collect();

    let mut rpcs: HashMap<String, RpcTarget> = HashMap::with_capacity(plan.rpcs.len());
    for rpc in &plan.rpcs {
        let target = resolve_rpc(rpc, &homes, lookup(&index, &parsed, &rpc.file)?)?;
        if rpcs.insert(rpc.key(), target).is_some() {
            return Err(PlanError::DuplicateRpc { target: rpc.key() });
        }
    }

    let mut ids = IdRegistry::new();
    for entry in &plan.node_ids {
        let file = lookup(&index, &parsed, &entry.file)?;
        let span = absolute_span(file, entry.span)?;
        let nodes = file.tree.all_by_span(span);
        if nodes.is_empty() {
            return Err(unresolved(file, entry.span, "syntax"));
        }
        // Wrapper nodes share their child's span; all of them carry the id.
        for node in nodes {
            ids.assign(NodeRef::new(file.id, node), entry.id);
        }
    }

    let mut resolved: Vec<Vec<(NodeId, Directive)>> = Vec::new();
    for (pkg_idx, pkg) in plan.packages.iter().enumerate() {
        for (file_idx, file_plan) in pkg.files.iter().enumerate() {
            let file = &parsed[pkg_idx][file_idx];
            let mut directives = Vec::with_capacity(file_plan.directives.len());
            for directive in &file_plan.directives {
                directives.push(resolve_directive(file, directive, &rpcs)?);
            }
            resolved.push(directives);
        }
    }

    let mut resolved = resolved.into_iter();
    for files in parsed.iter_mut() {
        for file in files.iter_mut() {
            for (node, directive) in resolved.next().into_iter().flatten() {
                if file.directives.insert(node, directive).is_some() {
                    return Err(PlanError::DuplicateDirective {
                        file: file.key.clone(),
                        start: file.tree.node(node).span.start - file.tree.base(),
                    });
                }
            }
        }
    }

    let packages: Vec<Package> = plan
        .packages
        .into_iter()
        .zip(parsed)
        .map(|(pkg, files)| Package {
            name: pkg.name,
            import_path: pkg.import_path,
            dir: root.join(pkg.dir),
            service: pkg.service.map(|name| Service { name }),
            secrets: pkg.secrets,
            files: files
                .into_iter()
                .map(|file| SourceFile {
                    id: file.id,
                    path: file.path,
                    tree: file.tree,
                    directives: file.directives,
                })
                .collect(),
        })
        .collect();

    debug!(
        packages = packages.len(),
        files = next_id,
        node_ids = ids.len(),
        "loaded rewrite plan"
    );

    Ok(Workspace { packages, ids })
}

/// First directive whose kind the rewriter does not handle. Runs before any
/// source file is read.
fn check_directive_kinds(plan: &RewritePlan) -> Result<(), PlanError> {
    for file in plan.packages.iter().flat_map(|pkg| &pkg.files) {
        if let Some(directive) = file
            .directives
            .iter()
            .find(|directive| !DIRECTIVE_KINDS.contains(&directive.kind.as_str()))
        {
            return Err(PlanError::UnknownDirective {
                kind: directive.kind.clone(),
                file: file.path.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_rpc(
    rpc: &RpcPlan,
    homes: &HashMap<&str, PackageRef>,
    file: &ParsedFile,
) -> Result<RpcTarget, PlanError> {
    let home = homes
        .get(rpc.package.as_str())
        .cloned()
        .ok_or_else(|| PlanError::UnknownPackage {
            import_path: rpc.package.clone(),
        })?;
    let span = absolute_span(file, rpc.span)?;
    let definition = find_kind(file, rpc.span, span, DEFINITION_KINDS)?;

    Ok(RpcTarget {
        service: rpc.service.clone(),
        name: rpc.name.clone(),
        definition: NodeRef::new(file.id, definition),
        home,
        signature: rpc.signature.clone(),
    })
}

fn resolve_directive(
    file: &ParsedFile,
    plan: &DirectivePlan,
    rpcs: &HashMap<String, RpcTarget>,
) -> Result<(NodeId, Directive), PlanError> {
    let span = absolute_span(file, plan.span)?;
    let find = |kinds: &'static [&'static str]| find_kind(file, plan.span, span, kinds);

    match plan.kind.as_str() {
        "database_handle" => Ok((find(CALL_KINDS)?, Directive::DatabaseHandle)),
        "log_annotation" => {
            let node = file
                .tree
                .find_by_span(span, None)
                .ok_or_else(|| unresolved(file, plan.span, "syntax"))?;
            Ok((node, Directive::LogAnnotation))
        }
        "remote_call" => {
            let node = find(CALL_KINDS)?;
            let key = plan.target.as_ref().ok_or_else(|| PlanError::MissingTarget {
                file: file.key.clone(),
                start: plan.span[0],
            })?;
            let target = rpcs.get(key).cloned().ok_or_else(|| PlanError::UnknownRpc {
                target: key.clone(),
                file: file.key.clone(),
            })?;
            Ok((node, Directive::RemoteCall(target)))
        }
        "remote_call_definition" => Ok((find(DEFINITION_KINDS)?, Directive::RemoteCallDefinition)),
        "secret_declaration" => Ok((find(SECRET_KINDS)?, Directive::SecretDeclaration)),
        other => Err(PlanError::UnknownDirective {
            kind: other.to_string(),
            file: file.key.clone(),
        }),
    }
}

fn lookup<'p>(
    index: &HashMap<PathBuf, (usize, usize)>,
    parsed: &'p [Vec<ParsedFile>],
    file: &Path,
) -> Result<&'p ParsedFile, PlanError> {
    let &(pkg_idx, file_idx) = index.get(file).ok_or_else(|| PlanError::UnknownFile {
        file: file.to_path_buf(),
    })?;
    Ok(&parsed[pkg_idx][file_idx])
}

/// First node spanning `span` whose kind is one of `kinds`, tried in order.
fn find_kind(
    file: &ParsedFile,
    local: [usize; 2],
    span: Span,
    kinds: &'static [&'static str],
) -> Result<NodeId, PlanError> {
    kinds
        .iter()
        .find_map(|kind| file.tree.find_by_span(span, Some(*kind)))
        .ok_or_else(|| unresolved(file, local, kinds[0]))
}

fn absolute_span(file: &ParsedFile, [start, end]: [usize; 2]) -> Result<Span, PlanError> {
    if start > end || end > file.tree.source().len() {
        return Err(PlanError::InvalidSpan {
            file: file.key.clone(),
            start,
            end,
        });
    }
    let base = file.tree.base();
    Ok(Span::new(base + start, base + end))
}

fn unresolved(file: &ParsedFile, [start, end]: [usize; 2], expected: &'static str) -> PlanError {
    PlanError::UnresolvedSpan {
        file: file.key.clone(),
        start,
        end,
        expected,
    }
}

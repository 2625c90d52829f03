use std::collections::HashMap;

use crate::syntax::literal::unquote;

/// Stable arena index of a syntax node within one [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Absolute byte span (`file base + offset`), end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Kind-specific structure the rewriter needs, resolved to arena ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDetail {
    None,
    /// `call_expression`: callee and absolute position of `(`.
    Call { function: NodeId, lparen: usize },
    /// `selector_expression`: `operand.field`.
    Selector { operand: NodeId, field: NodeId },
    /// `qualified_type`: `package.Name` in type position.
    QualifiedType { package: NodeId },
    /// `import_spec` with its optional local name and unquoted path.
    ImportSpec { alias: Option<String>, path: String },
    /// `var_spec` / `const_spec`.
    ValueSpec { ty: Option<NodeId>, has_value: bool },
}

#[derive(Debug, Clone)]
pub struct Node {
    /// tree-sitter node kind, e.g. `call_expression`
    pub kind: &'static str,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub detail: NodeDetail,
}

const DECLARATION_KINDS: &[&str] = &[
    "import_declaration",
    "function_declaration",
    "method_declaration",
    "var_declaration",
    "const_declaration",
    "type_declaration",
];

/// Arena copy of a parsed Go file. Named nodes only, stored in pre-order, so
/// iterating ids in ascending order is document order.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    base: usize,
    nodes: Vec<Node>,
    has_errors: bool,
}

impl SyntaxTree {
    pub(crate) fn build(root: tree_sitter::Node<'_>, source: String, base: usize) -> Self {
        let has_errors = root.has_error();
        let mut builder = Builder {
            source: &source,
            base,
            nodes: Vec::new(),
            by_ts_id: HashMap::new(),
        };
        builder.visit(root, None);
        let nodes = builder.nodes;

        Self {
            source,
            base,
            nodes,
            has_errors,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Source text covered by `id`.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.node(id).span;
        &self.source[span.start - self.base..span.end - self.base]
    }

    /// All node ids in document (pre-)order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// First node in document order covering exactly `span`, optionally
    /// restricted to one kind. Wrapper nodes share spans with their only
    /// child, so callers that care about the kind should pass it.
    pub fn find_by_span(&self, span: Span, kind: Option<&str>) -> Option<NodeId> {
        self.preorder().find(|&id| {
            let node = self.node(id);
            node.span == span && kind.map_or(true, |k| node.kind == k)
        })
    }

    /// Every node whose span equals `span`.
    pub fn all_by_span(&self, span: Span) -> Vec<NodeId> {
        self.preorder()
            .filter(|&id| self.node(id).span == span)
            .collect()
    }

    /// First top-level declaration (imports included), in document order.
    pub fn first_declaration(&self) -> Option<NodeId> {
        self.node(self.root())
            .children
            .iter()
            .copied()
            .find(|&id| DECLARATION_KINDS.contains(&self.node(id).kind))
    }

    /// Nearest ancestor (excluding `id` itself) of the given kind.
    pub fn ancestor(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if self.node(parent).kind == kind {
                return Some(parent);
            }
            current = self.node(parent).parent;
        }
        None
    }
}

struct Builder<'s> {
    source: &'s str,
    base: usize,
    nodes: Vec<Node>,
    by_ts_id: HashMap<usize, NodeId>,
}

impl Builder<'_> {
    fn visit(&mut self, ts: tree_sitter::Node<'_>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind: ts.kind(),
            span: Span::new(self.base + ts.start_byte(), self.base + ts.end_byte()),
            parent,
            children: Vec::new(),
            detail: NodeDetail::None,
        });
        self.by_ts_id.insert(ts.id(), id);

        let mut cursor = ts.walk();
        let named: Vec<tree_sitter::Node<'_>> = ts.named_children(&mut cursor).collect();
        let children = named
            .into_iter()
            .map(|child| self.visit(child, Some(id)))
            .collect();

        let detail = self.detail(ts);
        let node = &mut self.nodes[id.index()];
        node.children = children;
        node.detail = detail;
        id
    }

    fn field(&self, ts: tree_sitter::Node<'_>, name: &str) -> Option<NodeId> {
        ts.child_by_field_name(name)
            .and_then(|child| self.by_ts_id.get(&child.id()).copied())
    }

    fn detail(&self, ts: tree_sitter::Node<'_>) -> NodeDetail {
        match ts.kind() {
            "call_expression" => {
                let function = self.field(ts, "function");
                let arguments = ts.child_by_field_name("arguments");
                match (function, arguments) {
                    (Some(function), Some(arguments)) => NodeDetail::Call {
                        function,
                        lparen: self.base + arguments.start_byte(),
                    },
                    _ => NodeDetail::None,
                }
            }
            "selector_expression" => match (self.field(ts, "operand"), self.field(ts, "field")) {
                (Some(operand), Some(field)) => NodeDetail::Selector { operand, field },
                _ => NodeDetail::None,
            },
            "qualified_type" => match self.field(ts, "package") {
                Some(package) => NodeDetail::QualifiedType { package },
                None => NodeDetail::None,
            },
            "import_spec" => {
                let alias = ts
                    .child_by_field_name("name")
                    .map(|name| self.source[name.byte_range()].to_string());
                let path = ts
                    .child_by_field_name("path")
                    .and_then(|path| unquote(&self.source[path.byte_range()]));
                match path {
                    Some(path) => NodeDetail::ImportSpec { alias, path },
                    None => NodeDetail::None,
                }
            }
            "var_spec" | "const_spec" => NodeDetail::ValueSpec {
                ty: self.field(ts, "type"),
                has_value: ts.child_by_field_name("value").is_some(),
            },
            _ => NodeDetail::None,
        }
    }
}

//! Import liveness after remote call rewrites.
//!
//! A remote call `pkg.Proc(...)` becomes `__wrapper(...)`, which may remove
//! the last reference to `pkg`. Go rejects unused imports, so such imports
//! are deleted.

use crate::edit::{EditBuffer, EditError};
use crate::model::PackageRef;
use crate::syntax::{NodeDetail, NodeId, Span, SyntaxTree};
use std::collections::HashSet;
use tracing::debug;

/// Where a package is imported in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite<'t> {
    pub spec: NodeId,
    pub decl: NodeId,
    pub alias: Option<&'t str>,
    /// Number of specs in the enclosing declaration
    pub group_size: usize,
}

/// Delete imports of `candidates` that have no remaining qualified use,
/// ignoring the selector nodes in `consumed`. Returns the removed paths.
pub(crate) fn remove_unused(
    tree: &SyntaxTree,
    candidates: &[PackageRef],
    consumed: &HashSet<NodeId>,
    edits: &mut EditBuffer<'_>,
) -> Result<Vec<String>, EditError> {
    let mut removed = Vec::new();

    for pkg in candidates {
        // Not imported under this path: nothing to remove.
        let Some(site) = find_import(tree, &pkg.import_path) else {
            continue;
        };
        let name = match site.alias {
            // Side-effect and dot imports carry no qualified references
            Some("_") | Some(".") => continue,
            Some(alias) => alias,
            None => pkg.name.as_str(),
        };
        if uses_package(tree, name, consumed) {
            continue;
        }

        let span: Span = if site.group_size > 1 {
            tree.node(site.spec).span
        } else {
            tree.node(site.decl).span
        };
        edits.delete(span.start, span.end)?;
        debug!(import = %pkg.import_path, "removed unused import");
        removed.push(pkg.import_path.clone());
    }

    Ok(removed)
}

/// First import spec for `path`.
pub fn find_import<'t>(tree: &'t SyntaxTree, path: &str) -> Option<ImportSite<'t>> {
    tree.preorder().find_map(|id| match &tree.node(id).detail {
        NodeDetail::ImportSpec {
            alias,
            path: spec_path,
        } if spec_path == path => {
            let decl = tree.ancestor(id, "import_declaration")?;
            let parent = tree.node(id).parent?;
            let group_size = if tree.node(parent).kind == "import_spec_list" {
                tree.node(parent)
                    .children
                    .iter()
                    .filter(|&&child| tree.node(child).kind == "import_spec")
                    .count()
            } else {
                1
            };
            Some(ImportSite {
                spec: id,
                decl,
                alias: alias.as_deref(),
                group_size,
            })
        }
        _ => None,
    })
}

/// Whether any `name.X` reference remains, in expression or type position,
/// other than the selectors in `consumed`.
pub fn uses_package(tree: &SyntaxTree, name: &str, consumed: &HashSet<NodeId>) -> bool {
    tree.preorder().any(|id| match tree.node(id).detail {
        NodeDetail::Selector { operand, .. } => {
            !consumed.contains(&id)
                && tree.node(operand).kind == "identifier"
                && tree.text(operand) == name
        }
        NodeDetail::QualifiedType { package } => tree.text(package) == name,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GoParser;

    fn parse(source: &str) -> SyntaxTree {
        GoParser::new().unwrap().parse(source, 1).unwrap()
    }

    fn selector(tree: &SyntaxTree, text: &str) -> NodeId {
        tree.preorder()
            .find(|&id| {
                matches!(tree.node(id).detail, NodeDetail::Selector { .. }) && tree.text(id) == text
            })
            .unwrap()
    }

    fn payments() -> PackageRef {
        PackageRef {
            name: "payments".to_string(),
            import_path: "example.com/app/payments".to_string(),
        }
    }

    #[test]
    fn grouped_import_reports_group_size() {
        let tree = parse(
            "package a\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/payments\"\n)\n",
        );
        let site = find_import(&tree, "example.com/app/payments").unwrap();
        assert_eq!(site.group_size, 2);
        assert_eq!(site.alias, None);
        assert_eq!(tree.text(site.spec), "\"example.com/app/payments\"");
    }

    #[test]
    fn single_import_reports_whole_declaration() {
        let tree = parse("package a\n\nimport pay \"example.com/app/payments\"\n");
        let site = find_import(&tree, "example.com/app/payments").unwrap();
        assert_eq!(site.group_size, 1);
        assert_eq!(site.alias, Some("pay"));
        assert_eq!(
            tree.text(site.decl),
            "import pay \"example.com/app/payments\""
        );
    }

    #[test]
    fn consumed_selectors_do_not_count() {
        let tree = parse(
            "package a\n\nimport \"example.com/app/payments\"\n\nfunc f() { payments.Charge() }\n",
        );
        let sel = selector(&tree, "payments.Charge");
        assert!(uses_package(&tree, "payments", &HashSet::new()));
        assert!(!uses_package(&tree, "payments", &HashSet::from([sel])));
    }

    #[test]
    fn type_references_count_as_uses() {
        let tree = parse(
            "package a\n\nimport \"example.com/app/payments\"\n\nvar p *payments.Params\n",
        );
        assert!(uses_package(&tree, "payments", &HashSet::new()));
    }

    #[test]
    fn removes_single_import_declaration() {
        let source = "package a\n\nimport \"example.com/app/payments\"\n\nfunc f() { payments.Charge() }\n";
        let tree = parse(source);
        let consumed = HashSet::from([selector(&tree, "payments.Charge")]);
        let mut edits = EditBuffer::new(source.as_bytes(), 1);

        let removed = remove_unused(&tree, &[payments()], &consumed, &mut edits).unwrap();
        assert_eq!(removed, vec!["example.com/app/payments"]);
        assert_eq!(
            edits.materialize().unwrap(),
            "package a\n\n\n\nfunc f() { payments.Charge() }\n"
        );
    }

    #[test]
    fn removes_only_the_spec_from_a_group() {
        let source = "package a\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/payments\"\n)\n\nfunc f() { fmt.Println(); payments.Charge() }\n";
        let tree = parse(source);
        let consumed = HashSet::from([selector(&tree, "payments.Charge")]);
        let mut edits = EditBuffer::new(source.as_bytes(), 1);

        remove_unused(&tree, &[payments()], &consumed, &mut edits).unwrap();
        let out = edits.materialize().unwrap();
        assert!(out.contains("import (\n\t\"fmt\"\n\t\n)"));
    }

    #[test]
    fn missing_import_is_a_no_op() {
        let source = "package a\n\nfunc f() {}\n";
        let tree = parse(source);
        let mut edits = EditBuffer::new(source.as_bytes(), 1);
        let removed = remove_unused(&tree, &[payments()], &HashSet::new(), &mut edits).unwrap();
        assert!(removed.is_empty());
        assert!(edits.is_empty());
    }

    #[test]
    fn blank_imports_are_kept() {
        let source = "package a\n\nimport _ \"example.com/app/payments\"\n";
        let tree = parse(source);
        let mut edits = EditBuffer::new(source.as_bytes(), 1);
        let removed = remove_unused(&tree, &[payments()], &HashSet::new(), &mut edits).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn alias_is_used_for_lookup() {
        let source = "package a\n\nimport pay \"example.com/app/payments\"\n\nfunc f() { pay.Refund() }\n";
        let tree = parse(source);
        let mut edits = EditBuffer::new(source.as_bytes(), 1);
        let removed = remove_unused(&tree, &[payments()], &HashSet::new(), &mut edits).unwrap();
        assert!(removed.is_empty());
    }
}

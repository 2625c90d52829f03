use crate::syntax::errors::SyntaxError;
use crate::syntax::tree::SyntaxTree;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::Parser;

/// Tree-sitter parser wrapper for Go source code.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = SupportLang::Go.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| SyntaxError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse `source` into an arena tree whose spans start at `base`.
    ///
    /// Syntax errors do not fail the parse; check [`SyntaxTree::has_errors`]
    /// or use [`parse_strict`](Self::parse_strict).
    pub fn parse(
        &mut self,
        source: impl Into<String>,
        base: usize,
    ) -> Result<SyntaxTree, SyntaxError> {
        let source = source.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or(SyntaxError::ParseFailed)?;
        let root = tree.root_node();
        Ok(SyntaxTree::build(root, source, base))
    }

    /// Parse and reject sources containing ERROR or MISSING nodes.
    pub fn parse_strict(
        &mut self,
        source: impl Into<String>,
        base: usize,
    ) -> Result<SyntaxTree, SyntaxError> {
        let source = source.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or(SyntaxError::ParseFailed)?;
        if let Some((byte_start, byte_end)) = first_error(tree.root_node()) {
            return Err(SyntaxError::Malformed {
                byte_start,
                byte_end,
            });
        }
        Ok(SyntaxTree::build(tree.root_node(), source, base))
    }
}

fn first_error(node: tree_sitter::Node<'_>) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        return Some((node.start_byte(), node.end_byte()));
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }

    None
}

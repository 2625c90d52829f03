//! Go syntax front-end.
//!
//! Source is parsed with the tree-sitter Go grammar and copied into an arena
//! ([`SyntaxTree`]) whose nodes are addressed by stable [`NodeId`]s. All maps
//! that outlive a single traversal key nodes by id, never by reference.

pub mod errors;
pub mod literal;
pub mod parser;
pub mod tree;

pub use errors::SyntaxError;
pub use literal::{quote, unquote};
pub use parser::GoParser;
pub use tree::{Node, NodeDetail, NodeId, Span, SyntaxTree};

//! Rewrite plans: the classifier's output in JSON form.
//!
//! A plan names packages, their files and the directives for individual
//! nodes, addressed by byte span. Loading parses every file and resolves the
//! spans to arena [`NodeId`](crate::syntax::NodeId)s.

pub mod errors;
pub mod loader;
pub mod schema;

pub use errors::PlanError;
pub use loader::{load_from_path, load_from_str, resolve, Workspace};
pub use schema::{DirectivePlan, FilePlan, NodeIdPlan, PackagePlan, RewritePlan, RpcPlan};

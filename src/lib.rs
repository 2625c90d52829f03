//! go-rewrite: the rewrite stage of a service-framework build.
//!
//! Application packages arrive parsed, with a directive attached to every
//! syntax node the framework needs to change. The rewriter turns those
//! directives into byte-span edits on the original text, keeps every edited
//! region traceable with `/*line :L:C*/` markers, drops imports that the
//! rewrite left unused, and emits one generated unit of forwarding wrappers per
//! package that makes remote calls.
//!
//! # Architecture
//!
//! All source changes compile down to a single primitive: an [`Edit`] recorded
//! in an [`EditBuffer`] against the unchanged original. Nothing is rewritten
//! in place; the buffer is materialized once per file after all directives
//! have been dispatched.
//!
//! - [`syntax`]: Go parsing into an arena tree addressed by [`NodeId`]
//! - [`plan`]: loading the classifier output and resolving it to nodes
//! - [`rewrite`]: directive dispatch, import liveness and wrapper generation
//! - [`output`]: atomic writes and overlay reporting
//!
//! # Example
//!
//! ```no_run
//! use go_rewrite::{plan, rewrite_package, write_package, RewriteConfig};
//! use std::path::Path;
//!
//! let workspace = plan::load_from_path("build/plan.json")?;
//! let config = RewriteConfig::default();
//! for pkg in &workspace.packages {
//!     let rewrite = rewrite_package(pkg, &workspace.ids, &config)?;
//!     for overlay in write_package(&rewrite, Path::new("build/out"))? {
//!         println!("{} -> {}", overlay.original.display(), overlay.rewritten.display());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod edit;
pub mod marker;
pub mod model;
pub mod output;
pub mod plan;
pub mod rewrite;
pub mod syntax;

// Re-exports
pub use config::{ConfigError, RewriteConfig};
pub use edit::{Edit, EditBuffer, EditError};
pub use marker::{scan_markers, LineIndex, LineMarker};
pub use model::{
    Directive, FileId, IdRegistry, NodeIds, NodeRef, Package, PackageRef, RpcTarget, Service,
    Signature, SourceFile,
};
pub use output::{write_package, Overlay};
pub use plan::{PlanError, Workspace};
pub use rewrite::{rewrite_file, rewrite_package, PackageRewrite, RewriteError, RewrittenFile};
pub use syntax::{GoParser, NodeId, Span, SyntaxError, SyntaxTree};

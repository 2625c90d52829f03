//! Package rewriting.
//!
//! For each file with at least one directive the dispatcher records edits,
//! the liveness pass appends import deletions, and the edit buffer is
//! materialized. Remote call targets accumulate in one [`WrapperSet`] per
//! package, rendered into a single generated unit at the end.
//!
//! Rewriting is pure: nothing touches the filesystem until
//! [`crate::output::write_package`] is called with the result, so a failed
//! package leaves no output behind.

mod dispatch;
pub mod errors;
pub mod imports;
pub mod wrappers;

pub use errors::RewriteError;
pub use imports::{find_import, uses_package, ImportSite};
pub use wrappers::{generate, wrapper_name, GeneratedFile, WrapperSet};

use crate::config::RewriteConfig;
use crate::model::{NodeIds, Package, SourceFile};
use dispatch::{DispatchOutcome, Dispatcher};
use std::path::PathBuf;
use tracing::{debug, info};

/// One rewritten source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFile {
    /// Path of the original file
    pub original: PathBuf,
    pub contents: String,
    /// Number of edits applied, import deletions included
    pub edits: usize,
    /// Import paths deleted because they became unused
    pub removed_imports: Vec<String>,
}

/// Everything produced for one package.
#[derive(Debug, Clone)]
pub struct PackageRewrite {
    pub import_path: String,
    pub dir: PathBuf,
    pub files: Vec<RewrittenFile>,
    pub wrappers: Option<GeneratedFile>,
}

/// Rewrite every file of `pkg` that carries directives and render its
/// wrapper unit. Files are processed in declaration order, so wrapper order
/// follows the first call of each target in that order.
pub fn rewrite_package(
    pkg: &Package,
    ids: &dyn NodeIds,
    config: &RewriteConfig,
) -> Result<PackageRewrite, RewriteError> {
    let mut wrappers = WrapperSet::new();
    let mut files = Vec::new();

    for file in &pkg.files {
        if file.directives.is_empty() {
            continue;
        }
        files.push(rewrite_file(pkg, file, ids, config, &mut wrappers)?);
    }

    let generated = generate(pkg, &wrappers, config);
    info!(
        package = %pkg.import_path,
        files = files.len(),
        wrappers = wrappers.len(),
        "rewrote package"
    );

    Ok(PackageRewrite {
        import_path: pkg.import_path.clone(),
        dir: pkg.dir.clone(),
        files,
        wrappers: generated,
    })
}

/// Rewrite one file, adding its remote call targets to `wrappers`.
///
/// A file without directives comes back byte-identical.
pub fn rewrite_file(
    pkg: &Package,
    file: &SourceFile,
    ids: &dyn NodeIds,
    config: &RewriteConfig,
    wrappers: &mut WrapperSet,
) -> Result<RewrittenFile, RewriteError> {
    let DispatchOutcome {
        mut edits,
        candidates,
        consumed,
    } = Dispatcher::new(pkg, file, ids, config, wrappers).run()?;

    let edit_error = |source| RewriteError::Edit {
        file: file.path.clone(),
        source,
    };
    let removed_imports =
        imports::remove_unused(&file.tree, &candidates, &consumed, &mut edits)
            .map_err(edit_error)?;
    let contents = edits.materialize().map_err(edit_error)?;

    debug!(
        file = %file.path.display(),
        edits = edits.len(),
        removed_imports = removed_imports.len(),
        "rewrote file"
    );

    Ok(RewrittenFile {
        original: file.path.clone(),
        contents,
        edits: edits.len(),
        removed_imports,
    })
}

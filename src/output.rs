//! Writing rewritten packages and reporting overlays.

use crate::rewrite::{PackageRewrite, RewriteError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rewritten file that replaces `original` in the downstream build.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Overlay {
    pub original: PathBuf,
    pub rewritten: PathBuf,
}

/// Write every file of `rewrite` into `target_dir` and return the overlays.
///
/// Rewritten files keep their base name. The wrapper unit is written as
/// `target_dir/<file name>` and overlays `<package dir>/<file name>`.
/// On failure, files already written are left for the caller to discard.
pub fn write_package(
    rewrite: &PackageRewrite,
    target_dir: &Path,
) -> Result<Vec<Overlay>, RewriteError> {
    fs::create_dir_all(target_dir).map_err(|source| RewriteError::Io {
        path: target_dir.to_path_buf(),
        source,
    })?;

    let mut overlays = Vec::with_capacity(rewrite.files.len() + 1);
    for file in &rewrite.files {
        let name = file.original.file_name().ok_or_else(|| RewriteError::Io {
            path: file.original.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "source path has no file name",
            ),
        })?;
        let dst = target_dir.join(name);
        atomic_write(&dst, file.contents.as_bytes())?;
        debug!(from = %file.original.display(), to = %dst.display(), "wrote overlay");
        overlays.push(Overlay {
            original: file.original.clone(),
            rewritten: dst,
        });
    }

    if let Some(generated) = &rewrite.wrappers {
        let dst = target_dir.join(&generated.file_name);
        atomic_write(&dst, generated.contents.as_bytes())?;
        debug!(to = %dst.display(), wrappers = generated.wrappers, "wrote wrappers");
        overlays.push(Overlay {
            original: rewrite.dir.join(&generated.file_name),
            rewritten: dst,
        });
    }

    Ok(overlays)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Readers either see the previous file or the complete new one.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), RewriteError> {
    let io_error = |source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Create tempfile in same directory to ensure same filesystem
    let parent = path.parent().ok_or_else(|| {
        io_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
    temp.write_all(content).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;

    Ok(())
}

//src/output.rs

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{ProfileError, Result};

/// Writes `path` through a temporary file in the same directory, which is
/// renamed into place only after `fill` succeeds. On any failure the
/// destination is left as it was.
pub(crate) fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    if path.is_dir() {
        return Err(ProfileError::write(
            path,
            io::Error::new(io::ErrorKind::Other, "destination is a directory"),
        ));
    }
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".metaprofile-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| ProfileError::write(path, e))?;

    fill(&mut tmp)?;
    tmp.persist(path).map_err(|e| ProfileError::write(path, e.error))?;
    Ok(())
}

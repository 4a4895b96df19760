//! File-system sink for generated artifacts.
//!
//! Generated configs point at key material and management sockets, and the
//! key material itself lands in the same tree: directories are created
//! 0700, files written 0600. Writes are full overwrites, not transactional;
//! callers own redeploy semantics.

use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use crate::error::CoreError;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CoreError + '_ {
    move |source| CoreError::Io {
        path: path.to_owned(),
        source,
    }
}

/// Create a directory (and parents) with mode 0700. Existing directories
/// are left untouched.
pub fn create_dir(path: &Path) -> Result<(), CoreError> {
    if path.is_dir() {
        return Ok(());
    }
    DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
        .map_err(io_err(path))
}

/// Write (or fully overwrite) a file with mode 0600.
pub fn write_file(path: &Path, contents: &str) -> Result<(), CoreError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(io_err(path))?;
    file.write_all(contents.as_bytes()).map_err(io_err(path))
}

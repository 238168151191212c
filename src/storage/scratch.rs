//! Per-request scratch files for downloaded documents.

use std::path::{Path, PathBuf};

/// A downloaded document living in its own scratch directory.
///
/// Each fetch gets a fresh directory, so concurrent fetches of the same key never share a
/// path. The directory is removed when the handle is dropped; removal is a blocking
/// filesystem call on the dropping thread, sized for a single downloaded document.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    dir: PathBuf,
}

impl ScratchFile {
    pub(crate) fn new(dir: PathBuf, file_name: &str) -> Self {
        let path = dir.join(file_name);
        Self { path, dir }
    }

    /// Location of the downloaded file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_dir_all(&self.dir)
            && error.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(dir = %self.dir.display(), error = %error, "Failed to clean scratch directory");
        }
    }
}

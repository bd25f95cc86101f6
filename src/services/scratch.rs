use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;

const SCRATCH_PREFIX: &str = "phash-";

/// A uniquely named file on local scratch storage.
///
/// The file is removed when the handle is dropped, so every exit path of an
/// invocation releases it. `remove` does the same but reports failures.
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
    size: u64,
}

impl ScratchFile {
    /// Create an empty scratch file in `dir`, returning the handle and a
    /// writable file
    pub fn create_in(dir: &Path) -> io::Result<(Self, File)> {
        let (file, path) = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempfile_in(dir)?
            .into_parts();

        Ok((Self { path, size: 0 }, File::from_std(file)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.path.to_path_buf()
    }

    pub fn remove(self) -> io::Result<()> {
        self.path.close()
    }
}

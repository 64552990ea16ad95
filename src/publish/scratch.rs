use anyhow::{bail, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Converted output sitting next to its input. Removed when dropped,
/// whether or not the upload went through.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// `dir/name.csv` -> `dir/name.geojson`.
    pub fn for_input(input: &Path) -> Result<Self> {
        let path = input.with_extension("geojson");
        if path == input {
            bail!(
                "refusing to convert {} onto itself",
                input.display()
            );
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed scratch file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove scratch file"),
        }
    }
}

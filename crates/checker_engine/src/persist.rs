use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid file name: {0:?}")]
    FileName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes `{dir}/{filename}` through a temp file in the same directory, then renames it,
/// so readers never see a partial report or state file.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        // Submission ids end up in file names; never let them escape the directory.
        if filename.is_empty()
            || filename.contains(&['/', '\\'][..])
            || filename == "."
            || filename == ".."
        {
            return Err(PersistError::FileName(filename.to_owned()));
        }
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_warn};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
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
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// A download in progress.
///
/// Bytes go to a hidden temp file next to the destination, which only takes
/// the destination name on [`PartialFile::commit`]. Dropping an uncommitted
/// file removes it, which is what cleans up after an interrupted run.
pub struct PartialFile {
    temp: Option<NamedTempFile>,
    file: Option<tokio::fs::File>,
    destination: PathBuf,
}

impl PartialFile {
    pub fn create(destination: &Path) -> Result<Self, PersistError> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".rrip-")
            .suffix(".part")
            .tempfile_in(dir)?;
        let file = tokio::fs::File::from_std(temp.reopen()?);
        engine_debug!("writing {} via {}", destination.display(), temp.path().display());
        Ok(Self {
            temp: Some(temp),
            file: Some(file),
            destination: destination.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> Option<&Path> {
        self.temp.as_ref().map(NamedTempFile::path)
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes).await,
            None => Err(io::Error::other("file already closed")),
        }
    }

    /// Flush and move the file to its destination. Fails rather than replace
    /// a file that appeared there meanwhile.
    pub async fn commit(mut self) -> Result<PathBuf, PersistError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        let temp = self
            .temp
            .take()
            .ok_or_else(|| io::Error::other("file already committed"))?;
        temp.persist_noclobber(&self.destination)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.destination.clone())
    }

    /// Remove the partial file.
    pub fn discard(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        self.file.take();
        if let Some(temp) = self.temp.take() {
            engine_warn!(
                "Removing possibly incomplete file: '{}'",
                self.destination.display()
            );
            if let Err(err) = temp.close() {
                engine_warn!("Error removing file: {err}");
            }
        }
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        self.remove();
    }
}

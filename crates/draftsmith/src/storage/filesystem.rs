use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

const TEMPLATES_DIR: &str = "templates";
const DOCUMENTS_DIR: &str = "documents";

/// Filesystem artifact store.
///
/// Layout under the root:
///
/// ```text
/// templates/<uuid>.<ext>                     uploaded templates
/// documents/<job_id>/assignment-<job_id>.*   generated artifacts
/// ```
///
/// Every write uses `create_new`, so an existing artifact is never replaced.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores an uploaded template under a fresh unique name.
    pub fn store_template(&self, content: &[u8], extension: &str) -> Result<PathBuf, StorageError> {
        let dir = self.root.join(TEMPLATES_DIR);
        self.ensure_directory(&dir)?;

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), extension.to_lowercase());
        let path = dir.join(filename);
        self.write_new(&path, content)?;
        Ok(path)
    }

    /// Directory holding all artifacts of one job. Created on demand.
    pub fn job_directory(&self, job_id: &str) -> Result<PathBuf, StorageError> {
        let dir = self.root.join(DOCUMENTS_DIR).join(job_id);
        self.ensure_directory(&dir)?;
        Ok(dir)
    }

    /// Path of a job's artifact with the given extension.
    pub fn job_artifact_path(&self, job_id: &str, extension: &str) -> PathBuf {
        self.root
            .join(DOCUMENTS_DIR)
            .join(job_id)
            .join(artifact_file_name(job_id, extension))
    }

    /// Writes `content` to a path that must not exist yet.
    pub fn write_new(&self, path: &Path, content: &[u8]) -> Result<(), StorageError> {
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut file) => file.write_all(content).map_err(|e| StorageError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::FileExists(path.to_path_buf()))
            }
            Err(e) => Err(StorageError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Removes an artifact. A file that is already gone is not an error.
    pub fn remove(&self, path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Artifact already removed: {}", path.display());
                Ok(())
            }
            Err(e) => Err(StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// `assignment-<job_id>.<ext>`
pub fn artifact_file_name(job_id: &str, extension: &str) -> String {
    format!("assignment-{}.{}", job_id, extension)
}

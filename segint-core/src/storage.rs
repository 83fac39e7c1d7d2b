//! Payload blob store
//!
//! File-backed storage for raw input and output payloads, shared by the
//! server (writes inputs, reads/deletes on retrieval) and the worker (reads
//! inputs, writes outputs). Records reference blobs by relative path;
//! filenames embed the job identity. Blobs are immutable once written.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

const INPUT_DIR: &str = "segmentation";
const OUTPUT_DIR: &str = "results";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob store i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A blob reference escapes the store root.
    #[error("invalid blob reference: {0}")]
    InvalidRef(String),
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> BlobStore {
        BlobStore { root: root.into() }
    }

    /// Creates the store layout. Called once at process start.
    pub fn ensure_layout(&self) -> Result<(), StorageError> {
        for dir in [INPUT_DIR, OUTPUT_DIR] {
            let path = self.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| io_err(&path, e))?;
        }
        Ok(())
    }

    /// Persists a raw `ModelInput` payload and returns its blob reference.
    pub fn write_input(&self, job_id: Uuid, bytes: &[u8]) -> Result<String, StorageError> {
        let blob_ref = format!("{INPUT_DIR}/Segmentation_{job_id}.bin");
        self.write(&blob_ref, bytes)?;
        Ok(blob_ref)
    }

    /// Persists a serialized `ModelOutput` payload and returns its blob
    /// reference.
    pub fn write_output(&self, job_id: Uuid, bytes: &[u8]) -> Result<String, StorageError> {
        let blob_ref = format!("{OUTPUT_DIR}/Result_{job_id}.bin");
        self.write(&blob_ref, bytes)?;
        Ok(blob_ref)
    }

    pub fn read(&self, blob_ref: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(blob_ref)?;
        fs::read(&path).map_err(|e| io_err(&path, e))
    }

    /// Removes a blob. A missing blob is not an error: deletion runs after
    /// the record delete commits, so a crash in between may leave the blob
    /// half-cleaned and a retry must be able to finish the job.
    pub fn remove(&self, blob_ref: &str) -> Result<(), StorageError> {
        let path = self.resolve(blob_ref)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    fn write(&self, blob_ref: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(blob_ref)?;
        fs::write(&path, bytes).map_err(|e| io_err(&path, e))
    }

    fn resolve(&self, blob_ref: &str) -> Result<PathBuf, StorageError> {
        if blob_ref.is_empty()
            || Path::new(blob_ref).is_absolute()
            || blob_ref.split('/').any(|part| part == "..")
        {
            return Err(StorageError::InvalidRef(blob_ref.to_string()));
        }
        Ok(self.root.join(blob_ref))
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> BlobStore {
        let root = std::env::temp_dir().join(format!("segint-store-{}", Uuid::new_v4()));
        let store = BlobStore::new(root);
        store.ensure_layout().unwrap();
        store
    }

    #[test]
    fn test_write_read_remove_input() {
        let store = temp_store();
        let id = Uuid::new_v4();

        let blob_ref = store.write_input(id, b"payload").unwrap();
        assert!(blob_ref.contains(&id.to_string()));
        assert_eq!(store.read(&blob_ref).unwrap(), b"payload");

        store.remove(&blob_ref).unwrap();
        assert!(store.read(&blob_ref).is_err());
        // Removing again is not an error.
        store.remove(&blob_ref).unwrap();
    }

    #[test]
    fn test_output_ref_embeds_job_id() {
        let store = temp_store();
        let id = Uuid::new_v4();
        let blob_ref = store.write_output(id, b"result").unwrap();
        assert_eq!(blob_ref, format!("results/Result_{id}.bin"));
    }

    #[test]
    fn test_rejects_escaping_refs() {
        let store = temp_store();
        assert!(matches!(
            store.read("../outside.bin"),
            Err(StorageError::InvalidRef(_))
        ));
        assert!(matches!(
            store.read("/etc/passwd"),
            Err(StorageError::InvalidRef(_))
        ));
    }
}

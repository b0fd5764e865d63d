// Blob and record stores: where photos come from and where reports go.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde_json::Value;

use crate::error::BoundaryError;

pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Vec<u8>, BoundaryError>;

    /// Store `bytes` under `key`; returns a locator the caller can hand out.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, BoundaryError>;
}

pub trait RecordStore: Send + Sync {
    fn put(&self, collection: &str, key: &str, record: &Value) -> Result<(), BoundaryError>;

    fn get(&self, collection: &str, key: &str) -> Result<Value, BoundaryError>;
}

/// Reject keys that would escape the store root.
fn relative_key(key: &str) -> Result<PathBuf, BoundaryError> {
    let path = Path::new(key);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if key.is_empty() || escapes {
        return Err(BoundaryError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid storage key '{}'", key),
        )));
    }
    Ok(path.to_path_buf())
}

fn not_found_or_io(key: &str, e: io::Error) -> BoundaryError {
    if e.kind() == io::ErrorKind::NotFound {
        BoundaryError::NotFound(key.to_string())
    } else {
        BoundaryError::Io(e)
    }
}

// ============================================================================
// In-memory stores
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), (bytes, "application/octet-stream".to_string()));
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.get(key).map(|(_, ct)| ct.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = blobs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, BoundaryError> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| BoundaryError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, BoundaryError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(format!("memory://{}", key))
    }
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    fn put(&self, collection: &str, key: &str, record: &Value) -> Result<(), BoundaryError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert((collection.to_string(), key.to_string()), record.clone());
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> Result<Value, BoundaryError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .get(&(collection.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BoundaryError::NotFound(format!("{}/{}", collection, key)))
    }
}

// ============================================================================
// Filesystem stores
// ============================================================================

/// Blobs as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, BoundaryError> {
        let path = self.root.join(relative_key(key)?);
        fs::read(&path).map_err(|e| not_found_or_io(key, e))
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, BoundaryError> {
        let path = self.root.join(relative_key(key)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!("stored {} ({}, {} bytes)", path.display(), content_type, bytes.len());
        Ok(path.display().to_string())
    }
}

/// Records as pretty-printed JSON files, one directory per collection.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, collection: &str, key: &str) -> Result<PathBuf, BoundaryError> {
        Ok(self
            .root
            .join(relative_key(collection)?)
            .join(relative_key(&format!("{}.json", key))?))
    }
}

impl RecordStore for FsRecordStore {
    fn put(&self, collection: &str, key: &str, record: &Value) -> Result<(), BoundaryError> {
        let path = self.path(collection, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> Result<Value, BoundaryError> {
        let path = self.path(collection, key)?;
        let text = fs::read_to_string(&path).map_err(|e| not_found_or_io(key, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn memory_blob_store_round_trip() {
        let store = MemoryBlobStore::new();
        let locator = store.put("reports/a.pdf", b"%PDF", "application/pdf").unwrap();
        assert_eq!(locator, "memory://reports/a.pdf");
        assert_eq!(store.get("reports/a.pdf").unwrap(), b"%PDF");
        assert_eq!(store.content_type("reports/a.pdf").unwrap(), "application/pdf");
        assert!(matches!(store.get("missing"), Err(BoundaryError::NotFound(_))));
    }

    #[test]
    fn fs_blob_store_creates_directories() {
        let root = tempdir().unwrap();
        let store = FsBlobStore::new(root.path());
        store.put("reports/x/y.pdf", b"data", "application/pdf").unwrap();
        assert!(root.path().join("reports/x/y.pdf").is_file());
        assert_eq!(store.get("reports/x/y.pdf").unwrap(), b"data");
        assert!(matches!(store.get("reports/none.pdf"), Err(BoundaryError::NotFound(_))));
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let root = tempdir().unwrap();
        let store = FsBlobStore::new(root.path().join("blobs"));
        assert!(store.get("../etc/passwd").is_err());
        assert!(store.get("/etc/passwd").is_err());
        assert!(store.put("../outside.pdf", b"data", "application/pdf").is_err());
        assert!(!root.path().join("outside.pdf").exists());
    }

    #[test]
    fn fs_record_store_round_trip() {
        let root = tempdir().unwrap();
        let store = FsRecordStore::new(root.path());
        let record = json!({"reportId": "INS-1", "pageCount": 3});
        store.put("inspections", "INS-1", &record).unwrap();
        assert_eq!(store.get("inspections", "INS-1").unwrap(), record);
        assert!(matches!(store.get("inspections", "INS-2"), Err(BoundaryError::NotFound(_))));
    }
}

//! File-backed storage: list, get, create, update, delete reading records.
//!
//! The whole store is one JSON array rewritten on every change. A mutex
//! serializes read-modify-write cycles within the process.

use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use reading_log_core::reading::{ReadingPatch, ReadingRecord};

pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file (and its directory) holding an empty list if missing.
    pub fn ensure_file(&self) -> std::io::Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, b"[]")
    }

    /// All records. A missing file or one that is not JSON reads as empty;
    /// JSON holding entries that do not fit a record is `InvalidData`.
    pub fn list(&self) -> std::io::Result<Vec<ReadingRecord>> {
        let _guard = self.guard();
        self.read_all()
    }

    pub fn get(&self, id: &str) -> std::io::Result<Option<ReadingRecord>> {
        let _guard = self.guard();
        Ok(self.read_all()?.into_iter().find(|r| r.id == id))
    }

    /// Store a new record, assigning an id when it has none.
    pub fn create(&self, mut record: ReadingRecord) -> std::io::Result<ReadingRecord> {
        let _guard = self.guard();
        let mut records = self.read_all()?;
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().as_simple().to_string();
        } else if records.iter().any(|r| r.id == record.id) {
            return Err(Error::new(ErrorKind::AlreadyExists, format!("record {} already exists", record.id)));
        }
        record.stamp_created();
        records.push(record.clone());
        self.write_all(&records)?;
        tracing::info!(id = %record.id, isbn = %record.isbn, "record created");
        Ok(record)
    }

    /// Merge `patch` into the record with `id`. `Ok(None)` when there is none.
    pub fn update(&self, id: &str, patch: ReadingPatch) -> std::io::Result<Option<ReadingRecord>> {
        let _guard = self.guard();
        let mut records = self.read_all()?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        record.apply(patch);
        let updated = record.clone();
        self.write_all(&records)?;
        tracing::info!(id, "record updated");
        Ok(Some(updated))
    }

    /// Remove the record with `id`; returns whether one was removed.
    pub fn delete(&self, id: &str) -> std::io::Result<bool> {
        let _guard = self.guard();
        let mut records = self.read_all()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_all(&records)?;
        tracing::info!(id, "record deleted");
        Ok(true)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_all(&self) -> std::io::Result<Vec<ReadingRecord>> {
        let data = match std::fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let value: serde_json::Value = match serde_json::from_slice(&data) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "record file is not JSON, treating as empty");
                return Ok(Vec::new());
            }
        };
        // Off-schema entries are an error, never an empty list to write back.
        serde_json::from_value(value).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "record file holds invalid records");
            Error::new(ErrorKind::InvalidData, e)
        })
    }

    /// Write through a sibling temp file so a crash never leaves half a list.
    fn write_all(&self, records: &[ReadingRecord]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(records).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }
}

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const RECORDS_FILE_NAME: &str = "records.json";

/// Key-value persistence for the single best-moves record.
pub trait BestScoreStore {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<u32>, StoreError>;
    fn save(&mut self, best_moves: u32) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Records {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_moves: Option<u32>,
}

/// Stores records as a small JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(RECORDS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Records, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Records::default()),
            Err(err) => Err(err.into()),
        }
    }
}

impl BestScoreStore for JsonFileStore {
    fn load(&self) -> Result<Option<u32>, StoreError> {
        Ok(self.read()?.best_moves)
    }

    fn save(&mut self, best_moves: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let records = Records {
            best_moves: Some(best_moves),
        };
        let raw = serde_json::to_string_pretty(&records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a caller can keep a
/// handle and observe what the game wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    best_moves: Rc<Cell<Option<u32>>>,
    writes: Rc<Cell<u32>>,
}

impl MemoryStore {
    pub fn with_best(best_moves: u32) -> Self {
        let store = MemoryStore::default();
        store.best_moves.set(Some(best_moves));
        store
    }

    pub fn best_moves(&self) -> Option<u32> {
        self.best_moves.get()
    }

    /// Number of successful `save` calls.
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl BestScoreStore for MemoryStore {
    fn load(&self) -> Result<Option<u32>, StoreError> {
        Ok(self.best_moves.get())
    }

    fn save(&mut self, best_moves: u32) -> Result<(), StoreError> {
        self.best_moves.set(Some(best_moves));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_unset() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn saved_best_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pairs");
        let mut store = JsonFileStore::in_dir(&nested);
        store.save(12).unwrap();
        store.save(9).unwrap();

        let reopened = JsonFileStore::in_dir(&nested);
        assert_eq!(reopened.load().unwrap(), Some(9));
    }

    #[test]
    fn file_without_key_is_unset() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), "{}").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_reports_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), "best_moves=4").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn memory_store_clones_share_state() {
        let observer = MemoryStore::default();
        let mut writer = observer.clone();
        writer.save(7).unwrap();
        assert_eq!(observer.best_moves(), Some(7));
        assert_eq!(observer.writes(), 1);
    }
}

//! Win/loss persistence keyed by a player's stable identity.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store i/o: {0}")]
    Io(#[from] io::Error),
    #[error("score store encoding: {0}")]
    Codec(#[from] bincode::Error),
}

/// Load/save contract for persisted scores.
pub trait ScoreStore: Send + Sync {
    fn load(&self, identity: &str) -> Result<Option<ScoreRecord>, StoreError>;
    fn save(&self, identity: &str, record: &ScoreRecord) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<Vec<(String, ScoreRecord)>, StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Keeps scores for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ScoreRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self, identity: &str) -> Result<Option<ScoreRecord>, StoreError> {
        Ok(lock(&self.records).get(identity).cloned())
    }

    fn save(&self, identity: &str, record: &ScoreRecord) -> Result<(), StoreError> {
        lock(&self.records).insert(identity.to_string(), record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, ScoreRecord)>, StoreError> {
        Ok(lock(&self.records)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Scores kept in memory and mirrored to a single bincode file.
///
/// Every save rewrites the file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Mutex<HashMap<String, ScoreRecord>>,
}

impl FileStore {
    /// Opens (or creates) the store at `path`. With `reset`, existing scores
    /// are discarded.
    pub fn open(path: impl AsRef<Path>, reset: bool) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if reset {
            info!("Resetting all scores in {}", path.display());
            HashMap::new()
        } else {
            match fs::read(&path) {
                Ok(bytes) => bincode::deserialize(&bytes)?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
                Err(e) => return Err(e.into()),
            }
        };
        info!(
            "Score store {} holds {} players",
            path.display(),
            records.len()
        );

        let store = Self {
            path,
            records: Mutex::new(records),
        };
        if reset {
            store.flush(&lock(&store.records))?;
        }
        Ok(store)
    }

    fn flush(&self, records: &HashMap<String, ScoreRecord>) -> Result<(), StoreError> {
        let bytes = bincode::serialize(records)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ScoreStore for FileStore {
    fn load(&self, identity: &str) -> Result<Option<ScoreRecord>, StoreError> {
        Ok(lock(&self.records).get(identity).cloned())
    }

    fn save(&self, identity: &str, record: &ScoreRecord) -> Result<(), StoreError> {
        let mut records = lock(&self.records);
        records.insert(identity.to_string(), record.clone());
        if let Err(e) = self.flush(&records) {
            warn!("Failed to write {}: {}", self.path.display(), e);
            return Err(e);
        }
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, ScoreRecord)>, StoreError> {
        Ok(lock(&self.records)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

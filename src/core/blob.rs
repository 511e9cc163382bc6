use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension};

use crate::core::error::{MailError, Result};

/// Opaque key → string storage the mailbox is persisted into.
pub trait BlobStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Schema DDL run on open.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS blobs (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const DB_FILE: &str = "mailstate.db";

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Open (or create) `mailstate.db` inside `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            MailError::Persistence(format!("Failed to create data dir {}: {e}", dir.display()))
        })?;
        let db_file = dir.join(DB_FILE);
        let conn = Connection::open(&db_file)
            .map_err(|e| MailError::Persistence(format!("Failed to open blob db: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| MailError::Persistence(format!("Failed to init blob schema: {e}")))?;
        log::debug!("Opened blob store at {}", db_file.display());
        Ok(SqliteBlobStore { conn })
    }

    /// In-memory database, gone when dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteBlobStore { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| MailError::Persistence(format!("Blob load error: {e}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO blobs (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )
            .map_err(|e| MailError::Persistence(format!("Blob save error: {e}")))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON files
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key.
pub struct JsonFileBlobStore {
    dir: PathBuf,
}

impl JsonFileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileBlobStore { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for JsonFileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| MailError::Persistence(format!("read {}: {e}", path.display())))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            MailError::Persistence(format!("create {}: {e}", self.dir.display()))
        })?;
        let path = self.path(key);
        // Write aside and rename so a crash never leaves a half-written blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .map_err(|e| MailError::Persistence(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| MailError::Persistence(format!("rename {}: {e}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Shared in-memory map. Clones see the same entries.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| MailError::Persistence("Blob store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| MailError::Persistence("Blob store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &mut dyn BlobStore) {
        assert_eq!(store.get("emailData").unwrap(), None);
        store.set("emailData", "{\"inbox\":[]}").unwrap();
        assert_eq!(store.get("emailData").unwrap().as_deref(), Some("{\"inbox\":[]}"));
        store.set("emailData", "{}").unwrap();
        assert_eq!(store.get("emailData").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn sqlite_get_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteBlobStore::open(dir.path()).unwrap();
        exercise(&mut store);
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = SqliteBlobStore::open(dir.path()).unwrap();
            store.set("k", "v").unwrap();
        }
        let store = SqliteBlobStore::open(dir.path()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn sqlite_in_memory_get_set() {
        let mut store = SqliteBlobStore::open_in_memory().unwrap();
        exercise(&mut store);
    }

    #[test]
    fn json_file_get_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileBlobStore::new(dir.path().join("nested"));
        exercise(&mut store);
        assert!(dir.path().join("nested").join("emailData.json").exists());
        assert!(!dir.path().join("nested").join("emailData.json.tmp").exists());
    }

    #[test]
    fn memory_clones_share_entries() {
        let mut a = MemoryBlobStore::new();
        let b = a.clone();
        exercise(&mut a);
        assert_eq!(b.get("emailData").unwrap().as_deref(), Some("{}"));
    }
}

use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageError;

/// Keys the closet persists under. Each holds one JSON (or plain string) blob.
pub mod keys {
    pub const ITEMS: &str = "closetItems";
    pub const OUTFITS: &str = "closetOutfits";
    pub const LAST_CATEGORY: &str = "closetLastCategory";
    pub const THEME: &str = "closetTheme";
    pub const DRAFT: &str = "closetDraft";
}

/// String key/value persistence, the substrate every store writes through.
///
/// Writes replace the whole value for a key; there is no partial update.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// The Library manages the SQLite database holding the closet.
/// Every key lives as one row of the `kv` table.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the database at `db_path`.
    ///
    /// The parent directory is created when missing, e.g.
    /// - Linux: ~/.local/share/closet-tracker/closet.db
    /// - macOS: ~/Library/Application Support/closet-tracker/closet.db
    /// - Windows: %APPDATA%\closet-tracker\closet.db
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!("Database opened at {}", db_path.display());

        let library = Library { conn, db_path };
        library.init_schema()?;
        Ok(library)
    }

    /// Throwaway database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let library = Library {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates the key/value table if it doesn't exist.
    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// All stored keys, sorted
    #[cfg(test)]
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for Library {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// In-memory store with an optional byte quota, mirroring the
/// quota-limited browser storage the closet was first written against.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once keys plus values would exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        MemoryStore {
            entries: RefCell::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let available = quota.saturating_sub(self.used_excluding(key));
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_set_get_remove() {
        let library = Library::open_in_memory().unwrap();
        assert_eq!(library.get(keys::ITEMS).unwrap(), None);

        library.set(keys::ITEMS, "[]").unwrap();
        library.set(keys::ITEMS, "[1]").unwrap();
        assert_eq!(library.get(keys::ITEMS).unwrap().as_deref(), Some("[1]"));

        library.set(keys::THEME, "dark").unwrap();
        assert_eq!(library.keys().unwrap(), vec![keys::ITEMS, keys::THEME]);

        library.remove(keys::ITEMS).unwrap();
        assert_eq!(library.get(keys::ITEMS).unwrap(), None);
    }

    #[test]
    fn test_library_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("closet.db");

        {
            let library = Library::open(&db_path).unwrap();
            library.set(keys::LAST_CATEGORY, "Skirts").unwrap();
        }

        let reopened = Library::open(&db_path).unwrap();
        assert_eq!(reopened.path(), db_path.as_path());
        assert_eq!(
            reopened.get(keys::LAST_CATEGORY).unwrap().as_deref(),
            Some("Skirts")
        );
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(32);
        store.set("a", "0123456789").unwrap();

        let err = store.set("b", &"x".repeat(40)).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("b").unwrap(), None);

        // Overwriting a key only counts the new value
        store.set("a", &"y".repeat(30)).unwrap();
    }
}

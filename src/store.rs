use crate::app_dirs::AppDirs;
use crate::history::SessionResult;
use rusqlite::{params, Connection, Result};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Fixed key the serialized result sequence lives under.
const HISTORY_KEY: &str = "results";

/// Persistence port for the result history.
///
/// The whole sequence is saved as one durable record; there is no
/// per-entry update. Loading never fails: a missing or unreadable record
/// is an empty history.
pub trait HistoryStore {
    fn load(&self) -> Vec<SessionResult>;
    fn save(&self, entries: &[SessionResult]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// SQLite-backed store holding the history as a JSON payload in a
/// single-row key-value slot.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database under the platform state directory, creating the
    /// directory and schema as needed.
    pub fn new() -> Result<Self> {
        let db_path =
            AppDirs::db_path().unwrap_or_else(|| PathBuf::from("typometer_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::init(Connection::open(&db_path)?)
    }

    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS slot (key TEXT PRIMARY KEY, payload TEXT NOT NULL)",
            [],
        )?;
        Ok(HistoryDb { conn })
    }
}

impl HistoryStore for HistoryDb {
    fn load(&self) -> Vec<SessionResult> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM slot WHERE key = ?1",
                [HISTORY_KEY],
                |row| row.get(0),
            )
            .ok();

        match payload {
            // Corrupt payloads are discarded, not repaired
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn save(&self, entries: &[SessionResult]) -> Result<()> {
        let payload = serde_json::to_string(entries).unwrap_or_else(|_| String::from("[]"));
        self.conn.execute(
            "INSERT INTO slot (key, payload) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload",
            params![HISTORY_KEY, payload],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM slot WHERE key = ?1", [HISTORY_KEY])?;
        Ok(())
    }
}

/// In-process store for unit and headless tests. The shared handle lets a
/// test reopen "the same storage" the way a second process run would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<Vec<SessionResult>>>,
}

impl MemoryStore {
    pub fn shared(&self) -> Rc<RefCell<Vec<SessionResult>>> {
        Rc::clone(&self.entries)
    }

    pub fn from_shared(entries: Rc<RefCell<Vec<SessionResult>>>) -> Self {
        Self { entries }
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Vec<SessionResult> {
        self.entries.borrow().clone()
    }

    fn save(&self, entries: &[SessionResult]) -> Result<()> {
        *self.entries.borrow_mut() = entries.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn result(wpm: u32, secs: i64) -> SessionResult {
        SessionResult {
            wpm,
            accuracy: 95,
            completed_at: Local.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_load_empty_db() {
        let db = HistoryDb::open_in_memory().unwrap();
        assert!(db.load().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let db = HistoryDb::open_in_memory().unwrap();
        let entries = vec![result(40, 0), result(60, 5)];
        db.save(&entries).unwrap();
        assert_eq!(db.load(), entries);
    }

    #[test]
    fn test_save_replaces_previous_payload() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.save(&[result(40, 0)]).unwrap();
        db.save(&[result(40, 0), result(60, 5)]).unwrap();
        assert_eq!(db.load().len(), 2);
    }

    #[test]
    fn test_clear_removes_slot() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.save(&[result(40, 0)]).unwrap();
        db.clear().unwrap();
        assert!(db.load().is_empty());
    }

    #[test]
    fn test_corrupt_payload_loads_as_empty() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO slot (key, payload) VALUES (?1, ?2)",
                params![HISTORY_KEY, "{not json"],
            )
            .unwrap();
        assert!(db.load().is_empty());
    }

    #[test]
    fn test_wrong_shape_payload_loads_as_empty() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO slot (key, payload) VALUES (?1, ?2)",
                params![HISTORY_KEY, r#"{"wpm": 40}"#],
            )
            .unwrap();
        assert!(db.load().is_empty());
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let db = HistoryDb::open_at(&path).unwrap();
            db.save(&[result(42, 0)]).unwrap();
        }
        let db = HistoryDb::open_at(&path).unwrap();
        let loaded = db.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].wpm, 42);
    }

    #[test]
    fn test_memory_store_shared_handle() {
        let store = MemoryStore::default();
        let shared = store.shared();
        store.save(&[result(40, 0)]).unwrap();
        let reopened = MemoryStore::from_shared(shared);
        assert_eq!(reopened.load().len(), 1);
    }
}

use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

/// Serialized list of every finished run
pub const HISTORY_KEY: &str = "typingHistory";
pub const LAST_LANGUAGE_KEY: &str = "typing_last_lang";
pub const LAST_DURATION_KEY: &str = "typing_last_duration";
pub const PERSONAL_BEST_PREFIX: &str = "pb_";
pub const SETTINGS_PREFIX: &str = "typing_last_";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// String keyed, string valued persistence port.
///
/// Everything that survives a restart (settings, personal bests, history)
/// goes through this trait, so the session logic never knows which medium
/// backs it.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Durable store: a single `kv` table in a SQLite file
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(SqliteStore { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }

        Ok(keys)
    }
}

/// Ephemeral store used by tests and `--ephemeral` runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

/// Stand-in used when the durable store could not be opened.
/// Every call fails, so callers exercise their degraded paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StorageError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(StorageError::Unavailable)
    }

    fn keys(&self) -> Result<Vec<String>> {
        Err(StorageError::Unavailable)
    }
}

/// Personal best key for a language/duration pair, e.g. `pb_english_60`
pub fn personal_best_key(language: &str, duration_secs: u32) -> String {
    format!("{PERSONAL_BEST_PREFIX}{language}_{duration_secs}")
}

/// Remove saved personal bests and settings. History is left alone.
/// Returns the number of removed keys.
pub fn clear_saved_data(store: &dyn KeyValueStore) -> Result<usize> {
    let doomed: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|k| k.starts_with(PERSONAL_BEST_PREFIX) || k.starts_with(SETTINGS_PREFIX))
        .collect();

    for key in &doomed {
        store.remove(key)?;
    }

    tracing::info!(removed = doomed.len(), "cleared saved personal bests and settings");
    Ok(doomed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn seed(store: &dyn KeyValueStore) {
        store.set(HISTORY_KEY, "[]").unwrap();
        store.set(LAST_LANGUAGE_KEY, "hindi").unwrap();
        store.set(LAST_DURATION_KEY, "30").unwrap();
        store.set("pb_english_60", "71").unwrap();
        store.set("pb_hindi_30", "40").unwrap();
        store.set("unrelated", "x").unwrap();
    }

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        // removing a missing key is fine
        store.remove("a").unwrap();
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set(LAST_DURATION_KEY, "120").unwrap();
            store.set(LAST_DURATION_KEY, "15").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(LAST_DURATION_KEY).unwrap().as_deref(), Some("15"));
        assert_eq!(store.keys().unwrap(), vec![LAST_DURATION_KEY.to_string()]);
    }

    #[test]
    fn clear_removes_pb_and_settings_but_keeps_history() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store);

        let removed = clear_saved_data(&store).unwrap();

        assert_eq!(removed, 4);
        assert_eq!(
            store.keys().unwrap(),
            vec!["typingHistory".to_string(), "unrelated".to_string()]
        );
    }

    #[test]
    fn clear_on_memory_store_matches_sqlite() {
        let store = MemoryStore::new();
        seed(&store);

        clear_saved_data(&store).unwrap();

        assert_eq!(store.get(HISTORY_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("pb_english_60").unwrap(), None);
        assert_eq!(store.get(LAST_LANGUAGE_KEY).unwrap(), None);
    }

    #[test]
    fn clear_reports_unavailable_storage() {
        assert_matches!(
            clear_saved_data(&UnavailableStore),
            Err(StorageError::Unavailable)
        );
    }

    #[test]
    fn personal_best_key_format() {
        assert_eq!(personal_best_key("english", 60), "pb_english_60");
        assert_eq!(personal_best_key("hindi", 15), "pb_hindi_15");
    }

    #[test]
    fn boxed_store_delegates() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
    }
}

use crate::error::StoreError;
use crate::types::{Workout, WorkoutRecord};
use crate::dlog;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

/// Key under which the whole workout list is stored.
pub const WORKOUTS_KEY: &str = "workouts";

/// String-keyed string store, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-process store. Optionally bounded by a byte quota over all keys and
/// values, or switched off entirely, to behave like a constrained browser.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.disabled {
            return Err(StoreError::Disabled);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.disabled {
            return Err(StoreError::Disabled);
        }
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.disabled {
            return Err(StoreError::Disabled);
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Key/value store in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display();
        let conn =
            Connection::open(path).with_context(|| format!("Opening SQLite store: {display}"))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory SQLite store")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
              key    TEXT PRIMARY KEY,
              value  TEXT NOT NULL
            );
            ",
        )
        .context("Ensuring SQLite store schema")?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            ",
            [key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Mirrors the workout list into a [`KeyValueStore`].
///
/// Store failures never reach the caller: a failed write is logged and
/// skipped, a failed or unparsable read is an empty list.
pub struct WorkoutStorage<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> WorkoutStorage<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, WORKOUTS_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the stored list. Returns whether the write went through.
    pub fn save(&mut self, workouts: &[Workout]) -> bool {
        match self.try_save(workouts) {
            Ok(bytes) => {
                dlog!("saved workouts={} bytes={bytes}", workouts.len());
                true
            }
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "persistence skipped");
                false
            }
        }
    }

    fn try_save(&mut self, workouts: &[Workout]) -> Result<usize, StoreError> {
        let json = serde_json::to_string(workouts)?;
        self.store.set(&self.key, &json)?;
        Ok(json.len())
    }

    pub fn load(&self) -> Vec<Workout> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "could not read stored workouts");
                return Vec::new();
            }
        };

        let records = match serde_json::from_str::<Vec<JsonValue>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "stored workouts are malformed; ignoring");
                return Vec::new();
            }
        };

        let total = records.len();
        let mut out = Vec::with_capacity(total);
        for value in records {
            let record = match serde_json::from_value::<WorkoutRecord>(value) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(err = %e, "skipping unreadable workout record");
                    continue;
                }
            };
            match Workout::try_from(record) {
                Ok(w) => out.push(w),
                Err(e) => tracing::warn!(err = %e, "skipping incomplete workout record"),
            }
        }

        dlog!("loaded workouts={} of records={total}", out.len());
        out
    }

    /// Removes the stored entry. Returns whether the removal went through.
    pub fn clear(&mut self) -> bool {
        match self.store.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "could not clear stored workouts");
                false
            }
        }
    }
}

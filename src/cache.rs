//! Client-side query cache shared by every repository of one [`crate::Cms`].
//!
//! Entries are keyed by table and query. Writes patch every entry of the
//! table in place, so two views listing the same table stay consistent
//! without re-fetching.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::store::ListQuery;

/// Change notification for subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Loaded { table: String },
    Inserted { table: String, id: String },
    Updated { table: String, id: String },
    Removed { table: String, id: String },
    Invalidated { table: String },
}

struct Entry {
    query: ListQuery,
    rows: Vec<Value>,
}

pub struct QueryCache {
    tables: RwLock<HashMap<String, HashMap<String, Entry>>>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            tables: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CacheEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }

    pub fn get(&self, table: &str, query: &ListQuery) -> Option<Vec<Value>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(table)
            .and_then(|entries| entries.get(&query.cache_key()))
            .map(|entry| entry.rows.clone())
    }

    pub fn put(&self, table: &str, query: &ListQuery, rows: Vec<Value>) {
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            tables.entry(table.to_string()).or_default().insert(
                query.cache_key(),
                Entry {
                    query: query.clone(),
                    rows,
                },
            );
        }
        self.emit(CacheEvent::Loaded {
            table: table.to_string(),
        });
    }

    /// New row goes to the front of every entry whose filters it satisfies.
    pub fn apply_insert(&self, table: &str, row: &Value) {
        let Some(id) = row_id(row) else { return };
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(entries) = tables.get_mut(table) {
                for entry in entries.values_mut() {
                    if !entry.query.matches(row) {
                        continue;
                    }
                    entry.rows.retain(|r| row_id(r).as_deref() != Some(id.as_str()));
                    entry.rows.insert(0, row.clone());
                    if let Some(limit) = entry.query.limit {
                        entry.rows.truncate(limit);
                    }
                }
            }
        }
        self.emit(CacheEvent::Inserted {
            table: table.to_string(),
            id,
        });
    }

    /// Replace the row in place; drop it from entries it no longer satisfies
    /// and add it to the front of entries it now satisfies.
    pub fn apply_update(&self, table: &str, row: &Value) {
        let Some(id) = row_id(row) else { return };
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(entries) = tables.get_mut(table) {
                for entry in entries.values_mut() {
                    let position = entry
                        .rows
                        .iter()
                        .position(|r| row_id(r).as_deref() == Some(id.as_str()));
                    match (position, entry.query.matches(row)) {
                        (Some(i), true) => entry.rows[i] = row.clone(),
                        (Some(i), false) => {
                            entry.rows.remove(i);
                        }
                        (None, true) => {
                            entry.rows.insert(0, row.clone());
                            if let Some(limit) = entry.query.limit {
                                entry.rows.truncate(limit);
                            }
                        }
                        (None, false) => {}
                    }
                }
            }
        }
        self.emit(CacheEvent::Updated {
            table: table.to_string(),
            id,
        });
    }

    pub fn apply_remove(&self, table: &str, id: &str) {
        {
            let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(entries) = tables.get_mut(table) {
                for entry in entries.values_mut() {
                    entry.rows.retain(|r| row_id(r).as_deref() != Some(id));
                }
            }
        }
        self.emit(CacheEvent::Removed {
            table: table.to_string(),
            id: id.to_string(),
        });
    }

    /// Drop every entry of `table`; the next read goes to the store.
    pub fn invalidate(&self, table: &str) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(table);
        self.emit(CacheEvent::Invalidated {
            table: table.to_string(),
        });
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use bilingual_cms_postgrest::PostgrestError;

use super::{ContentStore, Filter, ListQuery};
use crate::error::Result;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Value>>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing so creation order is recoverable from `created_at`.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

/// In-process store with PostgREST semantics.
///
/// Used for offline previews and tests. `set_offline(true)` makes every call
/// fail the way an unreachable backend would.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    selects: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of reads served so far
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    /// Raw rows of a table in insertion order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PostgrestError::UnparsedApiError {
                message: "store unreachable".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            }
            .into());
        }
        Ok(())
    }
}

fn stamp_string(stamp: DateTime<Utc>) -> String {
    stamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn matches_all(filters: &[Filter], row: &Value) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn select(&self, table: &str, query: &ListQuery) -> Result<Vec<Value>> {
        self.check_online()?;
        self.selects.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Value> = tables
            .rows
            .get(table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| query.cmp_rows(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.check_online()?;
        let Value::Object(mut fields) = row else {
            return Err(PostgrestError::InvalidParameters(format!(
                "insert into {} expects a JSON object",
                table
            ))
            .into());
        };

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let stamp = stamp_string(tables.next_stamp());

        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(stamp.clone()));
        fields
            .entry("updated_at")
            .or_insert_with(|| Value::String(stamp));

        let row = Value::Object(fields);
        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        self.check_online()?;
        let Value::Object(patch) = patch else {
            return Err(PostgrestError::InvalidParameters(format!(
                "update on {} expects a JSON object",
                table
            ))
            .into());
        };

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let stamp = stamp_string(tables.next_stamp());
        let mut updated = Vec::new();
        if let Some(rows) = tables.rows.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches_all(filters, r)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        // ids are immutable
                        if key != "id" {
                            fields.insert(key.clone(), value.clone());
                        }
                    }
                    // same effect as a moddatetime trigger on the table
                    fields.insert("updated_at".to_string(), Value::String(stamp.clone()));
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        self.check_online()?;
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = Vec::new();
        if let Some(rows) = tables.rows.get_mut(table) {
            let (gone, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|r| matches_all(filters, r));
            *rows = kept;
            removed = gone;
        }
        Ok(removed)
    }
}

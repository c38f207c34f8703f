//! Row store seam between the repositories and the hosted backend

mod filter;
mod memory;
mod postgrest;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use filter::*;
pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

/// Table-level CRUD over JSON rows.
///
/// Ids and timestamps are assigned by the store. Writes return the rows as
/// stored; a filter that matches nothing is not an error.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn select(&self, table: &str, query: &ListQuery) -> Result<Vec<Value>>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>>;

    /// First row matching `query`, if any.
    async fn select_one(&self, table: &str, query: &ListQuery) -> Result<Option<Value>> {
        let query = query.clone().limit(1);
        Ok(self.select(table, &query).await?.into_iter().next())
    }
}

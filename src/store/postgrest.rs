use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use bilingual_cms_postgrest::{rows_from_value, PostgrestClient, PostgrestError};

use super::{ContentStore, Filter, ListQuery};
use crate::error::Result;

/// Store backed by the hosted PostgREST endpoint
#[derive(Clone)]
pub struct PostgrestStore {
    url: String,
    key: String,
    access_token: Option<String>,
    schema: Option<String>,
    http_client: Client,
}

impl PostgrestStore {
    pub fn new(url: &str, key: &str, http_client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            access_token: None,
            schema: None,
            http_client,
        }
    }

    /// Bearer token for writes guarded by row-level security
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    /// Non-public schema; `public` is the PostgREST default and sends no header.
    pub fn with_schema(mut self, schema: &str) -> Self {
        if schema != "public" {
            self.schema = Some(schema.to_string());
        }
        self
    }

    /// Client for `table` with auth and schema headers applied
    pub fn from(&self, table: &str) -> std::result::Result<PostgrestClient, PostgrestError> {
        let mut client = PostgrestClient::new(&self.url, &self.key, table, self.http_client.clone())
            .with_auth(self.access_token.as_deref().unwrap_or(&self.key))?;
        if let Some(schema) = &self.schema {
            client = client.schema(schema)?;
        }
        Ok(client)
    }

    fn filtered(&self, table: &str, filters: &[Filter]) -> std::result::Result<PostgrestClient, PostgrestError> {
        let mut client = self.from(table)?;
        for filter in filters {
            client = filter.apply(client);
        }
        Ok(client)
    }
}

#[async_trait]
impl ContentStore for PostgrestStore {
    async fn select(&self, table: &str, query: &ListQuery) -> Result<Vec<Value>> {
        let client = query.apply(self.from(table)?);
        Ok(client.execute::<Value>().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let written = self.from(table)?.insert(&row).await?;
        rows_from_value(written).into_iter().next().ok_or_else(|| {
            PostgrestError::DeserializationError(format!("no row returned after insert into {}", table))
                .into()
        })
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        if filters.is_empty() {
            return Err(PostgrestError::InvalidParameters(format!(
                "refusing unfiltered update on {}",
                table
            ))
            .into());
        }
        let written = self.filtered(table, filters)?.update(&patch).await?;
        Ok(rows_from_value(written))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        if filters.is_empty() {
            return Err(PostgrestError::InvalidParameters(format!(
                "refusing unfiltered delete on {}",
                table
            ))
            .into());
        }
        let written = self.filtered(table, filters)?.delete().await?;
        Ok(rows_from_value(written))
    }
}

//! PostgREST client for the bilingual CMS
//!
//! Thin query builder over the hosted PostgREST endpoint used by every
//! content table.
//!
//! # Features
//!
//! - Query API (`select`, `insert`, `update`, `upsert`, `delete`)
//! - Filtering (`eq`, `neq`, `gt`, `gte`, `lt`, `lte`, `like`, `ilike`, `in`, `is`)
//! - Ordering and pagination
//! - Single-row reads via `maybe_single`

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Error body returned by PostgREST
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError { message: String, status: StatusCode },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl PostgrestError {
    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PostgrestError::ApiError { status, .. } => Some(*status),
            PostgrestError::UnparsedApiError { status, .. } => Some(*status),
            PostgrestError::NetworkError(e) => e.status(),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Query builder bound to one table.
///
/// Filters are kept in insertion order and may repeat a column, so a range
/// such as `gte` + `lte` on `created_at` produces two query pairs.
#[derive(Clone)]
pub struct PostgrestClient {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
}

impl PostgrestClient {
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(api_key) {
            Ok(value) => {
                headers.insert("apikey", value);
            }
            Err(_) => log::warn!("api key is not a valid header value, sending without it"),
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Bearer token sent as `Authorization`
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Target a schema other than `public`
    pub fn schema(self, schema_name: &str) -> Result<Self, PostgrestError> {
        self.with_header("Accept-Profile", schema_name)?
            .with_header("Content-Profile", schema_name)
    }

    fn set_param(&mut self, key: &str, value: String) {
        self.query_params.retain(|(k, _)| k != key);
        self.query_params.push((key.to_string(), value));
    }

    fn push_filter(mut self, column: &str, op: &str, value: &str) -> Self {
        self.query_params
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.set_param("select", columns.to_string());
        self
    }

    pub fn eq(self, column: &str, value: &str) -> Self {
        self.push_filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: &str) -> Self {
        self.push_filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: &str) -> Self {
        self.push_filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: &str) -> Self {
        self.push_filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: &str) -> Self {
        self.push_filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: &str) -> Self {
        self.push_filter(column, "lte", value)
    }

    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.push_filter(column, "like", pattern)
    }

    /// Case-insensitive LIKE
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.push_filter(column, "ilike", pattern)
    }

    pub fn in_list(self, column: &str, values: &[&str]) -> Self {
        let value_list = format!("({})", values.join(","));
        self.push_filter(column, "in", &value_list)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.push_filter(column, "is", "null")
    }

    pub fn not_null(self, column: &str) -> Self {
        self.push_filter(column, "not.is", "null")
    }

    /// Later calls append secondary sort keys.
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        let term = format!("{}.{}", column, order.as_str());
        let merged = match self.query_params.iter().find(|(k, _)| k == "order") {
            Some((_, existing)) => format!("{},{}", existing, term),
            None => term,
        };
        self.set_param("order", merged);
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.set_param("limit", count.to_string());
        self
    }

    pub fn offset(mut self, count: usize) -> Self {
        self.set_param("offset", count.to_string());
        self
    }

    /// Fetch rows
    pub async fn execute<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(PostgrestError::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response, status).await);
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    /// Fetch at most one row; an empty result is `None`, not an error.
    pub async fn maybe_single<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, PostgrestError> {
        let rows = self.clone().limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }

    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        self.write(Method::POST, Some(serde_json::to_value(values)?), "return=representation")
            .await
    }

    /// Insert or merge on conflict with `on_conflict` columns.
    pub async fn upsert<T: Serialize>(
        &self,
        values: T,
        on_conflict: Option<&str>,
    ) -> Result<Value, PostgrestError> {
        let mut client = self.clone();
        if let Some(columns) = on_conflict {
            client.set_param("on_conflict", columns.to_string());
        }
        client
            .write(
                Method::POST,
                Some(serde_json::to_value(values)?),
                "resolution=merge-duplicates,return=representation",
            )
            .await
    }

    pub async fn update<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        self.write(Method::PATCH, Some(serde_json::to_value(values)?), "return=representation")
            .await
    }

    pub async fn delete(&self) -> Result<Value, PostgrestError> {
        self.write(Method::DELETE, None, "return=representation").await
    }

    async fn write(
        &self,
        method: Method,
        body: Option<Value>,
        prefer: &'static str,
    ) -> Result<Value, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("{} {}", method, url);

        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static(prefer),
        );

        let mut request = self
            .http_client
            .request(method, url)
            .headers(headers);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(PostgrestError::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response, status).await);
        }

        // 204 No Content and empty 201s come back as Null
        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;
        if body_text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&body_text)
                .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
        }
    }

    fn build_url(&self) -> Result<String, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;

        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }
}

async fn error_from_response(response: reqwest::Response, status: StatusCode) -> PostgrestError {
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
        Ok(details) => PostgrestError::ApiError { details, status },
        Err(_) => PostgrestError::UnparsedApiError {
            message: error_text,
            status,
        },
    }
}

/// Rows returned by a write with `return=representation`, normalised to a list.
pub fn rows_from_value(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, table: &str) -> PostgrestClient {
        PostgrestClient::new(&server.uri(), "fake-key", table, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_select_with_filter_and_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/contact_messages"))
            .and(query_param("select", "*"))
            .and(query_param("status", "eq.new"))
            .and(query_param("order", "created_at.desc"))
            .and(header("apikey", "fake-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "m2", "status": "new" },
                { "id": "m1", "status": "new" }
            ])))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "contact_messages")
            .select("*")
            .eq("status", "new")
            .order("created_at", SortOrder::Descending)
            .execute::<Value>()
            .await
            .unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], "m2");
    }

    #[tokio::test]
    async fn test_range_on_same_column() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/contact_messages"))
            .and(query_param("created_at", "gte.2024-01-01"))
            .and(query_param("created_at", "lte.2024-01-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "m1" }])))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "contact_messages")
            .gte("created_at", "2024-01-01")
            .lte("created_at", "2024-01-31")
            .execute::<Value>()
            .await
            .unwrap();

        assert_eq!(data.len(), 1);
    }

    #[tokio::test]
    async fn test_null_filters_and_secondary_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/blog_posts"))
            .and(query_param("published_at", "not.is.null"))
            .and(query_param("order", "published_at.desc,created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "blog_posts")
            .not_null("published_at")
            .order("published_at", SortOrder::Descending)
            .order("created_at", SortOrder::Descending)
            .execute::<Value>()
            .await
            .unwrap();

        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_maybe_single() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/admin_users"))
            .and(query_param("email", "eq.nobody@example.com"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/admin_users"))
            .and(query_param("email", "eq.admin@example.com"))
            .and(query_param("limit", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "id": "u1", "email": "admin@example.com" }])),
            )
            .mount(&mock_server)
            .await;

        let missing = client(&mock_server, "admin_users")
            .eq("email", "nobody@example.com")
            .maybe_single::<Value>()
            .await
            .unwrap();
        assert!(missing.is_none());

        let found = client(&mock_server, "admin_users")
            .eq("email", "admin@example.com")
            .maybe_single::<Value>()
            .await
            .unwrap();
        assert_eq!(found.unwrap()["id"], "u1");
    }

    #[tokio::test]
    async fn test_insert() {
        let mock_server = MockServer::start().await;

        let insert_data = json!({ "name_ar": "خدمة", "name_en": "Service" });
        let expected_response = json!([{ "id": "s1", "name_ar": "خدمة", "name_en": "Service" }]);

        Mock::given(method("POST"))
            .and(path("/rest/v1/services"))
            .and(header("apikey", "fake-key"))
            .and(header("content-type", "application/json"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(&insert_data))
            .respond_with(ResponseTemplate::new(201).set_body_json(&expected_response))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "services")
            .insert(&insert_data)
            .await
            .unwrap();
        assert_eq!(data, expected_response);
    }

    #[tokio::test]
    async fn test_upsert() {
        let mock_server = MockServer::start().await;

        let row = json!({ "id": "h1", "hero_title_en": "Hello" });

        Mock::given(method("POST"))
            .and(path("/rest/v1/homepage_content"))
            .and(query_param("on_conflict", "id"))
            .and(header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            ))
            .and(body_json(&row))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([row.clone()])))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "homepage_content")
            .upsert(&row, Some("id"))
            .await
            .unwrap();
        assert_eq!(rows_from_value(data).len(), 1);
    }

    #[tokio::test]
    async fn test_update() {
        let mock_server = MockServer::start().await;

        let update_data = json!({ "name_en": "Updated" });
        let expected_response = json!([{ "id": "s1", "name_en": "Updated" }]);

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/services"))
            .and(query_param("id", "eq.s1"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(&update_data))
            .respond_with(ResponseTemplate::new(200).set_body_json(&expected_response))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "services")
            .eq("id", "s1")
            .update(&update_data)
            .await
            .unwrap();
        assert_eq!(data, expected_response);
    }

    #[tokio::test]
    async fn test_delete_no_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/services"))
            .and(query_param("id", "eq.s1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let data = tokio_test::assert_ok!(
            client(&mock_server, "services")
                .eq("id", "s1")
                .delete()
                .await
        );
        assert_eq!(data, Value::Null);
        assert!(rows_from_value(data).is_empty());
    }

    #[tokio::test]
    async fn test_schema_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/services"))
            .and(header("Accept-Profile", "cms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let data = client(&mock_server, "services")
            .schema("cms")
            .unwrap()
            .execute::<Value>()
            .await
            .unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/services"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "23502",
                "message": "null value in column \"name_en\" violates not-null constraint",
                "details": null,
                "hint": null
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/server_error"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let result_400 = client(&mock_server, "services")
            .insert(json!({ "name_ar": "x" }))
            .await;
        match result_400.err().unwrap() {
            PostgrestError::ApiError { details, status } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(details.code, Some("23502".to_string()));
            }
            e => panic!("Expected ApiError for 400, got {:?}", e),
        }

        let result_500 = client(&mock_server, "server_error")
            .execute::<Value>()
            .await;
        let err = result_500.err().unwrap();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        match err {
            PostgrestError::UnparsedApiError { message, .. } => {
                assert_eq!(message, "Internal Server Error");
            }
            e => panic!("Expected UnparsedApiError for 500, got {:?}", e),
        }
    }
}

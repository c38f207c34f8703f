//! Object storage client for the bilingual CMS
//!
//! Uploads media (logos, hero images, blog covers, avatars) into a public
//! bucket and resolves public URLs for them.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use url::Url;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Upload options
#[derive(Debug, Clone, Serialize, Default)]
pub struct FileOptions {
    pub cache_control: Option<String>,
    pub content_type: Option<String>,
    pub upsert: Option<bool>,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_control(mut self, cache_control: &str) -> Self {
        self.cache_control = Some(cache_control.to_string());
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }
}

/// Response body of a successful upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    /// `{bucket}/{path}`
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

/// Entry returned by `list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub name: String,
    pub id: Option<String>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct StorageClient {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl StorageClient {
    pub fn new(base_url: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        }
    }

    /// Client scoped to one bucket
    pub fn from(&self, bucket_id: &str) -> StorageBucketClient {
        StorageBucketClient {
            parent: self.clone(),
            bucket_id: bucket_id.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct StorageBucketClient {
    parent: StorageClient,
    bucket_id: String,
}

impl StorageBucketClient {
    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    fn object_url(&self, path: &str) -> Result<Url> {
        if path.is_empty() || path.starts_with('/') {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let mut url = Url::parse(&self.parent.base_url)?;
        url.set_path(&format!("/storage/v1/object/{}/{}", self.bucket_id, path));
        Ok(url)
    }

    /// Upload in-memory bytes as `path` inside the bucket.
    pub async fn upload_bytes(
        &self,
        path: &str,
        file_name: &str,
        contents: Vec<u8>,
        options: Option<FileOptions>,
    ) -> Result<UploadResponse> {
        let mut url = self.object_url(path)?;
        let options = options.unwrap_or_default();

        if let Some(cache_control) = &options.cache_control {
            url.query_pairs_mut()
                .append_pair("cache_control", cache_control);
        }

        let mut part = Part::bytes(contents).file_name(file_name.to_string());
        if let Some(content_type) = &options.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        log::debug!("uploading {} to bucket {}", path, self.bucket_id);

        let response = self
            .parent
            .http_client
            .post(url)
            .header("apikey", &self.parent.api_key)
            .header("Authorization", format!("Bearer {}", &self.parent.api_key))
            .header("x-upsert", options.upsert.unwrap_or(false).to_string())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(StorageError::ApiError(error_text));
        }

        Ok(response.json::<UploadResponse>().await?)
    }

    /// Upload a file from disk
    pub async fn upload(
        &self,
        path: &str,
        file_path: &Path,
        options: Option<FileOptions>,
    ) -> Result<UploadResponse> {
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| StorageError::FileNotFound(file_path.display().to_string()))?;

        let mut file = File::open(file_path).await?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        self.upload_bytes(path, &file_name, contents, options).await
    }

    pub async fn download(&self, path: &str) -> Result<Bytes> {
        let url = self.object_url(path)?;

        let response = self
            .parent
            .http_client
            .get(url)
            .header("apikey", &self.parent.api_key)
            .header("Authorization", format!("Bearer {}", &self.parent.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(StorageError::ApiError(error_text));
        }

        Ok(response.bytes().await?)
    }

    pub async fn list(&self, prefix: &str) -> Result<Vec<FileObject>> {
        let url = format!(
            "{}/storage/v1/object/list/{}",
            self.parent.base_url, self.bucket_id
        );

        let response = self
            .parent
            .http_client
            .post(&url)
            .header("apikey", &self.parent.api_key)
            .header("Authorization", format!("Bearer {}", &self.parent.api_key))
            .json(&serde_json::json!({ "prefix": prefix }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(StorageError::ApiError(error_text));
        }

        Ok(response.json::<Vec<FileObject>>().await?)
    }

    pub async fn remove(&self, paths: Vec<&str>) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}",
            self.parent.base_url, self.bucket_id
        );

        let response = self
            .parent
            .http_client
            .delete(&url)
            .header("apikey", &self.parent.api_key)
            .header("Authorization", format!("Bearer {}", &self.parent.api_key))
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(StorageError::ApiError(error_text));
        }

        Ok(())
    }

    pub fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.parent.base_url, self.bucket_id, path
        )
    }
}

//! Media uploads for logos, hero images, covers and avatars

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use bilingual_cms_storage::{FileOptions, StorageBucketClient};

use crate::error::Result;

/// A file picked in an admin form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl MediaFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Lowercased extension of the original name, `bin` when there is none.
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// Object name `{kind}-{millis}.{ext}`
pub fn media_path(kind: &str, file: &MediaFile, now: DateTime<Utc>) -> String {
    format!("{}-{}.{}", kind, now.timestamp_millis(), file.extension())
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put(&self, path: &str, file: &MediaFile) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;

    fn public_url(&self, path: &str) -> String;
}

/// Media in a public storage bucket
pub struct BucketMediaStore {
    bucket: StorageBucketClient,
}

impl BucketMediaStore {
    pub fn new(bucket: StorageBucketClient) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl MediaStore for BucketMediaStore {
    async fn put(&self, path: &str, file: &MediaFile) -> Result<()> {
        let mut options = FileOptions::new()
            .with_upsert(true)
            .with_cache_control("3600");
        if let Some(content_type) = &file.content_type {
            options = options.with_content_type(content_type);
        }
        self.bucket
            .upload_bytes(path, &file.file_name, file.bytes.clone(), Some(options))
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.bucket.remove(vec![path]).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.bucket.get_public_url(path)
    }
}

/// In-process media store
pub struct MemoryMediaStore {
    base_url: String,
    objects: RwLock<HashMap<String, MediaFile>>,
}

impl MemoryMediaStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &str) -> Option<MediaFile> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn put(&self, path: &str, file: &MediaFile) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), file.clone());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

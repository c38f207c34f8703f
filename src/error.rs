//! Error handling for the CMS client

use std::fmt;
use thiserror::Error;

use bilingual_cms_postgrest::PostgrestError;
use bilingual_cms_storage::StorageError;

use crate::i18n::{Language, Message};

pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the CMS client
#[derive(Error, Debug)]
pub enum Error {
    /// No row matched the lookup
    #[error("Not found: {0}")]
    NotFound(String),

    /// Email matched but the password did not verify
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but the role does not grant access
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The row changed since the caller last read it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend call itself failed
    #[error("Store error: {0}")]
    Store(#[from] PostgrestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error")]
    PasswordHash,

    #[error("Session storage error: {0}")]
    SessionStorage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn not_found<T: fmt::Display>(what: T) -> Self {
        Error::NotFound(what.to_string())
    }

    pub fn forbidden<T: fmt::Display>(msg: T) -> Self {
        Error::Forbidden(msg.to_string())
    }

    pub fn conflict<T: fmt::Display>(msg: T) -> Self {
        Error::Conflict(msg.to_string())
    }

    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    pub fn session_storage<T: fmt::Display>(msg: T) -> Self {
        Error::SessionStorage(msg.to_string())
    }

    /// Catalog entry shown to the user for this error.
    pub fn user_message(&self) -> Message {
        match self {
            Error::NotFound(_) => Message::NotFound,
            Error::InvalidCredentials => Message::InvalidCredentials,
            Error::Forbidden(_) => Message::Forbidden,
            Error::Conflict(_) => Message::Conflict,
            Error::Storage(_) => Message::UploadFailed,
            Error::Jwt(_) => Message::SessionExpired,
            _ => Message::StoreError,
        }
    }

    /// User-facing text in the display language.
    pub fn message(&self, lang: Language) -> &'static str {
        self.user_message().text(lang)
    }
}

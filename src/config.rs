//! Configuration for the CMS client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::i18n::Language;

/// Minimum length of the token signing secret in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Backend endpoint and secrets
#[derive(Clone)]
pub struct CmsConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Public (anon) API key
    pub anon_key: String,

    /// HS256 secret for session tokens
    pub session_secret: String,

    /// Service role key for the trusted process, when row-level security
    /// hides `admin_users` from the anon key
    pub service_key: Option<String>,
}

impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CmsConfig {
    pub fn new(url: &str, anon_key: &str, session_secret: &str) -> Result<Self> {
        let url = url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&url)?;
        if anon_key.trim().is_empty() {
            return Err(Error::config("anon key is empty"));
        }
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(Error::config(format!(
                "session secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            session_secret: session_secret.to_string(),
            service_key: None,
        })
    }

    pub fn with_service_key(mut self, key: &str) -> Self {
        self.service_key = Some(key.to_string());
        self
    }

    /// Read `CMS_URL`, `CMS_ANON_KEY`, `CMS_SESSION_SECRET` and the optional
    /// `CMS_SERVICE_KEY`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| env::var(name).map_err(|_| Error::config(format!("{} is not set", name)));
        let config = Self::new(
            &var("CMS_URL")?,
            &var("CMS_ANON_KEY")?,
            &var("CMS_SESSION_SECRET")?,
        )?;
        Ok(match env::var("CMS_SERVICE_KEY") {
            Ok(key) if !key.trim().is_empty() => config.with_service_key(&key),
            _ => config,
        })
    }

    /// Key for row reads and writes
    pub fn data_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }
}

/// Tunables with working defaults
#[derive(Debug, Clone)]
pub struct CmsOptions {
    /// Per-request timeout
    pub request_timeout: Option<Duration>,

    /// Database schema
    pub db_schema: String,

    /// Public bucket for uploaded images
    pub media_bucket: String,

    /// Storage key of the persisted session
    pub session_key: String,

    /// Lifetime of a session token
    pub session_ttl: Duration,

    /// Where the guard sends signed-out visitors
    pub login_path: String,

    /// File holding the persisted session
    pub session_file: PathBuf,

    /// Initial display language
    pub language: Language,

    /// First branding poll interval
    pub branding_interval: Duration,

    /// Branding poll ceiling
    pub branding_max_interval: Duration,
}

impl Default for CmsOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            media_bucket: "media".to_string(),
            session_key: "cms_admin_session".to_string(),
            session_ttl: Duration::from_secs(8 * 60 * 60),
            login_path: "/admin/login".to_string(),
            session_file: PathBuf::from(".cms_session.json"),
            language: Language::Ar,
            branding_interval: Duration::from_secs(10),
            branding_max_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl CmsOptions {
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    pub fn with_media_bucket(mut self, value: &str) -> Self {
        self.media_bucket = value.to_string();
        self
    }

    pub fn with_session_key(mut self, value: &str) -> Self {
        self.session_key = value.to_string();
        self
    }

    pub fn with_session_ttl(mut self, value: Duration) -> Self {
        self.session_ttl = value;
        self
    }

    pub fn with_login_path(mut self, value: &str) -> Self {
        self.login_path = value.to_string();
        self
    }

    pub fn with_session_file(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_file = value.into();
        self
    }

    pub fn with_language(mut self, value: Language) -> Self {
        self.language = value;
        self
    }

    pub fn with_branding_intervals(mut self, base: Duration, max: Duration) -> Self {
        self.branding_interval = base;
        self.branding_max_interval = max;
        self
    }
}

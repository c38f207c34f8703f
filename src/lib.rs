//! Bilingual CMS client library
//!
//! Data access and the admin session gate for an Arabic/English marketing
//! site whose content lives in a hosted PostgREST backend with object
//! storage for images.

pub mod auth;
pub mod branding;
pub mod cache;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod i18n;
pub mod media;
pub mod models;
pub mod notify;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use bilingual_cms_storage::StorageClient;

use crate::auth::{FileSessionStorage, SessionGate, SessionStorage, TokenSigner};
use crate::branding::BrandingRefresher;
use crate::cache::QueryCache;
use crate::config::{CmsConfig, CmsOptions};
use crate::content::{BlogRepository, ContentRepository, MessageRepository, SingletonRepository, UserRepository};
use crate::context::CmsContext;
use crate::error::Result;
use crate::i18n::{Direction, Language};
use crate::media::{BucketMediaStore, MediaStore};
use crate::models::{
    BlogCategory, Faq, HomepageData, Industry, Partner, Service, SiteSettings, Testimonial,
};
use crate::notify::{Notifier, TracingNotifier};
use crate::store::{ContentStore, PostgrestStore};

/// The main entry point: one per site process
pub struct Cms {
    ctx: CmsContext,
    gate: Arc<SessionGate>,
    options: CmsOptions,
}

impl Cms {
    /// Client for the hosted backend with default options
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bilingual_cms::{Cms, config::CmsConfig};
    ///
    /// # fn main() -> bilingual_cms::error::Result<()> {
    /// let cms = Cms::new(CmsConfig::from_env()?)?;
    /// let services = cms.services();
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: CmsConfig) -> Result<Self> {
        Self::new_with_options(config, CmsOptions::default())
    }

    pub fn new_with_options(config: CmsConfig, options: CmsOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let store = PostgrestStore::new(&config.url, &config.anon_key, http_client.clone())
            .with_access_token(config.data_key())
            .with_schema(&options.db_schema);
        let bucket = StorageClient::new(&config.url, config.data_key(), http_client)
            .from(&options.media_bucket);
        let session_storage = FileSessionStorage::new(&options.session_file);

        tracing::debug!(url = %config.url, schema = %options.db_schema, "cms client configured");
        Ok(Self::with_parts(
            Arc::new(store),
            Arc::new(BucketMediaStore::new(bucket)),
            Arc::new(session_storage),
            Arc::new(TracingNotifier),
            config.session_secret.as_bytes(),
            options,
        ))
    }

    /// Assemble from explicit parts, e.g. in-memory stores.
    pub fn with_parts(
        store: Arc<dyn ContentStore>,
        media: Arc<dyn MediaStore>,
        session_storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
        session_secret: &[u8],
        options: CmsOptions,
    ) -> Self {
        let ctx = CmsContext::new(store, media, notifier, options.language);
        let ttl = chrono::Duration::from_std(options.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(8));
        let gate = SessionGate::new(
            ctx.clone(),
            TokenSigner::new(session_secret, ttl),
            session_storage,
            &options.session_key,
            &options.login_path,
        );
        Self {
            ctx,
            gate: Arc::new(gate),
            options,
        }
    }

    pub fn options(&self) -> &CmsOptions {
        &self.options
    }

    pub fn context(&self) -> &CmsContext {
        &self.ctx
    }

    pub fn cache(&self) -> &QueryCache {
        &self.ctx.cache
    }

    pub fn gate(&self) -> Arc<SessionGate> {
        self.gate.clone()
    }

    pub fn language(&self) -> Language {
        self.ctx.language.get()
    }

    pub fn set_language(&self, lang: Language) {
        self.ctx.language.set(lang);
    }

    pub fn direction(&self) -> Direction {
        self.language().direction()
    }

    pub fn services(&self) -> ContentRepository<Service> {
        ContentRepository::new(self.ctx.clone())
    }

    pub fn industries(&self) -> ContentRepository<Industry> {
        ContentRepository::new(self.ctx.clone())
    }

    pub fn blog_posts(&self) -> BlogRepository {
        BlogRepository::new(self.ctx.clone())
    }

    pub fn blog_categories(&self) -> ContentRepository<BlogCategory> {
        ContentRepository::new(self.ctx.clone())
    }

    pub fn testimonials(&self) -> ContentRepository<Testimonial> {
        ContentRepository::new(self.ctx.clone())
    }

    pub fn partners(&self) -> ContentRepository<Partner> {
        ContentRepository::new(self.ctx.clone())
    }

    pub fn faqs(&self) -> ContentRepository<Faq> {
        ContentRepository::new(self.ctx.clone())
    }

    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.ctx.clone())
    }

    pub fn settings(&self) -> SingletonRepository<SiteSettings> {
        SingletonRepository::new(self.ctx.clone())
    }

    pub fn homepage(&self) -> SingletonRepository<HomepageData> {
        SingletonRepository::new(self.ctx.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.ctx.clone())
    }

    /// Favicon/logo poller; drive it with [`BrandingRefresher::run`].
    pub fn branding_refresher(&self) -> BrandingRefresher {
        BrandingRefresher::new(
            self.ctx.clone(),
            self.options.branding_interval,
            self.options.branding_max_interval,
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{CurrentUser, GuardDecision, SessionGate};
    pub use crate::config::{CmsConfig, CmsOptions};
    pub use crate::content::ContentRepository;
    pub use crate::error::{Error, Result};
    pub use crate::i18n::{Direction, Language, Message};
    pub use crate::models::*;
    pub use crate::store::{Filter, ListQuery};
    pub use crate::Cms;
}

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::error::Error;
use crate::i18n::{Language, LanguageHandle, Message};
use crate::media::MediaStore;
use crate::notify::{Notifier, Toast};
use crate::store::ContentStore;

/// Handles every repository of one [`crate::Cms`] shares.
#[derive(Clone)]
pub struct CmsContext {
    pub store: Arc<dyn ContentStore>,
    pub cache: Arc<QueryCache>,
    pub media: Arc<dyn MediaStore>,
    pub notifier: Arc<dyn Notifier>,
    pub language: LanguageHandle,
}

impl CmsContext {
    pub fn new(
        store: Arc<dyn ContentStore>,
        media: Arc<dyn MediaStore>,
        notifier: Arc<dyn Notifier>,
        language: Language,
    ) -> Self {
        Self {
            store,
            cache: Arc::new(QueryCache::new()),
            media,
            notifier,
            language: LanguageHandle::new(language),
        }
    }

    pub(crate) fn success(&self, message: Message) {
        self.notifier
            .notify(Toast::success(message, self.language.get()));
    }

    /// Report `err` to the user. Backend failures show `fallback`; errors
    /// with their own catalog entry show that entry.
    pub(crate) fn failure(&self, fallback: Message, err: &Error) {
        let message = match err.user_message() {
            Message::StoreError => fallback,
            specific => specific,
        };
        self.report(message, err);
    }

    /// Report `err` with an explicit catalog entry.
    pub(crate) fn report(&self, message: Message, err: &Error) {
        tracing::warn!(error = %err, "{:?}", message);
        self.notifier.notify(Toast::error(message, self.language.get()));
    }
}

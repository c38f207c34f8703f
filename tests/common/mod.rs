#![allow(dead_code)]

use serde_json::json;
use std::sync::{Arc, Once};

use bilingual_cms::auth::{hash_password, MemorySessionStorage};
use bilingual_cms::config::CmsOptions;
use bilingual_cms::i18n::Language;
use bilingual_cms::media::MemoryMediaStore;
use bilingual_cms::notify::RecordingNotifier;
use bilingual_cms::store::{ContentStore, MemoryStore};
use bilingual_cms::Cms;

pub const SECRET: &[u8] = b"integration-secret-integration-secret";
pub const SESSION_KEY: &str = "cms_admin_session";
pub const PASSWORD: &str = "correct horse battery";

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        dotenv::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct TestCms {
    pub cms: Cms,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MemoryMediaStore>,
    pub sessions: Arc<MemorySessionStorage>,
    pub notifier: Arc<RecordingNotifier>,
}

/// In-memory CMS with one account per role.
pub async fn test_cms() -> TestCms {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    for (name, email, role) in [
        ("Root", "root@example.com", "super_admin"),
        ("Mona", "mona@example.com", "admin"),
        ("Eli", "eli@example.com", "editor"),
        ("Legacy", "legacy@example.com", "administrator"),
    ] {
        store
            .insert(
                "admin_users",
                json!({
                    "name": name,
                    "email": email,
                    "role": role,
                    "password_hash": hash_password(PASSWORD).unwrap(),
                }),
            )
            .await
            .unwrap();
    }

    let media = Arc::new(MemoryMediaStore::new("https://cdn.test/storage/v1/object/public/media"));
    let sessions = Arc::new(MemorySessionStorage::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let cms = Cms::with_parts(
        store.clone(),
        media.clone(),
        sessions.clone(),
        notifier.clone(),
        SECRET,
        CmsOptions::default().with_language(Language::En),
    );
    TestCms {
        cms,
        store,
        media,
        sessions,
        notifier,
    }
}

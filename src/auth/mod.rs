//! Admin session gate
//!
//! Credentials are checked against `admin_users` in this process, never in
//! the page. A successful login yields a signed, expiring token; the token is
//! the only thing persisted on the device. The gate is the single source of
//! the signed-in identity: views subscribe to it instead of reading storage.

mod password;
mod session;
mod storage;
mod token;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

pub use password::{hash_password, verify_password};
pub use session::Session;
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use token::{Claims, TokenSigner};

use crate::context::CmsContext;
use crate::error::{Error, Result};
use crate::i18n::Message;
use crate::models::{AdminCredentials, AdminUser, Entity, Role};
use crate::store::{Filter, ListQuery};

/// Identity shown in the admin navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Claims> for CurrentUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            name: claims.name.clone(),
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

/// Outcome of [`SessionGate::guard`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Persisted session not restored yet; render nothing
    Pending,
    Redirect(String),
}

#[derive(Default)]
struct GateState {
    session: Option<Session>,
    claims: Option<Claims>,
}

pub struct SessionGate {
    ctx: CmsContext,
    signer: TokenSigner,
    storage: Arc<dyn SessionStorage>,
    session_key: String,
    login_path: String,
    state: RwLock<GateState>,
    loaded: AtomicBool,
    user: watch::Sender<Option<CurrentUser>>,
}

impl SessionGate {
    pub fn new(
        ctx: CmsContext,
        signer: TokenSigner,
        storage: Arc<dyn SessionStorage>,
        session_key: &str,
        login_path: &str,
    ) -> Self {
        let (user, _) = watch::channel(None);
        Self {
            ctx,
            signer,
            storage,
            session_key: session_key.to_string(),
            login_path: login_path.to_string(),
            state: RwLock::new(GateState::default()),
            loaded: AtomicBool::new(false),
            user,
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// True once [`restore`](Self::restore) or [`login`](Self::login) finished
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user.borrow().clone()
    }

    /// Identity changes; the receiver starts with the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.user.subscribe()
    }

    /// Signed token of the current session
    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser> {
        match self.authenticate(email.trim(), password).await {
            Ok(user) => {
                self.ctx.success(Message::LoggedIn);
                Ok(user)
            }
            Err(err) => {
                let message = match &err {
                    Error::NotFound(_) => Message::AccountNotFound,
                    other => other.user_message(),
                };
                self.ctx.report(message, &err);
                Err(err)
            }
        }
    }

    /// Exact address first, then its lowercase form; rows created before
    /// emails were normalized keep their original casing.
    async fn find_account(&self, email: &str) -> Result<AdminCredentials> {
        let lowered = email.to_lowercase();
        let mut candidates = vec![email];
        if lowered != email {
            candidates.push(lowered.as_str());
        }

        for candidate in candidates {
            let query = ListQuery::new()
                .columns("id,name,email,role,password_hash")
                .filter(Filter::eq("email", candidate))
                .limit(1);
            if let Some(row) = self.ctx.store.select_one(AdminUser::TABLE, &query).await? {
                return Ok(serde_json::from_value(row)?);
            }
        }
        Err(Error::not_found(format!("admin user {}", email)))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<CurrentUser> {
        let account = self.find_account(email).await?;

        let hash = account
            .password_hash
            .as_deref()
            .ok_or(Error::InvalidCredentials)?;
        verify_password(password, hash)?;

        if !account.role.grants_admin() {
            return Err(Error::forbidden(format!(
                "role {} cannot open the admin panel",
                account.role
            )));
        }

        let user = AdminUser {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            created_at: None,
            updated_at: None,
        };
        let (token, claims) = self.signer.issue(&user)?;
        let session = Session::new(token, &claims);
        self.storage
            .save(&self.session_key, &serde_json::to_string(&session)?)
            .await?;

        tracing::info!(user_id = %claims.sub, role = %claims.role, "admin signed in");
        Ok(self.install(session, claims))
    }

    fn install(&self, session: Session, claims: Claims) -> CurrentUser {
        let user = CurrentUser::from(&claims);
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.session = Some(session);
            state.claims = Some(claims);
        }
        self.loaded.store(true, Ordering::SeqCst);
        self.user.send_replace(Some(user.clone()));
        user
    }

    fn clear(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = GateState::default();
        self.user.send_replace(None);
    }

    pub async fn logout(&self) -> Result<()> {
        self.clear();
        match self.storage.remove(&self.session_key).await {
            Ok(()) => {
                tracing::info!("admin signed out");
                self.ctx.success(Message::LoggedOut);
                Ok(())
            }
            Err(err) => {
                self.ctx.failure(Message::StoreError, &err);
                Err(err)
            }
        }
    }

    /// Re-establish the persisted session.
    ///
    /// A token that fails signature or expiry checks, or a record that does
    /// not parse, is removed from storage and leaves the gate signed out.
    pub async fn restore(&self) -> Result<Option<CurrentUser>> {
        let result = self.restore_inner().await;
        self.loaded.store(true, Ordering::SeqCst);
        result
    }

    async fn restore_inner(&self) -> Result<Option<CurrentUser>> {
        let Some(raw) = self.storage.load(&self.session_key).await? else {
            self.clear();
            return Ok(None);
        };

        let verified = serde_json::from_str::<Session>(&raw)
            .map_err(Error::from)
            .and_then(|session| {
                let claims = self.signer.verify(&session.access_token)?;
                Ok((session, claims))
            });

        match verified {
            Ok((session, claims)) => Ok(Some(self.install(session, claims))),
            Err(err) => {
                tracing::warn!(error = %err, "discarding persisted session");
                self.clear();
                self.storage.remove(&self.session_key).await?;
                self.ctx.report(Message::SessionExpired, &err);
                Ok(None)
            }
        }
    }

    /// Route check for `/admin/*`. Expiry and role are re-checked on every
    /// call. Paths compare case-insensitively with repeated slashes collapsed.
    pub fn guard(&self, path: &str) -> GuardDecision {
        let path = normalize_path(path);
        if !is_admin_path(&path) || path == normalize_path(&self.login_path) {
            return GuardDecision::Allow;
        }
        if !self.is_loaded() {
            return GuardDecision::Pending;
        }

        let rejected = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match &state.claims {
                Some(claims) if !claims.is_expired() && claims.role.grants_admin() => {
                    return GuardDecision::Allow
                }
                Some(claims) => Some(claims.role),
                None => None,
            }
        };
        if let Some(role) = rejected {
            tracing::info!(role = %role, "admin session no longer valid");
            self.clear();
        }
        GuardDecision::Redirect(self.login_path.clone())
    }
}

/// Lowercased path without query, fragment, empty segments or trailing slash.
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/")).to_lowercase()
}

fn is_admin_path(normalized: &str) -> bool {
    normalized == "/admin" || normalized.starts_with("/admin/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::media::MemoryMediaStore;
    use crate::notify::RecordingNotifier;
    use crate::store::{ContentStore, MemoryStore};
    use chrono::Duration;
    use serde_json::json;

    const KEY: &str = "cms_admin_session";

    struct Fixture {
        gate: SessionGate,
        storage: Arc<MemorySessionStorage>,
        notifier: Arc<RecordingNotifier>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(
                "admin_users",
                json!({
                    "name": "Mona",
                    "email": "mona@example.com",
                    "role": "admin",
                    "password_hash": hash_password("correct horse").unwrap()
                }),
            )
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let storage = Arc::new(MemorySessionStorage::new());
        let ctx = CmsContext::new(
            store,
            Arc::new(MemoryMediaStore::new("https://cdn.test")),
            notifier.clone(),
            Language::En,
        );
        let gate = SessionGate::new(
            ctx,
            TokenSigner::new(b"0123456789abcdef0123456789abcdef", Duration::hours(8)),
            storage.clone(),
            KEY,
            "/admin/login",
        );
        Fixture {
            gate,
            storage,
            notifier,
        }
    }

    #[tokio::test]
    async fn guard_is_pending_until_restored() {
        let f = fixture().await;
        assert_eq!(f.gate.guard("/admin/services"), GuardDecision::Pending);
        assert_eq!(f.gate.guard("/admin/login"), GuardDecision::Allow);
        assert_eq!(f.gate.guard("/about"), GuardDecision::Allow);
        assert_eq!(f.gate.guard("/administrators"), GuardDecision::Allow);

        assert_eq!(f.gate.restore().await.unwrap(), None);
        assert_eq!(
            f.gate.guard("/admin"),
            GuardDecision::Redirect("/admin/login".into())
        );
    }

    #[test]
    fn paths_normalize_before_matching() {
        assert_eq!(normalize_path("//Admin//Services/?x=1"), "/admin/services");
        assert_eq!(normalize_path("/ADMIN#top"), "/admin");
        assert_eq!(normalize_path(""), "/");
        assert!(is_admin_path(&normalize_path("/Admin")));
        assert!(!is_admin_path(&normalize_path("/administrators")));
    }

    #[tokio::test]
    async fn login_then_restore_in_a_fresh_gate() {
        let f = fixture().await;
        let user = f.gate.login("mona@example.com", "correct horse").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(f.gate.guard("/admin/blog?page=2"), GuardDecision::Allow);
        assert_eq!(f.notifier.last().unwrap().message, Message::LoggedIn);

        let persisted = f.storage.get(KEY).unwrap();
        let session: Session = serde_json::from_str(&persisted).unwrap();
        assert_eq!(session.user_id, user.id);
        assert!(!persisted.contains("correct horse"));
        assert!(!persisted.contains("argon2"));
        assert_eq!(f.gate.access_token(), Some(session.access_token));
    }

    #[tokio::test]
    async fn unknown_email_reports_account_not_found() {
        let f = fixture().await;
        let err = f.gate.login("nobody@example.com", "x").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(f.notifier.last().unwrap().message, Message::AccountNotFound);
        assert!(f.storage.get(KEY).is_none());
    }

    #[tokio::test]
    async fn subscribers_see_login_and_logout() {
        let f = fixture().await;
        let mut rx = f.gate.subscribe();
        assert!(rx.borrow().is_none());

        f.gate.login("mona@example.com", "correct horse").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|u| u.name.clone()), Some("Mona".into()));

        f.gate.logout().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(f.gate.current_user().is_none());
    }

    #[tokio::test]
    async fn unparsable_record_is_discarded() {
        let f = fixture().await;
        f.storage.save(KEY, "{\"user\":{\"password\":\"x\"}}").await.unwrap();
        assert_eq!(f.gate.restore().await.unwrap(), None);
        assert!(f.storage.get(KEY).is_none());
        assert_eq!(f.notifier.last().unwrap().message, Message::SessionExpired);
    }
}

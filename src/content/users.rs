use serde_json::{json, Value};

use super::ContentRepository;
use crate::auth::hash_password;
use crate::context::CmsContext;
use crate::error::{Error, Result};
use crate::i18n::Message;
use crate::models::{AdminUser, Entity, NewAdminUser, Role};
use crate::store::{Filter, ListQuery};

/// Admin accounts. Passwords are hashed here; hashes never reach the cache.
///
/// Writes go only through [`create_user`](Self::create_user),
/// [`set_password`](Self::set_password) and [`set_role`](Self::set_role),
/// so credential columns cannot be set from a raw form.
pub struct UserRepository {
    users: ContentRepository<AdminUser>,
}

impl UserRepository {
    pub fn new(ctx: CmsContext) -> Self {
        Self {
            users: ContentRepository::new(ctx),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.users.is_loading()
    }

    pub fn is_saving(&self) -> bool {
        self.users.is_saving()
    }

    pub async fn list(&self) -> Result<Vec<AdminUser>> {
        self.users.list().await
    }

    pub async fn ensure_list(&self) -> Result<Vec<AdminUser>> {
        self.users.ensure_list().await
    }

    pub fn items(&self) -> Vec<AdminUser> {
        self.users.items()
    }

    pub async fn get(&self, id: &str) -> Result<AdminUser> {
        self.users.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.users.delete(id).await
    }

    fn context(&self) -> &CmsContext {
        self.users.context()
    }

    /// Emails are unique; a taken one is a [`Error::Conflict`].
    pub async fn create_user(&self, user: &NewAdminUser) -> Result<AdminUser> {
        let result = self.insert_user(user).await;
        match &result {
            Ok(_) => self.context().success(Message::Created),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }

    async fn insert_user(&self, user: &NewAdminUser) -> Result<AdminUser> {
        let email = user.email.trim().to_lowercase();
        let taken = ListQuery::new()
            .columns("id")
            .filter(Filter::eq("email", email.as_str()));
        if self
            .context()
            .store
            .select_one(AdminUser::TABLE, &taken)
            .await?
            .is_some()
        {
            return Err(Error::conflict(format!("email {} is already registered", email)));
        }

        let row = json!({
            "name": user.name,
            "email": email,
            "role": user.role,
            "password_hash": hash_password(&user.password)?,
        });
        self.users.insert_row(&row).await
    }

    pub async fn set_password(&self, id: &str, password: &str) -> Result<AdminUser> {
        let result = async {
            let patch = json!({ "password_hash": hash_password(password)? });
            self.users.patch_row(id, &patch, None).await
        }
        .await;
        self.report(result)
    }

    pub async fn set_role(&self, id: &str, role: Role) -> Result<AdminUser> {
        let patch: Value = json!({ "role": role });
        let result = self.users.patch_row(id, &patch, None).await;
        self.report(result)
    }

    fn report(&self, result: Result<AdminUser>) -> Result<AdminUser> {
        match &result {
            Ok(_) => self.context().success(Message::Updated),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::i18n::Language;
    use crate::media::MemoryMediaStore;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn repo() -> (UserRepository, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let users = UserRepository::new(CmsContext::new(
            store.clone(),
            Arc::new(MemoryMediaStore::new("https://cdn.test")),
            Arc::new(RecordingNotifier::new()),
            Language::En,
        ));
        (users, store)
    }

    fn new_user(email: &str) -> NewAdminUser {
        NewAdminUser {
            name: "Omar".into(),
            email: email.into(),
            password: "pa55word!".into(),
            role: Role::Editor,
        }
    }

    #[tokio::test]
    async fn stored_password_is_hashed_and_hidden_from_cache() {
        let (users, store) = repo();
        users.list().await.unwrap();
        let created = users.create_user(&new_user("Omar@Example.com")).await.unwrap();
        assert_eq!(created.email, "omar@example.com");

        let stored = &store.rows("admin_users")[0];
        let hash = stored["password_hash"].as_str().unwrap();
        assert!(verify_password("pa55word!", hash).is_ok());
        assert!(!stored.to_string().contains("pa55word!"));

        let cached = users.items();
        assert_eq!(cached.len(), 1);
        let cache_dump = serde_json::to_string(&cached).unwrap();
        assert!(!cache_dump.contains("argon2"));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (users, _) = repo();
        users.create_user(&new_user("a@example.com")).await.unwrap();
        let err = users.create_user(&new_user("A@example.com ")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn role_and_password_changes() {
        let (users, store) = repo();
        let user = users.create_user(&new_user("r@example.com")).await.unwrap();
        let promoted = users.set_role(&user.id, Role::SuperAdmin).await.unwrap();
        assert_eq!(promoted.role, Role::SuperAdmin);

        users.set_password(&user.id, "n3w-secret").await.unwrap();
        let hash = store.rows("admin_users")[0]["password_hash"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(verify_password("n3w-secret", &hash).is_ok());
        assert!(verify_password("pa55word!", &hash).is_err());
    }

    #[tokio::test]
    async fn reads_and_delete_go_through_without_credentials() {
        let (users, store) = repo();
        let user = users.create_user(&new_user("d@example.com")).await.unwrap();
        users.ensure_list().await.unwrap();

        let fetched = users.get(&user.id).await.unwrap();
        assert_eq!(fetched.email, "d@example.com");
        let dump = serde_json::to_string(&users.items()).unwrap();
        assert!(!dump.contains("password"));

        users.delete(&user.id).await.unwrap();
        assert!(users.items().is_empty());
        assert!(store.rows("admin_users").is_empty());
        assert!(!users.is_saving());
    }
}

//! Data-access repositories, one per content table.
//!
//! Every repository reads through the shared [`QueryCache`](crate::cache::QueryCache)
//! and patches it after a successful write, so views built from the same
//! [`crate::Cms`] agree without re-fetching. Failures are reported to the
//! notifier and returned to the caller; local state is left as it was.

mod blog;
mod messages;
mod singleton;
mod users;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::context::CmsContext;
use crate::error::{Error, Result};
use crate::i18n::Message;
use crate::media::{media_path, MediaFile};
use crate::models::Entity;
use crate::store::{Filter, ListQuery};

pub use blog::{category_for, BlogRepository};
pub use messages::MessageRepository;
pub use singleton::SingletonRepository;
pub use users::UserRepository;

/// Counts an operation as in flight until dropped.
struct Busy<'a>(&'a AtomicUsize);

impl<'a> Busy<'a> {
    fn start(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Busy(count)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serialize form input into a row patch. Client-supplied ids are dropped.
pub(crate) fn to_fields<T: Serialize + ?Sized>(fields: &T) -> Result<serde_json::Map<String, Value>> {
    match serde_json::to_value(fields)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(Error::from(bilingual_cms_postgrest::PostgrestError::InvalidParameters(
            format!("expected an object of columns, got {}", other),
        ))),
    }
}

/// CRUD for one table
pub struct ContentRepository<E: Entity> {
    ctx: CmsContext,
    query: RwLock<ListQuery>,
    loading: AtomicUsize,
    saving: AtomicUsize,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> ContentRepository<E> {
    pub fn new(ctx: CmsContext) -> Self {
        Self {
            ctx,
            query: RwLock::new(Self::default_query()),
            loading: AtomicUsize::new(0),
            saving: AtomicUsize::new(0),
            _entity: PhantomData,
        }
    }

    /// All rows in the entity's fixed order
    pub fn default_query() -> ListQuery {
        let (column, order) = E::ORDER_BY;
        ListQuery::new().columns(E::COLUMNS).order(column, order)
    }

    pub fn context(&self) -> &CmsContext {
        &self.ctx
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst) > 0
    }

    /// Query behind [`items`](Self::items)
    pub fn current_query(&self) -> ListQuery {
        self.query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn list(&self) -> Result<Vec<E>> {
        self.list_with(Self::default_query()).await
    }

    /// Read with extra predicates. Missing ordering and columns default to
    /// the entity's.
    pub async fn list_with(&self, mut query: ListQuery) -> Result<Vec<E>> {
        if query.order.is_empty() {
            let (column, order) = E::ORDER_BY;
            query = query.order(column, order);
        }
        if query.columns.is_none() {
            query = query.columns(E::COLUMNS);
        }

        let _busy = Busy::start(&self.loading);
        let rows = match self.ctx.store.select(E::TABLE, &query).await {
            Ok(rows) => rows,
            Err(err) => {
                self.ctx.failure(Message::LoadFailed, &err);
                return Err(err);
            }
        };

        let rows: Vec<Value> = rows.into_iter().map(sanitized::<E>).collect();
        let items = decode_rows::<E>(&rows);
        self.ctx.cache.put(E::TABLE, &query, rows);
        *self.query.write().unwrap_or_else(PoisonError::into_inner) = query;
        tracing::debug!(table = E::TABLE, count = items.len(), "listed");
        Ok(items)
    }

    /// Cached rows of the default query, fetching only on a miss.
    pub async fn ensure_list(&self) -> Result<Vec<E>> {
        let query = Self::default_query();
        match self.ctx.cache.get(E::TABLE, &query) {
            Some(rows) => {
                *self.query.write().unwrap_or_else(PoisonError::into_inner) = query;
                Ok(decode_rows::<E>(&rows))
            }
            None => self.list().await,
        }
    }

    /// Local state for the last listed query
    pub fn items(&self) -> Vec<E> {
        self.ctx
            .cache
            .get(E::TABLE, &self.current_query())
            .map(|rows| decode_rows::<E>(&rows))
            .unwrap_or_default()
    }

    pub async fn get(&self, id: &str) -> Result<E> {
        let query = ListQuery::new()
            .columns(E::COLUMNS)
            .filter(Filter::eq("id", id));
        let row = match self.ctx.store.select_one(E::TABLE, &query).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                let err = Error::not_found(format!("{} {}", E::TABLE, id));
                self.ctx.failure(Message::LoadFailed, &err);
                return Err(err);
            }
            Err(err) => {
                self.ctx.failure(Message::LoadFailed, &err);
                return Err(err);
            }
        };
        Ok(serde_json::from_value(sanitized::<E>(row))?)
    }

    pub async fn create<T: Serialize + ?Sized>(&self, fields: &T) -> Result<E> {
        let result = self.insert_row(fields).await;
        match &result {
            Ok(_) => self.ctx.success(Message::Created),
            Err(err) => self.ctx.failure(Message::SaveFailed, err),
        }
        result
    }

    pub(crate) async fn insert_row<T: Serialize + ?Sized>(&self, fields: &T) -> Result<E> {
        Ok(self.insert_raw(fields).await?.0)
    }

    /// Insert and return the item with the sanitized row it was decoded from.
    pub(crate) async fn insert_raw<T: Serialize + ?Sized>(&self, fields: &T) -> Result<(E, Value)> {
        let _busy = Busy::start(&self.saving);
        let row = Value::Object(to_fields(fields)?);
        let row = sanitized::<E>(self.ctx.store.insert(E::TABLE, row).await?);
        let item: E = serde_json::from_value(row.clone())?;
        self.ctx.cache.apply_insert(E::TABLE, &row);
        tracing::info!(table = E::TABLE, id = item.id(), "created");
        Ok((item, row))
    }

    /// Patch the row with `id`. Only the given columns change.
    pub async fn update<T: Serialize + ?Sized>(&self, id: &str, partial: &T) -> Result<E> {
        let result = self.patch_row(id, partial, None).await;
        match &result {
            Ok(_) => self.ctx.success(Message::Updated),
            Err(err) => self.ctx.failure(Message::SaveFailed, err),
        }
        result
    }

    /// Patch only if the row still carries `expected_updated_at`.
    ///
    /// Returns [`Error::Conflict`] when someone else saved in between and
    /// [`Error::NotFound`] when the row is gone.
    pub async fn update_if_unmodified<T: Serialize + ?Sized>(
        &self,
        id: &str,
        expected_updated_at: DateTime<Utc>,
        partial: &T,
    ) -> Result<E> {
        let result = self.patch_row(id, partial, Some(expected_updated_at)).await;
        match &result {
            Ok(_) => self.ctx.success(Message::Updated),
            Err(err) => self.ctx.failure(Message::SaveFailed, err),
        }
        result
    }

    pub(crate) async fn patch_row<T: Serialize + ?Sized>(
        &self,
        id: &str,
        partial: &T,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<E> {
        Ok(self.patch_raw(id, partial, expected_updated_at).await?.0)
    }

    pub(crate) async fn patch_raw<T: Serialize + ?Sized>(
        &self,
        id: &str,
        partial: &T,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(E, Value)> {
        let _busy = Busy::start(&self.saving);
        let mut patch = to_fields(partial)?;
        patch.insert(
            "updated_at".to_string(),
            Value::String(timestamp(Utc::now())),
        );

        let mut filters = vec![Filter::eq("id", id)];
        if let Some(expected) = expected_updated_at {
            filters.push(Filter::eq("updated_at", timestamp(expected)));
        }

        let rows = self
            .ctx
            .store
            .update(E::TABLE, &filters, Value::Object(patch))
            .await?;
        let Some(row) = rows.into_iter().next() else {
            return Err(self.missing_or_conflict(id, expected_updated_at.is_some()).await);
        };

        let row = sanitized::<E>(row);
        let item: E = serde_json::from_value(row.clone())?;
        self.ctx.cache.apply_update(E::TABLE, &row);
        tracing::info!(table = E::TABLE, id, "updated");
        Ok((item, row))
    }

    async fn missing_or_conflict(&self, id: &str, guarded: bool) -> Error {
        if guarded {
            let query = ListQuery::new().columns("id").filter(Filter::eq("id", id));
            match self.ctx.store.select_one(E::TABLE, &query).await {
                Ok(Some(_)) => {
                    return Error::conflict(format!("{} {} was modified", E::TABLE, id));
                }
                Ok(None) => {}
                Err(err) => return err,
            }
        }
        Error::not_found(format!("{} {}", E::TABLE, id))
    }

    /// Hard delete. An id that no longer exists is not an error.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = self.delete_row(id).await;
        match &result {
            Ok(()) => self.ctx.success(Message::Deleted),
            Err(err) => self.ctx.failure(Message::DeleteFailed, err),
        }
        result
    }

    async fn delete_row(&self, id: &str) -> Result<()> {
        let _busy = Busy::start(&self.saving);
        let removed = self
            .ctx
            .store
            .delete(E::TABLE, &[Filter::eq("id", id)])
            .await?;
        self.ctx.cache.apply_remove(E::TABLE, id);
        tracing::info!(table = E::TABLE, id, removed = removed.len(), "deleted");
        Ok(())
    }

    /// Upload under `{kind}-{millis}.{ext}` and return the public URL.
    pub async fn upload_media(&self, file: &MediaFile) -> Option<String> {
        self.upload_media_as(E::MEDIA_KIND, file).await
    }

    pub async fn upload_media_as(&self, kind: &str, file: &MediaFile) -> Option<String> {
        let _busy = Busy::start(&self.saving);
        let path = media_path(kind, file, Utc::now());
        match self.ctx.media.put(&path, file).await {
            Ok(()) => {
                tracing::info!(path = %path, "uploaded");
                self.ctx.success(Message::Uploaded);
                Some(self.ctx.media.public_url(&path))
            }
            Err(err) => {
                self.ctx.failure(Message::UploadFailed, &err);
                None
            }
        }
    }
}

fn sanitized<E: Entity>(mut row: Value) -> Value {
    E::sanitize(&mut row);
    row
}

fn decode_rows<E: Entity>(rows: &[Value]) -> Vec<E> {
    rows.iter()
        .filter_map(|row| match serde_json::from_value::<E>(row.clone()) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(table = E::TABLE, error = %err, "skipping undecodable row");
                None
            }
        })
        .collect()
}

use serde::Serialize;
use std::ops::Deref;
use std::sync::PoisonError;

use super::ContentRepository;
use crate::context::CmsContext;
use crate::error::Result;
use crate::i18n::Message;
use crate::models::{Branding, Entity, SiteSettings};
use crate::store::ListQuery;

/// Tables holding one configuration row (`site_settings`, `homepage_content`)
pub struct SingletonRepository<E: Entity> {
    rows: ContentRepository<E>,
}

impl<E: Entity> Deref for SingletonRepository<E> {
    type Target = ContentRepository<E>;

    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

impl<E: Entity> SingletonRepository<E> {
    pub fn new(ctx: CmsContext) -> Self {
        Self {
            rows: ContentRepository::new(ctx),
        }
    }

    fn query() -> ListQuery {
        ContentRepository::<E>::default_query().limit(1)
    }

    /// The row, or `None` before anything was saved.
    pub async fn load(&self) -> Result<Option<E>> {
        Ok(self.rows.list_with(Self::query()).await?.into_iter().next())
    }

    /// Last loaded or saved row
    pub fn current(&self) -> Option<E> {
        self.context()
            .cache
            .get(E::TABLE, &Self::query())
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| serde_json::from_value(row).ok())
    }

    /// Update the row when present, insert it otherwise.
    ///
    /// The presence check and the write are two round trips. Two admins
    /// saving the first row at the same moment can both insert; [`load`]
    /// then returns the most recently updated one.
    ///
    /// [`load`]: Self::load
    pub async fn save<T: Serialize + ?Sized>(&self, fields: &T) -> Result<E> {
        let result = self.upsert(fields).await;
        match &result {
            Ok(_) => self.context().success(Message::Saved),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }

    async fn upsert<T: Serialize + ?Sized>(&self, fields: &T) -> Result<E> {
        let query = ListQuery::new().columns("id");
        let existing = self.context().store.select_one(E::TABLE, &query).await?;
        let (item, row) = match existing.as_ref().and_then(crate::cache::row_id) {
            Some(id) => self.rows.patch_raw(&id, fields, None).await?,
            None => self.rows.insert_raw(fields).await?,
        };
        let query = Self::query();
        self.context().cache.put(E::TABLE, &query, vec![row]);
        *self.rows.query.write().unwrap_or_else(PoisonError::into_inner) = query;
        Ok(item)
    }
}

impl SingletonRepository<SiteSettings> {
    /// Logo and favicon as currently stored
    pub async fn branding(&self) -> Result<Branding> {
        Ok(self.load().await?.map(|s| s.branding()).unwrap_or_default())
    }
}

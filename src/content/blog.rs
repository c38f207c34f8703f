use chrono::Utc;
use serde_json::Value;
use std::ops::Deref;

use bilingual_cms_postgrest::SortOrder;

use super::{timestamp, to_fields, ContentRepository};
use crate::context::CmsContext;
use crate::error::{Error, Result};
use crate::i18n::Message;
use crate::models::{slugify, BlogCategory, BlogPost, BlogPostDraft, Entity};
use crate::store::{Filter, ListQuery};

/// Posts with publish state on top of the generic operations
pub struct BlogRepository {
    posts: ContentRepository<BlogPost>,
}

impl Deref for BlogRepository {
    type Target = ContentRepository<BlogPost>;

    fn deref(&self) -> &Self::Target {
        &self.posts
    }
}

impl BlogRepository {
    pub fn new(ctx: CmsContext) -> Self {
        Self {
            posts: ContentRepository::new(ctx),
        }
    }

    /// Create (`id` is `None`) or overwrite a post from the editor form.
    ///
    /// `publish` stamps `published_at` with the current time; saving without
    /// it leaves the post as a draft.
    pub async fn save_post(&self, id: Option<&str>, draft: &BlogPostDraft, publish: bool) -> Result<BlogPost> {
        let result = self.write_post(id, draft, publish).await;
        match &result {
            Ok(_) if publish => self.context().success(Message::Published),
            Ok(_) => self.context().success(Message::Saved),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }

    async fn write_post(&self, id: Option<&str>, draft: &BlogPostDraft, publish: bool) -> Result<BlogPost> {
        let mut fields = to_fields(draft)?;
        let slug = if draft.slug.trim().is_empty() {
            post_slug(&draft.title_en)
        } else {
            slugify(&draft.slug)
        };
        fields.insert("slug".to_string(), Value::String(slug));
        let published_at = if publish {
            Value::String(timestamp(Utc::now()))
        } else {
            Value::Null
        };
        fields.insert("published_at".to_string(), published_at);

        match id {
            Some(id) => self.posts.patch_row(id, &fields, None).await,
            None => self.posts.insert_row(&fields).await,
        }
    }

    /// Back to draft
    pub async fn unpublish(&self, id: &str) -> Result<BlogPost> {
        let patch = serde_json::json!({ "published_at": null });
        let result = self.posts.patch_row(id, &patch, None).await;
        match &result {
            Ok(_) => self.context().success(Message::Unpublished),
            Err(err) => self.context().failure(Message::SaveFailed, err),
        }
        result
    }

    /// Public listing, newest publication first
    pub async fn list_published(&self) -> Result<Vec<BlogPost>> {
        let query = ListQuery::new()
            .filter(Filter::not_null("published_at"))
            .order("published_at", SortOrder::Descending);
        self.posts.list_with(query).await
    }

    /// Published post behind a public URL
    pub async fn find_by_slug(&self, slug: &str) -> Result<BlogPost> {
        let query = ListQuery::new()
            .filter(Filter::eq("slug", slug))
            .filter(Filter::not_null("published_at"));
        match self.context().store.select_one(BlogPost::TABLE, &query).await? {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(Error::not_found(format!("post {}", slug))),
        }
    }
}

fn post_slug(title_en: &str) -> String {
    let slug = slugify(title_en);
    if slug.is_empty() {
        format!("post-{}", Utc::now().timestamp_millis())
    } else {
        slug
    }
}

/// Category of `post` among `categories`. A dangling or missing id yields `None`.
pub fn category_for<'a>(post: &BlogPost, categories: &'a [BlogCategory]) -> Option<&'a BlogCategory> {
    let id = post.category_id.as_deref()?;
    categories.iter().find(|category| category.id == id)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::i18n::{pick, pick_opt, Language};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogCategory {
    pub id: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub slug: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlogCategory {
    pub fn name(&self, lang: Language) -> &str {
        pick(lang, &self.name_ar, &self.name_en)
    }
}

impl Entity for BlogCategory {
    const TABLE: &'static str = "blog_categories";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    #[serde(default)]
    pub title_ar: String,
    #[serde(default)]
    pub title_en: String,
    pub excerpt_ar: Option<String>,
    pub excerpt_en: Option<String>,
    #[serde(default)]
    pub content_ar: String,
    #[serde(default)]
    pub content_en: String,
    #[serde(default)]
    pub slug: String,
    /// Soft reference; the category may have been deleted.
    pub category_id: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn title(&self, lang: Language) -> &str {
        pick(lang, &self.title_ar, &self.title_en)
    }

    pub fn excerpt(&self, lang: Language) -> &str {
        pick_opt(lang, &self.excerpt_ar, &self.excerpt_en)
    }

    pub fn content(&self, lang: Language) -> &str {
        pick(lang, &self.content_ar, &self.content_en)
    }
}

impl Entity for BlogPost {
    const TABLE: &'static str = "blog_posts";
    const MEDIA_KIND: &'static str = "blog";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Editor form for a post. `published_at` is decided at save time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPostDraft {
    pub title_ar: String,
    pub title_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt_en: Option<String>,
    pub content_ar: String,
    pub content_en: String,
    /// Generated from the English title when empty
    #[serde(default)]
    pub slug: String,
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// URL slug: lowercase ASCII alphanumerics joined by single hyphens.
///
/// Returns an empty string when the title has no ASCII letters or digits
/// (an Arabic-only title, for instance).
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

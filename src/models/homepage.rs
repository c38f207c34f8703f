use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Entity;
use crate::i18n::{pick, Language};

/// Hero and about copy of the landing page. One row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomepageData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub hero_title_ar: String,
    #[serde(default)]
    pub hero_title_en: String,
    #[serde(default)]
    pub hero_subtitle_ar: String,
    #[serde(default)]
    pub hero_subtitle_en: String,
    pub hero_image: Option<String>,
    #[serde(default)]
    pub about_ar: String,
    #[serde(default)]
    pub about_en: String,
    /// Free-form counters, e.g. `[{"value": "120+", "label_en": "Clients"}]`
    #[serde(default)]
    pub stats: Value,
    #[serde(skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl HomepageData {
    pub fn hero_title(&self, lang: Language) -> &str {
        pick(lang, &self.hero_title_ar, &self.hero_title_en)
    }

    pub fn hero_subtitle(&self, lang: Language) -> &str {
        pick(lang, &self.hero_subtitle_ar, &self.hero_subtitle_en)
    }
}

impl Entity for HomepageData {
    const TABLE: &'static str = "homepage_content";
    const ORDER_BY: (&'static str, bilingual_cms_postgrest::SortOrder) =
        ("updated_at", bilingual_cms_postgrest::SortOrder::Descending);
    const MEDIA_KIND: &'static str = "hero";

    fn id(&self) -> &str {
        &self.id
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bilingual_cms_postgrest::SortOrder;

use super::Entity;
use crate::i18n::{pick, pick_opt, Language};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Service {
    pub fn name(&self, lang: Language) -> &str {
        pick(lang, &self.name_ar, &self.name_en)
    }

    pub fn description(&self, lang: Language) -> &str {
        pick_opt(lang, &self.description_ar, &self.description_en)
    }
}

impl Entity for Service {
    const TABLE: &'static str = "services";
    const MEDIA_KIND: &'static str = "service";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Industry {
    pub id: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Industry {
    pub fn name(&self, lang: Language) -> &str {
        pick(lang, &self.name_ar, &self.name_en)
    }
}

impl Entity for Industry {
    const TABLE: &'static str = "industries";
    const MEDIA_KIND: &'static str = "industry";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    #[serde(default)]
    pub client_name_ar: String,
    #[serde(default)]
    pub client_name_en: String,
    pub company_ar: Option<String>,
    pub company_en: Option<String>,
    #[serde(default)]
    pub content_ar: String,
    #[serde(default)]
    pub content_en: String,
    pub rating: Option<u8>,
    pub avatar_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Testimonial {
    pub fn client_name(&self, lang: Language) -> &str {
        pick(lang, &self.client_name_ar, &self.client_name_en)
    }

    pub fn content(&self, lang: Language) -> &str {
        pick(lang, &self.content_ar, &self.content_en)
    }
}

impl Entity for Testimonial {
    const TABLE: &'static str = "testimonials";
    const MEDIA_KIND: &'static str = "avatar";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    #[serde(default)]
    pub name_ar: String,
    #[serde(default)]
    pub name_en: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Partner {
    const TABLE: &'static str = "partners";
    const ORDER_BY: (&'static str, SortOrder) = ("display_order", SortOrder::Ascending);
    const MEDIA_KIND: &'static str = "partner";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
    #[serde(default)]
    pub question_ar: String,
    #[serde(default)]
    pub question_en: String,
    #[serde(default)]
    pub answer_ar: String,
    #[serde(default)]
    pub answer_en: String,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Faq {
    pub fn question(&self, lang: Language) -> &str {
        pick(lang, &self.question_ar, &self.question_en)
    }

    pub fn answer(&self, lang: Language) -> &str {
        pick(lang, &self.answer_ar, &self.answer_en)
    }
}

impl Entity for Faq {
    const TABLE: &'static str = "faqs";
    const ORDER_BY: (&'static str, SortOrder) = ("display_order", SortOrder::Ascending);

    fn id(&self) -> &str {
        &self.id
    }
}

fn default_true() -> bool {
    true
}

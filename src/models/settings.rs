use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;

/// Single-row site configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub site_name_ar: String,
    #[serde(default)]
    pub site_name_en: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address_ar: Option<String>,
    pub address_en: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SiteSettings {
    pub fn branding(&self) -> Branding {
        Branding {
            logo_url: self.logo_url.clone(),
            favicon_url: self.favicon_url.clone(),
        }
    }
}

impl Entity for SiteSettings {
    const TABLE: &'static str = "site_settings";
    const ORDER_BY: (&'static str, bilingual_cms_postgrest::SortOrder) =
        ("updated_at", bilingual_cms_postgrest::SortOrder::Descending);
    const MEDIA_KIND: &'static str = "logo";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Images the page head and header render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branding {
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
}

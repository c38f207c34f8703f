//! Rows of the content tables

mod admin_user;
mod blog;
mod content;
mod homepage;
mod message;
mod settings;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use bilingual_cms_postgrest::SortOrder;

pub use admin_user::*;
pub use blog::*;
pub use content::*;
pub use homepage::*;
pub use message::*;
pub use settings::*;

/// A row type bound to one table.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    /// Fixed list ordering
    const ORDER_BY: (&'static str, SortOrder) = ("created_at", SortOrder::Descending);

    /// Columns requested on reads
    const COLUMNS: &'static str = "*";

    /// Prefix for generated media names, e.g. `service-1700000000000.png`
    const MEDIA_KIND: &'static str = "media";

    fn id(&self) -> &str;

    /// Strip columns that must never reach the client cache.
    fn sanitize(_row: &mut Value) {}
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::Entity;

/// Admin panel role.
///
/// Only `super_admin` and `admin` open `/admin/*`. Anything else stored in the
/// column, including the legacy `administrator`, reads as [`Role::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Editor,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Unknown => "unknown",
        }
    }

    pub fn grants_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of `admin_users` as the panel sees it. The password hash is never
/// selected into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for AdminUser {
    const TABLE: &'static str = "admin_users";
    const COLUMNS: &'static str = "id,name,email,role,created_at,updated_at";

    fn id(&self) -> &str {
        &self.id
    }

    fn sanitize(row: &mut Value) {
        if let Value::Object(fields) = row {
            fields.remove("password_hash");
            fields.remove("password");
        }
    }
}

/// Form input for a new admin account
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Row used only for credential checks
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AdminCredentials {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub password_hash: Option<String>,
}

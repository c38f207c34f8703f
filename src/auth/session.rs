//! What the device keeps between visits

use serde::{Deserialize, Serialize};

use super::token::Claims;

/// Persisted session: the signed token and its expiry, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    pub token_type: String,

    pub user_id: String,

    /// Expiry as a unix timestamp in seconds
    pub expires_at: i64,
}

impl Session {
    pub fn new(access_token: String, claims: &Claims) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user_id: claims.sub.clone(),
            expires_at: claims.exp,
        }
    }
}

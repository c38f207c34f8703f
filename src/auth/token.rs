use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AdminUser, Role};

/// Payload of a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin user id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues and checks HS256 session tokens
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &AdminUser) -> Result<(String, Claims)> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Signature and expiry check
    pub fn verify(&self, token: &str) -> Result<Claims> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use jsonwebtoken::errors::ErrorKind;

    fn user() -> AdminUser {
        AdminUser {
            id: "u1".into(),
            name: "Mona".into(),
            email: "mona@example.com".into(),
            role: Role::Admin,
            created_at: None,
            updated_at: None,
        }
    }

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new(SECRET, Duration::hours(8));
        let (token, claims) = signer.issue(&user()).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), claims);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenSigner::new(SECRET, Duration::hours(1));
        let theirs = TokenSigner::new(b"another-secret-another-secret-xx", Duration::hours(1));
        let (token, _) = theirs.issue(&user()).unwrap();
        match ours.verify(&token) {
            Err(Error::Jwt(err)) => assert_eq!(*err.kind(), ErrorKind::InvalidSignature),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new(SECRET, Duration::hours(1));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u1".into(),
            name: "Mona".into(),
            email: "mona@example.com".into(),
            role: Role::Admin,
            iat: now - 7200,
            exp: now - 3600,
        };
        assert!(claims.is_expired());
        let token = signer.sign(&claims).unwrap();
        match signer.verify(&token) {
            Err(Error::Jwt(err)) => assert_eq!(*err.kind(), ErrorKind::ExpiredSignature),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = TokenSigner::new(SECRET, Duration::hours(1));
        assert!(signer.verify("not.a.token").is_err());
    }
}

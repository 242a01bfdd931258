//! Bearer-token authentication.
//!
//! Tokens are RS256 JWTs. The signing key id travels in the token header
//! (`kid`), so verification looks the public key up per token through a
//! [`KeyLookup`]. Rotating keys means adding a pair to the store and
//! switching the active kid; tokens signed with the old key keep verifying
//! for as long as its public half stays in the store.

mod keystore;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use keystore::{KeyError, KeyLookup, KeyStore};

/// Claims carried by every token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub iat: u64,
    pub exp: u64,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Claims for `sub`, issued now and valid for `ttl`.
    pub fn new(sub: impl Into<String>, roles: Vec<String>, ttl: Duration) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            sub: sub.into(),
            iss: String::new(),
            iat: now,
            exp: now + ttl.as_secs(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("expected authorization header format: Bearer <token>")]
    MissingBearer,
    #[error("token header has no kid")]
    MissingKid,
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Issues and verifies tokens against a key store.
#[derive(Clone)]
pub struct Auth {
    active_kid: String,
    keys: Arc<dyn KeyLookup>,
    validation: Validation,
}

impl Auth {
    /// `active_kid` names the key new tokens are signed with.
    pub fn new(active_kid: impl Into<String>, keys: Arc<dyn KeyLookup>) -> Self {
        Self {
            active_kid: active_kid.into(),
            keys,
            validation: Validation::new(Algorithm::RS256),
        }
    }

    pub fn active_kid(&self) -> &str { &self.active_kid }

    /// Signs `claims` with the active key.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let pem = self.keys.private_key_pem(&self.active_kid)?;
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.active_kid.clone());

        Ok(jsonwebtoken::encode(&header, claims, &key)?)
    }

    /// Verifies an `Authorization` header value and returns its claims.
    pub fn authenticate(&self, bearer: &str) -> Result<Claims, AuthError> {
        let token = match bearer.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
                token.trim()
            }
            _ => return Err(AuthError::MissingBearer),
        };

        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKid)?;
        let pem = self.keys.public_key_pem(&kid)?;
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;

        let data = jsonwebtoken::decode::<Claims>(token, &key, &self.validation)?;
        debug!(kid = %kid, sub = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE: &str = include_str!("../../tests/fixtures/signing.pem");
    const PUBLIC: &str = include_str!("../../tests/fixtures/signing.pub.pem");

    fn auth() -> Auth {
        let mut store = KeyStore::new();
        store.insert("signing", PRIVATE, PUBLIC);
        Auth::new("signing", Arc::new(store))
    }

    #[test]
    fn issued_token_verifies() {
        let auth = auth();
        let claims = Claims::new("user-7", vec!["ADMIN".into()], Duration::from_secs(3600));
        let token = auth.generate_token(&claims).unwrap();

        let verified = auth.authenticate(&format!("Bearer {token}")).unwrap();
        assert_eq!(verified, claims);
        assert!(verified.has_role("ADMIN"));
    }

    #[test]
    fn missing_scheme_is_rejected() {
        let auth = auth();
        assert!(matches!(auth.authenticate(""), Err(AuthError::MissingBearer)));
        assert!(matches!(auth.authenticate("Basic abc"), Err(AuthError::MissingBearer)));
        assert!(matches!(auth.authenticate("Bearer "), Err(AuthError::MissingBearer)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(auth().authenticate("Bearer not.a.jwt"), Err(AuthError::Token(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = auth();
        let mut claims = Claims::new("user-7", vec![], Duration::ZERO);
        claims.exp -= 3600;
        let token = auth.generate_token(&claims).unwrap();

        assert!(matches!(auth.authenticate(&format!("Bearer {token}")), Err(AuthError::Token(_))));
    }

    #[test]
    fn unknown_kid_is_rejected() {
        let token = auth().generate_token(&Claims::new("u", vec![], Duration::from_secs(60))).unwrap();

        let mut other = KeyStore::new();
        other.insert("rotated", PRIVATE, PUBLIC);
        let verifier = Auth::new("rotated", Arc::new(other));

        assert!(matches!(
            verifier.authenticate(&format!("Bearer {token}")),
            Err(AuthError::Key(KeyError::NotFound(kid))) if kid == "signing"
        ));
    }
}

//! Signed bearer tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Claims carried by every token. `exp` is a Unix timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies tokens with a process-wide secret.
///
/// There is no revocation: a correctly signed token is accepted until `exp`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::hours(config.token_lifetime_hours),
        )
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, id: i32, username: &str, is_admin: bool) -> Result<String, TokenError> {
        self.issue_at(id, username, is_admin, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        id: i32,
        username: &str,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| TokenError::Signing("expiration overflow".to_string()))?
            .timestamp();

        let claims = Claims {
            id,
            username: username.to_string(),
            is_admin,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Signature first, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::InvalidSignature)?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const SECRET: &str = "unit-test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(24))
    }

    #[test]
    fn issued_token_verifies_with_same_claims() {
        let tokens = service();
        let token = tokens.issue(7, "alice", true).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.username, "alice");
        assert!(claims.is_admin);
    }

    #[test]
    fn expiry_is_twenty_four_hours_after_issue() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(1, "bob", false, now).unwrap();

        let claims = tokens.verify_at(&token, now).unwrap();
        assert_eq!(claims.exp, (now + Duration::hours(24)).timestamp());
    }

    #[test]
    fn claims_use_flat_wire_keys() {
        let token = service().issue(3, "carol", false).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "carol");
        assert_eq!(json["is_admin"], false);
        assert!(json["exp"].is_i64());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued = Utc::now() - Duration::hours(25);
        let token = tokens.issue_at(1, "bob", false, issued).unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_at_exact_expiry_is_rejected() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(1, "bob", false, now).unwrap();

        assert_eq!(
            tokens.verify_at(&token, now + Duration::hours(24)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = service().issue(1, "bob", false).unwrap();
        let other = TokenService::new("another-secret", Duration::hours(24));

        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue(1, "bob", false).unwrap();

        for index in 0..token.len() {
            for replacement in [b'A', b'x', b'-', b'.'] {
                let mut bytes = token.clone().into_bytes();
                if bytes[index] == replacement {
                    continue;
                }
                bytes[index] = replacement;
                let tampered = String::from_utf8(bytes).unwrap();

                assert_eq!(
                    tokens.verify(&tampered),
                    Err(TokenError::InvalidSignature),
                    "tampering at byte {index} with {:?} was accepted",
                    char::from(replacement)
                );
            }
        }
    }

    #[test]
    fn privilege_escalation_in_payload_is_rejected() {
        let tokens = service();
        let token = tokens.issue(1, "bob", false).unwrap();
        let mut parts: Vec<String> = token.split('.').map(ToString::to_string).collect();

        let forged = serde_json::json!({
            "id": 1,
            "username": "bob",
            "is_admin": true,
            "exp": Utc::now().timestamp() + 3600,
        });
        parts[1] = URL_SAFE_NO_PAD.encode(forged.to_string());

        assert_eq!(
            tokens.verify(&parts.join(".")),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let tokens = service();

        for token in ["", "abc", "a.b", "a.b.c", "....", "Bearer x.y.z"] {
            assert_eq!(tokens.verify(token), Err(TokenError::InvalidSignature));
        }
    }
}

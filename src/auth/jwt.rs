use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;
use crate::state::AppState;

/// Why a token failed verification. Expiry is reported separately from
/// every other failure (bad signature, malformed token, wrong algorithm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub algorithm: Algorithm,
    pub ttl: TimeDuration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            ttl: TimeDuration::minutes(cfg.ttl_minutes),
        }
    }

    /// Sign a token for `subject` with the configured ttl.
    pub fn sign(&self, subject: &str) -> anyhow::Result<String> {
        self.sign_with_ttl(subject, self.ttl)
    }

    pub fn sign_with_ttl(&self, subject: &str, ttl: TimeDuration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(subject = %subject, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // The default validation tolerates 60s of clock skew; expiry is exact.
        validation.leeway = 0;
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let token = keys.sign("alice").expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let keys = make_keys();
        let token = keys
            .sign_with_ttl("alice", TimeDuration::minutes(-5))
            .expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[tokio::test]
    async fn just_expired_token_is_rejected() {
        // Seconds past expiry, well inside the 60s window the default
        // validation would have tolerated.
        let keys = make_keys();
        let token = keys
            .sign_with_ttl("alice", TimeDuration::seconds(-30))
            .expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[tokio::test]
    async fn tampered_signature_is_invalid() {
        let keys = make_keys();
        let token = keys.sign("alice").expect("sign");

        // Swap one character inside the signature segment
        let dot = token.rfind('.').expect("token has three segments");
        let mut chars: Vec<char> = token[dot + 1..].chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let mut tampered = String::from(&token[..dot + 1]);
        tampered.extend(chars);

        let err = keys.verify(&tampered).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let keys = make_keys();
        let other = JwtKeys::from_config(&JwtConfig {
            secret: "another-secret".into(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 30,
        });
        let token = other.sign("alice").expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[tokio::test]
    async fn unexpected_algorithm_is_invalid() {
        // Same secret, different algorithm in the header
        let hs384 = JwtKeys::from_config(&JwtConfig {
            secret: "test-secret".into(),
            algorithm: Algorithm::HS384,
            ttl_minutes: 30,
        });
        let token = hs384.sign("alice").expect("sign");
        let err = make_keys().verify(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let keys = make_keys();
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), TokenError::Invalid);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Invalid);
    }
}

use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    models::User,
};

/// Session token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // user id
    pub email: String, // email at issue time
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
}

/// HS256 signing and verification keys built from `JwtConfig`.
#[derive(Clone)]
pub struct AuthTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl AuthTokens {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(1, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = user.id, "session token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(sub = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tokens(secret: &str, issuer: &str) -> AuthTokens {
        AuthTokens::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            ttl_minutes: 5,
        })
    }

    fn make_tokens_with_ttl(ttl_minutes: i64) -> AuthTokens {
        AuthTokens::from_config(&JwtConfig {
            secret: "s".into(),
            issuer: "i".into(),
            ttl_minutes,
        })
    }

    fn user() -> User {
        let mut u = User::new("Ada".into(), "ada@example.com".into(), "hash".into());
        u.id = 42;
        u
    }

    #[test]
    fn issue_and_verify() {
        let tokens = make_tokens("dev-secret", "test-issuer");
        let token = tokens.issue(&user()).expect("issue");
        let claims = tokens.verify(&token).expect("verify");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.iss, "test-issuer");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let token = make_tokens("one", "iss").issue(&user()).unwrap();
        assert!(make_tokens("two", "iss").verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer() {
        let token = make_tokens("same", "good-iss").issue(&user()).unwrap();
        assert!(make_tokens("same", "bad-iss").verify(&token).is_err());
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let tokens = make_tokens_with_ttl(i64::MAX);
        let claims = tokens.verify(&tokens.issue(&user()).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TTL_MINUTES as usize * 60);
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(make_tokens("s", "i").verify("token_ada@example.com_20240101").is_err());
    }
}

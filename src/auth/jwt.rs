use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::{SessionConfig, MAX_SESSION_TTL_DAYS},
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Signing keys and cookie policy, built once from config at startup.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    secure_cookie: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        let ttl_days = cfg.ttl_days.clamp(0, MAX_SESSION_TTL_DAYS) as u64;
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(ttl_days * 24 * 60 * 60),
            secure_cookie: cfg.secure_cookie,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> jsonwebtoken::errors::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience; yields the user id.
    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Uuid> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims.sub)
    }

    /// The `jwt` cookie carrying `token` for the whole session lifetime.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        self.cookie(token, TimeDuration::seconds(self.ttl.as_secs() as i64))
    }

    /// Overwrites the session cookie with an empty, already-expired one.
    /// Tokens issued earlier stay valid until their own `exp`.
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        self.cookie(String::new(), TimeDuration::ZERO)
    }

    fn cookie(&self, value: String, max_age: TimeDuration) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookie)
            .max_age(max_age)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> SessionKeys {
        SessionKeys::new(&SessionConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_days: 7,
            secure_cookie: false,
        })
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), user_id);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a", "iss", "aud");
        let bad = make_keys("secret-b", "iss", "aud");
        let token = good.issue(Uuid::new_v4()).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4()).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (past - TimeDuration::hours(1)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let mut token = keys.issue(Uuid::new_v4()).unwrap();
        token.push('x');
        assert!(keys.verify(&token).is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn session_cookie_attributes() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let cookie = keys.session_cookie("tok".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(TimeDuration::days(7)));
    }

    #[test]
    fn production_cookie_is_secure() {
        let keys = SessionKeys::new(&SessionConfig {
            secret: "s".into(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_days: 1,
            secure_cookie: true,
        });
        assert_eq!(keys.session_cookie("t".into()).secure(), Some(true));
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let keys = SessionKeys::new(&SessionConfig {
            secret: "s".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_days: i64::MAX,
            secure_cookie: false,
        });
        assert_eq!(
            keys.session_cookie("t".into()).max_age(),
            Some(TimeDuration::days(MAX_SESSION_TTL_DAYS))
        );
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn cleared_cookie_is_empty_and_expired() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let cookie = keys.cleared_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(TimeDuration::ZERO));
        assert_eq!(cookie.http_only(), Some(true));
    }
}

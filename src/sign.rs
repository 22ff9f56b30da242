//! Request signing for the SwitchBot cloud API (v1.1).
//!
//! Every request carries `Authorization`, `sign`, `nonce` and `t` headers where
//! `sign = base64(HMAC-SHA256(secret, token + t + nonce))`.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use uuid::Uuid;

use crate::{Error, Result};

/// Open token and secret from the SwitchBot app. Immutable once built.
#[derive(Clone, Default)]
pub struct Credentials {
    token: String,
    secret: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    pub fn token_len(&self) -> usize {
        self.token.chars().count()
    }

    pub fn secret_len(&self) -> usize {
        self.secret.chars().count()
    }

    pub fn ensure_present(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::Config("SwitchBot token is empty".to_string()));
        }
        if self.secret.is_empty() {
            return Err(Error::Config("SwitchBot secret is empty".to_string()));
        }
        Ok(())
    }

    /// Fresh header set for one request. Nonce and timestamp are generated here.
    pub fn headers(&self) -> Result<AuthHeaders> {
        self.ensure_present()?;
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = Utc::now().timestamp_millis();
        let sign = sign(self, &nonce, timestamp)?;
        Ok(AuthHeaders {
            authorization: self.token.clone(),
            sign,
            nonce,
            timestamp,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &format_args!("<{} chars>", self.token_len()))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Auth headers for a single request. Never reused.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    pub authorization: String,
    pub sign: String,
    pub nonce: String,
    pub timestamp: i64,
}

impl AuthHeaders {
    pub fn pairs(&self) -> [(&'static str, String); 4] {
        [
            ("Authorization", self.authorization.clone()),
            ("sign", self.sign.clone()),
            ("nonce", self.nonce.clone()),
            ("t", self.timestamp.to_string()),
        ]
    }
}

/// Base64 HMAC-SHA256 over `token || timestamp || nonce`, keyed by the secret.
pub fn sign(credentials: &Credentials, nonce: &str, timestamp_ms: i64) -> Result<String> {
    credentials.ensure_present()?;
    let message = format!("{}{}{}", credentials.token, timestamp_ms, nonce);
    let mac = hmac_sha256::HMAC::mac(message.as_bytes(), credentials.secret.as_bytes());
    Ok(STANDARD.encode(mac))
}

//! Session data for the authenticated user

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::auth::types::User;

/// Fallback session lifetime when neither the response nor the access token
/// carries an expiry
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// The access/refresh token pair delivered by a redirect-based login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a new token pair
    pub fn new(access_token: &str, refresh_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        }
    }
}

/// An established session: the token pair plus the user it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    #[serde(default = "bearer")]
    pub token_type: String,

    /// The lifetime in seconds reported by the auth service
    #[serde(default)]
    pub expires_in: i64,

    /// The expiry timestamp (unix seconds)
    pub expires_at: Option<i64>,

    /// The user this session belongs to
    pub user: User,
}

fn bearer() -> String {
    "bearer".to_string()
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}

impl Session {
    /// Build a session from a recovered token pair and the user the auth
    /// service reported for it. The expiry is taken from the access token's
    /// `exp` claim when present, else assumed one default lifetime out.
    pub fn from_recovered(tokens: TokenPair, user: User) -> Self {
        let expires_at =
            claim_exp(&tokens.access_token).unwrap_or_else(|| now_unix() + DEFAULT_EXPIRES_IN);

        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: bearer(),
            expires_in: DEFAULT_EXPIRES_IN,
            expires_at: Some(expires_at),
            user,
        }
    }

    /// Fill in `expires_at` from `expires_in` when the auth service omitted it
    pub fn with_computed_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            let expires_in = if self.expires_in > 0 {
                self.expires_in
            } else {
                DEFAULT_EXPIRES_IN
            };
            self.expires_at = Some(now_unix() + expires_in);
        }
        self
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => now_unix() >= expires_at,
            None => false,
        }
    }

    /// The session's token pair
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(&self.access_token, &self.refresh_token)
    }
}

/// Read the `exp` claim out of a JWT payload without verifying the
/// signature. Expiry here is advisory only; the auth service re-checks the
/// token on every request.
fn claim_exp(access_token: &str) -> Option<i64> {
    let payload = access_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

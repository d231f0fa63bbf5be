//! Bindings to the hosted platform's authentication service
//!
//! The login page itself lives on an external site; sessions arrive here as
//! a redirected token pair or a persisted session, so these bindings cover
//! validation, refresh, sign-out and metadata updates rather than password
//! flows.

mod session;
mod types;

use reqwest::Client;
use std::collections::HashMap;

use crate::error::Error;
use crate::fetch::Request;

pub use session::*;
pub use types::*;

/// Client for the auth service endpoints
#[derive(Clone)]
pub struct AuthApi {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// HTTP client used for requests
    client: Client,
}

impl AuthApi {
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Fetch the user an access token belongs to. A rejected token surfaces
    /// as an authentication error.
    pub async fn get_user(&self, access_token: &str) -> Result<User, Error> {
        Request::get(&self.client, &self.endpoint("/user"), &self.key)
            .bearer_auth(access_token)
            .execute::<User>()
            .await
    }

    /// Exchange a refresh token for a fresh session
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, Error> {
        let url = self.endpoint("/token?grant_type=refresh_token");

        let mut body = HashMap::new();
        body.insert("refresh_token".to_string(), refresh_token.to_string());

        let session = Request::post(&self.client, &url, &self.key)
            .json(&body)?
            .execute::<Session>()
            .await?;

        Ok(session.with_computed_expiry())
    }

    /// Revoke a session with the auth service
    pub async fn sign_out(&self, access_token: &str) -> Result<(), Error> {
        Request::post(&self.client, &self.endpoint("/logout"), &self.key)
            .bearer_auth(access_token)
            .execute_no_content()
            .await
    }

    /// Update the signed-in user's attributes, returning the new user record
    pub async fn update_user(
        &self,
        access_token: &str,
        attributes: UserAttributes,
    ) -> Result<User, Error> {
        Request::put(&self.client, &self.endpoint("/user"), &self.key)
            .bearer_auth(access_token)
            .json(&attributes)?
            .execute::<User>()
            .await
    }
}

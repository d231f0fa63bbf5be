//! Organizer profiles and account management

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{User, UserAttributes, META_AVATAR_URL, META_FULL_NAME};
use crate::db::{RpcBuilder, TableClient};
use crate::error::Error;
use crate::session::SessionManager;
use crate::storage::{FileOptions, StorageApi, AVATARS_BUCKET};

/// Table holding public organizer profiles
pub const PROFILES_TABLE: &str = "profiles";

/// Stored procedure removing the calling user's account
pub const DELETE_USER_FN: &str = "delete_user";

/// Public profile row shown for an event's organizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// The profile id (equals the auth user id)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,

    /// Contact phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// Public avatar URL
    #[serde(default)]
    pub avatar_url: Option<String>,

    /// Registration timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Service for profile lookups and the signed-in user's own account
pub struct ProfilesService {
    url: String,
    key: String,
    client: Client,
    session: Arc<SessionManager>,
}

impl ProfilesService {
    pub(crate) fn new(url: &str, key: &str, client: Client, session: Arc<SessionManager>) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session,
        }
    }

    fn table(&self) -> TableClient {
        TableClient::new(&self.url, &self.key, PROFILES_TABLE, self.client.clone())
    }

    /// Look up an organizer's public profile. `None` means the profile no
    /// longer exists (the account was deleted), which the caller renders as
    /// a "profile not found" state rather than an error.
    pub async fn organizer(&self, user_id: &str) -> Result<Option<Profile>, Error> {
        self.table()
            .select("*")
            .eq("id", user_id)
            .execute_one::<Profile>()
            .await
    }

    /// Change the signed-in user's display name. The refreshed user record
    /// is pushed to auth-state subscribers before this returns.
    pub async fn rename(&self, new_name: &str) -> Result<User, Error> {
        if new_name.trim().is_empty() {
            return Err(Error::validation("display name is required"));
        }
        self.session
            .update_user(UserAttributes::metadata_field(META_FULL_NAME, new_name))
            .await
    }

    /// Upload a new avatar and store its public URL on the user record.
    pub async fn set_avatar(&self, file_name: &str, bytes: Vec<u8>) -> Result<User, Error> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| Error::auth("not signed in"))?;
        let token = self.session.require_access_token().await?;

        let object = avatar_object_name(&user.id, file_name);
        let storage = StorageApi::new(&self.url, &self.key, self.client.clone(), Some(token));
        let bucket = storage.bucket(AVATARS_BUCKET);
        bucket
            .upload(&object, bytes, FileOptions::default())
            .await?;
        let public_url = bucket.public_url(&object);

        self.session
            .update_user(UserAttributes::metadata_field(META_AVATAR_URL, &public_url))
            .await
    }

    /// Delete the signed-in user's account through the backend's stored
    /// procedure, then clear the local session. A failed deletion leaves
    /// the session intact.
    pub async fn delete_account(&self) -> Result<(), Error> {
        let token = self.session.require_access_token().await?;

        RpcBuilder::new(
            &self.url,
            &self.key,
            DELETE_USER_FN,
            json!({}),
            self.client.clone(),
            Some(token),
        )
        .execute_no_content()
        .await?;

        self.session.sign_out().await;
        Ok(())
    }
}

/// Avatar object name: scoped to the user, unique per upload, original
/// extension kept
fn avatar_object_name(user_id: &str, file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}-{}.{}", user_id, Uuid::new_v4(), ext),
        _ => format!("{}-{}", user_id, Uuid::new_v4()),
    }
}

//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key holding the user's display name
pub const META_FULL_NAME: &str = "full_name";

/// Metadata key holding the user's avatar URL
pub const META_AVATAR_URL: &str = "avatar_url";

/// User data as reported by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// The user's phone number
    pub phone: Option<String>,

    /// The app metadata
    #[serde(default)]
    pub app_metadata: HashMap<String, serde_json::Value>,

    /// The user-supplied metadata (display name, avatar reference, ...)
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,

    /// The creation time
    pub created_at: Option<String>,

    /// The update time
    pub updated_at: Option<String>,
}

impl User {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(|v| v.as_str())
    }

    /// The display name stored in user metadata, if any
    pub fn display_name(&self) -> Option<&str> {
        self.metadata_str(META_FULL_NAME)
    }

    /// The avatar URL stored in user metadata, if any
    pub fn avatar_url(&self) -> Option<&str> {
        self.metadata_str(META_AVATAR_URL)
    }
}

/// User attributes that can be updated through the auth service
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// User metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl UserAttributes {
    /// Attributes updating a single user-metadata field
    pub fn metadata_field(key: &str, value: &str) -> Self {
        Self {
            data: Some(serde_json::json!({ key: value })),
            ..Self::default()
        }
    }
}

//! Event listings: the public feed and the organizer's own records

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::TableClient;
use crate::error::Error;
use crate::session::SessionManager;
use crate::storage::{FileOptions, StorageApi, EVENT_IMAGES_BUCKET};

/// Table holding event records
pub const EVENTS_TABLE: &str = "events";

/// Author label stamped on a listing when the organizer's profile has no
/// display name
pub const DEFAULT_AUTHOR: &str = "Organizer";

/// A published event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Record id assigned by the database
    pub id: i64,

    /// Event title
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,

    /// Event date as entered by the organizer (ISO `YYYY-MM-DD`)
    pub date: String,

    /// Venue or address
    pub location: String,

    /// Public URL of the cover image, if one was uploaded
    #[serde(default)]
    pub image_url: Option<String>,

    /// Id of the organizer who owns the record
    pub organization_id: String,

    /// Organizer display name captured at publish time
    #[serde(default)]
    pub author_name: Option<String>,

    /// Creation timestamp assigned by the database
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Fields an organizer fills in before publishing
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
}

impl NewEvent {
    /// Check the required fields before anything is sent to the backend
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.date.trim().is_empty() {
            return Err(Error::validation("date is required"));
        }
        if self.location.trim().is_empty() {
            return Err(Error::validation("location is required"));
        }
        Ok(())
    }
}

/// Partial update of an owned event record
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A cover image handed over by the upload form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name; only the extension is kept
    pub file_name: String,

    /// File contents
    pub bytes: Vec<u8>,

    /// MIME type, when the form knows it
    pub content_type: Option<String>,
}

#[derive(Serialize)]
struct EventInsert<'a> {
    title: &'a str,
    description: &'a str,
    date: &'a str,
    location: &'a str,
    organization_id: String,
    author_name: String,
    image_url: String,
}

/// Service for reading and managing event listings
pub struct EventsService {
    url: String,
    key: String,
    client: Client,
    session: Arc<SessionManager>,
}

impl EventsService {
    pub(crate) fn new(url: &str, key: &str, client: Client, session: Arc<SessionManager>) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session,
        }
    }

    fn table(&self) -> TableClient {
        TableClient::new(&self.url, &self.key, EVENTS_TABLE, self.client.clone())
    }

    /// All published events, soonest first
    pub async fn upcoming(&self) -> Result<Vec<EventRecord>, Error> {
        self.table()
            .select("*")
            .order("date", true)
            .execute::<EventRecord>()
            .await
    }

    /// The feed filtered on title or location containing `term`,
    /// case-insensitively
    pub async fn search(&self, term: &str) -> Result<Vec<EventRecord>, Error> {
        let needle = term.to_lowercase();
        let events = self.upcoming().await?;
        Ok(events
            .into_iter()
            .filter(|event| {
                event.title.to_lowercase().contains(&needle)
                    || event.location.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// The signed-in organizer's own listings, newest first
    pub async fn mine(&self) -> Result<Vec<EventRecord>, Error> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| Error::auth("not signed in"))?;
        let token = self.session.require_access_token().await?;

        self.table()
            .authenticated(&token)
            .select("*")
            .eq("organization_id", &user.id)
            .order("created_at", false)
            .execute::<EventRecord>()
            .await
    }

    /// Publish a new listing. Validates the required fields, uploads the
    /// cover image (when given) under a fresh object name, and inserts the
    /// record stamped with the organizer's id and display name.
    pub async fn publish(
        &self,
        event: NewEvent,
        image: Option<ImageUpload>,
    ) -> Result<(), Error> {
        event.validate()?;

        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| Error::auth("not signed in"))?;
        let token = self.session.require_access_token().await?;

        let image_url = match image {
            Some(image) => {
                let storage = StorageApi::new(
                    &self.url,
                    &self.key,
                    self.client.clone(),
                    Some(token.clone()),
                );
                let bucket = storage.bucket(EVENT_IMAGES_BUCKET);
                let object = object_name(&image.file_name);
                bucket
                    .upload(
                        &object,
                        image.bytes,
                        FileOptions {
                            content_type: image.content_type,
                            ..FileOptions::default()
                        },
                    )
                    .await?;
                bucket.public_url(&object)
            }
            None => String::new(),
        };

        let author_name = user
            .display_name()
            .unwrap_or(DEFAULT_AUTHOR)
            .to_string();

        self.table()
            .authenticated(&token)
            .insert(EventInsert {
                title: &event.title,
                description: &event.description,
                date: &event.date,
                location: &event.location,
                organization_id: user.id,
                author_name,
                image_url,
            })
            .execute_no_return()
            .await
    }

    /// Apply a partial update to one of the organizer's own records
    pub async fn revise(&self, id: i64, changes: EventChanges) -> Result<(), Error> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| Error::auth("not signed in"))?;
        let token = self.session.require_access_token().await?;

        self.table()
            .authenticated(&token)
            .update(changes)
            .eq("id", id)
            .eq("organization_id", &user.id)
            .execute_no_return()
            .await
    }

    /// Remove one of the organizer's own records
    pub async fn retract(&self, id: i64) -> Result<(), Error> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| Error::auth("not signed in"))?;
        let token = self.session.require_access_token().await?;

        self.table()
            .authenticated(&token)
            .delete()
            .eq("id", id)
            .eq("organization_id", &user.id)
            .execute_no_return()
            .await
    }
}

/// Fresh object name for an upload, keeping the original extension
fn object_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
        _ => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_requires_title_date_location() {
        let mut event = NewEvent {
            title: "Park cleanup".to_string(),
            description: String::new(),
            date: "2026-09-01".to_string(),
            location: "Riverside park".to_string(),
        };
        assert!(event.validate().is_ok());

        event.title = "  ".to_string();
        assert!(matches!(event.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn object_name_keeps_extension() {
        let name = object_name("poster.PNG");
        assert!(name.ends_with(".PNG"));
        assert_ne!(name, object_name("poster.PNG"));
    }

    #[test]
    fn object_name_without_extension() {
        let name = object_name("poster");
        assert!(!name.contains('.'));
    }
}

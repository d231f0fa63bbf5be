//! Object storage bindings for the two application buckets

use reqwest::{multipart, Client};

use crate::error::Error;

/// Bucket holding event cover images
pub const EVENT_IMAGES_BUCKET: &str = "event-images";

/// Bucket holding profile avatars
pub const AVATARS_BUCKET: &str = "avatars";

const CLIENT_INFO: &str = "eventflow/0.2.0";

/// Options for a file upload
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// The MIME type recorded for the object
    pub content_type: Option<String>,

    /// Cache-Control max-age in seconds, as the platform expects it
    pub cache_control: Option<String>,

    /// Whether an existing object at the same path is overwritten
    pub upsert: bool,
}

/// Client for the storage service
pub struct StorageApi {
    url: String,
    key: String,
    client: Client,
    bearer: Option<String>,
}

/// Client scoped to a single bucket
pub struct BucketApi<'a> {
    storage: &'a StorageApi,
    bucket_id: String,
}

impl StorageApi {
    pub(crate) fn new(url: &str, key: &str, client: Client, bearer: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            bearer,
        }
    }

    /// Get a client for a specific bucket
    pub fn bucket(&self, bucket_id: &str) -> BucketApi<'_> {
        BucketApi {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl<'a> BucketApi<'a> {
    /// Upload an object and return nothing; the caller derives the public
    /// URL from the path it chose
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: FileOptions,
    ) -> Result<(), Error> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.storage.url, self.bucket_id, path
        );

        let file_name = path
            .rsplit('/')
            .next()
            .unwrap_or("file")
            .to_string();
        let mut part = multipart::Part::bytes(bytes).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|err| Error::storage(format!("invalid content type: {}", err)))?;
        }
        let form = multipart::Form::new().part("file", part);

        let mut request = self
            .storage
            .client
            .post(&url)
            .header("apikey", &self.storage.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header(
                "Cache-Control",
                options.cache_control.unwrap_or_else(|| "3600".to_string()),
            )
            .header("x-upsert", options.upsert.to_string())
            .multipart(form);
        if let Some(token) = &self.storage.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::storage(format!(
                "upload failed with status {}: {}",
                status, text
            )));
        }

        Ok(())
    }

    /// The public URL for an object in this bucket; no network involved
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.storage.url, self.bucket_id, path
        )
    }
}

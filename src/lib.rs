//! EventFlow service layer
//!
//! Headless core of the EventFlow community-events application: typed async
//! access to the hosted backend (auth, database, object storage), session
//! hydration from redirect-based logins, and route guarding for the
//! organizer-only views. UI shells call into this crate instead of talking
//! to the backend ad hoc.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod fetch;
pub mod guard;
pub mod profiles;
pub mod session;
pub mod storage;

use std::sync::Arc;

use reqwest::Client;
use url::Url;

use crate::auth::AuthApi;
use crate::config::{ClientOptions, Config};
use crate::db::TableClient;
use crate::error::Error;
use crate::events::EventsService;
use crate::guard::{GuardDecision, RouteGuard};
use crate::profiles::ProfilesService;
use crate::session::{PageLoad, SessionManager};
use crate::storage::StorageApi;

/// The application client: one per page, shared by every view on it
pub struct EventFlow {
    config: Config,
    http_client: Client,
    login_url: Url,
    session: Arc<SessionManager>,
}

impl EventFlow {
    /// Create a client with default behavior
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_options(config, ClientOptions::default())
    }

    /// Create a client with explicit behavioral options
    pub fn with_options(config: Config, options: ClientOptions) -> Result<Self, Error> {
        let login_url = config.login_url()?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let api = AuthApi::new(&config.backend_url, &config.anon_key, http_client.clone());
        let session = Arc::new(SessionManager::new(api, options));

        Ok(Self {
            config,
            http_client,
            login_url,
            session,
        })
    }

    /// Create a client from environment configuration
    pub fn from_env() -> Result<Self, Error> {
        Self::new(Config::from_env()?)
    }

    /// The session manager: the single source of truth for the current user
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The route guard configured for this deployment
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.login_url.clone())
    }

    /// The one check a protected page awaits before rendering: resolve the
    /// session for this page load, then apply the route policy. Failures on
    /// the auth side resolve to a redirect, never to rendered content.
    pub async fn authorize(&self, path: &str, location: &Url) -> (GuardDecision, PageLoad) {
        let page = self.session.hydrate(location).await;
        let decision = self.guard().check(path, page.user.as_ref());
        (decision, page)
    }

    /// Event listings service
    pub fn events(&self) -> EventsService {
        EventsService::new(
            &self.config.backend_url,
            &self.config.anon_key,
            self.http_client.clone(),
            Arc::clone(&self.session),
        )
    }

    /// Profiles and account service
    pub fn profiles(&self) -> ProfilesService {
        ProfilesService::new(
            &self.config.backend_url,
            &self.config.anon_key,
            self.http_client.clone(),
            Arc::clone(&self.session),
        )
    }

    /// Raw table access for anything the services do not cover
    pub fn table(&self, name: &str) -> TableClient {
        TableClient::new(
            &self.config.backend_url,
            &self.config.anon_key,
            name,
            self.http_client.clone(),
        )
    }

    /// Storage access with the anonymous key (public objects only)
    pub fn storage(&self) -> StorageApi {
        StorageApi::new(
            &self.config.backend_url,
            &self.config.anon_key,
            self.http_client.clone(),
            None,
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, Config};
    pub use crate::error::Error;
    pub use crate::guard::GuardDecision;
    pub use crate::session::AuthState;
    pub use crate::EventFlow;
}

//! Session hydration and the current-user snapshot
//!
//! One [`SessionManager`] lives for the duration of a page. Whether a
//! session arrives as a persisted session handed back by the embedder or as
//! a token pair embedded in a redirect URL, it is normalized into a single
//! `current user or none` snapshot, and every transition is broadcast to
//! subscribers.

mod recovery;

use std::sync::Mutex;

use log::{debug, warn};
use tokio::sync::watch;
use url::Url;

use crate::auth::{AuthApi, Session, TokenPair, User, UserAttributes};
use crate::config::ClientOptions;
use crate::error::Error;

pub use recovery::{extract_tokens, strip_auth_params};

/// The authentication state of the current page
#[derive(Debug, Clone)]
pub enum AuthState {
    /// The asynchronous session check has not resolved yet
    Unknown,

    /// A usable session exists for this user
    Authenticated(User),

    /// No usable session exists
    Unauthenticated,
}

impl AuthState {
    /// The signed-in user, when authenticated
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Whether the initial session check has resolved either way
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unknown)
    }
}

/// Outcome of page-load hydration
#[derive(Debug, Clone)]
pub struct PageLoad {
    /// The current user, if a usable session was found or recovered
    pub user: Option<User>,

    /// When a token pair was lifted out of the location, the same URL with
    /// every auth parameter stripped. The embedder must replace (not push)
    /// the visible location with it.
    pub cleaned_location: Option<Url>,
}

/// Holder of the one current-user snapshot, and the only component that
/// talks to the auth service about session state
pub struct SessionManager {
    api: AuthApi,
    options: ClientOptions,
    session: Mutex<Option<Session>>,
    state: watch::Sender<AuthState>,
}

impl SessionManager {
    pub(crate) fn new(api: AuthApi, options: ClientOptions) -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        Self {
            api,
            options,
            session: Mutex::new(None),
            state,
        }
    }

    /// Subscribe to auth-state changes.
    ///
    /// The receiver observes the state as of subscription plus every later
    /// transition (established, refreshed, cleared), so subscribing before
    /// the initial check cannot miss the event that resolves it. Dropping
    /// the receiver is the unsubscription.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The current snapshot without touching the network
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Resolve the session for a page load.
    ///
    /// Cascade: an already-established session wins; otherwise a token pair
    /// embedded in `location` is applied; otherwise the page is
    /// unauthenticated. Auth-service failures are logged and reported as
    /// unauthenticated, never as an error the caller could mistake for
    /// "allowed".
    pub async fn hydrate(&self, location: &Url) -> PageLoad {
        if let Some(user) = self.established_user().await {
            return PageLoad {
                user: Some(user),
                cleaned_location: None,
            };
        }

        if self.options.detect_session_in_url {
            if let Some(tokens) = extract_tokens(location) {
                if self.apply_recovered(tokens).await {
                    return PageLoad {
                        user: self.state().user().cloned(),
                        cleaned_location: Some(strip_auth_params(location)),
                    };
                }
            }
        }

        self.state.send_replace(AuthState::Unauthenticated);
        PageLoad {
            user: None,
            cleaned_location: None,
        }
    }

    /// Establish a session from a recovered token pair.
    ///
    /// The access token is validated by fetching its user; a rejected access
    /// token gets one refresh-grant attempt with the refresh token. Returns
    /// `false` when the auth service rejects the pair, leaving any stored
    /// session path available to the caller.
    pub async fn apply_recovered(&self, tokens: TokenPair) -> bool {
        match self.api.get_user(&tokens.access_token).await {
            Ok(user) => {
                self.install(Session::from_recovered(tokens, user));
                true
            }
            Err(err) if err.is_auth() => {
                debug!("recovered access token rejected, attempting refresh grant");
                self.refresh_into_session(&tokens.refresh_token).await
            }
            Err(err) => {
                warn!("auth service unreachable while applying recovered tokens: {}", err);
                false
            }
        }
    }

    /// Seed the manager from a persisted session (the cookie / local-storage
    /// analogue). An expired session is refreshed first; a dead one leaves
    /// the page unauthenticated and returns `false`.
    pub async fn restore(&self, session: Session) -> bool {
        if session.is_expired() {
            if !self.options.auto_refresh_token {
                self.clear();
                return false;
            }
            let restored = self.refresh_into_session(&session.refresh_token).await;
            if !restored {
                self.clear();
            }
            return restored;
        }

        match self.api.get_user(&session.access_token).await {
            Ok(user) => {
                self.install(Session { user, ..session });
                true
            }
            Err(err) if err.is_auth() => {
                debug!("persisted access token rejected, attempting refresh grant");
                let restored = self.refresh_into_session(&session.refresh_token).await;
                if !restored {
                    self.clear();
                }
                restored
            }
            Err(err) => {
                warn!("auth service unreachable while restoring session: {}", err);
                self.clear();
                false
            }
        }
    }

    /// The single source of truth for "who is signed in right now".
    ///
    /// An expired in-memory session is transparently refreshed; when no
    /// usable session remains the snapshot resolves to unauthenticated.
    pub async fn current_user(&self) -> Option<User> {
        match self.established_user().await {
            Some(user) => Some(user),
            None => {
                self.state.send_replace(AuthState::Unauthenticated);
                None
            }
        }
    }

    /// Clear the snapshot and revoke the session with the auth service.
    ///
    /// Subscribers observe the cleared state before the revocation
    /// round-trip, so no stale authenticated view can render after this
    /// call; the network side is best-effort.
    pub async fn sign_out(&self) {
        let session = {
            let mut current = self.session.lock().unwrap();
            current.take()
        };
        self.state.send_replace(AuthState::Unauthenticated);

        if let Some(session) = session {
            if let Err(err) = self.api.sign_out(&session.access_token).await {
                warn!("sign-out revocation failed: {}", err);
            }
        }
    }

    /// Update the signed-in user's attributes and refresh the snapshot so
    /// subscribers see the new user record.
    pub async fn update_user(&self, attributes: UserAttributes) -> Result<User, Error> {
        let token = self.require_access_token().await?;
        let user = self.api.update_user(&token, attributes).await?;

        {
            let mut current = self.session.lock().unwrap();
            if let Some(session) = current.as_mut() {
                session.user = user.clone();
            }
        }
        self.state.send_replace(AuthState::Authenticated(user.clone()));

        Ok(user)
    }

    /// A valid access token for authenticated backend calls, refreshing the
    /// session when needed
    pub(crate) async fn require_access_token(&self) -> Result<String, Error> {
        if self.established_user().await.is_none() {
            return Err(Error::auth("not signed in"));
        }
        let current = self.session.lock().unwrap();
        match current.as_ref() {
            Some(session) => Ok(session.access_token.clone()),
            None => Err(Error::auth("not signed in")),
        }
    }

    async fn established_user(&self) -> Option<User> {
        let snapshot = { self.session.lock().unwrap().clone() };
        let session = snapshot?;

        if !session.is_expired() {
            return Some(session.user);
        }

        if !self.options.auto_refresh_token {
            self.clear();
            return None;
        }

        debug!("session expired, refreshing");
        if self.refresh_into_session(&session.refresh_token).await {
            self.state().user().cloned()
        } else {
            self.clear();
            None
        }
    }

    async fn refresh_into_session(&self, refresh_token: &str) -> bool {
        match self.api.refresh(refresh_token).await {
            Ok(session) => {
                self.install(session);
                true
            }
            Err(err) => {
                warn!("refresh grant rejected by auth service: {}", err);
                false
            }
        }
    }

    fn install(&self, session: Session) {
        let user = session.user.clone();
        {
            let mut current = self.session.lock().unwrap();
            *current = Some(session);
        }
        self.state.send_replace(AuthState::Authenticated(user));
    }

    fn clear(&self) {
        {
            let mut current = self.session.lock().unwrap();
            *current = None;
        }
        self.state.send_replace(AuthState::Unauthenticated);
    }
}

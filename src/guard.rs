//! Route protection for the two organizer-only views

use url::Url;

use crate::auth::User;

/// Path prefixes that require a signed-in user
pub const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/profile"];

/// Verdict for a route access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The route may render
    Allow,

    /// The route must not render; send the visitor to the login page
    Redirect(Url),
}

impl GuardDecision {
    /// Whether the route may render
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Access policy: an explicit allow-list of protected path prefixes and the
/// externally configured login page to send denied visitors to
#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected: Vec<String>,
    login_url: Url,
}

impl RouteGuard {
    /// Create a guard protecting the default routes
    pub fn new(login_url: Url) -> Self {
        Self {
            protected: PROTECTED_PREFIXES.iter().map(|p| p.to_string()).collect(),
            login_url,
        }
    }

    /// Replace the protected prefix list
    pub fn with_protected<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a path falls under a protected prefix
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decide whether `path` may render for `user`. An unresolved or failed
    /// session check must be passed as `None`; the guard never fails open.
    pub fn check(&self, path: &str, user: Option<&User>) -> GuardDecision {
        if user.is_none() && self.is_protected(path) {
            return GuardDecision::Redirect(self.login_url.clone());
        }
        GuardDecision::Allow
    }

    /// The configured login page
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }
}

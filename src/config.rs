//! Configuration for the EventFlow client

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Environment variable naming the backend platform URL
pub const ENV_BACKEND_URL: &str = "EVENTFLOW_BACKEND_URL";

/// Environment variable naming the backend anonymous API key
pub const ENV_ANON_KEY: &str = "EVENTFLOW_ANON_KEY";

/// Environment variable naming the site that hosts the login page
pub const ENV_AUTH_SITE_URL: &str = "EVENTFLOW_AUTH_SITE_URL";

/// Fallback environment variable for the login site
pub const ENV_MAIN_SITE_URL: &str = "EVENTFLOW_MAIN_SITE_URL";

/// Deployment-level configuration: where the backend lives and where
/// unauthenticated visitors are sent to log in
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend project
    pub backend_url: String,

    /// Anonymous API key for the backend project
    pub anon_key: String,

    /// Base URL of the external site hosting the login page
    pub auth_site: String,
}

impl Config {
    /// Create a configuration from explicit values
    pub fn new(backend_url: &str, anon_key: &str, auth_site: &str) -> Self {
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            auth_site: auth_site.to_string(),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// The login site is taken from `EVENTFLOW_AUTH_SITE_URL`, falling back
    /// to `EVENTFLOW_MAIN_SITE_URL`. A missing variable is a configuration
    /// error; no deployment URL is baked in.
    pub fn from_env() -> Result<Self, Error> {
        let backend_url = env::var(ENV_BACKEND_URL)
            .map_err(|_| Error::config(format!("{} is not set", ENV_BACKEND_URL)))?;
        let anon_key = env::var(ENV_ANON_KEY)
            .map_err(|_| Error::config(format!("{} is not set", ENV_ANON_KEY)))?;
        let auth_site = env::var(ENV_AUTH_SITE_URL)
            .or_else(|_| env::var(ENV_MAIN_SITE_URL))
            .map_err(|_| {
                Error::config(format!(
                    "neither {} nor {} is set",
                    ENV_AUTH_SITE_URL, ENV_MAIN_SITE_URL
                ))
            })?;

        Ok(Self::new(&backend_url, &anon_key, &auth_site))
    }

    /// The external login page unauthenticated visitors are redirected to:
    /// the configured auth site with any trailing slash trimmed, plus `/login`
    pub fn login_url(&self) -> Result<Url, Error> {
        let base = self.auth_site.trim_end_matches('/');
        Ok(Url::parse(&format!("{}/login", base))?)
    }
}

/// Behavioral options for the client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether an expired session is transparently refreshed
    pub auto_refresh_token: bool,

    /// Whether page-load hydration looks for a token pair in the URL
    pub detect_session_in_url: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            detect_session_in_url: true,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh an expired session
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether hydration inspects the URL for a redirected token pair
    pub fn with_detect_session_in_url(mut self, value: bool) -> Self {
        self.detect_session_in_url = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_appends_login_to_trimmed_site() {
        let config = Config::new("https://backend.test", "anon", "https://auth.example.org/");
        assert_eq!(
            config.login_url().unwrap().as_str(),
            "https://auth.example.org/login"
        );
    }

    #[test]
    fn login_url_without_trailing_slash() {
        let config = Config::new("https://backend.test", "anon", "https://auth.example.org");
        assert_eq!(
            config.login_url().unwrap().as_str(),
            "https://auth.example.org/login"
        );
    }

    #[test]
    fn backend_url_is_normalized() {
        let config = Config::new("https://backend.test/", "anon", "https://auth.example.org");
        assert_eq!(config.backend_url, "https://backend.test");
    }
}

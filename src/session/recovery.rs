//! Token recovery from a redirect-based login URL
//!
//! After logging in on the external auth site, the browser lands back on
//! this application with the token pair embedded in the location: in the
//! fragment (`#access_token=...&refresh_token=...`, implicit convention) or
//! in the query string (PKCE-style convention). The pair is lifted out and
//! every auth-related parameter is stripped so the cleaned URL can replace
//! the visible one without leaking tokens into history or referrers.

use url::form_urlencoded;
use url::Url;

use crate::auth::TokenPair;

/// Parameters the auth redirect may append; all of them are scrubbed once
/// a recovered session has been applied
const AUTH_PARAMS: &[&str] = &[
    "access_token",
    "refresh_token",
    "expires_in",
    "expires_at",
    "token_type",
    "type",
    "provider_token",
    "provider_refresh_token",
];

fn find_param(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(key, value)| key.as_str() == name && !value.is_empty())
        .map(|(_, value)| value.clone())
}

fn fragment_pairs(url: &Url) -> Vec<(String, String)> {
    match url.fragment() {
        Some(fragment) => form_urlencoded::parse(fragment.as_bytes())
            .into_owned()
            .collect(),
        None => Vec::new(),
    }
}

fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs().into_owned().collect()
}

/// Extract the access/refresh token pair from a redirect URL.
///
/// The fragment is consulted first, then the query string; a pair split
/// across the two is accepted. Returns `None` when either token is absent
/// or empty.
pub fn extract_tokens(url: &Url) -> Option<TokenPair> {
    let fragment = fragment_pairs(url);
    let query = query_pairs(url);

    let access_token =
        find_param(&fragment, "access_token").or_else(|| find_param(&query, "access_token"))?;
    let refresh_token =
        find_param(&fragment, "refresh_token").or_else(|| find_param(&query, "refresh_token"))?;

    Some(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Remove every auth-related parameter from both the fragment and the query
/// string. An emptied fragment or query is dropped entirely.
pub fn strip_auth_params(url: &Url) -> Url {
    let mut cleaned = url.clone();

    let kept_query: Vec<(String, String)> = query_pairs(url)
        .into_iter()
        .filter(|(key, _)| !AUTH_PARAMS.contains(&key.as_str()))
        .collect();
    if kept_query.is_empty() {
        cleaned.set_query(None);
    } else {
        let serialized = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept_query)
            .finish();
        cleaned.set_query(Some(&serialized));
    }

    if url.fragment().is_some() {
        let kept_fragment: Vec<(String, String)> = fragment_pairs(url)
            .into_iter()
            .filter(|(key, _)| !AUTH_PARAMS.contains(&key.as_str()))
            .collect();
        if kept_fragment.is_empty() {
            cleaned.set_fragment(None);
        } else {
            let serialized = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(kept_fragment)
                .finish();
            cleaned.set_fragment(Some(&serialized));
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn pair_in_fragment_is_extracted() {
        let location = url("https://app.test/#access_token=at-1&refresh_token=rt-1&expires_in=3600&token_type=bearer");
        let tokens = extract_tokens(&location).unwrap();
        assert_eq!(tokens.access_token, "at-1");
        assert_eq!(tokens.refresh_token, "rt-1");
    }

    #[test]
    fn pair_in_query_is_extracted() {
        let location = url("https://app.test/?access_token=at-2&refresh_token=rt-2");
        let tokens = extract_tokens(&location).unwrap();
        assert_eq!(tokens.access_token, "at-2");
        assert_eq!(tokens.refresh_token, "rt-2");
    }

    #[test]
    fn pair_split_across_fragment_and_query() {
        let location = url("https://app.test/?refresh_token=rt-3#access_token=at-3");
        let tokens = extract_tokens(&location).unwrap();
        assert_eq!(tokens.access_token, "at-3");
        assert_eq!(tokens.refresh_token, "rt-3");
    }

    #[test]
    fn missing_refresh_token_yields_none() {
        let location = url("https://app.test/#access_token=at-only");
        assert!(extract_tokens(&location).is_none());
    }

    #[test]
    fn missing_access_token_yields_none() {
        let location = url("https://app.test/?refresh_token=rt-only");
        assert!(extract_tokens(&location).is_none());
    }

    #[test]
    fn empty_token_value_counts_as_absent() {
        let location = url("https://app.test/#access_token=&refresh_token=rt");
        assert!(extract_tokens(&location).is_none());
    }

    #[test]
    fn plain_url_yields_none() {
        assert!(extract_tokens(&url("https://app.test/dashboard")).is_none());
    }

    #[test]
    fn strip_removes_all_auth_params() {
        let location = url("https://app.test/welcome?access_token=at&refresh_token=rt&expires_in=3600#token_type=bearer&type=recovery");
        let cleaned = strip_auth_params(&location);
        assert_eq!(cleaned.as_str(), "https://app.test/welcome");
        assert!(cleaned.query().is_none());
        assert!(cleaned.fragment().is_none());
    }

    #[test]
    fn strip_keeps_unrelated_params() {
        let location = url("https://app.test/?tab=events&access_token=at&refresh_token=rt");
        let cleaned = strip_auth_params(&location);
        assert_eq!(cleaned.as_str(), "https://app.test/?tab=events");
    }

    #[test]
    fn strip_keeps_unrelated_fragment_fields() {
        let location = url("https://app.test/#section=faq&access_token=at&refresh_token=rt");
        let cleaned = strip_auth_params(&location);
        assert_eq!(cleaned.fragment(), Some("section=faq"));
    }
}

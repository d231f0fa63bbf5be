//! HTTP request helper shared by the backend service bindings

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::error::Error;

const CLIENT_INFO: &str = "eventflow/0.2.0";

/// Builder for a single request against the hosted backend.
///
/// The platform's `apikey` and client-info headers are applied up front so
/// call sites only add what varies per request.
pub struct Request<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Option<HashMap<String, String>>,
    body: Option<Vec<u8>>,
}

impl<'a> Request<'a> {
    fn new(client: &'a Client, url: &str, method: Method, api_key: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("X-Client-Info", HeaderValue::from_static(CLIENT_INFO));
        if let Ok(value) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", value);
        }

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: None,
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(client: &'a Client, url: &str, api_key: &str) -> Self {
        Self::new(client, url, Method::GET, api_key)
    }

    /// Create a POST request
    pub fn post(client: &'a Client, url: &str, api_key: &str) -> Self {
        Self::new(client, url, Method::POST, api_key)
    }

    /// Create a PUT request
    pub fn put(client: &'a Client, url: &str, api_key: &str) -> Self {
        Self::new(client, url, Method::PUT, api_key)
    }

    /// Create a PATCH request
    pub fn patch(client: &'a Client, url: &str, api_key: &str) -> Self {
        Self::new(client, url, Method::PATCH, api_key)
    }

    /// Create a DELETE request
    pub fn delete(client: &'a Client, url: &str, api_key: &str) -> Self {
        Self::new(client, url, Method::DELETE, api_key)
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Add query parameters to the request
    pub fn query(mut self, params: HashMap<String, String>) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if let Some(params) = &self.query_params {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let response = self.build()?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::auth(format!("status {}: {}", status, text)));
            }
            return Err(Error::database(format!("status {}: {}", status, text)));
        }

        Ok(response.json::<T>().await?)
    }

    /// Execute the request, requiring success but discarding the body
    pub async fn execute_no_content(&self) -> Result<(), Error> {
        let response = self.build()?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::auth(format!("status {}: {}", status, text)));
            }
            return Err(Error::database(format!("status {}: {}", status, text)));
        }

        Ok(())
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(&self) -> Result<reqwest::Response, Error> {
        Ok(self.build()?.send().await?)
    }
}

//! Database operations through the backend's REST API
//!
//! Thin typed access to the two collections the application owns records
//! in (`events` and `profiles`), plus stored-procedure calls. Reads go out
//! with the anonymous key; writes carry the signed-in user's access token
//! so row-level policies see the author.

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::error::Error;
use crate::fetch::Request;

/// Client for operations on a single table or view
pub struct TableClient {
    url: String,
    key: String,
    table: String,
    client: Client,
    bearer: Option<String>,
}

impl TableClient {
    pub(crate) fn new(url: &str, key: &str, table: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            table: table.to_string(),
            client,
            bearer: None,
        }
    }

    /// Attach the signed-in user's access token to every request built from
    /// this client
    pub fn authenticated(mut self, access_token: &str) -> Self {
        self.bearer = Some(access_token.to_string());
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(
            self.table_url(),
            self.key.clone(),
            columns,
            self.client.clone(),
            self.bearer.clone(),
        )
    }

    /// Insert a row into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder {
            url: self.table_url(),
            key: self.key.clone(),
            values,
            client: self.client.clone(),
            bearer: self.bearer.clone(),
        }
    }

    /// Update rows in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder {
            url: self.table_url(),
            key: self.key.clone(),
            values,
            client: self.client.clone(),
            query: HashMap::new(),
            bearer: self.bearer.clone(),
        }
    }

    /// Delete rows from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder {
            url: self.table_url(),
            key: self.key.clone(),
            client: self.client.clone(),
            query: HashMap::new(),
            bearer: self.bearer.clone(),
        }
    }
}

fn apply_bearer<'a>(request: Request<'a>, bearer: &Option<String>) -> Request<'a> {
    match bearer {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    url: String,
    key: String,
    client: Client,
    query: HashMap<String, String>,
    bearer: Option<String>,
}

impl SelectBuilder {
    fn new(
        url: String,
        key: String,
        columns: &str,
        client: Client,
        bearer: Option<String>,
    ) -> Self {
        let mut query = HashMap::new();
        query.insert("select".to_string(), columns.to_string());
        Self {
            url,
            key,
            client,
            query,
            bearer,
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query
            .insert(column.to_string(), format!("eq.{}", value.to_string()));
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.query
            .insert("order".to_string(), format!("{}.{}", column, direction));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: i32) -> Self {
        self.query.insert("limit".to_string(), count.to_string());
        self
    }

    /// Execute the query and return the matching rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let request = Request::get(&self.client, &self.url, &self.key).query(self.query.clone());
        apply_bearer(request, &self.bearer).execute::<Vec<T>>().await
    }

    /// Execute the query and return the first matching row, if any
    pub async fn execute_one<T: DeserializeOwned>(mut self) -> Result<Option<T>, Error> {
        self.query.insert("limit".to_string(), "1".to_string());
        let results = self.execute::<T>().await?;
        Ok(results.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    url: String,
    key: String,
    values: T,
    client: Client,
    bearer: Option<String>,
}

impl<T: Serialize> InsertBuilder<T> {
    /// Execute the insert without asking for the created row back
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let request = Request::post(&self.client, &self.url, &self.key)
            .header("Prefer", "return=minimal")
            .json(&self.values)?;
        apply_bearer(request, &self.bearer).execute_no_content().await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    url: String,
    key: String,
    values: T,
    client: Client,
    query: HashMap<String, String>,
    bearer: Option<String>,
}

impl<T: Serialize> UpdateBuilder<T> {
    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query
            .insert(column.to_string(), format!("eq.{}", value.to_string()));
        self
    }

    /// Execute the update without asking for the changed rows back
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let request = Request::patch(&self.client, &self.url, &self.key)
            .header("Prefer", "return=minimal")
            .query(self.query.clone())
            .json(&self.values)?;
        apply_bearer(request, &self.bearer).execute_no_content().await
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    url: String,
    key: String,
    client: Client,
    query: HashMap<String, String>,
    bearer: Option<String>,
}

impl DeleteBuilder {
    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query
            .insert(column.to_string(), format!("eq.{}", value.to_string()));
        self
    }

    /// Execute the delete without asking for the removed rows back
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let request = Request::delete(&self.client, &self.url, &self.key)
            .header("Prefer", "return=minimal")
            .query(self.query.clone());
        apply_bearer(request, &self.bearer).execute_no_content().await
    }
}

/// Builder for stored-procedure calls
pub struct RpcBuilder<T: Serialize> {
    url: String,
    key: String,
    params: T,
    client: Client,
    bearer: Option<String>,
}

impl<T: Serialize> RpcBuilder<T> {
    pub(crate) fn new(
        url: &str,
        key: &str,
        function: &str,
        params: T,
        client: Client,
        bearer: Option<String>,
    ) -> Self {
        Self {
            url: format!("{}/rest/v1/rpc/{}", url, function),
            key: key.to_string(),
            params,
            client,
            bearer,
        }
    }

    /// Execute the call, discarding any result
    pub async fn execute_no_content(&self) -> Result<(), Error> {
        let request = Request::post(&self.client, &self.url, &self.key).json(&self.params)?;
        apply_bearer(request, &self.bearer).execute_no_content().await
    }
}

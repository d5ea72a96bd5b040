//! HTTP client for the hosted REST API (`/rest/v1`).
//!
//! Every request carries the project's publishable key as `apikey` and the
//! signed-in user's access token as bearer auth, so the service applies its
//! row-level policies for that user. When nobody is signed in the publishable
//! key is used as the bearer token.

use std::sync::Arc;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use goalpath_core::errors::{Error, Result};

use crate::auth::SessionManager;
use crate::config::RemoteConfig;
use crate::errors::{ApiErrorResponse, StorageError};

/// Asks the service to echo the affected rows back.
const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    config: RemoteConfig,
    session: Arc<SessionManager>,
}

impl RestClient {
    pub fn new(config: &RemoteConfig, session: Arc<SessionManager>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            session,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Create default headers for API requests.
    async fn headers(&self, prefer_representation: bool) -> Result<HeaderMap> {
        let token = self
            .session
            .access_token()
            .await?
            .unwrap_or_else(|| self.config.anon_key.clone());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.config.anon_key)
                .map_err(|e| StorageError::InvalidHeader(format!("apikey: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| StorageError::InvalidHeader(format!("authorization: {}", e)))?,
        );
        if prefer_representation {
            headers.insert("Prefer", HeaderValue::from_static(PREFER_REPRESENTATION));
        }
        Ok(headers)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        prefer_representation: bool,
    ) -> Result<String> {
        let url = self.config.rest_url(table);
        debug!("[Rest] {} {} {:?}", method, url, query);

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.headers(prefer_representation).await?)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(StorageError::from)?;
        Self::read_body(response).await
    }

    /// Reads the body of an HTTP response, turning non-success statuses into
    /// errors.
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.map_err(StorageError::from)?;

        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                message: ApiErrorResponse::describe(&body, status.as_u16()),
            }
            .into());
        }
        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
        Ok(serde_json::from_str(body).map_err(StorageError::from)?)
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let body = self
            .send::<()>(Method::GET, table, query, None, false)
            .await?;
        Self::parse(&body)
    }

    /// Inserts one row and returns the stored representation.
    pub async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, row: &B) -> Result<Vec<T>> {
        let body = self.send(Method::POST, table, &[], Some(row), true).await?;
        Self::parse(&body)
    }

    /// Updates the rows matched by `filter` and returns them.
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &[(&str, String)],
        changes: &B,
    ) -> Result<Vec<T>> {
        let body = self
            .send(Method::PATCH, table, filter, Some(changes), true)
            .await?;
        Self::parse(&body)
    }

    /// Deletes the rows matched by `filter` and returns the removed rows.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let body = self
            .send::<()>(Method::DELETE, table, filter, None, true)
            .await?;
        Self::parse(&body)
    }
}

/// PostgREST equality filter value.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

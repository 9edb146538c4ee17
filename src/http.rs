//! Authenticated fetch collaborator
//!
//! HTTP client for the SensorThings service. The engine only ever issues
//! GET requests; the trait seam exists so the state machine can be driven
//! by an in-memory fetcher in tests.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchFailure;

/// Basic-auth credentials for the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials with neither field set are not attached to requests
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

/// GET-only JSON fetch against an absolute URL
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url` and parse the body as JSON.
    ///
    /// Implementations attach `Accept: application/json` and, when
    /// credentials are present and non-empty, a Basic-auth header. Non-2xx
    /// responses surface the status and best-effort body text.
    async fn get_json(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Value, FetchFailure>;
}

/// reqwest-backed implementation of [`Fetch`]
pub struct HttpFetch {
    http: Client,
}

impl HttpFetch {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Fetch for HttpFetch {
    async fn get_json(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Value, FetchFailure> {
        let mut request = self.http.get(url).header("Accept", "application/json");

        if let Some(creds) = credentials.filter(|c| !c.is_empty()) {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchFailure::transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        debug!(url = %url, status = %status.as_u16(), "fetched resource");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::http(
                status.as_u16(),
                format!(
                    "HTTP {} {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown status"),
                    body.chars().take(200).collect::<String>()
                ),
            ));
        }

        response.json().await.map_err(|e| {
            FetchFailure::http(
                status.as_u16(),
                format!("invalid JSON from {}: {}", url, e),
            )
        })
    }
}

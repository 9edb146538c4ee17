//! Service root catalog loading
//!
//! A SensorThings service root answers `{ "value": [ { "name", "url"|"href",
//! "description"? }, ... ] }`. Connecting normalizes the server URL, fetches
//! the root, and extracts the list of dereferenceable entity sets. Unusable
//! entries are dropped rather than failing the whole connect.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::BrowserError;
use crate::http::{Credentials, Fetch};
use crate::links::{ensure_trailing_slash, resolve};

/// Demo endpoint used when the configured server URL is blank
pub const DEFAULT_SERVER_URL: &str = "https://toronto-bike-snapshot.sensorup.com/v1.0/";

/// An active connection to a service
///
/// Replaced atomically on every connect attempt: either the new connection
/// and its catalog are both valid, or the catalog is empty and an error is
/// surfaced. The base URL is updated even on failure so the link resolver
/// has something to work with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connection {
    /// Absolute URL ending in "/", or "" before any connect attempt
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// One entry in the service root's collection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySetDescriptor {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Normalize a raw server URL into a connect base.
///
/// Blank input substitutes the built-in demo endpoint; everything else gets
/// exactly one trailing slash.
pub fn connect_base(raw_url: &str) -> String {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        DEFAULT_SERVER_URL.to_string()
    } else {
        ensure_trailing_slash(trimmed)
    }
}

/// Load the service catalog and build the entity-set list.
///
/// Fails with [`BrowserError::EmptyCatalog`] when the root yields no usable
/// entity sets and [`BrowserError::ConnectFailed`] on any fetch/parse
/// failure. Individual entries without a usable name are dropped.
pub async fn connect(
    fetch: &dyn Fetch,
    raw_url: &str,
    credentials: Option<Credentials>,
) -> Result<(Connection, Vec<EntitySetDescriptor>), BrowserError> {
    let base = connect_base(raw_url);

    let body = fetch
        .get_json(&base, credentials.as_ref())
        .await
        .map_err(|e| BrowserError::ConnectFailed(e.to_string()))?;

    let entries = match body.get("value").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Err(BrowserError::EmptyCatalog),
    };

    let mut sets = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = match entry.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                warn!(entry = %entry, "dropping catalog entry without a usable name");
                continue;
            }
        };

        // Explicit url wins over href; a bare name synthesizes base + name
        let reference = entry
            .get("url")
            .and_then(Value::as_str)
            .or_else(|| entry.get("href").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", base, name));

        sets.push(EntitySetDescriptor {
            name: name.to_string(),
            url: resolve(&reference, &base),
            description: entry
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }

    if sets.is_empty() {
        return Err(BrowserError::EmptyCatalog);
    }

    Ok((
        Connection {
            base_url: base,
            credentials,
        },
        sets,
    ))
}

//! Collection / single-entity view classification
//!
//! Every navigated resource is classified into a uniform view model by
//! shape detection rather than schema: an array-valued `value` field makes
//! a paginated collection, anything else is a single entity. Items are kept
//! as opaque JSON; field-level interpretation happens at presentation time
//! in [`crate::fields`].

use serde_json::Value;

use crate::error::BrowserError;
use crate::http::{Credentials, Fetch};
use crate::links::resolve;

/// Key holding a collection's items
pub const VALUE_KEY: &str = "value";
/// Key holding a collection's next-page link
pub const NEXT_LINK_KEY: &str = "@iot.nextLink";
/// Key holding a collection's total entity count
pub const COUNT_KEY: &str = "@iot.count";

/// The two shapes a fetched resource can take
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// A paginated list of entities
    Collection {
        items: Vec<Value>,
        /// Absolute URL of the next page, when the server offers one
        next_link: Option<String>,
        total_count: Option<u64>,
    },
    /// A single entity, kept whole
    Single { entity: Value },
}

impl View {
    /// The next-page link, when this view is a collection that has one
    pub fn next_link(&self) -> Option<&str> {
        match self {
            View::Collection { next_link, .. } => next_link.as_deref(),
            View::Single { .. } => None,
        }
    }
}

/// Classify a response body into a [`View`].
///
/// The next-page link is resolved against `base` when present and a string;
/// the count is kept only when it is a number. No other field is inspected.
pub fn classify_body(mut body: Value, base: &str) -> View {
    let is_collection = body.get(VALUE_KEY).map_or(false, Value::is_array);
    if !is_collection {
        return View::Single { entity: body };
    }

    let next_link = body
        .get(NEXT_LINK_KEY)
        .and_then(Value::as_str)
        .map(|link| resolve(link, base));
    let total_count = body.get(COUNT_KEY).and_then(Value::as_u64);
    let items = match body.get_mut(VALUE_KEY).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    View::Collection {
        items,
        next_link,
        total_count,
    }
}

/// Resolve `url` against `base`, fetch it, and classify the response.
///
/// Failures propagate as [`BrowserError::Fetch`] carrying status and body
/// text when available; never retried.
pub async fn load_view(
    fetch: &dyn Fetch,
    url: &str,
    base: &str,
    credentials: Option<&Credentials>,
) -> Result<View, BrowserError> {
    let absolute = resolve(url, base);
    let body = fetch
        .get_json(&absolute, credentials)
        .await
        .map_err(|e| BrowserError::Fetch(e.to_string()))?;
    Ok(classify_body(body, base))
}

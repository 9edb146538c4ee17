//! STA Browser - Hypermedia REST API Navigation Engine
//!
//! This crate implements the navigation and view-derivation engine for
//! browsing SensorThings-style (STA) REST APIs: services that expose a
//! catalog of named collections at their root, return paginated collections
//! with an `@iot.nextLink`, and embed cross references to related resources
//! as `*@iot.navigationLink` fields on each entity.
//!
//! ## Architecture
//!
//! All state flows through an explicitly owned [`session::BrowserSession`]:
//! connect/open/follow/paginate/revisit are the only operations, each
//! performs its fetch first and commits state only on success.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sta_browser::http::HttpFetch;
//! use sta_browser::session::BrowserSession;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let fetch = Arc::new(HttpFetch::new()?);
//! let mut session = BrowserSession::new(fetch);
//! session.connect("https://example.com/v1.0", None).await?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Link resolution against a shifting base URL
pub mod links;

// Authenticated fetch collaborator (trait + reqwest implementation)
pub mod http;

// Service root catalog loading
pub mod catalog;

// Collection / single-entity view classification
pub mod view;

// Per-field presentation classification
pub mod fields;

// Navigation stack state machine
pub mod session;

pub use catalog::{Connection, EntitySetDescriptor, DEFAULT_SERVER_URL};
pub use error::{BrowserError, FetchFailure};
pub use fields::{classify, format_primitive, title_for, FieldKind};
pub use http::{Credentials, Fetch, HttpFetch};
pub use links::{ensure_trailing_slash, resolve};
pub use session::{Breadcrumb, BrowserSession, CommitOutcome};
pub use view::{load_view, View};

//! Navigation stack state machine
//!
//! Clean session model with explicit state transitions. The session follows
//! these principles:
//!
//! 1. **Load before commit**: every entry point fetches first and mutates
//!    the trail/view only on success; a failed load leaves the prior state
//!    untouched and surfaces an error slot instead.
//! 2. **Last writer wins**: each connect/navigation carries a fencing
//!    ticket; a result arriving after a newer request began is discarded.
//! 3. **Explicitly owned state**: callers inject the session; the engine
//!    never reaches into globals.
//!
//! The two-phase `begin_*` / `commit*` pairs are the real state machine;
//! the async methods are conveniences built on top of them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{self, Connection, EntitySetDescriptor};
use crate::error::BrowserError;
use crate::http::{Credentials, Fetch};
use crate::links::resolve;
use crate::view::{load_view, View};

// ============================================================================
// Breadcrumbs & tickets
// ============================================================================

/// One step in the navigation trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    /// Absolute URL this step points to
    pub url: String,
}

/// Fencing token for one in-flight request.
///
/// Monotonic per session; a commit is accepted only while its ticket is
/// still the latest one issued for that request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavTicket(u64);

/// What a committed navigation load does to the trail
#[derive(Debug, Clone, PartialEq, Eq)]
enum NavAction {
    /// Reset the trail to a single entity-set root
    Open { label: String },
    /// Append one step below the current view
    Follow { label: String },
    /// Replace the last step's url in place, keeping its label
    Paginate { label: String },
    /// Truncate to `index` and re-append the reloaded step
    Revisit { index: usize, label: String },
}

/// An issued navigation request, waiting for its load to complete
#[derive(Debug, Clone)]
pub struct PendingNav {
    ticket: NavTicket,
    url: String,
    action: NavAction,
}

impl PendingNav {
    /// Absolute URL the load must fetch
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ticket(&self) -> NavTicket {
        self.ticket
    }
}

/// An issued connect request, waiting for the catalog load to complete
#[derive(Debug, Clone)]
pub struct PendingConnect {
    ticket: NavTicket,
    /// Base the connect attempted, kept even when the load fails
    base: String,
    credentials: Option<Credentials>,
}

impl PendingConnect {
    /// Normalized base URL the catalog load must fetch
    pub fn base(&self) -> &str {
        &self.base
    }
}

/// What happened to a completed load when it was handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The result was applied to the session
    Committed,
    /// A newer request was issued in the meantime; the result was discarded
    Superseded,
}

// ============================================================================
// BrowserSession
// ============================================================================

/// The browser engine: connection, catalog, trail, and current view.
///
/// Exactly one trail exists at a time; it is non-empty while any view is
/// displayed and empty only in the initial/disconnected state. The
/// displayed view always corresponds to the last breadcrumb's url.
pub struct BrowserSession {
    /// Unique session ID, used for tracing only
    pub id: Uuid,
    /// When this session was created
    pub created_at: DateTime<Utc>,
    /// When this session last committed a state change
    pub last_active_at: DateTime<Utc>,

    fetch: Arc<dyn Fetch>,
    connection: Connection,
    entity_sets: Vec<EntitySetDescriptor>,
    trail: Vec<Breadcrumb>,
    view: Option<View>,

    /// Connect-level failure message (root UI region)
    root_error: Option<String>,
    /// Navigation-level failure message (content UI region)
    content_error: Option<String>,

    connect_epoch: u64,
    nav_epoch: u64,
}

impl BrowserSession {
    /// Create a disconnected session around a fetch collaborator
    pub fn new(fetch: Arc<dyn Fetch>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active_at: now,
            fetch,
            connection: Connection::default(),
            entity_sets: Vec::new(),
            trail: Vec::new(),
            view: None,
            root_error: None,
            content_error: None,
            connect_epoch: 0,
            nav_epoch: 0,
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn base_url(&self) -> &str {
        &self.connection.base_url
    }

    pub fn entity_sets(&self) -> &[EntitySetDescriptor] {
        &self.entity_sets
    }

    pub fn trail(&self) -> &[Breadcrumb] {
        &self.trail
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn root_error(&self) -> Option<&str> {
        self.root_error.as_deref()
    }

    pub fn content_error(&self) -> Option<&str> {
        self.content_error.as_deref()
    }

    // ========================================================================
    // Connect (catalog loader pair)
    // ========================================================================

    /// Issue a connect attempt, superseding any connect still in flight
    pub fn begin_connect(
        &mut self,
        raw_url: &str,
        credentials: Option<Credentials>,
    ) -> PendingConnect {
        self.connect_epoch += 1;
        PendingConnect {
            ticket: NavTicket(self.connect_epoch),
            base: catalog::connect_base(raw_url),
            credentials,
        }
    }

    /// Apply a completed catalog load.
    ///
    /// A reconnect always discards prior navigation, success or not. On
    /// failure the base URL is still updated to the attempted base, the
    /// catalog becomes empty, and the error lands in the root slot.
    pub fn commit_connect(
        &mut self,
        pending: PendingConnect,
        result: Result<(Connection, Vec<EntitySetDescriptor>), BrowserError>,
    ) -> Result<CommitOutcome, BrowserError> {
        if pending.ticket.0 != self.connect_epoch {
            debug!(session = %self.id, "discarding superseded connect result");
            return Ok(CommitOutcome::Superseded);
        }

        // A committed connect discards prior navigation, so any navigation
        // still in flight must be fenced out with it
        self.nav_epoch += 1;
        self.trail.clear();
        self.view = None;
        self.content_error = None;
        self.last_active_at = Utc::now();

        match result {
            Ok((connection, sets)) => {
                self.connection = connection;
                self.entity_sets = sets;
                self.root_error = None;
                Ok(CommitOutcome::Committed)
            }
            Err(e) => {
                self.connection = Connection {
                    base_url: pending.base,
                    credentials: pending.credentials,
                };
                self.entity_sets.clear();
                self.root_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Connect to a service root and load its catalog
    pub async fn connect(
        &mut self,
        raw_url: &str,
        credentials: Option<Credentials>,
    ) -> Result<(), BrowserError> {
        let pending = self.begin_connect(raw_url, credentials.clone());
        let result = catalog::connect(self.fetch.as_ref(), raw_url, credentials).await;
        self.commit_connect(pending, result).map(|_| ())
    }

    // ========================================================================
    // Navigation (view loader pairs)
    // ========================================================================

    /// Visit a new entity-set root, resetting the trail to one step
    pub fn begin_open(&mut self, url: &str, label: &str) -> PendingNav {
        self.issue(url, NavAction::Open {
            label: label.to_string(),
        })
    }

    /// Descend via a link found inside the current view
    pub fn begin_follow(&mut self, url: &str, label: &str) -> PendingNav {
        self.issue(url, NavAction::Follow {
            label: label.to_string(),
        })
    }

    /// Replace the current page with the next page of the same collection.
    ///
    /// Returns `None` (a no-op, no ticket spent) when the trail is empty or
    /// the link is blank.
    pub fn begin_paginate(&mut self, link: &str) -> Option<PendingNav> {
        if link.is_empty() {
            return None;
        }
        let last = self.trail.last()?;
        let label = last.label.clone();
        Some(self.issue(link, NavAction::Paginate { label }))
    }

    /// Jump back to an earlier breadcrumb, discarding everything after it.
    ///
    /// Returns `None` when `index` is already the last step or out of
    /// range. The step is re-fetched rather than reusing a cached view.
    pub fn begin_revisit(&mut self, index: usize) -> Option<PendingNav> {
        if self.trail.len() < 2 || index >= self.trail.len() - 1 {
            return None;
        }
        let crumb = self.trail[index].clone();
        Some(self.issue(&crumb.url, NavAction::Revisit {
            index,
            label: crumb.label,
        }))
    }

    fn issue(&mut self, url: &str, action: NavAction) -> PendingNav {
        self.nav_epoch += 1;
        PendingNav {
            ticket: NavTicket(self.nav_epoch),
            url: resolve(url, &self.connection.base_url),
            action,
        }
    }

    /// Apply a completed view load for a previously issued navigation.
    ///
    /// Stale tickets are discarded without touching any state, including
    /// the error slots. A failed load surfaces in the content slot and
    /// leaves the trail and view exactly as they were.
    pub fn commit(
        &mut self,
        pending: PendingNav,
        result: Result<View, BrowserError>,
    ) -> Result<CommitOutcome, BrowserError> {
        if pending.ticket.0 != self.nav_epoch {
            debug!(session = %self.id, url = %pending.url, "discarding superseded navigation result");
            return Ok(CommitOutcome::Superseded);
        }

        let view = match result {
            Ok(view) => view,
            Err(e) => {
                self.content_error = Some(e.to_string());
                return Err(e);
            }
        };

        match pending.action {
            NavAction::Open { label } => {
                self.trail = vec![Breadcrumb {
                    label,
                    url: pending.url,
                }];
            }
            NavAction::Follow { label } => {
                self.trail.push(Breadcrumb {
                    label,
                    url: pending.url,
                });
            }
            NavAction::Paginate { label } => {
                // Depth is invariant across pagination: replace, never append
                if let Some(last) = self.trail.last_mut() {
                    *last = Breadcrumb {
                        label,
                        url: pending.url,
                    };
                }
            }
            NavAction::Revisit { index, label } => {
                self.trail.truncate(index);
                self.trail.push(Breadcrumb {
                    label,
                    url: pending.url,
                });
            }
        }

        self.view = Some(view);
        self.content_error = None;
        self.last_active_at = Utc::now();
        Ok(CommitOutcome::Committed)
    }

    async fn load(&self, pending: &PendingNav) -> Result<View, BrowserError> {
        load_view(
            self.fetch.as_ref(),
            &pending.url,
            &self.connection.base_url,
            self.connection.credentials.as_ref(),
        )
        .await
    }

    /// Open an entity-set root as a fresh one-step trail
    pub async fn open(&mut self, url: &str, label: &str) -> Result<(), BrowserError> {
        let pending = self.begin_open(url, label);
        let result = self.load(&pending).await;
        self.commit(pending, result).map(|_| ())
    }

    /// Follow a link from the current view, appending one step
    pub async fn follow(&mut self, url: &str, label: &str) -> Result<(), BrowserError> {
        let pending = self.begin_follow(url, label);
        let result = self.load(&pending).await;
        self.commit(pending, result).map(|_| ())
    }

    /// Load the next page of the current collection in place
    pub async fn paginate(&mut self, link: &str) -> Result<(), BrowserError> {
        let Some(pending) = self.begin_paginate(link) else {
            return Ok(());
        };
        let result = self.load(&pending).await;
        self.commit(pending, result).map(|_| ())
    }

    /// Revisit an earlier breadcrumb, truncating the trail to it
    pub async fn revisit(&mut self, index: usize) -> Result<(), BrowserError> {
        let Some(pending) = self.begin_revisit(index) else {
            return Ok(());
        };
        let result = self.load(&pending).await;
        self.commit(pending, result).map(|_| ())
    }
}

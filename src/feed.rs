//! Medium feed loading through the rss2json proxy.
//!
//! A page can hold any number of feed containers (`[data-medium-feed]`). Each
//! one gets its own [`FeedLoader`], which walks a small state machine:
//!
//! ```text
//! Idle ──► Loading ──► Rendered | Empty | Error
//!   └──────────────────────────────────► Error   (no handle configured)
//! ```
//!
//! # Architecture
//!
//! - [`FeedSource`]: narrow trait that fetches the raw items for a handle, so
//!   normalization and rendering can be exercised without network access
//! - [`Rss2JsonClient`]: the production [`FeedSource`], one GET per call
//! - [`FeedLoader`]: runs at most one fetch per container and renders the
//!   resulting terminal state into the document
//!
//! # Failure Handling
//!
//! Transport errors, non-success HTTP statuses, proxy-reported failures and
//! malformed payloads all end in the same user-facing message; the precise
//! reason only goes to the log. Nothing is retried.

use ego_tree::NodeId;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::cards::build_article_card;
use crate::dom::{Document, DomError};
use crate::models::{ArticleCard, FeedItem, FeedPayload};
use crate::utils::truncate_for_log;

/// Public rss2json endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";

/// Medium serves a user's RSS feed under this prefix followed by the handle.
pub const MEDIUM_FEED_BASE: &str = "https://medium.com/feed/@";

/// Cards rendered when the container does not set a usable limit.
pub const DEFAULT_LIMIT: usize = 6;

pub const MISSING_HANDLE_MESSAGE: &str = "Medium handle is not configured.";
pub const UNAVAILABLE_MESSAGE: &str =
    "Unable to load Medium posts right now. Please visit Medium to read the latest updates.";
pub const EMPTY_MESSAGE: &str = "No posts found yet — check back soon.";

/// Why a feed could not be fetched. Only ever logged.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("proxy responded with HTTP {0}")]
    Status(StatusCode),

    #[error("proxy reported status {status:?}: {message}")]
    Proxy { status: String, message: String },

    #[error("malformed feed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid proxy endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Source of raw feed items for a handle.
///
/// Implementations may write `async fn fetch_feed`. The returned future is
/// not required to be `Send`; loaders await it on the task that owns the
/// document.
pub trait FeedSource {
    /// Fetch every item the upstream feed currently lists for `handle`.
    fn fetch_feed(&self, handle: &str) -> impl Future<Output = Result<Vec<FeedItem>, FetchError>>;
}

/// [`FeedSource`] backed by the rss2json feed-to-JSON proxy.
#[derive(Debug, Clone)]
pub struct Rss2JsonClient {
    client: Client,
    endpoint: Url,
}

impl Rss2JsonClient {
    /// Create a client for the proxy at `endpoint`
    /// (normally [`DEFAULT_ENDPOINT`]).
    pub fn new(endpoint: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(endpoint)?,
        })
    }

    /// The request URL for `handle`.
    ///
    /// Only the handle is percent-encoded; the proxy expects the feed URL
    /// itself verbatim in `rss_url`.
    pub fn request_url(&self, handle: &str) -> String {
        let separator = if self.endpoint.query().is_some() { '&' } else { '?' };
        format!(
            "{}{}rss_url={}{}",
            self.endpoint,
            separator,
            MEDIUM_FEED_BASE,
            urlencoding::encode(handle)
        )
    }
}

impl FeedSource for Rss2JsonClient {
    #[instrument(level = "info", skip_all, fields(%handle))]
    async fn fetch_feed(&self, handle: &str) -> Result<Vec<FeedItem>, FetchError> {
        let url = self.request_url(handle);
        debug!(%url, "Requesting feed from proxy");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let payload: FeedPayload = serde_json::from_str(&body).inspect_err(|e| {
            warn!(error = %e, body_preview = %truncate_for_log(&body, 300), "Proxy returned non-conforming JSON");
        })?;

        if payload.is_error() {
            return Err(FetchError::Proxy {
                status: payload.status.unwrap_or_default(),
                message: payload
                    .message
                    .unwrap_or_else(|| "Feed unavailable".to_string()),
            });
        }

        info!(count = payload.items.len(), "Fetched feed items");
        Ok(payload.items)
    }
}

/// Configuration read from one `[data-medium-feed]` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedContainer {
    /// The container element.
    pub node: NodeId,
    /// Optional `[data-status]` placeholder inside the container.
    pub status: Option<NodeId>,
    /// `data-medium-handle`; an empty attribute counts as missing.
    pub handle: Option<String>,
    /// `data-medium-limit`, falling back to [`DEFAULT_LIMIT`].
    pub limit: usize,
}

impl FeedContainer {
    pub fn from_node(doc: &Document, node: NodeId) -> Result<Self, DomError> {
        Ok(Self {
            node,
            status: doc.query_selector(node, "[data-status]")?,
            handle: doc
                .attr(node, "data-medium-handle")
                .filter(|handle| !handle.is_empty())
                .map(str::to_string),
            limit: parse_limit(doc.attr(node, "data-medium-limit")),
        })
    }
}

/// Parse `data-medium-limit`: a positive integer, otherwise [`DEFAULT_LIMIT`].
pub fn parse_limit(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIMIT)
}

/// The user-facing failure a container can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedError {
    /// No `data-medium-handle`; detected before any request.
    MissingHandle,
    /// Transport, HTTP status, proxy status or payload failure.
    Unavailable,
}

impl FeedError {
    pub fn message(&self) -> &'static str {
        match self {
            FeedError::MissingHandle => MISSING_HANDLE_MESSAGE,
            FeedError::Unavailable => UNAVAILABLE_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Loading,
    Rendered(Vec<ArticleCard>),
    Empty,
    Error(FeedError),
}

impl FeedState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FeedState::Idle | FeedState::Loading)
    }

    /// Cards of a `Rendered` state; empty for every other state.
    pub fn cards(&self) -> &[ArticleCard] {
        match self {
            FeedState::Rendered(cards) => cards,
            _ => &[],
        }
    }
}

/// Drives one feed container from `Idle` to a terminal state.
#[derive(Debug)]
pub struct FeedLoader {
    container: FeedContainer,
    state: FeedState,
}

impl FeedLoader {
    pub fn new(container: FeedContainer) -> Self {
        Self {
            container,
            state: FeedState::Idle,
        }
    }

    pub fn container(&self) -> &FeedContainer {
        &self.container
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Fetch and normalize the feed, at most once.
    ///
    /// A loader that already left `Idle` returns its current state without
    /// touching `source` again.
    #[instrument(level = "info", skip_all, fields(handle = ?self.container.handle, limit = self.container.limit))]
    pub async fn load<S: FeedSource>(&mut self, source: &S) -> &FeedState {
        if self.state != FeedState::Idle {
            debug!(state = ?self.state, "Feed already loaded; skipping");
            return &self.state;
        }

        let Some(handle) = self.container.handle.clone() else {
            warn!("Feed container has no data-medium-handle");
            self.state = FeedState::Error(FeedError::MissingHandle);
            return &self.state;
        };

        self.state = FeedState::Loading;
        self.state = match source.fetch_feed(&handle).await {
            Ok(items) => {
                let cards = items
                    .iter()
                    .take(self.container.limit)
                    .map(ArticleCard::from_item)
                    .collect::<Vec<_>>();
                if cards.is_empty() {
                    info!("Feed has no posts");
                    FeedState::Empty
                } else {
                    info!(count = cards.len(), available = items.len(), "Feed normalized into cards");
                    FeedState::Rendered(cards)
                }
            }
            Err(e) => {
                error!(error = %e, "Feed load failed");
                FeedState::Error(FeedError::Unavailable)
            }
        };
        &self.state
    }

    /// Write the current terminal state into the container.
    ///
    /// The container's previous content is replaced and the `[data-status]`
    /// placeholder is removed whatever the outcome. Non-terminal states leave
    /// the document untouched.
    pub fn render(&self, doc: &mut Document) {
        let node = self.container.node;
        match &self.state {
            FeedState::Idle | FeedState::Loading => return,
            FeedState::Rendered(cards) => {
                doc.clear_children(node);
                for card in cards {
                    let element = build_article_card(doc, card);
                    doc.append_child(node, element);
                }
            }
            FeedState::Empty => render_message(doc, node, EMPTY_MESSAGE),
            FeedState::Error(error) => render_message(doc, node, error.message()),
        }

        if let Some(status) = self.container.status {
            if doc.parent(status).is_some() {
                doc.remove(status);
            }
        }
    }
}

fn render_message(doc: &mut Document, container: NodeId, message: &str) {
    doc.clear_children(container);
    let empty_state = doc.create_element("div");
    doc.set_attr(empty_state, "class", "blog-list__empty");
    doc.set_text_content(empty_state, message);
    doc.append_child(container, empty_state);
}

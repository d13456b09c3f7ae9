//! One-shot page initialization.
//!
//! All lookups against the host markup happen here, once, and come back as
//! explicit handles: the navigation controller, the feed containers and the
//! footer year element. Nothing else in the crate queries the page on its
//! own.

use chrono::{Datelike, Local};
use ego_tree::NodeId;
use tracing::{info, instrument};

use crate::dom::{Document, DomError};
use crate::feed::FeedContainer;
use crate::nav::NavController;

pub const FEED_SELECTOR: &str = "[data-medium-feed]";
pub const YEAR_ELEMENT_ID: &str = "current-year";

/// What the environment running the page supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Intersection observation is available, enabling scroll-spy.
    pub intersection_observer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
        }
    }
}

/// Everything [`init`] wired up.
#[derive(Debug, Clone)]
pub struct PageHandles {
    pub nav: NavController,
    pub feeds: Vec<FeedContainer>,
    pub year: Option<NodeId>,
}

/// Wire the page: navigation, every feed container, and `#current-year`.
#[instrument(level = "info", skip_all)]
pub fn init(doc: &Document, capabilities: Capabilities) -> Result<PageHandles, DomError> {
    let nav = NavController::wire(doc, capabilities.intersection_observer)?;

    let feeds = doc
        .query_selector_all(doc.root(), FEED_SELECTOR)?
        .into_iter()
        .map(|node| FeedContainer::from_node(doc, node))
        .collect::<Result<Vec<_>, _>>()?;

    let year = doc.get_element_by_id(YEAR_ELEMENT_ID);

    info!(feeds = feeds.len(), has_year = year.is_some(), "Page initialized");
    Ok(PageHandles { nav, feeds, year })
}

/// Write `year` into the `#current-year` element, if the page has one.
pub fn set_year(doc: &mut Document, handles: &PageHandles, year: i32) {
    if let Some(node) = handles.year {
        doc.set_text_content(node, &year.to_string());
    }
}

/// Write the current local year into `#current-year`.
pub fn set_current_year(doc: &mut Document, handles: &PageHandles) {
    set_year(doc, handles, Local::now().year());
}

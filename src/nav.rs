//! Navigation menu and scroll-spy.
//!
//! [`NavController`] is wired once against the page and then reacts to three
//! kinds of events:
//!
//! - **toggle**: the `.nav__toggle` button flips `aria-expanded` and the
//!   `is-open` class of `.nav__links`
//! - **link click**: any `.nav__links a` collapses the menu
//! - **intersection**: when a mapped section enters the middle 20% of the
//!   viewport, its anchor becomes the only `active` one
//!
//! Scroll-spy degrades silently: without the intersection capability, or
//! with no anchor pointing at an existing section, intersection events are
//! ignored.

use ego_tree::NodeId;
use tracing::{debug, info, instrument};

use crate::dom::{Document, DomError};
use crate::models::NavSection;

pub const TOGGLE_SELECTOR: &str = ".nav__toggle";
pub const LINKS_SELECTOR: &str = ".nav__links";
pub const ANCHOR_SELECTOR: &str = ".nav__links a";

const EXPANDED_ATTR: &str = "aria-expanded";
const OPEN_CLASS: &str = "is-open";
const ACTIVE_CLASS: &str = "active";

/// Share of the viewport height cut from both the top and the bottom.
pub const ROOT_MARGIN_FRACTION: f64 = 0.4;

/// One intersection change for an observed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
}

/// Vertical position of a section in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionLayout {
    pub top: f64,
    pub height: f64,
}

/// The part of the viewport sections are observed in, relative to the
/// viewport's top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBand {
    pub top: f64,
    pub bottom: f64,
}

impl ViewportBand {
    /// Band for a viewport of `height` with a `-40% 0px -40% 0px` root margin.
    pub fn for_viewport(height: f64) -> Self {
        let margin = height * ROOT_MARGIN_FRACTION;
        Self {
            top: margin,
            bottom: height - margin,
        }
    }

    /// Whether a section overlaps the band while the page is scrolled to
    /// `scroll_y`.
    pub fn intersects(&self, scroll_y: f64, layout: SectionLayout) -> bool {
        let band_top = scroll_y + self.top;
        let band_bottom = scroll_y + self.bottom;
        layout.top < band_bottom && layout.top + layout.height > band_top
    }
}

/// Tracks which observed sections intersect the band and reports changes,
/// the way an `IntersectionObserver` with threshold 0 does: the first
/// observation reports every target, later ones only the targets whose
/// state changed.
#[derive(Debug, Clone)]
pub struct SectionObserver {
    band: ViewportBand,
    targets: Vec<NodeId>,
    last: Vec<Option<bool>>,
}

impl SectionObserver {
    pub fn new(viewport_height: f64, targets: Vec<NodeId>) -> Self {
        let last = vec![None; targets.len()];
        Self {
            band: ViewportBand::for_viewport(viewport_height),
            targets,
            last,
        }
    }

    pub fn band(&self) -> ViewportBand {
        self.band
    }

    /// Recompute intersections at `scroll_y`.
    ///
    /// `layout_of` gives each target's position; targets without a layout
    /// are treated as not intersecting.
    pub fn observe<F>(&mut self, scroll_y: f64, layout_of: F) -> Vec<IntersectionEntry>
    where
        F: Fn(NodeId) -> Option<SectionLayout>,
    {
        let mut entries = Vec::new();
        for (target, last) in self.targets.iter().zip(self.last.iter_mut()) {
            let is_intersecting = layout_of(*target)
                .is_some_and(|layout| self.band.intersects(scroll_y, layout));
            if *last != Some(is_intersecting) {
                *last = Some(is_intersecting);
                entries.push(IntersectionEntry {
                    target: *target,
                    is_intersecting,
                });
            }
        }
        entries
    }
}

/// Wired handles of the page navigation.
#[derive(Debug, Clone)]
pub struct NavController {
    toggle: Option<NodeId>,
    links: Option<NodeId>,
    anchors: Vec<NodeId>,
    sections: Vec<NavSection>,
    intersection_observer: bool,
}

impl NavController {
    /// Find the navigation elements and map anchors to their sections.
    ///
    /// Only anchors whose `href` is a `#fragment` naming an existing element
    /// id get a [`NavSection`].
    #[instrument(level = "info", skip_all)]
    pub fn wire(doc: &Document, intersection_observer: bool) -> Result<Self, DomError> {
        let root = doc.root();
        let toggle = doc.query_selector(root, TOGGLE_SELECTOR)?;
        let links = doc.query_selector(root, LINKS_SELECTOR)?;
        let anchors = doc.query_selector_all(root, ANCHOR_SELECTOR)?;

        let sections = anchors
            .iter()
            .filter_map(|&anchor| {
                let fragment = doc.attr(anchor, "href")?.strip_prefix('#')?;
                if fragment.is_empty() {
                    return None;
                }
                let section = doc.get_element_by_id(fragment)?;
                Some(NavSection { anchor, section })
            })
            .collect::<Vec<_>>();

        info!(
            has_toggle = toggle.is_some(),
            has_links = links.is_some(),
            anchors = anchors.len(),
            sections = sections.len(),
            intersection_observer,
            "Navigation wired"
        );

        Ok(Self {
            toggle,
            links,
            anchors,
            sections,
            intersection_observer,
        })
    }

    pub fn anchors(&self) -> &[NodeId] {
        &self.anchors
    }

    pub fn sections(&self) -> &[NavSection] {
        &self.sections
    }

    /// Whether scroll-spy is active for this page.
    pub fn observes(&self) -> bool {
        self.intersection_observer && !self.sections.is_empty()
    }

    /// An observer over every mapped section, if scroll-spy is active.
    pub fn observer(&self, viewport_height: f64) -> Option<SectionObserver> {
        self.observes().then(|| {
            SectionObserver::new(
                viewport_height,
                self.sections.iter().map(|s| s.section).collect(),
            )
        })
    }

    /// Flip the menu. Returns the new expanded state, or `None` when the
    /// toggle or the link list is missing.
    pub fn toggle(&self, doc: &mut Document) -> Option<bool> {
        let (toggle, links) = (self.toggle?, self.links?);
        let expanded = doc.attr(toggle, EXPANDED_ATTR) == Some("true");
        doc.set_attr(toggle, EXPANDED_ATTR, if expanded { "false" } else { "true" });
        doc.toggle_class(links, OPEN_CLASS);
        debug!(expanded = !expanded, "Navigation toggled");
        Some(!expanded)
    }

    /// Collapse the menu after a navigation link was followed.
    pub fn link_clicked(&self, doc: &mut Document) {
        let Some(links) = self.links else {
            return;
        };
        doc.remove_class(links, OPEN_CLASS);
        if let Some(toggle) = self.toggle {
            doc.set_attr(toggle, EXPANDED_ATTR, "false");
        }
    }

    /// Apply intersection changes: the anchor of the last section entering
    /// the band becomes the only active one.
    pub fn on_intersection(&self, doc: &mut Document, entries: &[IntersectionEntry]) {
        if !self.observes() {
            return;
        }
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(section) = self.sections.iter().find(|s| s.section == entry.target) else {
                continue;
            };
            for &anchor in &self.anchors {
                doc.remove_class(anchor, ACTIVE_CLASS);
            }
            doc.add_class(section.anchor, ACTIVE_CLASS);
            debug!(section = ?section.section, "Section entered view");
        }
    }

    /// The anchor currently highlighted, if any.
    pub fn active_anchor(&self, doc: &Document) -> Option<NodeId> {
        self.anchors
            .iter()
            .copied()
            .find(|&anchor| doc.has_class(anchor, ACTIVE_CLASS))
    }
}

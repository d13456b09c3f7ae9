//! Headless runtime for a static portfolio page.
//!
//! The crate models the page's client-side behaviour over an editable
//! document:
//!
//! - [`page::init`] wires everything once and returns explicit handles
//! - [`nav::NavController`] implements the menu toggle and scroll-spy
//! - [`feed::FeedLoader`] loads one Medium feed container through a
//!   [`feed::FeedSource`] and renders cards, an empty state or an error
//! - [`outputs`] writes the rendered page and the card JSON
//!
//! ```ignore
//! let mut doc = Document::parse(&html);
//! let handles = page::init(&doc, Capabilities::default())?;
//! let client = Rss2JsonClient::new(feed::DEFAULT_ENDPOINT)?;
//! for container in handles.feeds {
//!     let mut loader = FeedLoader::new(container);
//!     loader.load(&client).await;
//!     loader.render(&mut doc);
//! }
//! ```

pub mod cards;
pub mod dom;
pub mod feed;
pub mod models;
pub mod nav;
pub mod outputs;
pub mod page;
pub mod utils;

//! # Portfolio Feed
//!
//! A headless runtime for a static portfolio page. It takes the page markup,
//! wires the collapsible navigation and its scroll-spy, loads the Medium
//! posts of every blog list through the rss2json proxy and writes the page
//! back out with the blog cards rendered in place.
//!
//! ## Features
//!
//! - Mutable document model over html5ever-parsed markup
//! - Navigation toggle, collapse-on-click and section highlighting
//! - One rss2json request per `[data-medium-feed]` container, no retries
//! - Card normalization: plain-text excerpts, reading time, dates, images
//! - HTML page output and optional per-handle JSON card files
//!
//! ## Usage
//!
//! ```sh
//! portfolio_feed -i site/index.html -o public/index.html -j public/api
//! ```
//!
//! ## Architecture
//!
//! 1. **Init**: parse the page and collect every handle in one pass
//! 2. **Load**: fetch all feeds concurrently, each container independently
//! 3. **Render**: write cards, empty states or error messages into the page
//! 4. **Output**: serialize the page and the optional JSON files

use clap::Parser;
use futures::future::join_all;
use std::error::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;
use portfolio_feed::dom::Document;
use portfolio_feed::feed::{FeedLoader, FeedState, Rss2JsonClient};
use portfolio_feed::outputs::{html, json};
use portfolio_feed::page::{self, Capabilities};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("portfolio_feed starting up");

    let args = Cli::parse();
    debug!(?args.input, ?args.output, ?args.json_output_dir, "Parsed CLI arguments");

    // ---- Load and wire the page ----
    let source = match fs::read_to_string(&args.input).await {
        Ok(source) => source,
        Err(e) => {
            error!(path = %args.input.display(), error = %e, "Failed to read host page");
            return Err(e.into());
        }
    };
    let mut doc = Document::parse(&source);

    let capabilities = Capabilities {
        intersection_observer: !args.no_intersection_observer,
    };
    let handles = page::init(&doc, capabilities)?;
    page::set_current_year(&mut doc, &handles);

    if handles.feeds.is_empty() {
        warn!("Page has no [data-medium-feed] container; nothing to load");
    }

    // ---- Load every feed container concurrently ----
    let client = Rss2JsonClient::new(&args.proxy_endpoint)?;
    let mut loaders = handles
        .feeds
        .iter()
        .cloned()
        .map(FeedLoader::new)
        .collect::<Vec<_>>();

    join_all(loaders.iter_mut().map(|loader| loader.load(&client))).await;

    // ---- Render terminal states into the page ----
    let mut rendered = 0usize;
    let mut failed = 0usize;
    for loader in &loaders {
        loader.render(&mut doc);
        match loader.state() {
            FeedState::Rendered(cards) => rendered += cards.len(),
            FeedState::Error(_) => failed += 1,
            _ => {}
        }
    }
    info!(
        containers = loaders.len(),
        cards = rendered,
        failed_containers = failed,
        scroll_spy = handles.nav.observes(),
        "Page rendered"
    );

    // ---- Outputs ----
    let page_written = html::write_page(&doc, &args.output).await;
    if let Err(e) = &page_written {
        error!(path = %args.output.display(), error = %e, "Failed to write rendered page");
    }

    if let Some(json_output_dir) = &args.json_output_dir {
        match json::CardWriter::new(json_output_dir).await {
            Ok(mut writer) => {
                for loader in &loaders {
                    let Some(handle) = loader.container().handle.as_deref() else {
                        continue;
                    };
                    if let Err(e) = writer.write(handle, loader.state().cards()).await {
                        error!(%handle, error = %e, "Failed to write card JSON");
                    }
                }
            }
            Err(e) => error!(dir = %json_output_dir, error = %e, "JSON output directory unusable"),
        }
    }

    page_written?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

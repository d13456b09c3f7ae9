//! Rendered page output.

use crate::dom::Document;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `doc` and write it to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_page(doc: &Document, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create page output dir");
            return Err(e.into());
        }
    }

    let html = doc.to_html();
    fs::write(path, &html).await?;
    info!(bytes = html.len(), "Wrote rendered page");
    Ok(())
}

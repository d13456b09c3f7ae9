//! Command-line interface definitions.
//!
//! All options can be given as flags; the proxy endpoint can also come from
//! the environment.

use clap::Parser;
use std::path::PathBuf;

use portfolio_feed::feed::DEFAULT_ENDPOINT;

/// Render a portfolio page headlessly: wire the navigation, load every
/// Medium feed container and write the resulting HTML.
///
/// # Examples
///
/// ```sh
/// # Render the page in place of its placeholder content
/// portfolio_feed -i site/index.html -o public/index.html
///
/// # Also dump each feed's cards as JSON
/// portfolio_feed -i site/index.html -o public/index.html -j public/api
///
/// # Use a self-hosted proxy
/// RSS2JSON_ENDPOINT=http://localhost:8080/v1/api.json portfolio_feed -i site/index.html -o out.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Host page HTML to render
    #[arg(short, long)]
    pub input: PathBuf,

    /// Destination of the rendered page
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional directory for per-handle card JSON files
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Feed-to-JSON proxy endpoint
    #[arg(long, env = "RSS2JSON_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub proxy_endpoint: String,

    /// Treat the environment as lacking intersection observation (disables scroll-spy)
    #[arg(long)]
    pub no_intersection_observer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "portfolio_feed",
            "--input",
            "site/index.html",
            "--output",
            "public/index.html",
        ]);

        assert_eq!(cli.input, PathBuf::from("site/index.html"));
        assert_eq!(cli.output, PathBuf::from("public/index.html"));
        assert_eq!(cli.json_output_dir, None);
        assert!(!cli.no_intersection_observer);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "portfolio_feed",
            "-i",
            "/tmp/in.html",
            "-o",
            "/tmp/out.html",
            "-j",
            "/tmp/json",
            "--proxy-endpoint",
            "http://localhost:8080/v1/api.json",
            "--no-intersection-observer",
        ]);

        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert_eq!(cli.proxy_endpoint, "http://localhost:8080/v1/api.json");
        assert!(cli.no_intersection_observer);
    }
}

//! Text helpers used to normalize feed entries, plus a few I/O utilities.
//!
//! This module provides:
//! - HTML to plain text conversion and excerpt truncation
//! - Absolute HTTP(S) URL validation and image URL extraction
//! - Reading time estimation and short date formatting
//! - Log-friendly truncation and output directory validation

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::FeedItem;

/// Average adult reading speed used for the reading time estimate.
pub const WORDS_PER_MINUTE: usize = 220;

/// Longest excerpt kept verbatim; longer text is cut and ellipsized.
pub const EXCERPT_MAX_CHARS: usize = 180;

/// Characters kept in front of the ellipsis when an excerpt is cut.
const EXCERPT_KEEP_CHARS: usize = 177;

static HTTP_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

static IMG_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap());

/// Convert an HTML snippet to its visible text.
///
/// The markup is parsed as a fragment, its text nodes are concatenated and
/// every whitespace run collapses to a single space.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_html("<p>Hello <b>there</b></p>\n<p>friend</p>"), "Hello there friend");
/// ```
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Return `value` unchanged if it is an absolute `http://` or `https://` URL
/// (scheme matched case-insensitively), otherwise an empty string.
///
/// `None` stands for an absent or non-string field and yields `""`.
pub fn ensure_absolute_http_url(value: Option<&str>) -> String {
    match value {
        Some(url) if HTTP_URL_RE.is_match(url) => url.to_string(),
        _ => String::new(),
    }
}

/// The first `<img src="...">` in `html`, if it is an absolute HTTP(S) URL.
pub fn extract_image_from_html(html: Option<&str>) -> String {
    let Some(html) = html else {
        return String::new();
    };
    let src = IMG_SRC_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    ensure_absolute_http_url(src)
}

/// Pick the best image for a feed entry.
///
/// Candidates are tried in order: `thumbnail`, the enclosure link (or url),
/// the first image in `content`, then the first image in `description`. The
/// first one that is an absolute HTTP(S) URL wins.
pub fn extract_article_image(item: &FeedItem) -> String {
    let enclosure = item.enclosure.as_ref().and_then(|e| e.location());

    [
        ensure_absolute_http_url(item.thumbnail.as_deref()),
        ensure_absolute_http_url(enclosure),
        extract_image_from_html(item.content.as_deref()),
        extract_image_from_html(item.description.as_deref()),
    ]
    .into_iter()
    .find(|candidate| !candidate.is_empty())
    .unwrap_or_default()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Reading time label for `word_count` words: `max(1, round(words / 220))`
/// minutes, e.g. `"3 min read"`.
pub fn estimate_reading_time(word_count: usize) -> String {
    let minutes = (word_count as f64 / WORDS_PER_MINUTE as f64).round() as usize;
    format!("{} min read", minutes.max(1))
}

/// Bound plain text to [`EXCERPT_MAX_CHARS`] characters.
///
/// Text over the limit keeps its first 177 characters and gains a trailing
/// `…`, so a truncated excerpt is always 178 characters long.
pub fn make_excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_MAX_CHARS {
        let kept: String = text.chars().take(EXCERPT_KEEP_CHARS).collect();
        format!("{kept}…")
    } else {
        text.to_string()
    }
}

/// Format a feed timestamp as a short date like `Mar 5, 2024`.
///
/// Accepted inputs are RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and a bare `YYYY-MM-DD`. Zoned timestamps are shown
/// in local time. Anything else yields an empty string.
pub fn format_date(value: &str) -> String {
    match parse_date(value.trim()) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => String::new(),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        // unzoned timestamps are already local wall-clock times
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters and get a `"…(+N bytes)"` suffix
/// telling how much was dropped.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Enclosure;

    #[test]
    fn test_strip_html_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>Hello <b>there</b></p>\n\n  <p>friend</p>"),
            "Hello there friend"
        );
        assert_eq!(strip_html("<img src='https://x/a.png'>hello world"), "hello world");
        assert_eq!(strip_html("Fish &amp; chips"), "Fish & chips");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_ensure_absolute_http_url_accepts_http_and_https() {
        assert_eq!(ensure_absolute_http_url(Some("https://x/a.png")), "https://x/a.png");
        assert_eq!(ensure_absolute_http_url(Some("http://x/a.png")), "http://x/a.png");
        assert_eq!(ensure_absolute_http_url(Some("HTTPS://X/A.PNG")), "HTTPS://X/A.PNG");
    }

    #[test]
    fn test_ensure_absolute_http_url_rejects_everything_else() {
        for candidate in [
            "ftp://x",
            "/relative/path",
            "javascript:alert(1)",
            "//cdn.example.com/a.png",
            " https://x/a.png",
            "",
        ] {
            assert_eq!(ensure_absolute_http_url(Some(candidate)), "", "{candidate:?}");
        }
        assert_eq!(ensure_absolute_http_url(None), "");
    }

    #[test]
    fn test_extract_image_from_html() {
        assert_eq!(
            extract_image_from_html(Some(r#"<p>x</p><IMG alt="a" SRC="https://cdn/a.png">"#)),
            "https://cdn/a.png"
        );
        assert_eq!(extract_image_from_html(Some("<img src='/local.png'>")), "");
        assert_eq!(extract_image_from_html(Some("no images")), "");
        assert_eq!(extract_image_from_html(None), "");
    }

    #[test]
    fn test_extract_article_image_priority() {
        let mut item = FeedItem {
            thumbnail: Some("https://t/thumb.png".into()),
            enclosure: Some(Enclosure {
                link: Some("https://e/enc.png".into()),
                url: None,
            }),
            content: Some("<img src=\"https://c/content.png\">".into()),
            description: Some("<img src=\"https://d/desc.png\">".into()),
            ..FeedItem::default()
        };
        assert_eq!(extract_article_image(&item), "https://t/thumb.png");

        item.thumbnail = Some("not a url".into());
        assert_eq!(extract_article_image(&item), "https://e/enc.png");

        item.enclosure = None;
        assert_eq!(extract_article_image(&item), "https://c/content.png");

        item.content = Some("<img src=\"relative.png\">".into());
        assert_eq!(extract_article_image(&item), "https://d/desc.png");

        item.description = None;
        assert_eq!(extract_article_image(&item), "");
    }

    #[test]
    fn test_estimate_reading_time() {
        assert_eq!(estimate_reading_time(0), "1 min read");
        assert_eq!(estimate_reading_time(109), "1 min read");
        assert_eq!(estimate_reading_time(330), "2 min read");
        assert_eq!(estimate_reading_time(440), "2 min read");
        assert_eq!(estimate_reading_time(1100), "5 min read");
    }

    #[test]
    fn test_reading_time_matches_formula() {
        for words in [0usize, 1, 219, 220, 329, 330, 549, 550, 10_000] {
            let expected = ((words as f64 / 220.0).round() as usize).max(1);
            assert_eq!(estimate_reading_time(words), format!("{expected} min read"));
        }
    }

    #[test]
    fn test_make_excerpt_bounds() {
        let short = "a".repeat(180);
        assert_eq!(make_excerpt(&short), short);

        let long = "b".repeat(181);
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 178);
        assert!(excerpt.ends_with('…'));
        assert!(excerpt.starts_with(&"b".repeat(177)));
    }

    #[test]
    fn test_make_excerpt_counts_characters_not_bytes() {
        let long = "é".repeat(200);
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 178);
    }

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date("2024-03-05 14:02:11"), "Mar 5, 2024");
        assert_eq!(format_date("2024-12-25"), "Dec 25, 2024");
        assert_eq!(format_date("2023-07-14T09:30:00"), "Jul 14, 2023");
        assert!(!format_date("Tue, 05 Mar 2024 12:00:00 +0000").is_empty());
    }

    #[test]
    fn test_format_date_unparseable() {
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("yesterday"), "");
        assert_eq!(format_date("2024-13-40"), "");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
        let long = "a".repeat(500);
        let result = truncate_for_log(&long, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("cards/json");
        let path = nested.to_str().unwrap();
        ensure_writable_dir(path).await.unwrap();
        assert!(nested.is_dir());
    }
}

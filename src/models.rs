//! Data models for the feed payload and the cards rendered from it.
//!
//! This module defines the records that flow through the feed pipeline:
//! - [`FeedPayload`] / [`FeedItem`]: the untrusted JSON returned by the
//!   rss2json proxy
//! - [`ArticleCard`]: a normalized item, ready to be turned into markup
//! - [`NavSection`]: a navigation anchor paired with the section it targets
//!
//! The proxy's schema is not under our control, so every payload field is
//! decoded leniently: a field holding the wrong JSON type is treated as
//! absent instead of failing the whole response.

use ego_tree::NodeId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::utils::{
    count_words, estimate_reading_time, extract_article_image, format_date, make_excerpt,
    strip_html,
};

/// Top-level response of the rss2json proxy.
///
/// ```json
/// { "status": "ok", "feed": { ... }, "items": [ { "title": "...", ... } ] }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FeedPayload {
    /// `"ok"` on success; anything else is a proxy-reported failure.
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    /// Human-readable failure reason, only logged.
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Feed entries. A missing or non-array value yields no items.
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<FeedItem>,
}

impl FeedPayload {
    /// Whether the proxy reported a failure.
    ///
    /// An absent or empty status counts as success, matching how the page
    /// treated a missing field.
    pub fn is_error(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| !status.is_empty() && status != "ok")
    }
}

/// A raw feed entry as supplied by the proxy.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    /// Publication timestamp, e.g. `2024-03-05 14:02:11`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub pubDate: Option<String>,
    /// Summary HTML.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Full post HTML.
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_enclosure")]
    pub enclosure: Option<Enclosure>,
}

/// Media attached to a feed entry. rss2json sends `{}` or `[]` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Enclosure {
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

impl Enclosure {
    /// The enclosure location, preferring `link` over `url`.
    pub fn location(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|link| !link.is_empty())
            .or(self.url.as_deref())
    }
}

/// A normalized article, ready for the card builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCard {
    /// The post title, `"Untitled"` when the feed has none.
    pub title: String,
    /// Link to the post on its origin platform.
    pub link: String,
    /// Short human date such as `Mar 5, 2024`; empty if unparseable.
    pub pub_date: String,
    /// Reading time label such as `4 min read`.
    pub reading_time: String,
    /// Plain text excerpt of at most 180 characters.
    pub excerpt: String,
    /// Absolute HTTP(S) image URL, if any.
    pub image: Option<String>,
}

impl ArticleCard {
    /// Normalize a raw feed entry.
    pub fn from_item(item: &FeedItem) -> Self {
        let text = strip_html(item.description.as_deref().unwrap_or(""));
        let image = extract_article_image(item);

        Self {
            title: item
                .title
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            link: item.link.clone().unwrap_or_default(),
            pub_date: format_date(item.pubDate.as_deref().unwrap_or("")),
            reading_time: estimate_reading_time(count_words(&text)),
            excerpt: make_excerpt(&text),
            image: Some(image).filter(|image| !image.is_empty()),
        }
    }
}

/// A navigation anchor and the page section its `#fragment` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavSection {
    pub anchor: NodeId,
    pub section: NodeId,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_enclosure<'de, D>(deserializer: D) -> Result<Option<Enclosure>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Entries that are not JSON objects (`null`, strings, numbers) carry no
/// post at all and are dropped, so they never become placeholder cards.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<FeedItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    let total = entries.len();
    let items = entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect::<Vec<FeedItem>>();
    if items.len() < total {
        warn!(skipped = total - items.len(), "Dropped feed entries that are not objects");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tolerates_wrong_types() {
        let payload: FeedPayload = serde_json::from_str(
            r#"{
                "status": "ok",
                "items": [
                    { "title": 42, "link": "https://medium.com/@me/post", "thumbnail": null, "enclosure": [] }
                ]
            }"#,
        )
        .unwrap();

        assert!(!payload.is_error());
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].title, None);
        assert_eq!(payload.items[0].link.as_deref(), Some("https://medium.com/@me/post"));
        assert_eq!(payload.items[0].enclosure, None);
    }

    #[test]
    fn test_payload_drops_entries_that_are_not_objects() {
        let payload: FeedPayload = serde_json::from_str(
            r#"{"status":"ok","items":[null, "not an object", 7, {"title":"Kept"}, []]}"#,
        )
        .unwrap();
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].title.as_deref(), Some("Kept"));

        let only_null: FeedPayload = serde_json::from_str(r#"{"status":"ok","items":[null]}"#).unwrap();
        assert!(only_null.items.is_empty());
    }

    #[test]
    fn test_payload_items_missing_or_not_array() {
        let missing: FeedPayload = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(missing.items.is_empty());

        let scalar: FeedPayload = serde_json::from_str(r#"{"status":"ok","items":"nope"}"#).unwrap();
        assert!(scalar.items.is_empty());
    }

    #[test]
    fn test_payload_status_classification() {
        let error: FeedPayload =
            serde_json::from_str(r#"{"status":"error","message":"rate limited"}"#).unwrap();
        assert!(error.is_error());
        assert_eq!(error.message.as_deref(), Some("rate limited"));

        let absent: FeedPayload = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(!absent.is_error());

        let empty: FeedPayload = serde_json::from_str(r#"{"status":""}"#).unwrap();
        assert!(!empty.is_error());
    }

    #[test]
    fn test_enclosure_location_prefers_link() {
        let both = Enclosure {
            link: Some("https://a/link.png".into()),
            url: Some("https://a/url.png".into()),
        };
        assert_eq!(both.location(), Some("https://a/link.png"));

        let url_only = Enclosure {
            link: None,
            url: Some("https://a/url.png".into()),
        };
        assert_eq!(url_only.location(), Some("https://a/url.png"));
    }

    #[test]
    fn test_card_from_item_defaults() {
        let card = ArticleCard::from_item(&FeedItem::default());
        assert_eq!(card.title, "Untitled");
        assert_eq!(card.link, "");
        assert_eq!(card.pub_date, "");
        assert_eq!(card.reading_time, "1 min read");
        assert_eq!(card.excerpt, "");
        assert_eq!(card.image, None);
    }

    #[test]
    fn test_card_from_item_image_in_description() {
        let item = FeedItem {
            title: Some("Shipping Rust".into()),
            link: Some("https://medium.com/@me/shipping-rust".into()),
            pubDate: Some("2024-03-05 14:02:11".into()),
            description: Some("<img src='https://x/a.png'>hello world".into()),
            ..FeedItem::default()
        };

        let card = ArticleCard::from_item(&item);
        assert_eq!(card.title, "Shipping Rust");
        assert_eq!(card.image.as_deref(), Some("https://x/a.png"));
        assert_eq!(card.excerpt, "hello world");
        assert_eq!(card.pub_date, "Mar 5, 2024");
        assert_eq!(card.reading_time, "1 min read");
    }

    #[test]
    fn test_card_from_item_rejects_relative_thumbnail() {
        let item = FeedItem {
            thumbnail: Some("/images/a.png".into()),
            ..FeedItem::default()
        };
        assert_eq!(ArticleCard::from_item(&item).image, None);
    }
}

//! JSON output of the normalized cards.
//!
//! Each feed container with a handle produces one file named after the
//! handle:
//!
//! ```text
//! json_output_dir/
//! └── jane.json      # [ { "title": ..., "link": ..., ... }, ... ]
//! ```
//!
//! Containers that ended empty or in an error state still get a file with an
//! empty array, so consumers can tell "no posts" from "never ran". Handles
//! that reduce to the same file name get numbered files (`jane-2.json`).

use crate::models::ArticleCard;
use crate::utils::ensure_writable_dir;
use std::collections::HashSet;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Writes one `{stem}.json` per feed handle into a single output directory.
///
/// Handles are reduced to file stems (see [`file_stem`]), so distinct handles
/// such as `Jane` and `jane` can map to the same stem. Each stem is claimed
/// once; a later handle that collides gets a numeric suffix (`jane-2.json`)
/// instead of overwriting the earlier file.
#[derive(Debug)]
pub struct CardWriter {
    dir: PathBuf,
    claimed: HashSet<String>,
}

impl CardWriter {
    /// Prepare `json_output_dir`, creating it and checking it is writable.
    pub async fn new(json_output_dir: &str) -> Result<Self, Box<dyn Error>> {
        ensure_writable_dir(json_output_dir).await?;
        Ok(Self {
            dir: PathBuf::from(json_output_dir),
            claimed: HashSet::new(),
        })
    }

    /// Reserve a file stem for `handle` that no earlier handle received.
    pub fn claim_stem(&mut self, handle: &str) -> String {
        let base = file_stem(handle);
        let mut stem = base.clone();
        let mut n = 1;
        while self.claimed.contains(&stem) {
            n += 1;
            stem = format!("{base}-{n}");
        }
        if n > 1 {
            warn!(%handle, %stem, "File name already used by another handle; writing under a suffixed name");
        }
        self.claimed.insert(stem.clone());
        stem
    }

    /// Write `cards` for `handle`.
    ///
    /// # Returns
    ///
    /// The path of the written file.
    #[instrument(level = "info", skip_all, fields(%handle, count = cards.len()))]
    pub async fn write(&mut self, handle: &str, cards: &[ArticleCard]) -> Result<PathBuf, Box<dyn Error>> {
        let json = serde_json::to_string_pretty(cards)?;
        let stem = self.claim_stem(handle);
        let path = self.dir.join(format!("{stem}.json"));

        info!(path = %path.display(), "Writing JSON");
        fs::write(&path, json).await?;
        info!(path = %path.display(), "Wrote card JSON file");
        Ok(path)
    }
}

/// Lowercase `handle`, keeping ASCII alphanumerics, `-`, `_` and `.`; every
/// other character becomes `-`. Leading dots are dropped.
pub fn file_stem(handle: &str) -> String {
    let stem = handle
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "feed".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Jane"), "jane");
        assert_eq!(file_stem("jane.doe_99"), "jane.doe_99");
        assert_eq!(file_stem("../etc/passwd"), "-etc-passwd");
        assert_eq!(file_stem("a b/c"), "a-b-c");
        assert_eq!(file_stem(""), "feed");
        assert_eq!(file_stem("..."), "feed");
    }

    fn card(title: &str) -> ArticleCard {
        ArticleCard {
            title: title.to_string(),
            link: "https://medium.com/@jane/post".to_string(),
            pub_date: "Mar 5, 2024".to_string(),
            reading_time: "2 min read".to_string(),
            excerpt: "Hello".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_write_cards_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("json");
        let cards = vec![card("Post")];

        let mut writer = CardWriter::new(dir.to_str().unwrap()).await.unwrap();
        let path = writer.write("Jane", &cards).await.unwrap();
        assert!(path.ends_with("jane.json"));

        let parsed: Vec<ArticleCard> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, cards);
    }

    #[tokio::test]
    async fn test_colliding_handles_do_not_overwrite_each_other() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = CardWriter::new(tmp.path().to_str().unwrap()).await.unwrap();

        let first = writer.write("Jane", &[card("From Jane")]).await.unwrap();
        let second = writer.write("jane", &[card("From jane")]).await.unwrap();
        let third = writer.write("a b", &[]).await.unwrap();
        let fourth = writer.write("a-b", &[]).await.unwrap();

        assert!(first.ends_with("jane.json"));
        assert!(second.ends_with("jane-2.json"));
        assert!(third.ends_with("a-b.json"));
        assert!(fourth.ends_with("a-b-2.json"));

        let kept: Vec<ArticleCard> =
            serde_json::from_str(&std::fs::read_to_string(&first).unwrap()).unwrap();
        assert_eq!(kept[0].title, "From Jane");
    }

    #[test]
    fn test_claim_stem_skips_suffixes_already_taken() {
        let mut writer = CardWriter {
            dir: PathBuf::from("unused"),
            claimed: HashSet::new(),
        };
        assert_eq!(writer.claim_stem("jane-2"), "jane-2");
        assert_eq!(writer.claim_stem("jane"), "jane");
        assert_eq!(writer.claim_stem("JANE"), "jane-3");
    }
}

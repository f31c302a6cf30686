//! Core data models for wp2git
//!
//! A [`Revision`] is one historical version of an article: its metadata plus
//! the full wikitext at that point in history. Revisions are immutable once
//! fetched and are always handled in ascending chronological order.

use chrono::{DateTime, Utc};

/// One historical version of an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// MediaWiki revision id (`oldid` in permalinks).
    pub id: u64,
    /// Editor name. Empty if the API suppressed it (`userhidden`).
    pub author: String,
    /// Minor-edit flag.
    pub minor: bool,
    /// Edit timestamp (UTC).
    pub timestamp: DateTime<Utc>,
    /// Edit comment. Empty if absent or suppressed.
    pub comment: String,
    /// Change tags attached by the wiki.
    pub tags: Vec<String>,
    /// Full article wikitext at this revision. Empty if suppressed.
    pub text: String,
}

impl Revision {
    /// Editor name with a stable fallback for suppressed or blank names.
    pub fn author_or_anonymous(&self) -> &str {
        if self.author.trim().is_empty() {
            "anonymous"
        } else {
            self.author.as_str()
        }
    }
}

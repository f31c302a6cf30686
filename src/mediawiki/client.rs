//! Synchronous MediaWiki API client
//!
//! Pages through `action=query&prop=revisions` until the continuation
//! token runs out. Uses ureq (sync HTTP) — no async runtime needed.

use super::{ApiError, ApiResult, SiteConfig};
use crate::models::Revision;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = concat!(
    "wp2git/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/wp2git/wp2git)"
);

/// Revision properties we request for every revision.
const RVPROP: &str = "ids|flags|timestamp|user|comment|content|tags";

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(std::time::Duration::from_secs(60)))
        .build()
        .new_agent()
}

/// MediaWiki API client for one site — sync HTTP via ureq.
pub struct ApiClient {
    site: SiteConfig,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(site: SiteConfig) -> Self {
        Self {
            site,
            agent: make_agent(),
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Fetch the article's complete revision history, oldest first.
    ///
    /// Requests `rvdir=newer` so pages already arrive in ascending
    /// chronological order; revisions sharing a timestamp keep the API's
    /// order. Fails with [`ApiError::PageMissing`] if the article does not
    /// exist, before any output is created.
    pub fn fetch_all_revisions(&self, title: &str) -> ApiResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let response = self.query_revisions(title, continue_token.as_deref())?;
            let (page, next) = parse_response(response, title, &self.site.host)?;
            debug!(
                page_revisions = page.len(),
                total = revisions.len() + page.len(),
                "fetched revision page"
            );
            revisions.extend(page);

            continue_token = next;
            if continue_token.is_none() {
                break;
            }
        }

        Ok(revisions)
    }

    fn query_revisions(
        &self,
        title: &str,
        continue_token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let url = self.site.api_url();
        debug!(%url, title, ?continue_token, "querying revisions");

        let mut req = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .query("action", "query")
            .query("format", "json")
            .query("formatversion", "2")
            .query("titles", title)
            .query("prop", "revisions")
            .query("rvprop", RVPROP)
            .query("rvslots", "main")
            .query("rvlimit", "max")
            .query("rvdir", "newer");
        if let Some(token) = continue_token {
            req = req.query("rvcontinue", token);
        }

        let response = req.call()?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(ApiError::Http { status, message });
        }

        response
            .into_body()
            .read_json()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Extract the revisions and continuation token from one API response.
fn parse_response(
    response: ApiResponse,
    title: &str,
    host: &str,
) -> ApiResult<(Vec<Revision>, Option<String>)> {
    if let Some(error) = response.error {
        return Err(ApiError::Api {
            code: error.code,
            info: error.info,
        });
    }

    let pages = response.query.map(|q| q.pages).unwrap_or_default();
    let Some(page) = pages.into_iter().next() else {
        return Err(ApiError::PageMissing {
            title: title.to_string(),
            host: host.to_string(),
        });
    };
    if page.missing || page.invalid {
        return Err(ApiError::PageMissing {
            title: title.to_string(),
            host: host.to_string(),
        });
    }

    let revisions = page.revisions.into_iter().map(Revision::from).collect();
    let token = response.continuation.and_then(|c| c.rvcontinue);
    Ok((revisions, token))
}

// MediaWiki API types (formatversion=2)

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(rename = "continue")]
    continuation: Option<Continuation>,
    query: Option<QueryBody>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Continuation {
    rvcontinue: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: String,
    info: String,
}

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Deserialize)]
struct PageEntry {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    revisions: Vec<RevisionEntry>,
}

#[derive(Deserialize)]
struct RevisionEntry {
    revid: u64,
    #[serde(default)]
    minor: bool,
    // Absent when the wiki suppressed the field (userhidden/commenthidden).
    user: Option<String>,
    timestamp: DateTime<Utc>,
    comment: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    slots: Option<Slots>,
}

#[derive(Deserialize)]
struct Slots {
    main: SlotContent,
}

#[derive(Deserialize)]
struct SlotContent {
    content: Option<String>,
}

impl From<RevisionEntry> for Revision {
    fn from(entry: RevisionEntry) -> Self {
        Revision {
            id: entry.revid,
            author: entry.user.unwrap_or_default(),
            minor: entry.minor,
            timestamp: entry.timestamp,
            comment: entry.comment.unwrap_or_default(),
            tags: entry.tags,
            text: entry
                .slots
                .and_then(|s| s.main.content)
                .unwrap_or_default(),
        }
    }
}

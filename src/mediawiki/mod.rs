//! MediaWiki API access
//!
//! This module owns site selection (which wiki, which URL prefix) and the
//! synchronous API client used to page through an article's revision
//! history. Wire format details stay inside [`client`]; the rest of the
//! crate only sees [`SiteConfig`] and [`crate::models::Revision`].

mod client;

pub use client::ApiClient;

use thiserror::Error;

/// Errors that can occur while talking to a MediaWiki site
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] ureq::Error),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("page '{title}' does not exist on {host}")]
    PageMissing { title: String, host: String },

    #[error("API error: {code} - {info}")]
    Api { code: String, info: String },

    #[error("failed to parse API response: {0}")]
    Parse(String),

    #[error("invalid site configuration: {0}")]
    Config(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Which wiki we talk to, resolved once in the CLI layer and passed
/// explicitly everywhere it is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub scheme: String,
    pub host: String,
    /// URL prefix of the wiki's script directory, with trailing slash
    /// (`/w/` on Wikimedia sites).
    pub base_path: String,
}

impl SiteConfig {
    /// Site for a Wikipedia language edition, e.g. `de` ->
    /// `https://de.wikipedia.org/w/`.
    pub fn for_language(lang: &str) -> Self {
        Self {
            scheme: "https".to_string(),
            host: format!("{}.wikipedia.org", lang),
            base_path: "/w/".to_string(),
        }
    }

    /// Parse a `--site` argument.
    ///
    /// Accepts `host`, `host/base/`, or `scheme://host/base`. The scheme
    /// defaults to `https`, the base path to `/w/`, and a missing trailing
    /// slash is added.
    pub fn parse_site(spec: &str) -> ApiResult<Self> {
        let (scheme, rest) = match spec.split_once("://") {
            Some((s, r)) => (s, r),
            None => ("https", spec),
        };
        if scheme != "http" && scheme != "https" {
            return Err(ApiError::Config(format!(
                "unsupported scheme '{}' in site '{}'",
                scheme, spec
            )));
        }

        let (host, mut base_path) = match rest.split_once('/') {
            Some((h, p)) => (h, format!("/{}", p)),
            None => (rest, "/w/".to_string()),
        };
        if host.is_empty() {
            return Err(ApiError::Config(format!("no host in site '{}'", spec)));
        }
        if !base_path.ends_with('/') {
            base_path.push('/');
        }

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            base_path,
        })
    }

    /// `api.php` endpoint URL.
    pub fn api_url(&self) -> String {
        format!("{}://{}{}api.php", self.scheme, self.host, self.base_path)
    }

    /// `index.php` URL, base for permalinks.
    pub fn index_url(&self) -> String {
        format!("{}://{}{}index.php", self.scheme, self.host, self.base_path)
    }

    /// Permalink to a specific revision.
    pub fn revision_url(&self, oldid: u64) -> String {
        format!("{}?oldid={}", self.index_url(), oldid)
    }

    /// Permalink to an editor's user page. `user` should already have
    /// spaces replaced with underscores.
    pub fn user_url(&self, user: &str) -> String {
        format!("{}?title=User:{}", self.index_url(), user)
    }
}

/// Language code from the locale environment (`LC_ALL`, then `LANG`),
/// e.g. `en_US.UTF-8` -> `en`. `None` when the locale yields nothing usable.
pub fn locale_language() -> Option<String> {
    for var in ["LC_ALL", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            let code: String = value
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect();
            if code.len() >= 2 {
                return Some(code.to_ascii_lowercase());
            }
        }
    }
    None
}

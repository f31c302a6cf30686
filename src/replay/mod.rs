//! Revision replayer
//!
//! Turns an ordered list of remote revisions into local commits: overwrite
//! the working file, stage it, commit with the revision's mapped identity,
//! date, and message. Resumption matches by revision id (parsed back out of
//! the `?oldid=` permalink in the HEAD commit message), not by position, so
//! a remote history rewritten between runs fails loudly instead of
//! diverging silently.

use crate::mediawiki::SiteConfig;
use crate::models::Revision;
use crate::repo::{GitRepo, RepoError};
use anyhow::{Context, Result};
use console::style;
use tracing::debug;

/// Commit message first line for revisions with an empty edit comment.
pub const NO_COMMENT_PLACEHOLDER: &str = "(no edit comment)";

/// Characters unusable in filenames on at least one supported platform.
const FORBIDDEN_FILENAME_CHARS: &[char] = &['?', '*', '<', '>', '|', ':', '\\', '/', '"'];

/// Article name made safe for use as a directory or file name.
pub fn sanitize_title(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FORBIDDEN_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Name of the working file holding the article text, `<title>.mw`.
pub fn working_file_name(article: &str) -> String {
    format!("{}.mw", sanitize_title(article))
}

/// Author name and email for a revision's commit identity.
///
/// Git idents must not contain `<`, `>`, or newlines; those and control
/// bytes are stripped rather than failing the run. The email is
/// `<name with spaces as underscores>@<site host>`.
pub fn author_ident(revision: &Revision, site: &SiteConfig) -> (String, String) {
    let name: String = revision
        .author_or_anonymous()
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect();
    let name = if name.trim().is_empty() {
        "anonymous".to_string()
    } else {
        name.trim().to_string()
    };
    let email = format!("{}@{}", name.replace(' ', "_"), site.host);
    (name, email)
}

/// Full commit message for a revision: comment (or placeholder), then
/// permalink, editor, and tag metadata.
pub fn commit_message(revision: &Revision, site: &SiteConfig) -> String {
    let summary = if revision.comment.is_empty() {
        NO_COMMENT_PLACEHOLDER
    } else {
        revision.comment.as_str()
    };

    let (name, _) = author_ident(revision, site);
    let mut message = format!(
        "{}\n\nURL: {}\nEditor: {}",
        summary,
        site.revision_url(revision.id),
        site.user_url(&name.replace(' ', "_")),
    );

    let mut tags: Vec<&str> = Vec::new();
    if revision.minor {
        tags.push("minor");
    }
    tags.extend(revision.tags.iter().map(String::as_str));
    if !tags.is_empty() {
        message.push_str("\nTags: ");
        message.push_str(&tags.join(", "));
    }

    message
}

/// Revision id recovered from a commit message's `URL:` permalink line.
///
/// Only that line is authoritative: the comment line can itself mention a
/// permalink (revert comments often do). The comment might even start with
/// `URL: `, so the last matching line wins — the metadata block sits at the
/// end of the message.
pub fn parse_oldid(message: &str) -> Option<u64> {
    let line = message.lines().filter(|l| l.starts_with("URL: ")).last()?;
    let start = line.find("?oldid=")? + "?oldid=".len();
    let digits: String = line[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Drives the replay of fetched revisions into the output repository.
pub struct Replayer {
    site: SiteConfig,
}

impl Replayer {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    /// Index of the first revision that still needs a commit.
    ///
    /// 0 for a fresh repository. For a repository with commits, HEAD's
    /// message must carry an `?oldid=` matching one of `revisions`;
    /// anything else means the directory holds unrelated (or diverged)
    /// history and the run aborts.
    pub fn resume_index(&self, repo: &GitRepo, revisions: &[Revision]) -> Result<usize> {
        let Some(message) = repo.head_message()? else {
            return Ok(0);
        };

        let not_resumable = || RepoError::AlreadyExists {
            path: repo.root().to_path_buf(),
        };

        let head_id = parse_oldid(&message).ok_or_else(not_resumable)?;
        let position = revisions
            .iter()
            .position(|r| r.id == head_id)
            .ok_or_else(not_resumable)
            .with_context(|| {
                format!(
                    "HEAD is at revision {} which is not in the fetched history",
                    head_id
                )
            })?;

        debug!(head_id, resume_from = position + 1, "resuming prior run");
        Ok(position + 1)
    }

    /// Replay all revisions not yet committed. Returns the number of
    /// commits created by this run.
    pub fn replay(
        &self,
        revisions: &[Revision],
        repo: &GitRepo,
        working_file: &str,
    ) -> Result<usize> {
        let start = self.resume_index(repo, revisions)?;
        if start > 0 {
            eprintln!(
                "{} resuming: {} of {} revisions already committed",
                style(">>").dim(),
                start,
                revisions.len()
            );
        }

        let mut created = 0usize;
        for (index, revision) in revisions.iter().enumerate().skip(start) {
            self.commit_revision(revision, repo, working_file)
                .with_context(|| {
                    format!(
                        "failed at revision {} ({} of {}, {} commits created this run)",
                        revision.id,
                        index + 1,
                        revisions.len(),
                        created
                    )
                })?;
            created += 1;
        }

        Ok(created)
    }

    fn commit_revision(
        &self,
        revision: &Revision,
        repo: &GitRepo,
        working_file: &str,
    ) -> Result<()> {
        eprintln!(
            "{} {}revision {} by {} at {}: {}",
            style(">>").dim(),
            if revision.minor { "minor " } else { "" },
            revision.id,
            style(revision.author_or_anonymous()).cyan(),
            revision.timestamp.format("%Y-%m-%d %H:%M:%S"),
            if revision.comment.is_empty() {
                NO_COMMENT_PLACEHOLDER
            } else {
                revision.comment.as_str()
            },
        );

        std::fs::write(repo.root().join(working_file), &revision.text)
            .with_context(|| format!("writing {}", working_file))?;
        repo.stage(working_file)?;

        let (name, email) = author_ident(revision, &self.site);
        let message = commit_message(revision, &self.site);
        repo.commit(&message, &name, &email, revision.timestamp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn revision(id: u64, author: &str, comment: &str, text: &str) -> Revision {
        Revision {
            id,
            author: author.to_string(),
            minor: false,
            timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            comment: comment.to_string(),
            tags: vec![],
            text: text.to_string(),
        }
    }

    fn site() -> SiteConfig {
        SiteConfig::for_language("en")
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("AC/DC"), "AC_DC");
        assert_eq!(sanitize_title("What?"), "What_");
        assert_eq!(sanitize_title("Plain title"), "Plain title");
        assert_eq!(working_file_name("AC/DC"), "AC_DC.mw");
    }

    #[test]
    fn test_commit_message_placeholder() {
        let rev = revision(7, "Alice", "", "text");
        let message = commit_message(&rev, &site());
        assert!(message.starts_with(NO_COMMENT_PLACEHOLDER));
        assert!(message.contains("?oldid=7"));
    }

    #[test]
    fn test_commit_message_tags() {
        let mut rev = revision(7, "Alice", "tweak", "text");
        rev.minor = true;
        rev.tags = vec!["mobile edit".to_string()];
        let message = commit_message(&rev, &site());
        assert!(message.starts_with("tweak"));
        assert!(message.contains("Tags: minor, mobile edit"));
        assert!(message.contains("Editor: https://en.wikipedia.org/w/index.php?title=User:Alice"));
    }

    #[test]
    fn test_parse_oldid_roundtrip() {
        let rev = revision(123456, "Alice", "fix", "text");
        let message = commit_message(&rev, &site());
        assert_eq!(parse_oldid(&message), Some(123456));
        assert_eq!(parse_oldid("no permalink here"), None);
    }

    #[test]
    fn test_parse_oldid_ignores_permalink_in_comment() {
        let rev = revision(102, "Alice", "revert to ?oldid=101 version", "text");
        let message = commit_message(&rev, &site());
        assert_eq!(parse_oldid(&message), Some(102));

        let rev = revision(103, "Alice", "URL: see ?oldid=99", "text");
        let message = commit_message(&rev, &site());
        assert_eq!(parse_oldid(&message), Some(103));
    }

    #[test]
    fn test_author_ident_mapping() {
        let rev = revision(1, "Jean Dupont", "c", "t");
        let (name, email) = author_ident(&rev, &site());
        assert_eq!(name, "Jean Dupont");
        assert_eq!(email, "Jean_Dupont@en.wikipedia.org");
    }

    #[test]
    fn test_author_ident_strips_unsafe_chars() {
        let rev = revision(1, "Eve <evil>\n", "c", "t");
        let (name, email) = author_ident(&rev, &site());
        assert_eq!(name, "Eve evil");
        assert_eq!(email, "Eve_evil@en.wikipedia.org");
    }

    #[test]
    fn test_author_ident_anonymous_fallback() {
        let rev = revision(1, "", "c", "t");
        let (name, email) = author_ident(&rev, &site());
        assert_eq!(name, "anonymous");
        assert_eq!(email, "anonymous@en.wikipedia.org");
    }
}

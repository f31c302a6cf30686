//! Git collaborator
//!
//! All version-control work goes through the `git` executable as a
//! subprocess; wp2git never touches `.git` internals itself. Commands are
//! serialized — each commit depends on the working-tree state left by the
//! previous one.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors from repository setup or git invocation
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("output path {path} already exists and is not a resumable repository")]
    AlreadyExists { path: PathBuf },

    #[error("git command failed (git {command}, exit code {exit_code}): {stderr}")]
    Subprocess {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("unexpected git output: {0}")]
    UnexpectedOutput(String),

    #[error("git is not installed or not in PATH")]
    GitNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Handle to the output repository.
#[derive(Debug)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Create the output repository, or reopen an existing one for
    /// resumption.
    ///
    /// A missing or empty directory is initialized with `git init`. A
    /// directory that already contains `.git` is reopened as-is (whether its
    /// history actually matches the article is the replayer's check). Any
    /// other existing path fails with [`RepoError::AlreadyExists`].
    pub fn create(path: &Path) -> RepoResult<Self> {
        if path.exists() {
            if path.join(".git").is_dir() {
                debug!(path = %path.display(), "reopening existing repository");
                return Ok(Self {
                    root: path.to_path_buf(),
                });
            }
            let empty_dir = path.is_dir() && path.read_dir()?.next().is_none();
            if !empty_dir {
                return Err(RepoError::AlreadyExists {
                    path: path.to_path_buf(),
                });
            }
        } else {
            std::fs::create_dir_all(path)?;
        }

        let repo = Self {
            root: path.to_path_buf(),
        };
        repo.run(&["init", "--quiet"], &[])?;
        debug!(path = %path.display(), "initialized repository");
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the repository has at least one commit.
    pub fn has_commits(&self) -> RepoResult<bool> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .current_dir(&self.root)
            .output()
            .map_err(map_spawn_error)?;
        Ok(output.status.success())
    }

    /// Number of commits reachable from HEAD (0 for a fresh repository).
    pub fn commit_count(&self) -> RepoResult<usize> {
        if !self.has_commits()? {
            return Ok(0);
        }
        let out = self.run(&["rev-list", "--count", "HEAD"], &[])?;
        out.trim()
            .parse()
            .map_err(|_| RepoError::UnexpectedOutput(out))
    }

    /// Full message of the HEAD commit, or `None` for a fresh repository.
    pub fn head_message(&self) -> RepoResult<Option<String>> {
        if !self.has_commits()? {
            return Ok(None);
        }
        self.run(&["log", "-1", "--format=%B"], &[]).map(Some)
    }

    /// Stage one file.
    pub fn stage(&self, file: &str) -> RepoResult<()> {
        self.run(&["add", "--", file], &[])?;
        Ok(())
    }

    /// Create a commit with the given identity, date, and message.
    ///
    /// Identity and date are passed through the `GIT_AUTHOR_*` and
    /// `GIT_COMMITTER_*` environment, so no git config is required.
    /// `--allow-empty` keeps the one-commit-per-revision invariant even when
    /// consecutive revisions carry identical text (reverts).
    pub fn commit(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
        timestamp: DateTime<Utc>,
    ) -> RepoResult<()> {
        let date = format!("{} +0000", timestamp.timestamp());
        let envs = [
            ("GIT_AUTHOR_NAME", author_name),
            ("GIT_AUTHOR_EMAIL", author_email),
            ("GIT_AUTHOR_DATE", date.as_str()),
            ("GIT_COMMITTER_NAME", author_name),
            ("GIT_COMMITTER_EMAIL", author_email),
            ("GIT_COMMITTER_DATE", date.as_str()),
        ];
        self.run(
            &["commit", "--quiet", "--allow-empty", "-m", message],
            &envs,
        )?;
        Ok(())
    }

    /// Run a git command in the repository and capture stdout.
    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> RepoResult<String> {
        debug!(?args, "running git");
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.root);
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(map_spawn_error)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(RepoError::Subprocess {
                command: args.join(" "),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

fn map_spawn_error(e: std::io::Error) -> RepoError {
    if e.kind() == std::io::ErrorKind::NotFound {
        RepoError::GitNotFound
    } else {
        RepoError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_create_rejects_nonempty_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stray.txt"), "x").unwrap();
        let err = GitRepo::create(dir.path()).unwrap_err();
        assert!(matches!(err, RepoError::AlreadyExists { .. }));
    }

    #[test]
    fn test_create_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();
        let err = GitRepo::create(&file).unwrap_err();
        assert!(matches!(err, RepoError::AlreadyExists { .. }));
    }

    #[test]
    fn test_init_stage_commit_roundtrip() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo");
        let repo = GitRepo::create(&path).unwrap();
        assert_eq!(repo.commit_count().unwrap(), 0);
        assert!(repo.head_message().unwrap().is_none());

        std::fs::write(path.join("a.mw"), "hello").unwrap();
        repo.stage("a.mw").unwrap();
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        repo.commit("first\n\nURL: x?oldid=1", "Alice", "Alice@example.org", ts)
            .unwrap();

        assert_eq!(repo.commit_count().unwrap(), 1);
        let message = repo.head_message().unwrap().unwrap();
        assert!(message.starts_with("first"));
        assert!(message.contains("oldid=1"));
    }

    #[test]
    fn test_reopen_existing_repo() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo");
        GitRepo::create(&path).unwrap();
        // Second create on the same path reopens instead of failing
        let repo = GitRepo::create(&path).unwrap();
        assert_eq!(repo.commit_count().unwrap(), 0);
    }
}

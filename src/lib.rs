//! wp2git library: MediaWiki revision fetching and git replay.
//!
//! The binary in `main.rs` is a thin wrapper around [`cli::run`]. Everything
//! else lives here so integration tests can drive the replay pipeline with
//! synthetic revisions instead of live API traffic.

pub mod cli;
pub mod mediawiki;
pub mod models;
pub mod replay;
pub mod repo;

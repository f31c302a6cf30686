//! CLI definition and the top-level run function

use crate::mediawiki::{self, ApiClient, SiteConfig};
use crate::replay::{working_file_name, Replayer};
use crate::repo::GitRepo;
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use tracing::info;

/// wp2git - Mirror a MediaWiki article's edit history into git
#[derive(Parser, Debug)]
#[command(name = "wp2git")]
#[command(
    version,
    about = "Create a git repository with the full edit history of a Wikipedia article",
    long_about = "wp2git fetches every revision of a MediaWiki article and replays them as \
git commits, one per revision, preserving author, timestamp, and edit comment.\n\n\
Interrupted runs are resumable: point wp2git at the same output directory and \
it continues from the last committed revision.",
    after_help = "\
Examples:
  wp2git 'Rust (programming language)'      Mirror an article from <locale>.wikipedia.org
  wp2git --lang de Rostock                  Use the German Wikipedia
  wp2git --site commons.wikimedia.org Atom  Any MediaWiki site
  wp2git -o atom-history Atom               Choose the output directory"
)]
pub struct Cli {
    /// Article to mirror
    pub article_name: String,

    /// Output directory (default: the article name, sanitized)
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Wikipedia language code (default: from locale, else "en")
    #[arg(long, conflicts_with = "site")]
    pub lang: Option<String>,

    /// Alternate MediaWiki site (e.g. commons.wikimedia.org)
    #[arg(long)]
    pub site: Option<String>,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let site = resolve_site(&cli)?;
    info!(host = %site.host, article = %cli.article_name, "fetching revision history");
    eprintln!(
        "Fetching history of '{}' from {}...",
        style(&cli.article_name).bold(),
        site.host
    );

    // Fetch before touching the filesystem: a missing article must not
    // leave an output directory behind.
    let client = ApiClient::new(site.clone());
    let revisions = client
        .fetch_all_revisions(&cli.article_name)
        .with_context(|| format!("failed to fetch history of '{}'", cli.article_name))?;
    eprintln!("Fetched {} revisions.", revisions.len());

    let out_dir = cli
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(crate::replay::sanitize_title(&cli.article_name)));
    let repo = GitRepo::create(&out_dir)
        .with_context(|| format!("cannot use output directory {}", out_dir.display()))?;

    let replayer = Replayer::new(site);
    let working_file = working_file_name(&cli.article_name);
    let created = replayer
        .replay(&revisions, &repo, &working_file)
        .with_context(|| format!("replay of '{}' aborted", cli.article_name))?;

    let skipped = revisions.len() - created;
    if skipped > 0 {
        println!(
            "✅ {} commits created ({} already present) in {}",
            created,
            skipped,
            out_dir.display()
        );
    } else {
        println!("✅ {} commits created in {}", created, out_dir.display());
    }
    Ok(())
}

/// Resolve which wiki to talk to from --site, --lang, or the locale.
fn resolve_site(cli: &Cli) -> Result<SiteConfig> {
    if let Some(spec) = &cli.site {
        return SiteConfig::parse_site(spec).context("invalid --site");
    }
    let lang = cli
        .lang
        .clone()
        .or_else(mediawiki::locale_language)
        .unwrap_or_else(|| "en".to_string());
    Ok(SiteConfig::for_language(&lang))
}

//! CLI Commands

pub mod abstracts;
pub mod author;
pub mod entitlement;
pub mod init;
pub mod search;

pub use abstracts::AbstractCommand;
pub use author::AuthorCommand;
pub use entitlement::EntitlementCommand;
pub use init::InitCommand;
pub use search::SearchCommand;

use clap::Args;
use console::style;
use engine::{Refresh, Session};
use shared::InitOptions;
use std::path::PathBuf;

/// Flags accepted by every command
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API key overriding the configured ones (repeatable)
    #[arg(
        long = "key",
        global = true,
        env = "BIBLIO_API_KEY",
        value_delimiter = ','
    )]
    pub keys: Vec<String>,

    /// Debug logging and request statistics
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load the configuration and open a session
    pub fn session(&self) -> anyhow::Result<Session> {
        let options = InitOptions {
            config_path: self.config.clone(),
            keys: (!self.keys.is_empty()).then(|| self.keys.clone()),
            inst_tokens: None,
        };
        let session = Session::init(options)?;
        tracing::debug!("Using configuration at {}", session.config().path().display());
        Ok(session)
    }

    /// Print request statistics when running verbosely
    pub fn report(&self, session: &Session) {
        if !self.verbose {
            return;
        }
        let stats = session.client().stats();
        eprintln!(
            "{} {} requests, {} failed, {} quota exceeded, {} key rotations, {} retries",
            style("stats:").dim(),
            stats.total_entries,
            stats.failure_count,
            stats.quota_exceeded_count,
            stats.key_rotation_count,
            stats.retry_count,
        );
        if let Some(header) = session.client().last_rate_limit() {
            if let Some(remaining) = header.remaining {
                eprintln!("{} {remaining} requests left", style("quota:").dim());
            }
        }
    }
}

/// When to bypass the cache
#[derive(Debug, Clone, Default, Args)]
pub struct RefreshArgs {
    /// Download again when the cached file is older than DAYS
    #[arg(long, value_name = "DAYS", conflicts_with = "force")]
    pub refresh: Option<u32>,

    /// Always download
    #[arg(long)]
    pub force: bool,
}

impl RefreshArgs {
    pub fn refresh(&self) -> Refresh {
        match (self.force, self.refresh) {
            (true, _) => Refresh::Always,
            (false, Some(days)) => Refresh::OlderThanDays(days),
            (false, None) => Refresh::Never,
        }
    }
}

/// `label: value` with the label highlighted, skipping missing values
pub(crate) fn field(label: &str, value: Option<impl std::fmt::Display>) {
    if let Some(value) = value {
        println!("{} {value}", style(format!("{label}:")).bold());
    }
}

//! biblio CLI - Command-line access to Scopus and ScienceDirect
//!
//! Usage:
//!   biblio init                          - Create the configuration file
//!   biblio abstract <id> [--format ris]  - Retrieve a document
//!   biblio author <id> [--coauthors]     - Retrieve an author profile
//!   biblio search scopus <query>         - Search documents, authors or affiliations
//!   biblio entitlement <id>              - Check access to a ScienceDirect article

use clap::{Parser, Subcommand};
use cli::commands::{
    AbstractCommand, AuthorCommand, EntitlementCommand, GlobalArgs, InitCommand, SearchCommand,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "biblio")]
#[command(about = "biblio - Cached access to the Scopus and ScienceDirect APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration file
    Init(InitCommand),
    /// Retrieve a document through the Abstract Retrieval API
    Abstract(AbstractCommand),
    /// Retrieve an author profile
    Author(AuthorCommand),
    /// Query one of the search APIs
    Search(SearchCommand),
    /// Check entitlement to a ScienceDirect article
    Entitlement(EntitlementCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Init(cmd) => cmd.run(&cli.global),
        Commands::Abstract(cmd) => cmd.run(&cli.global).await,
        Commands::Author(cmd) => cmd.run(&cli.global).await,
        Commands::Search(cmd) => cmd.run(&cli.global).await,
        Commands::Entitlement(cmd) => cmd.run(&cli.global).await,
    }
}

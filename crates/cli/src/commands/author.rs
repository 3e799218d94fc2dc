//! biblio author command

use super::{field, GlobalArgs, RefreshArgs};
use clap::Args;
use console::style;
use scopus::{AuthorOptions, AuthorRetrieval, Coauthor};
use shared::View;

#[derive(Debug, Args)]
pub struct AuthorCommand {
    /// Scopus author ID, optionally as full EID
    pub id: String,

    /// API view, e.g. LIGHT, STANDARD, ENHANCED or METRICS
    #[arg(long)]
    pub view: Option<String>,

    /// Also list the coauthors
    #[arg(long)]
    pub coauthors: bool,

    #[command(flatten)]
    pub refresh: RefreshArgs,
}

impl AuthorCommand {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let mut options = AuthorOptions {
            refresh: self.refresh.refresh(),
            ..Default::default()
        };
        if let Some(view) = &self.view {
            options.view = view.parse::<View>()?;
        }

        let session = global.session()?;
        let author = AuthorRetrieval::fetch(&session, &self.id, options).await?;
        println!("{author}");
        if let Some(alias) = author.alias() {
            field("merged profiles", Some(alias.join(", ")));
        }

        if self.coauthors {
            let coauthors = author.get_coauthors(&session).await?.unwrap_or_default();
            println!("\n{} ({})", style("Coauthors").bold(), coauthors.len());
            for coauthor in &coauthors {
                println!("  {}", coauthor_line(coauthor));
            }
        }

        global.report(&session);
        Ok(())
    }
}

fn coauthor_line(coauthor: &Coauthor) -> String {
    let name = match (&coauthor.surname, &coauthor.given_name) {
        (Some(surname), Some(given)) => format!("{surname}, {given}"),
        (Some(surname), None) => surname.clone(),
        (None, _) => "?".to_string(),
    };
    let id = coauthor.id.map(|id| id.to_string()).unwrap_or_default();
    match &coauthor.name {
        Some(affiliation) => format!("{name} [{id}] {affiliation}"),
        None => format!("{name} [{id}]"),
    }
}

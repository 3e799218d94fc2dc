//! biblio entitlement command

use super::{field, GlobalArgs, RefreshArgs};
use clap::Args;
use sciencedirect::{ArticleEntitlement, EntitlementOptions};
use shared::IdType;

#[derive(Debug, Args)]
pub struct EntitlementCommand {
    /// DOI, PII, EID, Scopus ID, PubMed ID or PUI of the document
    pub id: String,

    /// Identifier type; detected from the id when omitted
    #[arg(long)]
    pub id_type: Option<String>,

    #[command(flatten)]
    pub refresh: RefreshArgs,
}

impl EntitlementCommand {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let options = EntitlementOptions {
            id_type: self.id_type.as_deref().map(str::parse::<IdType>).transpose()?,
            refresh: self.refresh.refresh(),
            ..Default::default()
        };
        let session = global.session()?;
        let entitlement = ArticleEntitlement::fetch(&session, &self.id, options).await?;

        println!("{entitlement}");
        field("entitled", entitlement.entitled());
        field("link", entitlement.link());
        field("pii", entitlement.pii());

        global.report(&session);
        Ok(())
    }
}

//! biblio abstract command

use super::{GlobalArgs, RefreshArgs};
use clap::{Args, ValueEnum};
use scopus::{AbstractOptions, AbstractRetrieval};
use shared::{IdType, View};

/// How to print a retrieved abstract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Bibtex,
    Ris,
    Latex,
    Html,
    Json,
}

#[derive(Debug, Args)]
pub struct AbstractCommand {
    /// EID, DOI, PII, Scopus ID or PubMed ID of the document
    pub id: String,

    /// API view, e.g. META_ABS or FULL
    #[arg(long)]
    pub view: Option<String>,

    /// Identifier type; detected from the id when omitted
    #[arg(long)]
    pub id_type: Option<String>,

    #[command(flatten)]
    pub refresh: RefreshArgs,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

impl AbstractCommand {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let mut options = AbstractOptions {
            id_type: self.id_type.as_deref().map(str::parse::<IdType>).transpose()?,
            refresh: self.refresh.refresh(),
            ..Default::default()
        };
        if let Some(view) = &self.view {
            options.view = view.parse::<View>()?;
        }

        let session = global.session()?;
        let abstract_ = AbstractRetrieval::fetch(&session, &self.id, options).await?;
        println!("{}", render(&abstract_, self.format)?);
        global.report(&session);
        Ok(())
    }
}

fn render(abstract_: &AbstractRetrieval, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => abstract_.to_string(),
        OutputFormat::Bibtex => abstract_.get_bibtex()?,
        OutputFormat::Ris => abstract_.get_ris()?,
        OutputFormat::Latex => abstract_.get_latex(),
        OutputFormat::Html => abstract_.get_html(),
        OutputFormat::Json => serde_json::to_string_pretty(abstract_.json())?,
    })
}

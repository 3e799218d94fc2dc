//! biblio search command

use super::{GlobalArgs, RefreshArgs};
use clap::{Args, ValueEnum};
use console::style;
use engine::Session;
use scopus::{
    AffiliationResult, AffiliationSearch, AuthorResult, AuthorSearch, Document, ScopusSearch,
    SearchOptions,
};

/// Which search API to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchTarget {
    Scopus,
    Author,
    Affiliation,
}

#[derive(Debug, Args)]
pub struct SearchCommand {
    #[arg(value_enum)]
    pub target: SearchTarget,

    /// Advanced search query, e.g. `AU-ID(7004212771)`
    pub query: String,

    /// Only report the number of results
    #[arg(long)]
    pub no_download: bool,

    /// Number of results to print
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[command(flatten)]
    pub refresh: RefreshArgs,
}

impl SearchCommand {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let options = SearchOptions {
            refresh: self.refresh.refresh(),
            download: !self.no_download,
            verbose: global.verbose,
            ..Default::default()
        };
        let session = global.session()?;
        let (total, lines) = self.search(&session, options).await?;

        println!(
            "{} results for {}",
            style(total).bold(),
            style(&self.query).cyan()
        );
        for line in lines.iter().take(self.limit) {
            println!("  {line}");
        }
        if lines.len() > self.limit {
            println!("  {}", style(format!("... {} more", lines.len() - self.limit)).dim());
        }

        global.report(&session);
        Ok(())
    }

    async fn search(
        &self,
        session: &Session,
        options: SearchOptions,
    ) -> anyhow::Result<(usize, Vec<String>)> {
        let query = self.query.as_str();
        Ok(match self.target {
            SearchTarget::Scopus => {
                let search = ScopusSearch::fetch(session, query, options).await?;
                let lines = search.results()?.unwrap_or_default();
                (search.get_results_size(), lines.iter().map(document_line).collect())
            }
            SearchTarget::Author => {
                let search = AuthorSearch::fetch(session, query, options).await?;
                let lines = search.results()?.unwrap_or_default();
                (search.get_results_size(), lines.iter().map(author_line).collect())
            }
            SearchTarget::Affiliation => {
                let search = AffiliationSearch::fetch(session, query, options).await?;
                let lines = search.results()?.unwrap_or_default();
                (search.get_results_size(), lines.iter().map(affiliation_line).collect())
            }
        })
    }
}

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn document_line(doc: &Document) -> String {
    let year = or_blank(&doc.cover_date).get(..4).unwrap_or("");
    format!(
        "{} ({year}) {} [{} citations]",
        or_blank(&doc.eid),
        or_blank(&doc.title),
        doc.citedby_count.unwrap_or(0)
    )
}

fn author_line(author: &AuthorResult) -> String {
    format!(
        "{} {}, {} ({} documents) {}",
        or_blank(&author.eid),
        or_blank(&author.surname),
        or_blank(&author.givenname),
        author.documents.unwrap_or(0),
        or_blank(&author.affiliation)
    )
}

fn affiliation_line(aff: &AffiliationResult) -> String {
    format!(
        "{} {} ({}, {}) {} documents",
        or_blank(&aff.eid),
        or_blank(&aff.name),
        or_blank(&aff.city),
        or_blank(&aff.country),
        aff.documents.unwrap_or(0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============== Formatting Tests ==============

    #[test]
    fn test_document_line() {
        let doc = Document {
            eid: Some("2-s2.0-85068268027".to_string()),
            title: Some("pybliometrics".to_string()),
            cover_date: Some("2019-07-01".to_string()),
            citedby_count: Some(12),
            ..Default::default()
        };
        assert_eq!(
            document_line(&doc),
            "2-s2.0-85068268027 (2019) pybliometrics [12 citations]"
        );
        assert_eq!(document_line(&Document::default()), " ()  [0 citations]");
    }

    #[test]
    fn test_affiliation_line() {
        let aff = AffiliationResult {
            eid: Some("10-s2.0-60021784".to_string()),
            name: Some("New York University".to_string()),
            variant: String::new(),
            documents: Some(101148),
            city: Some("New York".to_string()),
            country: Some("United States".to_string()),
        };
        assert_eq!(
            affiliation_line(&aff),
            "10-s2.0-60021784 New York University (New York, United States) 101148 documents"
        );
    }
}

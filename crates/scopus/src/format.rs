//! Citation output for [`AbstractRetrieval`]

use crate::abstract_retrieval::{AbstractRetrieval, Author, Reference};
use crate::common::year_of;
use shared::{BiblioError, Result, View};
use std::fmt;

const TOP_REFERENCES: usize = 5;

const AUTHOR_LINK: &str =
    "https://www.scopus.com/authid/detail.url?origin=AuthorProfile&authorId=";

impl fmt::Display for AbstractRetrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view() {
            View::Meta | View::MetaAbs | View::Full => self.fmt_document(f),
            View::Ref => self.fmt_references(f),
            _ => Ok(()),
        }
    }
}

impl AbstractRetrieval {
    fn fmt_document(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authors = self.authors().unwrap_or_default();
        write!(
            f,
            "{}: \"{}\", {}, {}",
            author_line(&authors),
            self.title().unwrap_or_default(),
            self.publication_name().unwrap_or_default(),
            self.volume().unwrap_or_default()
        )?;
        if let Some(issue) = self.issue_identifier() {
            write!(f, "({issue})")?;
        }
        write!(f, ", {}", parse_pages(self))?;
        write!(f, "({}).", year_of(self.cover_date().as_deref()))?;
        if let Some(doi) = self.doi() {
            writeln!(f, " https://doi.org/{doi}.")?;
        }
        write!(
            f,
            "{} citation(s) as of {}",
            self.citedby_count().unwrap_or(0),
            self.cache().date_string()
        )?;
        if let Some(affiliations) = self.affiliation() {
            let names: Vec<String> = affiliations.into_iter().filter_map(|a| a.name).collect();
            write!(f, "\n  Affiliation(s):\n   {}", names.join("\n   "))?;
        }
        Ok(())
    }

    fn fmt_references(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A total of {} references were found. ",
            self.refcount().unwrap_or(0)
        )?;
        let mut references = self.references().unwrap_or_default();
        if references.is_empty() {
            return Ok(());
        }
        // stable sort keeps document order among equal counts
        references.sort_by(|a, b| {
            let count = |r: &Reference| {
                r.citedbycount
                    .as_deref()
                    .and_then(|c| c.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };
            count(b).total_cmp(&count(a))
        });
        let top: Vec<String> = references
            .iter()
            .take(TOP_REFERENCES)
            .map(|r| {
                let year: Option<String> = r.cover_date.as_deref().map(|d| d.chars().take(4).collect());
                format!(
                    "{} ({}). EID: {}",
                    r.title.as_deref().unwrap_or(""),
                    year.as_deref().unwrap_or("N/A"),
                    r.id.as_deref().unwrap_or("N/A")
                )
            })
            .collect();
        write!(f, "Top {TOP_REFERENCES} references:\n\t{}", top.join("\n\t"))
    }

    /// BibTeX entry; journal articles only
    pub fn get_bibtex(&self) -> Result<String> {
        self.require_journal()?;
        let year = year_of(self.cover_date().as_deref());
        let authors = self.authors().unwrap_or_default();
        let title = self.title().unwrap_or_else(|| "Unknown Title".to_string());
        let words: Vec<&str> = title.split_whitespace().collect();

        let surname = match authors.first() {
            Some(first) => first.surname.clone().unwrap_or_else(|| "Unknown".to_string()),
            None => "UnknownAuthor".to_string(),
        };
        let first_word = words.first().map_or("UnknownFirst".to_string(), |w| title_case(w));
        let last_word = words.last().map_or("UnknownLast".to_string(), |w| title_case(w));
        let key = format!("{surname}{year}{first_word}{last_word}");

        let names: Vec<String> = authors.iter().map(Author::full_name).collect();
        let pages = match (self.page_range(), self.starting_page(), self.ending_page()) {
            (Some(range), _, _) => range,
            (None, Some(start), Some(end)) => format!("{start}-{end}"),
            _ => "-".to_string(),
        };

        let mut bib = vec![
            format!("@article{{{key},"),
            format!("  author = {{{}}},", names.join(" and ")),
            format!("  title = {{{{{}}}}},", self.title().unwrap_or_default()),
            format!("  journal = {{{}}},", self.publication_name().unwrap_or_default()),
            format!("  year = {{{year}}},"),
            format!("  volume = {{{}}},", self.volume().unwrap_or_default()),
            format!("  number = {{{}}},", self.issue_identifier().unwrap_or_default()),
        ];
        match self.doi() {
            Some(doi) => {
                bib.push(format!("  pages = {{{pages}}},"));
                bib.push(format!("  doi = {{{doi}}}"));
            }
            None => bib.push(format!("  pages = {{{pages}}}")),
        }
        bib.push("}".to_string());
        Ok(bib.join("\n"))
    }

    /// RIS entry; journal articles only
    pub fn get_ris(&self) -> Result<String> {
        self.require_journal()?;
        let cover_date = self.cover_date();
        let mut ris = format!(
            "TY  - JOUR\nTI  - {}\nJO  - {}\nVL  - {}\nDA  - {}\nPY  - {}\nSP  - {}\n",
            self.title().unwrap_or_default(),
            self.publication_name().unwrap_or_default(),
            self.volume().unwrap_or_default(),
            cover_date.as_deref().unwrap_or(""),
            year_of(cover_date.as_deref()),
            self.page_range().unwrap_or_default(),
        );
        for author in self.authors().unwrap_or_default() {
            ris.push_str(&format!("AU  - {}\n", author.indexed_name.unwrap_or_default()));
        }
        if let Some(doi) = self.doi() {
            ris.push_str(&format!("DO  - {doi}\nUR  - https://doi.org/{doi}\n"));
        }
        if let Some(issue) = self.issue_identifier() {
            ris.push_str(&format!("IS  - {issue}\n"));
        }
        ris.push_str("ER  - \n\n");
        Ok(ris)
    }

    /// HTML entry with links to the author and source profiles
    pub fn get_html(&self) -> String {
        let authors = self.authors().unwrap_or_default();
        let links: Vec<String> = authors
            .iter()
            .map(|a| {
                format!(
                    "<a href=\"{AUTHOR_LINK}{}\">{}</a>",
                    a.auid.map(|id| id.to_string()).unwrap_or_default(),
                    a.full_name()
                )
            })
            .collect();
        let author_str = match links.split_last() {
            None => "(No author found)".to_string(),
            Some((last, [])) => last.clone(),
            Some((last, head)) => format!("{} and {last}", head.join(", ")),
        };

        let title = format!(
            "<a href=\"{}\">{}</a>",
            self.scopus_link().unwrap_or_default(),
            self.title().unwrap_or_default()
        );
        let volissue = match (self.volume(), self.issue_identifier()) {
            (Some(vol), Some(issue)) => format!("<b>{vol}({issue})</b>"),
            (Some(vol), None) => format!("<b>{vol}</b>"),
            _ => "no volume".to_string(),
        };
        let journal = format!(
            "<a href=\"https://www.scopus.com/source/sourceInfo.url?sourceId={}\">{}</a>",
            self.source_id().map(|id| id.to_string()).unwrap_or_default(),
            self.publication_name().unwrap_or_default()
        );

        let mut html = format!(
            "{author_str}, {title}, {journal}, {volissue}, {}, ({}).",
            parse_pages(self),
            year_of(self.cover_date().as_deref())
        );
        if let Some(doi) = self.doi() {
            html.push_str(&format!(" <a href=\"https://doi.org/{doi}\">doi:{doi}</a>."));
        }
        html
    }

    /// LaTeX entry
    pub fn get_latex(&self) -> String {
        let authors = self.authors().unwrap_or_default();
        let volissue = match (self.volume(), self.issue_identifier()) {
            (Some(vol), Some(issue)) => format!("\\textbf{{{vol}({issue})}}"),
            (Some(vol), None) => format!("\\textbf{{{vol}}}"),
            _ => "no volume".to_string(),
        };
        let mut latex = format!(
            "{}, \\textit{{{}}}, {}, {volissue}, {} ({}).",
            author_line(&authors),
            self.title().unwrap_or_default(),
            self.publication_name().unwrap_or_default(),
            parse_pages(self),
            year_of(self.cover_date().as_deref())
        );
        if let Some(doi) = self.doi() {
            latex.push_str(&format!(" \\href{{https://doi.org/{doi}}}{{doi:{doi}}}, "));
        }
        latex.push_str(&format!(
            "\\href{{{}}}{{scopus:{}}}.",
            self.scopus_link().unwrap_or_default(),
            self.eid().unwrap_or_default()
        ));
        latex
    }

    fn require_journal(&self) -> Result<()> {
        if self.aggregation_type().as_deref() == Some("Journal") {
            Ok(())
        } else {
            Err(BiblioError::invalid_parameter("aggregation_type", &["Journal"]))
        }
    }
}

fn author_line(authors: &[Author]) -> String {
    if authors.is_empty() {
        "(No author found)".to_string()
    } else {
        list_authors(authors)
    }
}

/// `A, B and C`
pub(crate) fn list_authors(authors: &[Author]) -> String {
    let names: Vec<String> = authors.iter().map(Author::full_name).collect();
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, head)) => format!("{} and {last}", head.join(", ")),
    }
}

pub(crate) fn parse_pages(ab: &AbstractRetrieval) -> String {
    if let Some(range) = ab.page_range() {
        return format!("pp. {range}");
    }
    match (ab.starting_page(), ab.ending_page()) {
        (Some(start), Some(end)) => format!("pp. {start}-{end}"),
        _ => "(no pages found)".to_string(),
    }
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut previous_alpha = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(c);
            previous_alpha = false;
        }
    }
    out
}

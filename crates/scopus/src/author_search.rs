//! AuthorSearch - Author profiles matching a query

use crate::search_options::{SearchBase, SearchOptions};
use engine::{SearchQuery, Session};
use serde::Serialize;
use serde_json::Value;
use shared::parse::{get_str, listify_opt, make_int_opt};
use shared::{check_view, Api, Record, Result, View};
use std::fmt;

/// An author profile found by [`AuthorSearch`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorResult {
    pub eid: Option<String>,
    pub orcid: Option<String>,
    pub surname: Option<String>,
    pub initials: Option<String>,
    pub givenname: Option<String>,
    /// Name of the current affiliation
    pub affiliation: Option<String>,
    pub documents: Option<i64>,
    pub affiliation_id: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Subject areas as `ABBREV (frequency)` joined on `; `
    pub areas: String,
}

impl Record for AuthorResult {
    const FIELDS: &'static [&'static str] = &[
        "eid",
        "orcid",
        "surname",
        "initials",
        "givenname",
        "affiliation",
        "documents",
        "affiliation_id",
        "city",
        "country",
        "areas",
    ];
}

/// Search results of the Author Search API
#[derive(Debug, Clone)]
pub struct AuthorSearch {
    base: SearchBase,
}

impl AuthorSearch {
    /// Run `query`, e.g. `AUTHLAST(Selten) AND AUTHFIRST(Reinhard)`
    pub async fn fetch(
        session: &Session,
        query: impl Into<SearchQuery>,
        options: SearchOptions,
    ) -> Result<Self> {
        let view = options.view.unwrap_or(View::Standard);
        check_view(Api::AuthorSearch, view)?;
        let base = SearchBase::run(session, Api::AuthorSearch, query.into(), view, false, options)
            .await?;
        Ok(Self { base })
    }

    /// Parsed author profiles
    pub fn results(&self) -> Result<Option<Vec<AuthorResult>>> {
        self.base.check_fields::<AuthorResult>()?;
        let authors = self.base.searched.results.iter().map(parse_author).collect();
        self.base.finish(authors)
    }

    pub fn get_results_size(&self) -> usize {
        self.base.searched.total
    }
}

impl fmt::Display for AuthorSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eids: Vec<String> = self
            .base
            .searched
            .results
            .iter()
            .filter_map(|item| get_str(item, "eid"))
            .collect();
        f.write_str(&self.base.summary("author", &eids))
    }
}

fn parse_author(item: &Value) -> AuthorResult {
    let name = item.get("preferred-name").unwrap_or(&Value::Null);
    let aff = item.get("affiliation-current").unwrap_or(&Value::Null);

    let mut areas: Vec<String> = listify_opt(item.get("subject-area"))
        .into_iter()
        .map(|d| {
            format!(
                "{} ({})",
                get_str(d, "@abbrev").unwrap_or_default(),
                get_str(d, "@frequency").unwrap_or_default()
            )
        })
        .collect();
    if areas.is_empty() {
        areas.push(" ()".to_string());
    }

    AuthorResult {
        eid: get_str(item, "eid"),
        orcid: get_str(item, "orcid"),
        surname: get_str(name, "surname"),
        initials: get_str(name, "initials"),
        givenname: get_str(name, "given-name"),
        affiliation: get_str(aff, "affiliation-name"),
        documents: make_int_opt(item.get("document-count")),
        affiliation_id: get_str(aff, "affiliation-id"),
        city: get_str(aff, "affiliation-city"),
        country: get_str(aff, "affiliation-country"),
        areas: areas.join("; "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::MockTransport;
    use serde_json::json;
    use shared::Config;
    use std::sync::Arc;
    use tempfile::TempDir;

    const URL: &str = "https://api.elsevier.com/content/search/author";

    fn entry() -> Value {
        json!({
            "eid": "9-s2.0-6602907525",
            "orcid": null,
            "preferred-name": {"surname": "Selten", "given-name": "Reinhard", "initials": "R."},
            "document-count": "74",
            "subject-area": [
                {"@abbrev": "ECON", "@frequency": "73", "$": "Economics"},
                {"@abbrev": "MATH", "@frequency": "19", "$": "Mathematics"}
            ],
            "affiliation-current": {
                "affiliation-id": "60007493",
                "affiliation-name": "Universitat Bonn",
                "affiliation-city": "Bonn",
                "affiliation-country": "Germany"
            }
        })
    }

    // ============== Parsing Tests ==============

    #[test]
    fn test_parse_author() {
        let author = parse_author(&entry());
        assert_eq!(author.surname.as_deref(), Some("Selten"));
        assert_eq!(author.initials.as_deref(), Some("R."));
        assert_eq!(author.documents, Some(74));
        assert_eq!(author.affiliation_id.as_deref(), Some("60007493"));
        assert_eq!(author.areas, "ECON (73); MATH (19)");
        assert_eq!(author.orcid, None);
    }

    #[test]
    fn test_single_subject_area() {
        let mut item = entry();
        item["subject-area"] = json!({"@abbrev": "ECON", "@frequency": "73"});
        assert_eq!(parse_author(&item).areas, "ECON (73)");
    }

    // ============== Search Tests ==============

    #[tokio::test]
    async fn test_author_search() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(
            URL,
            &json!({"search-results": {"opensearch:totalResults": "1", "entry": [entry()]}}),
        );
        let config = Config::with_cache_root(dir.path(), vec!["key".to_string()]);
        let session = Session::with_transport(config, mock.clone());
        session.client().set_throttling(false);

        let search = AuthorSearch::fetch(
            &session,
            "AUTHLAST(Selten) and AUTHFIRST(Reinhard)",
            SearchOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(mock.requests()[0].param("view"), Some("STANDARD"));
        assert_eq!(mock.requests()[0].param("start"), Some("0"));
        assert_eq!(search.get_results_size(), 1);
        assert_eq!(search.results().unwrap().unwrap()[0].country.as_deref(), Some("Germany"));
        assert!(search.to_string().ends_with(":\n    9-s2.0-6602907525"));
    }
}

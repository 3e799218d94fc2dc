//! ScopusSearch - Documents matching an advanced search query

use crate::search_options::{SearchBase, SearchOptions};
use engine::{SearchQuery, Session};
use serde::Serialize;
use serde_json::Value;
use shared::parse::{
    deduplicate, get_freetoread, get_str, html_unescape_opt, listify, listify_opt, make_int_opt,
    value_str,
};
use shared::{check_view, Api, Record, Result, View};
use std::fmt;

/// A document found by [`ScopusSearch`].
///
/// Affiliation fields and author fields are joined on `;`. Multiple
/// affiliations of one author are joined on `-`, e.g.
/// `Author1Aff;Author2Aff1-Author2Aff2`. Authors and their affiliations
/// are deduplicated. Scopus only returns the first funding entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub eid: Option<String>,
    pub doi: Option<String>,
    pub pii: Option<String>,
    pub pubmed_id: Option<String>,
    pub title: Option<String>,
    pub subtype: Option<String>,
    pub subtype_description: Option<String>,
    pub creator: Option<String>,
    pub afid: Option<String>,
    pub affilname: Option<String>,
    pub affiliation_city: Option<String>,
    pub affiliation_country: Option<String>,
    pub author_count: Option<String>,
    pub author_names: Option<String>,
    pub author_ids: Option<String>,
    pub author_afids: Option<String>,
    pub cover_date: Option<String>,
    pub cover_display_date: Option<String>,
    pub publication_name: Option<String>,
    pub issn: Option<String>,
    pub source_id: Option<String>,
    pub e_issn: Option<String>,
    pub aggregation_type: Option<String>,
    pub volume: Option<String>,
    pub issue_identifier: Option<String>,
    pub article_number: Option<String>,
    pub page_range: Option<String>,
    pub description: Option<String>,
    pub authkeywords: Option<String>,
    pub citedby_count: Option<i64>,
    pub openaccess: Option<i64>,
    pub freetoread: Option<String>,
    pub freetoread_label: Option<String>,
    pub fund_acr: Option<String>,
    pub fund_no: Option<String>,
    pub fund_sponsor: Option<String>,
}

impl Record for Document {
    const FIELDS: &'static [&'static str] = &[
        "eid",
        "doi",
        "pii",
        "pubmed_id",
        "title",
        "subtype",
        "subtype_description",
        "creator",
        "afid",
        "affilname",
        "affiliation_city",
        "affiliation_country",
        "author_count",
        "author_names",
        "author_ids",
        "author_afids",
        "cover_date",
        "cover_display_date",
        "publication_name",
        "issn",
        "source_id",
        "e_issn",
        "aggregation_type",
        "volume",
        "issue_identifier",
        "article_number",
        "page_range",
        "description",
        "authkeywords",
        "citedby_count",
        "openaccess",
        "freetoread",
        "freetoread_label",
        "fund_acr",
        "fund_no",
        "fund_sponsor",
    ];
}

/// Search results of the Scopus Search API
#[derive(Debug, Clone)]
pub struct ScopusSearch {
    base: SearchBase,
    unescape: bool,
}

impl ScopusSearch {
    /// Run `query` as used in the Advanced Search on scopus.com.
    ///
    /// The view defaults to COMPLETE for subscribers and STANDARD otherwise.
    /// Subscribers page with cursors, everyone else is limited to 5000
    /// results. A `cursor` entry in `params` decides the paging mode
    /// instead of `subscriber`.
    pub async fn fetch(
        session: &Session,
        query: impl Into<SearchQuery>,
        mut options: SearchOptions,
    ) -> Result<Self> {
        if let Some(view) = options.view {
            check_view(Api::ScopusSearch, view)?;
        }
        let view = options.view.unwrap_or(if options.subscriber {
            View::Complete
        } else {
            View::Standard
        });

        let mut subscriber = options.subscriber;
        if let Some(pos) = options.params.iter().position(|(k, _)| k == "cursor") {
            let (_, value) = options.params.remove(pos);
            subscriber = cursor_flag(&value);
        }

        let unescape = options.unescape;
        let base =
            SearchBase::run(session, Api::ScopusSearch, query.into(), view, subscriber, options)
                .await?;
        Ok(Self { base, unescape })
    }

    /// Parsed documents; fails when an integrity field is unknown or,
    /// with `IntegrityAction::Raise`, incomplete
    pub fn results(&self) -> Result<Option<Vec<Document>>> {
        self.base.check_fields::<Document>()?;
        let docs = self
            .base
            .searched
            .results
            .iter()
            .map(|item| parse_document(item, self.unescape))
            .collect();
        self.base.finish(docs)
    }

    /// Number of documents the query matches
    pub fn get_results_size(&self) -> usize {
        self.base.searched.total
    }

    /// EIDs of the downloaded documents
    pub fn get_eids(&self) -> Vec<String> {
        self.base
            .searched
            .results
            .iter()
            .filter_map(|item| get_str(item, "eid"))
            .collect()
    }
}

impl fmt::Display for ScopusSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base.summary("document", &self.get_eids()))
    }
}

/// Truthiness of a `cursor` parameter
fn cursor_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "false" | "0" | "no")
}

fn unescaped(text: Option<String>, unescape: bool) -> Option<String> {
    if unescape {
        html_unescape_opt(text)
    } else {
        text
    }
}

/// Join `key` over all affiliations of an entry
fn join_affiliations(item: &Value, key: &str, unescape: bool) -> Option<String> {
    let affiliations = item.get("affiliation")?;
    let parts: Vec<String> = listify(affiliations)
        .into_iter()
        .map(|aff| get_str(aff, key).unwrap_or_default())
        .collect();
    unescaped(Some(parts.join(";")), unescape)
}

/// Names, ids and affiliation ids of the deduplicated authors
fn parse_authors(item: &Value) -> (Option<String>, Option<String>, Option<String>) {
    let Some(list) = item.get("author") else {
        return (None, None, None);
    };
    let authors = deduplicate(&listify(list));

    let names: Vec<String> = authors
        .iter()
        .map(|a| {
            format!(
                "{}, {}",
                get_str(a, "surname").unwrap_or_default(),
                get_str(a, "given-name").unwrap_or_default()
            )
        })
        .collect();
    let ids: Vec<String> = authors
        .iter()
        .map(|a| get_str(a, "authid").unwrap_or_default())
        .collect();
    let afids: Vec<String> = authors
        .iter()
        .map(|a| {
            deduplicate(&listify_opt(a.get("afid")))
                .iter()
                .filter_map(|d| get_str(d, "$"))
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect();
    let afids = if afids.iter().any(|a| !a.is_empty()) {
        Some(afids.join(";"))
    } else {
        None
    };
    (Some(names.join(";")), Some(ids.join(";")), afids)
}

fn parse_document(item: &Value, unescape: bool) -> Document {
    let (author_names, author_ids, author_afids) = parse_authors(item);
    let cover_date = match item.get("prism:coverDate") {
        Some(Value::Array(dates)) => dates.first().and_then(|d| get_str(d, "$")),
        Some(other) => value_str(other),
        None => None,
    };
    let fund_no = get_str(item, "fund-no")
        .map(|f| f.replace("undefined", ""))
        .filter(|f| !f.is_empty());

    Document {
        eid: get_str(item, "eid"),
        doi: get_str(item, "prism:doi"),
        pii: get_str(item, "pii"),
        pubmed_id: get_str(item, "pubmed-id"),
        title: unescaped(get_str(item, "dc:title"), unescape),
        subtype: get_str(item, "subtype"),
        subtype_description: get_str(item, "subtypeDescription"),
        creator: get_str(item, "dc:creator"),
        afid: join_affiliations(item, "afid", unescape),
        affilname: join_affiliations(item, "affilname", unescape),
        affiliation_city: join_affiliations(item, "affiliation-city", unescape),
        affiliation_country: join_affiliations(item, "affiliation-country", unescape),
        author_count: item.get("author-count").and_then(|c| get_str(c, "$")),
        author_names,
        author_ids,
        author_afids,
        cover_date,
        cover_display_date: get_str(item, "prism:coverDisplayDate"),
        publication_name: get_str(item, "prism:publicationName"),
        issn: get_str(item, "prism:issn"),
        source_id: get_str(item, "source-id"),
        e_issn: get_str(item, "prism:eIssn"),
        aggregation_type: get_str(item, "prism:aggregationType"),
        volume: get_str(item, "prism:volume"),
        issue_identifier: get_str(item, "prism:issueIdentifier"),
        article_number: get_str(item, "article-number"),
        page_range: get_str(item, "prism:pageRange"),
        description: unescaped(get_str(item, "dc:description"), unescape),
        authkeywords: unescaped(get_str(item, "authkeywords"), unescape),
        citedby_count: make_int_opt(item.get("citedby-count")),
        openaccess: make_int_opt(item.get("openaccess")),
        freetoread: get_freetoread(item, &["freetoread", "value"]),
        freetoread_label: get_freetoread(item, &["freetoreadLabel", "value"]),
        fund_acr: get_str(item, "fund-acr"),
        fund_no,
        fund_sponsor: get_str(item, "fund-sponsor"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::MockTransport;
    use serde_json::json;
    use shared::{BiblioError, Config, IntegrityAction};
    use std::sync::Arc;
    use tempfile::TempDir;

    const URL: &str = "https://api.elsevier.com/content/search/scopus";

    fn entry() -> Value {
        json!({
            "eid": "2-s2.0-85068268027",
            "dc:title": "pybliometrics: Scriptable bibliometrics &amp; more",
            "prism:coverDate": [{"$": "2019-07-01"}],
            "citedby-count": "130",
            "openaccess": "1",
            "fund-no": "undefined",
            "author-count": {"$": "2"},
            "freetoread": {"value": [{"$": "all"}, {"$": "publisherfullgold"}]},
            "affiliation": [
                {"afid": "60028717", "affilname": "Max Planck Institute", "affiliation-city": "Munich"},
                {"afid": "60027950", "affilname": "Carnegie Mellon University", "affiliation-city": null}
            ],
            "author": [
                {"authid": "57209617104", "surname": "Rose", "given-name": "Michael E.", "afid": [{"$": "60028717"}, {"$": "60028717"}]},
                {"authid": "57209617104", "surname": "Rose", "given-name": "Michael E.", "afid": [{"$": "60028717"}, {"$": "60028717"}]},
                {"authid": "7004212771", "surname": "Kitchin", "given-name": null, "afid": [{"$": "60027950"}, {"$": "60028717"}]}
            ]
        })
    }

    fn session(dir: &TempDir, mock: &Arc<MockTransport>) -> Session {
        let config = Config::with_cache_root(dir.path(), vec!["key".to_string()]);
        let session = Session::with_transport(config, mock.clone());
        session.client().set_throttling(false);
        session
    }

    fn page(entries: Vec<Value>) -> Value {
        json!({"search-results": {
            "opensearch:totalResults": entries.len().to_string(),
            "entry": entries,
        }})
    }

    // ============== Parsing Tests ==============

    #[test]
    fn test_parse_document() {
        let doc = parse_document(&entry(), true);
        assert_eq!(doc.title.as_deref(), Some("pybliometrics: Scriptable bibliometrics & more"));
        assert_eq!(doc.cover_date.as_deref(), Some("2019-07-01"));
        assert_eq!(doc.afid.as_deref(), Some("60028717;60027950"));
        assert_eq!(doc.affiliation_city.as_deref(), Some("Munich;"));
        assert_eq!(doc.author_names.as_deref(), Some("Rose, Michael E.;Kitchin, "));
        assert_eq!(doc.author_ids.as_deref(), Some("57209617104;7004212771"));
        assert_eq!(doc.author_afids.as_deref(), Some("60028717;60027950-60028717"));
        assert_eq!(doc.author_count.as_deref(), Some("2"));
        assert_eq!(doc.citedby_count, Some(130));
        assert_eq!(doc.fund_no, None);
        assert_eq!(doc.freetoread.as_deref(), Some("all publisherfullgold"));
    }

    #[test]
    fn test_parse_document_without_unescape() {
        let doc = parse_document(&entry(), false);
        assert!(doc.title.unwrap().contains("&amp;"));
    }

    #[test]
    fn test_parse_document_without_authors() {
        let doc = parse_document(&json!({"eid": "x", "prism:coverDate": "2020-01-01"}), true);
        assert_eq!(doc.author_names, None);
        assert_eq!(doc.author_afids, None);
        assert_eq!(doc.afid, None);
        assert_eq!(doc.cover_date.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn test_cursor_flag() {
        assert!(cursor_flag("true"));
        assert!(cursor_flag("*"));
        assert!(!cursor_flag("False"));
        assert!(!cursor_flag("0"));
    }

    // ============== Search Tests ==============

    #[tokio::test]
    async fn test_subscriber_uses_cursor_and_complete_view() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &page(vec![entry()]));
        let session = session(&dir, &mock);

        let search = ScopusSearch::fetch(&session, "AU-ID(57209617104)", SearchOptions::default())
            .await
            .unwrap();
        let request = &mock.requests()[0];
        assert_eq!(request.param("view"), Some("COMPLETE"));
        assert_eq!(request.param("cursor"), Some("*"));
        assert_eq!(search.get_results_size(), 1);
        assert_eq!(search.get_eids(), vec!["2-s2.0-85068268027"]);
        assert_eq!(search.results().unwrap().unwrap().len(), 1);
        assert!(search.to_string().starts_with(
            "Search 'AU-ID(57209617104)' yielded 1 document as of "
        ));
    }

    #[tokio::test]
    async fn test_cursor_param_overrides_subscriber() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &page(vec![entry()]));
        let session = session(&dir, &mock);

        let options = SearchOptions {
            params: vec![("cursor".to_string(), "false".to_string())],
            ..Default::default()
        };
        ScopusSearch::fetch(&session, "TITLE(x)", options).await.unwrap();
        let request = &mock.requests()[0];
        assert_eq!(request.param("start"), Some("0"));
        assert_eq!(request.param("cursor"), None);
        assert_eq!(request.param("view"), Some("COMPLETE"));
    }

    #[tokio::test]
    async fn test_non_subscriber_defaults_to_standard() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &page(vec![]));
        let session = session(&dir, &mock);

        let options = SearchOptions {
            subscriber: false,
            ..Default::default()
        };
        let search = ScopusSearch::fetch(&session, "TITLE(none)", options).await.unwrap();
        assert_eq!(mock.requests()[0].param("view"), Some("STANDARD"));
        assert_eq!(search.results().unwrap(), None);
        let summary = search.to_string();
        assert!(summary.starts_with("Search 'TITLE(none)' yielded 0 documents as of "));
        assert!(!summary.contains("downloaded"));
    }

    #[tokio::test]
    async fn test_integrity_checks() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &page(vec![entry()]));
        let session = session(&dir, &mock);

        let options = SearchOptions {
            integrity_fields: vec!["doi".to_string()],
            ..Default::default()
        };
        let search = ScopusSearch::fetch(&session, "TITLE(y)", options).await.unwrap();
        assert!(matches!(search.results().unwrap_err(), BiblioError::Integrity(_)));

        let options = SearchOptions {
            integrity_fields: vec!["doi".to_string()],
            integrity_action: IntegrityAction::Warn,
            ..Default::default()
        };
        let search = ScopusSearch::fetch(&session, "TITLE(y)", options).await.unwrap();
        assert!(search.results().unwrap().is_some());

        let options = SearchOptions {
            integrity_fields: vec!["nonsense".to_string()],
            ..Default::default()
        };
        let search = ScopusSearch::fetch(&session, "TITLE(y)", options).await.unwrap();
        assert!(search.results().unwrap_err().to_string().contains("nonsense"));
    }

    #[tokio::test]
    async fn test_invalid_view() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let session = session(&dir, &mock);

        let options = SearchOptions {
            view: Some(View::Full),
            ..Default::default()
        };
        assert!(ScopusSearch::fetch(&session, "x", options).await.is_err());
        assert!(mock.requests().is_empty());
    }
}

//! AuthorRetrieval - Profile of a single Scopus author
//!
//! Merged profiles are handled in two ways. When the requested id was
//! merged into a single profile, `identifier` differs from the requested
//! id. When it was split into several profiles, the response only lists
//! them in `alias` and most other fields are empty.

use crate::author_search::AuthorSearch;
use crate::common::{some_vec, SubjectArea};
use crate::scopus_search::{Document, ScopusSearch};
use crate::search_options::SearchOptions;
use engine::{retrieve, CacheInfo, Refresh, RetrievalRequest, Session};
use serde::Serialize;
use serde_json::Value;
use shared::parse::{
    chained_get, chained_str, filter_digits, format_thousands, get_link, get_str,
    html_unescape_opt, listify, listify_opt, make_int_opt, parse_date_created,
};
use shared::{check_view, Api, Result, View};
use std::fmt;

/// Coauthors are requested in pages of this size
const COAUTHOR_PAGE_SIZE: usize = 25;

/// Options for [`AuthorRetrieval::fetch`]
#[derive(Debug, Clone)]
pub struct AuthorOptions {
    pub view: View,
    pub refresh: Refresh,
    pub params: Vec<(String, String)>,
}

impl Default for AuthorOptions {
    fn default() -> Self {
        Self {
            view: View::Enhanced,
            refresh: Refresh::Never,
            params: Vec::new(),
        }
    }
}

/// Current or former affiliation of an author. Scopus sometimes misses
/// or misassigns affiliations even when the web view looks right.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorAffiliation {
    pub id: Option<i64>,
    pub parent: Option<i64>,
    #[serde(rename = "type")]
    pub aff_type: Option<String>,
    pub relationship: Option<String>,
    pub afdispname: Option<String>,
    pub preferred_name: Option<String>,
    pub parent_preferred_name: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub address_part: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub org_domain: Option<String>,
    pub org_url: Option<String>,
}

impl AuthorAffiliation {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameVariant {
    pub indexed_name: Option<String>,
    pub initials: Option<String>,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub doc_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coauthor {
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub id: Option<i64>,
    /// Subject areas joined on `; `
    pub areas: String,
    pub affiliation_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A Scopus author profile retrieved through the Author Retrieval API
#[derive(Debug, Clone)]
pub struct AuthorRetrieval {
    json: Value,
    view: View,
    id: String,
    alias: Option<Vec<String>>,
    cache: CacheInfo,
}

impl AuthorRetrieval {
    /// Retrieve an author by Scopus ID or EID (`9-s2.0-...`)
    pub async fn fetch(session: &Session, author_id: &str, options: AuthorOptions) -> Result<Self> {
        check_view(Api::AuthorRetrieval, options.view)?;
        let id = author_id.rsplit('-').next().unwrap_or(author_id).to_string();

        let request = RetrievalRequest::new(Api::AuthorRetrieval, id.as_str(), options.view)
            .refresh(options.refresh)
            .params(options.params);
        let retrieved = retrieve(session, &request).await?;
        Ok(Self::from_json(retrieved.json, options.view, id, retrieved.cache))
    }

    /// Wrap a downloaded response for the author `id`
    pub fn from_json(json: Value, view: View, id: String, cache: CacheInfo) -> Self {
        let mut alias = None;
        let json = match view {
            View::Metrics | View::Light | View::Standard | View::Enhanced => {
                match json.get("author-retrieval-response").cloned() {
                    Some(Value::Array(items)) => items.into_iter().next().unwrap_or(Value::Null),
                    Some(incomplete) => {
                        let ids: Vec<String> =
                            listify_opt(chained_get(&incomplete, &["alias", "prism:url"]))
                                .into_iter()
                                .filter_map(|d| get_str(d, "$"))
                                .filter_map(|url| url.rsplit(':').next().map(str::to_string))
                                .collect();
                        tracing::warn!(
                            "Author profile with ID {} has been merged and the main profile is now one of {}. \
                             Please update your records manually. Functionality of this object is reduced.",
                            id,
                            ids.join(", ")
                        );
                        alias = Some(ids);
                        incomplete
                    }
                    None => json,
                }
            }
            _ => json,
        };
        Self {
            json,
            view,
            id,
            alias,
            cache,
        }
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn cache(&self) -> &CacheInfo {
        &self.cache
    }

    fn profile(&self) -> &Value {
        self.json.get("author-profile").unwrap_or(&Value::Null)
    }

    fn preferred(&self, key: &str) -> Option<String> {
        html_unescape_opt(chained_str(self.profile(), &["preferred-name", key]))
    }

    pub fn affiliation_current(&self) -> Option<Vec<AuthorAffiliation>> {
        match self.view {
            View::Standard | View::Enhanced => parse_affiliations(
                chained_get(self.profile(), &["affiliation-current", "affiliation"]),
                self.view,
            ),
            View::Light => parse_affiliations(self.json.get("affiliation-current"), self.view),
            _ => None,
        }
    }

    /// Former affiliations, without the periods shown on the website
    pub fn affiliation_history(&self) -> Option<Vec<AuthorAffiliation>> {
        parse_affiliations(
            chained_get(self.profile(), &["affiliation-history", "affiliation"]),
            self.view,
        )
    }

    /// Candidate new ids when the profile was split up
    pub fn alias(&self) -> Option<&[String]> {
        self.alias.as_deref()
    }

    /// Number of citing documents
    pub fn citation_count(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "citation-count"]))
    }

    /// Number of citing authors
    pub fn cited_by_count(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "cited-by-count"]))
    }

    /// Subject group ids with the number of documents in each
    pub fn classificationgroup(&self) -> Option<Vec<(i64, i64)>> {
        let path = ["classificationgroup", "classifications", "classification"];
        let out = listify_opt(chained_get(self.profile(), &path))
            .into_iter()
            .filter_map(|item| {
                let code = filter_digits(&get_str(item, "$")?).parse().ok()?;
                let freq = filter_digits(&get_str(item, "@frequency")?).parse().ok()?;
                Some((code, freq))
            })
            .collect();
        some_vec(out)
    }

    pub fn coauthor_count(&self) -> Option<i64> {
        make_int_opt(self.json.get("coauthor-count"))
    }

    /// Author Search API page listing the coauthors
    pub fn coauthor_link(&self) -> Option<String> {
        get_link(&self.json, 3)
    }

    pub fn date_created(&self) -> Option<(i32, u32, u32)> {
        parse_date_created(self.profile())
    }

    /// Number of documents, excluding book chapters and notes
    pub fn document_count(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "document-count"]))
    }

    /// Only present in the ENTITLED view
    pub fn document_entitlement_status(&self) -> Option<String> {
        chained_str(&self.json, &["document-entitlement", "status"])
    }

    pub fn eid(&self) -> Option<String> {
        chained_str(&self.json, &["coredata", "eid"])
    }

    pub fn given_name(&self) -> Option<String> {
        self.preferred("given-name")
    }

    pub fn h_index(&self) -> Option<i64> {
        make_int_opt(self.json.get("h-index"))
    }

    /// Ids of former profiles merged into this one
    pub fn historical_identifier(&self) -> Option<Vec<i64>> {
        let out = listify_opt(chained_get(&self.json, &["coredata", "historical-identifier"]))
            .into_iter()
            .filter_map(|d| get_str(d, "$"))
            .filter_map(|s| s.rsplit(':').next().and_then(|id| id.parse().ok()))
            .collect();
        some_vec(out)
    }

    /// Id of the profile; warns when it differs from the requested one
    pub fn identifier(&self) -> Option<i64> {
        let ident = chained_str(&self.json, &["coredata", "dc:identifier"])?;
        let ident = ident.rsplit(':').next().unwrap_or(&ident).to_string();
        if ident != self.id {
            tracing::warn!(
                "Profile with ID {} has been merged and the new ID is {}. \
                 Please update your records manually. Files have been cached with the old ID.",
                self.id,
                ident
            );
        }
        ident.parse().ok()
    }

    pub fn indexed_name(&self) -> Option<String> {
        match self.view {
            View::Standard | View::Enhanced => self.preferred("indexed-name"),
            View::Light => {
                let variants = chained_get(&self.json, &["name-variants", "name-variant"]);
                match variants.map(listify).and_then(|v| v.first().copied()) {
                    Some(first) => chained_str(first, &["name-variant", "indexed-name"])
                        .or_else(|| get_str(first, "indexed-name")),
                    None => {
                        let name = self.json.get("preferred-name").unwrap_or(&Value::Null);
                        Some(format!(
                            "{} {}",
                            get_str(name, "initials").unwrap_or_default(),
                            get_str(name, "surname").unwrap_or_default()
                        ))
                    }
                }
            }
            _ => None,
        }
    }

    pub fn initials(&self) -> Option<String> {
        self.preferred("initials")
    }

    /// Name variants with the number of documents published under each
    pub fn name_variants(&self) -> Option<Vec<NameVariant>> {
        let out = listify_opt(self.profile().get("name-variant"))
            .into_iter()
            .map(|var| NameVariant {
                indexed_name: html_unescape_opt(get_str(var, "indexed-name")),
                initials: html_unescape_opt(get_str(var, "initials")),
                surname: html_unescape_opt(get_str(var, "surname")),
                given_name: html_unescape_opt(get_str(var, "given-name")),
                doc_count: make_int_opt(var.get("@doc-count")),
            })
            .collect();
        some_vec(out)
    }

    pub fn orcid(&self) -> Option<String> {
        chained_str(&self.json, &["coredata", "orcid"])
    }

    /// Years of the first and the last publication
    pub fn publication_range(&self) -> Option<(i32, i32)> {
        let (range, start, end) = match self.view {
            View::Standard | View::Enhanced => {
                (self.profile().get("publication-range")?, "@start", "@end")
            }
            View::Light => (self.json.get("publication-range")?, "start", "end"),
            _ => return None,
        };
        Some((
            make_int_opt(range.get(start))? as i32,
            make_int_opt(range.get(end))? as i32,
        ))
    }

    /// Scopus web page of the author
    pub fn scopus_author_link(&self) -> Option<String> {
        get_link(&self.json, 1)
    }

    /// Search API page listing the author's documents
    pub fn search_link(&self) -> Option<String> {
        get_link(&self.json, 2)
    }

    pub fn self_link(&self) -> Option<String> {
        get_link(&self.json, 0)
    }

    pub fn status(&self) -> Option<String> {
        get_str(self.profile(), "status")
    }

    pub fn subject_areas(&self) -> Option<Vec<SubjectArea>> {
        let out = listify_opt(chained_get(&self.json, &["subject-areas", "subject-area"]))
            .into_iter()
            .map(|item| SubjectArea {
                area: get_str(item, "$"),
                abbreviation: get_str(item, "@abbrev"),
                code: make_int_opt(item.get("@code")),
            })
            .collect();
        some_vec(out)
    }

    pub fn surname(&self) -> Option<String> {
        self.preferred("surname")
    }

    pub fn url(&self) -> Option<String> {
        chained_str(&self.json, &["coredata", "prism:url"])
    }

    /// Coauthors through the coauthor link; not cached. Scopus lists
    /// at most 160 coauthors.
    pub async fn get_coauthors(&self, session: &Session) -> Result<Option<Vec<Coauthor>>> {
        let Some(url) = self.coauthor_link() else {
            return Ok(None);
        };
        let client = session.client();
        let first = client.get_content(Api::AuthorSearch, &url, &[]).await?.json()?;
        let total = make_int_opt(chained_get(&first, &["search-results", "opensearch:totalResults"]))
            .unwrap_or(0)
            .max(0) as usize;

        let mut coauthors = Vec::new();
        let mut start = 0;
        while start < total {
            let params = vec![
                ("start".to_string(), start.to_string()),
                ("count".to_string(), COAUTHOR_PAGE_SIZE.to_string()),
                ("accept".to_string(), "json".to_string()),
            ];
            let page = client.get_content(Api::AuthorSearch, &url, &params).await?.json()?;
            for entry in listify_opt(chained_get(&page, &["search-results", "entry"])) {
                coauthors.push(parse_coauthor(entry));
            }
            start += COAUTHOR_PAGE_SIZE;
        }
        Ok(some_vec(coauthors))
    }

    /// Documents of the author through a ScopusSearch, optionally only of
    /// the given subtypes. `options.refresh` controls the search cache.
    pub async fn get_documents(
        &self,
        session: &Session,
        subtypes: Option<&[&str]>,
        options: SearchOptions,
    ) -> Result<Option<Vec<Document>>> {
        let search = ScopusSearch::fetch(session, self.documents_query(), options).await?;
        let docs = search.results()?;
        Ok(match subtypes {
            Some(subtypes) if !subtypes.is_empty() => docs.and_then(|docs| {
                some_vec(
                    docs.into_iter()
                        .filter(|d| d.subtype.as_deref().is_some_and(|s| subtypes.contains(&s)))
                        .collect(),
                )
            }),
            _ => docs,
        })
    }

    /// EIDs of the author's documents through a ScopusSearch
    pub async fn get_document_eids(
        &self,
        session: &Session,
        options: SearchOptions,
    ) -> Result<Vec<String>> {
        let search = ScopusSearch::fetch(session, self.documents_query(), options).await?;
        Ok(search.get_eids())
    }

    /// Number of author profiles similar to this one. The default query
    /// is `AUTHLAST(<surname>) AND AUTHFIRST(<given name>)`.
    pub async fn estimate_uniqueness(
        &self,
        session: &Session,
        query: Option<&str>,
        options: SearchOptions,
    ) -> Result<usize> {
        let query = match query {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => format!(
                "AUTHLAST({}) AND AUTHFIRST({})",
                self.surname().unwrap_or_default(),
                self.given_name().unwrap_or_default()
            ),
        };
        let search = AuthorSearch::fetch(session, query, options).await?;
        Ok(search.get_results_size())
    }

    fn documents_query(&self) -> String {
        let id = self
            .identifier()
            .map(|id| id.to_string())
            .unwrap_or_else(|| self.id.clone());
        format!("AU-ID({id})")
    }
}

impl fmt::Display for AuthorRetrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |n: Option<i64>| format_thousands(n.unwrap_or(0).max(0) as usize);
        match self.view {
            View::Standard | View::Enhanced | View::Light => {
                let main = self
                    .affiliation_current()
                    .and_then(|affs| affs.into_iter().next())
                    .unwrap_or_default();
                let since = self
                    .publication_range()
                    .map(|(first, _)| first.to_string())
                    .unwrap_or_default();
                write!(
                    f,
                    "{} from {} in {},\npublished {} document(s) since {} \n\
                     which were cited by {} author(s) in {} document(s) as of {}",
                    self.indexed_name().unwrap_or_default(),
                    main.preferred_name.unwrap_or_default(),
                    main.country.unwrap_or_default(),
                    count(self.document_count()),
                    since,
                    count(self.cited_by_count()),
                    count(self.citation_count()),
                    self.cache.date_string()
                )
            }
            View::Metrics => write!(
                f,
                "Author with ID {}\npublished {} document(s)\n\
                 which were cited by {} author(s) in {} document(s)",
                self.id,
                count(self.document_count()),
                count(self.cited_by_count()),
                count(self.citation_count())
            ),
            _ => Ok(()),
        }
    }
}

/// Affiliations of an author profile; LIGHT carries a reduced form
fn parse_affiliations(affs: Option<&Value>, view: View) -> Option<Vec<AuthorAffiliation>> {
    let mut out = Vec::new();
    match view {
        View::Standard | View::Enhanced => {
            for item in listify_opt(affs) {
                let doc = item.get("ip-doc").unwrap_or(&Value::Null);
                let address = doc.get("address").unwrap_or(&Value::Null);
                let aff = AuthorAffiliation {
                    id: make_int_opt(item.get("@affiliation-id")),
                    parent: make_int_opt(item.get("@parent")),
                    aff_type: get_str(doc, "@type"),
                    relationship: get_str(doc, "@relationship"),
                    afdispname: get_str(doc, "@afdispname"),
                    preferred_name: chained_str(doc, &["preferred-name", "$"]),
                    parent_preferred_name: chained_str(doc, &["parent-preferred-name", "$"]),
                    country_code: get_str(address, "@country"),
                    country: get_str(address, "country"),
                    address_part: get_str(address, "address-part"),
                    city: get_str(address, "city"),
                    state: get_str(address, "state"),
                    postal_code: get_str(address, "postal-code"),
                    org_domain: get_str(doc, "org-domain"),
                    org_url: get_str(doc, "org-URL"),
                };
                if !aff.is_empty() {
                    out.push(aff);
                }
            }
        }
        View::Light => {
            let affs = affs.unwrap_or(&Value::Null);
            let aff = AuthorAffiliation {
                preferred_name: get_str(affs, "affiliation-name"),
                city: get_str(affs, "affiliation-city"),
                country: get_str(affs, "affiliation-country"),
                ..Default::default()
            };
            if !aff.is_empty() {
                out.push(aff);
            }
        }
        _ => {}
    }
    some_vec(out)
}

fn parse_coauthor(entry: &Value) -> Coauthor {
    let name = entry.get("preferred-name").unwrap_or(&Value::Null);
    let aff = entry.get("affiliation-current").unwrap_or(&Value::Null);
    let areas: Vec<String> = listify_opt(entry.get("subject-area"))
        .into_iter()
        .filter_map(|a| get_str(a, "$"))
        .collect();
    Coauthor {
        surname: get_str(name, "surname"),
        given_name: get_str(name, "given-name"),
        id: get_str(entry, "dc:identifier")
            .and_then(|s| s.rsplit(':').next().and_then(|id| id.parse().ok())),
        areas: areas.join("; "),
        affiliation_id: get_str(aff, "affiliation-id"),
        name: get_str(aff, "affiliation-name"),
        city: get_str(aff, "affiliation-city"),
        country: get_str(aff, "affiliation-country"),
    }
}

//! AbstractRetrieval - Metadata of a single Scopus document
//!
//! Fields absent from the downloaded view are `None`. Some fields need a
//! specific view: `references` and `refcount` need REF or FULL, most of
//! the bibliographic record (`authorgroup`, `chemicals`, `issn` ...) needs
//! FULL.

use crate::common::{non_empty, some_vec, text_of, texts, SubjectArea};
use engine::{retrieve, CacheInfo, Refresh, RetrievalRequest, Session};
use serde::Serialize;
use serde_json::Value;
use shared::parse::{
    chained_get, chained_str, deduplicate, get_id, get_link, get_str, listify_opt, make_int_opt,
    parse_date_created,
};
use shared::{check_id_type, check_view, detect_id_type, Api, IdType, Result, View};
use std::collections::BTreeMap;

/// Identifier types accepted by the Abstract Retrieval API
pub const ABSTRACT_ID_TYPES: [IdType; 5] = [
    IdType::Eid,
    IdType::Pii,
    IdType::ScopusId,
    IdType::PubmedId,
    IdType::Doi,
];

/// Options for [`AbstractRetrieval::fetch`]
#[derive(Debug, Clone)]
pub struct AbstractOptions {
    pub view: View,
    /// Detected from the identifier when absent
    pub id_type: Option<IdType>,
    pub refresh: Refresh,
    pub params: Vec<(String, String)>,
}

impl Default for AbstractOptions {
    fn default() -> Self {
        Self {
            view: View::MetaAbs,
            id_type: None,
            refresh: Refresh::Never,
            params: Vec::new(),
        }
    }
}

/// An affiliation listed on the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Affiliation {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// An author or collaboration of an author group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMember {
    pub affiliation_id: Option<i64>,
    pub collaboration_id: Option<String>,
    pub dptid: Option<i64>,
    pub organization: Option<String>,
    pub city: Option<String>,
    pub postalcode: Option<String>,
    pub addresspart: Option<String>,
    pub country: Option<String>,
    pub auid: Option<i64>,
    pub orcid: Option<String>,
    pub indexed_name: Option<String>,
    pub surname: Option<String>,
    pub given_name: Option<String>,
}

/// An author with the main affiliation(s) Scopus assigned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub auid: Option<i64>,
    pub indexed_name: Option<String>,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    /// Affiliation ids joined on `;`
    pub affiliation: Option<String>,
}

impl Author {
    /// `Given Surname`
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.given_name.as_deref().unwrap_or(""),
            self.surname.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chemical {
    pub source: Option<String>,
    pub chemical_name: Option<String>,
    /// Registry numbers joined on `;`
    pub cas_registry_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub given_name: Option<String>,
    pub initials: Option<String>,
    pub surname: Option<String>,
    pub indexed_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correspondence {
    pub surname: Option<String>,
    pub initials: Option<String>,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub city_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Funding {
    pub agency: Option<String>,
    pub agency_id: Option<String>,
    pub string: Option<String>,
    pub funding_id: Option<Vec<String>>,
    pub acronym: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Issn {
    pub print: Option<String>,
    pub electronic: Option<String>,
}

/// A reference listed in the document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reference {
    pub position: Option<String>,
    /// Scopus id of the referenced document
    pub id: Option<String>,
    pub doi: Option<String>,
    pub title: Option<String>,
    /// `Surname, Initials` joined on `; `
    pub authors: String,
    pub authors_auid: Option<String>,
    pub authors_affiliationid: Option<String>,
    pub sourcetitle: Option<String>,
    /// FULL view only
    pub publicationyear: Option<String>,
    /// REF view only
    pub cover_date: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
    /// REF view only
    pub citedbycount: Option<String>,
    #[serde(rename = "type")]
    pub ref_type: Option<String>,
    pub text: Option<String>,
    pub fulltext: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sequencebank {
    pub name: Option<String>,
    pub sequence_number: Option<String>,
    #[serde(rename = "type")]
    pub seq_type: Option<String>,
}

/// Start and end date of a conference as (year, month, day)
pub type ConfDate = ((i32, u32, u32), (i32, u32, u32));

/// A Scopus document retrieved through the Abstract Retrieval API
#[derive(Debug, Clone)]
pub struct AbstractRetrieval {
    json: Value,
    view: View,
    cache: CacheInfo,
}

impl AbstractRetrieval {
    /// Retrieve a document by EID, Scopus ID, PII, PubMed ID or DOI
    pub async fn fetch(session: &Session, identifier: &str, options: AbstractOptions) -> Result<Self> {
        check_view(Api::AbstractRetrieval, options.view)?;
        let id_type = match options.id_type {
            Some(id_type) => {
                check_id_type(id_type, &ABSTRACT_ID_TYPES)?;
                id_type
            }
            None => detect_id_type(identifier)?,
        };

        let request = RetrievalRequest::new(Api::AbstractRetrieval, identifier, options.view)
            .id_type(id_type)
            .refresh(options.refresh)
            .params(options.params);
        let retrieved = retrieve(session, &request).await?;
        Ok(Self::from_json(retrieved.json, options.view, retrieved.cache))
    }

    /// Wrap a downloaded response
    pub fn from_json(json: Value, view: View, cache: CacheInfo) -> Self {
        let json = match view {
            View::Meta | View::MetaAbs | View::Ref | View::Full => json
                .get("abstracts-retrieval-response")
                .cloned()
                .unwrap_or(json),
            _ => json,
        };
        Self { json, view, cache }
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

    fn coredata(&self, key: &str) -> Option<String> {
        chained_str(&self.json, &["coredata", key])
    }

    fn head(&self) -> Option<&Value> {
        chained_get(&self.json, &["item", "bibrecord", "head"])
    }

    fn head_get(&self, path: &[&str]) -> Option<&Value> {
        self.head().and_then(|h| chained_get(h, path))
    }

    fn head_str(&self, path: &[&str]) -> Option<String> {
        self.head().and_then(|h| chained_str(h, path))
    }

    fn confevent(&self) -> Option<&Value> {
        self.head_get(&["source", "additional-srcinfo", "conferenceinfo", "confevent"])
    }

    fn bibliography(&self) -> Option<&Value> {
        if self.view == View::Ref {
            chained_get(&self.json, &["references"])
        } else {
            chained_get(&self.json, &["item", "bibrecord", "tail", "bibliography"])
        }
    }

    /// Abstract of the document; try `description` when empty
    pub fn abstract_text(&self) -> Option<String> {
        self.head_get(&["abstracts"]).and_then(text_of)
    }

    pub fn affiliation(&self) -> Option<Vec<Affiliation>> {
        let out = listify_opt(self.json.get("affiliation"))
            .into_iter()
            .map(|item| Affiliation {
                id: make_int_opt(item.get("@id")),
                name: get_str(item, "affilname"),
                city: get_str(item, "affiliation-city"),
                country: get_str(item, "affiliation-country"),
            })
            .collect();
        some_vec(out)
    }

    pub fn aggregation_type(&self) -> Option<String> {
        self.coredata("prism:aggregationType")
    }

    /// Author-provided keywords
    pub fn authkeywords(&self) -> Option<Vec<String>> {
        let keywords = chained_get(&self.json, &["authkeywords", "author-keyword"]);
        some_vec(texts(keywords))
    }

    /// Authors and collaborations organized by affiliation.
    /// `given_name` falls back to the initials.
    pub fn authorgroup(&self) -> Option<Vec<GroupMember>> {
        let mut out = Vec::new();
        for item in listify_opt(self.head_get(&["author-group"])) {
            let aff = item.get("affiliation").unwrap_or(&Value::Null);
            let affiliation_id = make_int_opt(aff.get("@afid"));
            let dptid = make_int_opt(aff.get("@dptid"));
            let organization = organization(aff, ", ");

            for author in listify_opt(item.get("author")) {
                out.push(GroupMember {
                    affiliation_id,
                    dptid,
                    organization: organization.clone(),
                    city: get_str(aff, "city"),
                    postalcode: get_str(aff, "postal-code"),
                    addresspart: get_str(aff, "address-part"),
                    country: get_str(aff, "country"),
                    auid: make_int_opt(author.get("@auid")),
                    orcid: get_str(author, "@orcid"),
                    surname: get_str(author, "ce:surname"),
                    given_name: get_str(author, "ce:given-name")
                        .or_else(|| get_str(author, "ce:initials")),
                    indexed_name: chained_str(author, &["preferred-name", "ce:indexed-name"]),
                    ..Default::default()
                });
            }
            for collaboration in listify_opt(item.get("collaboration")) {
                out.push(GroupMember {
                    collaboration_id: get_str(collaboration, "@collaboration-instance-id"),
                    indexed_name: get_str(collaboration, "ce:indexed-name"),
                    ..Default::default()
                });
            }
        }
        some_vec(out)
    }

    /// Authors with the affiliation Scopus determined as main one
    pub fn authors(&self) -> Option<Vec<Author>> {
        let out = listify_opt(chained_get(&self.json, &["authors", "author"]))
            .into_iter()
            .map(|item| {
                let ids: Option<Vec<String>> = listify_opt(item.get("affiliation"))
                    .into_iter()
                    .map(|a| get_str(a, "@id"))
                    .collect();
                Author {
                    auid: make_int_opt(item.get("@auid")),
                    surname: get_str(item, "ce:surname"),
                    indexed_name: get_str(item, "ce:indexed-name"),
                    affiliation: ids.filter(|ids| !ids.is_empty()).map(|ids| ids.join(";")),
                    given_name: chained_str(item, &["preferred-name", "ce:given-name"]),
                }
            })
            .collect();
        some_vec(out)
    }

    pub fn citedby_count(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "citedby-count"]))
    }

    /// Scopus page listing citing documents
    pub fn citedby_link(&self) -> Option<String> {
        get_link(&self.json, 2)
    }

    pub fn chemicals(&self) -> Option<Vec<Chemical>> {
        let mut out = Vec::new();
        for group in listify_opt(self.head_get(&["enhancement", "chemicalgroup", "chemicals"])) {
            for chem in listify_opt(group.get("chemical")) {
                let number = match chem.get("cas-registry-number") {
                    Some(Value::Array(numbers)) => Some(
                        numbers
                            .iter()
                            .filter_map(text_of)
                            .collect::<Vec<_>>()
                            .join(";"),
                    ),
                    Some(other) => text_of(other),
                    None => None,
                };
                out.push(Chemical {
                    source: get_str(group, "@source"),
                    chemical_name: chem.get("chemical-name").and_then(text_of),
                    cas_registry_number: number,
                });
            }
        }
        some_vec(out)
    }

    pub fn confcode(&self) -> Option<i64> {
        make_int_opt(self.confevent().and_then(|c| c.get("confcode")))
    }

    pub fn confdate(&self) -> Option<ConfDate> {
        let dates = self.confevent()?.get("confdate")?;
        let date = |key: &str| -> Option<(i32, u32, u32)> {
            let d = dates.get(key)?;
            Some((
                make_int_opt(d.get("@year"))? as i32,
                make_int_opt(d.get("@month"))? as u32,
                make_int_opt(d.get("@day"))? as u32,
            ))
        };
        Some((date("startdate")?, date("enddate")?))
    }

    pub fn conflocation(&self) -> Option<String> {
        self.confevent()
            .and_then(|c| chained_get(c, &["conflocation", "city-group"]))
            .and_then(text_of)
    }

    pub fn confname(&self) -> Option<String> {
        self.confevent().and_then(|c| get_str(c, "confname"))
    }

    pub fn confsponsor(&self) -> Option<Vec<String>> {
        let sponsors = self
            .confevent()
            .and_then(|c| chained_get(c, &["confsponsors", "confsponsor"]));
        some_vec(texts(sponsors))
    }

    /// Contributors compiled by Scopus
    pub fn contributor_group(&self) -> Option<Vec<Contributor>> {
        let out = listify_opt(self.head_get(&["source", "contributor-group"]))
            .into_iter()
            .map(|item| {
                let entry = item.get("contributor").unwrap_or(&Value::Null);
                Contributor {
                    given_name: get_str(entry, "ce:given-name"),
                    initials: get_str(entry, "ce:initials"),
                    surname: get_str(entry, "ce:surname"),
                    indexed_name: get_str(entry, "ce:indexed-name"),
                    role: get_str(entry, "@role"),
                }
            })
            .collect();
        some_vec(out)
    }

    pub fn copyright(&self) -> Option<String> {
        chained_str(&self.json, &["item", "bibrecord", "item-info", "copyright", "$"])
    }

    pub fn copyright_type(&self) -> Option<String> {
        chained_str(&self.json, &["item", "bibrecord", "item-info", "copyright", "@type"])
    }

    /// Authors for correspondence; multiple organizations are joined on `; `
    pub fn correspondence(&self) -> Option<Vec<Correspondence>> {
        let out = listify_opt(self.head_get(&["correspondence"]))
            .into_iter()
            .map(|item| {
                let aff = item.get("affiliation").unwrap_or(&Value::Null);
                Correspondence {
                    surname: chained_str(item, &["person", "ce:surname"]),
                    initials: chained_str(item, &["person", "ce:initials"]),
                    organization: organization(aff, "; "),
                    country: get_str(aff, "country"),
                    city_group: aff.get("city-group").and_then(text_of),
                }
            })
            .collect();
        some_vec(out)
    }

    pub fn cover_date(&self) -> Option<String> {
        self.coredata("prism:coverDate")
    }

    pub fn date_created(&self) -> Option<(i32, u32, u32)> {
        chained_get(&self.json, &["item", "bibrecord", "item-info", "history"])
            .and_then(parse_date_created)
    }

    /// Description of the document; try `abstract_text` when empty
    pub fn description(&self) -> Option<String> {
        self.coredata("dc:description")
    }

    /// Only present in the ENTITLED view
    pub fn document_entitlement_status(&self) -> Option<String> {
        chained_str(&self.json, &["document-entitlement", "status"])
    }

    pub fn doi(&self) -> Option<String> {
        self.coredata("prism:doi")
    }

    pub fn eid(&self) -> Option<String> {
        self.coredata("eid")
    }

    pub fn ending_page(&self) -> Option<String> {
        non_empty(self.coredata("prism:endingPage"))
            .or_else(|| self.head_str(&["source", "volisspag", "pagerange", "@last"]))
    }

    pub fn funding(&self) -> Option<Vec<Funding>> {
        let path = ["item", "xocs:meta", "xocs:funding-list", "xocs:funding"];
        let out = listify_opt(chained_get(&self.json, &path))
            .into_iter()
            .map(|item| {
                let funding_id = match item.get("xocs:funding-id") {
                    Some(Value::Array(ids)) => some_vec(ids.iter().filter_map(text_of).collect()),
                    Some(Value::Null) | None => None,
                    Some(single) => text_of(single).map(|id| vec![id]),
                };
                Funding {
                    agency: get_str(item, "xocs:funding-agency"),
                    agency_id: get_str(item, "xocs:funding-agency-id"),
                    string: get_str(item, "xocs:funding-agency-matched-string"),
                    funding_id,
                    acronym: get_str(item, "xocs:funding-agency-acronym"),
                    country: get_str(item, "xocs:funding-agency-country"),
                }
            })
            .collect();
        some_vec(out)
    }

    /// Raw text from which Scopus derives funding information
    pub fn funding_text(&self) -> Option<String> {
        let path = ["item", "xocs:meta", "xocs:funding-list", "xocs:funding-text"];
        chained_get(&self.json, &path).and_then(text_of)
    }

    pub fn isbn(&self) -> Option<Vec<String>> {
        some_vec(texts(self.head_get(&["source", "isbn"])))
    }

    /// Print and electronic ISSN. The META view only carries the print one;
    /// use FULL for both.
    pub fn issn(&self) -> Option<Issn> {
        let mut container: BTreeMap<String, String> = BTreeMap::new();
        for t in listify_opt(self.head_get(&["source", "issn"])) {
            match (get_str(t, "@type"), get_str(t, "$")) {
                (Some(kind), Some(value)) => {
                    container.insert(kind, value);
                }
                _ => {
                    if let Some(value) = text_of(t) {
                        container.insert("print".to_string(), value);
                    }
                }
            }
        }

        if let Some(fallback) = non_empty(self.coredata("prism:issn")) {
            if container.len() < 2 {
                let parts: Vec<&str> = fallback.split_whitespace().collect();
                if parts.len() == 2 {
                    if container.len() == 1 {
                        for (missing, known) in [("electronic", "print"), ("print", "electronic")] {
                            if container.contains_key(missing) {
                                continue;
                            }
                            let Some(known_value) = container.get(known).cloned() else {
                                continue;
                            };
                            if let Some(other) = parts.iter().find(|p| **p != known_value) {
                                container.insert(missing.to_string(), other.to_string());
                            }
                        }
                    }
                } else if let Some(first) = parts.first() {
                    container.insert("print".to_string(), first.to_string());
                }
            }
        }

        if container.is_empty() {
            return None;
        }
        Some(Issn {
            print: container.get("print").cloned(),
            electronic: container.get("electronic").cloned(),
        })
    }

    /// Scopus ID of the document (EID without `2-s2.0-`)
    pub fn identifier(&self) -> Option<i64> {
        get_id(&self.json)
    }

    pub fn idxterms(&self) -> Option<Vec<String>> {
        some_vec(texts(chained_get(&self.json, &["idxterms", "mainterm"])))
    }

    pub fn issue_identifier(&self) -> Option<String> {
        self.coredata("prism:issueIdentifier")
    }

    pub fn issuetitle(&self) -> Option<String> {
        self.head_str(&["source", "issuetitle"])
    }

    pub fn language(&self) -> Option<String> {
        chained_str(&self.json, &["language", "@xml:lang"])
    }

    /// Open access status encoded in a single digit
    pub fn openaccess(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "openaccess"]))
    }

    pub fn openaccess_flag(&self) -> Option<bool> {
        non_empty(self.coredata("openaccessFlag")).map(|flag| flag == "true")
    }

    pub fn page_range(&self) -> Option<String> {
        non_empty(self.coredata("prism:pageRange"))
            .or_else(|| self.head_str(&["source", "volisspag", "pages"]))
    }

    pub fn pii(&self) -> Option<String> {
        self.coredata("pii")
    }

    pub fn publication_name(&self) -> Option<String> {
        self.coredata("prism:publicationName")
    }

    /// Publisher; the FULL view is more complete
    pub fn publisher(&self) -> Option<String> {
        self.head_str(&["source", "publisher", "publishername"])
            .or_else(|| self.coredata("dc:publisher"))
    }

    pub fn publisher_address(&self) -> Option<String> {
        self.head_str(&["source", "publisher", "publisheraddress"])
    }

    pub fn pubmed_id(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "pubmed-id"]))
    }

    /// Number of references; needs the REF or FULL view
    pub fn refcount(&self) -> Option<i64> {
        let refs = self.bibliography()?;
        make_int_opt(refs.get("@total-references")).or_else(|| make_int_opt(refs.get("@refcount")))
    }

    /// References listed in the document; needs the REF or FULL view.
    /// Specific fields can be empty even when `refcount` is positive.
    pub fn references(&self) -> Option<Vec<Reference>> {
        let refs = self.bibliography()?;
        let full = self.view == View::Full;
        let mut out = Vec::new();

        for item in listify_opt(refs.get("reference")) {
            if !item.is_object() {
                continue;
            }
            let info = item.get("ref-info").unwrap_or(item);
            let volisspag = first_of(info.get("volisspag"));
            let volis = volisspag.and_then(|v| first_of(v.get("voliss")));
            let pagerange = volisspag.and_then(|v| v.get("pagerange"));

            let (authors, auids, affids, doi, scopus_id) = if full {
                let names: Vec<String> = listify_opt(chained_get(info, &["ref-authors", "author"]))
                    .into_iter()
                    .map(|a| join_present(&[get_str(a, "ce:surname"), get_str(a, "ce:initials")]))
                    .collect();
                let ids = listify_opt(chained_get(info, &["refd-itemidlist", "itemid"]));
                (
                    names,
                    None,
                    None,
                    select_by_idtype(&ids, "DOI"),
                    select_by_idtype(&ids, "SGR"),
                )
            } else {
                let list: Vec<Value> = listify_opt(chained_get(info, &["author-list", "author"]))
                    .into_iter()
                    .cloned()
                    .collect();
                let list = deduplicate(&list);
                let names = list
                    .iter()
                    .map(|a| join_present(&[get_str(a, "ce:surname"), get_str(a, "ce:given-name")]))
                    .collect();
                let auids: Vec<String> = list.iter().filter_map(|a| get_str(a, "@auid")).collect();
                let affids: Vec<String> = list
                    .iter()
                    .filter_map(|a| a.get("affiliation"))
                    .filter_map(|aff| get_str(aff, "@id"))
                    .collect();
                (
                    names,
                    non_empty(Some(auids.join("; "))),
                    non_empty(Some(affids.join("; "))),
                    get_str(info, "ce:doi"),
                    get_str(info, "scopus-id"),
                )
            };

            out.push(Reference {
                position: get_str(item, "@id"),
                id: scopus_id,
                doi,
                title: chained_get(info, &["ref-title", "ref-titletext"])
                    .and_then(text_of)
                    .or_else(|| info.get("title").and_then(text_of)),
                authors: authors.join("; "),
                authors_auid: auids,
                authors_affiliationid: affids,
                sourcetitle: get_str(info, "ref-sourcetitle").or_else(|| get_str(info, "sourcetitle")),
                publicationyear: chained_str(info, &["ref-publicationyear", "@first"]),
                cover_date: get_str(info, "prism:coverDate"),
                volume: volis.and_then(|v| get_str(v, "@volume")),
                issue: volis.and_then(|v| get_str(v, "@issue")),
                first: pagerange.and_then(|p| get_str(p, "@first")),
                last: pagerange.and_then(|p| get_str(p, "@last")),
                citedbycount: get_str(info, "citedby-count"),
                ref_type: get_str(info, "type"),
                text: info.get("ref-text").and_then(text_of),
                fulltext: item.get("ref-fulltext").and_then(text_of),
            });
        }
        some_vec(out)
    }

    /// Document page on Scopus
    pub fn scopus_link(&self) -> Option<String> {
        get_link(&self.json, 1)
    }

    /// API page of this document
    pub fn self_link(&self) -> Option<String> {
        get_link(&self.json, 0)
    }

    /// Biological entities defined or mentioned in the text
    pub fn sequencebank(&self) -> Option<Vec<Sequencebank>> {
        let mut out = Vec::new();
        for item in listify_opt(self.head_get(&["enhancement", "sequencebanks", "sequencebank"])) {
            for number in listify_opt(item.get("sequence-number")) {
                out.push(Sequencebank {
                    name: get_str(item, "@name"),
                    sequence_number: get_str(number, "$"),
                    seq_type: get_str(number, "@type"),
                });
            }
        }
        some_vec(out)
    }

    pub fn source_id(&self) -> Option<i64> {
        make_int_opt(chained_get(&self.json, &["coredata", "source-id"]))
    }

    /// Needs the FULL view
    pub fn sourcetitle_abbreviation(&self) -> Option<String> {
        self.head_str(&["source", "sourcetitle-abbrev"])
    }

    /// Short form of `aggregation_type`
    pub fn srctype(&self) -> Option<String> {
        self.coredata("srctype")
    }

    pub fn starting_page(&self) -> Option<String> {
        non_empty(self.coredata("prism:startingPage"))
            .or_else(|| self.head_str(&["source", "volisspag", "pagerange", "@first"]))
    }

    /// Needs the FULL view
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

    pub fn subtype(&self) -> Option<String> {
        non_empty(self.coredata("subtype"))
    }

    pub fn subtype_description(&self) -> Option<String> {
        non_empty(self.coredata("subtypeDescription"))
    }

    pub fn title(&self) -> Option<String> {
        self.coredata("dc:title")
    }

    /// API URL of the document
    pub fn url(&self) -> Option<String> {
        self.coredata("prism:url")
    }

    pub fn volume(&self) -> Option<String> {
        self.coredata("prism:volume")
    }

    /// Website of the publisher
    pub fn website(&self) -> Option<String> {
        self.head_str(&["source", "website", "ce:e-address", "$"])
    }
}

/// Organization of an affiliation: a string, `{"$": ..}` or a list of those
fn organization(aff: &Value, separator: &str) -> Option<String> {
    match aff.get("organization")? {
        Value::Array(orgs) => Some(
            orgs.iter()
                .filter_map(text_of)
                .collect::<Vec<_>>()
                .join(separator),
        ),
        other => text_of(other),
    }
}

/// First element when a list is given
fn first_of(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}

fn join_present(parts: &[Option<String>]) -> String {
    parts
        .iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_by_idtype(ids: &[&Value], id_type: &str) -> Option<String> {
    ids.iter()
        .find(|d| get_str(d, "@idtype").as_deref() == Some(id_type))
        .and_then(|d| get_str(d, "$"))
}

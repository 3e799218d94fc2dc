//! AffiliationSearch - Affiliation profiles matching a query

use crate::search_options::{SearchBase, SearchOptions};
use engine::{SearchQuery, Session};
use serde::Serialize;
use serde_json::Value;
use shared::parse::{get_str, html_unescape, html_unescape_opt, listify_opt, make_int_opt};
use shared::{check_view, Api, Record, Result, View};
use std::fmt;

/// An affiliation found by [`AffiliationSearch`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliationResult {
    pub eid: Option<String>,
    pub name: Option<String>,
    /// Other spellings of the name joined on `;`
    pub variant: String,
    pub documents: Option<i64>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Record for AffiliationResult {
    const FIELDS: &'static [&'static str] =
        &["eid", "name", "variant", "documents", "city", "country"];
}

/// Search results of the Affiliation Search API
#[derive(Debug, Clone)]
pub struct AffiliationSearch {
    base: SearchBase,
}

impl AffiliationSearch {
    /// Run `query`, e.g. `AF-ID(60021784)`. Fails before downloading
    /// anything when the query matches more than 5000 affiliations.
    pub async fn fetch(
        session: &Session,
        query: impl Into<SearchQuery>,
        options: SearchOptions,
    ) -> Result<Self> {
        let view = options.view.unwrap_or(View::Standard);
        check_view(Api::AffiliationSearch, view)?;
        let base =
            SearchBase::run(session, Api::AffiliationSearch, query.into(), view, false, options)
                .await?;
        Ok(Self { base })
    }

    /// Parsed affiliations
    pub fn results(&self) -> Result<Option<Vec<AffiliationResult>>> {
        self.base.check_fields::<AffiliationResult>()?;
        let affiliations = self.base.searched.results.iter().map(parse_affiliation).collect();
        self.base.finish(affiliations)
    }

    pub fn get_results_size(&self) -> usize {
        self.base.searched.total
    }
}

impl fmt::Display for AffiliationSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .base
            .searched
            .results
            .iter()
            .filter_map(|item| get_str(item, "affiliation-name"))
            .collect();
        f.write_str(&self.base.summary("affiliation", &names))
    }
}

fn parse_affiliation(item: &Value) -> AffiliationResult {
    let name = get_str(item, "affiliation-name");
    let variants: Vec<String> = listify_opt(item.get("name-variant"))
        .into_iter()
        .map(|d| get_str(d, "$").unwrap_or_default())
        .filter(|v| Some(v) != name.as_ref())
        .map(|v| html_unescape(&v))
        .collect();

    AffiliationResult {
        eid: get_str(item, "eid"),
        variant: variants.join(";"),
        documents: make_int_opt(item.get("document-count")),
        name: html_unescape_opt(name),
        city: get_str(item, "city"),
        country: get_str(item, "country"),
    }
}

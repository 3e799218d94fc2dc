//! Catalogue of the supported Elsevier APIs

use crate::error::{BiblioError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Base URL of all retrieval APIs
pub const RETRIEVAL_BASE: &str = "https://api.elsevier.com/content/";

/// Base URL of all search APIs
pub const SEARCH_BASE: &str = "https://api.elsevier.com/content/search/";

/// Maximum number of entries a search without cursor can return
pub const SEARCH_MAX_ENTRIES: usize = 5000;

/// A supported API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Api {
    AbstractRetrieval,
    AuthorRetrieval,
    AuthorSearch,
    AffiliationSearch,
    ScopusSearch,
    ArticleEntitlement,
}

/// Database an API belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    Scopus,
    ScienceDirect,
}

impl Database {
    pub fn as_str(&self) -> &'static str {
        match self {
            Database::Scopus => "Scopus",
            Database::ScienceDirect => "ScienceDirect",
        }
    }
}

impl Api {
    /// All supported APIs
    pub const ALL: [Api; 6] = [
        Api::AbstractRetrieval,
        Api::AuthorRetrieval,
        Api::AuthorSearch,
        Api::AffiliationSearch,
        Api::ScopusSearch,
        Api::ArticleEntitlement,
    ];

    /// Name as used in the configuration file
    pub fn name(&self) -> &'static str {
        match self {
            Api::AbstractRetrieval => "AbstractRetrieval",
            Api::AuthorRetrieval => "AuthorRetrieval",
            Api::AuthorSearch => "AuthorSearch",
            Api::AffiliationSearch => "AffiliationSearch",
            Api::ScopusSearch => "ScopusSearch",
            Api::ArticleEntitlement => "ArticleEntitlement",
        }
    }

    /// Look up an API by its configuration name
    pub fn from_name(name: &str) -> Option<Api> {
        Api::ALL.into_iter().find(|api| api.name() == name)
    }

    /// Database serving this API
    pub fn database(&self) -> Database {
        match self {
            Api::ArticleEntitlement => Database::ScienceDirect,
            _ => Database::Scopus,
        }
    }

    /// Endpoint URL (identifiers are appended for retrievals)
    pub fn url(&self) -> String {
        match self {
            Api::AbstractRetrieval => format!("{RETRIEVAL_BASE}abstract/"),
            Api::AuthorRetrieval => format!("{RETRIEVAL_BASE}author/author_id/"),
            Api::ArticleEntitlement => format!("{RETRIEVAL_BASE}article/entitlement/"),
            Api::AuthorSearch => format!("{SEARCH_BASE}author"),
            Api::AffiliationSearch => format!("{SEARCH_BASE}affiliation"),
            Api::ScopusSearch => format!("{SEARCH_BASE}scopus"),
        }
    }

    /// Allowed views
    pub fn views(&self) -> &'static [View] {
        match self {
            Api::AbstractRetrieval => &[
                View::Meta,
                View::MetaAbs,
                View::Ref,
                View::Full,
                View::Entitled,
            ],
            Api::AuthorRetrieval => &[
                View::Light,
                View::Standard,
                View::Enhanced,
                View::Metrics,
                View::Entitled,
            ],
            Api::AuthorSearch | Api::AffiliationSearch => &[View::Standard],
            Api::ScopusSearch => &[View::Standard, View::Complete],
            Api::ArticleEntitlement => &[View::Full, View::Standard],
        }
    }

    /// Maximum number of requests per second
    pub fn rate_limit(&self) -> usize {
        match self {
            Api::AbstractRetrieval => 9,
            Api::AuthorRetrieval => 3,
            Api::AuthorSearch => 2,
            Api::AffiliationSearch => 6,
            Api::ScopusSearch => 9,
            Api::ArticleEntitlement => 10,
        }
    }

    /// Entries per page for search APIs
    pub fn page_size(&self, view: View) -> Option<usize> {
        match (self, view) {
            (Api::ScopusSearch, View::Complete) => Some(25),
            (Api::ScopusSearch, View::Standard) => Some(200),
            (Api::AuthorSearch | Api::AffiliationSearch, View::Standard) => Some(200),
            _ => None,
        }
    }

    /// Whether the identifier type is part of the retrieval URL
    pub fn uses_id_type(&self) -> bool {
        matches!(self, Api::AbstractRetrieval | Api::ArticleEntitlement)
    }

    /// Whether this is a search API
    pub fn is_search(&self) -> bool {
        matches!(self, Api::AuthorSearch | Api::AffiliationSearch | Api::ScopusSearch)
    }

    /// Directory name below the database cache folder
    pub fn snake_name(&self) -> &'static str {
        match self {
            Api::AbstractRetrieval => "abstract_retrieval",
            Api::AuthorRetrieval => "author_retrieval",
            Api::AuthorSearch => "author_search",
            Api::AffiliationSearch => "affiliation_search",
            Api::ScopusSearch => "scopus_search",
            Api::ArticleEntitlement => "article_entitlement",
        }
    }

    /// Default cache directory
    pub fn default_dir(&self) -> PathBuf {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        base.join("biblio")
            .join(self.database().as_str())
            .join(self.snake_name())
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A view selects which fields the API returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    Meta,
    MetaAbs,
    Ref,
    Full,
    Entitled,
    Light,
    Standard,
    Enhanced,
    Metrics,
    Complete,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Meta => "META",
            View::MetaAbs => "META_ABS",
            View::Ref => "REF",
            View::Full => "FULL",
            View::Entitled => "ENTITLED",
            View::Light => "LIGHT",
            View::Standard => "STANDARD",
            View::Enhanced => "ENHANCED",
            View::Metrics => "METRICS",
            View::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = BiblioError;

    fn from_str(s: &str) -> Result<Self> {
        let view = match s.to_ascii_uppercase().as_str() {
            "META" => View::Meta,
            "META_ABS" => View::MetaAbs,
            "REF" => View::Ref,
            "FULL" => View::Full,
            "ENTITLED" => View::Entitled,
            "LIGHT" => View::Light,
            "STANDARD" => View::Standard,
            "ENHANCED" => View::Enhanced,
            "METRICS" => View::Metrics,
            "COMPLETE" => View::Complete,
            _ => {
                return Err(BiblioError::invalid_parameter(
                    "view",
                    &[
                        "META", "META_ABS", "REF", "FULL", "ENTITLED", "LIGHT", "STANDARD",
                        "ENHANCED", "METRICS", "COMPLETE",
                    ],
                ))
            }
        };
        Ok(view)
    }
}

/// Fail unless `view` is allowed for `api`
pub fn check_view(api: Api, view: View) -> Result<()> {
    if api.views().contains(&view) {
        return Ok(());
    }
    let allowed: Vec<&str> = api.views().iter().map(|v| v.as_str()).collect();
    Err(BiblioError::invalid_parameter("view", &allowed))
}

/// Fail unless `value` is one of `allowed`
pub fn check_parameter_value(value: &str, allowed: &[&str], name: &str) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(BiblioError::invalid_parameter(name, allowed))
    }
}

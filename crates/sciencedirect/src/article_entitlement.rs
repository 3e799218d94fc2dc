//! ArticleEntitlement - Whether the requester may read a ScienceDirect document

use engine::{retrieve, CacheInfo, Refresh, RetrievalRequest, Session};
use serde_json::Value;
use shared::parse::{chained_get, chained_str, get_str};
use shared::{check_id_type, check_view, detect_id_type, Api, IdType, Result, View};
use std::fmt;

/// Identifier types accepted by the Article Entitlement API
pub const ENTITLEMENT_ID_TYPES: [IdType; 6] = [
    IdType::Eid,
    IdType::Pii,
    IdType::ScopusId,
    IdType::PubmedId,
    IdType::Doi,
    IdType::Pui,
];

/// Options for [`ArticleEntitlement::fetch`]
#[derive(Debug, Clone)]
pub struct EntitlementOptions {
    pub view: View,
    /// Detected from the identifier when absent
    pub id_type: Option<IdType>,
    pub refresh: Refresh,
    pub params: Vec<(String, String)>,
}

impl Default for EntitlementOptions {
    fn default() -> Self {
        Self {
            view: View::Full,
            id_type: None,
            refresh: Refresh::Never,
            params: Vec::new(),
        }
    }
}

/// Entitlement status of a document
#[derive(Debug, Clone)]
pub struct ArticleEntitlement {
    json: Value,
    cache: CacheInfo,
}

impl ArticleEntitlement {
    pub async fn fetch(
        session: &Session,
        identifier: &str,
        options: EntitlementOptions,
    ) -> Result<Self> {
        check_view(Api::ArticleEntitlement, options.view)?;
        let id_type = match options.id_type {
            Some(id_type) => {
                check_id_type(id_type, &ENTITLEMENT_ID_TYPES)?;
                id_type
            }
            None => detect_id_type(identifier)?,
        };

        let request = RetrievalRequest::new(Api::ArticleEntitlement, identifier, options.view)
            .id_type(id_type)
            .refresh(options.refresh)
            .params(options.params);
        let retrieved = retrieve(session, &request).await?;
        Ok(Self::from_json(retrieved.json, retrieved.cache))
    }

    pub fn from_json(json: Value, cache: CacheInfo) -> Self {
        let json = chained_get(&json, &["entitlement-response", "document-entitlement"])
            .cloned()
            .unwrap_or(Value::Null);
        Self { json, cache }
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn cache(&self) -> &CacheInfo {
        &self.cache
    }

    /// Whether the document was found
    pub fn status(&self) -> Option<String> {
        get_str(&self.json, "@status")
    }

    pub fn identifier(&self) -> Option<String> {
        get_str(&self.json, "dc:identifier")
    }

    pub fn eid(&self) -> Option<String> {
        get_str(&self.json, "eid")
    }

    pub fn entitled(&self) -> Option<String> {
        get_str(&self.json, "entitled")
    }

    /// Canonical ScienceDirect URL
    pub fn link(&self) -> Option<String> {
        chained_str(&self.json, &["link", "@href"])
    }

    pub fn message(&self) -> Option<String> {
        get_str(&self.json, "message")
    }

    pub fn pii(&self) -> Option<String> {
        get_str(&self.json, "pii")
    }

    pub fn pii_norm(&self) -> Option<String> {
        get_str(&self.json, "pii-norm")
    }

    pub fn doi(&self) -> Option<String> {
        get_str(&self.json, "prism:doi")
    }

    /// Only when requested by PubMed ID
    pub fn pubmed_id(&self) -> Option<String> {
        get_str(&self.json, "pubmed_id")
    }

    /// API URL used for the check
    pub fn url(&self) -> Option<String> {
        get_str(&self.json, "prism:url")
    }

    /// Only when requested by Scopus ID
    pub fn scopus_id(&self) -> Option<String> {
        get_str(&self.json, "scopus_id")
    }
}

impl fmt::Display for ArticleEntitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with doi: {}",
            self.message().unwrap_or_default(),
            self.doi().unwrap_or_default()
        )
    }
}

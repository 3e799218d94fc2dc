//! Document identifier types

use crate::error::{BiblioError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    Eid,
    Pii,
    ScopusId,
    PubmedId,
    Doi,
    Pui,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Eid => "eid",
            IdType::Pii => "pii",
            IdType::ScopusId => "scopus_id",
            IdType::PubmedId => "pubmed_id",
            IdType::Doi => "doi",
            IdType::Pui => "pui",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdType {
    type Err = BiblioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eid" => Ok(IdType::Eid),
            "pii" => Ok(IdType::Pii),
            "scopus_id" => Ok(IdType::ScopusId),
            "pubmed_id" => Ok(IdType::PubmedId),
            "doi" => Ok(IdType::Doi),
            "pui" => Ok(IdType::Pui),
            _ => Err(BiblioError::invalid_parameter(
                "id_type",
                &["eid", "pii", "scopus_id", "pubmed_id", "doi", "pui"],
            )),
        }
    }
}

/// Guess the identifier type from its shape
pub fn detect_id_type(sid: &str) -> Result<IdType> {
    if !sid.is_empty() && sid.chars().all(|c| c.is_ascii_digit()) {
        // Scopus IDs have at least ten digits
        return Ok(if sid.len() < 10 {
            IdType::PubmedId
        } else {
            IdType::ScopusId
        });
    }
    if sid.starts_with("2-s2.0-") {
        Ok(IdType::Eid)
    } else if sid.contains('/') || sid.contains('.') {
        Ok(IdType::Doi)
    } else if (16..=17).contains(&sid.len()) {
        Ok(IdType::Pii)
    } else {
        Err(BiblioError::IdDetection(sid.to_string()))
    }
}

/// Fail unless `id_type` is among `allowed`
pub fn check_id_type(id_type: IdType, allowed: &[IdType]) -> Result<()> {
    if allowed.contains(&id_type) {
        return Ok(());
    }
    let names: Vec<&str> = allowed.iter().map(|t| t.as_str()).collect();
    Err(BiblioError::invalid_parameter("id_type", &names))
}

//! Completeness checks for parsed search results

use crate::error::{BiblioError, Result};
use serde::Serialize;
use std::str::FromStr;

/// A parsed result record with a fixed set of named fields
pub trait Record: Serialize {
    /// Field names in declaration order
    const FIELDS: &'static [&'static str];
}

/// What to do when a checked field is incomplete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityAction {
    /// Fail with an integrity error
    #[default]
    Raise,
    /// Log a warning and carry on
    Warn,
}

impl FromStr for IntegrityAction {
    type Err = BiblioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raise" => Ok(IntegrityAction::Raise),
            "warn" => Ok(IntegrityAction::Warn),
            _ => Err(BiblioError::invalid_parameter("integrity_action", &["warn", "raise"])),
        }
    }
}

/// Fail if any of `needles` is not a field of the record type
pub fn check_field_consistency(needles: &[String], fields: &[&str]) -> Result<()> {
    let mut wrong: Vec<&str> = needles
        .iter()
        .map(String::as_str)
        .filter(|n| !fields.contains(n))
        .collect();
    if wrong.is_empty() {
        return Ok(());
    }
    wrong.sort_unstable();
    wrong.dedup();
    Err(BiblioError::Integrity(format!(
        "Element(s) '{}' not allowed in parameter integrity_fields",
        wrong.join(", ")
    )))
}

/// Act on records whose checked fields contain a missing value
pub fn check_integrity<R: Record>(
    records: &[R],
    fields: &[String],
    action: IntegrityAction,
) -> Result<()> {
    for field in fields {
        let incomplete = records.iter().any(|r| {
            serde_json::to_value(r)
                .ok()
                .and_then(|v| v.get(field.as_str()).map(|f| f.is_null()))
                .unwrap_or(true)
        });
        if !incomplete {
            continue;
        }
        let msg = format!(
            "Parsed information doesn't pass integrity check because of \
             incomplete information in field '{field}'"
        );
        match action {
            IntegrityAction::Raise => return Err(BiblioError::Integrity(msg)),
            IntegrityAction::Warn => tracing::warn!("{}", msg),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        eid: Option<String>,
        name: Option<String>,
    }

    impl Record for Row {
        const FIELDS: &'static [&'static str] = &["eid", "name"];
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { eid: Some("1".into()), name: Some("a".into()) },
            Row { eid: Some("2".into()), name: None },
        ]
    }

    #[test]
    fn test_field_consistency_ok() {
        assert!(check_field_consistency(&["eid".to_string()], Row::FIELDS).is_ok());
    }

    #[test]
    fn test_field_consistency_reports_sorted_unknown_fields() {
        let needles = vec!["zeta".to_string(), "alpha".to_string(), "eid".to_string()];
        let err = check_field_consistency(&needles, Row::FIELDS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Element(s) 'alpha, zeta' not allowed in parameter integrity_fields"
        );
    }

    #[test]
    fn test_integrity_passes_for_complete_field() {
        assert!(check_integrity(&rows(), &["eid".to_string()], IntegrityAction::Raise).is_ok());
    }

    #[test]
    fn test_integrity_raise() {
        let err = check_integrity(&rows(), &["name".to_string()], IntegrityAction::Raise)
            .unwrap_err();
        assert!(matches!(err, BiblioError::Integrity(_)));
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_integrity_warn_does_not_fail() {
        assert!(check_integrity(&rows(), &["name".to_string()], IntegrityAction::Warn).is_ok());
    }

    #[test]
    fn test_integrity_action_from_str() {
        assert_eq!("warn".parse::<IntegrityAction>().unwrap(), IntegrityAction::Warn);
        assert!("ignore".parse::<IntegrityAction>().is_err());
    }
}

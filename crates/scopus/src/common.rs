//! Record types and helpers used by several Scopus APIs

use serde::Serialize;
use serde_json::Value;
use shared::parse::{get_str, listify_opt, value_str};

/// A subject area with its ASJC code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectArea {
    pub area: Option<String>,
    pub abbreviation: Option<String>,
    pub code: Option<i64>,
}

/// Drop empty strings
pub(crate) fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

/// Text of an element that is either a plain string or `{"$": text}`
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => get_str(value, "$"),
        other => value_str(other),
    }
}

/// Texts of an element that may be repeated
pub(crate) fn texts(value: Option<&Value>) -> Vec<String> {
    listify_opt(value).into_iter().filter_map(text_of).collect()
}

/// `None` for an empty list
pub(crate) fn some_vec<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// First four characters of a date, `----` when absent
pub(crate) fn year_of(date: Option<&str>) -> String {
    date.unwrap_or("----").chars().take(4).collect()
}

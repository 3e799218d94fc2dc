//! Helpers for walking the JSON documents returned by the APIs
//!
//! The APIs render XML as JSON: attributes become `@name` keys, text
//! content becomes `$`, and a repeated element is a list while a single
//! one is an object. These helpers smooth over those quirks.

use serde_json::Value;

/// Follow `path` through nested objects. Missing keys and `null` yield `None`.
pub fn chained_get<'a>(container: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = container;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Like [`chained_get`], rendered as a string
pub fn chained_str(container: &Value, path: &[&str]) -> Option<String> {
    chained_get(container, path).and_then(value_str)
}

/// Scalar JSON value as a string
pub fn value_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// String field of an object
pub fn get_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(value_str)
}

/// Treat a single element and a list of elements alike
pub fn listify(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Like [`listify`] on an optional value
pub fn listify_opt(value: Option<&Value>) -> Vec<&Value> {
    value.map(listify).unwrap_or_default()
}

/// Remove duplicates while preserving order
pub fn deduplicate<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Convert HTML entities, named or numeric, to the characters they stand
/// for. Unknown entities are left untouched.
pub fn html_unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Unescape if `text` is non-empty
pub fn html_unescape_opt(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(|t| html_unescape(&t))
}

/// Keep only ASCII digits
pub fn filter_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Integer from a number or a numeric string
pub fn make_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Like [`make_int`] on an optional value
pub fn make_int_opt(value: Option<&Value>) -> Option<i64> {
    value.and_then(make_int)
}

/// Boolean from `"true"`/`"false"` strings, numbers or booleans
pub fn make_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(s.eq_ignore_ascii_case("true")),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// The `href` of the link at position `idx` of `coredata.link`
pub fn get_link(json: &Value, idx: usize) -> Option<String> {
    get_link_at(json, idx, &["coredata", "link"])
}

/// The `href` of the link at position `idx` below `path`
pub fn get_link_at(json: &Value, idx: usize, path: &[&str]) -> Option<String> {
    let links = chained_get(json, path)?;
    listify(links).get(idx).and_then(|l| get_str(l, "@href"))
}

/// Numeric id from `coredata.dc:identifier` (e.g. `SCOPUS_ID:123`)
pub fn get_id(json: &Value) -> Option<i64> {
    chained_str(json, &["coredata", "dc:identifier"])
        .and_then(|s| s.rsplit(':').next().map(str::to_string))
        .and_then(|s| s.parse().ok())
}

/// Year, month and day of `date-created`
pub fn parse_date_created(json: &Value) -> Option<(i32, u32, u32)> {
    let date = json.get("date-created")?;
    let part = |key: &str| make_int_opt(date.get(key));
    Some((part("@year")? as i32, part("@month")? as u32, part("@day")? as u32))
}

/// Free-to-read labels of a search entry joined on a space
pub fn get_freetoread(item: &Value, path: &[&str]) -> Option<String> {
    let value = chained_get(item, path)?;
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|x| get_str(x, "$")).collect();
            Some(parts.join(" "))
        }
        other => value_str(other),
    }
}

/// Format an integer with `,` as thousands separator
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ============== Lookup Tests ==============

    #[test]
    fn test_chained_get() {
        let doc = json!({"coredata": {"eid": "2-s2.0-1", "none": null}});
        assert_eq!(chained_str(&doc, &["coredata", "eid"]).as_deref(), Some("2-s2.0-1"));
        assert!(chained_get(&doc, &["coredata", "missing"]).is_none());
        assert!(chained_get(&doc, &["coredata", "none"]).is_none());
        assert!(chained_get(&doc, &["coredata", "eid", "deeper"]).is_none());
    }

    #[test]
    fn test_value_str_numbers() {
        assert_eq!(value_str(&json!(12)).as_deref(), Some("12"));
        assert_eq!(value_str(&json!(null)), None);
    }

    #[test]
    fn test_listify() {
        let single = json!({"$": "a"});
        assert_eq!(listify(&single).len(), 1);
        assert_eq!(listify(&json!([1, 2, 3])).len(), 3);
        assert!(listify(&Value::Null).is_empty());
    }

    #[test]
    fn test_deduplicate_keeps_order() {
        assert_eq!(deduplicate(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    // ============== Conversion Tests ==============

    #[test]
    fn test_html_unescape() {
        assert_eq!(html_unescape("R&amp;D"), "R&D");
        assert_eq!(html_unescape("&#228;&#x00FC;"), "äü");
        assert_eq!(html_unescape("&lt;b&gt;"), "<b>");
        assert_eq!(html_unescape("&bogus;"), "&bogus;");
        assert_eq!(html_unescape("no entities"), "no entities");
    }

    #[test]
    fn test_html_unescape_full_entity_table() {
        assert_eq!(
            html_unescape("&beta;-amyloid &Eacute;cole &alpha;-helix &le; &oslash;"),
            "β-amyloid École α-helix ≤ ø"
        );
        assert_eq!(html_unescape("&Omega;&mu;m &plusmn; 0.1&thinsp;K"), "Ωμm ± 0.1\u{2009}K");
    }

    #[test]
    fn test_filter_digits() {
        assert_eq!(filter_digits("SUBJ 1203x"), "1203");
    }

    #[test]
    fn test_make_int() {
        assert_eq!(make_int(&json!("42")), Some(42));
        assert_eq!(make_int(&json!(7)), Some(7));
        assert_eq!(make_int(&json!("n/a")), None);
        assert_eq!(make_int_opt(None), None);
    }

    #[test]
    fn test_make_bool() {
        assert_eq!(make_bool(&json!("TRUE")), Some(true));
        assert_eq!(make_bool(&json!("false")), Some(false));
        assert_eq!(make_bool(&json!(0)), Some(false));
        assert_eq!(make_bool(&json!(null)), None);
    }

    // ============== Document Helper Tests ==============

    #[test]
    fn test_get_link() {
        let doc = json!({"coredata": {"link": [
            {"@href": "self", "@rel": "self"},
            {"@href": "scopus", "@rel": "scopus"}
        ]}});
        assert_eq!(get_link(&doc, 1).as_deref(), Some("scopus"));
        assert_eq!(get_link(&doc, 5), None);
    }

    #[test]
    fn test_get_id() {
        let doc = json!({"coredata": {"dc:identifier": "SCOPUS_ID:85068268027"}});
        assert_eq!(get_id(&doc), Some(85068268027));
        assert_eq!(get_id(&json!({})), None);
    }

    #[test]
    fn test_parse_date_created() {
        let doc = json!({"date-created": {"@year": "2019", "@month": "07", "@day": "3"}});
        assert_eq!(parse_date_created(&doc), Some((2019, 7, 3)));
        assert_eq!(parse_date_created(&json!({})), None);
    }

    #[test]
    fn test_get_freetoread() {
        let item = json!({"freetoread": {"value": [{"$": "all"}, {"$": "repository"}]}});
        assert_eq!(
            get_freetoread(&item, &["freetoread", "value"]).as_deref(),
            Some("all repository")
        );
        assert_eq!(get_freetoread(&json!({}), &["freetoread", "value"]), None);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}

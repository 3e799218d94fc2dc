//! On-disk cache of API responses

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use shared::{Api, Config, Result, View};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 86_400;

/// When to download again instead of reading the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    /// Use the cached file whenever it exists
    #[default]
    Never,
    /// Always download
    Always,
    /// Download when the cached file is older than this many days
    OlderThanDays(u32),
}

impl From<bool> for Refresh {
    fn from(refresh: bool) -> Self {
        if refresh {
            Refresh::Always
        } else {
            Refresh::Never
        }
    }
}

impl Refresh {
    /// Whether the file at `path` must be (re)downloaded
    pub fn needs_refresh(&self, path: &Path) -> bool {
        let Ok(metadata) = std::fs::metadata(path) else {
            return true;
        };
        match self {
            Refresh::Never => false,
            Refresh::Always => true,
            Refresh::OlderThanDays(days) => {
                let age = metadata
                    .modified()
                    .ok()
                    .and_then(|m| SystemTime::now().duration_since(m).ok())
                    .unwrap_or(Duration::ZERO);
                age.as_secs() > u64::from(*days) * SECONDS_PER_DAY
            }
        }
    }
}

/// A search query: free text or a set of field constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Text(String),
    Fields(Vec<(String, String)>),
}

impl SearchQuery {
    /// Query parameters sent to the API
    pub fn params(&self) -> Vec<(String, String)> {
        match self {
            SearchQuery::Text(q) => vec![("query".to_string(), q.clone())],
            SearchQuery::Fields(fields) => fields.clone(),
        }
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchQuery::Text(q) => f.write_str(q),
            SearchQuery::Fields(fields) => {
                let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
                f.write_str(&parts.join("&"))
            }
        }
    }
}

impl From<&str> for SearchQuery {
    fn from(query: &str) -> Self {
        SearchQuery::Text(query.to_string())
    }
}

impl From<String> for SearchQuery {
    fn from(query: String) -> Self {
        SearchQuery::Text(query)
    }
}

/// File name of a cached search: SHA-256 hex of the query
pub fn query_stem(query: &SearchQuery) -> String {
    hex::encode(Sha256::digest(query.to_string().as_bytes()))
}

/// `<dir>/<VIEW>/<identifier with / replaced by _>`
pub fn retrieval_path(config: &Config, api: Api, view: View, identifier: &str) -> PathBuf {
    config
        .directory(api)
        .join(view.as_str())
        .join(identifier.replace('/', "_"))
}

/// `<dir>/<VIEW>/<query_stem>`
pub fn search_path(config: &Config, api: Api, view: View, query: &SearchQuery) -> PathBuf {
    config
        .directory(api)
        .join(view.as_str())
        .join(query_stem(query))
}

/// Location and modification date of a cached file
#[derive(Debug, Clone, PartialEq)]
pub struct CacheInfo {
    pub path: PathBuf,
    pub mdate: DateTime<Local>,
}

impl CacheInfo {
    pub fn from_path(path: &Path) -> Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self {
            path: path.to_path_buf(),
            mdate: DateTime::<Local>::from(modified),
        })
    }

    /// Whole days since the file was written
    pub fn age_days(&self) -> i64 {
        (Local::now() - self.mdate).num_days()
    }

    pub fn mdate_string(&self) -> String {
        self.mdate.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Date part only, as shown in summaries
    pub fn date_string(&self) -> String {
        self.mdate.format("%Y-%m-%d").to_string()
    }
}

/// Write `content`, creating parent folders as needed
pub(crate) fn write_cache(path: &Path, content: &str) -> Result<CacheInfo> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    CacheInfo::from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config::with_cache_root(dir.path(), vec!["key".to_string()])
    }

    // ============== Refresh Tests ==============

    #[test]
    fn test_missing_file_needs_refresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing");
        assert!(Refresh::Never.needs_refresh(&path));
        assert!(Refresh::OlderThanDays(3).needs_refresh(&path));
    }

    #[test]
    fn test_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cached");
        std::fs::write(&path, "{}").unwrap();

        assert!(!Refresh::Never.needs_refresh(&path));
        assert!(Refresh::Always.needs_refresh(&path));
        assert!(!Refresh::OlderThanDays(1).needs_refresh(&path));
    }

    #[test]
    fn test_stale_file_needs_refresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stale");
        std::fs::write(&path, "{}").unwrap();
        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * SECONDS_PER_DAY);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();

        assert!(Refresh::OlderThanDays(7).needs_refresh(&path));
        assert!(!Refresh::OlderThanDays(30).needs_refresh(&path));
        assert!(!Refresh::Never.needs_refresh(&path));
    }

    #[test]
    fn test_refresh_from_bool() {
        assert_eq!(Refresh::from(true), Refresh::Always);
        assert_eq!(Refresh::from(false), Refresh::Never);
    }

    // ============== Path Tests ==============

    #[test]
    fn test_retrieval_path_replaces_slashes() {
        let dir = TempDir::new().unwrap();
        let path = retrieval_path(
            &config(&dir),
            Api::AbstractRetrieval,
            View::Full,
            "10.1016/j.softx.2019.100263",
        );
        assert_eq!(
            path,
            dir.path()
                .join("Scopus/abstract_retrieval/FULL/10.1016_j.softx.2019.100263")
        );
    }

    #[test]
    fn test_search_path_is_hashed() {
        let dir = TempDir::new().unwrap();
        let query = SearchQuery::from("AU-ID(7004212771)");
        let path = search_path(&config(&dir), Api::ScopusSearch, View::Complete, &query);

        let stem = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(path.starts_with(dir.path().join("Scopus/scopus_search/COMPLETE")));
    }

    #[test]
    fn test_query_stem_known_value() {
        // sha256("abc")
        assert_eq!(
            query_stem(&SearchQuery::from("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_field_query_stem_uses_joined_pairs() {
        let fields = SearchQuery::Fields(vec![
            ("issn".to_string(), "1234".to_string()),
            ("title".to_string(), "x".to_string()),
        ]);
        assert_eq!(fields.to_string(), "issn=1234&title=x");
        assert_eq!(query_stem(&fields), query_stem(&SearchQuery::from("issn=1234&title=x")));
    }

    // ============== CacheInfo Tests ==============

    #[test]
    fn test_cache_info() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("file");
        let info = write_cache(&path, "{}").unwrap();

        assert_eq!(info.path, path);
        assert_eq!(info.age_days(), 0);
        assert_eq!(info.mdate_string().len(), 19);
        assert_eq!(info.date_string().len(), 10);
    }
}

//! Options and plumbing shared by the Scopus search wrappers

use chrono::Local;
use engine::{search, search_summary, Refresh, SearchQuery, SearchRequest, Searched, Session};
use shared::{check_field_consistency, check_integrity, Api, IntegrityAction, Record, Result, View};

/// Options for the search wrappers
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub refresh: Refresh,
    /// Default depends on the API
    pub view: Option<View>,
    /// Show a progress bar while downloading
    pub verbose: bool,
    /// When false only the number of results is requested
    pub download: bool,
    /// Fields that must be present in every result
    pub integrity_fields: Vec<String>,
    pub integrity_action: IntegrityAction,
    /// Subscribers page with cursors (ScopusSearch only)
    pub subscriber: bool,
    /// Decode HTML entities in text fields (ScopusSearch only)
    pub unescape: bool,
    pub params: Vec<(String, String)>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            refresh: Refresh::Never,
            view: None,
            verbose: false,
            download: true,
            integrity_fields: Vec::new(),
            integrity_action: IntegrityAction::Raise,
            subscriber: true,
            unescape: true,
            params: Vec::new(),
        }
    }
}

/// Downloaded results plus what is needed to parse and describe them
#[derive(Debug, Clone)]
pub(crate) struct SearchBase {
    pub query: SearchQuery,
    pub searched: Searched,
    pub integrity_fields: Vec<String>,
    pub integrity_action: IntegrityAction,
}

impl SearchBase {
    pub async fn run(
        session: &Session,
        api: Api,
        query: SearchQuery,
        view: View,
        cursor: bool,
        options: SearchOptions,
    ) -> Result<Self> {
        let request = SearchRequest {
            api,
            query,
            view,
            refresh: options.refresh,
            cursor,
            download: options.download,
            verbose: options.verbose,
            params: options.params,
        };
        let searched = search(session, &request).await?;
        Ok(Self {
            query: request.query,
            searched,
            integrity_fields: options.integrity_fields,
            integrity_action: options.integrity_action,
        })
    }

    pub fn check_fields<R: Record>(&self) -> Result<()> {
        check_field_consistency(&self.integrity_fields, R::FIELDS)
    }

    /// `None` for no results, after the integrity check
    pub fn finish<R: Record>(&self, records: Vec<R>) -> Result<Option<Vec<R>>> {
        check_integrity(&records, &self.integrity_fields, self.integrity_action)?;
        Ok(if records.is_empty() { None } else { Some(records) })
    }

    /// Date of the cache file, today when nothing was cached
    pub fn date(&self) -> String {
        match &self.searched.cache {
            Some(cache) => cache.date_string(),
            None => Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    pub fn summary(&self, keyword: &str, lines: &[String]) -> String {
        search_summary(
            &self.query.to_string(),
            self.searched.total,
            keyword,
            Some(lines),
            &self.date(),
        )
    }
}

//! RequestLog - In-memory record of API requests

use serde::{Deserialize, Serialize};
use shared::Api;
use std::collections::VecDeque;

/// Request log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEntry {
    pub timestamp: String,
    pub event_type: RequestEventType,
    pub api: Api,
    pub url: String,
    pub status: Option<u16>,
    pub key_index: usize,
    pub reason: Option<String>,
}

/// Types of request events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestEventType {
    Success,
    QuotaExceeded,
    KeyRotated,
    Retried,
    Failed,
}

impl RequestEventType {
    fn is_failure(&self) -> bool {
        matches!(self, RequestEventType::Failed | RequestEventType::QuotaExceeded)
    }
}

/// Request log
#[derive(Debug)]
pub struct RequestLog {
    entries: VecDeque<RequestEntry>,
    max_entries: usize,
}

impl RequestLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
        }
    }

    /// Append an entry, dropping the oldest one when full
    pub fn log(&mut self, entry: RequestEntry) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Log an event for a request to `url`
    pub fn log_event(
        &mut self,
        event_type: RequestEventType,
        api: Api,
        url: &str,
        status: Option<u16>,
        key_index: usize,
        reason: Option<&str>,
    ) {
        self.log(RequestEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type,
            api,
            url: url.to_string(),
            status,
            key_index,
            reason: reason.map(str::to_string),
        });
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Vec<&RequestEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Most recent failed or quota-exceeded requests first
    pub fn get_recent_failures(&self, limit: usize) -> Vec<&RequestEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.event_type.is_failure())
            .take(limit)
            .collect()
    }

    pub fn get_stats(&self) -> RequestStats {
        let count = |t: RequestEventType| self.entries.iter().filter(|e| e.event_type == t).count();

        RequestStats {
            total_entries: self.entries.len(),
            success_count: count(RequestEventType::Success),
            failure_count: count(RequestEventType::Failed),
            quota_exceeded_count: count(RequestEventType::QuotaExceeded),
            key_rotation_count: count(RequestEventType::KeyRotated),
            retry_count: count(RequestEventType::Retried),
        }
    }

    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.entries.iter().collect::<Vec<_>>()).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Request statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    pub total_entries: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub quota_exceeded_count: usize,
    pub key_rotation_count: usize,
    pub retry_count: usize,
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new(10000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.elsevier.com/content/search/scopus";

    fn success(log: &mut RequestLog, url: &str) {
        log.log_event(RequestEventType::Success, Api::ScopusSearch, url, Some(200), 0, None);
    }

    #[test]
    fn test_log_entry() {
        let mut log = RequestLog::new(100);

        success(&mut log, URL);

        let stats = log.get_stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.failure_count, 0);
    }

    #[test]
    fn test_log_quota_exceeded() {
        let mut log = RequestLog::new(100);

        log.log_event(
            RequestEventType::QuotaExceeded,
            Api::AuthorRetrieval,
            URL,
            Some(429),
            1,
            Some("Too Many Requests"),
        );

        let failures = log.get_recent_failures(10);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key_index, 1);
        assert_eq!(failures[0].status, Some(429));
        assert_eq!(log.get_stats().quota_exceeded_count, 1);
    }

    #[test]
    fn test_max_entries_limit() {
        let mut log = RequestLog::new(3);

        for i in 1..=4 {
            success(&mut log, &format!("{URL}?start={i}"));
        }

        assert_eq!(log.get_stats().total_entries, 3);

        // Oldest entry should be removed
        let urls: Vec<_> = log.get_recent(10).iter().map(|e| e.url.clone()).collect();
        assert!(!urls.contains(&format!("{URL}?start=1")));
    }

    #[test]
    fn test_get_recent() {
        let mut log = RequestLog::new(100);

        success(&mut log, "a");
        success(&mut log, "b");
        success(&mut log, "c");

        let recent = log.get_recent(2);
        assert_eq!(recent.len(), 2);
        // Most recent should be first
        assert_eq!(recent[0].url, "c");
        assert_eq!(recent[1].url, "b");
    }

    #[test]
    fn test_stats_by_event_type() {
        let mut log = RequestLog::new(100);

        success(&mut log, URL);
        log.log_event(RequestEventType::Retried, Api::ScopusSearch, URL, Some(502), 0, None);
        log.log_event(RequestEventType::KeyRotated, Api::ScopusSearch, URL, Some(429), 1, None);
        log.log_event(RequestEventType::Failed, Api::ScopusSearch, URL, Some(404), 1, Some("Not Found"));

        let stats = log.get_stats();
        assert_eq!(
            stats,
            RequestStats {
                total_entries: 4,
                success_count: 1,
                failure_count: 1,
                quota_exceeded_count: 0,
                key_rotation_count: 1,
                retry_count: 1,
            }
        );
    }

    #[test]
    fn test_export_json() {
        let mut log = RequestLog::new(100);

        success(&mut log, URL);
        log.log_event(RequestEventType::Failed, Api::AbstractRetrieval, URL, Some(400), 0, Some("Bad Request"));

        let json = log.export_json();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["eventType"], "failed");
        assert_eq!(entries[1]["api"], "AbstractRetrieval");
    }

    #[test]
    fn test_zero_capacity_logs_nothing() {
        let mut log = RequestLog::new(0);
        success(&mut log, URL);
        assert_eq!(log.get_stats().total_entries, 0);
    }

    #[test]
    fn test_clear() {
        let mut log = RequestLog::default();
        success(&mut log, URL);
        log.clear();
        assert!(log.get_recent(5).is_empty());
    }

    #[test]
    fn test_default_max_entries() {
        let log = RequestLog::default();
        assert_eq!(log.max_entries, 10000);
    }
}

//! ApiClient - Authenticated, throttled access to the Elsevier APIs

use crate::keyring::KeyRing;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use chrono::{DateTime, Local, TimeZone};
use shared::parse::chained_str;
use shared::{Api, BiblioError, Config, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use throttle::{RateLimiter, RequestEventType, RequestLog, RequestStats};

/// Statuses that are retried with exponential backoff
const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Quota information sent along with every response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeader {
    /// Requests left in the current quota period
    pub remaining: Option<u64>,
    /// When the quota resets
    pub reset: Option<DateTime<Local>>,
}

impl RateLimitHeader {
    pub fn from_response(response: &HttpResponse) -> Self {
        let remaining = response
            .header("X-RateLimit-Remaining")
            .and_then(|v| v.trim().parse().ok());
        let reset = response
            .header("X-RateLimit-Reset")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .and_then(|secs| Local.timestamp_opt(secs as i64, 0).single());
        Self { remaining, reset }
    }
}

/// Client shared by all API wrappers of a session
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    keys: Mutex<KeyRing>,
    limiter: Mutex<RateLimiter>,
    log: Mutex<RequestLog>,
    last_header: Mutex<Option<RateLimitHeader>>,
    retries: u32,
    backoff_factor: f64,
    user_agent: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("retries", &self.retries)
            .field("backoff_factor", &self.backoff_factor)
            .finish_non_exhaustive()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| BiblioError::Other(format!("Failed to acquire {} lock", what)))
}

impl ApiClient {
    /// Client sending requests over the network
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.requests())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Client sending requests through `transport`
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let settings = config.requests();
        Self {
            transport,
            keys: Mutex::new(KeyRing::new(config.keys(), config.inst_tokens())),
            limiter: Mutex::new(RateLimiter::new()),
            log: Mutex::new(RequestLog::default()),
            last_header: Mutex::new(None),
            retries: settings.retries,
            backoff_factor: settings.backoff_factor,
            user_agent: format!("biblio-v{}", shared::VERSION),
        }
    }

    /// GET `url` with `params` on behalf of `api`.
    ///
    /// Waits for the throttle, retries server errors and failed connections
    /// with exponential backoff and moves on to the next API key whenever the quota of the
    /// active one is exceeded.
    pub async fn get_content(
        &self,
        api: Api,
        url: &str,
        params: &[(String, String)],
    ) -> Result<HttpResponse> {
        loop {
            self.throttle(api).await?;

            let (request, key_index) = self.build_request(url, params)?;
            let response = self.send_with_retries(api, &request, key_index).await?;
            *lock(&self.last_header, "header")? = Some(RateLimitHeader::from_response(&response));

            if response.status == 429 {
                let reason = error_reason(&response);
                let rotated = lock(&self.keys, "key")?.rotate();
                if rotated {
                    tracing::info!("Quota of API key {} exceeded, using next key", key_index);
                    self.record(RequestEventType::KeyRotated, api, url, Some(429), key_index, None)?;
                    continue;
                }
                self.record(
                    RequestEventType::QuotaExceeded,
                    api,
                    url,
                    Some(429),
                    key_index,
                    Some(&reason),
                )?;
                return Err(BiblioError::QuotaExceeded(reason));
            }

            if response.is_success() {
                self.record(RequestEventType::Success, api, url, Some(response.status), key_index, None)?;
                return Ok(response);
            }

            let reason = error_reason(&response);
            self.record(
                RequestEventType::Failed,
                api,
                url,
                Some(response.status),
                key_index,
                Some(&reason),
            )?;
            return Err(BiblioError::from_status(response.status, reason));
        }
    }

    async fn throttle(&self, api: Api) -> Result<()> {
        let wait = lock(&self.limiter, "throttle")?.wait_time(api, Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Throttling {} for {:?}", api, wait);
            tokio::time::sleep(wait).await;
        }
        lock(&self.limiter, "throttle")?.record(api, Instant::now());
        Ok(())
    }

    fn build_request(&self, url: &str, params: &[(String, String)]) -> Result<(HttpRequest, usize)> {
        let keys = lock(&self.keys, "key")?;
        let (key, token) = keys.current().ok_or_else(|| {
            BiblioError::Credentials("No API keys available".to_string())
        })?;

        let mut headers = vec![
            ("X-ELS-APIKey".to_string(), key.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];
        if let Some(token) = token {
            headers.push(("X-ELS-Insttoken".to_string(), token.to_string()));
        }

        let request = HttpRequest {
            url: url.to_string(),
            params: params.to_vec(),
            headers,
        };
        Ok((request, keys.active_index()))
    }

    async fn send_with_retries(
        &self,
        api: Api,
        request: &HttpRequest,
        key_index: usize,
    ) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            tracing::debug!("GET {} {:?}", request.url, request.params);
            let outcome = self.transport.get(request).await;
            let retryable = match &outcome {
                Ok(response) if RETRY_STATUSES.contains(&response.status) => {
                    Some((Some(response.status), format!("Status {}", response.status)))
                }
                Err(BiblioError::Transport(reason)) => Some((None, reason.clone())),
                _ => None,
            };
            let Some((status, failure)) = retryable else {
                return outcome;
            };
            if attempt >= self.retries {
                return outcome;
            }

            attempt += 1;
            let backoff = self.backoff(attempt);
            tracing::debug!(
                "{} from {}, retry {} in {:?}",
                failure,
                request.url,
                attempt,
                backoff
            );
            self.record(
                RequestEventType::Retried,
                api,
                &request.url,
                status,
                key_index,
                status.is_none().then_some(failure.as_str()),
            )?;
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }

    /// `backoff_factor * 2^(n-1)` seconds before the n-th retry
    fn backoff(&self, attempt: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(attempt.saturating_sub(1) as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    fn record(
        &self,
        event_type: RequestEventType,
        api: Api,
        url: &str,
        status: Option<u16>,
        key_index: usize,
        reason: Option<&str>,
    ) -> Result<()> {
        lock(&self.log, "log")?.log_event(event_type, api, url, status, key_index, reason);
        Ok(())
    }

    /// Quota header of the most recent response
    pub fn last_rate_limit(&self) -> Option<RateLimitHeader> {
        self.last_header.lock().ok().and_then(|h| h.clone())
    }

    /// Index of the API key in use
    pub fn active_key_index(&self) -> usize {
        self.keys.lock().map(|k| k.active_index()).unwrap_or_default()
    }

    pub fn stats(&self) -> RequestStats {
        self.log.lock().map(|l| l.get_stats()).unwrap_or_default()
    }

    pub fn export_log(&self) -> serde_json::Value {
        self.log.lock().map(|l| l.export_json()).unwrap_or_default()
    }

    /// Turn request throttling on or off
    pub fn set_throttling(&self, enabled: bool) {
        if let Ok(mut limiter) = self.limiter.lock() {
            if enabled {
                limiter.enable();
            } else {
                limiter.disable();
            }
        }
    }
}

/// `"<reason phrase>: <statusText>"` from an error response
fn error_reason(response: &HttpResponse) -> String {
    let phrase = reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");

    let detail = response.json().ok().and_then(|body| {
        chained_str(&body, &["service-error", "status", "statusText"])
            .or_else(|| chained_str(&body, &["message"]))
    });

    match detail {
        Some(text) if phrase.is_empty() => text,
        Some(text) => format!("{}: {}", phrase, text),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;

    const URL: &str = "https://api.elsevier.com/content/abstract/eid/2-s2.0-1";

    fn config(keys: &[&str], tokens: &[&str]) -> Config {
        let dir = std::env::temp_dir();
        let mut config = Config::with_cache_root(&dir, keys.iter().map(|s| s.to_string()).collect());
        config.set_custom_keys(
            keys.iter().map(|s| s.to_string()).collect(),
            tokens.iter().map(|s| s.to_string()).collect(),
        );
        config.requests_mut().backoff_factor = 0.0;
        config.requests_mut().retries = 2;
        config
    }

    fn client(keys: &[&str], tokens: &[&str], mock: &Arc<MockTransport>) -> ApiClient {
        let client = ApiClient::with_transport(&config(keys, tokens), mock.clone());
        client.set_throttling(false);
        client
    }

    fn params() -> Vec<(String, String)> {
        vec![("view".to_string(), "META".to_string())]
    }

    // ============== Request Tests ==============

    #[tokio::test]
    async fn test_success_sends_headers() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &json!({"abstracts-retrieval-response": {}}));
        let client = client(&["key1"], &["token1"], &mock);

        let response = client.get_content(Api::AbstractRetrieval, URL, &params()).await.unwrap();
        assert_eq!(response.status, 200);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.header("X-ELS-APIKey"), Some("key1"));
        assert_eq!(sent.header("X-ELS-Insttoken"), Some("token1"));
        assert_eq!(sent.header("Accept"), Some("application/json"));
        assert!(sent.header("User-Agent").unwrap().starts_with("biblio-v"));
        assert_eq!(sent.param("view"), Some("META"));
        assert_eq!(client.stats().success_count, 1);
    }

    #[tokio::test]
    async fn test_no_inst_token_header_without_token() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &json!({}));
        let client = client(&["key1"], &[], &mock);

        client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();
        assert_eq!(mock.requests()[0].header("X-ELS-Insttoken"), None);
    }

    // ============== Error Mapping Tests ==============

    #[tokio::test]
    async fn test_not_found_carries_status_text() {
        let mock = Arc::new(MockTransport::new());
        let client = client(&["key1"], &[], &mock);

        let err = client
            .get_content(Api::AbstractRetrieval, URL, &[])
            .await
            .unwrap_err();
        match err {
            BiblioError::NotFound(reason) => {
                assert_eq!(reason, "Not Found: The resource specified cannot be found.")
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(client.stats().failure_count, 1);
    }

    #[tokio::test]
    async fn test_bad_request_uses_message() {
        let mock = Arc::new(MockTransport::new());
        mock.push(URL, HttpResponse::new(400, r#"{"message": "Invalid view"}"#));
        let client = client(&["key1"], &[], &mock);

        let err = client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap_err();
        assert!(matches!(err, BiblioError::BadRequest(ref r) if r == "Bad Request: Invalid view"));
    }

    #[test]
    fn test_error_reason_empty_without_body() {
        assert_eq!(error_reason(&HttpResponse::new(401, "")), "");
    }

    // ============== Retry Tests ==============

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mock = Arc::new(MockTransport::new());
        mock.push(URL, HttpResponse::new(502, ""));
        mock.push(URL, HttpResponse::new(503, ""));
        mock.push_json(URL, &json!({"ok": true}));
        let client = client(&["key1"], &[], &mock);

        let response = client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();
        assert_eq!(response.json().unwrap()["ok"], true);
        assert_eq!(mock.requests().len(), 3);
        assert_eq!(client.stats().retry_count, 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let mock = Arc::new(MockTransport::new());
        mock.push(URL, HttpResponse::new(500, ""));
        let client = client(&["key1"], &[], &mock);

        let err = client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap_err();
        assert!(matches!(err, BiblioError::Server { status: 500, .. }));
        // First attempt plus two retries
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_retries_connection_failures() {
        let mock = Arc::new(MockTransport::new());
        mock.push_error(URL, "connection reset by peer");
        mock.push_json(URL, &json!({"ok": true}));
        let client = client(&["key1"], &[], &mock);

        let response = client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(mock.requests().len(), 2);
        assert_eq!(client.stats().retry_count, 1);
    }

    #[tokio::test]
    async fn test_connection_failure_after_retries() {
        let mock = Arc::new(MockTransport::new());
        mock.push_error(URL, "operation timed out");
        let client = client(&["key1"], &[], &mock);

        let err = client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap_err();
        assert!(matches!(err, BiblioError::Transport(ref r) if r == "operation timed out"));
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn test_backoff_doubles() {
        let mock = Arc::new(MockTransport::new());
        let mut config = config(&["k"], &[]);
        config.requests_mut().backoff_factor = 2.0;
        let client = ApiClient::with_transport(&config, mock);

        assert_eq!(client.backoff(1), Duration::from_secs(2));
        assert_eq!(client.backoff(2), Duration::from_secs(4));
        assert_eq!(client.backoff(3), Duration::from_secs(8));
    }

    // ============== Key Rotation Tests ==============

    #[tokio::test]
    async fn test_quota_exceeded_rotates_key() {
        let mock = Arc::new(MockTransport::new());
        mock.push(URL, HttpResponse::new(429, ""));
        mock.push_json(URL, &json!({}));
        let client = client(&["key1", "key2"], &[], &mock);

        client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].header("X-ELS-APIKey"), Some("key1"));
        assert_eq!(requests[1].header("X-ELS-APIKey"), Some("key2"));
        assert_eq!(client.active_key_index(), 1);
        assert_eq!(client.stats().key_rotation_count, 1);
    }

    #[tokio::test]
    async fn test_quota_exceeded_all_keys_depleted() {
        let mock = Arc::new(MockTransport::new());
        mock.push(URL, HttpResponse::new(429, r#"{"error-response": {}}"#));
        let client = client(&["key1", "key2"], &[], &mock);

        let err = client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap_err();
        assert!(matches!(err, BiblioError::QuotaExceeded(_)));
        assert_eq!(mock.requests().len(), 2);
        assert_eq!(client.stats().quota_exceeded_count, 1);
    }

    #[tokio::test]
    async fn test_rotation_is_sticky() {
        let mock = Arc::new(MockTransport::new());
        mock.push(URL, HttpResponse::new(429, ""));
        mock.push_json(URL, &json!({}));
        let client = client(&["key1", "key2"], &[], &mock);

        client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();
        client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();

        assert_eq!(mock.requests()[2].header("X-ELS-APIKey"), Some("key2"));
    }

    // ============== Rate Limit Header Tests ==============

    #[tokio::test]
    async fn test_rate_limit_header() {
        let mock = Arc::new(MockTransport::new());
        mock.push(
            URL,
            HttpResponse::new(200, "{}")
                .with_header("X-RateLimit-Remaining", "19999")
                .with_header("X-RateLimit-Reset", "1700000000"),
        );
        let client = client(&["key1"], &[], &mock);

        client.get_content(Api::AbstractRetrieval, URL, &[]).await.unwrap();
        let header = client.last_rate_limit().unwrap();
        assert_eq!(header.remaining, Some(19999));
        assert_eq!(header.reset.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_rate_limit_header_missing() {
        let header = RateLimitHeader::from_response(&HttpResponse::new(200, ""));
        assert_eq!(header, RateLimitHeader::default());
    }
}

//! Transport - The seam between the client and the network

use async_trait::async_trait;
use shared::{BiblioError, RequestSettings, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// An outgoing GET request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a header, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-case
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends requests
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client honouring the timeout and proxy settings
    pub fn new(settings: &RequestSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout));
        if let Some(proxy) = &settings.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| BiblioError::Config(format!("Invalid proxy '{}': {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        let http_client = builder
            .build()
            .map_err(|e| BiblioError::Transport(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.http_client.get(&request.url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BiblioError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| BiblioError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// In-memory transport serving canned responses.
///
/// Responses are queued per URL and served in order; the last response of
/// a queue is repeated. Unknown URLs answer 404. A queued error stands for
/// a failed connection.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<std::result::Result<HttpResponse, String>>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`
    pub fn push(&self, url: impl Into<String>, response: HttpResponse) {
        self.push_reply(url.into(), Ok(response));
    }

    /// Queue a connection failure for `url`
    pub fn push_error(&self, url: impl Into<String>, reason: impl Into<String>) {
        self.push_reply(url.into(), Err(reason.into()));
    }

    fn push_reply(&self, url: String, reply: std::result::Result<HttpResponse, String>) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(url).or_default().push_back(reply);
        }
    }

    /// Queue a 200 response with a JSON body
    pub fn push_json(&self, url: impl Into<String>, body: &serde_json::Value) {
        self.push(url, HttpResponse::new(200, body.to_string()));
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .map_err(|_| BiblioError::Transport("Failed to acquire request lock".to_string()))?
            .push(request.clone());

        let mut routes = self
            .routes
            .lock()
            .map_err(|_| BiblioError::Transport("Failed to acquire route lock".to_string()))?;
        let reply = match routes.get_mut(&request.url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(BiblioError::Transport(reason)),
            None => Ok(HttpResponse::new(
                404,
                r#"{"service-error":{"status":{"statusCode":"RESOURCE_NOT_FOUND","statusText":"The resource specified cannot be found."}}}"#,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lookup() {
        let mut request = HttpRequest::new("https://example.org");
        request.params.push(("view".into(), "FULL".into()));
        request.headers.push(("X-ELS-APIKey".into(), "k".into()));

        assert_eq!(request.param("view"), Some("FULL"));
        assert_eq!(request.header("x-els-apikey"), Some("k"));
        assert_eq!(request.param("count"), None);
    }

    #[test]
    fn test_response_headers_case_insensitive() {
        let response = HttpResponse::new(200, "{}").with_header("X-RateLimit-Remaining", "10");
        assert_eq!(response.header("x-ratelimit-remaining"), Some("10"));
        assert!(response.is_success());
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse::new(200, r#"{"a": 1}"#);
        assert_eq!(response.json().unwrap()["a"], 1);
        assert!(HttpResponse::new(200, "not json").json().is_err());
    }

    // ============== Mock Transport Tests ==============

    #[tokio::test]
    async fn test_mock_serves_in_order_and_repeats_last() {
        let mock = MockTransport::new();
        mock.push("u", HttpResponse::new(503, ""));
        mock.push("u", HttpResponse::new(200, "ok"));

        let request = HttpRequest::new("u");
        assert_eq!(mock.get(&request).await.unwrap().status, 503);
        assert_eq!(mock.get(&request).await.unwrap().status, 200);
        assert_eq!(mock.get(&request).await.unwrap().status, 200);
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_unknown_url_is_not_found() {
        let mock = MockTransport::new();
        let response = mock.get(&HttpRequest::new("missing")).await.unwrap();
        assert_eq!(response.status, 404);
    }
}

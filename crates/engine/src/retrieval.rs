//! Retrieval of a single record by identifier

use crate::cache::{retrieval_path, write_cache, CacheInfo, Refresh};
use crate::session::Session;
use gateway::RateLimitHeader;
use serde_json::Value;
use shared::parse::{listify_opt, make_int_opt};
use shared::{check_view, Api, BiblioError, IdType, Result, View};
use url::Url;

/// References per request of the REF view
const REF_PAGE_SIZE: usize = 40;

/// What to retrieve
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub api: Api,
    pub identifier: String,
    /// Part of the URL for APIs that take one
    pub id_type: Option<IdType>,
    pub view: View,
    pub refresh: Refresh,
    /// Extra query parameters
    pub params: Vec<(String, String)>,
}

impl RetrievalRequest {
    pub fn new(api: Api, identifier: impl Into<String>, view: View) -> Self {
        Self {
            api,
            identifier: identifier.into(),
            id_type: None,
            view,
            refresh: Refresh::Never,
            params: Vec::new(),
        }
    }

    pub fn id_type(mut self, id_type: IdType) -> Self {
        self.id_type = Some(id_type);
        self
    }

    pub fn refresh(mut self, refresh: Refresh) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Endpoint URL including the identifier. Slashes in the identifier
    /// separate path segments; other reserved characters are encoded.
    pub fn url(&self) -> Result<String> {
        let mut url = Url::parse(&self.api.url())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                BiblioError::Config(format!("{} has no path for identifiers", self.api))
            })?;
            segments.pop_if_empty();
            if self.api.uses_id_type() {
                if let Some(id_type) = self.id_type {
                    segments.push(id_type.as_str());
                }
            }
            segments.extend(self.identifier.split('/'));
        }
        Ok(url.into())
    }

    /// Whether the reference list arrives in pages
    fn pages_references(&self) -> bool {
        self.api == Api::AbstractRetrieval && self.view == View::Ref
    }

    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("view".to_string(), self.view.as_str().to_string())];
        params.extend(self.params.iter().cloned());
        params
    }
}

/// A retrieved record
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub json: Value,
    pub cache: CacheInfo,
    /// Quota header when the record was downloaded in this call
    pub header: Option<RateLimitHeader>,
}

/// Load a record from the cache or download it
pub async fn retrieve(session: &Session, request: &RetrievalRequest) -> Result<Retrieved> {
    check_view(request.api, request.view)?;

    let path = retrieval_path(session.config(), request.api, request.view, &request.identifier);

    if !request.refresh.needs_refresh(&path) {
        tracing::debug!("Loading {} from cache {}", request.identifier, path.display());
        let content = std::fs::read_to_string(&path)?;
        return Ok(Retrieved {
            json: serde_json::from_str(&content)?,
            cache: CacheInfo::from_path(&path)?,
            header: None,
        });
    }

    let url = request.url()?;
    tracing::debug!("Downloading {} from {}", request.identifier, url);
    let response = session
        .client()
        .get_content(request.api, &url, &request.query_params())
        .await?;
    let mut json = response.json()?;
    if request.pages_references() {
        fetch_remaining_references(session, request, &url, &mut json).await?;
    }
    let cache = write_cache(&path, &serde_json::to_string(&json)?)?;

    Ok(Retrieved {
        json,
        cache,
        header: Some(RateLimitHeader::from_response(&response)),
    })
}

/// Download the reference pages after the first one and merge them into
/// `json`, so that the cached record holds the complete list
async fn fetch_remaining_references(
    session: &Session,
    request: &RetrievalRequest,
    url: &str,
    json: &mut Value,
) -> Result<()> {
    let Some(refs) = json.pointer_mut("/abstracts-retrieval-response/references") else {
        return Ok(());
    };
    let total = make_int_opt(refs.get("@total-references")).unwrap_or(0).max(0) as usize;
    let mut collected: Vec<Value> = listify_opt(refs.get("reference")).into_iter().cloned().collect();
    if collected.len() >= total {
        return Ok(());
    }

    while collected.len() < total {
        let mut params = request.query_params();
        params.push(("startref".to_string(), (collected.len() + 1).to_string()));
        params.push(("refcount".to_string(), REF_PAGE_SIZE.to_string()));
        tracing::debug!(
            "Fetching references of {} from {}",
            request.identifier,
            collected.len() + 1
        );

        let page = session
            .client()
            .get_content(request.api, url, &params)
            .await?
            .json()?;
        let more: Vec<Value> = listify_opt(
            page.pointer("/abstracts-retrieval-response/references/reference"),
        )
        .into_iter()
        .cloned()
        .collect();
        if more.is_empty() {
            break;
        }
        collected.extend(more);
    }

    refs["reference"] = Value::Array(collected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::MockTransport;
    use serde_json::json;
    use shared::Config;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const URL: &str = "https://api.elsevier.com/content/abstract/eid/2-s2.0-85068268027";

    fn session(dir: &TempDir, mock: &Arc<MockTransport>) -> Session {
        let config = Config::with_cache_root(dir.path(), vec!["key".to_string()]);
        let session = Session::with_transport(config, mock.clone());
        session.client().set_throttling(false);
        session
    }

    fn request() -> RetrievalRequest {
        RetrievalRequest::new(Api::AbstractRetrieval, "2-s2.0-85068268027", View::Meta)
            .id_type(IdType::Eid)
    }

    #[test]
    fn test_url_with_id_type() {
        assert_eq!(request().url().unwrap(), URL);
    }

    #[test]
    fn test_url_encodes_reserved_characters() {
        let request = RetrievalRequest::new(
            Api::AbstractRetrieval,
            "10.1002/(SICI)1097-4571#x?y",
            View::Meta,
        )
        .id_type(IdType::Doi);
        assert_eq!(
            request.url().unwrap(),
            "https://api.elsevier.com/content/abstract/doi/10.1002/(SICI)1097-4571%23x%3Fy"
        );
    }

    #[test]
    fn test_url_without_id_type() {
        let request = RetrievalRequest::new(Api::AuthorRetrieval, "7004212771", View::Light)
            .id_type(IdType::ScopusId);
        assert_eq!(
            request.url().unwrap(),
            "https://api.elsevier.com/content/author/author_id/7004212771"
        );
    }

    #[tokio::test]
    async fn test_download_then_cache() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &json!({"abstracts-retrieval-response": {"coredata": {"eid": "x"}}}));
        let session = session(&dir, &mock);

        let first = retrieve(&session, &request()).await.unwrap();
        assert!(first.header.is_some());
        assert!(first.cache.path.ends_with("META/2-s2.0-85068268027"));
        assert_eq!(mock.requests()[0].param("view"), Some("META"));

        let second = retrieve(&session, &request()).await.unwrap();
        assert!(second.header.is_none());
        assert_eq!(second.json, first.json);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_always_downloads() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &json!({"v": 1}));
        mock.push_json(URL, &json!({"v": 2}));
        let session = session(&dir, &mock);

        retrieve(&session, &request()).await.unwrap();
        let refreshed = retrieve(&session, &request().refresh(Refresh::Always))
            .await
            .unwrap();
        assert_eq!(refreshed.json["v"], 2);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_record_is_downloaded_again() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &json!({"v": 1}));
        mock.push_json(URL, &json!({"v": 2}));
        let session = session(&dir, &mock);

        let first = retrieve(&session, &request()).await.unwrap();
        let cached = retrieve(&session, &request().refresh(Refresh::OlderThanDays(3)))
            .await
            .unwrap();
        assert_eq!(cached.json["v"], 1);
        assert_eq!(mock.requests().len(), 1);

        let five_days_ago = SystemTime::now() - Duration::from_secs(5 * 86_400);
        std::fs::File::options()
            .write(true)
            .open(&first.cache.path)
            .unwrap()
            .set_modified(five_days_ago)
            .unwrap();

        let refreshed = retrieve(&session, &request().refresh(Refresh::OlderThanDays(3)))
            .await
            .unwrap();
        assert_eq!(refreshed.json["v"], 2);
        assert!(refreshed.header.is_some());
        assert_eq!(mock.requests().len(), 2);
    }

    // ============== Reference Paging Tests ==============

    fn reference_page(total: usize, ids: &[u32]) -> Value {
        let refs: Vec<Value> = ids.iter().map(|i| json!({"@id": i.to_string()})).collect();
        json!({"abstracts-retrieval-response": {"references": {
            "@total-references": total.to_string(),
            "reference": refs
        }}})
    }

    #[tokio::test]
    async fn test_ref_view_fetches_all_reference_pages() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let first: Vec<u32> = (1..=40).collect();
        mock.push_json(URL, &reference_page(42, &first));
        mock.push_json(URL, &reference_page(42, &[41, 42]));
        let session = session(&dir, &mock);

        let request = RetrievalRequest::new(Api::AbstractRetrieval, "2-s2.0-85068268027", View::Ref)
            .id_type(IdType::Eid);
        let retrieved = retrieve(&session, &request).await.unwrap();

        let refs = retrieved.json["abstracts-retrieval-response"]["references"]["reference"]
            .as_array()
            .unwrap();
        assert_eq!(refs.len(), 42);
        assert_eq!(refs[41]["@id"], "42");

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].param("startref"), None);
        assert_eq!(requests[1].param("startref"), Some("41"));
        assert_eq!(requests[1].param("refcount"), Some("40"));
        assert_eq!(requests[1].param("view"), Some("REF"));

        let cached = retrieve(&session, &request).await.unwrap();
        assert_eq!(cached.json, retrieved.json);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_single_reference_page_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(
            URL,
            &json!({"abstracts-retrieval-response": {"references": {
                "@total-references": "1",
                "reference": {"@id": "1"}
            }}}),
        );
        let session = session(&dir, &mock);

        let request = RetrievalRequest::new(Api::AbstractRetrieval, "2-s2.0-85068268027", View::Ref)
            .id_type(IdType::Eid);
        let retrieved = retrieve(&session, &request).await.unwrap();
        assert!(retrieved.json["abstracts-retrieval-response"]["references"]["reference"].is_object());
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_extra_params_are_sent() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.push_json(URL, &json!({}));
        let session = session(&dir, &mock);

        let request = request().params(vec![("field".to_string(), "dc:title".to_string())]);
        retrieve(&session, &request).await.unwrap();
        assert_eq!(mock.requests()[0].param("field"), Some("dc:title"));
    }

    #[tokio::test]
    async fn test_invalid_view() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let session = session(&dir, &mock);

        let request = RetrievalRequest::new(Api::AbstractRetrieval, "1", View::Complete);
        assert!(retrieve(&session, &request).await.is_err());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let session = session(&dir, &mock);

        let err = retrieve(&session, &request()).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        let path = retrieval_path(session.config(), Api::AbstractRetrieval, View::Meta, "2-s2.0-85068268027");
        assert!(!path.exists());
    }
}

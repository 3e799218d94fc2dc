//! Paged search with a JSON-lines cache

use crate::cache::{search_path, write_cache, CacheInfo, Refresh, SearchQuery};
use crate::session::Session;
use gateway::RateLimitHeader;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use shared::parse::{chained_get, chained_str, format_thousands, listify_opt, make_int_opt};
use shared::{check_view, Api, BiblioError, QueryTooLargeError, Result, View, SEARCH_MAX_ENTRIES};

/// What to search for
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub api: Api,
    pub query: SearchQuery,
    pub view: View,
    pub refresh: Refresh,
    /// Page with `cursor` instead of `start`; lifts the 5000 entry limit
    pub cursor: bool,
    /// When false and nothing is cached, only the number of results is fetched
    pub download: bool,
    /// Show a progress bar while paging
    pub verbose: bool,
    /// Extra query parameters
    pub params: Vec<(String, String)>,
}

impl SearchRequest {
    pub fn new(api: Api, query: impl Into<SearchQuery>, view: View) -> Self {
        Self {
            api,
            query: query.into(),
            view,
            refresh: Refresh::Never,
            cursor: false,
            download: true,
            verbose: false,
            params: Vec::new(),
        }
    }
}

/// Outcome of a search
#[derive(Debug, Clone, Default)]
pub struct Searched {
    /// One JSON object per result; empty when not downloaded
    pub results: Vec<Value>,
    /// Number of results the API reported
    pub total: usize,
    /// Cache file, absent when nothing was downloaded
    pub cache: Option<CacheInfo>,
    pub header: Option<RateLimitHeader>,
}

fn set_param(params: &mut Vec<(String, String)>, name: &str, value: String) {
    match params.iter_mut().find(|(k, _)| k == name) {
        Some(entry) => entry.1 = value,
        None => params.push((name.to_string(), value)),
    }
}

/// Result entries of a page; the API marks empty result sets with an error entry
fn page_entries(page: &Value) -> Vec<Value> {
    listify_opt(chained_get(page, &["search-results", "entry"]))
        .into_iter()
        .filter(|entry| entry.get("error").is_none())
        .cloned()
        .collect()
}

fn progress_bar(total: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]")
        .map_err(|e| BiblioError::Other(e.to_string()))?;
    bar.set_style(style);
    Ok(bar)
}

fn load_cached(path: &std::path::Path) -> Result<Searched> {
    let content = std::fs::read_to_string(path)?;
    let results = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<Value>)
        .collect::<std::result::Result<Vec<Value>, _>>()?;
    Ok(Searched {
        total: results.len(),
        results,
        cache: Some(CacheInfo::from_path(path)?),
        header: None,
    })
}

/// Load search results from the cache or download all pages
pub async fn search(session: &Session, request: &SearchRequest) -> Result<Searched> {
    check_view(request.api, request.view)?;
    let page_size = request.api.page_size(request.view).ok_or_else(|| {
        BiblioError::Query(format!("{} is not a search API", request.api))
    })?;

    let path = search_path(session.config(), request.api, request.view, &request.query);
    if !request.refresh.needs_refresh(&path) {
        tracing::debug!("Loading search '{}' from cache {}", request.query, path.display());
        return load_cached(&path);
    }

    let url = request.api.url();
    let mut params = vec![
        ("count".to_string(), page_size.to_string()),
        ("view".to_string(), request.view.as_str().to_string()),
    ];
    params.extend(request.params.iter().cloned());
    params.extend(request.query.params());
    if request.cursor {
        set_param(&mut params, "cursor", "*".to_string());
    } else {
        set_param(&mut params, "start", "0".to_string());
    }

    let client = session.client();
    let response = client.get_content(request.api, &url, &params).await?;
    let header = Some(RateLimitHeader::from_response(&response));
    let first = response.json()?;

    let total = make_int_opt(chained_get(&first, &["search-results", "opensearch:totalResults"]))
        .unwrap_or(0)
        .max(0) as usize;
    if !request.cursor && total > SEARCH_MAX_ENTRIES {
        return Err(QueryTooLargeError {
            found: total,
            max: SEARCH_MAX_ENTRIES,
        }
        .into());
    }
    if !request.download {
        return Ok(Searched {
            results: Vec::new(),
            total,
            cache: None,
            header,
        });
    }

    let mut results = if total > 0 { page_entries(&first) } else { Vec::new() };
    let bar = if request.verbose && total > 0 {
        Some(progress_bar(total)?)
    } else {
        None
    };
    if let Some(bar) = &bar {
        bar.set_position(results.len() as u64);
    }

    let mut start = 0;
    let mut next_cursor = chained_str(&first, &["search-results", "cursor", "@next"]);
    while results.len() < total {
        if request.cursor {
            let Some(cursor) = next_cursor.take() else {
                break;
            };
            set_param(&mut params, "cursor", cursor);
        } else {
            start += page_size;
            set_param(&mut params, "start", start.to_string());
        }

        let page = client
            .get_content(request.api, &url, &params)
            .await?
            .json()?;
        let entries = page_entries(&page);
        if entries.is_empty() {
            break;
        }
        results.extend(entries);
        next_cursor = chained_str(&page, &["search-results", "cursor", "@next"]);

        if let Some(bar) = &bar {
            bar.set_position(results.len() as u64);
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let mut lines = String::new();
    for entry in &results {
        lines.push_str(&serde_json::to_string(entry)?);
        lines.push('\n');
    }
    let cache = write_cache(&path, &lines)?;
    tracing::debug!("Cached {} of {} results in {}", results.len(), total, path.display());

    Ok(Searched {
        results,
        total,
        cache: Some(cache),
        header,
    })
}

/// One-paragraph description of a search outcome
pub fn search_summary(
    query: &str,
    n: usize,
    keyword: &str,
    results: Option<&[String]>,
    date: &str,
) -> String {
    let plural = if n == 1 { "" } else { "s" };
    let mut s = format!(
        "Search '{}' yielded {} {}{} as of {}",
        query,
        format_thousands(n),
        keyword,
        plural,
        date
    );
    match results {
        Some(results) if !results.is_empty() => {
            s.push(':');
            for line in results {
                s.push_str("\n    ");
                s.push_str(line);
            }
        }
        _ if n > 0 => {
            let verb = if n == 1 { "has" } else { "have" };
            s.push_str(&format!(", which {} not been downloaded", verb));
        }
        _ => {}
    }
    s
}

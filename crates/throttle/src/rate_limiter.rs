//! RateLimiter - Sliding-window throttling per API

use shared::Api;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Keeps the start instants of the most recent requests of every API so
/// that no more than `limit` requests start within one second.
#[derive(Debug)]
pub struct RateLimiter {
    limits: HashMap<Api, usize>,
    windows: HashMap<Api, VecDeque<Instant>>,
    enabled: bool,
}

impl RateLimiter {
    /// Create a new RateLimiter with the published limit of every API
    pub fn new() -> Self {
        Self {
            limits: Api::ALL.iter().map(|api| (*api, api.rate_limit())).collect(),
            windows: HashMap::new(),
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Override the requests-per-second limit of an API
    pub fn set_limit(&mut self, api: Api, limit: usize) {
        self.limits.insert(api, limit.max(1));
        if let Some(window) = self.windows.get_mut(&api) {
            while window.len() > limit.max(1) {
                window.pop_front();
            }
        }
    }

    /// Requests-per-second limit of an API
    pub fn limit(&self, api: Api) -> usize {
        self.limits
            .get(&api)
            .copied()
            .unwrap_or_else(|| api.rate_limit())
    }

    /// How long to wait at `now` before the next request to `api` may start
    pub fn wait_time(&self, api: Api, now: Instant) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let Some(window) = self.windows.get(&api) else {
            return Duration::ZERO;
        };
        if window.len() < self.limit(api) {
            return Duration::ZERO;
        }
        match window.front() {
            Some(first) => WINDOW.saturating_sub(now.saturating_duration_since(*first)),
            None => Duration::ZERO,
        }
    }

    /// Record that a request to `api` started at `now`
    pub fn record(&mut self, api: Api, now: Instant) {
        if !self.enabled {
            return;
        }
        let limit = self.limit(api);
        let window = self.windows.entry(api).or_default();
        window.push_back(now);
        while window.len() > limit {
            window.pop_front();
        }
    }

    /// Number of requests in the window of an API
    pub fn in_window(&self, api: Api) -> usize {
        self.windows.get(&api).map_or(0, VecDeque::len)
    }

    /// Forget the requests of one API
    pub fn reset(&mut self, api: Api) {
        self.windows.remove(&api);
    }

    /// Forget all requests
    pub fn reset_all(&mut self) {
        self.windows.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

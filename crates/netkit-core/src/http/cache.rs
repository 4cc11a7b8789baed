//! Bounded in-memory response cache for the reqwest transport
//!
//! Entries are keyed by URL and only 2xx `GET` responses are stored. The
//! request's `Cache-Control` decides whether an entry may answer it. There
//! is no eviction: once the byte budget is spent new entries are refused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::codes;
use crate::http::types::{Method, Request, Response};

/// Request `Cache-Control` directives the cache understands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDirectives {
    pub max_age: Option<u64>,
    /// `max-stale` without a value accepts any staleness
    pub max_stale: Option<u64>,
    pub only_if_cached: bool,
    pub no_cache: bool,
    pub no_store: bool,
}

impl CacheDirectives {
    pub fn parse(header: &str) -> Self {
        let mut directives = Self::default();
        for token in header.split(',') {
            let token = token.trim();
            let (name, value) = match token.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
                None => (token, None),
            };
            match name.to_ascii_lowercase().as_str() {
                "max-age" => directives.max_age = value.and_then(|v| v.parse().ok()),
                "max-stale" => {
                    directives.max_stale = Some(value.and_then(|v| v.parse().ok()).unwrap_or(u64::MAX))
                }
                "only-if-cached" => directives.only_if_cached = true,
                "no-cache" => directives.no_cache = true,
                "no-store" => directives.no_store = true,
                _ => {}
            }
        }
        directives
    }

    fn of(request: &Request) -> Self {
        request
            .header(codes::CACHE_CONTROL)
            .map(Self::parse)
            .unwrap_or_default()
    }
}

/// Result of consulting the cache
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(Response),
    /// `only-if-cached` and nothing acceptable is stored
    Unsatisfiable,
}

#[derive(Debug, Clone)]
struct CachedResponse {
    response: Response,
    stored_at: Instant,
    size: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CachedResponse>,
    used_bytes: usize,
}

/// Thread-safe response store shared by clones
#[derive(Debug, Clone)]
pub struct ResponseCache {
    state: Arc<Mutex<CacheState>>,
    max_size_bytes: usize,
}

impl ResponseCache {
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            max_size_bytes,
        }
    }

    /// Look up a stored answer for the request
    ///
    /// `None` means the request must go to the network.
    pub fn lookup(&self, request: &Request) -> Option<CacheLookup> {
        self.lookup_at(request, Instant::now())
    }

    fn lookup_at(&self, request: &Request, now: Instant) -> Option<CacheLookup> {
        if request.method() != Method::Get {
            return None;
        }
        let directives = CacheDirectives::of(request);
        let key = request.url_string();
        let state = self.state.lock().ok()?;
        let entry = state.entries.get(&key);

        if directives.only_if_cached {
            let allowed = Duration::from_secs(
                directives
                    .max_age
                    .unwrap_or(0)
                    .saturating_add(directives.max_stale.unwrap_or(0)),
            );
            return Some(match entry {
                Some(entry) if now.saturating_duration_since(entry.stored_at) <= allowed => {
                    debug!(url = %key, "Serving cached response");
                    CacheLookup::Hit(entry.response.clone())
                }
                _ => CacheLookup::Unsatisfiable,
            });
        }

        if directives.no_cache {
            return None;
        }
        let max_age = Duration::from_secs(directives.max_age?);
        entry
            .filter(|entry| now.saturating_duration_since(entry.stored_at) <= max_age)
            .map(|entry| {
                debug!(url = %key, "Serving fresh cached response");
                CacheLookup::Hit(entry.response.clone())
            })
    }

    /// Store a network response; returns whether it was kept
    pub fn store(&self, request: &Request, response: &Response) -> bool {
        if request.method() != Method::Get
            || !response.is_success()
            || CacheDirectives::of(request).no_store
        {
            return false;
        }

        let key = request.url_string();
        let size = entry_size(&key, response);
        let Ok(mut state) = self.state.lock() else {
            return false;
        };

        let replaced = state.entries.get(&key).map(|entry| entry.size).unwrap_or(0);
        if state.used_bytes - replaced + size > self.max_size_bytes {
            debug!(url = %key, size, "Response cache full, not storing");
            return false;
        }

        let mut cached = response.clone();
        cached.elapsed = Duration::ZERO;
        state.used_bytes = state.used_bytes - replaced + size;
        state.entries.insert(
            key,
            CachedResponse {
                response: cached,
                stored_at: Instant::now(),
                size,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn used_bytes(&self) -> usize {
        self.state.lock().map(|s| s.used_bytes).unwrap_or(0)
    }

    /// Answer for an `only-if-cached` request the cache cannot satisfy
    pub fn gateway_timeout() -> Response {
        Response::new(504, Vec::new())
    }
}

fn entry_size(key: &str, response: &Response) -> usize {
    key.len()
        + response.body.len()
        + response
            .headers
            .iter()
            .map(|(name, value)| name.len() + value.len())
            .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(directive: Option<&str>) -> Request {
        let request = Request::new(Method::Get, "https://api.example.com/feed").unwrap();
        match directive {
            Some(value) => request.with_header(codes::CACHE_CONTROL, value),
            None => request,
        }
    }

    #[test]
    fn test_parse_directives() {
        let d = CacheDirectives::parse("public, only-if-cached, max-stale=604800");
        assert!(d.only_if_cached);
        assert_eq!(d.max_stale, Some(604800));
        assert_eq!(d.max_age, None);

        let d = CacheDirectives::parse("max-age=5, max-stale");
        assert_eq!(d.max_age, Some(5));
        assert_eq!(d.max_stale, Some(u64::MAX));

        let d = CacheDirectives::parse("No-Store");
        assert!(d.no_store);
    }

    #[test]
    fn test_fresh_hit_within_max_age() {
        let cache = ResponseCache::new(1024);
        assert!(cache.store(&get(None), &Response::new(200, "feed")));

        match cache.lookup(&get(Some("public, max-age=5"))) {
            Some(CacheLookup::Hit(response)) => assert_eq!(response.body, b"feed"),
            other => panic!("expected hit, got {:?}", other),
        }
        assert_eq!(cache.lookup(&get(None)), None);
        assert_eq!(cache.lookup(&get(Some("no-cache, max-age=5"))), None);
    }

    #[test]
    fn test_expired_entry_is_not_fresh() {
        let cache = ResponseCache::new(1024);
        cache.store(&get(None), &Response::new(200, "feed"));
        let later = Instant::now() + Duration::from_secs(10);
        assert_eq!(cache.lookup_at(&get(Some("max-age=5")), later), None);

        match cache.lookup_at(&get(Some("only-if-cached, max-stale=60")), later) {
            Some(CacheLookup::Hit(_)) => {}
            other => panic!("expected stale hit, got {:?}", other),
        }
        assert_eq!(
            cache.lookup_at(&get(Some("only-if-cached, max-stale=1")), later),
            Some(CacheLookup::Unsatisfiable)
        );
    }

    #[test]
    fn test_only_if_cached_miss_is_unsatisfiable() {
        let cache = ResponseCache::new(1024);
        assert_eq!(
            cache.lookup(&get(Some("public, only-if-cached, max-stale=604800"))),
            Some(CacheLookup::Unsatisfiable)
        );
        assert_eq!(ResponseCache::gateway_timeout().status, 504);
    }

    #[test]
    fn test_only_successful_gets_are_stored() {
        let cache = ResponseCache::new(1024);
        assert!(!cache.store(&get(None), &Response::new(500, "boom")));
        let post = Request::new(Method::Post, "https://api.example.com/feed").unwrap();
        assert!(!cache.store(&post, &Response::new(200, "ok")));
        assert!(!cache.store(&get(Some("no-store")), &Response::new(200, "ok")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_budget_refuses_new_entries() {
        let cache = ResponseCache::new(64);
        assert!(!cache.store(&get(None), &Response::new(200, vec![b'x'; 100])));
        assert!(cache.store(&get(None), &Response::new(200, "small")));

        let used = cache.used_bytes();
        // Replacing the same key reuses its budget
        assert!(cache.store(&get(None), &Response::new(200, "other")));
        assert_eq!(cache.used_bytes(), used);
        assert_eq!(cache.len(), 1);
    }
}

//! Per-request proxy context.

use std::collections::HashSet;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

/// Everything needed to replay one inbound request against any target, plus
/// the set of targets already tried in this failover sequence.
///
/// Created per inbound request and dropped when it completes; never shared
/// between requests.
#[derive(Debug)]
pub struct ProxyContext {
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    /// Path relative to the target base URL, query included.
    path_and_query: String,
    tried: HashSet<String>,
}

impl ProxyContext {
    pub fn new(method: Method, headers: HeaderMap, body: Bytes, path_and_query: String) -> Self {
        Self {
            method,
            headers,
            body,
            path_and_query,
            tried: HashSet::new(),
        }
    }

    /// Bodyless GET context, for tests and probes.
    pub fn get(path_and_query: &str) -> Self {
        Self::new(
            Method::GET,
            HeaderMap::new(),
            Bytes::new(),
            path_and_query.to_string(),
        )
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Record that `target` is being tried. Returns false if it already was,
    /// so a target is never retried twice within one failover sequence.
    pub fn mark_tried(&mut self, target: &str) -> bool {
        self.tried.insert(target.to_string())
    }

    /// Number of distinct targets tried so far.
    pub fn tried_count(&self) -> usize {
        self.tried.len()
    }
}

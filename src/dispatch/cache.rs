//! TTL cache in front of a resolver

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::matcher::MatchPolicy;
use super::resolver::{ResolveContext, Resolution, Resolver};

/// Everything the wrapped resolver is shown for one request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    state: String,
    partial: String,
    words: Vec<String>,
}

impl CacheKey {
    fn of(ctx: &ResolveContext<'_>) -> Self {
        Self {
            state: ctx.state.to_string(),
            partial: ctx.partial.to_string(),
            words: ctx.words.to_vec(),
        }
    }
}

/// Cached suggestion set of one request
struct CacheEntry {
    items: Vec<String>,
    policy: MatchPolicy,
    fetched: Instant,
}

impl CacheEntry {
    fn is_valid(&self, ttl: Duration) -> bool {
        self.fetched.elapsed() < ttl
    }
}

/// Wraps a resolver and reuses its suggestion set for `ttl`
///
/// Entries are keyed by the state name, the partial word and the
/// interpreted words, so a request is only answered from the cache when the
/// wrapped resolver would have seen the same input. Delegating resolutions
/// are passed through uncached.
pub struct CachedResolver<R> {
    inner: R,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<R: Resolver> CachedResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Resolution> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key).filter(|entry| entry.is_valid(self.ttl))?;
        Some(Resolution::Suggestions {
            items: entry.items.clone(),
            policy: entry.policy.clone(),
        })
    }
}

impl<R: Resolver> Resolver for CachedResolver<R> {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        let key = CacheKey::of(ctx);
        if let Some(hit) = self.cached(&key) {
            trace!(state = ctx.state, partial = ctx.partial, "resolver cache hit");
            return hit;
        }

        let resolution = self.inner.resolve(ctx);

        if let Resolution::Suggestions { items, policy } = &resolution {
            match self.entries.write() {
                Ok(mut entries) => {
                    entries.retain(|_, entry| entry.is_valid(self.ttl));
                    entries.insert(
                        key,
                        CacheEntry {
                            items: items.clone(),
                            policy: policy.clone(),
                            fetched: Instant::now(),
                        },
                    );
                }
                Err(_) => debug!(state = ctx.state, "resolver cache poisoned, not storing"),
            }
        }

        resolution
    }
}

use std::env;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use store::TaskPage;
use tracing::warn;

const DEFAULT_LIST_CACHE_TTL_SECS: u64 = 120;
const DEFAULT_LIST_CACHE_MAX_ENTRIES: usize = 64;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_LIST_CACHE_TTL_SECS),
            max_entries: DEFAULT_LIST_CACHE_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|name| env::var(name).ok())
    }

    fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            ttl: read_env_duration("TD_LIST_CACHE_TTL_SECS", defaults.ttl, &get_env),
            max_entries: normalize_max(
                read_env_usize(
                    "TD_LIST_CACHE_MAX_ENTRIES",
                    defaults.max_entries,
                    &get_env,
                ),
                "TD_LIST_CACHE_MAX_ENTRIES",
                defaults.max_entries,
            ),
        }
    }
}

struct CacheEntry {
    page: TaskPage,
    cached_at: Instant,
}

/// Filter-keyed response cache. Entries expire after the configured TTL;
/// any mutation clears the whole map (coarse invalidation, no per-key
/// targeting). Expired entries stay readable through `get_any` as the
/// offline fallback.
pub struct ListCache {
    entries: DashMap<String, CacheEntry>,
    config: CacheConfig,
}

impl ListCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// The entry for `key` if it is still within its TTL.
    pub fn get_fresh(&self, key: &str) -> Option<TaskPage> {
        let entry = self.entries.get(key)?;
        if is_expired(entry.cached_at, self.config.ttl) {
            return None;
        }
        Some(entry.page.clone())
    }

    /// The entry for `key` regardless of age, flagged stale when expired.
    pub fn get_any(&self, key: &str) -> Option<(TaskPage, bool)> {
        let entry = self.entries.get(key)?;
        let stale = is_expired(entry.cached_at, self.config.ttl);
        Some((entry.page.clone(), stale))
    }

    pub fn insert(&self, key: String, page: TaskPage) {
        self.entries.insert(
            key,
            CacheEntry {
                page,
                cached_at: Instant::now(),
            },
        );
        self.prune();
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&self) {
        let max = self.config.max_entries;
        let len = self.entries.len();
        if len <= max {
            return;
        }

        let mut entries: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().cached_at))
            .collect();
        entries.sort_by_key(|(_, cached_at)| *cached_at);

        let to_remove = len - max;
        for (key, _) in entries.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }
        warn!("Evicted {to_remove} list cache entries to enforce budget {max}");
    }
}

fn is_expired(cached_at: Instant, ttl: Duration) -> bool {
    !ttl.is_zero() && cached_at.elapsed() > ttl
}

fn read_env_duration<F>(name: &str, default: Duration, get_env: &F) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.parse::<u64>() {
            Ok(parsed) => Duration::from_secs(parsed),
            Err(err) => {
                warn!(
                    "Invalid {name}='{value}': {err}. Using default {}.",
                    default.as_secs()
                );
                default
            }
        },
        None => default,
    }
}

fn read_env_usize<F>(name: &str, default: usize, get_env: &F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.parse::<usize>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn normalize_max(value: usize, name: &str, default: usize) -> usize {
    if value == 0 {
        warn!("{name} set to 0. Using minimum value 1 instead of default {default}.");
        1
    } else {
        value
    }
}

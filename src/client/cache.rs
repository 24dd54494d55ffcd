use moka::future::Cache;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Cached query families. A mutation invalidates whole families.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum QueryKey {
    Services,
    Employees,
    Accounts,
    Requests,
    MyRequests,
    PendingRequests,
    Delegations,
    Workflows,
    Dashboard,
}

impl QueryKey {
    /// Every family whose content changes when a request changes status.
    pub const REQUEST_FAMILIES: [QueryKey; 5] = [
        QueryKey::Requests,
        QueryKey::MyRequests,
        QueryKey::PendingRequests,
        QueryKey::Workflows,
        QueryKey::Dashboard,
    ];
}

/// Client-side query cache: one moka cache per family, entries keyed by
/// the request path (query string included).
pub struct QueryCache {
    families: HashMap<QueryKey, Cache<String, serde_json::Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let families = QueryKey::iter()
            .map(|key| {
                let cache = Cache::builder()
                    .name(key.as_ref())
                    .max_capacity(256)
                    .time_to_live(ttl)
                    .build();
                (key, cache)
            })
            .collect();
        Self { families }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: QueryKey, path: &str) -> Option<T> {
        let value = self.families.get(&key)?.get(path).await?;
        serde_json::from_value(value).ok()
    }

    pub async fn insert<T: Serialize>(&self, key: QueryKey, path: &str, value: &T) {
        let (Some(cache), Ok(value)) = (self.families.get(&key), serde_json::to_value(value)) else {
            return;
        };
        cache.insert(path.to_string(), value).await;
    }

    pub fn invalidate(&self, key: QueryKey) {
        if let Some(cache) = self.families.get(&key) {
            log::debug!("Invalidating {} queries", key.as_ref());
            cache.invalidate_all();
        }
    }

    pub fn invalidate_many(&self, keys: &[QueryKey]) {
        keys.iter().for_each(|k| self.invalidate(*k));
    }

    pub fn clear(&self) {
        self.families.values().for_each(|c| c.invalidate_all());
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

use crate::model::delegation::Delegation;
use crate::model::employee::Employee;
use crate::model::request::OvertimeRequest;
use crate::model::service::Service;
use crate::model::workflow::Workflow;
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const LIST_TTL: Duration = Duration::from_secs(300);

/// Cached full list of one resource.
///
/// Loads that started before an `invalidate` are not stored, so a mutation
/// is never hidden behind a list fetched just before it.
pub struct ListCache<T> {
    name: &'static str,
    cache: Cache<(), Arc<Vec<T>>>,
    generation: AtomicU64,
}

impl<T> ListCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(hit) = self.cache.get(&()).await {
            return Ok(hit);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let items = Arc::new(load().await?);

        if self.generation.load(Ordering::Acquire) == generation {
            self.cache.insert((), items.clone()).await;
        }
        log::debug!("{} list loaded ({} rows)", self.name, items.len());
        Ok(items)
    }

    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate(&()).await;
    }
}

/// Server-side list cache, one entry per resource name.
pub struct ResourceCache {
    pub services: ListCache<Service>,
    pub employees: ListCache<Employee>,
    pub requests: ListCache<OvertimeRequest>,
    pub delegations: ListCache<Delegation>,
    pub workflows: ListCache<Workflow>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::with_ttl(LIST_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            services: ListCache::new("services", ttl),
            employees: ListCache::new("employees", ttl),
            requests: ListCache::new("requests", ttl),
            delegations: ListCache::new("delegations", ttl),
            workflows: ListCache::new("workflows", ttl),
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[actix_web::test]
    async fn second_read_is_served_from_cache() {
        let cache: ListCache<u32> = ListCache::new("numbers", LIST_TTL);
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let list = cache
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(list.len(), 3);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn invalidate_forces_reload() {
        let cache: ListCache<u32> = ListCache::new("numbers", LIST_TTL);
        cache.get_or_load(|| async { Ok::<_, ()>(vec![1]) }).await.unwrap();
        cache.invalidate().await;

        let list = cache.get_or_load(|| async { Ok::<_, ()>(vec![1, 2]) }).await.unwrap();
        assert_eq!(*list, vec![1, 2]);
    }

    #[actix_web::test]
    async fn load_racing_an_invalidation_is_not_kept() {
        let cache: ListCache<u32> = ListCache::new("numbers", LIST_TTL);

        let stale = cache
            .get_or_load(|| async {
                cache.invalidate().await;
                Ok::<_, ()>(vec![0])
            })
            .await
            .unwrap();
        assert_eq!(*stale, vec![0]);

        let fresh = cache.get_or_load(|| async { Ok::<_, ()>(vec![9]) }).await.unwrap();
        assert_eq!(*fresh, vec![9]);
    }

    #[actix_web::test]
    async fn failed_load_is_not_cached() {
        let cache: ListCache<u32> = ListCache::new("numbers", LIST_TTL);
        let err = cache.get_or_load(|| async { Err::<Vec<u32>, _>("down") }).await;
        assert_eq!(err.unwrap_err(), "down");

        let ok = cache.get_or_load(|| async { Ok::<_, &str>(vec![4]) }).await.unwrap();
        assert_eq!(*ok, vec![4]);
    }
}

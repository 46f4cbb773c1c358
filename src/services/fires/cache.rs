use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;

use crate::time::SharedClock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Strict TTL map. Expired entries read as misses; [`TtlCache::prune_expired`] evicts them.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: ChronoDuration,
    clock: SharedClock,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: std::time::Duration, clock: SharedClock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::days(365)),
            clock,
        }
    }

    pub fn ttl(&self) -> ChronoDuration {
        self.ttl
    }

    fn is_live(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.inserted_at) < self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.value.clone())
    }

    pub async fn set(&self, key: K, value: V) {
        let inserted_at = self.clock.now();
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, inserted_at });
    }

    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub async fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| self.is_live(entry, now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn cache(clock: &Arc<ManualClock>) -> TtlCache<String, u32> {
        TtlCache::new(Duration::from_secs(300), clock.clone())
    }

    #[tokio::test]
    async fn entries_are_served_until_ttl_elapses() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&clock);
        cache.set("k".to_string(), 7).await;

        clock.advance(ChronoDuration::seconds(299));
        assert_eq!(cache.get(&"k".to_string()).await, Some(7));

        clock.advance(ChronoDuration::seconds(1));
        assert_eq!(cache.get(&"k".to_string()).await, None);
        // Reads never evict.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn prune_removes_only_expired_entries() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&clock);
        cache.set("old".to_string(), 1).await;
        clock.advance(ChronoDuration::seconds(200));
        cache.set("new".to_string(), 2).await;
        clock.advance(ChronoDuration::seconds(150));

        assert_eq!(cache.prune_expired().await, 1);
        assert_eq!(cache.get(&"old".to_string()).await, None);
        assert_eq!(cache.get(&"new".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn set_overwrites_and_restarts_ttl() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&clock);
        cache.set("k".to_string(), 1).await;
        clock.advance(ChronoDuration::seconds(250));
        cache.set("k".to_string(), 2).await;
        clock.advance(ChronoDuration::seconds(250));
        assert_eq!(cache.get(&"k".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(&clock);
        cache.set("a".to_string(), 1).await;
        cache.set("b".to_string(), 2).await;
        assert_eq!(cache.clear().await, 2);
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }
}

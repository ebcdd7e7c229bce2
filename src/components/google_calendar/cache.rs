use super::models::EventSummary;
use crate::components::storage::Store;
use crate::error::DaybookResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Today's events as captured by the last successful fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEventList {
    pub timestamp: DateTime<Utc>,
    pub events: Vec<EventSummary>,
}

impl CachedEventList {
    pub fn new(timestamp: DateTime<Utc>, events: Vec<EventSummary>) -> Self {
        Self { timestamp, events }
    }

    /// Fresh while strictly less than `duration` has passed since capture
    pub fn is_fresh(&self, now: DateTime<Utc>, duration: Duration) -> bool {
        now.signed_duration_since(self.timestamp) < duration
    }
}

/// Binary event cache kept in a [`Store`]
#[derive(Clone)]
pub struct EventCache {
    store: Arc<dyn Store>,
    key: String,
    duration: Duration,
}

impl EventCache {
    pub fn new(store: Arc<dyn Store>, key: impl Into<String>, duration: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            duration,
        }
    }

    /// Cached list if a record exists and is still fresh at `now`.
    /// Unreadable records count as a miss.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<CachedEventList> {
        let bytes = match self.store.load(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read event cache: {}", e);
                return None;
            }
        };

        match bincode::deserialize::<CachedEventList>(&bytes) {
            Ok(record) if record.is_fresh(now, self.duration) => Some(record),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable event cache: {}", e);
                None
            }
        }
    }

    /// Replace the cached record
    pub fn store(&self, record: &CachedEventList) -> DaybookResult<()> {
        let bytes = bincode::serialize(record)?;
        self.store.save(&self.key, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::storage::MemoryStore;
    use chrono::TimeZone;

    fn captured_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 28, 16, 0, 0).unwrap()
    }

    fn record() -> CachedEventList {
        CachedEventList::new(
            captured_at(),
            vec![EventSummary(
                "09:00 AM".into(),
                "05:00 PM".into(),
                Some("Google I/O".into()),
            )],
        )
    }

    #[test]
    fn freshness_boundary_is_strict() {
        let record = record();
        let window = Duration::seconds(360);

        assert!(record.is_fresh(captured_at() + Duration::seconds(359), window));
        assert!(!record.is_fresh(captured_at() + Duration::seconds(360), window));
        assert!(!record.is_fresh(captured_at() + Duration::seconds(361), window));
    }

    #[test]
    fn stored_record_is_served_until_expiry() {
        let cache = EventCache::new(
            Arc::new(MemoryStore::new()),
            "events_cache.bin",
            Duration::seconds(360),
        );
        assert!(cache.fresh(captured_at()).is_none());

        cache.store(&record()).unwrap();

        assert_eq!(
            cache.fresh(captured_at() + Duration::seconds(359)),
            Some(record())
        );
        assert!(cache.fresh(captured_at() + Duration::seconds(361)).is_none());
    }

    #[test]
    fn corrupt_record_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store.save("events_cache.bin", b"\xff\x00garbage").unwrap();
        let cache = EventCache::new(store, "events_cache.bin", Duration::seconds(360));

        assert!(cache.fresh(captured_at()).is_none());
    }
}

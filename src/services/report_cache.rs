use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::NaiveDate;
use lru::LruCache;
use tracing::debug;

use crate::models::report::PeriodReport;

/// Cap on memoized reports. Eviction drops the oldest-inserted entry: reads
/// go through `peek` and never refresh recency, so the LRU order stays the
/// insertion order.
pub const REPORT_CACHE_CAPACITY: usize = 20;

/// Request signature a memoized report is stored under. The record count is
/// part of the key so a result computed from a partial record set can never
/// shadow one computed from the full set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportCacheKey {
    pub owner_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub record_count: usize,
}

impl ReportCacheKey {
    pub fn new(
        owner_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        record_count: usize,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            start_date,
            end_date,
            record_count,
        }
    }
}

pub struct ReportCache {
    entries: Mutex<LruCache<ReportCacheKey, PeriodReport>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::with_capacity(REPORT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("non-zero cache capacity");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &ReportCacheKey) -> Option<PeriodReport> {
        let guard = self.entries.lock().expect("report cache lock poisoned");
        guard.peek(key).cloned()
    }

    /// Most recent entry matching the request triple, regardless of the
    /// record count it was computed from. This is the probe the fetch path
    /// uses before going to the store; exact-key `get` stays available for
    /// callers that already hold the records.
    pub fn lookup_request(
        &self,
        owner_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<PeriodReport> {
        let guard = self.entries.lock().expect("report cache lock poisoned");
        guard
            .iter()
            .find(|(key, _)| {
                key.owner_id == owner_id
                    && key.start_date == start_date
                    && key.end_date == end_date
            })
            .map(|(_, report)| report.clone())
    }

    pub fn put(&self, key: ReportCacheKey, report: PeriodReport) {
        let mut guard = self.entries.lock().expect("report cache lock poisoned");
        if guard.len() == guard.cap().get() && !guard.contains(&key) {
            debug!(target: "app::cache", "report cache full, evicting oldest entry");
        }
        guard.put(key, report);
    }

    pub fn invalidate(&self, key: &ReportCacheKey) {
        let mut guard = self.entries.lock().expect("report cache lock poisoned");
        guard.pop(key);
    }

    pub fn invalidate_owner(&self, owner_id: &str) {
        let mut guard = self.entries.lock().expect("report cache lock poisoned");
        let stale: Vec<ReportCacheKey> = guard
            .iter()
            .filter(|(key, _)| key.owner_id == owner_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            guard.pop(&key);
        }
    }

    pub fn invalidate_all(&self) {
        let mut guard = self.entries.lock().expect("report cache lock poisoned");
        guard.clear();
    }

    pub fn len(&self) -> usize {
        let guard = self.entries.lock().expect("report cache lock poisoned");
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

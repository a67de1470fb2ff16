//! Bounded memoization of series transforms.
//!
//! Entries are keyed by the activity's record generation, which changes on
//! every reprocess, record replacement and clone, so stale entries are never
//! reachable; eviction is plain LRU. Clearing the cache at any time only
//! costs recomputation.

use super::{
    build_series, pivot_zones, CumulativeMode, PivotZoneSettings, SeriesPoint, XAxis, ZoneBucket,
};
use crate::activity::{Activity, Field};
use lru::LruCache;
use std::num::NonZeroUsize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ZoneKey {
    generation: Uuid,
    field: String,
    settings: PivotZoneSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    generation: Uuid,
    field: String,
    axis: XAxis,
    mode: CumulativeMode,
}

/// Caller-owned cache for pivot zones and chart series.
pub struct TransformCache {
    zones: LruCache<ZoneKey, Vec<ZoneBucket>>,
    series: LruCache<SeriesKey, Vec<SeriesPoint>>,
}

impl TransformCache {
    /// Capacity used when zero entries are requested.
    pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a cache holding up to `capacity` entries of each kind.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(Self::DEFAULT_CAPACITY);
        Self {
            zones: LruCache::new(capacity),
            series: LruCache::new(capacity),
        }
    }

    /// Pivot zones of `field`, computed on first use.
    pub fn pivot_zones(
        &mut self,
        activity: &Activity,
        field: &Field,
        settings: &PivotZoneSettings,
    ) -> Vec<ZoneBucket> {
        let key = ZoneKey {
            generation: activity.generation(),
            field: field.key().to_string(),
            settings: *settings,
        };
        if let Some(buckets) = self.zones.get(&key) {
            return buckets.clone();
        }

        let buckets = pivot_zones(activity.records(), field, settings);
        self.zones.put(key, buckets.clone());
        buckets
    }

    /// Chart series of `field`, computed on first use.
    pub fn series(
        &mut self,
        activity: &Activity,
        field: &Field,
        axis: XAxis,
        mode: CumulativeMode,
    ) -> Vec<SeriesPoint> {
        let key = SeriesKey {
            generation: activity.generation(),
            field: field.key().to_string(),
            axis,
            mode,
        };
        if let Some(points) = self.series.get(&key) {
            return points.clone();
        }

        let points = build_series(activity.records(), field, axis, mode, activity.start_time);
        self.series.put(key, points.clone());
        points
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.zones.len() + self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.zones.clear();
        self.series.clear();
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY.get())
    }
}

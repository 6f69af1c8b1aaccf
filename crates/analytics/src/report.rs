use chrono::{DateTime, Utc};
use core_types::{AvailabilityStatus, ServiceType};
use serde::{Deserialize, Serialize};

/// One point of the resource chart, derived from a single `ResourceSnapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedSeriesPoint {
    /// Human-readable timestamp, e.g. `17/10 14:30`.
    pub label: String,
    pub captured_at: DateTime<Utc>,
    pub available_beds: i32,
    pub occupied_beds: i64,
    pub available_doctors: i32,
    /// Rounded per point. Zero when the snapshot has no beds.
    pub occupancy_rate_percent: i64,
}

/// Aggregates over a window of snapshots.
///
/// An empty window yields all zeros, which cannot be told apart from a window
/// whose values are all zero. Callers that need the distinction check the
/// window length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub average_occupancy_percent: i64,
    pub max_occupancy_percent: i64,
    pub minimum_available_beds: i32,
    pub average_available_doctors: i64,
}

/// The complete output of one analytics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAnalytics {
    pub window_days: u32,
    pub snapshot_count: usize,
    /// Oldest point first.
    pub series: Vec<DerivedSeriesPoint>,
    pub summary: SummaryStatistics,
}

impl ResourceAnalytics {
    pub fn is_empty(&self) -> bool {
        self.snapshot_count == 0
    }
}

/// One point of a service's queue chart, derived from a `ServiceSnapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSeriesPoint {
    pub label: String,
    pub recorded_at: DateTime<Utc>,
    pub service_type: ServiceType,
    pub queue_length: i32,
    pub wait_time_minutes: i32,
    pub capacity: i32,
    pub status: AvailabilityStatus,
}

//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations so interrupt threads never contend
//! with the controller loop. `report()` swaps the windowed counters to get a
//! consistent snapshot.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only; do NOT use them for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Event processing latency bucket boundaries (microseconds)
/// Buckets: ≤50, ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, >6400
const BUCKET_BOUNDS: [u64; 8] = [50, 100, 200, 400, 800, 1600, 3200, 6400];
const NUM_BUCKETS: usize = 9;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    // Last bucket reports 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [50, 100, 200, 400, 800, 1600, 3200, 6400, 12800];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Edges accepted past debounce (monotonic)
    edges_accepted: AtomicU64,
    /// Edges absorbed by the debounce window or wrong polarity (monotonic)
    edges_rejected: AtomicU64,
    /// Events dropped because the queue was full (monotonic)
    events_dropped: AtomicU64,
    /// Total events processed by the controller (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Events that caused no transition and no action (monotonic)
    events_ignored: AtomicU64,
    /// Sum of processing latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max processing latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Processing latency histogram (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Completed release cycles (monotonic)
    launches_ok: AtomicU64,
    /// Release cycles that faulted or could not be enqueued (monotonic)
    launches_failed: AtomicU64,
    /// Tracks successfully sent to the audio board (monotonic)
    tracks_played: AtomicU64,
    /// Audio board commands that failed (monotonic)
    audio_errors: AtomicU64,
    /// Last report time, as micros since `created_at`
    last_report_us: AtomicU64,
    created_at: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            edges_accepted: AtomicU64::new(0),
            edges_rejected: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: Default::default(),
            launches_ok: AtomicU64::new(0),
            launches_failed: AtomicU64::new(0),
            tracks_played: AtomicU64::new(0),
            audio_errors: AtomicU64::new(0),
            last_report_us: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    #[inline]
    pub fn record_edge_accepted(&self) {
        self.edges_accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_edge_rejected(&self) {
        self.edges_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_event_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one processed event and its handling latency
    #[inline]
    pub fn record_event_processed(&self, latency_us: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_launch_ok(&self) {
        self.launches_ok.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_launch_failed(&self) {
        self.launches_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_track_played(&self) {
        self.tracks_played.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_audio_error(&self) {
        self.audio_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn edges_accepted(&self) -> u64 {
        self.edges_accepted.load(Ordering::Relaxed)
    }

    pub fn edges_rejected(&self) -> u64 {
        self.edges_rejected.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn events_total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    pub fn events_ignored(&self) -> u64 {
        self.events_ignored.load(Ordering::Relaxed)
    }

    pub fn launches_ok(&self) -> u64 {
        self.launches_ok.load(Ordering::Relaxed)
    }

    pub fn launches_failed(&self) -> u64 {
        self.launches_failed.load(Ordering::Relaxed)
    }

    pub fn tracks_played(&self) -> u64 {
        self.tracks_played.load(Ordering::Relaxed)
    }

    pub fn audio_errors(&self) -> u64 {
        self.audio_errors.load(Ordering::Relaxed)
    }

    /// Snapshot and reset the windowed counters
    pub fn report(&self) -> MetricsSummary {
        let now_us = self.created_at.elapsed().as_micros() as u64;
        let last_us = self.last_report_us.swap(now_us, Ordering::Relaxed);
        let elapsed_secs = (now_us.saturating_sub(last_us)) as f64 / 1_000_000.0;

        let events = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);

        let mut buckets = [0u64; NUM_BUCKETS];
        for (i, bucket) in self.latency_buckets.iter().enumerate() {
            buckets[i] = bucket.swap(0, Ordering::Relaxed);
        }

        MetricsSummary {
            events_total: self.events_total(),
            events_per_sec: if elapsed_secs > 0.0 { events as f64 / elapsed_secs } else { 0.0 },
            avg_latency_us: if events > 0 { latency_sum / events } else { 0 },
            max_latency_us: latency_max,
            p99_latency_us: percentile_from_buckets(&buckets, 0.99),
            edges_accepted: self.edges_accepted(),
            edges_rejected: self.edges_rejected(),
            events_dropped: self.events_dropped(),
            events_ignored: self.events_ignored(),
            launches_ok: self.launches_ok(),
            launches_failed: self.launches_failed(),
            tracks_played: self.tracks_played(),
            audio_errors: self.audio_errors(),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub events_total: u64,
    pub events_per_sec: f64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    pub p99_latency_us: u64,
    pub edges_accepted: u64,
    pub edges_rejected: u64,
    pub events_dropped: u64,
    pub events_ignored: u64,
    pub launches_ok: u64,
    pub launches_failed: u64,
    pub tracks_played: u64,
    pub audio_errors: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            events_total = %self.events_total,
            events_per_sec = %format!("{:.2}", self.events_per_sec),
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            p99_latency_us = %self.p99_latency_us,
            edges_accepted = %self.edges_accepted,
            edges_rejected = %self.edges_rejected,
            events_dropped = %self.events_dropped,
            events_ignored = %self.events_ignored,
            launches_ok = %self.launches_ok,
            launches_failed = %self.launches_failed,
            tracks_played = %self.tracks_played,
            audio_errors = %self.audio_errors,
            "metrics"
        );
    }
}

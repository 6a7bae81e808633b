//! Opt-in stage timing for the render pipeline.
//!
//! Timing is collected only when the `render_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles down to running the closure.
//!
//! ```ignore
//! let mut metrics = RenderMetrics::default();
//! metrics.begin();
//! let order = metrics.time(TimingBucket::Sort, || topological_order(&deps));
//! if let Some(report) = metrics.end() {
//!     println!("sort: {} ns", report.sort_ns);
//! }
//! ```

use serde::Serialize;

/// Pipeline stages that are timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    Cull,
    Resample,
    Project,
    /// Pairwise comparison, including building the dependency lists.
    Compare,
    Sort,
    Paint,
}

/// Cumulative nanoseconds per stage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RenderTimingReport {
    pub cull_ns: u64,
    pub resample_ns: u64,
    pub project_ns: u64,
    pub compare_ns: u64,
    pub sort_ns: u64,
    pub paint_ns: u64,
}

impl RenderTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.cull_ns
            .saturating_add(self.resample_ns)
            .saturating_add(self.project_ns)
            .saturating_add(self.compare_ns)
            .saturating_add(self.sort_ns)
            .saturating_add(self.paint_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    /// Adds another report bucket by bucket.
    pub fn accumulate(&mut self, other: &Self) {
        self.cull_ns = self.cull_ns.saturating_add(other.cull_ns);
        self.resample_ns = self.resample_ns.saturating_add(other.resample_ns);
        self.project_ns = self.project_ns.saturating_add(other.project_ns);
        self.compare_ns = self.compare_ns.saturating_add(other.compare_ns);
        self.sort_ns = self.sort_ns.saturating_add(other.sort_ns);
        self.paint_ns = self.paint_ns.saturating_add(other.paint_ns);
    }
}

/// Accumulator handed through one render.
///
/// When metrics are disabled the struct is empty and [`end`](Self::end)
/// returns `None`.
#[derive(Debug, Default)]
pub struct RenderMetrics {
    #[cfg(all(feature = "render_metrics", not(target_arch = "wasm32")))]
    report: RenderTimingReport,
}

impl RenderMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "render_metrics", not(target_arch = "wasm32")))]
        {
            self.report = RenderTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<RenderTimingReport> {
        #[cfg(all(feature = "render_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "render_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, adding its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "render_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "render_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "render_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Cull => &mut self.report.cull_ns,
            TimingBucket::Resample => &mut self.report.resample_ns,
            TimingBucket::Project => &mut self.report.project_ns,
            TimingBucket::Compare => &mut self.report.compare_ns,
            TimingBucket::Sort => &mut self.report.sort_ns,
            TimingBucket::Paint => &mut self.report.paint_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

//! Per-render counters returned next to the page.

use std::fmt;

use serde::Serialize;

use super::metrics::RenderTimingReport;

/// What happened to the scene's elements during one render.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RenderDiagnostics {
    /// Scene elements considered.
    pub input_count: usize,

    /// Elements rejected by the camera (behind it, back-facing or degenerate).
    pub culled_count: usize,

    /// Elements whose projection lies entirely outside the view rectangle.
    pub offscreen_count: usize,

    /// Extra elements produced by resampling (outputs minus inputs).
    pub resampled_count: usize,

    /// Elements dropped because a vertex projected to a non-finite point.
    pub dropped_non_finite_count: usize,

    /// Elements that took part in ordering and painting.
    pub painted_count: usize,

    /// Pairwise comparisons evaluated.
    pub comparison_count: usize,

    /// Comparisons that produced a paint-before constraint.
    pub dependency_edge_count: usize,

    /// Times the sort had to emit an element with unresolved dependencies.
    pub cycles_broken: usize,

    /// Scene index of each painted element, in paint order. Resampled pieces
    /// repeat the index of the element they came from.
    pub paint_order: Vec<usize>,

    /// Stage timing; only present with the `render_metrics` feature.
    pub timing: Option<RenderTimingReport>,

    /// Human-readable notes, e.g. about broken cycles.
    pub warnings: Vec<String>,
}

impl RenderDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the paint order satisfies every comparison.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.cycles_broken == 0
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Adds the counters of another pass (used for focus-blur renders). The
    /// paint order of `other` is appended.
    pub fn merge(&mut self, other: &Self) {
        self.input_count += other.input_count;
        self.culled_count += other.culled_count;
        self.offscreen_count += other.offscreen_count;
        self.resampled_count += other.resampled_count;
        self.dropped_non_finite_count += other.dropped_non_finite_count;
        self.painted_count += other.painted_count;
        self.comparison_count += other.comparison_count;
        self.dependency_edge_count += other.dependency_edge_count;
        self.cycles_broken += other.cycles_broken;
        self.paint_order.extend_from_slice(&other.paint_order);
        self.warnings.extend(other.warnings.iter().cloned());
        match (&mut self.timing, &other.timing) {
            (Some(mine), Some(theirs)) => mine.accumulate(theirs),
            (None, Some(theirs)) => self.timing = Some(theirs.clone()),
            _ => {}
        }
    }

    /// One-line summary for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "in:{} painted:{} culled:{}",
            self.input_count, self.painted_count, self.culled_count
        )];
        if self.offscreen_count > 0 {
            parts.push(format!("offscreen:{}", self.offscreen_count));
        }
        if self.resampled_count > 0 {
            parts.push(format!("resampled:+{}", self.resampled_count));
        }
        if self.dropped_non_finite_count > 0 {
            parts.push(format!("non-finite:{}", self.dropped_non_finite_count));
        }
        parts.push(format!(
            "pairs:{} edges:{}",
            self.comparison_count, self.dependency_edge_count
        ));
        if self.cycles_broken > 0 {
            parts.push(format!("cycles:{}", self.cycles_broken));
        }
        parts.join(" ")
    }
}

impl fmt::Display for RenderDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Render Diagnostics:")?;
        writeln!(f, "  Input elements: {}", self.input_count)?;
        writeln!(f, "  Painted elements: {}", self.painted_count)?;
        writeln!(f, "  Culled: {}", self.culled_count)?;
        if self.offscreen_count > 0 {
            writeln!(f, "  Off-screen: {}", self.offscreen_count)?;
        }
        if self.resampled_count > 0 {
            writeln!(f, "  Added by resampling: {}", self.resampled_count)?;
        }
        if self.dropped_non_finite_count > 0 {
            writeln!(f, "  Dropped (non-finite projection): {}", self.dropped_non_finite_count)?;
        }
        writeln!(f, "  Comparisons: {}", self.comparison_count)?;
        writeln!(f, "  Dependency edges: {}", self.dependency_edge_count)?;
        if self.cycles_broken > 0 {
            writeln!(f, "  Cycles broken: {}", self.cycles_broken)?;
        }
        if let Some(timing) = &self.timing {
            writeln!(f, "  Time: {:.3} ms", timing.total_ms())?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}

//! Paint ordering: all-pairs comparison over a flat triangular index space and
//! a topological sort that survives cycles.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::camera::{Camera, PaintOrder, ProjectedElement};
use crate::geom::Point2;

/// Number of unordered pairs among `n` elements.
#[must_use]
pub const fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// First flat index of row `i`.
const fn row_start(i: usize, n: usize) -> usize {
    i * (n - 1) - i * i.saturating_sub(1) / 2
}

/// Flat index of the pair `(i, j)` with `i < j < n`.
#[must_use]
pub const fn pair_index(i: usize, j: usize, n: usize) -> usize {
    row_start(i, n) + (j - i - 1)
}

/// Inverse of [`pair_index`].
#[must_use]
pub fn pair_from_index(k: usize, n: usize) -> (usize, usize) {
    debug_assert!(k < pair_count(n));
    let b = 2.0 * n as f64 - 1.0;
    let estimate = ((b - (b * b - 8.0 * k as f64).max(0.0).sqrt()) / 2.0).floor();
    let mut i = (estimate.max(0.0) as usize).min(n.saturating_sub(2));
    // The float estimate can be off by one near row boundaries.
    while i > 0 && row_start(i, n) > k {
        i -= 1;
    }
    while i + 2 < n && row_start(i + 1, n) <= k {
        i += 1;
    }
    let j = k - row_start(i, n) + i + 1;
    (i, j)
}

/// Screen-space bounding box, grown by the element's painted half width.
fn bounds(item: &ProjectedElement<'_>) -> (Point2, Point2) {
    let pad = item.element.screen_half_width();
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in item.outline {
        min = Point2::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2::new(max.x.max(p.x), max.y.max(p.y));
    }
    (Point2::new(min.x - pad, min.y - pad), Point2::new(max.x + pad, max.y + pad))
}

fn boxes_overlap(a: &(Point2, Point2), b: &(Point2, Point2)) -> bool {
    a.0.x <= b.1.x && b.0.x <= a.1.x && a.0.y <= b.1.y && b.0.y <= a.1.y
}

fn compare_pair(
    camera: &dyn Camera,
    items: &[ProjectedElement<'_>],
    boxes: &[(Point2, Point2)],
    k: usize,
) -> PaintOrder {
    let (i, j) = pair_from_index(k, items.len());
    if !boxes_overlap(&boxes[i], &boxes[j]) {
        return PaintOrder::Unordered;
    }
    camera.compare(&items[i], &items[j])
}

/// Compares every unordered pair; slot `pair_index(i, j, n)` holds the result
/// for `(i, j)`.
#[cfg(feature = "parallel")]
#[must_use]
pub fn compare_pairs(camera: &dyn Camera, items: &[ProjectedElement<'_>]) -> Vec<PaintOrder> {
    let boxes: Vec<_> = items.iter().map(bounds).collect();
    (0..pair_count(items.len()))
        .into_par_iter()
        .map(|k| compare_pair(camera, items, &boxes, k))
        .collect()
}

#[cfg(not(feature = "parallel"))]
#[must_use]
pub fn compare_pairs(camera: &dyn Camera, items: &[ProjectedElement<'_>]) -> Vec<PaintOrder> {
    let boxes: Vec<_> = items.iter().map(bounds).collect();
    (0..pair_count(items.len()))
        .map(|k| compare_pair(camera, items, &boxes, k))
        .collect()
}

/// For each element, the elements that must be painted before it.
#[must_use]
pub fn dependencies(n: usize, results: &[PaintOrder]) -> Vec<Vec<usize>> {
    let mut deps = vec![Vec::new(); n];
    for (k, result) in results.iter().enumerate() {
        let (i, j) = pair_from_index(k, n);
        match result {
            PaintOrder::Before => deps[j].push(i),
            PaintOrder::After => deps[i].push(j),
            PaintOrder::Unordered => {}
        }
    }
    deps
}

/// Result of [`topological_order`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SortOutcome {
    pub order: Vec<usize>,
    /// Elements emitted while some of their dependencies were still pending.
    pub cycles_broken: usize,
}

/// Kahn's algorithm picking the lowest ready index first.
///
/// When no element is ready the dependencies form a cycle; the lowest
/// remaining index is then emitted anyway so the sort always finishes. The
/// result only depends on `deps`.
#[must_use]
pub fn topological_order(deps: &[Vec<usize>]) -> SortOutcome {
    let n = deps.len();
    let mut pending: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (node, before) in deps.iter().enumerate() {
        for &b in before {
            dependents[b].push(node);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n).filter(|&i| pending[i] == 0).map(Reverse).collect();
    let mut emitted = vec![false; n];
    let mut lowest_remaining = 0usize;
    let mut outcome = SortOutcome {
        order: Vec::with_capacity(n),
        cycles_broken: 0,
    };

    while outcome.order.len() < n {
        let node = match ready.pop() {
            Some(Reverse(node)) => node,
            None => {
                while emitted[lowest_remaining] {
                    lowest_remaining += 1;
                }
                let forced = lowest_remaining;
                log::warn!(
                    "paint order has a cycle; emitting element {forced} with {} unresolved dependencies",
                    pending[forced]
                );
                outcome.cycles_broken += 1;
                forced
            }
        };
        if emitted[node] {
            continue;
        }
        emitted[node] = true;
        outcome.order.push(node);

        for &next in &dependents[node] {
            pending[next] -= 1;
            if pending[next] == 0 && !emitted[next] {
                ready.push(Reverse(next));
            }
        }
    }
    outcome
}

//! Planar helpers for projected outlines: areas, containment, convex clipping
//! and ear-clipping triangulation.

use super::{Point2, Tolerance};

/// Signed shoelace area; positive for counter-clockwise rings.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        area += a.cross(b);
    }
    0.5 * area
}

#[must_use]
pub fn triangle_area(a: Point2, b: Point2, c: Point2) -> f64 {
    0.5 * (b - a).cross(c - a).abs()
}

/// Area-weighted centroid; falls back to the vertex average for degenerate rings.
#[must_use]
pub fn centroid(points: &[Point2]) -> Point2 {
    if points.is_empty() {
        return Point2::ORIGIN;
    }
    let area = signed_area(points);
    if area.abs() <= Tolerance::ZERO_LENGTH.eps {
        let n = points.len() as f64;
        let sum = points.iter().fold(Point2::ORIGIN, |acc, p| acc + *p);
        return sum * (1.0 / n);
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let f = a.cross(b);
        cx += (a.x + b.x) * f;
        cy += (a.y + b.y) * f;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b - a).cross(c - a)
}

/// Containment test for a convex polygon of either winding. Points on the
/// boundary count as inside.
#[must_use]
pub fn point_in_convex_polygon(p: Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let sign = signed_area(polygon).signum();
    if sign == 0.0 {
        return false;
    }
    polygon.iter().enumerate().all(|(i, a)| {
        let b = polygon[(i + 1) % polygon.len()];
        orient2d(*a, b, p) * sign >= -Tolerance::DEFAULT.eps
    })
}

/// Even-odd containment test for an arbitrary (possibly concave) ring.
#[must_use]
pub fn point_in_polygon(p: Point2, polygon: &[Point2]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Sutherland-Hodgman clip of `subject` against the convex polygon `clip`.
///
/// Returns the (possibly empty) intersection polygon.
#[must_use]
pub fn clip_convex(subject: &[Point2], clip: &[Point2]) -> Vec<Point2> {
    let sign = signed_area(clip).signum();
    if sign == 0.0 || subject.len() < 3 {
        return Vec::new();
    }

    let mut output = subject.to_vec();
    for (i, a) in clip.iter().enumerate() {
        if output.is_empty() {
            break;
        }
        let b = clip[(i + 1) % clip.len()];
        let inside = |p: Point2| orient2d(*a, b, p) * sign >= 0.0;

        let input = std::mem::take(&mut output);
        for (j, current) in input.iter().enumerate() {
            let previous = input[(j + input.len() - 1) % input.len()];
            let current_in = inside(*current);
            let previous_in = inside(previous);
            if current_in {
                if !previous_in {
                    if let Some(x) = line_intersection(previous, *current, *a, b) {
                        output.push(x);
                    }
                }
                output.push(*current);
            } else if previous_in {
                if let Some(x) = line_intersection(previous, *current, *a, b) {
                    output.push(x);
                }
            }
        }
    }
    output
}

/// Intersection of the infinite lines through `a-b` and `c-d`.
fn line_intersection(a: Point2, b: Point2, c: Point2, d: Point2) -> Option<Point2> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() <= Tolerance::ZERO_LENGTH.eps {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    Some(a + r * t)
}

/// Intersection point of the closed segments `a-b` and `c-d`, if any.
#[must_use]
pub fn segment_intersection(a: Point2, b: Point2, c: Point2, d: Point2) -> Option<Point2> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() <= Tolerance::ZERO_LENGTH.eps {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    let u = (c - a).cross(r) / denom;
    let eps = Tolerance::DEFAULT.eps;
    if (-eps..=1.0 + eps).contains(&t) && (-eps..=1.0 + eps).contains(&u) {
        Some(a + r * t)
    } else {
        None
    }
}

/// Cyrus-Beck clip of the segment `a-b` against a convex polygon.
#[must_use]
pub fn clip_segment_to_convex(a: Point2, b: Point2, polygon: &[Point2]) -> Option<(Point2, Point2)> {
    let sign = signed_area(polygon).signum();
    if sign == 0.0 {
        return None;
    }
    let direction = b - a;
    let mut t_enter: f64 = 0.0;
    let mut t_exit: f64 = 1.0;

    for (i, p) in polygon.iter().enumerate() {
        let q = polygon[(i + 1) % polygon.len()];
        let edge = q - *p;
        // Inward normal scaled by the winding sign.
        let normal = Point2::new(-edge.y, edge.x) * sign;
        let numerator = normal.dot(a - *p);
        let denominator = normal.dot(direction);
        if denominator.abs() <= Tolerance::ZERO_LENGTH.eps {
            if numerator < 0.0 {
                return None;
            }
            continue;
        }
        let t = -numerator / denominator;
        if denominator > 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
        if t_enter > t_exit {
            return None;
        }
    }
    Some((a + direction * t_enter, a + direction * t_exit))
}

#[must_use]
pub fn closest_point_on_segment(p: Point2, a: Point2, b: Point2) -> Point2 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= Tolerance::ZERO_LENGTH.eps {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

// ─────────────────────────────────────────────────────────────────────────────
// Ear clipping
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Node {
    idx: usize,
    point: Point2,
    prev: usize,
    next: usize,
}

/// Triangulates a simple polygon (no holes) by ear clipping.
///
/// The returned index triples are counter-clockwise regardless of the input
/// winding.
pub fn triangulate_polygon(points: &[Point2], tol: Tolerance) -> Result<Vec<[usize; 3]>, String> {
    if points.len() < 3 {
        return Err("polygon has fewer than 3 vertices".to_string());
    }
    let len = points.len();
    let mut nodes: Vec<Node> = points
        .iter()
        .enumerate()
        .map(|(i, point)| Node {
            idx: i,
            point: *point,
            prev: (i + len - 1) % len,
            next: (i + 1) % len,
        })
        .collect();

    let is_ccw = signed_area(points) > 0.0;
    if signed_area(points).abs() <= tol.eps {
        return Err("polygon is degenerate (zero area)".to_string());
    }

    let mut remaining = len;
    let mut ear = 0usize;
    let mut stop = ear;
    let mut triangles = Vec::with_capacity(len - 2);

    while remaining > 2 {
        let prev = nodes[ear].prev;
        let next = nodes[ear].next;
        if is_ear(prev, ear, next, &nodes, is_ccw, tol) {
            if is_ccw {
                triangles.push([nodes[prev].idx, nodes[ear].idx, nodes[next].idx]);
            } else {
                triangles.push([nodes[prev].idx, nodes[next].idx, nodes[ear].idx]);
            }
            remove_node(ear, &mut nodes);
            remaining -= 1;
            ear = next;
            stop = next;
            continue;
        }

        ear = next;
        if ear == stop {
            // A full lap without an ear: drop one collinear vertex if there is one.
            let mut cursor = ear;
            let mut removed = false;
            for _ in 0..remaining {
                let p = nodes[cursor].prev;
                let n = nodes[cursor].next;
                if orient2d(nodes[p].point, nodes[cursor].point, nodes[n].point).abs() <= tol.eps {
                    remove_node(cursor, &mut nodes);
                    remaining -= 1;
                    ear = n;
                    stop = n;
                    removed = true;
                    break;
                }
                cursor = n;
            }
            if !removed {
                return Err("failed to triangulate polygon (no ears found)".to_string());
            }
        }
    }

    Ok(triangles)
}

fn is_ear(prev: usize, ear: usize, next: usize, nodes: &[Node], is_ccw: bool, tol: Tolerance) -> bool {
    let a = nodes[prev].point;
    let b = nodes[ear].point;
    let c = nodes[next].point;

    let cross = orient2d(a, b, c);
    if is_ccw {
        if cross <= tol.eps {
            return false;
        }
    } else if cross >= -tol.eps {
        return false;
    }

    let mut p = nodes[next].next;
    let mut guard = 0usize;
    while p != prev {
        guard += 1;
        if guard > nodes.len() {
            break;
        }
        if point_in_triangle(a, b, c, nodes[p].point, is_ccw, tol) {
            return false;
        }
        p = nodes[p].next;
    }
    true
}

fn point_in_triangle(a: Point2, b: Point2, c: Point2, p: Point2, is_ccw: bool, tol: Tolerance) -> bool {
    let ab = orient2d(a, b, p);
    let bc = orient2d(b, c, p);
    let ca = orient2d(c, a, p);

    if is_ccw {
        ab >= -tol.eps && bc >= -tol.eps && ca >= -tol.eps
    } else {
        ab <= tol.eps && bc <= tol.eps && ca <= tol.eps
    }
}

fn remove_node(node: usize, nodes: &mut [Node]) {
    let prev = nodes[node].prev;
    let next = nodes[node].next;
    nodes[prev].next = next;
    nodes[next].prev = prev;
}

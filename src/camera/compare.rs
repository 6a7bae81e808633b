//! Default pairwise ordering: find a screen point covered by both elements,
//! lift it back onto each of them and compare depths there.

use crate::geom::polygon::{
    centroid, clip_convex, clip_segment_to_convex, closest_point_on_segment, point_in_convex_polygon,
    segment_intersection, signed_area,
};
use crate::geom::{Point2, Point3, Tolerance};
use crate::scene::Element;

use super::{Camera, DeprojectTarget, PaintOrder, ProjectedElement};

/// Orders two projected elements by depth at a point where they overlap.
///
/// Returns [`PaintOrder::Unordered`] when the outlines do not overlap (touching
/// edges do not count) or when either depth is not finite. Equal depths fall
/// back to the elements' z-index.
pub fn compare_elements<C: Camera + ?Sized>(
    camera: &C,
    a: &ProjectedElement<'_>,
    b: &ProjectedElement<'_>,
) -> PaintOrder {
    let Some(sample) = overlap_sample(a, b) else {
        return PaintOrder::Unordered;
    };
    let depth_a = depth_at(camera, a, sample);
    let depth_b = depth_at(camera, b, sample);
    if !(depth_a.is_finite() && depth_b.is_finite()) {
        return PaintOrder::Unordered;
    }

    let scale = depth_a.abs().max(depth_b.abs()).max(1.0);
    if (depth_a - depth_b).abs() <= Tolerance::LOOSE.eps * scale {
        return match a.element.z_index().cmp(&b.element.z_index()) {
            std::cmp::Ordering::Less => PaintOrder::Before,
            std::cmp::Ordering::Greater => PaintOrder::After,
            std::cmp::Ordering::Equal => PaintOrder::Unordered,
        };
    }
    if depth_a > depth_b { PaintOrder::Before } else { PaintOrder::After }
}

fn depth_at<C: Camera + ?Sized>(camera: &C, projected: &ProjectedElement<'_>, sample: Point2) -> f64 {
    let point: Point3 = match projected.element {
        Element::Point(point) => point.position(),
        element => match DeprojectTarget::of(element) {
            Some(target) => camera.deproject(sample, &target),
            None => return f64::NAN,
        },
    };
    camera.z_depth(point)
}

/// A screen point covered by both outlines.
fn overlap_sample(a: &ProjectedElement<'_>, b: &ProjectedElement<'_>) -> Option<Point2> {
    match (a.element, b.element) {
        (Element::Triangle(_), Element::Triangle(_)) => {
            let overlap = clip_convex(a.outline, b.outline);
            (signed_area(&overlap).abs() > Tolerance::OVERLAP.eps).then(|| centroid(&overlap))
        }
        (Element::Triangle(_), Element::Line(_)) => line_in_triangle(b.outline, a.outline),
        (Element::Line(_), Element::Triangle(_)) => line_in_triangle(a.outline, b.outline),
        (Element::Line(_), Element::Line(_)) => {
            segment_intersection(a.outline[0], a.outline[1], b.outline[0], b.outline[1])
        }
        (Element::Point(_), _) => disc_sample(a, b),
        (_, Element::Point(_)) => disc_sample(b, a),
    }
}

fn line_in_triangle(line: &[Point2], triangle: &[Point2]) -> Option<Point2> {
    let (start, end) = clip_segment_to_convex(line[0], line[1], triangle)?;
    (start.distance_squared_to(end) > Tolerance::OVERLAP.eps_squared()).then(|| start.lerp(end, 0.5))
}

/// Overlap between a point's disc and any other element, sampled on the other
/// element so that its depth can be recovered.
fn disc_sample(disc: &ProjectedElement<'_>, other: &ProjectedElement<'_>) -> Option<Point2> {
    let center = disc.outline[0];
    let reach = disc.element.screen_half_width() + other.element.screen_half_width();
    let within = |p: Point2| p.distance_squared_to(center) <= reach * reach;

    match other.element {
        Element::Point(_) => within(other.outline[0]).then_some(center),
        Element::Line(_) => {
            let nearest = closest_point_on_segment(center, other.outline[0], other.outline[1]);
            within(nearest).then_some(nearest)
        }
        Element::Triangle(_) => {
            if point_in_convex_polygon(center, other.outline) {
                return Some(center);
            }
            let outline = other.outline;
            (0..outline.len())
                .map(|i| closest_point_on_segment(center, outline[i], outline[(i + 1) % outline.len()]))
                .filter(|p| within(*p))
                .min_by(|p, q| p.distance_squared_to(center).total_cmp(&q.distance_squared_to(center)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrthographicCamera, PerspectiveCamera};
    use crate::geom::Vec3;
    use crate::scene::{LineElement, PointElement, TriangleElement};
    use crate::surface::Colour;

    /// Camera-facing triangle at depth `z` covering roughly `x0..x0+2`.
    fn facing_triangle(x0: f64, z: f64) -> Element {
        TriangleElement::new(
            Point3::new(x0, 0.0, z),
            Point3::new(x0, 2.0, z),
            Point3::new(x0 + 2.0, 0.0, z),
            Vec::new(),
        )
        .unwrap()
        .into()
    }

    fn project<C: Camera>(camera: &C, element: &Element) -> Vec<Point2> {
        element.vertices().iter().map(|p| camera.project(*p)).collect()
    }

    fn compare<C: Camera>(camera: &C, a: &Element, b: &Element) -> PaintOrder {
        let (pa, pb) = (project(camera, a), project(camera, b));
        camera.compare(
            &ProjectedElement { element: a, outline: &pa },
            &ProjectedElement { element: b, outline: &pb },
        )
    }

    fn perspective() -> PerspectiveCamera {
        PerspectiveCamera::new(Point3::new(0.5, 0.5, -10.0), Vec3::Z, 5.0).unwrap()
    }

    #[test]
    fn farther_triangle_paints_first() {
        let cam = perspective();
        let near = facing_triangle(0.0, 0.0);
        let far = facing_triangle(0.5, 3.0);
        assert_eq!(compare(&cam, &far, &near), PaintOrder::Before);
        assert_eq!(compare(&cam, &near, &far), PaintOrder::After);
    }

    #[test]
    fn disjoint_triangles_are_unordered() {
        let cam = perspective();
        let left = facing_triangle(-10.0, 0.0);
        let right = facing_triangle(10.0, 1.0);
        assert_eq!(compare(&cam, &left, &right), PaintOrder::Unordered);
    }

    #[test]
    fn triangles_sharing_an_edge_are_unordered() {
        let cam = OrthographicCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z).unwrap();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        let c = Point3::new(1.0, 0.0, 0.0);
        let d = Point3::new(1.0, 1.0, 1.0);
        let first: Element = TriangleElement::new(a, b, c, Vec::new()).unwrap().into();
        let second: Element = TriangleElement::new(b, d, c, Vec::new()).unwrap().into();
        assert_eq!(compare(&cam, &first, &second), PaintOrder::Unordered);
    }

    #[test]
    fn line_in_front_of_triangle_paints_after() {
        let cam = perspective();
        let triangle = facing_triangle(0.0, 2.0);
        let line: Element = LineElement::new(Point3::new(-1.0, 0.5, 0.0), Point3::new(3.0, 0.5, 0.0), Colour::BLACK, 1.0).into();
        assert_eq!(compare(&cam, &triangle, &line), PaintOrder::Before);
    }

    #[test]
    fn crossing_lines_compare_at_intersection() {
        let cam = OrthographicCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z).unwrap();
        let back: Element =
            LineElement::new(Point3::new(-1.0, 0.0, 4.0), Point3::new(1.0, 0.0, 4.0), Colour::BLACK, 1.0).into();
        let front: Element =
            LineElement::new(Point3::new(0.0, -1.0, 2.0), Point3::new(0.0, 1.0, 6.0), Colour::BLACK, 1.0).into();
        // At the crossing the second line sits at z = 4 as well, so it is a tie.
        assert_eq!(compare(&cam, &back, &front), PaintOrder::Unordered);

        let nearer: Element =
            LineElement::new(Point3::new(0.0, -1.0, 1.0), Point3::new(0.0, 1.0, 3.0), Colour::BLACK, 1.0).into();
        assert_eq!(compare(&cam, &back, &nearer), PaintOrder::Before);
    }

    #[test]
    fn equal_depth_falls_back_to_z_index() {
        let cam = OrthographicCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z).unwrap();
        let triangle = facing_triangle(0.0, 0.0);
        let mut line: Element =
            LineElement::new(Point3::new(0.0, 0.5, 0.0), Point3::new(1.0, 0.5, 0.0), Colour::BLACK, 1.0).into();
        line.meta_mut().z_index = 1;
        assert_eq!(compare(&cam, &triangle, &line), PaintOrder::Before);
        assert_eq!(compare(&cam, &line, &triangle), PaintOrder::After);
    }

    #[test]
    fn point_disc_overlapping_triangle_edge() {
        let cam = OrthographicCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z).unwrap();
        let triangle = facing_triangle(0.0, 5.0);
        let touching: Element = PointElement::new(Point3::new(-0.4, 1.0, 1.0), Colour::BLACK, 1.0).into();
        let apart: Element = PointElement::new(Point3::new(-0.6, 1.0, 1.0), Colour::BLACK, 1.0).into();
        assert_eq!(compare(&cam, &triangle, &touching), PaintOrder::Before);
        assert_eq!(compare(&cam, &triangle, &apart), PaintOrder::Unordered);
    }

    #[test]
    fn overlapping_points() {
        let cam = perspective();
        let a: Element = PointElement::new(Point3::new(0.0, 0.0, 0.0), Colour::BLACK, 2.0).into();
        let b: Element = PointElement::new(Point3::new(0.1, 0.0, 4.0), Colour::BLACK, 2.0).into();
        assert_eq!(compare(&cam, &a, &b), PaintOrder::After);
    }
}

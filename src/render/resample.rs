//! Screen-space subdivision of elements that project too large.

use std::borrow::Cow;

use super::project_outline;
use crate::camera::Camera;
use crate::geom::Point2;
use crate::geom::polygon::triangle_area;
use crate::scene::{Element, LineElement, TriangleElement};

/// Splits `element` until every piece is small enough on screen.
///
/// Lines are halved at their 3D midpoint while the squared projected length
/// exceeds `max_size`; triangles are quartered at their edge midpoints while
/// the projected area exceeds `max_size`. Recursion stops after `max_depth`
/// levels. Elements that need no split are returned borrowed.
#[must_use]
pub fn resample<'a>(element: &'a Element, camera: &dyn Camera, max_size: f64, max_depth: u32) -> Vec<Cow<'a, Element>> {
    let outline = project_outline(camera, element);
    resample_projected(element, &outline, camera, max_size, max_depth)
}

/// [`resample`] for an element whose projected `outline` is already known.
///
/// The outline decides whether the element is split at all, so an element
/// that fits is returned without projecting anything. Only the pieces created
/// by splitting are projected.
#[must_use]
pub fn resample_projected<'a>(
    element: &'a Element,
    outline: &[Point2],
    camera: &dyn Camera,
    max_size: f64,
    max_depth: u32,
) -> Vec<Cow<'a, Element>> {
    if max_depth == 0 {
        return vec![Cow::Borrowed(element)];
    }
    match element {
        Element::Line(line) if matches!(outline, [a, b] if line_too_long(*a, *b, max_size)) => {
            let mut pieces = Vec::new();
            let (first, second) = line.split();
            split_line(first, camera, max_size, max_depth - 1, &mut pieces);
            split_line(second, camera, max_size, max_depth - 1, &mut pieces);
            pieces.into_iter().map(|piece| Cow::Owned(Element::Line(piece))).collect()
        }
        Element::Triangle(triangle) if matches!(outline, [a, b, c] if triangle_area(*a, *b, *c) > max_size) => {
            let mut pieces = Vec::new();
            for child in triangle.subdivide() {
                split_triangle(child, camera, max_size, max_depth - 1, &mut pieces);
            }
            pieces.into_iter().map(|piece| Cow::Owned(Element::Triangle(piece))).collect()
        }
        _ => vec![Cow::Borrowed(element)],
    }
}

fn line_too_long(a: Point2, b: Point2, max_size: f64) -> bool {
    // NaN compares false, so non-finite projections are never split.
    a.distance_squared_to(b) > max_size
}

fn triangle_too_large(triangle: &TriangleElement, camera: &dyn Camera, max_size: f64) -> bool {
    let [a, b, c] = triangle.vertices().map(|p| camera.project(p));
    triangle_area(a, b, c) > max_size
}

fn split_line(line: LineElement, camera: &dyn Camera, max_size: f64, depth: u32, out: &mut Vec<LineElement>) {
    if depth == 0 || !line_too_long(camera.project(line.start()), camera.project(line.end()), max_size) {
        out.push(line);
        return;
    }
    let (first, second) = line.split();
    split_line(first, camera, max_size, depth - 1, out);
    split_line(second, camera, max_size, depth - 1, out);
}

fn split_triangle(
    triangle: TriangleElement,
    camera: &dyn Camera,
    max_size: f64,
    depth: u32,
    out: &mut Vec<TriangleElement>,
) {
    if depth == 0 || !triangle_too_large(&triangle, camera, max_size) {
        out.push(triangle);
        return;
    }
    for child in triangle.subdivide() {
        split_triangle(child, camera, max_size, depth - 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrthographicCamera, PerspectiveCamera};
    use crate::geom::{Point3, Vec3};
    use crate::scene::PointElement;
    use crate::surface::Colour;

    fn ortho() -> OrthographicCamera {
        OrthographicCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z).unwrap()
    }

    fn projected_area(camera: &dyn Camera, pieces: &[Cow<'_, Element>]) -> f64 {
        pieces
            .iter()
            .map(|piece| {
                let p: Vec<Point2> = piece.vertices().iter().map(|v| camera.project(*v)).collect();
                triangle_area(p[0], p[1], p[2])
            })
            .sum()
    }

    #[test]
    fn points_and_small_elements_are_borrowed() {
        let cam = ortho();
        let point = Element::from(PointElement::new(Point3::ORIGIN, Colour::BLACK, 100.0));
        let short = Element::from(LineElement::new(Point3::ORIGIN, Point3::new(0.5, 0.0, 0.0), Colour::BLACK, 1.0));
        for element in [&point, &short] {
            let out = resample(element, &cam, 1.0, 8);
            assert_eq!(out.len(), 1);
            assert!(matches!(out[0], Cow::Borrowed(_)));
        }
    }

    #[test]
    fn line_splits_into_power_of_two_pieces() {
        let cam = ortho();
        let line = Element::from(
            LineElement::new(Point3::ORIGIN, Point3::new(8.0, 0.0, 0.0), Colour::BLACK, 2.0).with_dash(
                crate::surface::LineDash::new(1.0, 1.0, 0.0),
            ),
        );
        // Squared length 64 must drop to at most 1: eight pieces of length 1.
        let out = resample(&line, &cam, 1.0, 8);
        assert_eq!(out.len(), 8);
        for piece in &out {
            let Element::Line(l) = piece.as_ref() else {
                panic!("expected line");
            };
            assert!((l.start().distance_to(l.end()) - 1.0).abs() < 1e-12);
            assert_eq!(l.thickness, 2.0);
            assert!(!l.dash.is_solid());
        }
    }

    #[test]
    fn triangle_splits_into_power_of_four_and_keeps_area() {
        let cam = ortho();
        let triangle = Element::from(
            TriangleElement::new(
                Point3::ORIGIN,
                Point3::new(0.0, 4.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Vec::new(),
            )
            .unwrap(),
        );
        // Area 8 -> 2 -> 0.5.
        let out = resample(&triangle, &cam, 1.0, 8);
        assert_eq!(out.len(), 16);
        assert!((projected_area(&cam, &out) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn known_outline_decides_the_first_split() {
        let cam = ortho();
        let line = Element::from(LineElement::new(Point3::ORIGIN, Point3::new(8.0, 0.0, 0.0), Colour::BLACK, 1.0));
        let short = [Point2::ORIGIN, Point2::new(0.5, 0.0)];
        let out = resample_projected(&line, &short, &cam, 1.0, 8);
        assert!(matches!(out[..], [Cow::Borrowed(_)]));

        let outline = project_outline(&cam, &line);
        assert_eq!(resample_projected(&line, &outline, &cam, 1.0, 8).len(), 8);
        // An outline that does not fit the element is never split.
        assert_eq!(resample_projected(&line, &[], &cam, 1.0, 8).len(), 1);
    }

    #[test]
    fn depth_limit_caps_subdivision() {
        let cam = ortho();
        let triangle = Element::from(
            TriangleElement::new(
                Point3::ORIGIN,
                Point3::new(0.0, 100.0, 0.0),
                Point3::new(100.0, 0.0, 0.0),
                Vec::new(),
            )
            .unwrap(),
        );
        assert_eq!(resample(&triangle, &cam, 1e-6, 2).len(), 16);
        assert_eq!(resample(&triangle, &cam, 1e-6, 0).len(), 1);
    }

    #[test]
    fn perspective_resampling_preserves_projected_area() {
        let cam = PerspectiveCamera::new(Point3::new(0.0, 0.0, -4.0), Vec3::Z, 2.0).unwrap();
        let triangle = Element::from(
            TriangleElement::new(
                Point3::new(-3.0, -1.0, 0.0),
                Point3::new(-3.0, 2.0, 6.0),
                Point3::new(3.0, -1.0, 1.0),
                Vec::new(),
            )
            .unwrap(),
        );
        let original = projected_area(&cam, &[Cow::Borrowed(&triangle)]);
        let out = resample(&triangle, &cam, original / 20.0, 8);
        assert!(out.len() > 4);
        assert!((projected_area(&cam, &out) - original).abs() < 1e-9 * original.max(1.0));
    }
}

//! Convenience builders that add common shapes to a [`Scene`].
//!
//! Closed solids are wound counter-clockwise when seen from outside, so every
//! generated face normal points away from the solid.

use std::collections::HashSet;
use std::f64::consts::{PI, TAU};
use std::ops::Range;
use std::sync::Arc;

use crate::geom::polygon::{signed_area, triangulate_polygon};
use crate::geom::{Point2, Point3, Tolerance, Vec3};
use crate::material::Material;
use crate::surface::Colour;

use super::{Element, LineElement, PointElement, Scene, SceneError, TriangleElement};

type Fill = Vec<Arc<dyn Material>>;

fn ensure_finite(points: &[Point3]) -> Result<(), SceneError> {
    if points.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(SceneError::NonFinitePoint)
    }
}

fn ensure_positive_size(size: f64) -> Result<(), SceneError> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(SceneError::InvalidSize { size })
    }
}

impl Scene {
    fn add_all(&mut self, elements: Vec<Element>) -> Range<usize> {
        let start = self.len();
        for element in elements {
            self.add(element);
        }
        start..self.len()
    }

    pub fn add_point(&mut self, position: Point3, colour: Colour, diameter: f64) -> Result<usize, SceneError> {
        ensure_finite(&[position])?;
        Ok(self.add(PointElement::new(position, colour, diameter)))
    }

    pub fn add_points(
        &mut self,
        positions: &[Point3],
        colour: Colour,
        diameter: f64,
    ) -> Result<Range<usize>, SceneError> {
        ensure_finite(positions)?;
        let elements = positions
            .iter()
            .map(|p| PointElement::new(*p, colour, diameter).into())
            .collect();
        Ok(self.add_all(elements))
    }

    pub fn add_line(
        &mut self,
        start: Point3,
        end: Point3,
        colour: Colour,
        thickness: f64,
    ) -> Result<usize, SceneError> {
        ensure_finite(&[start, end])?;
        Ok(self.add(LineElement::new(start, end, colour, thickness)))
    }

    pub fn add_triangle(&mut self, a: Point3, b: Point3, c: Point3, fill: Fill) -> Result<usize, SceneError> {
        let triangle = TriangleElement::new(a, b, c, fill)?;
        Ok(self.add(triangle))
    }

    /// Parallelogram spanned by `u` and `v` from `corner`; faces along `u x v`.
    pub fn add_rectangle(&mut self, corner: Point3, u: Vec3, v: Vec3, fill: Fill) -> Result<Range<usize>, SceneError> {
        let triangles = rectangle(corner, u, v, &fill)?;
        Ok(self.add_all(triangles))
    }

    /// Axis-aligned box centred on `center` with full edge lengths `size`.
    pub fn add_cuboid(&mut self, center: Point3, size: Vec3, fill: Fill) -> Result<Range<usize>, SceneError> {
        ensure_finite(&[center])?;
        for s in size.to_array() {
            ensure_positive_size(s)?;
        }
        let (hx, hy, hz) = (size.x * 0.5, size.y * 0.5, size.z * 0.5);
        let (dx, dy, dz) = (Vec3::new(size.x, 0.0, 0.0), Vec3::new(0.0, size.y, 0.0), Vec3::new(0.0, 0.0, size.z));
        let at = |x: f64, y: f64, z: f64| Point3::new(center.x + x, center.y + y, center.z + z);

        let faces = [
            (at(hx, -hy, -hz), dy, dz),   // +x
            (at(-hx, -hy, -hz), dz, dy),  // -x
            (at(-hx, hy, -hz), dz, dx),   // +y
            (at(-hx, -hy, -hz), dx, dz),  // -y
            (at(-hx, -hy, hz), dx, dy),   // +z
            (at(-hx, -hy, -hz), dy, dx),  // -z
        ];
        let mut triangles = Vec::with_capacity(12);
        for (corner, u, v) in faces {
            triangles.extend(rectangle(corner, u, v, &fill)?);
        }
        Ok(self.add_all(triangles))
    }

    pub fn add_cube(&mut self, center: Point3, size: f64, fill: Fill) -> Result<Range<usize>, SceneError> {
        self.add_cuboid(center, Vec3::new(size, size, size), fill)
    }

    /// UV sphere with the poles on the y axis and smooth per-vertex normals.
    ///
    /// `rings` counts latitude bands (at least 2), `segments` longitude slices
    /// (at least 3).
    pub fn add_sphere(
        &mut self,
        center: Point3,
        radius: f64,
        rings: usize,
        segments: usize,
        fill: Fill,
    ) -> Result<Range<usize>, SceneError> {
        ensure_finite(&[center])?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SceneError::InvalidRadius { radius });
        }
        if rings < 2 {
            return Err(SceneError::InvalidResolution { min: 2 });
        }
        if segments < 3 {
            return Err(SceneError::InvalidResolution { min: 3 });
        }

        let direction = |ring: usize, segment: usize| {
            let theta = PI * ring as f64 / rings as f64;
            let phi = TAU * (segment % segments) as f64 / segments as f64;
            let (sin_t, cos_t) = theta.sin_cos();
            let (sin_p, cos_p) = phi.sin_cos();
            Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p)
        };
        let vertex = |n: Vec3| center + n * radius;

        let mut triangles = Vec::with_capacity(2 * rings * segments);
        for i in 0..rings {
            for j in 0..segments {
                let n00 = direction(i, j);
                let n01 = direction(i, j + 1);
                let n10 = direction(i + 1, j);
                let n11 = direction(i + 1, j + 1);

                // The first band collapses onto the north pole, the last onto the south one.
                if i > 0 {
                    let t = TriangleElement::new(vertex(n00), vertex(n01), vertex(n10), fill.clone())?
                        .with_vertex_normals([n00, n01, n10])?;
                    triangles.push(t.into());
                }
                if i + 1 < rings {
                    let t = TriangleElement::new(vertex(n01), vertex(n11), vertex(n10), fill.clone())?
                        .with_vertex_normals([n01, n11, n10])?;
                    triangles.push(t.into());
                }
            }
        }
        Ok(self.add_all(triangles))
    }

    /// Planar simple polygon given in the 2D frame (`origin`, `x_axis`, `y_axis`).
    ///
    /// The face normal is `x_axis x y_axis` whatever the winding of `points`.
    pub fn add_polygon(
        &mut self,
        points: &[Point2],
        origin: Point3,
        x_axis: Vec3,
        y_axis: Vec3,
        fill: Fill,
    ) -> Result<Range<usize>, SceneError> {
        let frame = PlaneFrame::new(origin, x_axis, y_axis)?;
        let triangles = frame.cap(points, 0.0, false, &fill)?;
        Ok(self.add_all(triangles))
    }

    /// Extrudes a planar polygon by `height` along `x_axis x y_axis`, with caps.
    pub fn add_prism(
        &mut self,
        points: &[Point2],
        origin: Point3,
        x_axis: Vec3,
        y_axis: Vec3,
        height: f64,
        fill: Fill,
    ) -> Result<Range<usize>, SceneError> {
        ensure_positive_size(height)?;
        let frame = PlaneFrame::new(origin, x_axis, y_axis)?;

        let mut ring = points.to_vec();
        if signed_area(&ring) < 0.0 {
            ring.reverse();
        }

        let mut triangles = frame.cap(&ring, 0.0, true, &fill)?;
        triangles.extend(frame.cap(&ring, height, false, &fill)?);

        for (i, a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            let (a0, b0) = (frame.point(*a, 0.0), frame.point(b, 0.0));
            let (a1, b1) = (frame.point(*a, height), frame.point(b, height));
            if Tolerance::ZERO_LENGTH.approx_eq_point3(a0, b0) {
                continue;
            }
            triangles.push(TriangleElement::new(a0, b0, b1, fill.clone())?.into());
            triangles.push(TriangleElement::new(a0, b1, a1, fill.clone())?.into());
        }
        Ok(self.add_all(triangles))
    }

    /// Adds one line per distinct triangle edge found in `elements`.
    pub fn add_wireframe(&mut self, elements: Range<usize>, colour: Colour, thickness: f64) -> Range<usize> {
        let mut seen: HashSet<[u64; 6]> = HashSet::new();
        let mut lines = Vec::new();
        for element in self.elements.get(elements).unwrap_or_default() {
            let Element::Triangle(triangle) = element else {
                continue;
            };
            let vertices = triangle.vertices();
            for i in 0..3 {
                let a = vertices[i];
                let b = vertices[(i + 1) % 3];
                if seen.insert(edge_key(a, b)) {
                    lines.push(LineElement::new(a, b, colour, thickness).into());
                }
            }
        }
        self.add_all(lines)
    }
}

/// Order-independent bitwise key for an edge.
fn edge_key(a: Point3, b: Point3) -> [u64; 6] {
    let ka = a.to_array().map(f64::to_bits);
    let kb = b.to_array().map(f64::to_bits);
    let (lo, hi) = if ka <= kb { (ka, kb) } else { (kb, ka) };
    [lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]]
}

fn rectangle(corner: Point3, u: Vec3, v: Vec3, fill: &Fill) -> Result<Vec<Element>, SceneError> {
    ensure_finite(&[corner])?;
    if !(u.is_finite() && v.is_finite()) {
        return Err(SceneError::InvalidDirection);
    }
    let a = corner;
    let b = corner + u;
    let c = corner + u + v;
    let d = corner + v;
    Ok(vec![
        TriangleElement::new(a, b, c, fill.clone())?.into(),
        TriangleElement::new(a, c, d, fill.clone())?.into(),
    ])
}

struct PlaneFrame {
    origin: Point3,
    x_axis: Vec3,
    y_axis: Vec3,
    normal: Vec3,
}

impl PlaneFrame {
    fn new(origin: Point3, x_axis: Vec3, y_axis: Vec3) -> Result<Self, SceneError> {
        ensure_finite(&[origin])?;
        let normal = x_axis
            .cross(y_axis)
            .normalized()
            .ok_or(SceneError::InvalidDirection)?;
        Ok(Self {
            origin,
            x_axis,
            y_axis,
            normal: normal.to_vec3(),
        })
    }

    fn point(&self, p: Point2, offset: f64) -> Point3 {
        self.origin + self.x_axis * p.x + self.y_axis * p.y + self.normal * offset
    }

    /// Triangulated polygon at `offset` along the normal; `flip` makes it face
    /// the other way.
    fn cap(&self, points: &[Point2], offset: f64, flip: bool, fill: &Fill) -> Result<Vec<Element>, SceneError> {
        if points.len() < 3 {
            return Err(SceneError::NotEnoughPoints { min: 3 });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(SceneError::NonFinitePoint);
        }
        if signed_area(points).abs() <= Tolerance::ZERO_LENGTH.eps {
            return Err(SceneError::DegeneratePolygon);
        }
        let indices = triangulate_polygon(points, Tolerance::ZERO_LENGTH).map_err(SceneError::Triangulation)?;

        let mut triangles = Vec::with_capacity(indices.len());
        for [i, j, k] in indices {
            let (a, b, c) = (
                self.point(points[i], offset),
                self.point(points[j], offset),
                self.point(points[k], offset),
            );
            let triangle = if flip {
                TriangleElement::new(a, c, b, fill.clone())?
            } else {
                TriangleElement::new(a, b, c, fill.clone())?
            };
            triangles.push(triangle.into());
        }
        Ok(triangles)
    }
}

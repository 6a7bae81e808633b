use std::fmt;
use std::sync::Arc;

use crate::geom::{NormalizedVec3, Point3, Tolerance, Transform, Vec3};
use crate::material::Material;
use crate::surface::{Colour, LineCap, LineDash};

use super::SceneError;

/// Properties shared by every element kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementMeta {
    /// Carried through to the drawing surface for hit-testing.
    pub tag: Option<String>,
    /// Tie-break between overlapping elements at equal depth; lower paints first.
    pub z_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Point,
    Line,
    Triangle,
}

// ─────────────────────────────────────────────────────────────────────────────
// Point
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PointElement {
    position: [Point3; 1],
    pub colour: Colour,
    /// Diameter in surface units.
    pub diameter: f64,
    pub meta: ElementMeta,
}

impl PointElement {
    #[must_use]
    pub fn new(position: Point3, colour: Colour, diameter: f64) -> Self {
        Self {
            position: [position],
            colour,
            diameter,
            meta: ElementMeta::default(),
        }
    }

    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position[0]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LineElement {
    points: [Point3; 2],
    pub colour: Colour,
    /// Stroke thickness in surface units.
    pub thickness: f64,
    pub cap: LineCap,
    pub dash: LineDash,
    pub meta: ElementMeta,
}

impl LineElement {
    #[must_use]
    pub fn new(start: Point3, end: Point3, colour: Colour, thickness: f64) -> Self {
        Self {
            points: [start, end],
            colour,
            thickness,
            cap: LineCap::Butt,
            dash: LineDash::SOLID,
            meta: ElementMeta::default(),
        }
    }

    #[must_use]
    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    #[must_use]
    pub fn with_dash(mut self, dash: LineDash) -> Self {
        self.dash = dash;
        self
    }

    #[must_use]
    pub const fn start(&self) -> Point3 {
        self.points[0]
    }

    #[must_use]
    pub const fn end(&self) -> Point3 {
        self.points[1]
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        Tolerance::ZERO_LENGTH.approx_eq_point3(self.start(), self.end())
    }

    /// Splits the segment at its midpoint, keeping every style attribute.
    #[must_use]
    pub fn split(&self) -> (Self, Self) {
        let mid = self.start().midpoint(self.end());
        let mut first = self.clone();
        let mut second = self.clone();
        first.points = [self.start(), mid];
        second.points = [mid, self.end()];
        (first, second)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Triangle
// ─────────────────────────────────────────────────────────────────────────────

/// A filled triangle.
///
/// The face normal follows the winding: `(v1 - v0) x (v2 - v0)`. Builders wind
/// closed solids counter-clockwise seen from outside, so the face normal points
/// outward and back faces can be culled.
#[derive(Clone)]
pub struct TriangleElement {
    vertices: [Point3; 3],
    vertex_normals: [NormalizedVec3; 3],
    centroid: Point3,
    normal: NormalizedVec3,
    /// Materials applied in order when the triangle is painted.
    pub fill: Vec<Arc<dyn Material>>,
    pub meta: ElementMeta,
}

impl TriangleElement {
    /// Creates a flat-shaded triangle. Fails if the vertices are collinear.
    pub fn new(a: Point3, b: Point3, c: Point3, fill: Vec<Arc<dyn Material>>) -> Result<Self, SceneError> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(SceneError::NonFinitePoint);
        }
        let cross = (b - a).cross(c - a);
        if Tolerance::ZERO_LENGTH.is_zero_vec3(cross) {
            return Err(SceneError::DegenerateTriangle);
        }
        let normal = cross.normalized().ok_or(SceneError::DegenerateTriangle)?;
        Ok(Self {
            vertices: [a, b, c],
            vertex_normals: [normal; 3],
            centroid: centroid_of(a, b, c),
            normal,
            fill,
            meta: ElementMeta::default(),
        })
    }

    /// Replaces the per-vertex normals (used for smooth shading).
    pub fn with_vertex_normals(mut self, normals: [Vec3; 3]) -> Result<Self, SceneError> {
        let mut normalized = [self.normal; 3];
        for (slot, n) in normalized.iter_mut().zip(normals) {
            *slot = n.normalized().ok_or(SceneError::InvalidDirection)?;
        }
        self.vertex_normals = normalized;
        Ok(self)
    }

    #[must_use]
    pub const fn vertices(&self) -> &[Point3; 3] {
        &self.vertices
    }

    #[must_use]
    pub const fn vertex_normals(&self) -> &[NormalizedVec3; 3] {
        &self.vertex_normals
    }

    #[must_use]
    pub const fn centroid(&self) -> Point3 {
        self.centroid
    }

    #[must_use]
    pub const fn normal(&self) -> NormalizedVec3 {
        self.normal
    }

    /// Splits into four triangles at the edge midpoints: three corner triangles
    /// followed by the centre one. Midpoint normals are the renormalized average
    /// of the two edge-end normals; all children keep the parent's winding.
    #[must_use]
    pub fn subdivide(&self) -> [Self; 4] {
        let [a, b, c] = self.vertices;
        let [na, nb, nc] = self.vertex_normals;
        let ab = a.midpoint(b);
        let bc = b.midpoint(c);
        let ca = c.midpoint(a);
        let nab = self.blend_normals(na, nb);
        let nbc = self.blend_normals(nb, nc);
        let nca = self.blend_normals(nc, na);

        [
            self.child([a, ab, ca], [na, nab, nca]),
            self.child([ab, b, bc], [nab, nb, nbc]),
            self.child([ca, bc, c], [nca, nbc, nc]),
            self.child([ab, bc, ca], [nab, nbc, nca]),
        ]
    }

    fn blend_normals(&self, n0: NormalizedVec3, n1: NormalizedVec3) -> NormalizedVec3 {
        (n0.to_vec3() + n1.to_vec3()).normalized().unwrap_or(self.normal)
    }

    fn child(&self, vertices: [Point3; 3], vertex_normals: [NormalizedVec3; 3]) -> Self {
        let [a, b, c] = vertices;
        Self {
            vertices,
            vertex_normals,
            centroid: centroid_of(a, b, c),
            normal: self.normal,
            fill: self.fill.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl fmt::Debug for TriangleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriangleElement")
            .field("vertices", &self.vertices)
            .field("normal", &self.normal)
            .field("fill", &self.fill.len())
            .field("meta", &self.meta)
            .finish()
    }
}

fn centroid_of(a: Point3, b: Point3, c: Point3) -> Point3 {
    Point3::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0, (a.z + b.z + c.z) / 3.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Element
// ─────────────────────────────────────────────────────────────────────────────

/// A renderable scene primitive.
#[derive(Debug, Clone)]
pub enum Element {
    Point(PointElement),
    Line(LineElement),
    Triangle(TriangleElement),
}

impl Element {
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Point(_) => ElementKind::Point,
            Self::Line(_) => ElementKind::Line,
            Self::Triangle(_) => ElementKind::Triangle,
        }
    }

    /// The 3D vertices; their projections form the element's 2D outline.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        match self {
            Self::Point(point) => &point.position,
            Self::Line(line) => &line.points,
            Self::Triangle(triangle) => &triangle.vertices,
        }
    }

    #[must_use]
    pub const fn meta(&self) -> &ElementMeta {
        match self {
            Self::Point(point) => &point.meta,
            Self::Line(line) => &line.meta,
            Self::Triangle(triangle) => &triangle.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ElementMeta {
        match self {
            Self::Point(point) => &mut point.meta,
            Self::Line(line) => &mut line.meta,
            Self::Triangle(triangle) => &mut triangle.meta,
        }
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.meta().tag.as_deref()
    }

    #[must_use]
    pub const fn z_index(&self) -> i32 {
        self.meta().z_index
    }

    /// Half the painted width in surface units (point radius, half stroke).
    #[must_use]
    pub fn screen_half_width(&self) -> f64 {
        match self {
            Self::Point(point) => point.diameter * 0.5,
            Self::Line(line) => line.thickness * 0.5,
            Self::Triangle(_) => 0.0,
        }
    }

    /// Returns a copy of the element with `transform` applied.
    pub fn transformed(&self, transform: &Transform) -> Result<Self, SceneError> {
        Ok(match self {
            Self::Point(point) => {
                let mut out = point.clone();
                out.position = [transform.apply_point(point.position())];
                Self::Point(out)
            }
            Self::Line(line) => {
                let mut out = line.clone();
                out.points = [transform.apply_point(line.start()), transform.apply_point(line.end())];
                Self::Line(out)
            }
            Self::Triangle(triangle) => {
                let [a, b, c] = triangle.vertices.map(|p| transform.apply_point(p));
                let mut normals = [Vec3::ZERO; 3];
                for (slot, n) in normals.iter_mut().zip(triangle.vertex_normals) {
                    *slot = transform
                        .apply_normal(n)
                        .ok_or(SceneError::SingularTransform)?
                        .to_vec3();
                }
                let mut out = TriangleElement::new(a, b, c, triangle.fill.clone())?
                    .with_vertex_normals(normals)?;
                out.meta = triangle.meta.clone();
                Self::Triangle(out)
            }
        })
    }
}

impl From<PointElement> for Element {
    fn from(point: PointElement) -> Self {
        Self::Point(point)
    }
}

impl From<LineElement> for Element {
    fn from(line: LineElement) -> Self {
        Self::Line(line)
    }
}

impl From<TriangleElement> for Element {
    fn from(triangle: TriangleElement) -> Self {
        Self::Triangle(triangle)
    }
}

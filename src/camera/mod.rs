//! Cameras: projection, deprojection, depth, culling and pairwise ordering.
//!
//! Both built-in cameras share the same view basis: a rotation `A` taking the
//! view direction onto +z followed by a rotation `B` about z that brings the
//! projected world "up" vector onto +y. Camera-plane coordinates are the x/y
//! components of `s * B * A * (q - origin)`.

mod compare;
mod orthographic;
mod perspective;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Matrix3, NormalizedVec3, Point2, Point3, Tolerance, Vec3};
use crate::scene::Element;

pub use compare::compare_elements;
pub use orthographic::OrthographicCamera;
pub use perspective::PerspectiveCamera;

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera direction must be non-zero and finite")]
    InvalidDirection,
    #[error("camera position must be finite")]
    NonFinitePosition,
    #[error("plane distance must be positive and finite, got {distance}")]
    InvalidDistance { distance: f64 },
    #[error("scale factor must be positive and finite, got {scale}")]
    InvalidScale { scale: f64 },
    #[error("view rectangle must have a positive finite size")]
    InvalidViewSize,
    #[error("lens width must be non-negative and finite, got {lens_width}")]
    InvalidLens { lens_width: f64 },
    #[error("focus blur needs at least one sampling point")]
    InvalidSamplingPoints,
    #[error("camera position coincides with the orbit origin")]
    DegenerateOrbit,
}

/// Result of comparing two overlapping elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintOrder {
    /// The first element is farther away and must be painted first.
    Before,
    /// The second element must be painted first.
    After,
    /// No overlap on screen, or no usable depth difference.
    Unordered,
}

impl PaintOrder {
    /// `-1`, `+1` or `0`, matching the usual comparator convention.
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Before => -1,
            Self::After => 1,
            Self::Unordered => 0,
        }
    }

    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            Self::Unordered => Self::Unordered,
        }
    }
}

/// Visible window in camera-plane units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRect {
    pub top_left: Point2,
    pub width: f64,
    pub height: f64,
}

impl ViewRect {
    #[must_use]
    pub const fn new(top_left: Point2, width: f64, height: f64) -> Self {
        Self {
            top_left,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on the camera-plane origin.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        Self::new(Point2::new(-width * 0.5, -height * 0.5), width, height)
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        Point2::new(self.top_left.x + self.width * 0.5, self.top_left.y + self.height * 0.5)
    }

    /// Same centre, both sides multiplied by `factor`.
    #[must_use]
    pub fn scaled_about_center(&self, factor: f64) -> Self {
        let center = self.center();
        let (width, height) = (self.width * factor, self.height * factor);
        Self::new(Point2::new(center.x - width * 0.5, center.y - height * 0.5), width, height)
    }

    /// Whether the axis-aligned box `min..max` touches the rectangle.
    #[must_use]
    pub fn intersects_box(&self, min: Point2, max: Point2) -> bool {
        min.x <= self.top_left.x + self.width
            && max.x >= self.top_left.x
            && min.y <= self.top_left.y + self.height
            && max.y >= self.top_left.y
    }

    pub(crate) fn validate(self) -> Result<Self, CameraError> {
        let valid = self.top_left.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if valid { Ok(self) } else { Err(CameraError::InvalidViewSize) }
    }
}

impl Default for ViewRect {
    fn default() -> Self {
        Self::centered(10.0, 10.0)
    }
}

/// 3D primitive a screen point is deprojected onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeprojectTarget {
    Line { start: Point3, end: Point3 },
    Triangle { vertices: [Point3; 3] },
}

impl DeprojectTarget {
    /// Target for a line or triangle element; points have no extent to hit.
    #[must_use]
    pub fn of(element: &Element) -> Option<Self> {
        match element {
            Element::Point(_) => None,
            Element::Line(line) => Some(Self::Line {
                start: line.start(),
                end: line.end(),
            }),
            Element::Triangle(triangle) => Some(Self::Triangle {
                vertices: *triangle.vertices(),
            }),
        }
    }

    /// Where the ray `origin + t * direction` meets the target.
    ///
    /// For a line this is the point of the target line closest to the ray; for
    /// a triangle it is the intersection with the triangle's plane.
    ///
    /// A ray within [`Tolerance::PARALLEL`] of parallel to the target has no
    /// usable hit and yields NaN coordinates. The bound is relative: the squared
    /// sine of the ray/line angle, or the squared cosine of the ray/normal angle.
    #[must_use]
    pub fn intersect_ray(&self, origin: Point3, direction: Vec3) -> Point3 {
        const NO_HIT: Point3 = Point3::new(f64::NAN, f64::NAN, f64::NAN);
        match *self {
            Self::Line { start, end } => {
                let u = end - start;
                let w0 = start - origin;
                let a = u.dot(u);
                let b = u.dot(direction);
                let c = direction.dot(direction);
                let d = u.dot(w0);
                let e = direction.dot(w0);
                // |u x direction|^2
                let denom = a * c - b * b;
                if denom <= Tolerance::PARALLEL.eps * a * c {
                    return NO_HIT;
                }
                let t = (b * e - c * d) / denom;
                start + u * t
            }
            Self::Triangle { vertices: [a, b, c] } => {
                let normal = (b - a).cross(c - a);
                let denom = direction.dot(normal);
                let scale = direction.length_squared() * normal.length_squared();
                if denom * denom <= Tolerance::PARALLEL.eps * scale {
                    return NO_HIT;
                }
                let t = (a - origin).dot(normal) / denom;
                origin + direction * t
            }
        }
    }
}

/// An element together with its projected outline for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedElement<'a> {
    pub element: &'a Element,
    pub outline: &'a [Point2],
}

/// Projection contract shared by every camera.
///
/// All methods take `&self` and keep no per-call state, so a camera can be
/// used from the parallel comparison workers.
pub trait Camera: fmt::Debug + Send + Sync {
    fn project(&self, point: Point3) -> Point2;

    /// The point on `target` whose projection is `point`. Only meaningful when
    /// `point` lies inside the target's projection.
    fn deproject(&self, point: Point2, target: &DeprojectTarget) -> Point3;

    /// Monotonic proxy for the distance from the camera; larger is farther.
    fn z_depth(&self, point: Point3) -> f64;

    fn is_culled(&self, element: &Element) -> bool;

    /// Eye position handed to materials.
    fn view_point(&self) -> Point3;

    /// Unit vector from `point` towards the viewer.
    fn view_direction_at(&self, point: Point3) -> NormalizedVec3;

    fn scale_factor(&self) -> f64;

    fn view(&self) -> ViewRect;

    /// Paint order of two projected elements.
    fn compare(&self, a: &ProjectedElement<'_>, b: &ProjectedElement<'_>) -> PaintOrder {
        compare_elements(self, a, b)
    }
}

/// Interactive pose changes.
pub trait CameraControls {
    /// Rotates the camera about its orbit origin: `theta` around the camera's
    /// up axis, then `phi` around its right axis. The camera ends up facing
    /// the orbit origin.
    fn orbit(&mut self, theta: f64, phi: f64) -> Result<(), CameraError>;

    /// Moves the camera and its orbit origin by `(x, y)` camera-plane units.
    fn pan(&mut self, x: f64, y: f64);

    /// Moves closer for positive `amount`.
    fn zoom(&mut self, amount: f64) -> Result<(), CameraError>;
}

/// Cameras that approximate depth of field by averaging several renders.
pub trait FocusBlur: Camera + Sized {
    fn lens_width(&self) -> f64;

    fn sampling_points(&self) -> usize;

    /// Cameras spread over the lens, all focused on the same point. A single
    /// camera is returned when blur is disabled.
    fn sample_cameras(&self) -> Vec<Self>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Rotation from world space into camera space (view direction along +z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ViewBasis {
    to_camera: Matrix3,
    to_world: Matrix3,
}

impl ViewBasis {
    pub(crate) fn new(direction: NormalizedVec3) -> Self {
        let a = Matrix3::rotation_between(direction, NormalizedVec3::Z);

        let reference = if direction.y().abs() >= 1.0 - Tolerance::ANGLE.eps {
            Vec3::Z - direction * direction.z()
        } else {
            Vec3::Y - direction * direction.y()
        };
        let v = (a * reference).normalized().unwrap_or(NormalizedVec3::Y);
        let theta = std::f64::consts::FRAC_PI_2 - v.y().atan2(v.x());
        let to_camera = Matrix3::rotation_z(theta) * a;

        Self {
            to_camera,
            to_world: to_camera.transpose(),
        }
    }

    pub(crate) fn to_camera(&self, v: Vec3) -> Vec3 {
        self.to_camera * v
    }

    pub(crate) fn to_world(&self, v: Vec3) -> Vec3 {
        self.to_world * v
    }

    /// World direction of camera-plane +x.
    pub(crate) fn right(&self) -> Vec3 {
        self.to_world(Vec3::X)
    }

    /// World direction of camera-plane +y.
    pub(crate) fn up(&self) -> Vec3 {
        self.to_world(Vec3::Y)
    }
}

pub(crate) fn validate_position(position: Point3) -> Result<Point3, CameraError> {
    if position.is_finite() { Ok(position) } else { Err(CameraError::NonFinitePosition) }
}

pub(crate) fn validate_direction(direction: Vec3) -> Result<NormalizedVec3, CameraError> {
    if !direction.is_finite() {
        return Err(CameraError::InvalidDirection);
    }
    direction.normalized().ok_or(CameraError::InvalidDirection)
}

pub(crate) fn validate_scale(scale: f64) -> Result<f64, CameraError> {
    if scale.is_finite() && scale > 0.0 { Ok(scale) } else { Err(CameraError::InvalidScale { scale }) }
}

/// True when every vertex lies on or behind the plane through `eye` facing
/// `direction`. Zero-length lines count as culled as well.
pub(crate) fn is_behind_or_degenerate(element: &Element, eye: Point3, direction: NormalizedVec3) -> bool {
    if let Element::Line(line) = element {
        if line.is_degenerate() {
            return true;
        }
    }
    element
        .vertices()
        .iter()
        .all(|p| direction.dot(*p - eye) <= 0.0)
}

/// New eye position and direction after orbiting `eye` about `pivot`.
pub(crate) fn orbit_about(
    eye: Point3,
    pivot: Point3,
    basis: &ViewBasis,
    theta: f64,
    phi: f64,
) -> Result<(Point3, NormalizedVec3), CameraError> {
    let offset = eye - pivot;
    if Tolerance::ZERO_LENGTH.is_zero_vec3(offset) {
        return Err(CameraError::DegenerateOrbit);
    }
    let up = basis.up().normalized().ok_or(CameraError::InvalidDirection)?;
    let yaw = Matrix3::rotation_about(up, theta);
    let right = (yaw * basis.right())
        .normalized()
        .ok_or(CameraError::InvalidDirection)?;
    let pitch = Matrix3::rotation_about(right, phi);

    let new_eye = pivot + pitch * (yaw * offset);
    let direction = (pivot - new_eye)
        .normalized()
        .ok_or(CameraError::DegenerateOrbit)?;
    Ok((new_eye, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn basis_maps_direction_to_z_and_up_to_y() {
        let d = Vec3::new(1.0, 0.0, 1.0).normalized().unwrap();
        let basis = ViewBasis::new(d);
        assert_vec_close(basis.to_camera(d.to_vec3()), Vec3::Z);

        // World up, projected onto the view plane, points along camera +y.
        let up_in_plane = Vec3::Y - d * d.y();
        let cam = basis.to_camera(up_in_plane);
        assert!(cam.x.abs() < 1e-9 && cam.y > 0.0);
    }

    #[test]
    fn basis_looking_straight_down_uses_z_reference() {
        let basis = ViewBasis::new(NormalizedVec3::new(Vec3::new(0.0, -1.0, 0.0)).unwrap());
        assert_vec_close(basis.to_camera(Vec3::new(0.0, -1.0, 0.0)), Vec3::Z);
        let cam = basis.to_camera(Vec3::Z);
        assert!(cam.x.abs() < 1e-9 && cam.y > 0.0);
        assert!(basis.right().is_finite() && basis.up().is_finite());
    }

    #[test]
    fn line_target_returns_closest_point() {
        let target = DeprojectTarget::Line {
            start: Point3::new(-1.0, 0.0, 5.0),
            end: Point3::new(1.0, 0.0, 5.0),
        };
        let hit = target.intersect_ray(Point3::new(0.5, 0.0, 0.0), Vec3::Z);
        assert!(Tolerance::DEFAULT.approx_eq_point3(hit, Point3::new(0.5, 0.0, 5.0)));
    }

    #[test]
    fn triangle_target_hits_plane() {
        let target = DeprojectTarget::Triangle {
            vertices: [
                Point3::new(0.0, 0.0, 2.0),
                Point3::new(1.0, 0.0, 3.0),
                Point3::new(0.0, 1.0, 2.0),
            ],
        };
        let hit = target.intersect_ray(Point3::new(0.5, 0.25, -4.0), Vec3::Z);
        assert!(Tolerance::DEFAULT.approx_eq_point3(hit, Point3::new(0.5, 0.25, 2.5)));
    }

    #[test]
    fn parallel_ray_gives_non_finite_point() {
        let target = DeprojectTarget::Triangle {
            vertices: [Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
        };
        assert!(!target.intersect_ray(Point3::new(0.0, 0.0, 1.0), Vec3::X).is_finite());
        // Within the parallel tolerance of the plane.
        let grazing = Vec3::new(1.0, 0.0, 1e-7);
        assert!(!target.intersect_ray(Point3::new(0.0, 0.0, 1.0), grazing).is_finite());
        // Steep enough to hit.
        let shallow = Vec3::new(1.0, 0.0, -1e-3);
        assert!(target.intersect_ray(Point3::new(0.0, 0.0, 1.0), shallow).is_finite());
    }

    #[test]
    fn ray_along_a_line_target_gives_non_finite_point() {
        let target = DeprojectTarget::Line {
            start: Point3::new(0.0, 0.0, 5.0),
            end: Point3::new(0.0, 0.0, 7.0),
        };
        assert!(!target.intersect_ray(Point3::ORIGIN, Vec3::Z).is_finite());
        assert!(!target.intersect_ray(Point3::new(0.0, 1.0, 0.0), Vec3::new(1e-8, 0.0, 1.0)).is_finite());
        let hit = target.intersect_ray(Point3::new(1.0, 0.0, 6.0), -Vec3::X);
        assert!(Tolerance::DEFAULT.approx_eq_point3(hit, Point3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn paint_order_signs() {
        assert_eq!(PaintOrder::Before.sign(), -1);
        assert_eq!(PaintOrder::After.reverse(), PaintOrder::Before);
        assert_eq!(PaintOrder::Unordered.sign(), 0);
    }

    #[test]
    fn view_rect_scaling_keeps_center() {
        let rect = ViewRect::new(Point2::new(1.0, 1.0), 4.0, 2.0);
        let zoomed = rect.scaled_about_center(0.5);
        assert_eq!(zoomed.center(), rect.center());
        assert_eq!((zoomed.width, zoomed.height), (2.0, 1.0));
        assert!(rect.intersects_box(Point2::new(4.5, 2.5), Point2::new(6.0, 6.0)));
        assert!(!rect.intersects_box(Point2::new(5.5, 0.0), Point2::new(6.0, 6.0)));
    }
}

use crate::geom::{NormalizedVec3, Point2, Point3, Vec3};
use crate::scene::Element;

use super::{
    Camera, CameraControls, CameraError, DeprojectTarget, FocusBlur, ViewBasis, ViewRect, is_behind_or_degenerate,
    orbit_about, validate_direction, validate_position, validate_scale,
};

/// Golden angle in radians; consecutive lens samples are rotated by it.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Pinhole camera projecting onto a plane at `distance` in front of the eye.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    position: Point3,
    direction: NormalizedVec3,
    distance: f64,
    scale: f64,
    view: ViewRect,
    orbit_origin: Point3,
    lens_width: f64,
    sampling_points: usize,
    basis: ViewBasis,
}

impl Default for PerspectiveCamera {
    /// Ten units back on the negative z axis, looking at the origin plane.
    fn default() -> Self {
        let position = Point3::new(0.0, 0.0, -10.0);
        let direction = NormalizedVec3::Z;
        Self {
            position,
            direction,
            distance: 5.0,
            scale: 1.0,
            view: ViewRect::default(),
            orbit_origin: position + direction * 5.0,
            lens_width: 0.0,
            sampling_points: 1,
            basis: ViewBasis::new(direction),
        }
    }
}

impl PerspectiveCamera {
    /// Camera at `position` looking along `direction`, scale 1, default view
    /// rectangle, orbiting about the plane origin and without blur.
    pub fn new(position: Point3, direction: Vec3, distance: f64) -> Result<Self, CameraError> {
        let position = validate_position(position)?;
        let direction = validate_direction(direction)?;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(CameraError::InvalidDistance { distance });
        }
        Ok(Self {
            position,
            direction,
            distance,
            scale: 1.0,
            view: ViewRect::default(),
            orbit_origin: position + direction * distance,
            lens_width: 0.0,
            sampling_points: 1,
            basis: ViewBasis::new(direction),
        })
    }

    pub fn with_scale(mut self, scale: f64) -> Result<Self, CameraError> {
        self.scale = validate_scale(scale)?;
        Ok(self)
    }

    pub fn with_view(mut self, view: ViewRect) -> Result<Self, CameraError> {
        self.view = view.validate()?;
        Ok(self)
    }

    pub fn with_orbit_origin(mut self, orbit_origin: Point3) -> Result<Self, CameraError> {
        self.orbit_origin = validate_position(orbit_origin)?;
        Ok(self)
    }

    /// Enables depth of field: `sampling_points` eyes spread over a lens of
    /// diameter `lens_width`, all focused on the plane origin.
    pub fn with_focus_blur(mut self, lens_width: f64, sampling_points: usize) -> Result<Self, CameraError> {
        if !(lens_width.is_finite() && lens_width >= 0.0) {
            return Err(CameraError::InvalidLens { lens_width });
        }
        if sampling_points == 0 {
            return Err(CameraError::InvalidSamplingPoints);
        }
        self.lens_width = lens_width;
        self.sampling_points = sampling_points;
        Ok(self)
    }

    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position
    }

    #[must_use]
    pub const fn direction(&self) -> NormalizedVec3 {
        self.direction
    }

    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    #[must_use]
    pub const fn orbit_origin(&self) -> Point3 {
        self.orbit_origin
    }

    /// Centre of the projection plane.
    #[must_use]
    pub fn plane_origin(&self) -> Point3 {
        self.position + self.direction * self.distance
    }

    fn set_pose(&mut self, position: Point3, direction: NormalizedVec3) {
        self.position = position;
        self.direction = direction;
        self.basis = ViewBasis::new(direction);
    }
}

impl Camera for PerspectiveCamera {
    fn project(&self, point: Point3) -> Point2 {
        let origin = self.plane_origin();
        let to_eye = self.position - point;
        let h = to_eye / to_eye.length();
        let t = (origin - point).dot(self.direction.to_vec3()) / h.dot(self.direction.to_vec3());
        let on_plane = point + h * t;
        let cam = self.basis.to_camera(on_plane - origin) * self.scale;
        Point2::new(cam.x, cam.y)
    }

    fn deproject(&self, point: Point2, target: &DeprojectTarget) -> Point3 {
        let local = Vec3::new(point.x, point.y, 0.0) / self.scale;
        let on_plane = self.plane_origin() + self.basis.to_world(local);
        target.intersect_ray(self.position, on_plane - self.position)
    }

    fn z_depth(&self, point: Point3) -> f64 {
        point.distance_squared_to(self.position)
    }

    fn is_culled(&self, element: &Element) -> bool {
        if is_behind_or_degenerate(element, self.position, self.direction) {
            return true;
        }
        match element {
            Element::Triangle(triangle) => triangle.normal().dot(triangle.centroid() - self.position) > 0.0,
            _ => false,
        }
    }

    fn view_point(&self) -> Point3 {
        self.position
    }

    fn view_direction_at(&self, point: Point3) -> NormalizedVec3 {
        (self.position - point).normalized().unwrap_or(-self.direction)
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn view(&self) -> ViewRect {
        self.view
    }
}

impl CameraControls for PerspectiveCamera {
    fn orbit(&mut self, theta: f64, phi: f64) -> Result<(), CameraError> {
        let (position, direction) = orbit_about(self.position, self.orbit_origin, &self.basis, theta, phi)?;
        self.set_pose(position, direction);
        Ok(())
    }

    fn pan(&mut self, x: f64, y: f64) {
        let offset = (self.basis.right() * x + self.basis.up() * y) / self.scale;
        self.position = self.position + offset;
        self.orbit_origin = self.orbit_origin + offset;
    }

    fn zoom(&mut self, amount: f64) -> Result<(), CameraError> {
        let position = self.position + self.direction * amount;
        self.position = validate_position(position)?;
        Ok(())
    }
}

impl FocusBlur for PerspectiveCamera {
    fn lens_width(&self) -> f64 {
        self.lens_width
    }

    fn sampling_points(&self) -> usize {
        self.sampling_points
    }

    fn sample_cameras(&self) -> Vec<Self> {
        if self.sampling_points <= 1 || self.lens_width == 0.0 {
            let mut single = self.clone();
            single.sampling_points = 1;
            return vec![single];
        }

        let focus = self.plane_origin();
        let radius = self.lens_width * 0.5;
        let n = self.sampling_points as f64;
        let mut cameras = Vec::with_capacity(self.sampling_points);
        for k in 0..self.sampling_points {
            let r = radius * ((k as f64 + 0.5) / n).sqrt();
            let (sin, cos) = (k as f64 * GOLDEN_ANGLE).sin_cos();
            let eye = self.position + (self.basis.right() * cos + self.basis.up() * sin) * r;
            let to_focus = focus - eye;
            // An eye sitting on the focus point has no direction.
            let Some(direction) = to_focus.normalized() else {
                continue;
            };
            let mut sample = self.clone();
            sample.set_pose(eye, direction);
            sample.distance = to_focus.length();
            sample.sampling_points = 1;
            sample.lens_width = 0.0;
            cameras.push(sample);
        }
        cameras
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;
    use crate::scene::{LineElement, PointElement, TriangleElement};
    use crate::surface::Colour;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z, 5.0).unwrap()
    }

    fn assert_point_close(a: Point3, b: Point3) {
        assert!(Tolerance::LOOSE.approx_eq_point3(a, b), "{a:?} != {b:?}");
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            PerspectiveCamera::new(Point3::ORIGIN, Vec3::ZERO, 5.0),
            Err(CameraError::InvalidDirection)
        ));
        assert!(matches!(
            PerspectiveCamera::new(Point3::ORIGIN, Vec3::Z, 0.0),
            Err(CameraError::InvalidDistance { .. })
        ));
        assert!(matches!(
            PerspectiveCamera::new(Point3::new(f64::NAN, 0.0, 0.0), Vec3::Z, 1.0),
            Err(CameraError::NonFinitePosition)
        ));
        assert!(matches!(camera().with_scale(-1.0), Err(CameraError::InvalidScale { .. })));
        assert!(matches!(camera().with_focus_blur(1.0, 0), Err(CameraError::InvalidSamplingPoints)));
    }

    #[test]
    fn plane_origin_projects_to_origin() {
        let cam = PerspectiveCamera::new(Point3::new(3.0, -2.0, 1.0), Vec3::new(-1.0, 0.5, 2.0), 4.0)
            .unwrap()
            .with_scale(20.0)
            .unwrap();
        let p = cam.project(cam.plane_origin());
        assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
    }

    #[test]
    fn projection_shrinks_with_distance() {
        let cam = camera();
        let near = cam.project(Point3::new(1.0, 0.0, -5.0));
        let far = cam.project(Point3::new(1.0, 0.0, 10.0));
        assert!((near.x - 1.0).abs() < 1e-12);
        assert!((far.x - 0.25).abs() < 1e-12);
        // World up stays up.
        assert!(cam.project(Point3::new(0.0, 1.0, 0.0)).y > 0.0);
    }

    #[test]
    fn deprojection_round_trips() {
        let cam = PerspectiveCamera::new(Point3::new(2.0, 3.0, -8.0), Vec3::new(-0.2, -0.3, 1.0), 5.0)
            .unwrap()
            .with_scale(7.0)
            .unwrap();
        let target = DeprojectTarget::Triangle {
            vertices: [
                Point3::new(-1.0, -1.0, 1.0),
                Point3::new(2.0, -1.0, 2.0),
                Point3::new(0.0, 2.0, 0.5),
            ],
        };
        let on_triangle = Point3::new(
            (-1.0 + 2.0 + 0.0) / 3.0,
            (-1.0 - 1.0 + 2.0) / 3.0,
            (1.0 + 2.0 + 0.5) / 3.0,
        );
        assert_point_close(cam.deproject(cam.project(on_triangle), &target), on_triangle);

        let line = DeprojectTarget::Line {
            start: Point3::new(-3.0, 1.0, 4.0),
            end: Point3::new(3.0, -1.0, 6.0),
        };
        let on_line = Point3::new(-3.0, 1.0, 4.0).lerp(Point3::new(3.0, -1.0, 6.0), 0.3);
        assert_point_close(cam.deproject(cam.project(on_line), &line), on_line);
    }

    #[test]
    fn points_behind_the_eye_are_culled() {
        let cam = camera();
        let behind = Element::from(PointElement::new(Point3::new(0.0, 0.0, -11.0), Colour::BLACK, 1.0));
        let in_plane = Element::from(PointElement::new(cam.plane_origin(), Colour::BLACK, 1.0));
        assert!(cam.is_culled(&behind));
        assert!(!cam.is_culled(&in_plane));
    }

    #[test]
    fn zero_length_line_is_culled() {
        let cam = camera();
        let p = Point3::new(0.0, 0.0, 1.0);
        assert!(cam.is_culled(&LineElement::new(p, p, Colour::BLACK, 1.0).into()));
    }

    #[test]
    fn back_faces_are_culled() {
        let cam = camera();
        // Normal -z faces the camera; reversed winding faces away.
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        let c = Point3::new(1.0, 0.0, 0.0);
        let front = TriangleElement::new(a, b, c, Vec::new()).unwrap();
        let back = TriangleElement::new(a, c, b, Vec::new()).unwrap();
        assert!(!cam.is_culled(&front.into()));
        assert!(cam.is_culled(&back.into()));
    }

    #[test]
    fn orbit_keeps_distance_to_pivot_and_faces_it() {
        let mut cam = camera();
        let pivot = cam.orbit_origin();
        let before = cam.position().distance_to(pivot);
        cam.orbit(0.7, -0.3).unwrap();
        assert!((cam.position().distance_to(pivot) - before).abs() < 1e-9);
        let facing = (pivot - cam.position()).normalized().unwrap();
        assert!((facing.dot(cam.direction().to_vec3()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn orbit_half_turn_looks_back() {
        let mut cam = camera();
        cam.orbit(std::f64::consts::PI, 0.0).unwrap();
        assert_point_close(cam.position(), Point3::new(0.0, 0.0, 0.0));
        assert!((cam.direction().z() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn orbit_at_pivot_fails() {
        let mut cam = camera().with_orbit_origin(Point3::new(0.0, 0.0, -10.0)).unwrap();
        assert!(matches!(cam.orbit(0.1, 0.0), Err(CameraError::DegenerateOrbit)));
    }

    #[test]
    fn pan_moves_in_camera_plane_units() {
        let mut cam = camera().with_scale(2.0).unwrap();
        let marker = Point3::new(0.0, 0.0, -5.0);
        let before = cam.project(marker);
        cam.pan(4.0, 0.0);
        let after = cam.project(marker);
        assert!((after.x - (before.x - 4.0)).abs() < 1e-9);
        assert!((after.y - before.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_moves_along_direction() {
        let mut cam = camera();
        let size_before = cam.project(Point3::new(1.0, 0.0, 0.0)).x;
        cam.zoom(5.0).unwrap();
        assert_point_close(cam.position(), Point3::new(0.0, 0.0, -5.0));
        assert!(cam.project(Point3::new(1.0, 0.0, 0.0)).x > size_before);
    }

    #[test]
    fn focus_blur_without_lens_is_a_single_camera() {
        let cam = camera().with_focus_blur(0.0, 16).unwrap();
        let samples = cam.sample_cameras();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].position(), cam.position());

        let single = camera().with_focus_blur(2.0, 1).unwrap();
        assert_eq!(single.sample_cameras()[0].position(), cam.position());
    }

    #[test]
    fn focus_blur_samples_lie_on_lens_and_share_focus() {
        let cam = camera().with_focus_blur(2.0, 12).unwrap();
        let samples = cam.sample_cameras();
        assert_eq!(samples.len(), 12);
        let focus = cam.plane_origin();
        for sample in &samples {
            let offset = sample.position() - cam.position();
            assert!(offset.length() <= 1.0 + 1e-12);
            assert!(offset.dot(Vec3::Z).abs() < 1e-12);
            assert_point_close(sample.plane_origin(), focus);
            let p = sample.project(focus);
            assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
        }
        // Deterministic.
        assert_eq!(samples, cam.sample_cameras());
    }
}

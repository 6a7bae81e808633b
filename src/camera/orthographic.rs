use crate::geom::{NormalizedVec3, Point2, Point3, Vec3};
use crate::scene::Element;

use super::{
    Camera, CameraControls, CameraError, DeprojectTarget, ViewBasis, ViewRect, is_behind_or_degenerate, orbit_about,
    validate_direction, validate_position, validate_scale,
};

/// Parallel projection onto the plane through `position` facing `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    position: Point3,
    direction: NormalizedVec3,
    scale: f64,
    view: ViewRect,
    orbit_origin: Point3,
    basis: ViewBasis,
}

impl OrthographicCamera {
    /// Camera with scale 1 and the default view rectangle, orbiting about the
    /// point one unit in front of it.
    pub fn new(position: Point3, direction: Vec3) -> Result<Self, CameraError> {
        let position = validate_position(position)?;
        let direction = validate_direction(direction)?;
        Ok(Self {
            position,
            direction,
            scale: 1.0,
            view: ViewRect::default(),
            orbit_origin: position + direction.to_vec3(),
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

    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position
    }

    #[must_use]
    pub const fn direction(&self) -> NormalizedVec3 {
        self.direction
    }

    #[must_use]
    pub const fn orbit_origin(&self) -> Point3 {
        self.orbit_origin
    }
}

impl Camera for OrthographicCamera {
    fn project(&self, point: Point3) -> Point2 {
        let d = self.direction.to_vec3();
        let on_plane = point + d * (self.position - point).dot(d);
        let cam = self.basis.to_camera(on_plane - self.position) * self.scale;
        Point2::new(cam.x, cam.y)
    }

    fn deproject(&self, point: Point2, target: &DeprojectTarget) -> Point3 {
        let local = Vec3::new(point.x, point.y, 0.0) / self.scale;
        let on_plane = self.position + self.basis.to_world(local);
        target.intersect_ray(on_plane, self.direction.to_vec3())
    }

    fn z_depth(&self, point: Point3) -> f64 {
        self.direction.dot(point - self.position)
    }

    fn is_culled(&self, element: &Element) -> bool {
        if is_behind_or_degenerate(element, self.position, self.direction) {
            return true;
        }
        match element {
            Element::Triangle(triangle) => triangle.normal().dot(self.direction.to_vec3()) > 0.0,
            _ => false,
        }
    }

    fn view_point(&self) -> Point3 {
        self.position
    }

    fn view_direction_at(&self, _point: Point3) -> NormalizedVec3 {
        -self.direction
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn view(&self) -> ViewRect {
        self.view
    }
}

impl CameraControls for OrthographicCamera {
    fn orbit(&mut self, theta: f64, phi: f64) -> Result<(), CameraError> {
        let (position, direction) = orbit_about(self.position, self.orbit_origin, &self.basis, theta, phi)?;
        self.position = position;
        self.direction = direction;
        self.basis = ViewBasis::new(direction);
        Ok(())
    }

    fn pan(&mut self, x: f64, y: f64) {
        let offset = (self.basis.right() * x + self.basis.up() * y) / self.scale;
        self.position = self.position + offset;
        self.orbit_origin = self.orbit_origin + offset;
    }

    /// Magnification does not depend on the position, so zooming shrinks the
    /// view rectangle by `exp(amount)` about its centre instead.
    fn zoom(&mut self, amount: f64) -> Result<(), CameraError> {
        self.view = self.view.scaled_about_center((-amount).exp()).validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;
    use crate::scene::{PointElement, TriangleElement};
    use crate::surface::Colour;

    fn camera() -> OrthographicCamera {
        OrthographicCamera::new(Point3::new(0.0, 0.0, -10.0), Vec3::Z)
            .unwrap()
            .with_scale(3.0)
            .unwrap()
    }

    #[test]
    fn projection_ignores_depth() {
        let cam = camera();
        let near = cam.project(Point3::new(1.0, 2.0, -5.0));
        let far = cam.project(Point3::new(1.0, 2.0, 50.0));
        assert_eq!(near, far);
        assert!((near.x - 3.0).abs() < 1e-12 && (near.y - 6.0).abs() < 1e-12);
        let origin = cam.project(cam.position());
        assert!(origin.x.abs() < 1e-12 && origin.y.abs() < 1e-12);
    }

    #[test]
    fn deprojection_round_trips() {
        let cam = OrthographicCamera::new(Point3::new(4.0, 1.0, -6.0), Vec3::new(-0.5, 0.1, 1.0))
            .unwrap()
            .with_scale(11.0)
            .unwrap();
        let vertices = [
            Point3::new(-1.0, 0.0, 2.0),
            Point3::new(1.0, -1.0, 3.0),
            Point3::new(0.5, 1.5, 1.0),
        ];
        let p = Point3::new(0.1, 0.2, 2.0);
        let on_plane = DeprojectTarget::Triangle { vertices }.intersect_ray(p, Vec3::Z);
        let back = cam.deproject(cam.project(on_plane), &DeprojectTarget::Triangle { vertices });
        assert!(Tolerance::LOOSE.approx_eq_point3(back, on_plane));

        let line = DeprojectTarget::Line {
            start: vertices[0],
            end: vertices[1],
        };
        let on_line = vertices[0].lerp(vertices[1], 0.75);
        assert!(Tolerance::LOOSE.approx_eq_point3(cam.deproject(cam.project(on_line), &line), on_line));
    }

    #[test]
    fn depth_is_signed_distance_along_direction() {
        let cam = camera();
        assert!((cam.z_depth(Point3::new(5.0, 5.0, 0.0)) - 10.0).abs() < 1e-12);
        assert!(cam.z_depth(Point3::new(0.0, 0.0, -12.0)) < 0.0);
    }

    #[test]
    fn culling_uses_view_direction() {
        let cam = camera();
        let behind = PointElement::new(Point3::new(0.0, 0.0, -10.5), Colour::BLACK, 1.0);
        assert!(cam.is_culled(&behind.into()));

        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 1.0, 0.0);
        let c = Point3::new(1.0, 0.0, 0.0);
        assert!(!cam.is_culled(&TriangleElement::new(a, b, c, Vec::new()).unwrap().into()));
        assert!(cam.is_culled(&TriangleElement::new(a, c, b, Vec::new()).unwrap().into()));
    }

    #[test]
    fn zoom_rescales_view_not_position() {
        let mut cam = camera();
        let before = cam.view();
        cam.zoom(std::f64::consts::LN_2).unwrap();
        assert_eq!(cam.position(), Point3::new(0.0, 0.0, -10.0));
        assert!((cam.view().width - before.width * 0.5).abs() < 1e-12);
        assert_eq!(cam.view().center(), before.center());
    }

    #[test]
    fn orbit_faces_pivot() {
        let mut cam = camera().with_orbit_origin(Point3::ORIGIN).unwrap();
        cam.orbit(std::f64::consts::FRAC_PI_2, 0.0).unwrap();
        assert!((cam.position().distance_to(Point3::ORIGIN) - 10.0).abs() < 1e-9);
        let facing = (Point3::ORIGIN - cam.position()).normalized().unwrap();
        assert!((facing.dot(cam.direction().to_vec3()) - 1.0).abs() < 1e-12);
    }
}

//! Triangle shading.
//!
//! A triangle carries an ordered list of materials. When it is painted, each
//! material receives a [`FillContext`] with the projected outline and the 3D
//! geometry, and draws whatever it wants onto the surface.

mod light;

use std::fmt;

use crate::camera::Camera;
use crate::geom::{NormalizedVec3, Point2, Point3, Vec3};
use crate::scene::TriangleElement;
use crate::surface::{Colour, LineCap, LineDash, Path, Stroke, Surface};

pub use light::{AmbientLight, LightSource, ParallelLight, PointLight};

/// Everything a material may need to shade one triangle.
pub struct FillContext<'a> {
    /// Projected vertices, in camera-plane units.
    pub outline: &'a [Point2],
    pub centroid: Point3,
    pub normal: NormalizedVec3,
    pub triangle: &'a TriangleElement,
    pub view_point: Point3,
    pub camera: &'a dyn Camera,
    pub lights: &'a [Box<dyn LightSource>],
    pub scale_factor: f64,
    pub tag: Option<&'a str>,
    /// Overfill requested by the renderer; materials may use their own instead.
    pub overfill: f64,
}

pub trait Material: fmt::Debug + Send + Sync {
    fn fill(&self, surface: &mut dyn Surface, context: &FillContext<'_>);
}

/// Fills `outline` and, when `overfill > 0`, strokes it with the same colour so
/// that seams between adjacent triangles disappear.
fn fill_outline(surface: &mut dyn Surface, outline: &[Point2], colour: Colour, overfill: f64, tag: Option<&str>) {
    let path = Path::polygon(outline);
    surface.fill_path(&path, colour, tag);
    if overfill > 0.0 {
        let stroke = Stroke {
            colour,
            thickness: overfill,
            cap: LineCap::Round,
            dash: LineDash::SOLID,
        };
        surface.stroke_path(&path, &stroke, tag);
    }
}

/// Flat, unlit colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourMaterial {
    pub colour: Colour,
    /// Overrides the renderer's default overfill when set.
    pub overfill: Option<f64>,
}

impl ColourMaterial {
    #[must_use]
    pub const fn new(colour: Colour) -> Self {
        Self {
            colour,
            overfill: None,
        }
    }

    #[must_use]
    pub const fn with_overfill(mut self, overfill: f64) -> Self {
        self.overfill = Some(overfill);
        self
    }
}

impl Material for ColourMaterial {
    fn fill(&self, surface: &mut dyn Surface, context: &FillContext<'_>) {
        let overfill = self.overfill.unwrap_or(context.overfill);
        fill_outline(surface, context.outline, self.colour, overfill, context.tag);
    }
}

/// Phong reflection: ambient, Lambertian diffuse and specular highlights.
///
/// The triangle is shaded once at its centroid with the face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub colour: Colour,
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,
    pub overfill: Option<f64>,
}

impl PhongMaterial {
    #[must_use]
    pub const fn new(colour: Colour) -> Self {
        Self {
            colour,
            ambient: 1.0,
            diffuse: 1.0,
            specular: 0.3,
            shininess: 16.0,
            overfill: None,
        }
    }

    #[must_use]
    pub const fn with_coefficients(mut self, ambient: f64, diffuse: f64, specular: f64, shininess: f64) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    #[must_use]
    pub const fn with_overfill(mut self, overfill: f64) -> Self {
        self.overfill = Some(overfill);
        self
    }

    /// Lit colour at `point` with outward normal `normal`, seen along `to_viewer`.
    #[must_use]
    pub fn shade(
        &self,
        point: Point3,
        normal: NormalizedVec3,
        to_viewer: NormalizedVec3,
        lights: &[Box<dyn LightSource>],
    ) -> Colour {
        // Shade the side facing the viewer.
        let n: Vec3 = if normal.dot(to_viewer.to_vec3()) < 0.0 {
            -normal.to_vec3()
        } else {
            normal.to_vec3()
        };

        let mut lit = Colour::rgba(0.0, 0.0, 0.0, self.colour.a);
        for light in lights {
            let intensity = light.intensity_at(point);
            let tint = self.colour.modulate(light.colour());
            let Some(direction) = light.direction_at(point) else {
                lit = lit.saturating_add(tint.scale_rgb(self.ambient * intensity));
                continue;
            };

            let incoming = direction.to_vec3();
            let lambert = (-incoming.dot(n)).max(0.0);
            if lambert <= 0.0 {
                continue;
            }
            lit = lit.saturating_add(tint.scale_rgb(self.diffuse * lambert * intensity));

            let reflected = incoming - n * (2.0 * incoming.dot(n));
            let highlight = reflected.dot(to_viewer.to_vec3()).max(0.0).powf(self.shininess);
            lit = lit.saturating_add(light.colour().scale_rgb(self.specular * highlight * intensity));
        }
        lit
    }
}

impl Material for PhongMaterial {
    fn fill(&self, surface: &mut dyn Surface, context: &FillContext<'_>) {
        let to_viewer = context.camera.view_direction_at(context.centroid);
        let colour = self.shade(context.centroid, context.normal, to_viewer, context.lights);
        let overfill = self.overfill.unwrap_or(context.overfill);
        fill_outline(surface, context.outline, colour, overfill, context.tag);
    }
}

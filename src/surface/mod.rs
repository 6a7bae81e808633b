//! The 2D drawing surface the renderer paints onto.
//!
//! The renderer only needs three capabilities from a surface: filling a closed
//! path, stroking a path and placing text. [`Page`] is the in-crate surface; it
//! records every call as a [`DrawCommand`] so the result can be serialized,
//! snapshotted or hit-tested.

mod page;

use serde::{Deserialize, Serialize};

use crate::geom::Point2;

pub use page::{DrawCommand, Page};

/// Number of straight segments used when an arc has to be flattened.
const ARC_FLATTEN_SEGMENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colour {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Colour {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    #[must_use]
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a colour from 8-bit channels.
    #[must_use]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(f64::from(r) / 255.0, f64::from(g) / 255.0, f64::from(b) / 255.0)
    }

    #[must_use]
    pub const fn with_alpha(self, a: f64) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Multiplies the colour channels (not alpha) by `factor`, clamped to `0..=1`.
    #[must_use]
    pub fn scale_rgb(self, factor: f64) -> Self {
        Self::rgba(
            (self.r * factor).clamp(0.0, 1.0),
            (self.g * factor).clamp(0.0, 1.0),
            (self.b * factor).clamp(0.0, 1.0),
            self.a,
        )
    }

    /// Channel-wise product, as used when a light tints a surface.
    #[must_use]
    pub fn modulate(self, other: Self) -> Self {
        Self::rgba(self.r * other.r, self.g * other.g, self.b * other.b, self.a)
    }

    /// Channel-wise sum clamped to `0..=1`; alpha is kept from `self`.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self::rgba(
            (self.r + other.r).clamp(0.0, 1.0),
            (self.g + other.g).clamp(0.0, 1.0),
            (self.b + other.b).clamp(0.0, 1.0),
            self.a,
        )
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Dash pattern in surface units. A zero `on` or `off` length means a solid line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDash {
    pub on: f64,
    pub off: f64,
    pub phase: f64,
}

impl LineDash {
    pub const SOLID: Self = Self {
        on: 0.0,
        off: 0.0,
        phase: 0.0,
    };

    #[must_use]
    pub const fn new(on: f64, off: f64, phase: f64) -> Self {
        Self { on, off, phase }
    }

    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.on <= 0.0 || self.off <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub colour: Colour,
    pub thickness: f64,
    pub cap: LineCap,
    pub dash: LineDash,
}

impl Stroke {
    #[must_use]
    pub fn solid(colour: Colour, thickness: f64) -> Self {
        Self {
            colour,
            thickness,
            cap: LineCap::Butt,
            dash: LineDash::SOLID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: f64,
}

impl Font {
    #[must_use]
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PathSegment {
    MoveTo { point: Point2 },
    LineTo { point: Point2 },
    /// Circular arc from `start_angle` to `end_angle` (radians, counter-clockwise).
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Close,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Polyline through `points`, closed if `closed` is set.
    #[must_use]
    pub fn polyline(points: &[Point2], closed: bool) -> Self {
        let mut path = Self::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            path.move_to(*first);
            for p in iter {
                path.line_to(*p);
            }
            if closed {
                path.close();
            }
        }
        path
    }

    #[must_use]
    pub fn polygon(points: &[Point2]) -> Self {
        Self::polyline(points, true)
    }

    #[must_use]
    pub fn circle(center: Point2, radius: f64) -> Self {
        let mut path = Self::new();
        path.segments.push(PathSegment::Arc {
            center,
            radius,
            start_angle: 0.0,
            end_angle: std::f64::consts::TAU,
        });
        path.close();
        path
    }

    pub fn move_to(&mut self, point: Point2) -> &mut Self {
        self.segments.push(PathSegment::MoveTo { point });
        self
    }

    pub fn line_to(&mut self, point: Point2) -> &mut Self {
        self.segments.push(PathSegment::LineTo { point });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Flattens the path into sub-paths of straight segments.
    ///
    /// The boolean marks sub-paths that were explicitly closed.
    #[must_use]
    pub fn flatten(&self) -> Vec<(Vec<Point2>, bool)> {
        let mut subpaths: Vec<(Vec<Point2>, bool)> = Vec::new();
        let mut current: Vec<Point2> = Vec::new();

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo { point } => {
                    if !current.is_empty() {
                        subpaths.push((std::mem::take(&mut current), false));
                    }
                    current.push(point);
                }
                PathSegment::LineTo { point } => current.push(point),
                PathSegment::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => {
                    for i in 0..=ARC_FLATTEN_SEGMENTS {
                        let t = i as f64 / ARC_FLATTEN_SEGMENTS as f64;
                        let angle = start_angle + (end_angle - start_angle) * t;
                        let (sin, cos) = angle.sin_cos();
                        current.push(Point2::new(center.x + radius * cos, center.y + radius * sin));
                    }
                }
                PathSegment::Close => {
                    if !current.is_empty() {
                        subpaths.push((std::mem::take(&mut current), true));
                    }
                }
            }
        }
        if !current.is_empty() {
            subpaths.push((current, false));
        }
        subpaths
    }
}

/// The drawing capabilities the renderer relies on.
pub trait Surface {
    fn fill_path(&mut self, path: &Path, colour: Colour, tag: Option<&str>);

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, tag: Option<&str>);

    fn fill_text(&mut self, origin: Point2, text: &str, font: &Font, colour: Colour, tag: Option<&str>);
}

/// Forwards to another surface with every colour's alpha multiplied by `opacity`.
///
/// Used to accumulate focus-blur passes on a single page.
pub struct FadedSurface<'a> {
    inner: &'a mut dyn Surface,
    opacity: f64,
}

impl<'a> FadedSurface<'a> {
    #[must_use]
    pub fn new(inner: &'a mut dyn Surface, opacity: f64) -> Self {
        Self {
            inner,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    fn fade(&self, colour: Colour) -> Colour {
        colour.with_alpha(colour.a * self.opacity)
    }
}

impl Surface for FadedSurface<'_> {
    fn fill_path(&mut self, path: &Path, colour: Colour, tag: Option<&str>) {
        let colour = self.fade(colour);
        self.inner.fill_path(path, colour, tag);
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, tag: Option<&str>) {
        let mut stroke = stroke.clone();
        stroke.colour = self.fade(stroke.colour);
        self.inner.stroke_path(path, &stroke, tag);
    }

    fn fill_text(&mut self, origin: Point2, text: &str, font: &Font, colour: Colour, tag: Option<&str>) {
        let colour = self.fade(colour);
        self.inner.fill_text(origin, text, font, colour, tag);
    }
}

use std::fmt;

use crate::geom::{NormalizedVec3, Point3, Tolerance, Vec3};
use crate::surface::Colour;

/// A light that materials can shade against.
pub trait LightSource: fmt::Debug + Send + Sync {
    /// Direction the light travels when it reaches `point`; `None` for
    /// non-directional (ambient) light.
    fn direction_at(&self, point: Point3) -> Option<NormalizedVec3>;

    /// Intensity arriving at `point`.
    fn intensity_at(&self, point: Point3) -> f64;

    fn colour(&self) -> Colour;

    /// Whether the light contributes to the ambient term only.
    fn is_ambient(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub intensity: f64,
    pub colour: Colour,
}

impl AmbientLight {
    #[must_use]
    pub const fn new(intensity: f64) -> Self {
        Self {
            intensity,
            colour: Colour::WHITE,
        }
    }
}

impl LightSource for AmbientLight {
    fn direction_at(&self, _point: Point3) -> Option<NormalizedVec3> {
        None
    }

    fn intensity_at(&self, _point: Point3) -> f64 {
        self.intensity
    }

    fn colour(&self) -> Colour {
        self.colour
    }

    fn is_ambient(&self) -> bool {
        true
    }
}

/// Light arriving from infinitely far away along a fixed direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallelLight {
    direction: NormalizedVec3,
    pub intensity: f64,
    pub colour: Colour,
}

impl ParallelLight {
    /// `direction` is the direction the light travels. Returns `None` if it is zero.
    #[must_use]
    pub fn new(direction: Vec3, intensity: f64) -> Option<Self> {
        Some(Self {
            direction: direction.normalized()?,
            intensity,
            colour: Colour::WHITE,
        })
    }

    #[must_use]
    pub const fn direction(&self) -> NormalizedVec3 {
        self.direction
    }
}

impl LightSource for ParallelLight {
    fn direction_at(&self, _point: Point3) -> Option<NormalizedVec3> {
        Some(self.direction)
    }

    fn intensity_at(&self, _point: Point3) -> f64 {
        self.intensity
    }

    fn colour(&self) -> Colour {
        self.colour
    }
}

/// Omnidirectional light with inverse-square falloff.
///
/// `intensity` is the intensity measured at `distance` from the light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3,
    pub intensity: f64,
    pub distance: f64,
    pub colour: Colour,
}

impl PointLight {
    #[must_use]
    pub const fn new(position: Point3, intensity: f64, distance: f64) -> Self {
        Self {
            position,
            intensity,
            distance,
            colour: Colour::WHITE,
        }
    }
}

impl LightSource for PointLight {
    fn direction_at(&self, point: Point3) -> Option<NormalizedVec3> {
        (point - self.position).normalized()
    }

    fn intensity_at(&self, point: Point3) -> f64 {
        let d2 = point.distance_squared_to(self.position);
        if d2 <= Tolerance::ZERO_LENGTH.eps {
            return self.intensity;
        }
        self.intensity * self.distance * self.distance / d2
    }

    fn colour(&self) -> Colour {
        self.colour
    }
}

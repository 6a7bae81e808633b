mod core;
pub mod polygon;

pub use core::{Matrix3, NormalizedVec3, Point2, Point3, Tolerance, Transform, Vec3};

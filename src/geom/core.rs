use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Unit vector along the X axis.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit vector along the Y axis.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit vector along the Z axis.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Normalizes the vector. Returns `None` for zero-length or non-finite input.
    #[must_use]
    pub fn normalized(self) -> Option<NormalizedVec3> {
        NormalizedVec3::new(self)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        Vec3::new(self * rhs.x, self * rhs.y, self * rhs.z)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NormalizedVec3
// ─────────────────────────────────────────────────────────────────────────────

/// A direction: a [`Vec3`] of unit length.
///
/// The only way to obtain one is through [`NormalizedVec3::new`] (or
/// [`Vec3::normalized`]), so functions that need a direction can take this type
/// and skip re-normalizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedVec3(Vec3);

impl NormalizedVec3 {
    pub const X: Self = Self(Vec3::X);
    pub const Y: Self = Self(Vec3::Y);
    pub const Z: Self = Self(Vec3::Z);

    #[must_use]
    pub fn new(v: Vec3) -> Option<Self> {
        let len = v.length();
        if len.is_finite() && len > 0.0 {
            Some(Self(v / len))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn x(self) -> f64 {
        self.0.x
    }

    #[must_use]
    pub const fn y(self) -> f64 {
        self.0.y
    }

    #[must_use]
    pub const fn z(self) -> f64 {
        self.0.z
    }

    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        self.0
    }

    #[must_use]
    pub const fn dot(self, rhs: Vec3) -> f64 {
        self.0.dot(rhs)
    }

    #[must_use]
    pub const fn cross(self, rhs: Vec3) -> Vec3 {
        self.0.cross(rhs)
    }
}

impl From<NormalizedVec3> for Vec3 {
    fn from(v: NormalizedVec3) -> Self {
        v.0
    }
}

impl Mul<f64> for NormalizedVec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Self::Output {
        self.0 * rhs
    }
}

impl Neg for NormalizedVec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The origin point (0, 0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Convert point to a position vector from the origin.
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Linear interpolation between two points.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    #[must_use]
    pub fn midpoint(self, rhs: Self) -> Self {
        self.lerp(rhs, 0.5)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Self;
    fn sub(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point2
// ─────────────────────────────────────────────────────────────────────────────

/// A point (or offset) in projected camera-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// Z component of the 3D cross product of the two vectors.
    #[must_use]
    pub const fn cross(self, rhs: Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        (self - other).dot(self - other)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(self.x + (rhs.x - self.x) * t, self.y + (rhs.y - self.y) * t)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point2 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl Add for Point2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Matrix3
// ─────────────────────────────────────────────────────────────────────────────

/// Row-major 3x3 matrix, used for the camera rotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    m: [[f64; 3]; 3],
}

impl Matrix3 {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Rotation by `angle` radians about the Z axis.
    #[must_use]
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            m: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Rotation by `angle` radians about `axis` (right-hand rule).
    #[must_use]
    pub fn rotation_about(axis: NormalizedVec3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x(), axis.y(), axis.z());

        Self {
            m: [
                [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
                [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
                [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
            ],
        }
    }

    /// The rotation that maps `from` onto `to`.
    ///
    /// Antiparallel inputs rotate by a half turn about an axis perpendicular to `from`.
    #[must_use]
    pub fn rotation_between(from: NormalizedVec3, to: NormalizedVec3) -> Self {
        let axis = from.cross(to.to_vec3());
        let cos = from.dot(to.to_vec3());

        if cos >= 1.0 - Tolerance::ANGLE.eps {
            return Self::identity();
        }

        if cos <= -1.0 + Tolerance::ANGLE.eps {
            let perpendicular = from
                .cross(Vec3::X)
                .normalized()
                .or_else(|| from.cross(Vec3::Y).normalized())
                .unwrap_or(NormalizedVec3::Z);
            return Self::rotation_about(perpendicular, std::f64::consts::PI);
        }

        // Rodrigues: R = I + [v]x + [v]x^2 / (1 + cos)
        let k = 1.0 / (1.0 + cos);
        let (x, y, z) = (axis.x, axis.y, axis.z);
        Self {
            m: [
                [1.0 - k * (y * y + z * z), k * x * y - z, k * x * z + y],
                [k * x * y + z, 1.0 - k * (x * x + z * z), k * y * z - x],
                [k * x * z - y, k * y * z + x, 1.0 - k * (x * x + y * y)],
            ],
        }
    }

    #[must_use]
    pub fn transpose(self) -> Self {
        let m = &self.m;
        Self {
            m: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Matrix3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        let mut result = [[0.0; 3]; 3];
        for (i, row) in result.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[i][0] * rhs.m[0][j]
                    + self.m[i][1] * rhs.m[1][j]
                    + self.m[i][2] * rhs.m[2][j];
            }
        }
        Self { m: result }
    }
}

impl Mul<Vec3> for Matrix3 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        let m = &self.m;
        Vec3::new(
            m[0][0] * rhs.x + m[0][1] * rhs.y + m[0][2] * rhs.z,
            m[1][0] * rhs.x + m[1][1] * rhs.y + m[1][2] * rhs.z,
            m[2][0] * rhs.x + m[2][1] * rhs.y + m[2][2] * rhs.z,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// Affine 4x4 transform applied to scene elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [[f64; 4]; 4],
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub const fn translate(offset: Vec3) -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, offset.x],
                [0.0, 1.0, 0.0, offset.y],
                [0.0, 0.0, 1.0, offset.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            m: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub fn rotate(axis: NormalizedVec3, angle: f64) -> Self {
        Self::from_linear(Matrix3::rotation_about(axis, angle), Vec3::ZERO)
    }

    fn from_linear(linear: Matrix3, translation: Vec3) -> Self {
        let l = &linear.m;
        Self {
            m: [
                [l[0][0], l[0][1], l[0][2], translation.x],
                [l[1][0], l[1][1], l[1][2], translation.y],
                [l[2][0], l[2][1], l[2][2], translation.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub fn apply_point(self, p: Point3) -> Point3 {
        let x = self.m[0][0] * p.x + self.m[0][1] * p.y + self.m[0][2] * p.z + self.m[0][3];
        let y = self.m[1][0] * p.x + self.m[1][1] * p.y + self.m[1][2] * p.z + self.m[1][3];
        let z = self.m[2][0] * p.x + self.m[2][1] * p.y + self.m[2][2] * p.z + self.m[2][3];
        Point3::new(x, y, z)
    }

    /// Transforms a surface normal with the inverse transpose of the linear part.
    /// Returns `None` for a singular transform.
    #[must_use]
    pub fn apply_normal(self, n: NormalizedVec3) -> Option<NormalizedVec3> {
        let m = &self.m;
        let rows = [0, 1, 2].map(|i| Vec3::new(m[i][0], m[i][1], m[i][2]));
        // Rows of the cofactor matrix, i.e. det(M) * M^-T.
        let cofactors = [
            rows[1].cross(rows[2]),
            rows[2].cross(rows[0]),
            rows[0].cross(rows[1]),
        ];
        let det = rows[0].dot(cofactors[0]);
        if !det.is_finite() || det.abs() <= Tolerance::ZERO_LENGTH.eps {
            return None;
        }
        let v = n.to_vec3();
        let scaled = Vec3::new(cofactors[0].dot(v), cofactors[1].dot(v), cofactors[2].dot(v));
        (scaled * det.signum()).normalized()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        let mut result = Self::identity();
        for (i, row) in result.m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Tolerance configuration for geometric operations.
///
/// Use the named constants to avoid epsilon scatter:
/// - `Tolerance::DEFAULT` - General geometry comparisons (1e-9)
/// - `Tolerance::ZERO_LENGTH` - Degenerate vectors, edges and areas (1e-12)
/// - `Tolerance::ANGLE` - Angular comparisons in radians (1e-9)
/// - `Tolerance::OVERLAP` - Minimum projected overlap before two shapes are ordered (1e-9)
/// - `Tolerance::PARALLEL` - Relative ray/target parallelism in deprojection (1e-12)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Default geometric tolerance (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    /// Tolerance for detecting zero-length/degenerate vectors and edges (1e-12).
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };

    /// Tolerance for angular comparisons in radians (1e-9).
    pub const ANGLE: Self = Self { eps: 1e-9 };

    /// Smallest projected overlap area that counts as occlusion (1e-9).
    pub const OVERLAP: Self = Self { eps: 1e-9 };

    /// Relative bound below which a deprojection ray counts as parallel to its
    /// target (1e-12).
    pub const PARALLEL: Self = Self { eps: 1e-12 };

    /// Loose tolerance for coarse comparisons (1e-6).
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn eps_squared(self) -> f64 {
        self.eps * self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        (a - b).length_squared() <= self.eps_squared()
    }

    #[must_use]
    pub fn approx_eq_point2(self, a: Point2, b: Point2) -> bool {
        a.distance_squared_to(b) <= self.eps_squared()
    }

    /// Check if a vector is approximately zero (degenerate).
    #[must_use]
    pub fn is_zero_vec3(self, v: Vec3) -> bool {
        v.length_squared() <= self.eps_squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!(
            Tolerance::LOOSE.approx_eq_point3(a.into(), b.into()),
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_vec3_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * a, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a / 2.0, Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert!((a.dot(b) - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_rejects_degenerate() {
        assert!(Vec3::ZERO.normalized().is_none());
        assert!(Vec3::new(f64::NAN, 0.0, 0.0).normalized().is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.to_vec3().length() - 1.0).abs() < 1e-12);
        assert!((n.x() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_point3_operators() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let v = Vec3::new(1.0, 1.0, 1.0);

        assert_eq!(p + v, Point3::new(2.0, 3.0, 4.0));
        assert_eq!(p - v, Point3::new(0.0, 1.0, 2.0));

        let q = Point3::new(4.0, 5.0, 6.0);
        assert_eq!(q - p, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(p.midpoint(q), Point3::new(2.5, 3.5, 4.5));
    }

    #[test]
    fn test_rotation_between_maps_source_to_target() {
        let pairs = [
            (Vec3::new(1.0, 2.0, 3.0), Vec3::Z),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::Z),
            (Vec3::Z, Vec3::Z),
            (Vec3::new(-4.0, 0.5, 0.1), Vec3::new(0.2, -1.0, 0.0)),
        ];
        for (from, to) in pairs {
            let from = from.normalized().unwrap();
            let to = to.normalized().unwrap();
            let r = Matrix3::rotation_between(from, to);
            assert_vec_close(r * from.to_vec3(), to.to_vec3());
            // Proper rotation: the image of a right-handed frame stays right-handed.
            assert_vec_close((r * Vec3::X).cross(r * Vec3::Y), r * Vec3::Z);
        }
    }

    #[test]
    fn test_rotation_inverse_is_transpose() {
        let axis = Vec3::new(1.0, -1.0, 2.0).normalized().unwrap();
        let r = Matrix3::rotation_about(axis, 0.7);
        let product = r * r.transpose();
        for v in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(0.3, -2.0, 5.0)] {
            assert_vec_close(product * v, v);
            assert_vec_close(r.transpose() * (r * v), v);
        }
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let r = Matrix3::rotation_z(std::f64::consts::FRAC_PI_2);
        assert_vec_close(r * Vec3::X, Vec3::Y);
    }

    #[test]
    fn test_transform_normal_under_non_uniform_scale() {
        let t = Transform::scale(2.0, 1.0, 1.0);
        let n = Vec3::new(1.0, 1.0, 0.0).normalized().unwrap();
        let transformed = t.apply_normal(n).unwrap();
        // Inverse transpose shrinks the x component.
        assert!(transformed.x() < transformed.y());
        assert!(Transform::scale(0.0, 1.0, 1.0).apply_normal(n).is_none());

        // A mirror keeps the normal on the mirrored side.
        let mirrored = Transform::scale(-1.0, 1.0, 1.0).apply_normal(NormalizedVec3::X).unwrap();
        assert_vec_close(mirrored.to_vec3(), -Vec3::X);
        let rotated = Transform::rotate(NormalizedVec3::Z, std::f64::consts::FRAC_PI_2)
            .apply_normal(NormalizedVec3::X)
            .unwrap();
        assert_vec_close(rotated.to_vec3(), Vec3::Y);
    }

    #[test]
    fn test_transform_mul_applies_right_operand_first() {
        let rotate = Transform::rotate(NormalizedVec3::Z, std::f64::consts::FRAC_PI_2);
        let shift = Transform::translate(Vec3::new(1.0, 0.0, 0.0));

        let p = (Transform::translate(Vec3::new(0.0, 0.0, 1.0)) * shift).apply_point(Point3::ORIGIN);
        assert_eq!(p, Point3::new(1.0, 0.0, 1.0));
        let q = (rotate * shift).apply_point(Point3::ORIGIN);
        assert!(Tolerance::LOOSE.approx_eq_point3(q, Point3::new(0.0, 1.0, 0.0)));
        assert_eq!(Transform::identity() * shift, shift);
    }
}

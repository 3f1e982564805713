// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Model-space and geographic geometry.
//!
//! Screen-space geometry uses [`kurbo`] directly ([`Rect`], [`Point`],
//! [`Size`](kurbo::Size)). This module covers the rest: Cartesian points in
//! model space ([`Vec3`]), geographic locations ([`Position`], [`Sector`]),
//! the view volume ([`Frustum`]) and the column-major [`Transform3d`] that
//! projects model space onto the viewport.

use core::ops::{Add, Mul, Sub};

use kurbo::{Point, Rect};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// A point or direction in model (globe Cartesian) space, in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ---------------------------------------------------------------------------
// Geographic
// ---------------------------------------------------------------------------

/// A geographic location: latitude and longitude in degrees, elevation in
/// meters above the ellipsoid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
    /// Elevation in meters.
    pub elevation: f64,
}

impl Position {
    /// Creates a position from degrees and meters.
    #[inline]
    #[must_use]
    pub const fn from_degrees(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }
}

/// A latitude/longitude bounding box in degrees. Bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sector {
    /// Southern bound.
    pub min_latitude: f64,
    /// Northern bound.
    pub max_latitude: f64,
    /// Western bound.
    pub min_longitude: f64,
    /// Eastern bound.
    pub max_longitude: f64,
}

impl Sector {
    /// The whole globe.
    pub const FULL_SPHERE: Self = Self::from_degrees(-90.0, 90.0, -180.0, 180.0);

    /// Creates a sector from degree bounds.
    #[inline]
    #[must_use]
    pub const fn from_degrees(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Self {
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    /// Returns `true` if the location lies inside the sector.
    #[inline]
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

// ---------------------------------------------------------------------------
// Frustum
// ---------------------------------------------------------------------------

/// A plane `n · p + d = 0`, with the positive half-space on the side `n`
/// points to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Plane normal (need not be unit length for containment tests).
    pub normal: Vec3,
    /// Offset.
    pub d: f64,
}

impl Plane {
    /// Creates a plane from its normal and offset.
    #[inline]
    #[must_use]
    pub const fn new(normal: Vec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Signed distance (scaled by the normal length) of `p` from the plane.
    #[inline]
    #[must_use]
    pub fn distance_to(&self, p: Vec3) -> f64 {
        self.normal.dot(p) + self.d
    }
}

/// A convex view volume bounded by six inward-facing planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// A frustum that contains every point.
    pub const UNBOUNDED: Self = Self {
        planes: [Plane::new(Vec3::ZERO, 1.0); 6],
    };

    /// Creates a frustum from six inward-facing planes.
    #[inline]
    #[must_use]
    pub const fn from_planes(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Creates the axis-aligned box `[min, max]` as a frustum.
    #[must_use]
    pub fn from_box(min: Vec3, max: Vec3) -> Self {
        Self {
            planes: [
                Plane::new(Vec3::new(1.0, 0.0, 0.0), -min.x),
                Plane::new(Vec3::new(-1.0, 0.0, 0.0), max.x),
                Plane::new(Vec3::new(0.0, 1.0, 0.0), -min.y),
                Plane::new(Vec3::new(0.0, -1.0, 0.0), max.y),
                Plane::new(Vec3::new(0.0, 0.0, 1.0), -min.z),
                Plane::new(Vec3::new(0.0, 0.0, -1.0), max.z),
            ],
        }
    }

    /// Returns `true` if `p` lies inside or on the boundary of every plane.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to(p) >= 0.0)
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Square root of `x`, whether or not kurbo was built with `std`.
#[inline]
#[must_use]
pub fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

// ---------------------------------------------------------------------------
// Screen rectangles
// ---------------------------------------------------------------------------

/// Returns `true` if two screen rectangles share interior area.
///
/// Rectangles that only touch along an edge do not intersect, and a
/// rectangle with zero width or height intersects nothing.
#[inline]
#[must_use]
pub fn rects_intersect(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    if a.width() <= 0.0 || a.height() <= 0.0 || b.width() <= 0.0 || b.height() <= 0.0 {
        return false;
    }
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

// ---------------------------------------------------------------------------
// Transform3d
// ---------------------------------------------------------------------------

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Used as the combined model-view-projection matrix of a view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self::from_scale(1.0, 1.0, 1.0);

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        )
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_cols(
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates an orthographic projection mapping the box
    /// `[left, right] × [bottom, top] × [-near, -far]` to clip space.
    ///
    /// # Panics
    ///
    /// Panics if any pair of bounds is equal.
    #[must_use]
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        assert!(
            left != right && bottom != top && near != far,
            "orthographic bounds must not be degenerate"
        );
        let rl = right - left;
        let tb = top - bottom;
        let fn_ = far - near;
        Self::from_cols(
            [2.0 / rl, 0.0, 0.0, 0.0],
            [0.0, 2.0 / tb, 0.0, 0.0],
            [0.0, 0.0, -2.0 / fn_, 0.0],
            [
                -(right + left) / rl,
                -(top + bottom) / tb,
                -(far + near) / fn_,
                1.0,
            ],
        )
    }

    /// Applies the transform to `p` with `w = 1`, returning homogeneous
    /// coordinates `[x, y, z, w]`.
    #[must_use]
    pub fn apply(&self, p: Vec3) -> [f64; 4] {
        let c = &self.cols;
        let mut out = [0.0; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = c[0][i] * p.x + c[1][i] * p.y + c[2][i] * p.z + c[3][i];
        }
        out
    }

    /// Projects `p` into window coordinates inside `viewport`.
    ///
    /// Returns `(x, y)` with the origin at the viewport's `(x0, y0)` corner
    /// and y growing toward `y1`, plus the window depth in `[0, 1]` for points
    /// between the near and far planes. Returns `None` for points at or
    /// behind the eye (`w <= 0`).
    #[must_use]
    pub fn project(&self, p: Vec3, viewport: Rect) -> Option<(Point, f64)> {
        let [x, y, z, w] = self.apply(p);
        if w <= 0.0 {
            return None;
        }
        let (nx, ny, nz) = (x / w, y / w, z / w);
        let sx = viewport.x0 + (nx + 1.0) * 0.5 * viewport.width();
        let sy = viewport.y0 + (ny + 1.0) * 0.5 * viewport.height();
        Some((Point::new(sx, sy), (nz + 1.0) * 0.5))
    }

    /// Is every element [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_matches_known_roots() {
        assert_eq!(sqrt(0.25), 0.5);
        assert_eq!(sqrt(16.0), 4.0);
        assert!(sqrt(-1.0).is_nan(), "negative input has no real root");
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Vec3::new(1.0, 2.0, 2.0);
        assert_eq!(Vec3::ZERO.distance(a), 3.0);
        assert_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn sector_bounds_are_inclusive() {
        let s = Sector::from_degrees(10.0, 20.0, 30.0, 40.0);
        assert!(s.contains(10.0, 30.0));
        assert!(s.contains(20.0, 40.0));
        assert!(!s.contains(20.000_1, 35.0));
        assert!(!s.contains(15.0, 29.9));
    }

    #[test]
    fn box_frustum_containment() {
        let f = Frustum::from_box(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(f.contains(Vec3::ZERO));
        assert!(f.contains(Vec3::new(1.0, -1.0, 1.0)));
        assert!(!f.contains(Vec3::new(1.5, 0.0, 0.0)));
        assert!(!f.contains(Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn unbounded_frustum_contains_everything() {
        assert!(Frustum::UNBOUNDED.contains(Vec3::new(1e12, -1e12, 5.0)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!rects_intersect(a, b));
        let c = Rect::new(9.5, 9.5, 12.0, 12.0);
        assert!(rects_intersect(a, c));
        assert!(rects_intersect(c, a));
    }

    #[test]
    fn empty_rect_intersects_nothing() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let line = Rect::new(5.0, 0.0, 5.0, 10.0);
        assert!(!rects_intersect(a, line));
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn scale_then_translate() {
        let combined = Transform3d::from_translation(3.0, 4.0, 0.0) * Transform3d::from_scale(2.0, 2.0, 2.0);
        assert_eq!(combined.apply(Vec3::new(1.0, 1.0, 1.0)), [5.0, 6.0, 2.0, 1.0]);
    }

    #[test]
    fn orthographic_projects_into_viewport() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let proj = Transform3d::orthographic(0.0, 800.0, 0.0, 600.0, 0.0, 100.0);
        let (pt, depth) = proj.project(Vec3::new(400.0, 150.0, -50.0), viewport).unwrap();
        assert!((pt.x - 400.0).abs() < 1e-9);
        assert!((pt.y - 150.0).abs() < 1e-9);
        assert!((depth - 0.5).abs() < 1e-9);
    }

    #[test]
    fn points_behind_eye_do_not_project() {
        let mut t = Transform3d::IDENTITY;
        t.cols[3][3] = -1.0;
        assert!(t.project(Vec3::ZERO, Rect::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    #[should_panic(expected = "orthographic bounds must not be degenerate")]
    fn degenerate_orthographic_panics() {
        let _ = Transform3d::orthographic(0.0, 0.0, 0.0, 1.0, 0.0, 1.0);
    }

    #[test]
    fn nan_is_not_finite() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(Transform3d::IDENTITY.is_finite());
    }
}

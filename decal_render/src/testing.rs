// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use decal_core::frame::FrameId;
use decal_core::geom::{Position, Sector, Transform3d, Vec3};
use decal_core::view::{Globe, ViewState};
use kurbo::{Point, Rect};

/// Longitude maps to x, latitude to y and elevation to z. Terrain is flat at
/// `ground` and never missing.
pub(crate) struct FlatGlobe {
    pub(crate) ground: f64,
}

impl Globe for FlatGlobe {
    fn max_elevation(&self) -> f64 {
        8_000.0
    }

    fn elevation(&self, _latitude: f64, _longitude: f64) -> f64 {
        self.ground
    }

    fn surface_point(&self, latitude: f64, longitude: f64, elevation: f64) -> Option<Vec3> {
        Some(Vec3::new(longitude, latitude, self.ground + elevation))
    }

    fn point_from_position(&self, p: Position) -> Vec3 {
        Vec3::new(p.longitude, p.latitude, p.elevation)
    }
}

/// An 800×600 view whose projection maps model `(x, y)` straight to window
/// `(x, y)`; model `z = 0` lands at window depth `0.5`.
///
/// The visible sector is widened so that any on-screen "latitude" and
/// "longitude" pass the sector test.
pub(crate) fn view(eye_altitude: f64) -> ViewState {
    let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
    let mut view = ViewState::new(FrameId(1), Vec3::new(400.0, 300.0, 500.0), eye_altitude, viewport);
    view.projection = Transform3d::orthographic(0.0, 800.0, 0.0, 600.0, -1_000.0, 1_000.0);
    view.visible_sector = Some(Sector::from_degrees(-1_000.0, 1_000.0, -1_000.0, 1_000.0));
    view
}

/// Projected coordinates carry rounding error; compare within `1e-9`.
pub(crate) fn rect_near(a: Rect, b: Rect) -> bool {
    point_near(a.origin(), b.origin()) && point_near(Point::new(a.x1, a.y1), Point::new(b.x1, b.y1))
}

/// See [`rect_near`].
pub(crate) fn point_near(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

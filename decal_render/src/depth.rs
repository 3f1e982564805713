// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-test policy for screen-aligned decorations.
//!
//! Below the highest terrain, labels and icons are depth-tested against the
//! terrain at a depth nudged slightly toward the eye, so nearby terrain does
//! not swallow them. From above the highest terrain they cannot be occluded
//! by it and depth testing is switched off.

use decal_core::view::ViewState;

/// Offset subtracted from a decoration's window depth, eight depth steps of
/// `1 / 2046`.
pub const DEPTH_BIAS: f64 = 8.0 * 0.000_488_758_09;

/// Depth test for one draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DepthTest {
    /// Always pass.
    Always,
    /// Pass when nearer than the stored depth; fragments are written at
    /// `depth`.
    Less {
        /// Window depth in `[0, 1]`.
        depth: f64,
    },
    /// Pass only where the stored depth equals `depth`.
    Equal {
        /// Window depth in `[0, 1]`.
        depth: f64,
    },
}

/// Returns `true` if the eye is below the highest (exaggerated) terrain.
#[inline]
#[must_use]
pub fn eye_below_terrain(view: &ViewState, max_elevation: f64) -> bool {
    view.eye_altitude < max_elevation * view.vertical_exaggeration
}

/// Biased depth for a decoration at window depth `screen_z`.
#[inline]
#[must_use]
pub fn biased_depth(screen_z: f64) -> f64 {
    (screen_z - DEPTH_BIAS).clamp(0.0, 1.0)
}

/// Depth test for a text label at window depth `screen_z`.
#[must_use]
pub fn text_depth(view: &ViewState, max_elevation: f64, screen_z: f64) -> DepthTest {
    if eye_below_terrain(view, max_elevation) {
        DepthTest::Less {
            depth: biased_depth(screen_z),
        }
    } else {
        DepthTest::Always
    }
}

/// Depth test for an icon.
///
/// Icons past the horizon seen from above the terrain are drawn only where
/// nothing closer than the far plane was drawn.
#[must_use]
pub fn icon_depth(
    view: &ViewState,
    max_elevation: f64,
    screen_z: f64,
    always_on_top: bool,
    eye_distance: f64,
) -> DepthTest {
    if always_on_top {
        DepthTest::Always
    } else if eye_below_terrain(view, max_elevation) {
        DepthTest::Less {
            depth: biased_depth(screen_z),
        }
    } else if eye_distance > view.horizon_distance {
        DepthTest::Equal { depth: 1.0 }
    } else {
        DepthTest::Always
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decal_core::frame::FrameId;
    use decal_core::geom::Vec3;
    use kurbo::Rect;

    fn view(altitude: f64) -> ViewState {
        ViewState::new(FrameId(1), Vec3::ZERO, altitude, Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn low_eye_biases_toward_viewer() {
        let d = text_depth(&view(1_000.0), 8_000.0, 0.5);
        assert_eq!(d, DepthTest::Less { depth: 0.5 - DEPTH_BIAS });
    }

    #[test]
    fn high_eye_disables_depth() {
        assert_eq!(text_depth(&view(9_000.0), 8_000.0, 0.5), DepthTest::Always);
    }

    #[test]
    fn exaggeration_raises_threshold() {
        let mut v = view(9_000.0);
        v.vertical_exaggeration = 2.0;
        assert!(matches!(text_depth(&v, 8_000.0, 0.5), DepthTest::Less { .. }));
    }

    #[test]
    fn bias_is_clamped() {
        assert_eq!(biased_depth(0.001), 0.0);
        assert_eq!(biased_depth(1.5), 1.0);
    }

    #[test]
    fn icon_policy() {
        let mut v = view(9_000.0);
        v.horizon_distance = 100.0;
        assert_eq!(icon_depth(&v, 8_000.0, 0.5, true, 500.0), DepthTest::Always);
        assert_eq!(icon_depth(&v, 8_000.0, 0.5, false, 500.0), DepthTest::Equal { depth: 1.0 });
        assert_eq!(icon_depth(&v, 8_000.0, 0.5, false, 50.0), DepthTest::Always);
        v.eye_altitude = 10.0;
        assert!(matches!(icon_depth(&v, 8_000.0, 0.5, false, 500.0), DepthTest::Less { .. }));
    }
}

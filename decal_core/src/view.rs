// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame view state and the globe collaborator.
//!
//! A [`ViewState`] is built once per frame by the host renderer and then
//! shared immutably by every eligibility test, renderer and layout pass. The
//! terrain model sits behind the [`Globe`] trait.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::frame::FrameId;
use crate::geom::{Frustum, Position, Sector, Transform3d, Vec3};

/// How the globe is projected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GlobeMode {
    /// A round (ellipsoidal) globe with a horizon.
    #[default]
    Round,
    /// A single flat map.
    Flat,
    /// A flat map repeated across longitude wraps, so one feature can appear
    /// at several screen locations in the same frame.
    ContinuousFlat,
}

impl GlobeMode {
    /// Returns `true` for projections that repeat across longitude wraps.
    #[inline]
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::ContinuousFlat)
    }

    /// Returns `true` for any flat projection.
    #[inline]
    #[must_use]
    pub const fn is_flat(self) -> bool {
        matches!(self, Self::Flat | Self::ContinuousFlat)
    }
}

/// What the current pass produces.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Pass {
    /// Normal color rendering.
    #[default]
    Draw,
    /// Pick rendering for the given request.
    Pick(PickRequest),
}

impl Pass {
    /// Returns `true` during a pick pass.
    #[inline]
    #[must_use]
    pub const fn is_picking(&self) -> bool {
        matches!(self, Self::Pick(_))
    }

    /// Returns the pick request, if picking.
    #[inline]
    #[must_use]
    pub const fn pick(&self) -> Option<&PickRequest> {
        match self {
            Self::Pick(request) => Some(request),
            Self::Draw => None,
        }
    }

    /// Returns the compact discriminant used in trace events.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> PassKind {
        match self {
            Self::Draw => PassKind::Draw,
            Self::Pick(_) => PassKind::Pick,
        }
    }
}

/// Discriminant of [`Pass`], without the pick payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Normal color rendering.
    Draw,
    /// Pick rendering.
    Pick,
}

/// A pick point and the screen rectangles it is resolved against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PickRequest {
    /// The point being picked, in viewport coordinates.
    pub point: Point,
    /// Active pick rectangles. A candidate takes part in the pick pass only
    /// if its screen bounds intersect one of these.
    pub regions: Vec<Rect>,
}

impl PickRequest {
    /// Creates a request for a single point with a square pick region of
    /// `radius` around it.
    #[must_use]
    pub fn at(point: Point, radius: f64) -> Self {
        Self {
            point,
            regions: alloc::vec![Rect::from_center_size(point, (radius * 2.0, radius * 2.0))],
        }
    }
}

/// Everything the eligibility filter and renderers read about the current
/// frame's view.
#[derive(Clone, Debug)]
pub struct ViewState {
    /// Identity of the frame this view belongs to.
    pub frame: FrameId,
    /// Eye point in model space.
    pub eye_point: Vec3,
    /// Eye altitude above the ellipsoid, in meters.
    pub eye_altitude: f64,
    /// View frustum in model space.
    pub frustum: Frustum,
    /// Distance from the eye to the horizon, in meters.
    pub horizon_distance: f64,
    /// Viewport in window coordinates (y-up).
    pub viewport: Rect,
    /// Combined model-view-projection matrix.
    pub projection: Transform3d,
    /// Geographic region currently on screen; `None` before the terrain has
    /// established one.
    pub visible_sector: Option<Sector>,
    /// Terrain vertical exaggeration factor.
    pub vertical_exaggeration: f64,
    /// Distance from the eye to the point the view looks at, if known.
    pub look_at_distance: Option<f64>,
    /// Globe projection mode.
    pub globe_mode: GlobeMode,
    /// Draw or pick.
    pub pass: Pass,
}

impl ViewState {
    /// Creates a draw-pass view with permissive defaults: unbounded frustum,
    /// infinite horizon, identity projection, full-sphere visible sector and
    /// no exaggeration.
    #[must_use]
    pub fn new(frame: FrameId, eye_point: Vec3, eye_altitude: f64, viewport: Rect) -> Self {
        Self {
            frame,
            eye_point,
            eye_altitude,
            frustum: Frustum::UNBOUNDED,
            horizon_distance: f64::INFINITY,
            viewport,
            projection: Transform3d::IDENTITY,
            visible_sector: Some(Sector::FULL_SPHERE),
            vertical_exaggeration: 1.0,
            look_at_distance: None,
            globe_mode: GlobeMode::Round,
            pass: Pass::Draw,
        }
    }

    /// Projects a model-space point into the viewport.
    ///
    /// Returns the window point and depth, see [`Transform3d::project`].
    #[inline]
    #[must_use]
    pub fn project(&self, p: Vec3) -> Option<(Point, f64)> {
        self.projection.project(p, self.viewport)
    }

    /// Returns `true` during a pick pass.
    #[inline]
    #[must_use]
    pub const fn is_picking(&self) -> bool {
        self.pass.is_picking()
    }

    /// Returns `true` if `bounds` intersects any active pick region.
    ///
    /// Always `false` outside a pick pass.
    #[must_use]
    pub fn intersects_pick_regions(&self, bounds: Rect) -> bool {
        self.pass.pick().is_some_and(|request| {
            request
                .regions
                .iter()
                .any(|region| crate::geom::rects_intersect(*region, bounds))
        })
    }
}

/// The terrain and ellipsoid model.
///
/// Implemented by the host renderer. Terrain sampling may be unavailable
/// while tiles are still loading; callers treat `None` as "not visible this
/// frame" and try again next frame.
pub trait Globe {
    /// Highest terrain elevation on the globe, in meters.
    fn max_elevation(&self) -> f64;

    /// Terrain elevation at a location, in meters.
    fn elevation(&self, latitude: f64, longitude: f64) -> f64;

    /// Samples the terrain surface at a location, offset by `elevation`
    /// meters. Returns `None` when no terrain is loaded there yet.
    fn surface_point(&self, latitude: f64, longitude: f64, elevation: f64) -> Option<Vec3>;

    /// Ellipsoid point for a position, ignoring terrain.
    fn point_from_position(&self, position: Position) -> Vec3;
}

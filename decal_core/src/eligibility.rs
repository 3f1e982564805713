// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The eligibility filter.
//!
//! [`evaluate`] decides whether a candidate takes part in the current pass
//! and, if so, at which eye distance it sorts. Rules run in a fixed order
//! and stop at the first failure:
//!
//! 1. required content present
//! 2. globe position resolves
//! 3. visibility flag set
//! 4. pick pass only: screen bounds intersect a pick region
//! 5. eye altitude inside the active range (inclusive)
//! 6. globe candidates: inside the visible sector, draw point resolves,
//!    inside the frustum, inside the horizon on non-continuous globes
//! 7. screen candidates: bounds intersect the viewport
//!
//! The function reads only the candidate, the view and the globe, so callers
//! may evaluate candidates in parallel and push the survivors serially.

use kurbo::Rect;

use crate::candidate::{Candidate, CandidateKind};
use crate::geom::{Position, Vec3, rects_intersect};
use crate::view::{Globe, ViewState};

/// Eye distance given to candidates that have no draw point.
pub const NON_POSITIONAL_EYE_DISTANCE: f64 = 1.0;

/// How a globe candidate's draw point is derived from its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawPointMode {
    /// Sample the terrain when the position lies below the globe's maximum
    /// elevation; fall back to the ellipsoid point when the sample is
    /// missing or the position is above every terrain feature.
    SurfaceThenGlobe,
    /// Sample the terrain at the position's elevation times the vertical
    /// exaggeration. A missing sample rejects the candidate.
    Surface,
    /// Use the ellipsoid point at the position's elevation.
    Absolute,
    /// Use the ellipsoid point at the position's elevation plus the terrain
    /// elevation beneath it.
    TerrainRelative,
}

/// What a screen candidate that falls outside the viewport does to the rest
/// of its submission call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OffscreenPolicy {
    /// Reject the candidate and carry on with the next one.
    #[default]
    Skip,
    /// Reject the candidate and stop evaluating the rest of the call.
    EndSubmission,
}

/// Per-renderer switches for the filter chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EligibilityConfig {
    /// Draw point derivation for globe candidates.
    pub draw_point: DrawPointMode,
    /// Reject globe candidates whose draw point is outside the frustum.
    pub view_clipping: bool,
    /// Reject globe candidates beyond the horizon on non-continuous globes.
    pub horizon_clipping: bool,
    /// Reject candidates outside every pick region during a pick pass.
    pub pick_clipping: bool,
    /// Behavior for off-viewport screen candidates.
    pub offscreen: OffscreenPolicy,
}

impl EligibilityConfig {
    /// Annotations and balloons.
    #[must_use]
    pub const fn annotations() -> Self {
        Self {
            draw_point: DrawPointMode::SurfaceThenGlobe,
            view_clipping: true,
            horizon_clipping: true,
            pick_clipping: true,
            offscreen: OffscreenPolicy::Skip,
        }
    }

    /// Geographic text labels.
    #[must_use]
    pub const fn text() -> Self {
        Self {
            draw_point: DrawPointMode::Surface,
            view_clipping: true,
            horizon_clipping: true,
            pick_clipping: false,
            offscreen: OffscreenPolicy::Skip,
        }
    }

    /// Icons and markers.
    #[must_use]
    pub const fn icons() -> Self {
        Self {
            draw_point: DrawPointMode::TerrainRelative,
            view_clipping: true,
            horizon_clipping: false,
            pick_clipping: true,
            offscreen: OffscreenPolicy::Skip,
        }
    }

    /// Returns a copy with a different draw point mode.
    #[must_use]
    pub const fn with_draw_point(mut self, mode: DrawPointMode) -> Self {
        self.draw_point = mode;
        self
    }

    /// Returns a copy with a different offscreen policy.
    #[must_use]
    pub const fn with_offscreen(mut self, policy: OffscreenPolicy) -> Self {
        self.offscreen = policy;
        self
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self::annotations()
    }
}

/// Why a candidate was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Required content is missing.
    MissingContent,
    /// A globe candidate has no position.
    UnresolvedPosition,
    /// The visibility flag is off.
    Hidden,
    /// Outside every pick region during a pick pass.
    OutsidePickRange,
    /// Eye altitude outside the candidate's active range.
    OutsideAltitudeRange,
    /// Location outside the visible sector.
    OutsideSector,
    /// Terrain is not available at the location yet.
    TerrainUnavailable,
    /// Draw point outside the view frustum.
    OutsideFrustum,
    /// Draw point farther than the horizon.
    BeyondHorizon,
    /// A screen candidate misses the viewport.
    Offscreen,
}

/// Where and at what distance an accepted candidate is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Sort key for the ordered queue.
    pub eye_distance: f64,
    /// Model-space draw point of a globe candidate.
    pub draw_point: Option<Vec3>,
}

/// Outcome of [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Eligibility {
    /// Draw the candidate at this placement.
    Accept(Placement),
    /// Skip the candidate this pass.
    Reject(RejectReason),
}

impl Eligibility {
    /// Returns the placement if accepted.
    #[inline]
    #[must_use]
    pub const fn placement(&self) -> Option<Placement> {
        match self {
            Self::Accept(p) => Some(*p),
            Self::Reject(_) => None,
        }
    }
}

/// Runs the filter chain for one candidate.
#[must_use]
pub fn evaluate<C: Candidate + ?Sized>(
    candidate: &C,
    view: &ViewState,
    globe: &dyn Globe,
    config: &EligibilityConfig,
) -> Eligibility {
    evaluate_inner(candidate, view, globe, config, None)
}

/// Runs the filter chain for a globe candidate whose draw point is already
/// known (for example, computed by a tile that renders it).
#[must_use]
pub fn evaluate_at<C: Candidate + ?Sized>(
    candidate: &C,
    view: &ViewState,
    globe: &dyn Globe,
    config: &EligibilityConfig,
    draw_point: Vec3,
) -> Eligibility {
    evaluate_inner(candidate, view, globe, config, Some(draw_point))
}

fn evaluate_inner<C: Candidate + ?Sized>(
    candidate: &C,
    view: &ViewState,
    globe: &dyn Globe,
    config: &EligibilityConfig,
    known_point: Option<Vec3>,
) -> Eligibility {
    use Eligibility::Reject;

    if !candidate.has_content() {
        return Reject(RejectReason::MissingContent);
    }
    let kind = candidate.kind();
    let position = match kind {
        CandidateKind::Globe => match candidate.position() {
            Some(p) => Some(p),
            None => return Reject(RejectReason::UnresolvedPosition),
        },
        CandidateKind::Screen => None,
    };
    if !candidate.is_visible() {
        return Reject(RejectReason::Hidden);
    }
    if config.pick_clipping && view.is_picking() {
        let hit = candidate
            .screen_bounds(view, globe)
            .is_some_and(|bounds| view.intersects_pick_regions(bounds));
        if !hit {
            return Reject(RejectReason::OutsidePickRange);
        }
    }
    if !candidate.active_altitudes().contains(view.eye_altitude) {
        return Reject(RejectReason::OutsideAltitudeRange);
    }

    let always_on_top = candidate.is_always_on_top();
    match position {
        Some(position) => {
            if !view
                .visible_sector
                .is_some_and(|s| s.contains(position.latitude, position.longitude))
            {
                return Reject(RejectReason::OutsideSector);
            }
            let Some(point) = known_point.or_else(|| draw_point(position, view, globe, config.draw_point)) else {
                return Reject(RejectReason::TerrainUnavailable);
            };
            if config.view_clipping && !view.frustum.contains(point) {
                return Reject(RejectReason::OutsideFrustum);
            }
            let eye_distance = if always_on_top {
                0.0
            } else {
                view.eye_point.distance(point)
            };
            if config.horizon_clipping
                && !view.globe_mode.is_continuous()
                && eye_distance > view.horizon_distance
            {
                return Reject(RejectReason::BeyondHorizon);
            }
            Eligibility::Accept(Placement {
                eye_distance,
                draw_point: Some(point),
            })
        }
        None => {
            if let Some(bounds) = candidate.screen_bounds(view, globe)
                && !viewport_hit(bounds, view.viewport)
            {
                return Reject(RejectReason::Offscreen);
            }
            Eligibility::Accept(Placement {
                eye_distance: if always_on_top {
                    0.0
                } else {
                    NON_POSITIONAL_EYE_DISTANCE
                },
                draw_point: None,
            })
        }
    }
}

fn viewport_hit(bounds: Rect, viewport: Rect) -> bool {
    rects_intersect(bounds, viewport)
}

/// Resolves the model-space draw point of a position.
///
/// Returns `None` only when terrain sampling is required and unavailable.
#[must_use]
pub fn draw_point(position: Position, view: &ViewState, globe: &dyn Globe, mode: DrawPointMode) -> Option<Vec3> {
    let Position {
        latitude,
        longitude,
        elevation,
    } = position;
    match mode {
        DrawPointMode::SurfaceThenGlobe => {
            let sampled = if elevation < globe.max_elevation() {
                globe.surface_point(latitude, longitude, elevation)
            } else {
                None
            };
            Some(sampled.unwrap_or_else(|| globe.point_from_position(position)))
        }
        DrawPointMode::Surface => {
            globe.surface_point(latitude, longitude, elevation * view.vertical_exaggeration)
        }
        DrawPointMode::Absolute => Some(globe.point_from_position(position)),
        DrawPointMode::TerrainRelative => {
            let ground = globe.elevation(latitude, longitude);
            Some(globe.point_from_position(Position {
                elevation: elevation + ground,
                ..position
            }))
        }
    }
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawable candidate contract.
//!
//! Anything that wants to be drawn through the ordered pass (annotations,
//! labels, icons) implements [`Candidate`]. The kind of anchoring is decided
//! once, when the candidate is built, and reported through
//! [`Candidate::kind`]; the filter chain branches on that tag instead of
//! probing capabilities at every step.

use core::fmt;

use kurbo::Rect;

use crate::geom::Position;
use crate::view::{Globe, ViewState};

/// Identity of a candidate.
///
/// Used as the key for per-frame submission sets and to name the offending
/// candidate in diagnostics. Callers are responsible for keeping ids unique
/// among the candidates submitted in one frame.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateId(pub u64);

impl fmt::Debug for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CandidateId({})", self.0)
    }
}

/// A non-owning reference to the layer that submitted an entry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerRef(pub u32);

impl fmt::Debug for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerRef({})", self.0)
    }
}

/// How a candidate is anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// Anchored to a geographic position; its draw point comes from the
    /// terrain or the ellipsoid.
    Globe,
    /// Anchored to a fixed viewport location.
    Screen,
}

/// Inclusive eye-altitude range in which a candidate is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AltitudeRange {
    /// Lowest eye altitude, in meters.
    pub min: f64,
    /// Highest eye altitude, in meters.
    pub max: f64,
}

impl AltitudeRange {
    /// Active at every altitude.
    pub const ALL: Self = Self {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Creates a range.
    ///
    /// # Panics
    ///
    /// Panics if `min > max` or either bound is NaN.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        assert!(min <= max, "altitude range min must not exceed max");
        Self { min, max }
    }

    /// Returns `true` if `altitude` lies within the range, bounds included.
    #[inline]
    #[must_use]
    pub fn contains(&self, altitude: f64) -> bool {
        altitude >= self.min && altitude <= self.max
    }
}

impl Default for AltitudeRange {
    #[inline]
    fn default() -> Self {
        Self::ALL
    }
}

/// The capability set every drawable exposes to the ordered pass.
pub trait Candidate {
    /// Identity used for deduplication and diagnostics.
    fn id(&self) -> CandidateId;

    /// Anchoring, fixed for the candidate's lifetime.
    fn kind(&self) -> CandidateKind;

    /// Whether the candidate has its required content (text, image, …).
    fn has_content(&self) -> bool;

    /// Geographic position of a [`CandidateKind::Globe`] candidate.
    ///
    /// Screen candidates return `None`.
    fn position(&self) -> Option<Position>;

    /// Visibility flag.
    fn is_visible(&self) -> bool;

    /// Always-on-top candidates sort with an eye distance of zero.
    fn is_always_on_top(&self) -> bool {
        false
    }

    /// Eye altitudes at which the candidate is drawn.
    fn active_altitudes(&self) -> AltitudeRange {
        AltitudeRange::ALL
    }

    /// Bounds in viewport coordinates, or `None` if they cannot be computed
    /// this frame.
    fn screen_bounds(&self, view: &ViewState, globe: &dyn Globe) -> Option<Rect>;
}

macro_rules! impl_candidate_for_pointer {
    ($($ptr:ty),*) => {$(
        impl<C: Candidate + ?Sized> Candidate for $ptr {
            fn id(&self) -> CandidateId {
                (**self).id()
            }
            fn kind(&self) -> CandidateKind {
                (**self).kind()
            }
            fn has_content(&self) -> bool {
                (**self).has_content()
            }
            fn position(&self) -> Option<Position> {
                (**self).position()
            }
            fn is_visible(&self) -> bool {
                (**self).is_visible()
            }
            fn is_always_on_top(&self) -> bool {
                (**self).is_always_on_top()
            }
            fn active_altitudes(&self) -> AltitudeRange {
                (**self).active_altitudes()
            }
            fn screen_bounds(&self, view: &ViewState, globe: &dyn Globe) -> Option<Rect> {
                (**self).screen_bounds(view, globe)
            }
        }
    )*};
}

impl_candidate_for_pointer!(&C, alloc::rc::Rc<C>, alloc::boxed::Box<C>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn altitude_bounds_are_inclusive() {
        let range = AltitudeRange::new(100.0, 200.0);
        assert!(range.contains(100.0));
        assert!(range.contains(200.0));
        assert!(!range.contains(99.999));
        assert!(!range.contains(200.001));
    }

    #[test]
    fn all_contains_extremes() {
        assert!(AltitudeRange::ALL.contains(-1e9));
        assert!(AltitudeRange::ALL.contains(f64::MAX));
    }

    #[test]
    #[should_panic(expected = "altitude range min must not exceed max")]
    fn inverted_range_panics() {
        let _ = AltitudeRange::new(10.0, 5.0);
    }

    #[test]
    fn id_debug_format() {
        assert_eq!(alloc::format!("{:?}", CandidateId(3)), "CandidateId(3)");
        assert_eq!(alloc::format!("{:?}", LayerRef(9)), "LayerRef(9)");
    }
}

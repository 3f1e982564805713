// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlap culling for screen-space labels.
//!
//! [`DeclutterFilter`] accepts rectangles strictly first-come: a rectangle is
//! kept only if it is present and overlaps no rectangle kept before it. The
//! caller decides the order, normally with [`sort_for_declutter`] (priority
//! descending, then nearest first). Each check is linear in the number of
//! claims so a full pass is quadratic, which is fine for the few hundred
//! labels a frame shows.
//!
//! Distance scaling helpers live here too, since the rectangle a label
//! claims depends on the scale it is drawn at.

use alloc::vec::Vec;

use decal_core::candidate::CandidateId;
use decal_core::geom::{rects_intersect, sqrt};
use decal_core::queue::{Family, Ordered, OrderedEntry, OrderedQueue};
use kurbo::Rect;

/// A rectangle a kept label occupies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeclutterClaim {
    /// Owner of the claim, if known.
    pub candidate: Option<CandidateId>,
    /// Claimed screen area, margin included.
    pub rect: Rect,
}

/// Kept and dropped counts of one filtering run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeclutterTotals {
    /// Items kept.
    pub accepted: u32,
    /// Items dropped for overlap or missing bounds.
    pub rejected: u32,
}

/// First-come overlap filter.
#[derive(Clone, Debug, Default)]
pub struct DeclutterFilter {
    claims: Vec<DeclutterClaim>,
    margin: f64,
}

impl DeclutterFilter {
    /// Creates a filter with no margin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter that inflates every rectangle by `margin` on each
    /// side before testing it.
    ///
    /// # Panics
    ///
    /// Panics if `margin` is negative.
    #[must_use]
    pub fn with_margin(margin: f64) -> Self {
        assert!(margin >= 0.0, "declutter margin must be non-negative");
        Self {
            claims: Vec::new(),
            margin,
        }
    }

    /// The inflation margin.
    #[inline]
    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Claims `rect` for `candidate` if it is present and overlaps no
    /// earlier claim. Returns whether the claim was accepted.
    pub fn try_claim(&mut self, candidate: Option<CandidateId>, rect: Option<Rect>) -> bool {
        let Some(rect) = rect else {
            return false;
        };
        let rect = expanded(rect, self.margin);
        if self.claims.iter().any(|c| rects_intersect(c.rect, rect)) {
            return false;
        }
        self.claims.push(DeclutterClaim { candidate, rect });
        true
    }

    /// Accepted claims, in acceptance order.
    #[must_use]
    pub fn claims(&self) -> &[DeclutterClaim] {
        &self.claims
    }

    /// Forgets every claim.
    pub fn clear(&mut self) {
        self.claims.clear();
    }

    /// Keeps the items of `items` whose rectangles can be claimed, in order.
    ///
    /// `bounds` returns each item's owner and rectangle.
    pub fn retain<T>(
        &mut self,
        items: &mut Vec<T>,
        mut bounds: impl FnMut(&T) -> (Option<CandidateId>, Option<Rect>),
    ) -> DeclutterTotals {
        let before = items.len();
        items.retain(|item| {
            let (candidate, rect) = bounds(item);
            self.try_claim(candidate, rect)
        });
        DeclutterTotals {
            accepted: count(items.len()),
            rejected: count(before - items.len()),
        }
    }
}

/// Sorts a batch for decluttering: higher priority first, then nearer first.
///
/// The sort is stable, so equal keys keep their queue order.
pub fn sort_for_declutter<T>(batch: &mut [OrderedEntry<T>], mut priority: impl FnMut(&T) -> f64) {
    batch.sort_by(|a, b| {
        priority(&b.item)
            .total_cmp(&priority(&a.item))
            .then(a.eye_distance.total_cmp(&b.eye_distance))
    });
}

/// Declutters every queued entry of `family` at once.
///
/// Matching entries are taken from the queue, filtered nearest first and the
/// survivors put back in their original order. Entries of other families are
/// untouched.
pub fn declutter_queue<T: Ordered>(
    queue: &mut OrderedQueue<T>,
    family: Family,
    filter: &mut DeclutterFilter,
    mut bounds: impl FnMut(&OrderedEntry<T>) -> Option<Rect>,
) -> DeclutterTotals {
    let mut taken = queue.take_where(|e| e.family() == family);
    // Popped far-to-near; nearest claims first.
    taken.reverse();
    let totals = filter.retain(&mut taken, |e| (e.item.candidate(), bounds(e)));
    for entry in taken {
        queue.reinsert(entry);
    }
    totals
}

// ---------------------------------------------------------------------------
// Distance scaling
// ---------------------------------------------------------------------------

/// Scale and fade of labels by their distance relative to the look-at point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceScaling {
    /// Smallest scale.
    pub min_scale: f64,
    /// Largest scale.
    pub max_scale: f64,
    /// Smallest opacity.
    pub min_opacity: f64,
}

impl DistanceScaling {
    /// No scaling and no fading.
    pub const DEFAULT: Self = Self {
        min_scale: 1.0,
        max_scale: 1.0,
        min_opacity: 1.0,
    };

    /// Creates a scaling policy.
    ///
    /// # Panics
    ///
    /// Panics if `min_scale > max_scale` or `min_opacity` is outside `[0, 1]`.
    #[must_use]
    pub fn new(min_scale: f64, max_scale: f64, min_opacity: f64) -> Self {
        assert!(min_scale <= max_scale, "min_scale must not exceed max_scale");
        assert!(
            (0.0..=1.0).contains(&min_opacity),
            "min_opacity must be in [0, 1]"
        );
        Self {
            min_scale,
            max_scale,
            min_opacity,
        }
    }

    /// Returns `true` if this policy changes anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self != Self::DEFAULT
    }

    /// Scale and opacity for a label at `eye_distance` when the view looks
    /// at a point `look_at` away.
    ///
    /// Returns `(1, 1)` when inactive or when either distance is unusable.
    #[must_use]
    pub fn scale_and_opacity(&self, look_at: Option<f64>, eye_distance: f64) -> (f64, f64) {
        let Some(look_at) = look_at else {
            return (1.0, 1.0);
        };
        if !self.is_active() || eye_distance <= 0.0 || look_at <= 0.0 {
            return (1.0, 1.0);
        }
        let factor = sqrt(look_at / eye_distance);
        (
            factor.clamp(self.min_scale, self.max_scale),
            factor.clamp(self.min_opacity, 1.0),
        )
    }
}

impl Default for DistanceScaling {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Scales `rect` about its bottom-center point (y-up).
#[must_use]
pub fn scaled_bounds(rect: Rect, scale: f64) -> Rect {
    if scale == 1.0 {
        return rect;
    }
    let half = rect.width() / 2.0;
    let x0 = rect.x0 + half - half * scale;
    Rect::new(x0, rect.y0, x0 + rect.width() * scale, rect.y0 + rect.height() * scale)
}

/// Inflates `rect` by `margin` on each side.
#[must_use]
pub fn expanded(rect: Rect, margin: f64) -> Rect {
    if margin == 0.0 {
        rect
    } else {
        rect.inflate(margin, margin)
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn r(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Rect> {
        Some(Rect::new(x0, y0, x1, y1))
    }

    #[test]
    fn accepted_rects_never_overlap() {
        let mut filter = DeclutterFilter::new();
        let offered = [
            r(0.0, 0.0, 10.0, 10.0),
            r(5.0, 5.0, 15.0, 15.0),
            r(10.0, 0.0, 20.0, 10.0),
            r(30.0, 30.0, 40.0, 40.0),
            r(35.0, 0.0, 36.0, 50.0),
            None,
            r(19.0, 9.0, 25.0, 12.0),
        ];
        for (i, rect) in offered.into_iter().enumerate() {
            filter.try_claim(Some(CandidateId(i as u64)), rect);
        }
        let claims = filter.claims();
        for (i, a) in claims.iter().enumerate() {
            for b in &claims[i + 1..] {
                assert!(!rects_intersect(a.rect, b.rect), "{a:?} overlaps {b:?}");
            }
        }
        let kept: Vec<_> = claims.iter().map(|c| c.candidate.unwrap().0).collect();
        // Touching edges at x = 10 do not overlap.
        assert_eq!(kept, [0, 2, 3]);
    }

    #[test]
    fn first_come_wins() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(5.0, 0.0, 15.0, 10.0);

        let mut filter = DeclutterFilter::new();
        assert!(filter.try_claim(Some(CandidateId(1)), a));
        assert!(!filter.try_claim(Some(CandidateId(2)), b));

        let mut filter = DeclutterFilter::new();
        assert!(filter.try_claim(Some(CandidateId(2)), b));
        assert!(!filter.try_claim(Some(CandidateId(1)), a));
    }

    #[test]
    fn margin_inflates_claims() {
        let mut filter = DeclutterFilter::with_margin(2.0);
        assert!(filter.try_claim(None, r(0.0, 0.0, 10.0, 10.0)));
        assert!(!filter.try_claim(None, r(13.0, 0.0, 20.0, 10.0)));
        assert!(filter.try_claim(None, r(14.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn retain_counts() {
        let mut filter = DeclutterFilter::new();
        let mut items = vec![r(0.0, 0.0, 4.0, 4.0), r(1.0, 1.0, 2.0, 2.0), None, r(5.0, 5.0, 6.0, 6.0)];
        let totals = filter.retain(&mut items, |rect| (None, *rect));
        assert_eq!(
            totals,
            DeclutterTotals {
                accepted: 2,
                rejected: 2
            }
        );
        assert_eq!(items.len(), 2);
    }

    #[test]
    #[should_panic(expected = "declutter margin must be non-negative")]
    fn negative_margin_panics() {
        let _ = DeclutterFilter::with_margin(-1.0);
    }

    #[derive(Debug)]
    struct Label(Family, u64, f64);

    impl Ordered for Label {
        fn family(&self) -> Family {
            self.0
        }
        fn candidate(&self) -> Option<CandidateId> {
            Some(CandidateId(self.1))
        }
    }

    #[test]
    fn sort_puts_priority_then_nearest_first() {
        let mut queue = OrderedQueue::new();
        queue.push(Label(Family::Text, 1, 0.0), 10.0, None, None);
        queue.push(Label(Family::Text, 2, 5.0), 50.0, None, None);
        queue.push(Label(Family::Text, 3, 0.0), 5.0, None, None);
        queue.push(Label(Family::Text, 4, 5.0), 20.0, None, None);
        let mut batch: Vec<_> = core::iter::from_fn(|| queue.pop()).collect();
        sort_for_declutter(&mut batch, |l| l.2);
        let ids: Vec<_> = batch.iter().map(|e| e.item.1).collect();
        assert_eq!(ids, [4, 2, 3, 1]);
    }

    #[test]
    fn global_declutter_keeps_nearest_and_other_families() {
        let mut queue = OrderedQueue::new();
        queue.push(Label(Family::Text, 1, 0.0), 30.0, None, None);
        queue.push(Label(Family::Icon, 2, 0.0), 20.0, None, None);
        queue.push(Label(Family::Text, 3, 0.0), 10.0, None, None);
        queue.push(Label(Family::Text, 4, 0.0), 40.0, None, None);
        let mut filter = DeclutterFilter::new();
        // Labels 1 and 3 overlap; label 4 stands alone.
        let totals = declutter_queue(&mut queue, Family::Text, &mut filter, |e| match e.item.1 {
            1 | 3 => r(0.0, 0.0, 10.0, 10.0),
            _ => r(50.0, 50.0, 60.0, 60.0),
        });
        assert_eq!(totals.accepted, 2);
        assert_eq!(totals.rejected, 1);
        let order: Vec<_> = core::iter::from_fn(|| queue.pop()).map(|e| e.item.1).collect();
        assert_eq!(order, [4, 2, 3]);
    }

    #[test]
    fn distance_scaling_clamps() {
        let s = DistanceScaling::new(0.5, 2.0, 0.25);
        let (scale, opacity) = s.scale_and_opacity(Some(100.0), 400.0);
        assert!((scale - 0.5).abs() < 1e-12);
        assert!((opacity - 0.5).abs() < 1e-12);
        let (scale, opacity) = s.scale_and_opacity(Some(100.0), 10_000.0);
        assert_eq!((scale, opacity), (0.5, 0.25));
        let (scale, opacity) = s.scale_and_opacity(Some(900.0), 100.0);
        assert_eq!((scale, opacity), (2.0, 1.0));
        assert_eq!(s.scale_and_opacity(None, 100.0), (1.0, 1.0));
        assert_eq!(DistanceScaling::DEFAULT.scale_and_opacity(Some(9.0), 1.0), (1.0, 1.0));
    }

    #[test]
    #[should_panic(expected = "min_scale must not exceed max_scale")]
    fn inverted_scale_panics() {
        let _ = DistanceScaling::new(2.0, 1.0, 1.0);
    }

    #[test]
    fn scaling_keeps_bottom_center() {
        let rect = Rect::new(10.0, 20.0, 30.0, 30.0);
        let scaled = scaled_bounds(rect, 2.0);
        assert_eq!(scaled, Rect::new(0.0, 20.0, 40.0, 40.0));
        assert_eq!(scaled.center().x, rect.center().x);
    }
}

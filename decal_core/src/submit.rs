// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Submission: filter, deduplicate, enqueue.
//!
//! A [`Submitter`] runs each offered candidate through
//! [`evaluate`](crate::eligibility::evaluate), drops candidates already
//! queued this frame and pushes the rest onto the [`DrawContext`]'s queue.

use crate::candidate::{Candidate, LayerRef};
use crate::context::DrawContext;
use crate::dedup::{SubmissionDedup, SubmitMode};
use crate::eligibility::{Eligibility, EligibilityConfig, OffscreenPolicy, RejectReason, evaluate, evaluate_at};
use crate::geom::Vec3;
use crate::queue::Family;
use crate::trace::{DedupResetEvent, SubmissionEvent, Tracer};

/// Totals of one submission call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// Candidates looked at.
    pub offered: u32,
    /// Candidates pushed to the queue.
    pub submitted: u32,
    /// Candidates rejected by the filter chain.
    pub rejected: u32,
    /// Candidates skipped as already queued this frame.
    pub duplicates: u32,
    /// The call stopped early under [`OffscreenPolicy::EndSubmission`].
    pub ended_early: bool,
}

/// Pushes eligible candidates of one family onto the ordered queue.
#[derive(Clone, Copy, Debug)]
pub struct Submitter {
    family: Family,
    config: EligibilityConfig,
    layer: Option<LayerRef>,
}

impl Submitter {
    /// Creates a submitter for `family` using `config`.
    #[must_use]
    pub const fn new(family: Family, config: EligibilityConfig) -> Self {
        Self {
            family,
            config,
            layer: None,
        }
    }

    /// Returns a copy that tags entries with `layer`.
    #[must_use]
    pub const fn with_layer(mut self, layer: Option<LayerRef>) -> Self {
        self.layer = layer;
        self
    }

    /// The filter configuration.
    #[must_use]
    pub const fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Submits every candidate in `candidates`, in order.
    ///
    /// `make_item` turns an accepted candidate into the queued item.
    pub fn submit_many<'c, C, T, I, F>(
        &self,
        ctx: &mut DrawContext<'_, T>,
        dedup: &mut SubmissionDedup,
        candidates: I,
        mut make_item: F,
        tracer: &mut Tracer<'_>,
    ) -> SubmitReport
    where
        C: Candidate + ?Sized + 'c,
        I: IntoIterator<Item = &'c C>,
        F: FnMut(&'c C) -> T,
    {
        let mut report = SubmitReport::default();
        if ctx.view().visible_sector.is_some() {
            self.begin(ctx, dedup, tracer);
            for candidate in candidates {
                let eligibility = evaluate(candidate, ctx.view(), ctx.globe(), &self.config);
                let queued = self.offer(ctx, dedup, candidate, eligibility, &mut make_item, &mut report);
                #[cfg(feature = "trace-rich")]
                self.trace_offer(ctx.view().frame, candidate.id(), eligibility, queued, tracer);
                if self.ends_submission(eligibility) {
                    report.ended_early = true;
                    break;
                }
            }
        }
        self.finish(ctx, &report, tracer);
        report
    }

    /// Submits one candidate whose draw point is already known.
    ///
    /// Returns `true` if it was queued.
    pub fn submit_one<'c, C, T, F>(
        &self,
        ctx: &mut DrawContext<'_, T>,
        dedup: &mut SubmissionDedup,
        candidate: &'c C,
        draw_point: Vec3,
        mut make_item: F,
        tracer: &mut Tracer<'_>,
    ) -> bool
    where
        C: Candidate + ?Sized + 'c,
        F: FnMut(&'c C) -> T,
    {
        let mut report = SubmitReport::default();
        let mut queued = false;
        if ctx.view().visible_sector.is_some() {
            self.begin(ctx, dedup, tracer);
            let eligibility = evaluate_at(candidate, ctx.view(), ctx.globe(), &self.config, draw_point);
            queued = self.offer(ctx, dedup, candidate, eligibility, &mut make_item, &mut report);
            #[cfg(feature = "trace-rich")]
            self.trace_offer(ctx.view().frame, candidate.id(), eligibility, queued, tracer);
        }
        self.finish(ctx, &report, tracer);
        queued
    }

    fn begin<T>(&self, ctx: &DrawContext<'_, T>, dedup: &mut SubmissionDedup, tracer: &mut Tracer<'_>) {
        let mode = SubmitMode::from_view(ctx.view());
        if !mode.continuous {
            return;
        }
        if let Some(reset) = dedup.sync_frame(mode.frame) {
            tracer.dedup_reset(&DedupResetEvent {
                frame: reset.frame,
                draw_cleared: saturate(reset.draw_cleared),
                pick_cleared: saturate(reset.pick_cleared),
            });
        }
    }

    /// Counts `candidate` into `report` and queues it if accepted and not
    /// already queued this frame. Returns `true` if it was queued.
    fn offer<'c, C, T, F>(
        &self,
        ctx: &mut DrawContext<'_, T>,
        dedup: &mut SubmissionDedup,
        candidate: &'c C,
        eligibility: Eligibility,
        make_item: &mut F,
        report: &mut SubmitReport,
    ) -> bool
    where
        C: Candidate + ?Sized + 'c,
        F: FnMut(&'c C) -> T,
    {
        report.offered = report.offered.saturating_add(1);
        let Eligibility::Accept(placement) = eligibility else {
            report.rejected = report.rejected.saturating_add(1);
            return false;
        };

        let mode = SubmitMode::from_view(ctx.view());
        let (id, kind) = (candidate.id(), candidate.kind());
        if !dedup.should_submit(id, kind, mode) {
            report.duplicates = report.duplicates.saturating_add(1);
            return false;
        }
        ctx.queue_mut()
            .push(make_item(candidate), placement.eye_distance, placement.draw_point, self.layer);
        dedup.mark_submitted(id, kind, mode);
        report.submitted = report.submitted.saturating_add(1);
        true
    }

    fn ends_submission(&self, eligibility: Eligibility) -> bool {
        eligibility == Eligibility::Reject(RejectReason::Offscreen)
            && self.config.offscreen == OffscreenPolicy::EndSubmission
    }

    #[cfg(feature = "trace-rich")]
    fn trace_offer(
        &self,
        frame: crate::frame::FrameId,
        candidate: crate::candidate::CandidateId,
        eligibility: Eligibility,
        queued: bool,
        tracer: &mut Tracer<'_>,
    ) {
        match eligibility {
            Eligibility::Accept(placement) if queued => {
                tracer.candidate_submitted(&crate::trace::CandidateSubmitted {
                    frame,
                    candidate,
                    family: self.family,
                    eye_distance: placement.eye_distance,
                });
            }
            Eligibility::Reject(reason) => {
                tracer.candidate_rejected(&crate::trace::CandidateRejected {
                    frame,
                    candidate,
                    reason,
                });
            }
            Eligibility::Accept(_) => {}
        }
    }

    fn finish<T>(&self, ctx: &DrawContext<'_, T>, report: &SubmitReport, tracer: &mut Tracer<'_>) {
        tracer.submission(&SubmissionEvent {
            frame: ctx.view().frame,
            family: self.family,
            pass: ctx.view().pass.kind(),
            offered: report.offered,
            submitted: report.submitted,
            rejected: report.rejected,
            duplicates: report.duplicates,
            ended_early: report.ended_early,
        });
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "set sizes capped at u32::MAX for diagnostics"
)]
fn saturate(n: usize) -> u32 {
    n.min(u32::MAX as usize) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateId, CandidateKind};
    use crate::eligibility::tests::{FlatGlobe, Stub, view_at};
    use crate::queue::Ordered;
    use crate::view::GlobeMode;
    use alloc::vec::Vec;
    use kurbo::Rect;

    struct Tagged(u64);

    impl Ordered for Tagged {
        fn family(&self) -> Family {
            Family::Annotation
        }
    }

    struct Named(u64, Stub);

    impl Candidate for Named {
        fn id(&self) -> CandidateId {
            CandidateId(self.0)
        }
        fn kind(&self) -> CandidateKind {
            self.1.kind()
        }
        fn has_content(&self) -> bool {
            self.1.has_content()
        }
        fn position(&self) -> Option<crate::geom::Position> {
            self.1.position()
        }
        fn is_visible(&self) -> bool {
            self.1.is_visible()
        }
        fn is_always_on_top(&self) -> bool {
            self.1.is_always_on_top()
        }
        fn screen_bounds(&self, view: &crate::view::ViewState, globe: &dyn crate::view::Globe) -> Option<Rect> {
            self.1.screen_bounds(view, globe)
        }
    }

    fn on_screen(id: u64) -> Named {
        Named(id, Stub::screen(Rect::new(0.0, 0.0, 10.0, 10.0)))
    }

    fn off_screen(id: u64) -> Named {
        Named(id, Stub::screen(Rect::new(-50.0, -50.0, -10.0, -10.0)))
    }

    fn drain_ids(ctx: &mut DrawContext<'_, Tagged>) -> Vec<u64> {
        core::iter::from_fn(|| ctx.queue_mut().pop()).map(|e| e.item.0).collect()
    }

    #[test]
    fn accepted_candidates_are_queued_far_to_near() {
        let view = view_at(0.0);
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let near = Named(1, Stub::globe(0.0, 0.0));
        let far = Named(2, Stub::globe(0.0, 60.0));
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations()).with_layer(Some(LayerRef(3)));

        let report = submitter.submit_many(&mut ctx, &mut dedup, [&near, &far], |c| Tagged(c.0), &mut Tracer::none());
        assert_eq!(report.submitted, 2);
        assert_eq!(ctx.queue().peek().and_then(|e| e.layer), Some(LayerRef(3)));
        assert_eq!(drain_ids(&mut ctx), [2, 1]);
    }

    #[test]
    fn continuous_globe_deduplicates_screen_candidates() {
        let mut view = view_at(0.0);
        view.globe_mode = GlobeMode::ContinuousFlat;
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let a = on_screen(7);
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations());

        // Offered once per longitude wrap.
        let report = submitter.submit_many(&mut ctx, &mut dedup, [&a, &a, &a], |c| Tagged(c.0), &mut Tracer::none());
        assert_eq!(report.submitted, 1);
        assert_eq!(report.duplicates, 2);
        assert_eq!(ctx.queue().len(), 1);
    }

    #[test]
    fn offscreen_skip_continues() {
        let view = view_at(0.0);
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let (a, b, c) = (on_screen(1), off_screen(2), on_screen(3));
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations());

        let report = submitter.submit_many(&mut ctx, &mut dedup, [&a, &b, &c], |c| Tagged(c.0), &mut Tracer::none());
        assert_eq!(report.submitted, 2);
        assert_eq!(report.rejected, 1);
        assert!(!report.ended_early);
    }

    #[test]
    fn offscreen_end_submission_stops_the_call() {
        let view = view_at(0.0);
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let (a, b, c) = (on_screen(1), off_screen(2), on_screen(3));
        let config = EligibilityConfig::annotations().with_offscreen(OffscreenPolicy::EndSubmission);
        let submitter = Submitter::new(Family::Annotation, config);

        let report = submitter.submit_many(&mut ctx, &mut dedup, [&a, &b, &c], |c| Tagged(c.0), &mut Tracer::none());
        assert_eq!(report.offered, 2);
        assert_eq!(report.submitted, 1);
        assert!(report.ended_early);
        assert_eq!(drain_ids(&mut ctx), [1]);
    }

    #[test]
    fn no_visible_sector_submits_nothing() {
        let mut view = view_at(0.0);
        view.visible_sector = None;
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let a = on_screen(1);
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations());
        let report = submitter.submit_many(&mut ctx, &mut dedup, [&a], |c| Tagged(c.0), &mut Tracer::none());
        assert_eq!(report, SubmitReport::default());
        assert!(ctx.queue().is_empty());
    }

    #[test]
    fn submit_one_uses_given_point() {
        let view = view_at(0.0);
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let a = Named(1, Stub::globe(0.0, 150.0));
        let submitter = Submitter::new(Family::Text, EligibilityConfig::text());

        assert!(submitter.submit_one(&mut ctx, &mut dedup, &a, Vec3::new(0.0, 0.0, 10.0), |c| Tagged(c.0), &mut Tracer::none()));
        let entry = ctx.queue_mut().pop().unwrap();
        assert_eq!(entry.eye_distance, 40.0);
        assert_eq!(entry.draw_point, Some(Vec3::new(0.0, 0.0, 10.0)));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn dedup_reset_is_traced_once_per_frame() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Resets(Vec<u32>);
        impl TraceSink for Resets {
            fn on_dedup_reset(&mut self, e: &DedupResetEvent) {
                self.0.push(e.draw_cleared);
            }
        }

        let globe = FlatGlobe { ground: 0.0 };
        let mut dedup = SubmissionDedup::new();
        let mut sink = Resets::default();
        let a = on_screen(1);
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations());
        for frame in [1, 1, 2] {
            let mut view = view_at(0.0);
            view.frame = crate::frame::FrameId(frame);
            view.globe_mode = GlobeMode::ContinuousFlat;
            let mut ctx = DrawContext::new(&view, &globe);
            let mut tracer = Tracer::new(&mut sink);
            submitter.submit_many(&mut ctx, &mut dedup, [&a], |c| Tagged(c.0), &mut tracer);
        }
        assert_eq!(sink.0, [0, 1]);
    }

    #[test]
    fn submit_one_reports_duplicates_as_not_queued() {
        let mut view = view_at(0.0);
        view.globe_mode = GlobeMode::ContinuousFlat;
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let a = on_screen(4);
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations());
        let at = Vec3::new(5.0, 5.0, 0.0);

        assert!(submitter.submit_one(&mut ctx, &mut dedup, &a, at, |c| Tagged(c.0), &mut Tracer::none()));
        assert!(!submitter.submit_one(&mut ctx, &mut dedup, &a, at, |c| Tagged(c.0), &mut Tracer::none()));
        assert_eq!(ctx.queue().len(), 1);
    }

    #[cfg(feature = "trace-rich")]
    #[test]
    fn per_candidate_events_skip_duplicates() {
        use crate::eligibility::RejectReason;
        use crate::trace::{CandidateRejected, CandidateSubmitted, TraceSink};

        #[derive(Default)]
        struct Outcomes(Vec<(u64, Option<RejectReason>)>);
        impl TraceSink for Outcomes {
            fn on_candidate_submitted(&mut self, e: &CandidateSubmitted) {
                self.0.push((e.candidate.0, None));
            }
            fn on_candidate_rejected(&mut self, e: &CandidateRejected) {
                self.0.push((e.candidate.0, Some(e.reason)));
            }
        }

        let mut view = view_at(0.0);
        view.globe_mode = GlobeMode::ContinuousFlat;
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut dedup = SubmissionDedup::new();
        let (a, b) = (on_screen(1), off_screen(2));
        let submitter = Submitter::new(Family::Annotation, EligibilityConfig::annotations());
        let mut sink = Outcomes::default();
        let mut tracer = Tracer::new(&mut sink);
        submitter.submit_many(&mut ctx, &mut dedup, [&a, &a, &b], |c| Tagged(c.0), &mut tracer);
        drop(tracer);

        assert_eq!(sink.0, [(1, None), (2, Some(RejectReason::Offscreen))]);
    }
}

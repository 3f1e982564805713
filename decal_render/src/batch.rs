// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch rendering of the ordered queue.
//!
//! [`draw_ordered`] drains a [`DrawContext`]'s queue. For each popped entry it
//! finds the [`BatchDrawer`] of the entry's family and calls
//! [`render_batch`], which also takes every following entry of the same
//! family and draws them all inside one graphics-state scope:
//!
//! ```text
//!   queue: [T T T A A T]
//!           └─┬─┘ └┬┘ │
//!   scopes:  text  ann text
//! ```
//!
//! A failure while drawing one entry is reported through the tracer and the
//! batch carries on with the next entry. The scope is always closed, and in a
//! pick pass the batch's pick list is always resolved and dropped.

use alloc::vec;
use alloc::vec::Vec;

use decal_core::candidate::{CandidateId, LayerRef};
use decal_core::context::{DrawContext, PickedObject};
use decal_core::error::RenderError;
use decal_core::queue::{Family, Ordered, OrderedEntry};
use decal_core::trace::{BatchEvent, FailureStage, MessageCode, PickEvent, RenderFailureEvent, Tracer};
use decal_core::view::{Globe, ViewState};
use kurbo::Rect;

use crate::pick::PickSupport;
use crate::surface::{BlendMode, ScopeState, Surface};

/// What a drawer sees while its batch is open.
pub struct BatchCx<'a, 't> {
    /// The view of the current pass.
    pub view: &'a ViewState,
    /// The globe of the current pass.
    pub globe: &'a dyn Globe,
    /// Graphics surface, inside the batch's scope.
    pub surface: &'a mut dyn Surface,
    /// Pick list of this batch; `Some` only in a pick pass.
    pub pick: Option<PickSupport>,
    family: Family,
    layer: Option<LayerRef>,
    tracer: &'a mut Tracer<'t>,
    failures: u32,
}

impl core::fmt::Debug for BatchCx<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BatchCx")
            .field("family", &self.family)
            .field("layer", &self.layer)
            .field("pick", &self.pick)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl<'a, 't> BatchCx<'a, 't> {
    /// Opens a context for `family`. [`render_batch`] does this for you;
    /// layouts and tests can use it to draw outside the queue.
    #[must_use]
    pub fn new(
        view: &'a ViewState,
        globe: &'a dyn Globe,
        surface: &'a mut dyn Surface,
        family: Family,
        tracer: &'a mut Tracer<'t>,
    ) -> Self {
        Self {
            view,
            globe,
            surface,
            pick: view.is_picking().then(PickSupport::new),
            family,
            layer: None,
            tracer,
            failures: 0,
        }
    }

    /// Family of the batch.
    #[inline]
    #[must_use]
    pub fn family(&self) -> Family {
        self.family
    }

    /// Returns `true` in a pick pass.
    #[inline]
    #[must_use]
    pub fn is_picking(&self) -> bool {
        self.pick.is_some()
    }

    /// Layer of the entry being drawn.
    #[inline]
    #[must_use]
    pub fn current_layer(&self) -> Option<LayerRef> {
        self.layer
    }

    /// Number of failures reported so far in this batch.
    #[inline]
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Registers `bounds` for `candidate` in the pick list, if picking.
    pub fn register_pick(&mut self, candidate: CandidateId, bounds: Rect) {
        if let Some(pick) = &mut self.pick {
            pick.add(candidate, self.layer, bounds);
        }
    }

    /// Reports a trapped failure.
    pub fn report_failure(&mut self, stage: FailureStage, candidate: Option<CandidateId>, error: &RenderError) {
        self.failures = self.failures.saturating_add(1);
        self.tracer.render_failure(&RenderFailureEvent {
            frame: self.view.frame,
            code: MessageCode {
                family: self.family,
                stage,
            },
            candidate,
            error,
        });
    }

    /// The tracer, for drawers that emit their own events.
    #[inline]
    pub fn tracer(&mut self) -> &mut Tracer<'t> {
        self.tracer
    }
}

/// Draws one family of queued items.
pub trait BatchDrawer<T> {
    /// Family this drawer handles.
    fn family(&self) -> Family;

    /// Whether this drawer draws `entry`.
    ///
    /// Several drawers may share a family. Each entry goes to the first
    /// drawer of its family that accepts it, and a batch ends at the first
    /// entry its drawer does not accept.
    fn accepts(&self, entry: &OrderedEntry<T>) -> bool {
        _ = entry;
        true
    }

    /// Whether `next` may join the batch started by `first`.
    ///
    /// Only consulted for entries this drawer accepts.
    fn continues_batch(&self, first: &OrderedEntry<T>, next: &OrderedEntry<T>, view: &ViewState) -> bool {
        _ = (first, next, view);
        true
    }

    /// Graphics state for the batch.
    fn scope(&self, view: &ViewState) -> ScopeState {
        ScopeState {
            family: self.family(),
            viewport: view.viewport,
            blend: if view.is_picking() {
                BlendMode::Replace
            } else {
                BlendMode::SourceOver
            },
            depth_write: false,
        }
    }

    /// Called once the scope is open, before any entry is drawn.
    fn begin(&mut self, cx: &mut BatchCx<'_, '_>) {
        _ = cx;
    }

    /// Reorders or filters the batch before drawing. Entries removed here
    /// are not drawn this frame.
    fn arrange(&mut self, cx: &mut BatchCx<'_, '_>, batch: &mut Vec<OrderedEntry<T>>) {
        _ = (cx, batch);
    }

    /// Draws one entry.
    fn draw(&mut self, cx: &mut BatchCx<'_, '_>, entry: &OrderedEntry<T>) -> Result<(), RenderError>;

    /// Called after the last entry, before the scope closes.
    fn end(&mut self, cx: &mut BatchCx<'_, '_>) {
        _ = cx;
    }
}

/// Totals of one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Entries taken from the queue.
    pub entries: u32,
    /// Failures reported while the batch was open.
    pub failures: u32,
    /// Candidate resolved by the pick list, in a pick pass.
    pub picked: Option<CandidateId>,
}

/// Draws `first` and every following entry the drawer accepts, in one scope.
pub fn render_batch<T: Ordered>(
    ctx: &mut DrawContext<'_, T>,
    first: OrderedEntry<T>,
    drawer: &mut dyn BatchDrawer<T>,
    surface: &mut dyn Surface,
    tracer: &mut Tracer<'_>,
) -> BatchReport {
    let view = ctx.view();
    let globe = ctx.globe();
    let family = drawer.family();

    let mut batch = vec![first];
    while let Some(next) = ctx.queue().peek() {
        if next.family() != family || !drawer.accepts(next) || !drawer.continues_batch(&batch[0], next, view) {
            break;
        }
        if let Some(entry) = ctx.queue_mut().pop() {
            batch.push(entry);
        }
    }
    let entries = u32::try_from(batch.len()).unwrap_or(u32::MAX);

    let stage = if view.is_picking() {
        FailureStage::Pick
    } else {
        FailureStage::Render
    };
    let scope = drawer.scope(view);
    let mut cx = BatchCx::new(view, globe, surface, family, tracer);
    cx.surface.push_scope(&scope);
    drawer.begin(&mut cx);
    drawer.arrange(&mut cx, &mut batch);
    for entry in &batch {
        let prev = ctx.swap_layer(entry.layer);
        cx.layer = entry.layer;
        if let Err(err) = drawer.draw(&mut cx, entry) {
            cx.report_failure(stage, entry.item.candidate(), &err);
        }
        ctx.swap_layer(prev);
    }
    drawer.end(&mut cx);
    cx.surface.pop_scope();

    let failures = cx.failures;
    let pick = cx.pick.take();
    drop(cx);

    let mut picked = None;
    if let (Some(pick), Some(request)) = (pick, view.pass.pick()) {
        let hit = pick.resolve(request.point);
        tracer.pick(&PickEvent {
            frame: view.frame,
            family,
            considered: u32::try_from(pick.len()).unwrap_or(u32::MAX),
            picked: hit.map(|h| h.candidate),
            layer: hit.and_then(|h| h.layer),
        });
        if let Some(hit) = hit {
            ctx.add_picked(PickedObject {
                candidate: hit.candidate,
                layer: hit.layer,
                family,
            });
            picked = Some(hit.candidate);
        }
    }

    tracer.batch(&BatchEvent {
        frame: view.frame,
        family,
        pass: view.pass.kind(),
        entries,
        failures,
    });
    BatchReport {
        entries,
        failures,
        picked,
    }
}

/// Totals of one [`draw_ordered`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Batches drawn.
    pub batches: u32,
    /// Entries consumed by batches.
    pub entries: u32,
    /// Failures reported inside batches.
    pub failures: u32,
    /// Entries dropped for lack of a drawer.
    pub unhandled: u32,
}

/// Drains the queue, routing each run of same-family entries to its drawer.
pub fn draw_ordered<T: Ordered>(
    ctx: &mut DrawContext<'_, T>,
    drawers: &mut [&mut dyn BatchDrawer<T>],
    surface: &mut dyn Surface,
    tracer: &mut Tracer<'_>,
) -> PassReport {
    let mut report = PassReport::default();
    while let Some(first) = ctx.queue_mut().pop() {
        let family = first.family();
        match drawers.iter_mut().find(|d| d.family() == family && d.accepts(&first)) {
            Some(drawer) => {
                let batch = render_batch(ctx, first, &mut **drawer, surface, tracer);
                report.batches = report.batches.saturating_add(1);
                report.entries = report.entries.saturating_add(batch.entries);
                report.failures = report.failures.saturating_add(batch.failures);
            }
            None => {
                report.unhandled = report.unhandled.saturating_add(1);
                tracer.render_failure(&RenderFailureEvent {
                    frame: ctx.view().frame,
                    code: MessageCode {
                        family,
                        stage: FailureStage::Dispatch,
                    },
                    candidate: first.item.candidate(),
                    error: &RenderError::UnhandledFamily(family),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, DrawPlan};
    use crate::testing::FlatGlobe;
    use decal_core::frame::FrameId;
    use decal_core::geom::Vec3;
    use decal_core::trace::TraceSink;
    use decal_core::view::{Pass, PickRequest};
    use kurbo::Point;

    #[derive(Clone, Copy, Debug)]
    struct Job(Family, u64);

    impl Ordered for Job {
        fn family(&self) -> Family {
            self.0
        }
        fn candidate(&self) -> Option<CandidateId> {
            Some(CandidateId(self.1))
        }
    }

    struct Counting {
        family: Family,
        attempts: Vec<u64>,
        fail_on: Option<u64>,
        begins: u32,
        ends: u32,
        same_layer_only: bool,
    }

    impl Counting {
        fn new(family: Family) -> Self {
            Self {
                family,
                attempts: Vec::new(),
                fail_on: None,
                begins: 0,
                ends: 0,
                same_layer_only: false,
            }
        }
    }

    impl BatchDrawer<Job> for Counting {
        fn family(&self) -> Family {
            self.family
        }
        fn continues_batch(&self, first: &OrderedEntry<Job>, next: &OrderedEntry<Job>, _view: &ViewState) -> bool {
            !self.same_layer_only || first.layer == next.layer
        }
        fn begin(&mut self, _cx: &mut BatchCx<'_, '_>) {
            self.begins += 1;
        }
        fn draw(&mut self, cx: &mut BatchCx<'_, '_>, entry: &OrderedEntry<Job>) -> Result<(), RenderError> {
            let id = entry.item.1;
            self.attempts.push(id);
            let x = id as f64 * 10.0;
            cx.register_pick(CandidateId(id), Rect::new(x, 0.0, x + 10.0, 10.0));
            if self.fail_on == Some(id) {
                return Err(RenderError::Candidate("boom".into()));
            }
            Ok(())
        }
        fn end(&mut self, _cx: &mut BatchCx<'_, '_>) {
            self.ends += 1;
        }
    }

    #[derive(Default)]
    struct Log {
        failures: Vec<(MessageCode, Option<CandidateId>)>,
        batches: Vec<(Family, u32)>,
    }

    impl TraceSink for Log {
        fn on_render_failure(&mut self, e: &RenderFailureEvent<'_>) {
            self.failures.push((e.code, e.candidate));
        }
        fn on_batch(&mut self, e: &BatchEvent) {
            self.batches.push((e.family, e.entries));
        }
    }

    fn view() -> ViewState {
        ViewState::new(FrameId(3), Vec3::ZERO, 0.0, Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn failing_entry_does_not_abort_batch() {
        let view = view();
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        for id in 1..=5 {
            ctx.queue_mut().push(Job(Family::Text, id), 100.0 - id as f64, None, None);
        }
        let mut drawer = Counting::new(Family::Text);
        drawer.fail_on = Some(3);
        let mut plan = DrawPlan::new();
        let mut log = Log::default();
        let mut tracer = Tracer::new(&mut log);

        let report = draw_ordered(&mut ctx, &mut [&mut drawer], &mut plan, &mut tracer);
        drop(tracer);

        assert_eq!(drawer.attempts, [1, 2, 3, 4, 5]);
        assert_eq!(report.batches, 1);
        assert_eq!(report.entries, 5);
        assert_eq!(report.failures, 1);
        assert_eq!((drawer.begins, drawer.ends), (1, 1));
        assert_eq!(plan.open_scopes(), 0);
        assert_eq!(log.failures.len(), 1);
        assert_eq!(log.failures[0].1, Some(CandidateId(3)));
        assert_eq!(
            log.failures[0].0,
            MessageCode {
                family: Family::Text,
                stage: FailureStage::Render
            }
        );
    }

    #[test]
    fn family_change_closes_scope() {
        let view = view();
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let order = [Family::Text, Family::Text, Family::Annotation, Family::Annotation, Family::Text];
        for (i, family) in order.into_iter().enumerate() {
            ctx.queue_mut().push(Job(family, i as u64), 10.0 - i as f64, None, None);
        }
        let mut text = Counting::new(Family::Text);
        let mut ann = Counting::new(Family::Annotation);
        let mut plan = DrawPlan::new();
        let mut log = Log::default();
        let mut tracer = Tracer::new(&mut log);

        let report = draw_ordered(&mut ctx, &mut [&mut text, &mut ann], &mut plan, &mut tracer);
        drop(tracer);

        assert_eq!(report.batches, 3);
        assert_eq!(log.batches, [(Family::Text, 2), (Family::Annotation, 2), (Family::Text, 1)]);
        let pushes = plan
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::PushScope(_)))
            .count();
        assert_eq!(pushes, 3);
    }

    #[test]
    fn unhandled_family_is_dropped_and_logged() {
        let view = view();
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        ctx.queue_mut().push(Job(Family::Other(9), 1), 2.0, None, None);
        ctx.queue_mut().push(Job(Family::Text, 2), 1.0, None, None);
        let mut text = Counting::new(Family::Text);
        let mut plan = DrawPlan::new();
        let mut log = Log::default();
        let mut tracer = Tracer::new(&mut log);

        let report = draw_ordered(&mut ctx, &mut [&mut text], &mut plan, &mut tracer);
        drop(tracer);

        assert_eq!(report.unhandled, 1);
        assert_eq!(text.attempts, [2]);
        assert_eq!(log.failures[0].0.stage, FailureStage::Dispatch);
    }

    #[test]
    fn layer_is_swapped_per_entry_and_restored() {
        struct LayerRecorder(Vec<Option<LayerRef>>);
        impl BatchDrawer<Job> for LayerRecorder {
            fn family(&self) -> Family {
                Family::Icon
            }
            fn draw(&mut self, cx: &mut BatchCx<'_, '_>, _entry: &OrderedEntry<Job>) -> Result<(), RenderError> {
                self.0.push(cx.current_layer());
                Ok(())
            }
        }

        let view = view();
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        ctx.queue_mut().push(Job(Family::Icon, 1), 2.0, None, Some(LayerRef(1)));
        ctx.queue_mut().push(Job(Family::Icon, 2), 1.0, None, Some(LayerRef(2)));
        let mut recorder = LayerRecorder(Vec::new());
        let mut plan = DrawPlan::new();
        draw_ordered(&mut ctx, &mut [&mut recorder], &mut plan, &mut Tracer::none());

        assert_eq!(recorder.0, [Some(LayerRef(1)), Some(LayerRef(2))]);
        assert_eq!(ctx.current_layer(), None);
    }

    #[test]
    fn pick_batch_resolves_topmost_and_respects_layers() {
        let mut view = view();
        view.pass = Pass::Pick(PickRequest::at(Point::new(25.0, 5.0), 1.0));
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        ctx.queue_mut().push(Job(Family::Icon, 1), 3.0, None, Some(LayerRef(1)));
        ctx.queue_mut().push(Job(Family::Icon, 2), 2.0, None, Some(LayerRef(1)));
        ctx.queue_mut().push(Job(Family::Icon, 3), 1.0, None, Some(LayerRef(2)));
        let mut icons = Counting::new(Family::Icon);
        icons.same_layer_only = true;
        let mut plan = DrawPlan::new();

        let report = draw_ordered(&mut ctx, &mut [&mut icons], &mut plan, &mut Tracer::none());
        assert_eq!(report.batches, 2);
        assert_eq!(
            ctx.picked(),
            &[PickedObject {
                candidate: CandidateId(2),
                layer: Some(LayerRef(1)),
                family: Family::Icon,
            }]
        );
    }
}

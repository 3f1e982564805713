// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Annotations: framed callouts anchored to the screen or the globe.
//!
//! [`AnnotationRenderer`] submits [`Annotation`]s with the annotation
//! filter preset and draws them in batches. Screen-anchored annotations are
//! deduplicated per frame on continuous flat globes, where the same layer
//! may be offered more than once per frame.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use decal_core::candidate::{AltitudeRange, Candidate, CandidateId, CandidateKind, LayerRef};
use decal_core::context::DrawContext;
use decal_core::dedup::SubmissionDedup;
use decal_core::eligibility::{DrawPointMode, EligibilityConfig, draw_point};
use decal_core::error::{RenderError, SizeError};
use decal_core::geom::{Position, Vec3};
use decal_core::queue::{Family, Ordered, OrderedEntry};
use decal_core::submit::{SubmitReport, Submitter};
use decal_core::trace::Tracer;
use decal_core::view::{Globe, ViewState};
use kurbo::{Point, Rect, Size};

use crate::batch::{BatchCx, BatchDrawer};
use crate::drawable::{Drawable, RendererId};
use crate::layout::{FlowLayout, LayoutItem, anchored};
use crate::surface::{Color, FontId, TextRun};

/// A drawable annotation.
///
/// Annotations are candidates, so the eligibility filter can place them, and
/// layout items, so they can be nested inside each other.
pub trait Annotation: Candidate + LayoutItem {
    /// Draws the annotation at its own anchor.
    ///
    /// `draw_point` is the model-space point the entry was queued with;
    /// globe-anchored annotations project it to find their anchor.
    fn render(&self, cx: &mut BatchCx<'_, '_>, draw_point: Option<Vec3>) -> Result<(), RenderError>;
}

/// Where an annotation hangs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// A fixed point in viewport coordinates.
    Screen(Point),
    /// A geographic position.
    Globe(Position),
}

/// Visual attributes of a [`BasicAnnotation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotationStyle {
    /// Minimum frame size.
    pub size: Size,
    /// Padding between the frame and its content.
    pub insets: f64,
    /// Frame fill.
    pub background: Color,
    /// Text color.
    pub text_color: Color,
    /// Text font.
    pub font: FontId,
    /// Overall opacity.
    pub opacity: f64,
}

impl AnnotationStyle {
    /// A 160×60 white frame with black text.
    pub const DEFAULT: Self = Self {
        size: Size::new(160.0, 60.0),
        insets: 5.0,
        background: Color::WHITE,
        text_color: Color::BLACK,
        font: FontId(0),
        opacity: 1.0,
    };
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A framed text callout with optional child annotations.
///
/// The frame is at least `style.size` and grows to fit the children's flow
/// layout plus insets. The text baseline sits on the bottom inset.
pub struct BasicAnnotation {
    id: CandidateId,
    anchor: Anchor,
    text: String,
    style: AnnotationStyle,
    visible: bool,
    always_on_top: bool,
    altitudes: AltitudeRange,
    layout: FlowLayout,
    children: Vec<Rc<dyn Annotation>>,
}

impl core::fmt::Debug for BasicAnnotation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BasicAnnotation")
            .field("id", &self.id)
            .field("anchor", &self.anchor)
            .field("text", &self.text)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl BasicAnnotation {
    /// Creates a visible annotation with the default style.
    #[must_use]
    pub fn new(id: CandidateId, anchor: Anchor, text: impl Into<String>) -> Self {
        Self {
            id,
            anchor,
            text: text.into(),
            style: AnnotationStyle::DEFAULT,
            visible: true,
            always_on_top: false,
            altitudes: AltitudeRange::ALL,
            layout: FlowLayout::default(),
            children: Vec::new(),
        }
    }

    /// Sets the style.
    #[must_use]
    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    /// Restricts the eye altitudes the annotation is drawn at.
    #[must_use]
    pub fn with_altitudes(mut self, altitudes: AltitudeRange) -> Self {
        self.altitudes = altitudes;
        self
    }

    /// Sorts the annotation in front of everything else.
    #[must_use]
    pub fn with_always_on_top(mut self, always_on_top: bool) -> Self {
        self.always_on_top = always_on_top;
        self
    }

    /// Sets the layout used for children.
    #[must_use]
    pub fn with_layout(mut self, layout: FlowLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Appends a child annotation.
    #[must_use]
    pub fn with_child(mut self, child: Rc<dyn Annotation>) -> Self {
        self.children.push(child);
        self
    }

    /// Shows or hides the annotation.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// The anchor.
    #[must_use]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// The text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The style.
    #[must_use]
    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    fn child_refs(&self) -> Vec<&dyn Annotation> {
        self.children.iter().map(|c| &**c).collect()
    }

    fn screen_anchor(&self, view: &ViewState, globe: &dyn Globe) -> Option<Point> {
        match self.anchor {
            Anchor::Screen(p) => Some(p),
            Anchor::Globe(position) => {
                let point = draw_point(position, view, globe, DrawPointMode::SurfaceThenGlobe)?;
                view.project(point).map(|(p, _)| p)
            }
        }
    }
}

impl Candidate for BasicAnnotation {
    fn id(&self) -> CandidateId {
        self.id
    }

    fn kind(&self) -> CandidateKind {
        match self.anchor {
            Anchor::Screen(_) => CandidateKind::Screen,
            Anchor::Globe(_) => CandidateKind::Globe,
        }
    }

    fn has_content(&self) -> bool {
        !self.text.is_empty() || !self.children.is_empty()
    }

    fn position(&self) -> Option<Position> {
        match self.anchor {
            Anchor::Globe(p) => Some(p),
            Anchor::Screen(_) => None,
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn is_always_on_top(&self) -> bool {
        self.always_on_top
    }

    fn active_altitudes(&self) -> AltitudeRange {
        self.altitudes
    }

    fn screen_bounds(&self, view: &ViewState, globe: &dyn Globe) -> Option<Rect> {
        let anchor = self.screen_anchor(view, globe)?;
        let size = self.preferred_size(view).ok()?;
        Some(anchored(anchor, size))
    }
}

impl LayoutItem for BasicAnnotation {
    fn layout_id(&self) -> Option<CandidateId> {
        Some(self.id)
    }

    fn preferred_size(&self, view: &ViewState) -> Result<Size, SizeError> {
        if !self.has_content() {
            return Err(SizeError::Empty);
        }
        let pad = self.style.insets * 2.0;
        let inner = self.layout.preferred_size(view, &self.child_refs());
        Ok(Size::new(
            self.style.size.width.max(inner.width + pad),
            self.style.size.height.max(inner.height + pad),
        ))
    }

    fn draw_in(
        &self,
        cx: &mut BatchCx<'_, '_>,
        bounds: Rect,
        opacity: f64,
        pick_position: Option<Point>,
    ) -> Result<(), RenderError> {
        let opacity = opacity * self.style.opacity;
        if cx.is_picking() {
            cx.register_pick(self.id, bounds);
        } else {
            cx.surface.fill_rect(bounds, self.style.background.with_opacity(opacity))?;
            if !self.text.is_empty() {
                cx.surface.draw_text(&TextRun {
                    text: &self.text,
                    font: self.style.font,
                    origin: Point::new(bounds.x0 + self.style.insets, bounds.y0 + self.style.insets),
                    scale: 1.0,
                    color: self.style.text_color.with_opacity(opacity),
                })?;
            }
        }
        if !self.children.is_empty() {
            let inner = bounds.inset(-self.style.insets);
            self.layout.draw(cx, &self.child_refs(), inner, opacity, pick_position);
        }
        Ok(())
    }
}

impl Annotation for BasicAnnotation {
    fn render(&self, cx: &mut BatchCx<'_, '_>, draw_point: Option<Vec3>) -> Result<(), RenderError> {
        let anchor = match self.anchor {
            Anchor::Screen(p) => p,
            Anchor::Globe(_) => {
                let point = draw_point.ok_or(RenderError::Unprojectable)?;
                cx.view.project(point).ok_or(RenderError::Unprojectable)?.0
            }
        };
        let size = self.preferred_size(cx.view)?;
        let pick_position = cx.view.pass.pick().map(|r| r.point);
        self.draw_in(cx, anchored(anchor, size), 1.0, pick_position)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Submits and draws annotations.
#[derive(Debug)]
pub struct AnnotationRenderer {
    id: RendererId,
    config: EligibilityConfig,
    dedup: SubmissionDedup,
}

impl Default for AnnotationRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationRenderer {
    /// Creates a renderer with the annotation filter preset.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EligibilityConfig::annotations())
    }

    /// Creates a renderer with a custom filter configuration.
    #[must_use]
    pub fn with_config(config: EligibilityConfig) -> Self {
        Self {
            id: RendererId::next(),
            config,
            dedup: SubmissionDedup::new(),
        }
    }

    /// Identity stamped on every queued annotation.
    #[must_use]
    pub fn id(&self) -> RendererId {
        self.id
    }

    /// The filter configuration.
    #[must_use]
    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    fn submitter(&self, layer: Option<LayerRef>) -> Submitter {
        Submitter::new(Family::Annotation, self.config).with_layer(layer)
    }

    /// Offers `annotations` for the current pass, tagged with `layer`.
    pub fn submit(
        &mut self,
        ctx: &mut DrawContext<'_, Drawable>,
        annotations: &[Rc<dyn Annotation>],
        layer: Option<LayerRef>,
        tracer: &mut Tracer<'_>,
    ) -> SubmitReport {
        let id = self.id;
        self.submitter(layer).submit_many(
            ctx,
            &mut self.dedup,
            annotations,
            |a| Drawable::Annotation(Rc::clone(a), id),
            tracer,
        )
    }

    /// Offers one annotation whose draw point is already known.
    pub fn submit_at(
        &mut self,
        ctx: &mut DrawContext<'_, Drawable>,
        annotation: &Rc<dyn Annotation>,
        draw_point: Vec3,
        layer: Option<LayerRef>,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let id = self.id;
        self.submitter(layer).submit_one(
            ctx,
            &mut self.dedup,
            annotation,
            draw_point,
            |a| Drawable::Annotation(Rc::clone(a), id),
            tracer,
        )
    }
}

impl BatchDrawer<Drawable> for AnnotationRenderer {
    fn family(&self) -> Family {
        Family::Annotation
    }

    fn accepts(&self, entry: &OrderedEntry<Drawable>) -> bool {
        entry.item.renderer() == self.id
    }

    fn draw(&mut self, cx: &mut BatchCx<'_, '_>, entry: &OrderedEntry<Drawable>) -> Result<(), RenderError> {
        match &entry.item {
            Drawable::Annotation(annotation, _) => annotation.render(cx, entry.draw_point),
            other => Err(RenderError::UnhandledFamily(other.family())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use crate::batch::draw_ordered;
    use crate::surface::{DrawCommand, DrawPlan};
    use crate::testing::{FlatGlobe, rect_near, view};
    use decal_core::context::PickedObject;
    use decal_core::geom::Frustum;
    use decal_core::view::{GlobeMode, Pass, PickRequest};

    fn small(id: u64) -> Rc<dyn Annotation> {
        Rc::new(
            BasicAnnotation::new(CandidateId(id), Anchor::Screen(Point::ZERO), "child").with_style(AnnotationStyle {
                size: Size::new(10.0, 10.0),
                insets: 0.0,
                ..AnnotationStyle::DEFAULT
            }),
        )
    }

    fn parent() -> BasicAnnotation {
        BasicAnnotation::new(CandidateId(1), Anchor::Screen(Point::new(100.0, 100.0)), "parent").with_style(
            AnnotationStyle {
                size: Size::new(60.0, 40.0),
                ..AnnotationStyle::DEFAULT
            },
        )
    }

    #[test]
    fn frame_grows_to_fit_children() {
        let view = view(1_000.0);
        let a = parent()
            .with_layout(FlowLayout::horizontal(5.0))
            .with_child(small(2))
            .with_child(small(3))
            .with_child(small(4));
        assert_eq!(a.preferred_size(&view).unwrap(), Size::new(60.0, 40.0));
        let b = parent()
            .with_style(AnnotationStyle {
                size: Size::ZERO,
                ..AnnotationStyle::DEFAULT
            })
            .with_layout(FlowLayout::horizontal(5.0))
            .with_child(small(2))
            .with_child(small(3));
        assert_eq!(b.preferred_size(&view).unwrap(), Size::new(35.0, 20.0));
        let empty = BasicAnnotation::new(CandidateId(9), Anchor::Screen(Point::ZERO), "");
        assert_eq!(empty.preferred_size(&view), Err(SizeError::Empty));
    }

    #[test]
    fn screen_annotation_draws_frame_and_text() {
        let view = view(1_000.0);
        let globe = FlatGlobe { ground: 0.0 };
        let mut ctx = DrawContext::new(&view, &globe);
        let mut renderer = AnnotationRenderer::new();
        let items: Vec<Rc<dyn Annotation>> = vec![Rc::new(parent())];
        let report = renderer.submit(&mut ctx, &items, None, &mut Tracer::none());
        assert_eq!(report.submitted, 1);

        let mut plan = DrawPlan::new();
        draw_ordered(&mut ctx, &mut [&mut renderer], &mut plan, &mut Tracer::none());
        assert!(plan.commands.contains(&DrawCommand::FillRect {
            rect: Rect::new(70.0, 100.0, 130.0, 140.0),
            color: Color::WHITE,
        }));
        assert_eq!(plan.texts().collect::<Vec<_>>(), ["parent"]);
        assert_eq!(plan.open_scopes(), 0);
    }

    #[test]
    fn globe_annotation_hangs_above_projected_point() {
        let view = view(1_000.0);
        let globe = FlatGlobe { ground: 0.0 };
        let a = BasicAnnotation::new(
            CandidateId(5),
            Anchor::Globe(Position::from_degrees(200.0, 300.0, 0.0)),
            "peak",
        );
        let bounds = a.screen_bounds(&view, &globe).unwrap();
        assert!(rect_near(bounds, Rect::new(220.0, 200.0, 380.0, 260.0)), "got {bounds:?}");
    }

    #[test]
    fn child_is_picked_over_parent() {
        let mut view = view(1_000.0);
        let globe = FlatGlobe { ground: 0.0 };
        let nested: Rc<dyn Annotation> = Rc::new(parent().with_child(small(2)));
        let items = vec![nested];

        for (point, expected) in [(Point::new(80.0, 110.0), 2), (Point::new(120.0, 130.0), 1)] {
            view.pass = Pass::Pick(PickRequest::at(point, 1.0));
            let mut ctx = DrawContext::new(&view, &globe);
            let mut renderer = AnnotationRenderer::new();
            renderer.submit(&mut ctx, &items, Some(LayerRef(7)), &mut Tracer::none());
            let mut plan = DrawPlan::new();
            draw_ordered(&mut ctx, &mut [&mut renderer], &mut plan, &mut Tracer::none());
            assert_eq!(
                ctx.finish(),
                [PickedObject {
                    candidate: CandidateId(expected),
                    layer: Some(LayerRef(7)),
                    family: Family::Annotation,
                }]
            );
            assert!(plan.texts().next().is_none());
        }
    }

    #[test]
    fn continuous_globe_queues_screen_annotation_once_per_frame() {
        let mut view = view(1_000.0);
        view.globe_mode = GlobeMode::ContinuousFlat;
        let globe = FlatGlobe { ground: 0.0 };
        let items: Vec<Rc<dyn Annotation>> = vec![Rc::new(parent())];
        let mut renderer = AnnotationRenderer::new();
        let mut ctx = DrawContext::new(&view, &globe);
        renderer.submit(&mut ctx, &items, None, &mut Tracer::none());
        let again = renderer.submit(&mut ctx, &items, None, &mut Tracer::none());
        assert_eq!(again.duplicates, 1);
        assert_eq!(ctx.queue().len(), 1);
        drop(ctx);

        view.frame = view.frame.next();
        let mut ctx = DrawContext::new(&view, &globe);
        let next = renderer.submit(&mut ctx, &items, None, &mut Tracer::none());
        assert_eq!(next.submitted, 1);
    }

    #[test]
    fn globe_annotation_outside_frustum_is_skipped() {
        let mut view = view(1_000.0);
        view.frustum = Frustum::from_box(Vec3::new(0.0, 0.0, -10.0), Vec3::new(100.0, 100.0, 10.0));
        let globe = FlatGlobe { ground: 0.0 };
        let inside: Rc<dyn Annotation> = Rc::new(BasicAnnotation::new(
            CandidateId(1),
            Anchor::Globe(Position::from_degrees(50.0, 50.0, 0.0)),
            "in",
        ));
        let outside: Rc<dyn Annotation> = Rc::new(BasicAnnotation::new(
            CandidateId(2),
            Anchor::Globe(Position::from_degrees(50.0, 500.0, 0.0)),
            "out",
        ));
        let mut ctx = DrawContext::new(&view, &globe);
        let report = AnnotationRenderer::new().submit(&mut ctx, &[inside, outside], None, &mut Tracer::none());
        assert_eq!((report.submitted, report.rejected), (1, 1));
    }
}

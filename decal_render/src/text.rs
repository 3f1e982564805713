// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geographic text labels.
//!
//! [`TextRenderer`] submits [`GeographicText`]s with the text filter preset.
//! When a batch of labels opens it sorts them by priority then distance,
//! drops every label whose rectangle would overlap one already kept, and
//! draws the survivors with the terrain-aware depth policy of
//! [`text_depth`].
//!
//! Measuring text is the host's job ([`TextMeasurer`]). Extents are cached
//! per label and measured again only when the label's text or font changes.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use decal_core::candidate::{AltitudeRange, Candidate, CandidateId, CandidateKind, LayerRef};
use decal_core::context::DrawContext;
use decal_core::dedup::SubmissionDedup;
use decal_core::eligibility::EligibilityConfig;
use decal_core::error::{RenderError, SizeError};
use decal_core::frame::FrameId;
use decal_core::geom::{Position, Vec3};
use decal_core::queue::{Family, Ordered, OrderedEntry};
use decal_core::submit::{SubmitReport, Submitter};
use decal_core::trace::{DeclutterEvent, FailureStage, Tracer};
use decal_core::view::{Globe, ViewState};
use kurbo::{Point, Rect, Size};

use crate::batch::{BatchCx, BatchDrawer};
use crate::declutter::{DeclutterFilter, DistanceScaling, scaled_bounds, sort_for_declutter};
use crate::depth::text_depth;
use crate::drawable::{Drawable, RendererId};
use crate::layout::anchored;
use crate::surface::{Color, FontId, TextRun};

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// A text label pinned to a geographic position.
#[derive(Clone, Debug, PartialEq)]
pub struct GeographicText {
    id: CandidateId,
    text: String,
    font: FontId,
    position: Position,
    priority: f64,
    visible: bool,
    color: Color,
    background: Option<Color>,
    altitudes: AltitudeRange,
}

impl GeographicText {
    /// Creates a visible white label.
    #[must_use]
    pub fn new(id: CandidateId, text: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            text: text.into(),
            font: FontId::default(),
            position,
            priority: 0.0,
            visible: true,
            color: Color::WHITE,
            background: None,
            altitudes: AltitudeRange::ALL,
        }
    }

    /// Sets the font.
    #[must_use]
    pub fn with_font(mut self, font: FontId) -> Self {
        self.font = font;
        self
    }

    /// Sets the declutter priority; higher wins.
    #[must_use]
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the text color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the color used for the shadow or outline effect.
    #[must_use]
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    /// Restricts the eye altitudes the label is drawn at.
    #[must_use]
    pub fn with_altitudes(mut self, altitudes: AltitudeRange) -> Self {
        self.altitudes = altitudes;
        self
    }

    /// Replaces the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replaces the font.
    pub fn set_font(&mut self, font: FontId) {
        self.font = font;
    }

    /// Shows or hides the label.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// The text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The font.
    #[must_use]
    pub fn font(&self) -> FontId {
        self.font
    }

    /// The declutter priority.
    #[must_use]
    pub fn priority(&self) -> f64 {
        self.priority
    }
}

impl Candidate for GeographicText {
    fn id(&self) -> CandidateId {
        self.id
    }

    fn kind(&self) -> CandidateKind {
        CandidateKind::Globe
    }

    fn has_content(&self) -> bool {
        !self.text.is_empty()
    }

    fn position(&self) -> Option<Position> {
        Some(self.position)
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn active_altitudes(&self) -> AltitudeRange {
        self.altitudes
    }

    /// Labels are measured by the renderer that draws them, so a bare label
    /// has no bounds of its own.
    fn screen_bounds(&self, _view: &ViewState, _globe: &dyn Globe) -> Option<Rect> {
        None
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// Measures text in the host's fonts.
pub trait TextMeasurer {
    /// Unscaled size of `text` in `font`.
    fn measure(&mut self, text: &str, font: FontId) -> Result<Size, SizeError>;
}

/// A measurer for fixed-pitch fonts: every character advances by the same
/// width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Width of one character.
    pub advance: f64,
    /// Height of a line.
    pub line_height: f64,
}

impl TextMeasurer for FixedAdvance {
    fn measure(&mut self, text: &str, _font: FontId) -> Result<Size, SizeError> {
        let chars = f64::from(u32::try_from(text.chars().count()).unwrap_or(u32::MAX));
        Ok(Size::new(chars * self.advance, self.line_height))
    }
}

#[derive(Clone, Debug)]
struct CachedExtent {
    font: FontId,
    text: String,
    size: Size,
    used: Option<FrameId>,
}

/// Measured label extents, keyed by label.
///
/// Entries live as long as their label keeps being placed: when the cache
/// moves on to a new frame with [`begin_frame`](Self::begin_frame), every
/// label not looked up during the previous frame is forgotten. The cache
/// therefore never holds more than two frames' worth of labels.
#[derive(Clone, Debug, Default)]
pub struct TextExtentCache {
    entries: BTreeMap<CandidateId, CachedExtent>,
    frame: Option<FrameId>,
    measured: u64,
}

impl TextExtentCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the cache to `frame`, dropping labels the previous frame did
    /// not use. Calling it again for the same frame does nothing.
    pub fn begin_frame(&mut self, frame: FrameId) {
        if self.frame == Some(frame) {
            return;
        }
        if let Some(previous) = self.frame {
            self.entries.retain(|_, e| e.used == Some(previous));
        }
        self.frame = Some(frame);
    }

    /// Extent of `text` in `font` for label `id`.
    ///
    /// Measures on a miss, or when the label's text or font differs from the
    /// cached one. Failures are not cached.
    pub fn extent(
        &mut self,
        measurer: &mut dyn TextMeasurer,
        id: CandidateId,
        text: &str,
        font: FontId,
    ) -> Result<Size, SizeError> {
        let frame = self.frame;
        if let Some(hit) = self.entries.get_mut(&id)
            && hit.font == font
            && hit.text == text
        {
            hit.used = frame;
            return Ok(hit.size);
        }
        let size = measurer.measure(text, font)?;
        self.measured += 1;
        self.entries.insert(
            id,
            CachedExtent {
                font,
                text: text.into(),
                size,
                used: frame,
            },
        );
        Ok(size)
    }

    /// Number of cached labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total measurements taken since creation.
    #[must_use]
    pub fn measured(&self) -> u64 {
        self.measured
    }

    /// Forgets a label.
    pub fn remove(&mut self, id: CandidateId) {
        self.entries.remove(&id);
    }

    /// Forgets every label.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How a label's background color is drawn behind its text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEffect {
    /// Background color unused.
    None,
    /// One copy offset down and to the right.
    #[default]
    Shadow,
    /// Four diagonal copies around the text.
    Outline,
}

impl TextEffect {
    /// Pixel offsets of the background copies (y-up).
    #[must_use]
    pub const fn offsets(self) -> &'static [(f64, f64)] {
        match self {
            Self::None => &[],
            Self::Shadow => &[(1.0, -1.0)],
            Self::Outline => &[(1.0, -1.0), (1.0, 1.0), (-1.0, -1.0), (-1.0, 1.0)],
        }
    }
}

/// Text renderer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextConfig {
    /// Filter configuration.
    pub eligibility: EligibilityConfig,
    /// Drop labels that overlap a label already kept.
    pub cull_text: bool,
    /// Extra space kept clear around each label when culling.
    pub cull_margin: f64,
    /// Distance scaling.
    pub scaling: DistanceScaling,
    /// Background effect.
    pub effect: TextEffect,
}

impl TextConfig {
    /// Decluttered labels with a shadow and no distance scaling.
    pub const DEFAULT: Self = Self {
        eligibility: EligibilityConfig::text(),
        cull_text: true,
        cull_margin: 0.0,
        scaling: DistanceScaling::DEFAULT,
        effect: TextEffect::Shadow,
    };

    /// Enables or disables overlap culling.
    #[must_use]
    pub const fn with_cull_text(mut self, cull_text: bool) -> Self {
        self.cull_text = cull_text;
        self
    }

    /// Sets the culling margin.
    ///
    /// # Panics
    ///
    /// Panics if `margin` is negative.
    #[must_use]
    pub fn with_cull_margin(mut self, margin: f64) -> Self {
        assert!(margin >= 0.0, "declutter margin must be non-negative");
        self.cull_margin = margin;
        self
    }

    /// Sets the distance scaling.
    #[must_use]
    pub const fn with_scaling(mut self, scaling: DistanceScaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Sets the background effect.
    #[must_use]
    pub const fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = effect;
        self
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// A label projected and measured for this frame.
#[derive(Clone, Copy, Debug)]
struct Placed {
    anchor: Point,
    depth: f64,
    extent: Size,
    scale: f64,
    opacity: f64,
}

impl Placed {
    fn bounds(&self) -> Rect {
        scaled_bounds(anchored(self.anchor, self.extent), self.scale)
    }

    fn origin(&self) -> Point {
        Point::new(self.anchor.x - self.extent.width * self.scale / 2.0, self.anchor.y)
    }
}

/// Submits, declutters and draws geographic text.
#[derive(Debug)]
pub struct TextRenderer<M> {
    id: RendererId,
    config: TextConfig,
    measurer: M,
    extents: TextExtentCache,
    dedup: SubmissionDedup,
}

impl<M: TextMeasurer> TextRenderer<M> {
    /// Creates a renderer with [`TextConfig::DEFAULT`].
    #[must_use]
    pub fn new(measurer: M) -> Self {
        Self::with_config(TextConfig::DEFAULT, measurer)
    }

    /// Creates a renderer with a custom configuration.
    #[must_use]
    pub fn with_config(config: TextConfig, measurer: M) -> Self {
        Self {
            id: RendererId::next(),
            config,
            measurer,
            extents: TextExtentCache::new(),
            dedup: SubmissionDedup::new(),
        }
    }

    /// Identity stamped on every queued label.
    #[must_use]
    pub fn id(&self) -> RendererId {
        self.id
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    /// The measurer.
    #[must_use]
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// The extent cache.
    #[must_use]
    pub fn extents(&self) -> &TextExtentCache {
        &self.extents
    }

    fn submitter(&self, layer: Option<LayerRef>) -> Submitter {
        Submitter::new(Family::Text, self.config.eligibility).with_layer(layer)
    }

    /// Offers `texts` for the current pass, tagged with `layer`.
    pub fn submit(
        &mut self,
        ctx: &mut DrawContext<'_, Drawable>,
        texts: &[Rc<GeographicText>],
        layer: Option<LayerRef>,
        tracer: &mut Tracer<'_>,
    ) -> SubmitReport {
        let id = self.id;
        self.submitter(layer).submit_many(
            ctx,
            &mut self.dedup,
            texts,
            |t| Drawable::Text(Rc::clone(t), id),
            tracer,
        )
    }

    /// Offers one label whose draw point is already known.
    pub fn submit_at(
        &mut self,
        ctx: &mut DrawContext<'_, Drawable>,
        text: &Rc<GeographicText>,
        draw_point: Vec3,
        layer: Option<LayerRef>,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let id = self.id;
        self.submitter(layer).submit_one(
            ctx,
            &mut self.dedup,
            text,
            draw_point,
            |t| Drawable::Text(Rc::clone(t), id),
            tracer,
        )
    }

    fn place(
        &mut self,
        view: &ViewState,
        text: &GeographicText,
        entry: &OrderedEntry<Drawable>,
    ) -> Result<Placed, RenderError> {
        let point = entry.draw_point.ok_or(RenderError::Unprojectable)?;
        let (anchor, depth) = view.project(point).ok_or(RenderError::Unprojectable)?;
        self.extents.begin_frame(view.frame);
        let extent = self
            .extents
            .extent(&mut self.measurer, text.id, &text.text, text.font)?;
        let (scale, opacity) = self
            .config
            .scaling
            .scale_and_opacity(view.look_at_distance, entry.eye_distance);
        Ok(Placed {
            anchor,
            depth,
            extent,
            scale,
            opacity,
        })
    }
}

impl<M: TextMeasurer> BatchDrawer<Drawable> for TextRenderer<M> {
    fn family(&self) -> Family {
        Family::Text
    }

    fn accepts(&self, entry: &OrderedEntry<Drawable>) -> bool {
        entry.item.renderer() == self.id
    }

    fn arrange(&mut self, cx: &mut BatchCx<'_, '_>, batch: &mut Vec<OrderedEntry<Drawable>>) {
        if !self.config.cull_text {
            return;
        }
        sort_for_declutter(batch, |item| match item {
            Drawable::Text(t, _) => t.priority,
            _ => 0.0,
        });
        let mut filter = DeclutterFilter::with_margin(self.config.cull_margin);
        let totals = filter.retain(batch, |entry| {
            let bounds = match &entry.item {
                Drawable::Text(text, _) => match self.place(cx.view, text, entry) {
                    Ok(placed) => Some(placed.bounds()),
                    Err(err) => {
                        cx.report_failure(FailureStage::Size, Some(text.id), &err);
                        None
                    }
                },
                _ => None,
            };
            (entry.item.candidate(), bounds)
        });
        let frame = cx.view.frame;
        cx.tracer().declutter(&DeclutterEvent {
            frame,
            accepted: totals.accepted,
            rejected: totals.rejected,
        });
    }

    fn draw(&mut self, cx: &mut BatchCx<'_, '_>, entry: &OrderedEntry<Drawable>) -> Result<(), RenderError> {
        let Drawable::Text(text, _) = &entry.item else {
            return Err(RenderError::UnhandledFamily(entry.family()));
        };
        let placed = self.place(cx.view, text, entry)?;
        if cx.is_picking() {
            cx.register_pick(text.id, placed.bounds());
            return Ok(());
        }
        cx.surface
            .set_depth_test(text_depth(cx.view, cx.globe.max_elevation(), placed.depth));
        let origin = placed.origin();
        if let Some(background) = text.background {
            let color = background.with_opacity(placed.opacity);
            for &(dx, dy) in self.config.effect.offsets() {
                cx.surface.draw_text(&TextRun {
                    text: &text.text,
                    font: text.font,
                    origin: Point::new(origin.x + dx, origin.y + dy),
                    scale: placed.scale,
                    color,
                })?;
            }
        }
        cx.surface.draw_text(&TextRun {
            text: &text.text,
            font: text.font,
            origin,
            scale: placed.scale,
            color: text.color.with_opacity(placed.opacity),
        })
    }
}

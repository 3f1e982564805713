// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Icons and markers.

use alloc::rc::Rc;
use alloc::vec::Vec;

use decal_core::candidate::{AltitudeRange, Candidate, CandidateId, CandidateKind, LayerRef};
use decal_core::context::DrawContext;
use decal_core::dedup::SubmissionDedup;
use decal_core::eligibility::{DrawPointMode, EligibilityConfig, draw_point};
use decal_core::error::RenderError;
use decal_core::geom::{Position, Vec3};
use decal_core::queue::{Family, OrderedEntry};
use decal_core::submit::{SubmitReport, Submitter};
use decal_core::trace::Tracer;
use decal_core::view::{Globe, ViewState};
use kurbo::{Rect, Size};

use crate::batch::{BatchCx, BatchDrawer};
use crate::depth::icon_depth;
use crate::drawable::{Drawable, RendererId};
use crate::layout::anchored;
use crate::surface::ImageId;

/// An image standing on a geographic position.
#[derive(Clone, Debug, PartialEq)]
pub struct Icon {
    id: CandidateId,
    image: ImageId,
    position: Position,
    size: Size,
    visible: bool,
    always_on_top: bool,
    altitudes: AltitudeRange,
    opacity: f64,
}

impl Icon {
    /// Creates a visible, opaque icon.
    #[must_use]
    pub fn new(id: CandidateId, image: ImageId, position: Position, size: Size) -> Self {
        Self {
            id,
            image,
            position,
            size,
            visible: true,
            always_on_top: false,
            altitudes: AltitudeRange::ALL,
            opacity: 1.0,
        }
    }

    /// Draws the icon over everything, ignoring depth.
    #[must_use]
    pub fn with_always_on_top(mut self, always_on_top: bool) -> Self {
        self.always_on_top = always_on_top;
        self
    }

    /// Restricts the eye altitudes the icon is drawn at.
    #[must_use]
    pub fn with_altitudes(mut self, altitudes: AltitudeRange) -> Self {
        self.altitudes = altitudes;
        self
    }

    /// Sets the opacity, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Moves the icon.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Shows or hides the icon.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// The image.
    #[must_use]
    pub fn image(&self) -> ImageId {
        self.image
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    fn bounds_with(&self, view: &ViewState, globe: &dyn Globe, mode: DrawPointMode) -> Option<Rect> {
        let point = draw_point(self.position, view, globe, mode)?;
        let (anchor, _) = view.project(point)?;
        Some(anchored(anchor, self.size))
    }
}

impl Candidate for Icon {
    fn id(&self) -> CandidateId {
        self.id
    }

    fn kind(&self) -> CandidateKind {
        CandidateKind::Globe
    }

    fn has_content(&self) -> bool {
        !self.size.is_zero_area()
    }

    fn position(&self) -> Option<Position> {
        Some(self.position)
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

    /// Bounds of the icon standing on the terrain.
    fn screen_bounds(&self, view: &ViewState, globe: &dyn Globe) -> Option<Rect> {
        self.bounds_with(view, globe, DrawPointMode::TerrainRelative)
    }
}

/// An icon seen through the renderer's elevation mode, so pick clipping tests
/// the rectangle the icon will actually be drawn in.
struct Placed<'a> {
    icon: &'a Rc<Icon>,
    mode: DrawPointMode,
}

impl Candidate for Placed<'_> {
    fn id(&self) -> CandidateId {
        self.icon.id
    }

    fn kind(&self) -> CandidateKind {
        CandidateKind::Globe
    }

    fn has_content(&self) -> bool {
        self.icon.has_content()
    }

    fn position(&self) -> Option<Position> {
        Some(self.icon.position)
    }

    fn is_visible(&self) -> bool {
        self.icon.visible
    }

    fn is_always_on_top(&self) -> bool {
        self.icon.always_on_top
    }

    fn active_altitudes(&self) -> AltitudeRange {
        self.icon.altitudes
    }

    fn screen_bounds(&self, view: &ViewState, globe: &dyn Globe) -> Option<Rect> {
        self.icon.bounds_with(view, globe, self.mode)
    }
}

/// Icon renderer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconConfig {
    /// Filter configuration.
    pub eligibility: EligibilityConfig,
}

impl IconConfig {
    /// Terrain-relative icons, view and pick clipped, not horizon clipped.
    pub const DEFAULT: Self = Self {
        eligibility: EligibilityConfig::icons(),
    };

    /// Enables or disables horizon clipping.
    #[must_use]
    pub const fn with_horizon_clipping(mut self, on: bool) -> Self {
        self.eligibility.horizon_clipping = on;
        self
    }

    /// Enables or disables view-volume clipping.
    #[must_use]
    pub const fn with_view_clipping(mut self, on: bool) -> Self {
        self.eligibility.view_clipping = on;
        self
    }

    /// Enables or disables pick-region clipping.
    #[must_use]
    pub const fn with_pick_clipping(mut self, on: bool) -> Self {
        self.eligibility.pick_clipping = on;
        self
    }

    /// Treats icon elevations as absolute instead of relative to the terrain.
    #[must_use]
    pub const fn with_absolute_elevation(mut self, absolute: bool) -> Self {
        self.eligibility.draw_point = if absolute {
            DrawPointMode::Absolute
        } else {
            DrawPointMode::TerrainRelative
        };
        self
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Submits and draws icons.
#[derive(Debug)]
pub struct IconRenderer {
    id: RendererId,
    config: IconConfig,
    dedup: SubmissionDedup,
}

impl Default for IconRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl IconRenderer {
    /// Creates a renderer with [`IconConfig::DEFAULT`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(IconConfig::DEFAULT)
    }

    /// Creates a renderer with a custom configuration.
    #[must_use]
    pub fn with_config(config: IconConfig) -> Self {
        Self {
            id: RendererId::next(),
            config,
            dedup: SubmissionDedup::new(),
        }
    }

    /// Identity stamped on every queued icon.
    #[must_use]
    pub fn id(&self) -> RendererId {
        self.id
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &IconConfig {
        &self.config
    }

    fn submitter(&self, layer: Option<LayerRef>) -> Submitter {
        Submitter::new(Family::Icon, self.config.eligibility).with_layer(layer)
    }

    /// Offers `icons` for the current pass, tagged with `layer`.
    pub fn submit(
        &mut self,
        ctx: &mut DrawContext<'_, Drawable>,
        icons: &[Rc<Icon>],
        layer: Option<LayerRef>,
        tracer: &mut Tracer<'_>,
    ) -> SubmitReport {
        let (id, mode) = (self.id, self.config.eligibility.draw_point);
        let placed: Vec<Placed<'_>> = icons.iter().map(|icon| Placed { icon, mode }).collect();
        self.submitter(layer).submit_many(
            ctx,
            &mut self.dedup,
            &placed,
            |p| Drawable::Icon(Rc::clone(p.icon), id),
            tracer,
        )
    }

    /// Offers one icon whose draw point is already known.
    pub fn submit_at(
        &mut self,
        ctx: &mut DrawContext<'_, Drawable>,
        icon: &Rc<Icon>,
        draw_point: Vec3,
        layer: Option<LayerRef>,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let placed = Placed {
            icon,
            mode: self.config.eligibility.draw_point,
        };
        let id = self.id;
        self.submitter(layer).submit_one(
            ctx,
            &mut self.dedup,
            &placed,
            draw_point,
            |p| Drawable::Icon(Rc::clone(p.icon), id),
            tracer,
        )
    }
}

impl BatchDrawer<Drawable> for IconRenderer {
    fn family(&self) -> Family {
        Family::Icon
    }

    fn accepts(&self, entry: &OrderedEntry<Drawable>) -> bool {
        entry.item.renderer() == self.id
    }

    /// Pick batches hold a single layer.
    fn continues_batch(&self, first: &OrderedEntry<Drawable>, next: &OrderedEntry<Drawable>, view: &ViewState) -> bool {
        !view.is_picking() || first.layer == next.layer
    }

    fn draw(&mut self, cx: &mut BatchCx<'_, '_>, entry: &OrderedEntry<Drawable>) -> Result<(), RenderError> {
        let Drawable::Icon(icon, _) = &entry.item else {
            return Err(RenderError::UnhandledFamily(entry.family()));
        };
        let point = entry.draw_point.ok_or(RenderError::Unprojectable)?;
        let (anchor, depth) = cx.view.project(point).ok_or(RenderError::Unprojectable)?;
        let rect = anchored(anchor, icon.size);
        if cx.is_picking() {
            cx.register_pick(icon.id, rect);
            return Ok(());
        }
        cx.surface.set_depth_test(icon_depth(
            cx.view,
            cx.globe.max_elevation(),
            depth,
            icon.always_on_top,
            entry.eye_distance,
        ));
        cx.surface.draw_image(icon.image, rect, icon.opacity)
    }
}

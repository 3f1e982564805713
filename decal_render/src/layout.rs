// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flow layout of annotation-sized boxes.
//!
//! A [`FlowLayout`] places items one after another along a primary axis with
//! a fixed gap, aligning each on the cross axis. Coordinates are y-up: a
//! horizontal row runs left to right from the left edge of the bounds, a
//! vertical column runs top to bottom from the top edge.
//!
//! ```text
//!   Horizontal, Default (bottom)      Vertical, Default (left)
//!   ┌────────────────────────┐        ┌──────────────┐
//!   │         ┌──┐           │        │┌────┐        │
//!   │ ┌───┐   │  │           │        │└────┘  vgap  │
//!   │ │ a │hg │b │hg ┌─┐     │        │┌────────┐    │
//!   └─┴───┴───┴──┴───┴─┴─────┘        │└────────┘    │
//!                                     └──────────────┘
//! ```
//!
//! An item whose size cannot be computed takes no space and no gap.

use decal_core::candidate::CandidateId;
use decal_core::error::{RenderError, SizeError};
use decal_core::trace::FailureStage;
use decal_core::view::ViewState;
use kurbo::{Point, Rect, Size};

use crate::batch::BatchCx;

/// A `size` box whose bottom edge is centered on `anchor` (y-up).
///
/// Labels, icons and annotations all hang above their anchor point this way.
#[must_use]
pub fn anchored(anchor: Point, size: Size) -> Rect {
    let half = size.width / 2.0;
    Rect::new(anchor.x - half, anchor.y, anchor.x + half, anchor.y + size.height)
}

/// Primary axis of a flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

/// Cross-axis alignment.
///
/// `Start` is the bottom edge of a horizontal flow and the left edge of a
/// vertical one; `End` is the opposite edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Bottom (horizontal) or left (vertical).
    Start,
    /// Top (horizontal) or right (vertical).
    End,
    /// Centered on the cross axis.
    Center,
    /// The orientation's default: bottom for horizontal flows, left for
    /// vertical ones.
    #[default]
    Default,
}

/// Something a layout can size and draw.
pub trait LayoutItem {
    /// Identity reported with failures.
    fn layout_id(&self) -> Option<CandidateId> {
        None
    }

    /// Size the item wants.
    fn preferred_size(&self, view: &ViewState) -> Result<Size, SizeError>;

    /// Draws the item into `bounds`.
    fn draw_in(
        &self,
        cx: &mut BatchCx<'_, '_>,
        bounds: Rect,
        opacity: f64,
        pick_position: Option<Point>,
    ) -> Result<(), RenderError>;
}

/// Stateless flow layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowLayout {
    orientation: Orientation,
    alignment: Alignment,
    hgap: f64,
    vgap: f64,
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self::horizontal(0.0)
    }
}

impl FlowLayout {
    /// Creates a layout.
    ///
    /// # Panics
    ///
    /// Panics if either gap is negative.
    #[must_use]
    pub fn new(orientation: Orientation, alignment: Alignment, hgap: f64, vgap: f64) -> Self {
        assert!(hgap >= 0.0 && vgap >= 0.0, "layout gaps must be non-negative");
        Self {
            orientation,
            alignment,
            hgap,
            vgap,
        }
    }

    /// A left-to-right row with `gap` between items.
    #[must_use]
    pub fn horizontal(gap: f64) -> Self {
        Self::new(Orientation::Horizontal, Alignment::Default, gap, 0.0)
    }

    /// A top-to-bottom column with `gap` between items.
    #[must_use]
    pub fn vertical(gap: f64) -> Self {
        Self::new(Orientation::Vertical, Alignment::Default, 0.0, gap)
    }

    /// Returns a copy with a different alignment.
    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// The primary axis.
    #[inline]
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The cross-axis alignment.
    #[inline]
    #[must_use]
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Gap between items of a horizontal flow.
    #[inline]
    #[must_use]
    pub fn hgap(&self) -> f64 {
        self.hgap
    }

    /// Gap between items of a vertical flow.
    #[inline]
    #[must_use]
    pub fn vgap(&self) -> f64 {
        self.vgap
    }

    fn gap(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.hgap,
            Orientation::Vertical => self.vgap,
        }
    }

    /// Size needed to lay out `items`.
    pub fn preferred_size<L: LayoutItem + ?Sized>(&self, view: &ViewState, items: &[&L]) -> Size {
        let gap = self.gap();
        let mut primary = 0.0;
        let mut cross: f64 = 0.0;
        let mut sized = 0_usize;
        for size in items.iter().filter_map(|item| item.preferred_size(view).ok()) {
            let (along, across) = self.split(size);
            if sized > 0 {
                primary += gap;
            }
            primary += along;
            cross = cross.max(across);
            sized += 1;
        }
        match self.orientation {
            Orientation::Horizontal => Size::new(primary, cross),
            Orientation::Vertical => Size::new(cross, primary),
        }
    }

    /// Draws `items` into `bounds`, returning how many were drawn.
    ///
    /// Size and draw failures are reported on `cx` and skipped.
    pub fn draw<L: LayoutItem + ?Sized>(
        &self,
        cx: &mut BatchCx<'_, '_>,
        items: &[&L],
        bounds: Rect,
        opacity: f64,
        pick_position: Option<Point>,
    ) -> u32 {
        let gap = self.gap();
        let mut offset = 0.0;
        let mut drawn = 0;
        for item in items {
            let size = match item.preferred_size(cx.view) {
                Ok(size) => size,
                Err(err) => {
                    cx.report_failure(FailureStage::Size, item.layout_id(), &err.into());
                    continue;
                }
            };
            let rect = self.place(bounds, offset, size);
            offset += self.split(size).0 + gap;
            match item.draw_in(cx, rect, opacity, pick_position) {
                Ok(()) => drawn += 1,
                Err(err) => cx.report_failure(FailureStage::Layout, item.layout_id(), &err),
            }
        }
        drawn
    }

    /// Splits a size into (primary, cross) extents.
    fn split(&self, size: Size) -> (f64, f64) {
        match self.orientation {
            Orientation::Horizontal => (size.width, size.height),
            Orientation::Vertical => (size.height, size.width),
        }
    }

    fn place(&self, bounds: Rect, offset: f64, size: Size) -> Rect {
        match self.orientation {
            Orientation::Horizontal => {
                let x = bounds.x0 + offset;
                let y = match self.alignment {
                    Alignment::Start | Alignment::Default => bounds.y0,
                    Alignment::End => bounds.y1 - size.height,
                    Alignment::Center => bounds.y0 + (bounds.height() - size.height) / 2.0,
                };
                Rect::from_origin_size((x, y), size)
            }
            Orientation::Vertical => {
                let y = bounds.y1 - offset - size.height;
                let x = match self.alignment {
                    Alignment::Start | Alignment::Default => bounds.x0,
                    Alignment::End => bounds.x1 - size.width,
                    Alignment::Center => bounds.x0 + (bounds.width() - size.width) / 2.0,
                };
                Rect::from_origin_size((x, y), size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DrawPlan;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use decal_core::frame::FrameId;
    use crate::testing::FlatGlobe;
    use decal_core::geom::Vec3;
    use decal_core::queue::Family;
    use decal_core::trace::Tracer;

    struct Boxed {
        id: u64,
        size: Option<(f64, f64)>,
        fails: bool,
        placed: RefCell<Vec<Rect>>,
    }

    impl Boxed {
        fn new(id: u64, w: f64, h: f64) -> Self {
            Self {
                id,
                size: Some((w, h)),
                fails: false,
                placed: RefCell::new(Vec::new()),
            }
        }

        fn without_size(id: u64) -> Self {
            Self {
                size: None,
                ..Self::new(id, 0.0, 0.0)
            }
        }
    }

    impl LayoutItem for Boxed {
        fn layout_id(&self) -> Option<CandidateId> {
            Some(CandidateId(self.id))
        }

        fn preferred_size(&self, _view: &ViewState) -> Result<Size, SizeError> {
            self.size.map(Size::from).ok_or(SizeError::Empty)
        }

        fn draw_in(
            &self,
            _cx: &mut BatchCx<'_, '_>,
            bounds: Rect,
            _opacity: f64,
            _pick_position: Option<Point>,
        ) -> Result<(), RenderError> {
            self.placed.borrow_mut().push(bounds);
            if self.fails {
                Err(RenderError::Candidate("broken".into()))
            } else {
                Ok(())
            }
        }
    }

    fn view() -> ViewState {
        ViewState::new(FrameId(1), Vec3::ZERO, 0.0, Rect::new(0.0, 0.0, 200.0, 200.0))
    }

    #[test]
    fn horizontal_preferred_size() {
        let items = [Boxed::new(1, 10.0, 20.0), Boxed::new(2, 15.0, 5.0), Boxed::new(3, 8.0, 30.0)];
        let refs: Vec<&Boxed> = items.iter().collect();
        let size = FlowLayout::horizontal(2.0).preferred_size(&view(), &refs);
        assert_eq!(size, Size::new(37.0, 30.0));
    }

    #[test]
    fn vertical_preferred_size() {
        let items = [Boxed::new(1, 10.0, 20.0), Boxed::new(2, 15.0, 5.0)];
        let refs: Vec<&Boxed> = items.iter().collect();
        let size = FlowLayout::vertical(3.0).preferred_size(&view(), &refs);
        assert_eq!(size, Size::new(15.0, 28.0));
    }

    #[test]
    fn unsized_items_take_no_space_or_gap() {
        let items = [Boxed::without_size(1), Boxed::new(2, 10.0, 4.0), Boxed::without_size(3), Boxed::new(4, 6.0, 2.0)];
        let refs: Vec<&Boxed> = items.iter().collect();
        let size = FlowLayout::horizontal(2.0).preferred_size(&view(), &refs);
        assert_eq!(size, Size::new(18.0, 4.0));
        let empty: [&Boxed; 0] = [];
        assert_eq!(FlowLayout::horizontal(2.0).preferred_size(&view(), &empty), Size::ZERO);
    }

    #[test]
    fn horizontal_draw_aligns_bottom_by_default() {
        let items = [Boxed::new(1, 10.0, 20.0), Boxed::without_size(2), Boxed::new(3, 15.0, 5.0)];
        let refs: Vec<&Boxed> = items.iter().collect();
        let view = view();
        let mut plan = DrawPlan::new();
        let mut tracer = Tracer::none();
        let globe = FlatGlobe { ground: 0.0 };
        let mut cx = BatchCx::new(&view, &globe, &mut plan, Family::Annotation, &mut tracer);

        let bounds = Rect::new(100.0, 50.0, 200.0, 80.0);
        let drawn = FlowLayout::horizontal(2.0).draw(&mut cx, &refs, bounds, 1.0, None);
        assert_eq!(drawn, 2);
        assert_eq!(cx.failures(), 1);
        assert_eq!(items[0].placed.borrow()[0], Rect::new(100.0, 50.0, 110.0, 70.0));
        assert_eq!(items[2].placed.borrow()[0], Rect::new(112.0, 50.0, 127.0, 55.0));

        let centered = FlowLayout::horizontal(2.0).with_alignment(Alignment::Center);
        centered.draw(&mut cx, &refs[2..], bounds, 1.0, None);
        assert_eq!(items[2].placed.borrow()[1], Rect::new(100.0, 62.5, 115.0, 67.5));
    }

    #[test]
    fn vertical_draw_runs_top_down() {
        let items = [Boxed::new(1, 10.0, 20.0), Boxed::new(2, 15.0, 5.0)];
        let refs: Vec<&Boxed> = items.iter().collect();
        let view = view();
        let mut plan = DrawPlan::new();
        let mut tracer = Tracer::none();
        let globe = FlatGlobe { ground: 0.0 };
        let mut cx = BatchCx::new(&view, &globe, &mut plan, Family::Annotation, &mut tracer);

        let bounds = Rect::new(0.0, 0.0, 40.0, 100.0);
        FlowLayout::vertical(4.0)
            .with_alignment(Alignment::End)
            .draw(&mut cx, &refs, bounds, 1.0, None);
        assert_eq!(items[0].placed.borrow()[0], Rect::new(30.0, 80.0, 40.0, 100.0));
        assert_eq!(items[1].placed.borrow()[0], Rect::new(25.0, 71.0, 40.0, 76.0));
    }

    #[test]
    fn draw_failure_does_not_blank_the_rest() {
        let mut first = Boxed::new(1, 5.0, 5.0);
        first.fails = true;
        let items = [first, Boxed::new(2, 5.0, 5.0)];
        let refs: Vec<&Boxed> = items.iter().collect();
        let view = view();
        let mut plan = DrawPlan::new();
        let mut tracer = Tracer::none();
        let globe = FlatGlobe { ground: 0.0 };
        let mut cx = BatchCx::new(&view, &globe, &mut plan, Family::Annotation, &mut tracer);

        let drawn = FlowLayout::horizontal(0.0).draw(&mut cx, &refs, Rect::new(0.0, 0.0, 50.0, 50.0), 1.0, None);
        assert_eq!(drawn, 1);
        assert_eq!(cx.failures(), 1);
        assert_eq!(items[1].placed.borrow().len(), 1);
    }

    #[test]
    fn anchored_hangs_above_point() {
        let rect = anchored(Point::new(50.0, 10.0), Size::new(20.0, 8.0));
        assert_eq!(rect, Rect::new(40.0, 10.0, 60.0, 18.0));
    }

    #[test]
    #[should_panic(expected = "layout gaps must be non-negative")]
    fn negative_gap_panics() {
        let _ = FlowLayout::horizontal(-1.0);
    }
}

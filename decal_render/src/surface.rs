// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The graphics boundary.
//!
//! Renderers never talk to a graphics API directly. They issue calls on a
//! [`Surface`], which the host implements on top of its own state stack.
//! [`DrawPlan`] is a recording implementation that stores the calls as
//! [`DrawCommand`]s in order, for hosts that replay them later and for tests.

use alloc::string::String;
use alloc::vec::Vec;

use decal_core::error::RenderError;
use decal_core::queue::Family;
use kurbo::{Point, Rect};

use crate::depth::DepthTest;

/// Blend mode for a graphics-state scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing with premultiplied colors.
    #[default]
    SourceOver,
    /// Blending disabled, used by pick passes so pick colors stay exact.
    Replace,
}

/// A non-premultiplied RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Creates a color from components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the color with its alpha multiplied by `opacity`.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "opacity is clamped to [0, 1] before narrowing"
    )]
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0) as f32,
            ..self
        }
    }
}

/// Handle to a host-managed font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontId(pub u32);

/// Handle to a host-managed image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub u32);

/// Graphics state established for one batch.
///
/// Covers what the host saves and restores around the batch: an
/// orthographic projection over `viewport`, blending, and depth writes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScopeState {
    /// Family the batch draws.
    pub family: Family,
    /// Viewport the orthographic projection covers.
    pub viewport: Rect,
    /// Blend mode.
    pub blend: BlendMode,
    /// Whether fragments write depth.
    pub depth_write: bool,
}

/// One run of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextRun<'a> {
    /// The text.
    pub text: &'a str,
    /// Font to draw with.
    pub font: FontId,
    /// Baseline origin in viewport coordinates (y-up).
    pub origin: Point,
    /// Uniform scale around `origin`.
    pub scale: f64,
    /// Text color.
    pub color: Color,
}

/// Drawing calls the renderers need from the host.
pub trait Surface {
    /// Saves graphics state and establishes `scope`.
    fn push_scope(&mut self, scope: &ScopeState);

    /// Restores the state saved by the matching [`push_scope`](Self::push_scope).
    fn pop_scope(&mut self);

    /// Sets the depth test for subsequent draws in the current scope.
    fn set_depth_test(&mut self, depth: DepthTest);

    /// Fills a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), RenderError>;

    /// Draws a run of text.
    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), RenderError>;

    /// Draws an image stretched to `rect`.
    fn draw_image(&mut self, image: ImageId, rect: Rect, opacity: f64) -> Result<(), RenderError>;
}

/// A recorded [`Surface`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`Surface::push_scope`].
    PushScope(ScopeState),
    /// [`Surface::pop_scope`].
    PopScope,
    /// [`Surface::set_depth_test`].
    DepthTest(DepthTest),
    /// [`Surface::fill_rect`].
    FillRect {
        /// Filled area.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// [`Surface::draw_text`].
    Text {
        /// The text.
        text: String,
        /// Font.
        font: FontId,
        /// Baseline origin.
        origin: Point,
        /// Scale.
        scale: f64,
        /// Color.
        color: Color,
    },
    /// [`Surface::draw_image`].
    Image {
        /// The image.
        image: ImageId,
        /// Destination.
        rect: Rect,
        /// Opacity.
        opacity: f64,
    },
}

/// An ordered list of draw commands for one pass.
#[derive(Clone, Debug, Default)]
pub struct DrawPlan {
    /// Commands in issue order.
    pub commands: Vec<DrawCommand>,
    depth: usize,
}

impl DrawPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scopes currently open.
    #[must_use]
    pub fn open_scopes(&self) -> usize {
        self.depth
    }

    /// Texts drawn so far, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.depth = 0;
    }
}

impl Surface for DrawPlan {
    fn push_scope(&mut self, scope: &ScopeState) {
        self.depth += 1;
        self.commands.push(DrawCommand::PushScope(*scope));
    }

    fn pop_scope(&mut self) {
        assert!(self.depth > 0, "pop_scope without matching push_scope");
        self.depth -= 1;
        self.commands.push(DrawCommand::PopScope);
    }

    fn set_depth_test(&mut self, depth: DepthTest) {
        self.commands.push(DrawCommand::DepthTest(depth));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::FillRect { rect, color });
        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::Text {
            text: run.text.into(),
            font: run.font,
            origin: run.origin,
            scale: run.scale,
            color: run.color,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: ImageId, rect: Rect, opacity: f64) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::Image { image, rect, opacity });
        Ok(())
    }
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the ordered pass.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! submission, batch rendering and decluttering call as they run. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing. When **on**,
//! each method performs a single `Option` branch before dispatching.
//!
//! Failures trapped while drawing a candidate are reported through
//! [`RenderFailureEvent`], keyed by a [`MessageCode`] and the candidate id.
//! This is the only place they surface.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`): gates the per-candidate
//!   [`CandidateSubmitted`] and [`CandidateRejected`] events.

use core::fmt;

use crate::candidate::{CandidateId, LayerRef};
#[cfg(feature = "trace-rich")]
use crate::eligibility::RejectReason;
use crate::error::RenderError;
use crate::frame::FrameId;
use crate::queue::Family;
use crate::view::PassKind;

// ---------------------------------------------------------------------------
// Message codes
// ---------------------------------------------------------------------------

/// Where in the pipeline a candidate failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// Drawing in a draw pass.
    Render,
    /// Drawing in a pick pass.
    Pick,
    /// Computing the candidate's size or bounds.
    Size,
    /// Drawing a child inside a layout.
    Layout,
    /// Routing the entry to a drawer.
    Dispatch,
}

impl FailureStage {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Render => "render_failed",
            Self::Pick => "pick_failed",
            Self::Size => "size_failed",
            Self::Layout => "layout_failed",
            Self::Dispatch => "unhandled",
        }
    }
}

/// A stable, machine-readable failure code such as `text.render_failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageCode {
    /// Family that was drawing.
    pub family: Family,
    /// Stage that failed.
    pub stage: FailureStage,
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family.name(), self.stage.suffix())
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the deduplicator drops the previous frame's sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DedupResetEvent {
    /// The new frame.
    pub frame: FrameId,
    /// Draw-pass entries dropped.
    pub draw_cleared: u32,
    /// Pick-pass entries dropped.
    pub pick_cleared: u32,
}

/// Emitted once per submission call with its totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionEvent {
    /// Frame the call belongs to.
    pub frame: FrameId,
    /// Family of the submitting renderer.
    pub family: Family,
    /// Pass the call ran in.
    pub pass: PassKind,
    /// Candidates offered.
    pub offered: u32,
    /// Candidates pushed to the queue.
    pub submitted: u32,
    /// Candidates rejected by the filter chain.
    pub rejected: u32,
    /// Candidates skipped as already submitted this frame.
    pub duplicates: u32,
    /// Whether the call stopped before the last candidate.
    pub ended_early: bool,
}

/// Emitted after each batch closes its graphics-state scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchEvent {
    /// Frame counter.
    pub frame: FrameId,
    /// Family drawn.
    pub family: Family,
    /// Draw or pick.
    pub pass: PassKind,
    /// Entries consumed from the queue.
    pub entries: u32,
    /// Failures reported while the batch was open.
    pub failures: u32,
}

/// Emitted for every trapped per-candidate failure.
#[derive(Clone, Copy, Debug)]
pub struct RenderFailureEvent<'a> {
    /// Frame counter.
    pub frame: FrameId,
    /// What failed.
    pub code: MessageCode,
    /// The offending candidate, if known.
    pub candidate: Option<CandidateId>,
    /// The trapped error.
    pub error: &'a RenderError,
}

/// Emitted after a declutter pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeclutterEvent {
    /// Frame counter.
    pub frame: FrameId,
    /// Labels kept.
    pub accepted: u32,
    /// Labels dropped for overlap or missing bounds.
    pub rejected: u32,
}

/// Emitted when a pick batch resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickEvent {
    /// Frame counter.
    pub frame: FrameId,
    /// Family that was picked against.
    pub family: Family,
    /// Candidates drawn into the pick list.
    pub considered: u32,
    /// Winning candidate, if any.
    pub picked: Option<CandidateId>,
    /// Layer of the winning candidate.
    pub layer: Option<LayerRef>,
}

/// Emitted for every candidate pushed to the queue.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateSubmitted {
    /// Frame counter.
    pub frame: FrameId,
    /// The candidate.
    pub candidate: CandidateId,
    /// Family it will be drawn by.
    pub family: Family,
    /// Sort key.
    pub eye_distance: f64,
}

/// Emitted for every candidate the filter chain rejects.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateRejected {
    /// Frame counter.
    pub frame: FrameId,
    /// The candidate.
    pub candidate: CandidateId,
    /// First failing rule.
    pub reason: RejectReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the ordered pass.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when per-frame deduplication sets are cleared.
    fn on_dedup_reset(&mut self, e: &DedupResetEvent) {
        _ = e;
    }

    /// Called at the end of each submission call.
    fn on_submission(&mut self, e: &SubmissionEvent) {
        _ = e;
    }

    /// Called when a batch closes.
    fn on_batch(&mut self, e: &BatchEvent) {
        _ = e;
    }

    /// Called for each trapped per-candidate failure.
    fn on_render_failure(&mut self, e: &RenderFailureEvent<'_>) {
        _ = e;
    }

    /// Called after a declutter pass.
    fn on_declutter(&mut self, e: &DeclutterEvent) {
        _ = e;
    }

    /// Called when a pick batch resolves.
    fn on_pick(&mut self, e: &PickEvent) {
        _ = e;
    }

    /// Called per submitted candidate (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_candidate_submitted(&mut self, e: &CandidateSubmitted) {
        _ = e;
    }

    /// Called per rejected candidate (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_candidate_rejected(&mut self, e: &CandidateRejected) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Expands to a `Tracer` method that forwards one event.
macro_rules! forward {
    ($(#[$meta:meta])* $name:ident, $hook:ident, $ty:ty) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`DedupResetEvent`].
        dedup_reset, on_dedup_reset, DedupResetEvent
    );
    forward!(
        /// Emits a [`SubmissionEvent`].
        submission, on_submission, SubmissionEvent
    );
    forward!(
        /// Emits a [`BatchEvent`].
        batch, on_batch, BatchEvent
    );
    forward!(
        /// Emits a [`RenderFailureEvent`].
        render_failure, on_render_failure, RenderFailureEvent<'_>
    );
    forward!(
        /// Emits a [`DeclutterEvent`].
        declutter, on_declutter, DeclutterEvent
    );
    forward!(
        /// Emits a [`PickEvent`].
        pick, on_pick, PickEvent
    );

    /// Emits a [`CandidateSubmitted`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn candidate_submitted(&mut self, e: &CandidateSubmitted) {
        if let Some(s) = &mut self.sink {
            s.on_candidate_submitted(e);
        }
    }

    /// Emits a [`CandidateRejected`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn candidate_rejected(&mut self, e: &CandidateRejected) {
        if let Some(s) = &mut self.sink {
            s.on_candidate_rejected(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

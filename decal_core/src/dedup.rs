// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame submission deduplication.
//!
//! On a continuous (longitude-wrapping) globe the same screen-anchored
//! candidate can be offered once per visible wrap in a single frame.
//! [`SubmissionDedup`] remembers which candidates were already queued in the
//! current frame, separately for the draw and the pick pass.
//!
//! Globe-anchored candidates, and every candidate on a non-continuous globe,
//! pass straight through.

use alloc::collections::BTreeSet;

use crate::candidate::{CandidateId, CandidateKind};
use crate::frame::FrameId;
use crate::view::ViewState;

/// The part of the view that deduplication depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitMode {
    /// Frame the submission belongs to.
    pub frame: FrameId,
    /// Whether the globe repeats across longitude wraps.
    pub continuous: bool,
    /// Whether this is a pick pass.
    pub picking: bool,
}

impl SubmitMode {
    /// Extracts the mode from a view.
    #[inline]
    #[must_use]
    pub fn from_view(view: &ViewState) -> Self {
        Self {
            frame: view.frame,
            continuous: view.globe_mode.is_continuous(),
            picking: view.is_picking(),
        }
    }
}

/// Membership sets of candidates already submitted this frame.
#[derive(Clone, Debug, Default)]
pub struct SubmissionDedup {
    frame: Option<FrameId>,
    draw: BTreeSet<CandidateId>,
    pick: BTreeSet<CandidateId>,
}

/// Sizes of the sets dropped by a frame change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupReset {
    /// Frame the sets now belong to.
    pub frame: FrameId,
    /// Draw-pass entries dropped.
    pub draw_cleared: usize,
    /// Pick-pass entries dropped.
    pub pick_cleared: usize,
}

impl SubmissionDedup {
    /// Creates empty sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to `frame`, clearing both sets if it differs from the frame
    /// seen last. Returns what was cleared, or `None` if the frame is
    /// unchanged.
    pub fn sync_frame(&mut self, frame: FrameId) -> Option<DedupReset> {
        if self.frame == Some(frame) {
            return None;
        }
        let reset = DedupReset {
            frame,
            draw_cleared: self.draw.len(),
            pick_cleared: self.pick.len(),
        };
        self.draw.clear();
        self.pick.clear();
        self.frame = Some(frame);
        Some(reset)
    }

    /// Returns `false` if the candidate was already submitted in this frame
    /// and pass.
    pub fn should_submit(&mut self, id: CandidateId, kind: CandidateKind, mode: SubmitMode) -> bool {
        if !Self::applies(kind, mode) {
            return true;
        }
        self.sync_frame(mode.frame);
        !self.set(mode.picking).contains(&id)
    }

    /// Records that the candidate was submitted in this frame and pass.
    pub fn mark_submitted(&mut self, id: CandidateId, kind: CandidateKind, mode: SubmitMode) {
        if !Self::applies(kind, mode) {
            return;
        }
        self.sync_frame(mode.frame);
        self.set_mut(mode.picking).insert(id);
    }

    /// Number of candidates recorded for the given pass.
    #[must_use]
    pub fn len(&self, picking: bool) -> usize {
        self.set(picking).len()
    }

    /// Returns `true` if neither pass has recorded anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draw.is_empty() && self.pick.is_empty()
    }

    const fn applies(kind: CandidateKind, mode: SubmitMode) -> bool {
        mode.continuous && matches!(kind, CandidateKind::Screen)
    }

    fn set(&self, picking: bool) -> &BTreeSet<CandidateId> {
        if picking { &self.pick } else { &self.draw }
    }

    fn set_mut(&mut self, picking: bool) -> &mut BTreeSet<CandidateId> {
        if picking { &mut self.pick } else { &mut self.draw }
    }
}

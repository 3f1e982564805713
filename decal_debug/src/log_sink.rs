// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwarding to the [`log`] facade.
//!
//! | Event                        | Level   |
//! |------------------------------|---------|
//! | render failure               | `warn`  |
//! | submission, batch, declutter | `debug` |
//! | dedup reset, pick            | `debug` |
//! | per-candidate                | `trace` |

use decal_core::trace::{
    BatchEvent, CandidateRejected, CandidateSubmitted, DeclutterEvent, DedupResetEvent, PickEvent,
    RenderFailureEvent, SubmissionEvent, TraceSink,
};

use crate::pretty::{family_label, pass_label};

/// A [`TraceSink`] that forwards every event to the `log` crate.
#[derive(Clone, Copy, Debug)]
pub struct LogSink {
    target: &'static str,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    /// Logs under the `decal` target.
    #[must_use]
    pub const fn new() -> Self {
        Self { target: "decal" }
    }

    /// Logs under a custom target.
    #[must_use]
    pub const fn with_target(target: &'static str) -> Self {
        Self { target }
    }

    /// The log target.
    #[must_use]
    pub const fn target(&self) -> &'static str {
        self.target
    }
}

impl TraceSink for LogSink {
    fn on_dedup_reset(&mut self, e: &DedupResetEvent) {
        log::debug!(
            target: self.target,
            "frame {}: dedup reset ({} draw, {} pick)",
            e.frame.get(),
            e.draw_cleared,
            e.pick_cleared
        );
    }

    fn on_submission(&mut self, e: &SubmissionEvent) {
        log::debug!(
            target: self.target,
            "frame {}: {} {} submission: {}/{} queued, {} rejected, {} duplicate{}",
            e.frame.get(),
            family_label(e.family),
            pass_label(e.pass),
            e.submitted,
            e.offered,
            e.rejected,
            e.duplicates,
            if e.ended_early { ", ended early" } else { "" }
        );
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        log::debug!(
            target: self.target,
            "frame {}: {} {} batch of {} ({} failed)",
            e.frame.get(),
            family_label(e.family),
            pass_label(e.pass),
            e.entries,
            e.failures
        );
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent<'_>) {
        match e.candidate {
            Some(c) => log::warn!(
                target: self.target,
                "{} (frame {}, candidate {}): {}",
                e.code,
                e.frame.get(),
                c.0,
                e.error
            ),
            None => log::warn!(target: self.target, "{} (frame {}): {}", e.code, e.frame.get(), e.error),
        }
    }

    fn on_declutter(&mut self, e: &DeclutterEvent) {
        log::debug!(
            target: self.target,
            "frame {}: declutter kept {}, dropped {}",
            e.frame.get(),
            e.accepted,
            e.rejected
        );
    }

    fn on_pick(&mut self, e: &PickEvent) {
        log::debug!(
            target: self.target,
            "frame {}: {} pick over {} candidates -> {:?}",
            e.frame.get(),
            family_label(e.family),
            e.considered,
            e.picked
        );
    }

    fn on_candidate_submitted(&mut self, e: &CandidateSubmitted) {
        log::trace!(
            target: self.target,
            "frame {}: queued {:?} as {} at {:.1}",
            e.frame.get(),
            e.candidate,
            family_label(e.family),
            e.eye_distance
        );
    }

    fn on_candidate_rejected(&mut self, e: &CandidateRejected) {
        log::trace!(
            target: self.target,
            "frame {}: rejected {:?}: {:?}",
            e.frame.get(),
            e.candidate,
            e.reason
        );
    }
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::borrow::Cow;
use std::io::Write;

use decal_core::queue::Family;
use decal_core::trace::{
    BatchEvent, CandidateRejected, CandidateSubmitted, DeclutterEvent, DedupResetEvent, PickEvent,
    RenderFailureEvent, SubmissionEvent, TraceSink,
};
use decal_core::view::PassKind;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn family_label(family: Family) -> Cow<'static, str> {
    match family {
        Family::Other(n) => Cow::Owned(format!("other:{n}")),
        f => Cow::Borrowed(f.name()),
    }
}

pub(crate) fn pass_label(pass: PassKind) -> &'static str {
    match pass {
        PassKind::Draw => "draw",
        PassKind::Pick => "pick",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_dedup_reset(&mut self, e: &DedupResetEvent) {
        let _ = writeln!(
            self.writer,
            "[dedup] frame={} draw_cleared={} pick_cleared={}",
            e.frame.get(),
            e.draw_cleared,
            e.pick_cleared,
        );
    }

    fn on_submission(&mut self, e: &SubmissionEvent) {
        let early = if e.ended_early { " ENDED_EARLY" } else { "" };
        let _ = writeln!(
            self.writer,
            "[submit] frame={} {} pass={} offered={} submitted={} rejected={} dup={}{early}",
            e.frame.get(),
            family_label(e.family),
            pass_label(e.pass),
            e.offered,
            e.submitted,
            e.rejected,
            e.duplicates,
        );
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        let _ = writeln!(
            self.writer,
            "[batch] frame={} {} pass={} entries={} failures={}",
            e.frame.get(),
            family_label(e.family),
            pass_label(e.pass),
            e.entries,
            e.failures,
        );
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent<'_>) {
        let candidate = e.candidate.map_or_else(|| "-".to_owned(), |c| c.0.to_string());
        let _ = writeln!(
            self.writer,
            "[failure] frame={} code={} candidate={candidate}: {}",
            e.frame.get(),
            e.code,
            e.error,
        );
    }

    fn on_declutter(&mut self, e: &DeclutterEvent) {
        let _ = writeln!(
            self.writer,
            "[declutter] frame={} accepted={} rejected={}",
            e.frame.get(),
            e.accepted,
            e.rejected,
        );
    }

    fn on_pick(&mut self, e: &PickEvent) {
        let picked = match (e.picked, e.layer) {
            (Some(c), Some(l)) => format!("{} layer={}", c.0, l.0),
            (Some(c), None) => c.0.to_string(),
            (None, _) => "none".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[pick] frame={} {} considered={} picked={picked}",
            e.frame.get(),
            family_label(e.family),
            e.considered,
        );
    }

    fn on_candidate_submitted(&mut self, e: &CandidateSubmitted) {
        let _ = writeln!(
            self.writer,
            "[candidate:submit] frame={} candidate={} {} eye_distance={:.1}",
            e.frame.get(),
            e.candidate.0,
            family_label(e.family),
            e.eye_distance,
        );
    }

    fn on_candidate_rejected(&mut self, e: &CandidateRejected) {
        let _ = writeln!(
            self.writer,
            "[candidate:reject] frame={} candidate={} reason={:?}",
            e.frame.get(),
            e.candidate.0,
            e.reason,
        );
    }
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each led by a one-byte tag. [`decode`]
//! reads them back as an iterator of [`RecordedEvent`].
//!
//! Render failures keep the error's display text, not the error value.

use decal_core::candidate::{CandidateId, LayerRef};
use decal_core::eligibility::RejectReason;
use decal_core::frame::FrameId;
use decal_core::queue::Family;
use decal_core::trace::{
    BatchEvent, CandidateRejected, CandidateSubmitted, DeclutterEvent, DedupResetEvent, FailureStage,
    MessageCode, PickEvent, RenderFailureEvent, SubmissionEvent, TraceSink,
};
use decal_core::view::PassKind;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_DEDUP_RESET: u8 = 1;
const TAG_SUBMISSION: u8 = 2;
const TAG_BATCH: u8 = 3;
const TAG_RENDER_FAILURE: u8 = 4;
const TAG_DECLUTTER: u8 = 5;
const TAG_PICK: u8 = 6;
const TAG_CANDIDATE_SUBMITTED: u8 = 7;
const TAG_CANDIDATE_REJECTED: u8 = 8;

const REJECT_REASONS: [RejectReason; 10] = [
    RejectReason::MissingContent,
    RejectReason::UnresolvedPosition,
    RejectReason::Hidden,
    RejectReason::OutsidePickRange,
    RejectReason::OutsideAltitudeRange,
    RejectReason::OutsideSector,
    RejectReason::TerrainUnavailable,
    RejectReason::OutsideFrustum,
    RejectReason::BeyondHorizon,
    RejectReason::Offscreen,
];

const STAGES: [FailureStage; 5] = [
    FailureStage::Render,
    FailureStage::Pick,
    FailureStage::Size,
    FailureStage::Layout,
    FailureStage::Dispatch,
];

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_frame(&mut self, frame: FrameId) {
        self.write_u64(frame.get());
    }

    fn write_family(&mut self, family: Family) {
        let (tag, payload) = match family {
            Family::Annotation => (0, 0),
            Family::Text => (1, 0),
            Family::Icon => (2, 0),
            Family::Other(n) => (3, n),
        };
        self.write_u8(tag);
        self.write_u32(payload);
    }

    fn write_pass(&mut self, pass: PassKind) {
        self.write_u8(match pass {
            PassKind::Draw => 0,
            PassKind::Pick => 1,
        });
    }

    fn write_option_candidate(&mut self, v: Option<CandidateId>) {
        self.write_u8(u8::from(v.is_some()));
        self.write_u64(v.map_or(0, |c| c.0));
    }

    fn write_option_layer(&mut self, v: Option<LayerRef>) {
        self.write_u8(u8::from(v.is_some()));
        self.write_u32(v.map_or(0, |l| l.0));
    }

    fn write_str(&mut self, s: &str) {
        let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        let kept = usize::try_from(len).unwrap_or(usize::MAX);
        self.buf.extend(s.bytes().take(kept));
    }
}

fn index_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    table
        .iter()
        .position(|v| v == value)
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(u8::MAX)
}

impl TraceSink for RecorderSink {
    fn on_dedup_reset(&mut self, e: &DedupResetEvent) {
        self.write_u8(TAG_DEDUP_RESET);
        self.write_frame(e.frame);
        self.write_u32(e.draw_cleared);
        self.write_u32(e.pick_cleared);
    }

    fn on_submission(&mut self, e: &SubmissionEvent) {
        self.write_u8(TAG_SUBMISSION);
        self.write_frame(e.frame);
        self.write_family(e.family);
        self.write_pass(e.pass);
        self.write_u32(e.offered);
        self.write_u32(e.submitted);
        self.write_u32(e.rejected);
        self.write_u32(e.duplicates);
        self.write_u8(u8::from(e.ended_early));
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.write_u8(TAG_BATCH);
        self.write_frame(e.frame);
        self.write_family(e.family);
        self.write_pass(e.pass);
        self.write_u32(e.entries);
        self.write_u32(e.failures);
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent<'_>) {
        self.write_u8(TAG_RENDER_FAILURE);
        self.write_frame(e.frame);
        self.write_family(e.code.family);
        self.write_u8(index_of(&STAGES, &e.code.stage));
        self.write_option_candidate(e.candidate);
        self.write_str(&e.error.to_string());
    }

    fn on_declutter(&mut self, e: &DeclutterEvent) {
        self.write_u8(TAG_DECLUTTER);
        self.write_frame(e.frame);
        self.write_u32(e.accepted);
        self.write_u32(e.rejected);
    }

    fn on_pick(&mut self, e: &PickEvent) {
        self.write_u8(TAG_PICK);
        self.write_frame(e.frame);
        self.write_family(e.family);
        self.write_u32(e.considered);
        self.write_option_candidate(e.picked);
        self.write_option_layer(e.layer);
    }

    fn on_candidate_submitted(&mut self, e: &CandidateSubmitted) {
        self.write_u8(TAG_CANDIDATE_SUBMITTED);
        self.write_frame(e.frame);
        self.write_u64(e.candidate.0);
        self.write_family(e.family);
        self.write_u64(e.eye_distance.to_bits());
    }

    fn on_candidate_rejected(&mut self, e: &CandidateRejected) {
        self.write_u8(TAG_CANDIDATE_REJECTED);
        self.write_frame(e.frame);
        self.write_u64(e.candidate.0);
        self.write_u8(index_of(&REJECT_REASONS, &e.reason));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`DedupResetEvent`].
    DedupReset(DedupResetEvent),
    /// A [`SubmissionEvent`].
    Submission(SubmissionEvent),
    /// A [`BatchEvent`].
    Batch(BatchEvent),
    /// A [`RenderFailureEvent`] with its error rendered to text.
    RenderFailure {
        /// Frame counter.
        frame: FrameId,
        /// What failed.
        code: MessageCode,
        /// The offending candidate, if known.
        candidate: Option<CandidateId>,
        /// Display text of the error.
        message: String,
    },
    /// A [`DeclutterEvent`].
    Declutter(DeclutterEvent),
    /// A [`PickEvent`].
    Pick(PickEvent),
    /// A [`CandidateSubmitted`].
    CandidateSubmitted(CandidateSubmitted),
    /// A [`CandidateRejected`].
    CandidateRejected(CandidateRejected),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter { data: bytes, pos: 0 }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_frame(&mut self) -> Option<FrameId> {
        self.read_u64().map(FrameId)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_family(&mut self) -> Option<Family> {
        let tag = self.read_u8()?;
        let payload = self.read_u32()?;
        Some(match tag {
            0 => Family::Annotation,
            1 => Family::Text,
            2 => Family::Icon,
            _ => Family::Other(payload),
        })
    }

    fn read_pass(&mut self) -> Option<PassKind> {
        Some(match self.read_u8()? {
            0 => PassKind::Draw,
            _ => PassKind::Pick,
        })
    }

    fn read_option_candidate(&mut self) -> Option<Option<CandidateId>> {
        let present = self.read_bool()?;
        let id = self.read_u64()?;
        Some(present.then_some(CandidateId(id)))
    }

    fn read_option_layer(&mut self) -> Option<Option<LayerRef>> {
        let present = self.read_bool()?;
        let layer = self.read_u32()?;
        Some(present.then_some(LayerRef(layer)))
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        Some(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn decode_dedup_reset(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DedupReset(DedupResetEvent {
            frame: self.read_frame()?,
            draw_cleared: self.read_u32()?,
            pick_cleared: self.read_u32()?,
        }))
    }

    fn decode_submission(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Submission(SubmissionEvent {
            frame: self.read_frame()?,
            family: self.read_family()?,
            pass: self.read_pass()?,
            offered: self.read_u32()?,
            submitted: self.read_u32()?,
            rejected: self.read_u32()?,
            duplicates: self.read_u32()?,
            ended_early: self.read_bool()?,
        }))
    }

    fn decode_batch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Batch(BatchEvent {
            frame: self.read_frame()?,
            family: self.read_family()?,
            pass: self.read_pass()?,
            entries: self.read_u32()?,
            failures: self.read_u32()?,
        }))
    }

    fn decode_render_failure(&mut self) -> Option<RecordedEvent> {
        let frame = self.read_frame()?;
        let family = self.read_family()?;
        let stage = *STAGES.get(usize::from(self.read_u8()?))?;
        Some(RecordedEvent::RenderFailure {
            frame,
            code: MessageCode { family, stage },
            candidate: self.read_option_candidate()?,
            message: self.read_string()?,
        })
    }

    fn decode_declutter(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Declutter(DeclutterEvent {
            frame: self.read_frame()?,
            accepted: self.read_u32()?,
            rejected: self.read_u32()?,
        }))
    }

    fn decode_pick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Pick(PickEvent {
            frame: self.read_frame()?,
            family: self.read_family()?,
            considered: self.read_u32()?,
            picked: self.read_option_candidate()?,
            layer: self.read_option_layer()?,
        }))
    }

    fn decode_candidate_submitted(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CandidateSubmitted(CandidateSubmitted {
            frame: self.read_frame()?,
            candidate: CandidateId(self.read_u64()?),
            family: self.read_family()?,
            eye_distance: f64::from_bits(self.read_u64()?),
        }))
    }

    fn decode_candidate_rejected(&mut self) -> Option<RecordedEvent> {
        let frame = self.read_frame()?;
        let candidate = CandidateId(self.read_u64()?);
        let reason = *REJECT_REASONS.get(usize::from(self.read_u8()?))?;
        Some(RecordedEvent::CandidateRejected(CandidateRejected {
            frame,
            candidate,
            reason,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_DEDUP_RESET => self.decode_dedup_reset(),
            TAG_SUBMISSION => self.decode_submission(),
            TAG_BATCH => self.decode_batch(),
            TAG_RENDER_FAILURE => self.decode_render_failure(),
            TAG_DECLUTTER => self.decode_declutter(),
            TAG_PICK => self.decode_pick(),
            TAG_CANDIDATE_SUBMITTED => self.decode_candidate_submitted(),
            TAG_CANDIDATE_REJECTED => self.decode_candidate_rejected(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

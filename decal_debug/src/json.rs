// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes them to the given writer as a JSON array, one object per event.
//! Every object carries an `"event"` name and the `"frame"` counter.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::pretty::{family_label, pass_label};
use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a pretty-printed JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(|e| to_value(&e)).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_value(recorded: &RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::DedupReset(e) => json!({
            "event": "dedup_reset",
            "frame": e.frame.get(),
            "draw_cleared": e.draw_cleared,
            "pick_cleared": e.pick_cleared,
        }),
        RecordedEvent::Submission(e) => json!({
            "event": "submission",
            "frame": e.frame.get(),
            "family": family_label(e.family),
            "pass": pass_label(e.pass),
            "offered": e.offered,
            "submitted": e.submitted,
            "rejected": e.rejected,
            "duplicates": e.duplicates,
            "ended_early": e.ended_early,
        }),
        RecordedEvent::Batch(e) => json!({
            "event": "batch",
            "frame": e.frame.get(),
            "family": family_label(e.family),
            "pass": pass_label(e.pass),
            "entries": e.entries,
            "failures": e.failures,
        }),
        RecordedEvent::RenderFailure {
            frame,
            code,
            candidate,
            message,
        } => json!({
            "event": "render_failure",
            "frame": frame.get(),
            "code": code.to_string(),
            "candidate": candidate.map(|c| c.0),
            "message": message,
        }),
        RecordedEvent::Declutter(e) => json!({
            "event": "declutter",
            "frame": e.frame.get(),
            "accepted": e.accepted,
            "rejected": e.rejected,
        }),
        RecordedEvent::Pick(e) => json!({
            "event": "pick",
            "frame": e.frame.get(),
            "family": family_label(e.family),
            "considered": e.considered,
            "picked": e.picked.map(|c| c.0),
            "layer": e.layer.map(|l| l.0),
        }),
        RecordedEvent::CandidateSubmitted(e) => json!({
            "event": "candidate_submitted",
            "frame": e.frame.get(),
            "candidate": e.candidate.0,
            "family": family_label(e.family),
            "eye_distance": e.eye_distance,
        }),
        RecordedEvent::CandidateRejected(e) => json!({
            "event": "candidate_rejected",
            "frame": e.frame.get(),
            "candidate": e.candidate.0,
            "reason": format!("{:?}", e.reason),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use decal_core::candidate::CandidateId;
    use decal_core::error::{RenderError, SizeError};
    use decal_core::frame::FrameId;
    use decal_core::queue::Family;
    use decal_core::trace::{BatchEvent, FailureStage, MessageCode, RenderFailureEvent, TraceSink};
    use decal_core::view::PassKind;

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_batch(&BatchEvent {
            frame: FrameId(3),
            family: Family::Annotation,
            pass: PassKind::Draw,
            entries: 4,
            failures: 1,
        });
        rec.on_render_failure(&RenderFailureEvent {
            frame: FrameId(3),
            code: MessageCode {
                family: Family::Annotation,
                stage: FailureStage::Render,
            },
            candidate: None,
            error: &RenderError::Size(SizeError::NotReady("texture".into())),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 2);

        assert_eq!(parsed[0]["event"], "batch");
        assert_eq!(parsed[0]["family"], "annotation");
        assert_eq!(parsed[0]["entries"], 4);

        assert_eq!(parsed[1]["event"], "render_failure");
        assert_eq!(parsed[1]["code"], "annotation.render_failed");
        assert!(parsed[1]["candidate"].is_null());
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn candidate_ids_are_numbers() {
        let mut rec = RecorderSink::new();
        rec.on_pick(&decal_core::trace::PickEvent {
            frame: FrameId(1),
            family: Family::Icon,
            considered: 2,
            picked: Some(CandidateId(77)),
            layer: None,
        });
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["picked"], 77);
        assert!(parsed[0]["layer"].is_null());
    }
}

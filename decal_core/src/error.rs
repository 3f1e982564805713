// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-candidate failure types.
//!
//! Neither error ever aborts a frame: renderers trap them, report them
//! through the [`Tracer`](crate::trace::Tracer) and treat the candidate as
//! absent for the current frame.

use alloc::string::String;

use crate::queue::Family;

/// Why a candidate's size could not be computed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    /// The candidate has nothing to measure.
    #[error("candidate has no content to measure")]
    Empty,
    /// A resource the size depends on (font, image) is not loaded yet.
    #[error("resource not ready: {0}")]
    NotReady(String),
    /// The text measurer rejected the request.
    #[error("text measurement failed: {0}")]
    Measure(String),
}

/// Why drawing a single candidate failed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// Sizing the candidate failed.
    #[error(transparent)]
    Size(#[from] SizeError),
    /// The candidate could not be projected into the viewport.
    #[error("candidate could not be projected onto the viewport")]
    Unprojectable,
    /// The graphics surface refused the draw call.
    #[error("surface error: {0}")]
    Surface(String),
    /// An entry reached the draw pass with no drawer for its family.
    #[error("no drawer registered for {0:?}")]
    UnhandledFamily(Family),
    /// The candidate's own drawing code failed.
    #[error("{0}")]
    Candidate(String),
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pick lists.
//!
//! Each pick batch gets its own [`PickSupport`]. Drawers register the
//! rectangle each candidate covers as they draw it; when the batch closes the
//! list is resolved against the pick point and dropped. Later registrations
//! are drawn on top, so the last rectangle containing the point wins.

use alloc::vec::Vec;

use decal_core::candidate::{CandidateId, LayerRef};
use kurbo::{Point, Rect};

/// A candidate drawn into a pick list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickCandidate {
    /// The candidate.
    pub candidate: CandidateId,
    /// Layer that submitted it.
    pub layer: Option<LayerRef>,
    /// Screen area it covers.
    pub bounds: Rect,
}

/// The pick list of one batch.
#[derive(Clone, Debug, Default)]
pub struct PickSupport {
    candidates: Vec<PickCandidate>,
}

impl PickSupport {
    /// Creates an empty pick list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a candidate drawn over `bounds`.
    pub fn add(&mut self, candidate: CandidateId, layer: Option<LayerRef>, bounds: Rect) {
        self.candidates.push(PickCandidate {
            candidate,
            layer,
            bounds,
        });
    }

    /// Number of registered candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The topmost registered candidate under `point`.
    #[must_use]
    pub fn resolve(&self, point: Point) -> Option<PickCandidate> {
        self.candidates.iter().rev().find(|c| c.bounds.contains(point)).copied()
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame draw context.
//!
//! A [`DrawContext`] owns everything that lives for exactly one pass: the
//! ordered queue, the layer currently being drawn and the objects resolved by
//! pick batches. It borrows the immutable [`ViewState`] and the [`Globe`].
//! Renderers receive it by `&mut` during submission and the draw pass drains
//! it afterwards.

use alloc::vec::Vec;

use crate::candidate::{CandidateId, LayerRef};
use crate::queue::{Family, OrderedQueue};
use crate::view::{Globe, ViewState};

/// An object resolved by a pick batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickedObject {
    /// The picked candidate.
    pub candidate: CandidateId,
    /// Layer it was submitted by.
    pub layer: Option<LayerRef>,
    /// Family that drew it.
    pub family: Family,
}

/// State owned by one render or pick pass.
pub struct DrawContext<'a, T> {
    view: &'a ViewState,
    globe: &'a dyn Globe,
    queue: OrderedQueue<T>,
    current_layer: Option<LayerRef>,
    picked: Vec<PickedObject>,
}

impl<T> core::fmt::Debug for DrawContext<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DrawContext")
            .field("frame", &self.view.frame)
            .field("queue", &self.queue)
            .field("current_layer", &self.current_layer)
            .field("picked", &self.picked)
            .finish_non_exhaustive()
    }
}

impl<'a, T> DrawContext<'a, T> {
    /// Starts a pass over `view`.
    #[must_use]
    pub fn new(view: &'a ViewState, globe: &'a dyn Globe) -> Self {
        Self {
            view,
            globe,
            queue: OrderedQueue::new(),
            current_layer: None,
            picked: Vec::new(),
        }
    }

    /// The view of this pass.
    #[inline]
    #[must_use]
    pub fn view(&self) -> &'a ViewState {
        self.view
    }

    /// The globe of this pass.
    #[inline]
    #[must_use]
    pub fn globe(&self) -> &'a dyn Globe {
        self.globe
    }

    /// The ordered queue.
    #[inline]
    #[must_use]
    pub fn queue(&self) -> &OrderedQueue<T> {
        &self.queue
    }

    /// The ordered queue, mutably.
    #[inline]
    pub fn queue_mut(&mut self) -> &mut OrderedQueue<T> {
        &mut self.queue
    }

    /// Layer whose entry is being drawn, if any.
    #[inline]
    #[must_use]
    pub fn current_layer(&self) -> Option<LayerRef> {
        self.current_layer
    }

    /// Replaces the current layer, returning the previous one so the caller
    /// can restore it.
    #[inline]
    pub fn swap_layer(&mut self, layer: Option<LayerRef>) -> Option<LayerRef> {
        core::mem::replace(&mut self.current_layer, layer)
    }

    /// Records a resolved pick.
    pub fn add_picked(&mut self, picked: PickedObject) {
        self.picked.push(picked);
    }

    /// Objects resolved so far in this pass, in resolution order.
    #[must_use]
    pub fn picked(&self) -> &[PickedObject] {
        &self.picked
    }

    /// Ends the pass, returning the resolved picks.
    #[must_use]
    pub fn finish(self) -> Vec<PickedObject> {
        self.picked
    }
}

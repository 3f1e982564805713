// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered-renderable queue.
//!
//! Renderers push deferred draw requests during submission; the draw pass
//! pops them far-to-near so that nearer entries, and always-on-top entries
//! (eye distance zero), land on top. Entries with equal distance pop in
//! insertion order.
//!
//! ```text
//!   push(d = 30) ─┐
//!   push(d = 0)  ─┼─► [30, 10, 10', 0] ──► pop order: 30, 10, 10', 0
//!   push(d = 10) ─┤
//!   push(d = 10')─┘
//! ```

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::candidate::{CandidateId, LayerRef};
use crate::geom::Vec3;

/// The renderer family an entry belongs to.
///
/// Consecutive entries of the same family are drawn in one graphics-state
/// scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    /// Annotations and balloons.
    Annotation,
    /// Geographic text labels.
    Text,
    /// Icons and markers.
    Icon,
    /// A host-defined family.
    Other(u32),
}

impl Family {
    /// Short lowercase name, used in message codes.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::Text => "text",
            Self::Icon => "icon",
            Self::Other(_) => "other",
        }
    }
}

/// Items stored in an [`OrderedQueue`].
pub trait Ordered {
    /// Family the item is drawn by.
    fn family(&self) -> Family;

    /// Candidate the item was created from, if any.
    fn candidate(&self) -> Option<CandidateId> {
        None
    }
}

/// A queued item together with its sort key and context.
#[derive(Clone, Debug)]
pub struct OrderedEntry<T> {
    /// The deferred item.
    pub item: T,
    /// Distance from the eye, in meters. Never negative.
    pub eye_distance: f64,
    /// Resolved model-space draw point, for globe-anchored items.
    pub draw_point: Option<Vec3>,
    /// Layer that submitted the item.
    pub layer: Option<LayerRef>,
    seq: u64,
}

impl<T> OrderedEntry<T> {
    /// Insertion sequence number within the current frame.
    #[inline]
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        // Larger distance is "greater" and pops first; on ties the earlier
        // insertion is "greater".
        self.eye_distance
            .total_cmp(&other.eye_distance)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T: Ordered> OrderedEntry<T> {
    /// Family of the wrapped item.
    #[inline]
    #[must_use]
    pub fn family(&self) -> Family {
        self.item.family()
    }
}

struct HeapEntry<T>(OrderedEntry<T>);

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.key_cmp(&other.0) == Ordering::Equal
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key_cmp(&other.0)
    }
}

/// Far-to-near priority queue of deferred draw requests for one frame.
pub struct OrderedQueue<T> {
    heap: BinaryHeap<HeapEntry<T>>,
    next_seq: u64,
}

impl<T> core::fmt::Debug for OrderedQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderedQueue")
            .field("len", &self.heap.len())
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl<T> Default for OrderedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Enqueues `item` at `eye_distance`.
    ///
    /// # Panics
    ///
    /// Panics if `eye_distance` is negative or NaN.
    pub fn push(&mut self, item: T, eye_distance: f64, draw_point: Option<Vec3>, layer: Option<LayerRef>) {
        assert!(eye_distance >= 0.0, "eye distance must be non-negative");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry(OrderedEntry {
            item,
            eye_distance,
            draw_point,
            layer,
            seq,
        }));
    }

    /// Enqueues `item` behind everything else, so it is drawn first.
    pub fn push_behind(&mut self, item: T, layer: Option<LayerRef>) {
        self.push(item, f64::MAX, None, layer);
    }

    /// Puts back an entry previously removed with [`take_where`], keeping
    /// its original sequence number.
    ///
    /// [`take_where`]: Self::take_where
    pub fn reinsert(&mut self, entry: OrderedEntry<T>) {
        self.heap.push(HeapEntry(entry));
    }

    /// The entry [`pop`](Self::pop) would return next.
    #[must_use]
    pub fn peek(&self) -> Option<&OrderedEntry<T>> {
        self.heap.peek().map(|e| &e.0)
    }

    /// Removes and returns the farthest entry.
    pub fn pop(&mut self) -> Option<OrderedEntry<T>> {
        self.heap.pop().map(|e| e.0)
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes every entry matching `pred`, returned in pop order.
    pub fn take_where(&mut self, mut pred: impl FnMut(&OrderedEntry<T>) -> bool) -> Vec<OrderedEntry<T>> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.heap.len());
        for entry in core::mem::take(&mut self.heap).into_sorted_vec().into_iter().rev() {
            if pred(&entry.0) {
                taken.push(entry.0);
            } else {
                kept.push(entry);
            }
        }
        self.heap = BinaryHeap::from(kept);
        taken
    }

    /// Drops every entry and restarts sequence numbering.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }
}

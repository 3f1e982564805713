// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Eligibility, deduplication and ordered queueing for globe and screen
//! decorations.
//!
//! `decal_core` decides which annotations, labels and icons take part in a
//! frame and in what order they are drawn. It is `no_std` compatible (with
//! `alloc`) and knows nothing about a particular graphics API; drawing lives
//! in `decal_render`.
//!
//! # Architecture
//!
//! ```text
//!   FrameClock::advance() ──► ViewState { frame, eye, frustum, … }
//!                                  │
//!                                  ▼
//!   candidates ──► evaluate() ──► SubmissionDedup ──► OrderedQueue::push()
//!                                                         │
//!                 ┌───────────────────────────────────────┘
//!                 ▼
//!   draw pass: pop far-to-near, batch same-family neighbors (decal_render)
//! ```
//!
//! **[`frame`]**: Frame identity and the clock that advances it.
//!
//! **[`geom`]**: Model-space points, geographic positions, frustum and the
//! projection transform.
//!
//! **[`view`]**: Per-frame [`ViewState`](view::ViewState) and the
//! [`Globe`](view::Globe) terrain collaborator.
//!
//! **[`candidate`]**: The [`Candidate`](candidate::Candidate) capability
//! trait every drawable implements.
//!
//! **[`eligibility`]**: The ordered filter chain and eye-distance rule.
//!
//! **[`dedup`]**: Per-frame submission sets for continuous globes.
//!
//! **[`queue`]**: Far-to-near priority queue with stable tie-breaking.
//!
//! **[`context`]**: The per-pass [`DrawContext`](context::DrawContext).
//!
//! **[`submit`]**: Filter, deduplicate and enqueue in one call.
//!
//! **[`error`]**: Per-candidate failure types.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates
//!   per-candidate submit and reject events.
//!
//! The minimum supported Rust version is 1.92.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod candidate;
pub mod context;
pub mod dedup;
pub mod eligibility;
pub mod error;
pub mod frame;
pub mod geom;
pub mod queue;
pub mod submit;
pub mod trace;
pub mod view;

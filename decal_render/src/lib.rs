// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch rendering, decluttering and layout for ordered decorations.
//!
//! `decal_render` drains the far-to-near queue built by `decal_core` and
//! draws it through a host-provided [`Surface`](surface::Surface). Runs of
//! same-family entries share one graphics-state scope; a failure in one
//! entry is traced and the run carries on.
//!
//! ```text
//!   DrawContext::queue ──► draw_ordered ──► render_batch (per family run)
//!                                              │
//!                     BatchDrawer::arrange ◄───┤  declutter (text)
//!                     BatchDrawer::draw    ◄───┘  depth policy, pick list
//! ```
//!
//! **[`surface`]**: The graphics boundary and the recording [`DrawPlan`](surface::DrawPlan).
//!
//! **[`batch`]**: [`BatchDrawer`](batch::BatchDrawer) and the batch loop.
//!
//! **[`pick`]**: Per-batch pick lists.
//!
//! **[`declutter`]**: Overlap filtering and distance scaling of labels.
//!
//! **[`depth`]**: Terrain-aware depth tests for labels and icons.
//!
//! **[`layout`]**: Flow layout of child decorations.
//!
//! **[`annotation`]**, **[`text`]**, **[`icon`]**: The built-in renderers,
//! sharing the [`Drawable`](drawable::Drawable) queue item.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables tracing in `decal_core`.
//!
//! The minimum supported Rust version is 1.92.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod annotation;
pub mod batch;
pub mod declutter;
pub mod depth;
pub mod drawable;
pub mod icon;
pub mod layout;
pub mod pick;
pub mod surface;
pub mod text;

#[cfg(test)]
mod testing;

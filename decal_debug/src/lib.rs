// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, log forwarding, recording and JSON export for decal
//! diagnostics.
//!
//! This crate provides [`TraceSink`](decal_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`log_sink::LogSink`]: forwards events to the `log` facade.
//! - [`recorder::RecorderSink`]: compact binary recording, played back with
//!   [`recorder::decode`].
//! - [`json::export`]: writes recorded bytes as a JSON array.

pub mod json;
pub mod log_sink;
pub mod pretty;
pub mod recorder;

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame identity.
//!
//! A [`FrameId`] is an opaque, monotonically increasing token naming one
//! render pass. Submissions that carry equal ids belong to the same pass;
//! per-frame scratch state (deduplication sets, declutter claims) is cleared
//! when the id changes.
//!
//! [`FrameClock`] is the single owner that advances the id, once per frame.
//! Everything else in the crate only reads it.

use core::fmt;

/// An opaque frame token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The id before any frame has been rendered.
    pub const ZERO: Self = Self(0);

    /// Returns the raw counter value (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one.
    ///
    /// Saturates at `u64::MAX`.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

/// Advances the [`FrameId`] once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    current: FrameId,
}

impl FrameClock {
    /// Creates a clock positioned at [`FrameId::ZERO`].
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: FrameId::ZERO,
        }
    }

    /// Creates a clock positioned at `start`.
    #[inline]
    #[must_use]
    pub const fn starting_at(start: FrameId) -> Self {
        Self { current: start }
    }

    /// The id of the frame currently being rendered.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> FrameId {
        self.current
    }

    /// Moves to the next frame and returns its id.
    #[inline]
    pub fn advance(&mut self) -> FrameId {
        self.current = self.current.next();
        self.current
    }
}

// Copyright 2026 the Decal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The item type queued by the built-in renderers.

use alloc::rc::Rc;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use decal_core::candidate::{Candidate, CandidateId};
use decal_core::queue::{Family, Ordered};

use crate::annotation::Annotation;
use crate::icon::Icon;
use crate::text::GeographicText;

/// Identity of one renderer instance.
///
/// Every entry a built-in renderer queues is stamped with its id, and the
/// renderer only draws entries carrying it. Two renderers of the same family
/// can share a queue this way, each drawing its own items with its own
/// configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RendererId(u32);

impl RendererId {
    /// A process-wide unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A shared handle to something the built-in renderers draw, plus the
/// renderer that queued it.
///
/// Hosts own their decorations and hand out clones of the `Rc`; the queue
/// keeps them alive for one pass.
#[derive(Clone)]
pub enum Drawable {
    /// An annotation or balloon.
    Annotation(Rc<dyn Annotation>, RendererId),
    /// A geographic text label.
    Text(Rc<GeographicText>, RendererId),
    /// An icon.
    Icon(Rc<Icon>, RendererId),
}

impl Drawable {
    /// Identity of the wrapped candidate.
    #[must_use]
    pub fn id(&self) -> CandidateId {
        match self {
            Self::Annotation(a, _) => a.id(),
            Self::Text(t, _) => t.id(),
            Self::Icon(i, _) => i.id(),
        }
    }

    /// The renderer that queued this item.
    #[must_use]
    pub fn renderer(&self) -> RendererId {
        match self {
            Self::Annotation(_, r) | Self::Text(_, r) | Self::Icon(_, r) => *r,
        }
    }
}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Annotation(..) => "Annotation",
            Self::Text(..) => "Text",
            Self::Icon(..) => "Icon",
        };
        f.debug_tuple(name).field(&self.id()).field(&self.renderer()).finish()
    }
}

impl Ordered for Drawable {
    fn family(&self) -> Family {
        match self {
            Self::Annotation(..) => Family::Annotation,
            Self::Text(..) => Family::Text,
            Self::Icon(..) => Family::Icon,
        }
    }

    fn candidate(&self) -> Option<CandidateId> {
        Some(self.id())
    }
}

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty tracking.
//!
//! Two mechanisms cooperate:
//!
//! - **Per-node [`DirtyFlags`]** drive lazy, pull-based recomputation. Each
//!   flag marks one piece of cached derived state as stale; the first read
//!   after invalidation recomputes it and clears the flag for that node only.
//! - **Frame channels** ([`TRANSFORM`], [`RENDER`], [`TOPOLOGY`]) are
//!   [`understory_dirty`] channels that record *which* nodes changed since the
//!   last [`Scene::evaluate`](crate::scene::Scene::evaluate), so the renderer
//!   can apply incremental updates. They never gate recomputation.
//!
//! # Propagation
//!
//! - [`Scene::set_transform_dirty`](crate::scene::Scene::set_transform_dirty)
//!   marks the node `TRANSFORM | BOUNDS | RENDER`, every descendant
//!   `WORLD | WORLD_INV | RENDER`, and every ancestor `BOUNDS | ANCHOR`.
//! - [`Scene::set_render_dirty`](crate::scene::Scene::set_render_dirty) marks
//!   the node `RENDER | BOUNDS` and every ancestor `BOUNDS`.
//!
//! A node with `WORLD` set implies every descendant has `WORLD` set: marking
//! always covers whole subtrees, and resolution clears ancestors before
//! descendants. Downward marking therefore stops at an already-stale child.

use understory_dirty::Channel;

bitflags::bitflags! {
    /// Stale derived state of one node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// Local matrix must be rebuilt from position/rotation/scale/pivot.
        const LOCAL = 1 << 0;
        /// World matrix must be recomposed with the parent's.
        const WORLD = 1 << 1;
        /// Inverse world matrix must be recomputed.
        const WORLD_INV = 1 << 2;
        /// Cached parent-space bounds are stale.
        const BOUNDS = 1 << 3;
        /// Anchor-derived pivot must be recomputed from bounds.
        const ANCHOR = 1 << 4;
        /// Render-affecting state changed (opacity, visibility, tint, ...).
        const RENDER = 1 << 5;

        /// Everything transform-related.
        const TRANSFORM = Self::LOCAL.bits() | Self::WORLD.bits() | Self::WORLD_INV.bits();
        /// What a descendant inherits when an ancestor moves.
        const INHERITED = Self::WORLD.bits() | Self::WORLD_INV.bits() | Self::RENDER.bits();
    }
}

/// Local, world or inverse transform changed. Propagates eagerly to
/// descendants through child-to-parent dependency edges.
pub const TRANSFORM: Channel = Channel::new(0);

/// Render-affecting state changed. Local-only.
pub const RENDER: Channel = Channel::new(1);

/// Tree topology changed. Triggers a traversal-order rebuild.
pub const TOPOLOGY: Channel = Channel::new(2);

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Lazy resolution keeps individual reads correct at any time; evaluation is
//! the once-per-frame pass that brings *every* node up to date and reports
//! what changed since the previous frame:
//!
//! 1. **Topology**: rebuild the depth-first traversal order if the tree
//!    changed.
//! 2. **Transforms**: resolve every world-stale node in traversal order
//!    (parents before children), including the inverse.
//! 3. **Change log**: drain the `TRANSFORM`, `RENDER` and `TOPOLOGY`
//!    channels and move the lifecycle lists into [`FrameChanges`].
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than [`NodeId`]
//! handles so renderers can index the scene directly through the `*_at()`
//! accessors (e.g. [`world_transform_at`](super::Scene::world_transform_at)).
//!
//! [`NodeId`]: super::NodeId

use alloc::vec::Vec;

use super::id::INVALID;
use super::store::Scene;
use crate::dirty::{self, DirtyFlags};

/// The set of changes produced by a single [`Scene::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Nodes whose world transform changed (directly or through an ancestor).
    pub transforms: Vec<u32>,
    /// Nodes whose render state changed.
    pub render: Vec<u32>,
    /// Nodes created since the last evaluate.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.render.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.render.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl Scene {
    /// Brings every node up to date and returns the frame's changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let order = core::mem::take(&mut self.traversal_order);
        for &idx in &order {
            if self.flags[idx as usize].intersects(DirtyFlags::WORLD | DirtyFlags::WORLD_INV) {
                let _ = self.resolve_world_inverse(idx);
            }
        }
        self.traversal_order = order;

        changes.transforms = self
            .tracker
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        changes.render = self
            .tracker
            .drain(dirty::RENDER)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();
        for &idx in &changes.render {
            self.flags[idx as usize].remove(DirtyFlags::RENDER);
        }
        for &idx in &changes.transforms {
            self.flags[idx as usize].remove(DirtyFlags::RENDER);
        }

        // Consumed by the traversal rebuild above.
        let _: Vec<u32> = self
            .tracker
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order over all
    /// roots, in slot order).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        let mut order = core::mem::take(&mut self.traversal_order);
        order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.alive[idx as usize] {
                self.dfs(idx, &mut |n| order.push(n));
            }
        }
        self.traversal_order = order;
    }
}

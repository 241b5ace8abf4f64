// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds queries.
//!
//! A node's bounds in a target space are its own geometry (clip rectangle,
//! else content rectangle) mapped into that space, united with the bounds of
//! every descendant in the same space. A clip rectangle stops the expansion:
//! a clipped node reports only its clip.
//!
//! Only the most common query is cached: parent space, children included,
//! no clip. The cached value stays valid until
//! [`DirtyFlags::BOUNDS`] is raised on the node, which any transform or render
//! change in its subtree does.

use super::id::{INVALID, NodeId};
use super::store::Scene;
use crate::dirty::DirtyFlags;
use crate::error::SceneError;
use crate::geometry::{Affine, Rect, Vec2, transform_rect, union};

/// The coordinate space of a bounds query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    /// The node's own space.
    Own,
    /// The node's parent space (root space for a detached node).
    Parent,
    /// The space of another node.
    Of(NodeId),
    /// Root space: the space above the topmost ancestor.
    Root,
}

impl Scene {
    /// Returns the bounds of `id` in `space`.
    ///
    /// With `include_children` the result also covers every descendant,
    /// unless the node has a clip rectangle. Rotation and skew enlarge the
    /// result to the axis-aligned box around the transformed corners.
    ///
    /// # Panics
    ///
    /// Panics if `id` (or the node named by [`Space::Of`]) is stale.
    pub fn bounds(&mut self, id: NodeId, space: Space, include_children: bool) -> Rect {
        self.validate(id);
        let target = match space {
            Space::Own => Some(id.idx),
            Space::Parent => self.parent_slot(id.idx),
            Space::Of(other) => {
                self.validate(other);
                Some(other.idx)
            }
            Space::Root => None,
        };
        self.bounds_in(id.idx, target, include_children)
    }

    /// Width of the node's parent-space bounds, children included.
    pub fn width(&mut self, id: NodeId) -> f64 {
        self.bounds(id, Space::Parent, true).width()
    }

    /// Height of the node's parent-space bounds, children included.
    pub fn height(&mut self, id: NodeId) -> f64 {
        self.bounds(id, Space::Parent, true).height()
    }

    /// Scales the node horizontally so its parent-space width becomes `width`.
    ///
    /// Does nothing if the node has no horizontal extent.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_width(&mut self, id: NodeId, width: f64) -> Result<(), SceneError> {
        self.validate(id);
        self.check_unlocked(id.idx, "width")?;
        let own = self.bounds(id, Space::Own, true).width();
        if own == 0.0 {
            return Ok(());
        }
        self.set_scale_x(id, width / own)
    }

    /// Scales the node vertically so its parent-space height becomes
    /// `height`.
    ///
    /// Does nothing if the node has no vertical extent.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_height(&mut self, id: NodeId, height: f64) -> Result<(), SceneError> {
        self.validate(id);
        self.check_unlocked(id.idx, "height")?;
        let own = self.bounds(id, Space::Own, true).height();
        if own == 0.0 {
            return Ok(());
        }
        self.set_scale_y(id, height / own)
    }

    fn parent_slot(&self, idx: u32) -> Option<u32> {
        let p = self.parent[idx as usize];
        (p != INVALID).then_some(p)
    }

    /// `space` is a node slot, or `None` for root space.
    fn bounds_in(&mut self, idx: u32, space: Option<u32>, include_children: bool) -> Rect {
        let i = idx as usize;
        let clip = self.display[i].clip;
        let in_parent_space = space == self.parent_slot(idx);

        let mut out = if space == Some(idx) {
            let _ = self.resolve_local(idx);
            self.outer_geometry(idx)
        } else if in_parent_space {
            if include_children && clip.is_none() && !self.flags[i].contains(DirtyFlags::BOUNDS)
            {
                self.stats.bounds_cache_hits += 1;
                return self.bounds_cache[i];
            }
            let local = self.resolve_local(idx);
            transform_rect(local, self.outer_geometry(idx))
        } else {
            let m = self.relative_transform(idx, space);
            transform_rect(m, self.outer_geometry(idx))
        };

        if clip.is_some() || !include_children {
            return out;
        }

        let mut child = self.first_child[i];
        while child != INVALID {
            let child_bounds = self.bounds_in(child, space, true);
            union(&mut out, child_bounds);
            child = self.next_sibling[child as usize];
        }

        if in_parent_space {
            self.bounds_cache[i] = out;
            self.flags[i].remove(DirtyFlags::BOUNDS);
        }
        out
    }

    /// Own geometry without children: the clip rectangle shifted by the pivot,
    /// else the content rectangle. Expects the pivot resolved.
    pub(crate) fn outer_geometry(&self, idx: u32) -> Rect {
        match self.display[idx as usize].clip {
            // Shifted in own space, before any transform, so bounds agree
            // with the hit mask under rotation and scale. Do not reorder.
            Some(clip) => clip + self.pivot[idx as usize],
            None => self.local_bounds(idx),
        }
    }

    /// Maps from `idx`'s own space into `space`.
    fn relative_transform(&mut self, idx: u32, space: Option<u32>) -> Affine {
        let world = self.resolve_world(idx);
        match space {
            Some(target) => self.resolve_world_inverse(target) * world,
            None => world,
        }
    }

    /// Bounds in own space with children, composed from local transforms
    /// only. Used to derive anchored pivots.
    pub(crate) fn own_space_bounds(&mut self, idx: u32) -> Rect {
        let mut out = self.local_bounds(idx);
        if self.display[idx as usize].clip.is_some() {
            return out;
        }
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let extent = self.subtree_extent(child);
            union(&mut out, extent);
            child = self.next_sibling[child as usize];
        }
        out
    }

    /// Bounds of `idx` with children in its parent's space, via locals.
    fn subtree_extent(&mut self, idx: u32) -> Rect {
        let local = self.resolve_local(idx);
        let inner = if self.display[idx as usize].clip.is_some() {
            self.outer_geometry(idx)
        } else {
            self.own_space_bounds(idx)
        };
        transform_rect(local, inner)
    }

    /// Pivot in effect: anchor × own bounds size + bounds origin + offset.
    pub(crate) fn compute_pivot(&mut self, idx: u32) -> Vec2 {
        let props = self.props[idx as usize];
        match props.anchor {
            None => props.pivot_offset,
            Some(anchor) => {
                let b = self.own_space_bounds(idx);
                Vec2::new(
                    anchor.x * b.width() + b.x0 + props.pivot_offset.x,
                    anchor.y * b.height() + b.y0 + props.pivot_offset.y,
                )
            }
        }
    }
}

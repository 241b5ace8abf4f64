// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, transform
//! components and lazy matrix resolution.

use alloc::string::String;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::display::DisplayProps;
use super::id::{INVALID, NodeId};
use super::traverse::Children;
use crate::dirty::{self, DirtyFlags};
use crate::driver::{RendererFactory, RendererId, RendererKind};
use crate::error::{GuardPolicy, SceneError};
use crate::geometry::{Affine, Point, Pool, PoolStats, Rect, Vec2, local_matrix};

/// Local transform components of a node.
///
/// The local matrix is derived from these on demand; see
/// [`local_matrix`](crate::geometry::local_matrix).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformProps {
    /// Position in parent space.
    pub x: f64,
    /// Position in parent space.
    pub y: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Rotation in radians.
    pub rotation: f64,
    /// Pivot in own space, added to the anchor-derived pivot.
    pub pivot_offset: Vec2,
    /// Pivot as a fraction of the node's own bounds (with children), if any.
    pub anchor: Option<Vec2>,
}

impl Default for TransformProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            pivot_offset: Vec2::ZERO,
            anchor: None,
        }
    }
}

/// Sentinel counters for dirty marking and lazy resolution.
///
/// Tests use these to check that redundant assignments are free and that
/// cached values are actually reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Calls that marked a node's transform dirty.
    pub transform_dirty_calls: u64,
    /// Calls that marked a node's render state dirty.
    pub render_dirty_calls: u64,
    /// Local matrices rebuilt.
    pub local_recomputes: u64,
    /// World matrices recomposed.
    pub world_recomputes: u64,
    /// Parent-space bounds served from the cache.
    pub bounds_cache_hits: u64,
}

/// Struct-of-arrays storage for all nodes of a scene.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed slots are recycled via a free list and
/// generation counters reject stale handles.
///
/// Derived state (local, world and inverse world matrices, anchor pivots,
/// parent-space bounds) is cached per node and recomputed lazily on read when
/// its [`DirtyFlags`] say it is stale.
#[derive(Debug)]
pub struct Scene {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) child_count: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) props: Vec<TransformProps>,
    pub(crate) name: Vec<Option<String>>,
    pub(crate) display: Vec<DisplayProps>,
    pub(crate) kind: Vec<RendererKind>,
    pub(crate) renderer: Vec<RendererId>,

    // -- Derived state (resolved lazily) --
    pub(crate) flags: Vec<DirtyFlags>,
    pub(crate) local: Vec<Affine>,
    pub(crate) world: Vec<Affine>,
    pub(crate) world_inv: Vec<Affine>,
    pub(crate) pivot: Vec<Vec2>,
    pub(crate) bounds_cache: Vec<Rect>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Stage root --
    pub(crate) locked: Option<u32>,
    pub(crate) locked_local: Affine,
    pub(crate) guard: GuardPolicy,

    // -- Frame change log --
    pub(crate) tracker: DirtyTracker<u32>,
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    // -- Scratch --
    pub(crate) scratch: Pool<Vec<u32>>,
    pub(crate) stats: SceneStats,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            child_count: Vec::new(),
            props: Vec::new(),
            name: Vec::new(),
            display: Vec::new(),
            kind: Vec::new(),
            renderer: Vec::new(),
            flags: Vec::new(),
            local: Vec::new(),
            world: Vec::new(),
            world_inv: Vec::new(),
            pivot: Vec::new(),
            bounds_cache: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            locked: None,
            locked_local: Affine::IDENTITY,
            guard: GuardPolicy::default(),
            tracker: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            scratch: Pool::with_capacity(4),
            stats: SceneStats::default(),
        }
    }

    /// Sets what guards do on misuse.
    pub fn set_guard_policy(&mut self, policy: GuardPolicy) {
        self.guard = policy;
    }

    /// Returns the current guard policy.
    #[must_use]
    pub fn guard_policy(&self) -> GuardPolicy {
        self.guard
    }

    /// Returns the dirty-marking and resolution counters.
    #[must_use]
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Returns usage counters of the scratch-buffer pool.
    #[must_use]
    pub fn scratch_stats(&self) -> PoolStats {
        self.scratch.stats()
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts detached, at the origin, unscaled and unrotated, fully
    /// opaque and visible. Its renderer is requested from `factory` once, here,
    /// and cached for the node's lifetime.
    pub fn create_node<F>(&mut self, kind: RendererKind, factory: &mut F) -> NodeId
    where
        F: RendererFactory + ?Sized,
    {
        let fresh = DirtyFlags::TRANSFORM | DirtyFlags::BOUNDS | DirtyFlags::RENDER;
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.child_count[i] = 0;
            self.props[i] = TransformProps::default();
            self.name[i] = None;
            self.display[i] = DisplayProps::default();
            self.kind[i] = kind;
            self.flags[i] = fresh;
            self.local[i] = Affine::IDENTITY;
            self.world[i] = Affine::IDENTITY;
            self.world_inv[i] = Affine::IDENTITY;
            self.pivot[i] = Vec2::ZERO;
            self.bounds_cache[i] = Rect::ZERO;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.child_count.push(0);
            self.props.push(TransformProps::default());
            self.name.push(None);
            self.display.push(DisplayProps::default());
            self.kind.push(kind);
            self.renderer.push(RendererId::default());
            self.flags.push(fresh);
            self.local.push(Affine::IDENTITY);
            self.world.push(Affine::IDENTITY);
            self.world_inv.push(Affine::IDENTITY);
            self.pivot.push(Vec2::ZERO);
            self.bounds_cache.push(Rect::ZERO);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        let id = NodeId {
            idx,
            generation: self.generation[idx as usize],
        };
        self.renderer[idx as usize] = factory.renderer_for(kind, id);

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.tracker.mark(idx, dirty::TOPOLOGY);
        self.tracker.mark(idx, dirty::TRANSFORM);
        id
    }

    /// Destroys a node together with its whole subtree, freeing the slots.
    ///
    /// The node is detached from its parent first. Handles to any destroyed
    /// node become stale.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] if `id` is the stage root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.validate(id);
        self.check_unlocked(id.idx, "destroy")?;
        if self.parent[id.idx as usize] != INVALID {
            self.detach(id.idx);
        }

        let mut doomed = self.scratch.get();
        self.collect_subtree(id.idx, &mut doomed);
        for &idx in &doomed {
            let i = idx as usize;
            self.tracker.remove_key(idx);
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.child_count[i] = 0;
            self.name[i] = None;
            // Bump generation so old handles immediately fail validation.
            self.generation[i] = self.generation[i].wrapping_add(1);
            self.alive[i] = false;
            self.free_list.push(idx);
            self.pending_removed.push(idx);
        }
        self.scratch.release(doomed);
        self.traversal_dirty = true;
        Ok(())
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Adds `child` as the last (front-most) child of `parent`.
    ///
    /// A child that already has a parent is moved.
    ///
    /// # Errors
    ///
    /// - [`SceneError::Cycle`] if `child` is `parent` or one of its ancestors.
    /// - [`SceneError::StageLocked`] if `child` is the stage root.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Inserts `child` at position `index` among `parent`'s children.
    ///
    /// Index 0 is the back-most child; an index past the end appends. A child
    /// that already has a parent is removed from it first, so re-adding to the
    /// same parent moves it to `index` of the shortened list.
    ///
    /// # Errors
    ///
    /// See [`add_child`](Self::add_child).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        self.validate(parent);
        self.validate(child);
        let (p, c) = (parent.idx, child.idx);
        self.check_unlocked(c, "parent")?;
        if self.is_ancestor_or_self(c, p) {
            return Err(self.guard.raise(SceneError::Cycle));
        }

        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }
        let before = self.nth_child(p, index);
        self.link(p, c, before);
        let _ = self.tracker.add_dependency(c, p, dirty::TRANSFORM);

        self.mark_transform(c);
        self.traversal_dirty = true;
        self.tracker.mark(p, dirty::TOPOLOGY);
        Ok(())
    }

    /// Detaches a node from its parent. Does nothing for a detached node.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] if `child` is the stage root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_from_parent(&mut self, child: NodeId) -> Result<(), SceneError> {
        self.validate(child);
        self.check_unlocked(child.idx, "remove_from_parent")?;
        if self.parent[child.idx as usize] == INVALID {
            return Ok(());
        }
        self.detach(child.idx);
        self.mark_transform(child.idx);
        Ok(())
    }

    /// Moves `child` to position `index` among its siblings.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAChild`] if `child` has no parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_child_index(&mut self, child: NodeId, index: usize) -> Result<(), SceneError> {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        if p == INVALID {
            return Err(self.guard.raise(SceneError::NotAChild));
        }
        if self.position_of(c) == index {
            return Ok(());
        }
        self.unlink(c);
        let before = self.nth_child(p, index);
        self.link(p, c, before);
        self.traversal_dirty = true;
        self.tracker.mark(p, dirty::TOPOLOGY);
        self.set_render_dirty_idx(c);
        Ok(())
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, back to front.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn num_children(&self, id: NodeId) -> usize {
        self.validate(id);
        self.child_count[id.idx as usize] as usize
    }

    /// Returns the child at `index`, if any.
    #[must_use]
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.validate(parent);
        self.handle(self.nth_child(parent.idx, index))
    }

    /// Returns the position of `child` among its siblings, or `None` if it is
    /// detached.
    #[must_use]
    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        self.validate(child);
        if self.parent[child.idx as usize] == INVALID {
            None
        } else {
            Some(self.position_of(child.idx))
        }
    }

    /// Returns the first direct child with the given name.
    #[must_use]
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .find(|c| self.name[c.idx as usize].as_deref() == Some(name))
    }

    /// Returns the live nodes that have no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && self.alive[idx as usize])
            .filter_map(|idx| self.handle(idx))
            .collect()
    }

    /// Returns the renderer requested for this node at creation.
    #[must_use]
    pub fn renderer(&self, id: NodeId) -> RendererId {
        self.validate(id);
        self.renderer[id.idx as usize]
    }

    /// Returns the renderer kind the node was created with.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> RendererKind {
        self.validate(id);
        self.kind[id.idx as usize]
    }

    // -- Transform components --

    /// Returns the transform components of a node.
    #[must_use]
    pub fn transform_props(&self, id: NodeId) -> TransformProps {
        self.validate(id);
        self.props[id.idx as usize]
    }

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.name[id.idx as usize].as_deref()
    }

    /// Sets the node's name.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) -> Result<(), SceneError> {
        self.validate(id);
        self.check_unlocked(id.idx, "name")?;
        self.name[id.idx as usize] = name;
        Ok(())
    }

    /// Sets the horizontal position.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_x(&mut self, id: NodeId, x: f64) -> Result<(), SceneError> {
        self.set_component(id, "x", |p| replace(&mut p.x, x))
    }

    /// Sets the vertical position.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_y(&mut self, id: NodeId, y: f64) -> Result<(), SceneError> {
        self.set_component(id, "y", |p| replace(&mut p.y, y))
    }

    /// Sets both position components.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), SceneError> {
        self.set_component(id, "position", |p| {
            replace(&mut p.x, x) | replace(&mut p.y, y)
        })
    }

    /// Sets the horizontal scale.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_scale_x(&mut self, id: NodeId, scale_x: f64) -> Result<(), SceneError> {
        self.set_component(id, "scale_x", |p| replace(&mut p.scale_x, scale_x))
    }

    /// Sets the vertical scale.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_scale_y(&mut self, id: NodeId, scale_y: f64) -> Result<(), SceneError> {
        self.set_component(id, "scale_y", |p| replace(&mut p.scale_y, scale_y))
    }

    /// Sets both scale components to `scale`.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_scale(&mut self, id: NodeId, scale: f64) -> Result<(), SceneError> {
        self.set_component(id, "scale", |p| {
            replace(&mut p.scale_x, scale) | replace(&mut p.scale_y, scale)
        })
    }

    /// Sets the rotation in radians.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_rotation(&mut self, id: NodeId, rotation: f64) -> Result<(), SceneError> {
        self.set_component(id, "rotation", |p| replace(&mut p.rotation, rotation))
    }

    /// Sets the pivot offset (own space).
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_pivot_offset(&mut self, id: NodeId, offset: Vec2) -> Result<(), SceneError> {
        self.set_component(id, "pivot_offset", |p| {
            replace(&mut p.pivot_offset, offset)
        })?;
        self.flags[id.idx as usize] |= DirtyFlags::ANCHOR;
        Ok(())
    }

    /// Sets the anchor, a fraction of the node's own bounds used as pivot.
    ///
    /// `Some(Vec2::new(0.5, 0.5))` pivots about the centre of the node's
    /// content and children. `None` leaves only the pivot offset.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`] on the stage root.
    pub fn set_anchor(&mut self, id: NodeId, anchor: Option<Vec2>) -> Result<(), SceneError> {
        self.set_component(id, "anchor", |p| replace(&mut p.anchor, anchor))?;
        self.flags[id.idx as usize] |= DirtyFlags::ANCHOR;
        Ok(())
    }

    /// Returns the pivot currently in effect, resolving the anchor if needed.
    pub fn pivot(&mut self, id: NodeId) -> Vec2 {
        self.validate(id);
        let _ = self.resolve_local(id.idx);
        self.pivot[id.idx as usize]
    }

    // -- Matrices --

    /// Returns the local transform, rebuilding it if stale.
    pub fn local_transform(&mut self, id: NodeId) -> Affine {
        self.validate(id);
        self.resolve_local(id.idx)
    }

    /// Returns the world transform (parent world × local), resolving stale
    /// ancestors first.
    pub fn world_transform(&mut self, id: NodeId) -> Affine {
        self.validate(id);
        self.resolve_world(id.idx)
    }

    /// Returns the inverse of the world transform.
    pub fn world_transform_inverse(&mut self, id: NodeId) -> Affine {
        self.validate(id);
        self.resolve_world_inverse(id.idx)
    }

    /// Maps a point from the node's own space to root space.
    pub fn local_to_global(&mut self, id: NodeId, point: Point) -> Point {
        self.world_transform(id) * point
    }

    /// Maps a point from root space to the node's own space.
    pub fn global_to_local(&mut self, id: NodeId, point: Point) -> Point {
        self.world_transform_inverse(id) * point
    }

    /// Returns the node's current dirty flags.
    #[must_use]
    pub fn dirty_flags(&self, id: NodeId) -> DirtyFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    // -- Invalidation --

    /// Marks the node's transform stale.
    ///
    /// The node gets `TRANSFORM | BOUNDS | RENDER`, each descendant
    /// `WORLD | WORLD_INV | RENDER`, and each ancestor `BOUNDS` (plus a
    /// transform refresh when the ancestor is anchored).
    pub fn set_transform_dirty(&mut self, id: NodeId) {
        self.validate(id);
        self.mark_transform(id.idx);
    }

    /// Marks the node's render state stale: the node gets `RENDER | BOUNDS`
    /// and each ancestor `BOUNDS`.
    pub fn set_render_dirty(&mut self, id: NodeId) {
        self.validate(id);
        self.set_render_dirty_idx(id.idx);
    }

    // -- Raw-index accessors for renderers --
    //
    // These take raw slot indices (as found in `FrameChanges` or
    // `traversal_order()`) and read the cached values without resolving.
    // They are current right after `evaluate`.

    /// Returns the cached world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Affine {
        self.check_slot(idx);
        self.world[idx as usize]
    }

    /// Returns the parent slot of raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn parent_at(&self, idx: u32) -> Option<u32> {
        self.check_slot(idx);
        let p = self.parent[idx as usize];
        (p != INVALID).then_some(p)
    }

    /// Returns the renderer of raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn renderer_at(&self, idx: u32) -> RendererId {
        self.check_slot(idx);
        self.renderer[idx as usize]
    }

    /// Returns the cached pivot at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn pivot_at(&self, idx: u32) -> Vec2 {
        self.check_slot(idx);
        self.pivot[idx as usize]
    }

    /// Returns the handle for raw slot `idx`, if it is live.
    #[must_use]
    pub fn node_at(&self, idx: u32) -> Option<NodeId> {
        if idx < self.len && self.alive[idx as usize] {
            self.handle(idx)
        } else {
            None
        }
    }

    // -- Stage root --

    /// Makes `idx` the locked stage root: its geometry setters and topology
    /// changes are rejected and its local matrix comes from
    /// [`set_locked_local`](Self::set_locked_local).
    pub(crate) fn lock_root(&mut self, idx: u32) {
        self.locked = Some(idx);
        self.mark_transform(idx);
    }

    /// Replaces the stage root's local matrix.
    pub(crate) fn set_locked_local(&mut self, m: Affine) {
        self.locked_local = m;
        if let Some(idx) = self.locked {
            self.mark_transform(idx);
        }
    }

    /// Returns whether `id` is the locked stage root.
    #[must_use]
    pub fn is_locked(&self, id: NodeId) -> bool {
        self.locked == Some(id.idx)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn check_slot(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    pub(crate) fn handle(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| NodeId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Rejects `property` on the stage root.
    pub(crate) fn check_unlocked(
        &self,
        idx: u32,
        property: &'static str,
    ) -> Result<(), SceneError> {
        if self.locked == Some(idx) {
            Err(self.guard.raise(SceneError::StageLocked { property }))
        } else {
            Ok(())
        }
    }

    fn set_component(
        &mut self,
        id: NodeId,
        property: &'static str,
        apply: impl FnOnce(&mut TransformProps) -> bool,
    ) -> Result<(), SceneError> {
        self.validate(id);
        self.check_unlocked(id.idx, property)?;
        if apply(&mut self.props[id.idx as usize]) {
            self.mark_transform(id.idx);
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: u32, mut node: u32) -> bool {
        while node != INVALID {
            if node == candidate {
                return true;
            }
            node = self.parent[node as usize];
        }
        false
    }

    /// Slot of the child at `index`, or [`INVALID`] past the end.
    fn nth_child(&self, parent: u32, index: usize) -> u32 {
        let mut child = self.first_child[parent as usize];
        for _ in 0..index {
            if child == INVALID {
                break;
            }
            child = self.next_sibling[child as usize];
        }
        child
    }

    fn position_of(&self, idx: u32) -> usize {
        let mut n = 0;
        let mut prev = self.prev_sibling[idx as usize];
        while prev != INVALID {
            n += 1;
            prev = self.prev_sibling[prev as usize];
        }
        n
    }

    /// Links detached `c` under `p` in front of `before` ([`INVALID`] appends).
    fn link(&mut self, p: u32, c: u32, before: u32) {
        let (pi, ci) = (p as usize, c as usize);
        self.parent[ci] = p;
        let prev = if before == INVALID {
            self.last_child[pi]
        } else {
            self.prev_sibling[before as usize]
        };
        self.prev_sibling[ci] = prev;
        self.next_sibling[ci] = before;
        if prev == INVALID {
            self.first_child[pi] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }
        if before == INVALID {
            self.last_child[pi] = c;
        } else {
            self.prev_sibling[before as usize] = c;
        }
        self.child_count[pi] += 1;
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i] as usize;
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev == INVALID {
            self.first_child[p] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }
        self.child_count[p] -= 1;

        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }

    /// Unlinks `idx` and invalidates what the old parent derived from it.
    fn detach(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.unlink(idx);
        self.tracker.remove_dependency(idx, p, dirty::TRANSFORM);
        self.mark_bounds_upward(p);
        self.traversal_dirty = true;
        self.tracker.mark(p, dirty::TOPOLOGY);
    }

    /// Pre-order slots of the subtree rooted at `idx`.
    pub(crate) fn collect_subtree(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut cursor = out.len() - 1;
        while cursor < out.len() {
            let mut child = self.first_child[out[cursor] as usize];
            while child != INVALID {
                out.push(child);
                child = self.next_sibling[child as usize];
            }
            cursor += 1;
        }
    }

    pub(crate) fn mark_transform(&mut self, idx: u32) {
        self.stats.transform_dirty_calls += 1;
        self.flags[idx as usize] |= DirtyFlags::TRANSFORM | DirtyFlags::BOUNDS | DirtyFlags::RENDER;
        self.mark_descendants(idx);
        self.mark_bounds_upward(self.parent[idx as usize]);
        self.tracker.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
    }

    pub(crate) fn set_render_dirty_idx(&mut self, idx: u32) {
        self.stats.render_dirty_calls += 1;
        self.flags[idx as usize] |= DirtyFlags::RENDER | DirtyFlags::BOUNDS;
        self.invalidate_bake(idx);
        self.mark_bounds_upward(self.parent[idx as usize]);
        self.tracker.mark(idx, dirty::RENDER);
    }

    /// Marks every descendant of `idx` with [`DirtyFlags::INHERITED`],
    /// skipping subtrees whose root is already world-stale.
    fn mark_descendants(&mut self, idx: u32) {
        let mut stack = self.scratch.get();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            stack.push(child);
            child = self.next_sibling[child as usize];
        }
        while let Some(n) = stack.pop() {
            let flags = &mut self.flags[n as usize];
            if flags.contains(DirtyFlags::WORLD) {
                continue;
            }
            *flags |= DirtyFlags::INHERITED;
            let mut child = self.first_child[n as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
        self.scratch.release(stack);
    }

    /// Marks `start` and all its ancestors `BOUNDS`. Anchored ones also get
    /// their pivot and transform invalidated, since the pivot follows the
    /// bounds.
    fn mark_bounds_upward(&mut self, start: u32) {
        let mut node = start;
        while node != INVALID {
            let i = node as usize;
            self.flags[i] |= DirtyFlags::BOUNDS;
            self.invalidate_bake(node);
            if self.props[i].anchor.is_some() && !self.flags[i].contains(DirtyFlags::ANCHOR) {
                self.flags[i] |= DirtyFlags::ANCHOR | DirtyFlags::TRANSFORM | DirtyFlags::RENDER;
                self.mark_descendants(node);
                self.tracker.mark_with(node, dirty::TRANSFORM, &EagerPolicy);
            }
            node = self.parent[i];
        }
    }

    /// Content under a bitmap-cached node changed, so its bake is stale.
    fn invalidate_bake(&mut self, idx: u32) {
        let d = &mut self.display[idx as usize];
        if d.cache_as_bitmap {
            d.bitmap.dirty = true;
        }
    }

    /// Rebuilds the local matrix (and anchored pivot) of `idx` if stale.
    pub(crate) fn resolve_local(&mut self, idx: u32) -> Affine {
        let i = idx as usize;
        if self.flags[i].contains(DirtyFlags::ANCHOR) {
            self.flags[i].remove(DirtyFlags::ANCHOR);
            let pivot = self.compute_pivot(idx);
            if pivot != self.pivot[i] {
                self.pivot[i] = pivot;
                self.flags[i] |= DirtyFlags::LOCAL;
            }
        }
        if self.flags[i].contains(DirtyFlags::LOCAL) {
            self.local[i] = if self.locked == Some(idx) {
                self.locked_local
            } else {
                let p = &self.props[i];
                let pivot = self.pivot[i];
                local_matrix(p.x, p.y, p.rotation, p.scale_x, p.scale_y, pivot.x, pivot.y)
            };
            self.flags[i].remove(DirtyFlags::LOCAL);
            self.stats.local_recomputes += 1;
        }
        self.local[i]
    }

    /// Resolves the world matrix of `idx`, recomposing stale ancestors
    /// top-down first.
    pub(crate) fn resolve_world(&mut self, idx: u32) -> Affine {
        if !self.flags[idx as usize].contains(DirtyFlags::WORLD) {
            return self.world[idx as usize];
        }
        // A clean node has clean ancestors, so the stale chain ends at the
        // first clean ancestor.
        let mut chain = self.scratch.get();
        let mut node = idx;
        while node != INVALID && self.flags[node as usize].contains(DirtyFlags::WORLD) {
            chain.push(node);
            node = self.parent[node as usize];
        }
        for &n in chain.iter().rev() {
            let local = self.resolve_local(n);
            let p = self.parent[n as usize];
            self.world[n as usize] = if p == INVALID {
                local
            } else {
                self.world[p as usize] * local
            };
            self.flags[n as usize].remove(DirtyFlags::WORLD);
            self.stats.world_recomputes += 1;
        }
        self.scratch.release(chain);
        self.world[idx as usize]
    }

    pub(crate) fn resolve_world_inverse(&mut self, idx: u32) -> Affine {
        let world = self.resolve_world(idx);
        let i = idx as usize;
        if self.flags[i].contains(DirtyFlags::WORLD_INV) {
            self.world_inv[i] = world.inverse();
            self.flags[i].remove(DirtyFlags::WORLD_INV);
        }
        self.world_inv[i]
    }
}

/// Assigns `value` and reports whether it differed.
pub(crate) fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use core::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::driver::RecordingDriver;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        let d = a - b;
        d > -EPS && d < EPS
    }

    fn node(scene: &mut Scene, driver: &mut RecordingDriver) -> NodeId {
        scene.create_node(RendererKind::DisplayObject, driver)
    }

    #[test]
    fn create_and_destroy() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let id = node(&mut scene, &mut d);
        assert!(scene.is_alive(id));
        scene.destroy(id).unwrap();
        assert!(!scene.is_alive(id));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let id1 = node(&mut scene, &mut d);
        scene.destroy(id1).unwrap();
        let id2 = node(&mut scene, &mut d);
        assert!(!scene.is_alive(id1));
        assert!(scene.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn renderer_is_requested_once_at_creation() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = scene.create_node(RendererKind::Sprite, &mut d);
        let b = scene.create_node(RendererKind::Text, &mut d);
        assert_eq!(d.requests, vec![(RendererKind::Sprite, a), (RendererKind::Text, b)]);
        assert_eq!(scene.renderer(a), RendererId(0));
        assert_eq!(scene.renderer(b), RendererId(1));
        scene.set_x(a, 3.0).unwrap();
        let _ = scene.world_transform(a);
        assert_eq!(d.requests.len(), 2);
    }

    #[test]
    fn destroy_frees_subtree() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let root = node(&mut scene, &mut d);
        let mid = node(&mut scene, &mut d);
        let leaf = node(&mut scene, &mut d);
        scene.add_child(root, mid).unwrap();
        scene.add_child(mid, leaf).unwrap();

        scene.destroy(mid).unwrap();
        assert!(scene.is_alive(root));
        assert!(!scene.is_alive(mid));
        assert!(!scene.is_alive(leaf));
        assert_eq!(scene.num_children(root), 0);
    }

    #[test]
    fn add_child_and_query() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        scene.add_child(parent, a).unwrap();
        scene.add_child(parent, b).unwrap();

        assert_eq!(scene.parent(a), Some(parent));
        let kids: Vec<_> = scene.children(parent).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(scene.num_children(parent), 2);
        assert_eq!(scene.child_at(parent, 1), Some(b));
        assert_eq!(scene.child_at(parent, 2), None);
        assert_eq!(scene.index_of(b), Some(1));
        assert_eq!(scene.index_of(parent), None);
    }

    #[test]
    fn add_child_at_inserts_and_moves() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        let c = node(&mut scene, &mut d);
        scene.add_child(parent, a).unwrap();
        scene.add_child(parent, c).unwrap();
        scene.add_child_at(parent, b, 1).unwrap();
        assert_eq!(scene.children(parent).collect::<Vec<_>>(), vec![a, b, c]);

        scene.add_child_at(parent, c, 0).unwrap();
        assert_eq!(scene.children(parent).collect::<Vec<_>>(), vec![c, a, b]);
        assert_eq!(scene.num_children(parent), 3);
    }

    #[test]
    fn adding_to_another_parent_moves() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let p1 = node(&mut scene, &mut d);
        let p2 = node(&mut scene, &mut d);
        let child = node(&mut scene, &mut d);
        scene.add_child(p1, child).unwrap();
        scene.add_child(p2, child).unwrap();
        assert_eq!(scene.parent(child), Some(p2));
        assert_eq!(scene.num_children(p1), 0);
    }

    #[test]
    fn set_child_index_reorders() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        let c = node(&mut scene, &mut d);
        for n in [a, b, c] {
            scene.add_child(parent, n).unwrap();
        }
        scene.set_child_index(a, 2).unwrap();
        assert_eq!(scene.children(parent).collect::<Vec<_>>(), vec![b, c, a]);
        assert_eq!(scene.set_child_index(parent, 0), Err(SceneError::NotAChild));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        scene.add_child(a, b).unwrap();
        assert_eq!(scene.add_child(b, a), Err(SceneError::Cycle));
        assert_eq!(scene.add_child(a, a), Err(SceneError::Cycle));
        assert_eq!(scene.parent(a), None);
    }

    #[test]
    fn remove_from_parent_detaches() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let child = node(&mut scene, &mut d);
        scene.add_child(parent, child).unwrap();
        scene.remove_from_parent(child).unwrap();
        assert_eq!(scene.parent(child), None);
        assert!(scene.children(parent).next().is_none());
        // Detached nodes are left alone.
        scene.remove_from_parent(child).unwrap();
    }

    #[test]
    fn roots_returns_parentless_nodes() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        let c = node(&mut scene, &mut d);
        scene.add_child(a, c).unwrap();
        let roots = scene.roots();
        assert!(roots.contains(&a));
        assert!(roots.contains(&b));
        assert!(!roots.contains(&c));
    }

    #[test]
    fn child_by_name_finds_first_match() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let a = node(&mut scene, &mut d);
        scene.add_child(parent, a).unwrap();
        scene.set_name(a, Some("hero".into())).unwrap();
        assert_eq!(scene.child_by_name(parent, "hero"), Some(a));
        assert_eq!(scene.child_by_name(parent, "villain"), None);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_world_transform() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let id = node(&mut scene, &mut d);
        scene.destroy(id).unwrap();
        let _ = scene.world_transform(id);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let root = node(&mut scene, &mut d);
        let id = node(&mut scene, &mut d);
        scene.destroy(id).unwrap();
        let _ = scene.add_child(root, id);
    }

    #[test]
    fn world_is_parent_world_times_local() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let child = node(&mut scene, &mut d);
        scene.add_child(parent, child).unwrap();
        scene.set_position(parent, 10.0, 20.0).unwrap();
        scene.set_scale(parent, 2.0).unwrap();
        scene.set_position(child, 5.0, 0.0).unwrap();

        assert_eq!(scene.world_transform(parent), scene.local_transform(parent));
        let p = scene.local_to_global(child, Point::ORIGIN);
        assert!(close(p.x, 20.0) && close(p.y, 20.0), "got {p:?}");
    }

    #[test]
    fn stale_parent_is_never_read() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let parent = node(&mut scene, &mut d);
        let child = node(&mut scene, &mut d);
        scene.add_child(parent, child).unwrap();
        let _ = scene.world_transform(child);

        scene.set_x(parent, 7.0).unwrap();
        let p = scene.local_to_global(child, Point::ORIGIN);
        assert!(close(p.x, 7.0), "child must see the parent's new position");
        assert!(!scene.dirty_flags(parent).contains(DirtyFlags::WORLD));
    }

    #[test]
    fn round_trip_through_world_transform() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        let c = node(&mut scene, &mut d);
        scene.add_child(a, b).unwrap();
        scene.add_child(b, c).unwrap();
        scene.set_position(a, 13.0, -4.0).unwrap();
        scene.set_rotation(a, 0.4).unwrap();
        scene.set_scale_x(b, 1.5).unwrap();
        scene.set_scale_y(b, 0.25).unwrap();
        scene.set_pivot_offset(b, Vec2::new(3.0, 9.0)).unwrap();
        scene.set_rotation(c, -1.1).unwrap();
        scene.set_position(c, 2.0, 8.0).unwrap();

        for p in [Point::new(0.0, 0.0), Point::new(17.5, -3.25), Point::new(-100.0, 40.0)] {
            let global = scene.local_to_global(c, p);
            let back = scene.global_to_local(c, global);
            assert!(close(back.x, p.x) && close(back.y, p.y), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn transform_dirty_reaches_descendants() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        let c = node(&mut scene, &mut d);
        scene.add_child(a, b).unwrap();
        scene.add_child(b, c).unwrap();
        let _ = scene.world_transform(c);
        assert!(!scene.dirty_flags(c).contains(DirtyFlags::WORLD));

        scene.set_transform_dirty(a);
        assert!(scene.dirty_flags(a).contains(DirtyFlags::TRANSFORM | DirtyFlags::BOUNDS));
        assert!(scene.dirty_flags(b).contains(DirtyFlags::INHERITED));
        assert!(scene.dirty_flags(c).contains(DirtyFlags::INHERITED));
        assert!(!scene.dirty_flags(c).contains(DirtyFlags::LOCAL));
    }

    #[test]
    fn transform_dirty_marks_ancestor_bounds() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        let b = node(&mut scene, &mut d);
        let c = node(&mut scene, &mut d);
        scene.add_child(a, b).unwrap();
        scene.add_child(b, c).unwrap();
        let _ = scene.bounds(a, crate::scene::Space::Parent, true);
        assert!(!scene.dirty_flags(a).contains(DirtyFlags::BOUNDS));

        scene.set_y(c, 1.0).unwrap();
        assert!(scene.dirty_flags(a).contains(DirtyFlags::BOUNDS));
        assert!(scene.dirty_flags(b).contains(DirtyFlags::BOUNDS));
        assert!(!scene.dirty_flags(a).contains(DirtyFlags::WORLD));
    }

    #[test]
    fn redundant_assignment_is_free() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        scene.set_x(a, 5.0).unwrap();
        scene.set_rotation(a, FRAC_PI_2).unwrap();
        let before = scene.stats();

        scene.set_x(a, 5.0).unwrap();
        scene.set_rotation(a, FRAC_PI_2).unwrap();
        scene.set_scale(a, 1.0).unwrap();
        scene.set_anchor(a, None).unwrap();
        assert_eq!(scene.stats().transform_dirty_calls, before.transform_dirty_calls);
    }

    #[test]
    fn anchor_centres_pivot_on_content() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        scene.set_content_size(a, Some(crate::geometry::Size::new(40.0, 20.0)));
        scene.set_anchor(a, Some(Vec2::new(0.5, 0.5))).unwrap();
        scene.set_position(a, 100.0, 100.0).unwrap();
        assert_eq!(scene.pivot(a), Vec2::new(20.0, 10.0));

        let centre = scene.local_to_global(a, Point::new(20.0, 10.0));
        assert!(close(centre.x, 100.0) && close(centre.y, 100.0));
    }

    #[test]
    fn anchor_follows_child_growth() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let a = node(&mut scene, &mut d);
        let kid = node(&mut scene, &mut d);
        scene.add_child(a, kid).unwrap();
        scene.set_content_size(kid, Some(crate::geometry::Size::new(10.0, 10.0)));
        scene.set_anchor(a, Some(Vec2::new(1.0, 0.0))).unwrap();
        assert_eq!(scene.pivot(a), Vec2::new(10.0, 0.0));

        scene.set_content_size(kid, Some(crate::geometry::Size::new(30.0, 10.0)));
        assert_eq!(scene.pivot(a), Vec2::new(30.0, 0.0));
    }
}

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit testing.
//!
//! A node takes part only when it is visible, has a touchable [`Input`]
//! attached and the point falls inside its clip rectangle (if any). Children
//! are tried front to back and the deepest hit wins; the node itself is tried
//! last, against its [`HitArea`].

use super::id::{INVALID, NodeId};
use super::store::Scene;
use crate::geometry::{Point, Rect, contains, is_zero_area};

/// The shape a node answers hit tests with, in its own space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum HitArea {
    /// The node's own-space bounds: the pivot-shifted clip rectangle, else
    /// the content rectangle.
    #[default]
    Bounds,
    /// A fixed rectangle.
    Rect(Rect),
    /// A circle.
    Circle {
        /// Centre in own space.
        center: Point,
        /// Radius.
        radius: f64,
    },
    /// Any point. The stage uses this to catch input in letterbox margins.
    Everywhere,
    /// No point; only children can be hit.
    Nothing,
}

/// Input capability attached to a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    /// Whether the node (and so its subtree) takes part in hit testing.
    pub touchable: bool,
}

impl Scene {
    /// Returns the input capability attached to the node, if any.
    #[must_use]
    pub fn input(&self, id: NodeId) -> Option<Input> {
        self.validate(id);
        self.display[id.idx as usize].input
    }

    /// Attaches or detaches the input capability.
    pub fn set_input(&mut self, id: NodeId, input: Option<Input>) {
        self.validate(id);
        self.display[id.idx as usize].input = input;
    }

    /// Attaches an input capability with the given `touchable` state.
    pub fn set_touchable(&mut self, id: NodeId, touchable: bool) {
        self.set_input(id, Some(Input { touchable }));
    }

    /// Returns the node's hit area.
    #[must_use]
    pub fn hit_area(&self, id: NodeId) -> HitArea {
        self.validate(id);
        self.display[id.idx as usize].hit_area
    }

    /// Sets the node's hit area.
    pub fn set_hit_area(&mut self, id: NodeId, area: HitArea) {
        self.validate(id);
        self.display[id.idx as usize].hit_area = area;
    }

    /// Returns the deepest node under `point` (root space) in the subtree of
    /// `id`, front-most first.
    pub fn hit_test(&mut self, id: NodeId, point: Point) -> Option<NodeId> {
        self.validate(id);
        let hit = self.hit_test_idx(id.idx, point);
        hit.and_then(|idx| self.handle(idx))
    }

    fn hit_test_idx(&mut self, idx: u32, point: Point) -> Option<u32> {
        let d = &self.display[idx as usize];
        let visible = d.visible;
        let touchable = d.input.is_some_and(|input| input.touchable);
        if !visible || !touchable || !self.inside_mask(idx, point) {
            return None;
        }

        let mut child = self.last_child[idx as usize];
        while child != INVALID {
            if let Some(hit) = self.hit_test_idx(child, point) {
                return Some(hit);
            }
            child = self.prev_sibling[child as usize];
        }

        self.hits_self(idx, point).then_some(idx)
    }

    /// Clip-rectangle mask, relative to the pivot.
    fn inside_mask(&mut self, idx: u32, point: Point) -> bool {
        let Some(clip) = self.display[idx as usize].clip else {
            return true;
        };
        let local = self.resolve_world_inverse(idx) * point;
        let pivot = self.pivot[idx as usize];
        contains(clip, local - pivot)
    }

    fn hits_self(&mut self, idx: u32, point: Point) -> bool {
        let area = self.display[idx as usize].hit_area;
        match area {
            HitArea::Nothing => false,
            HitArea::Everywhere => true,
            HitArea::Bounds => {
                let local = self.to_local(idx, point);
                let bounds = self.outer_geometry(idx);
                !is_zero_area(bounds) && contains(bounds, local)
            }
            HitArea::Rect(rect) => contains(rect, self.to_local(idx, point)),
            HitArea::Circle { center, radius } => {
                let d = self.to_local(idx, point) - center;
                d.hypot2() <= radius * radius
            }
        }
    }

    fn to_local(&mut self, idx: u32, point: Point) -> Point {
        self.resolve_world_inverse(idx) * point
    }
}

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::Scene;

/// An iterator over the direct children of a node, back to front.
///
/// Created by [`Scene::children`].
#[derive(Debug)]
pub struct Children<'a> {
    scene: &'a Scene,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(scene: &'a Scene, first: u32) -> Self {
        Self {
            scene,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.scene.next_sibling[idx as usize];
        Some(NodeId {
            idx,
            generation: self.scene.generation[idx as usize],
        })
    }
}

impl Scene {
    /// Returns the handles of the subtree rooted at `id` in depth-first
    /// pre-order (paint order), `id` first.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> alloc::vec::Vec<NodeId> {
        self.validate(id);
        let mut out = alloc::vec::Vec::new();
        self.dfs(id.idx, &mut |idx| out.push(idx));
        out.into_iter().filter_map(|idx| self.handle(idx)).collect()
    }

    /// Depth-first pre-order walk from `idx`.
    pub(crate) fn dfs(&self, idx: u32, visit: &mut impl FnMut(u32)) {
        visit(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs(child, visit);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use crate::driver::{RecordingDriver, RendererKind};
    use crate::scene::Scene;

    #[test]
    fn descendants_are_in_paint_order() {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let [a, b, c, e] = [(); 4].map(|()| scene.create_node(RendererKind::DisplayObject, &mut d));
        // Tree: a -> [b -> [e], c]
        scene.add_child(a, b).unwrap();
        scene.add_child(a, c).unwrap();
        scene.add_child(b, e).unwrap();
        assert_eq!(scene.descendants(a), vec![a, b, e, c]);
        assert_eq!(scene.descendants(c), vec![c]);
    }
}

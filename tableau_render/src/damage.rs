// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use alloc::vec::Vec;

use tableau_core::geometry::{Rect, is_zero_area};
use tableau_core::scene::{FrameChanges, Scene, Space};

/// A region of the output that needs re-rendering.
///
/// Backends can use this to redraw only the areas that changed since the last
/// frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// Root-space rectangles that need redrawing.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::Full, _) | (_, Self::None) => {}
            (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (Self::Rects(a), Self::Rects(b)) => a.extend_from_slice(b),
        }
    }

    /// Returns the bounding box of the damage, or `None` when there is
    /// nothing to redraw or everything is.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::Full | Self::None => None,
        }
    }
}

/// Remembers where each node was last drawn so a frame's changes can be
/// turned into damage.
#[derive(Clone, Debug, Default)]
pub struct DamageTracker {
    last: Vec<Rect>,
}

impl DamageTracker {
    /// Creates a tracker with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the damage of one evaluated frame.
    ///
    /// Every node that moved, changed appearance or was removed damages both
    /// where it was and where it is now (its own geometry in root space;
    /// changed children are listed separately). A topology change damages
    /// everything.
    pub fn collect(&mut self, scene: &mut Scene, changes: &FrameChanges) -> DamageRegion {
        let mut rects = Vec::new();

        for &idx in &changes.removed {
            if let Some(old) = self.last.get_mut(idx as usize) {
                push_rect(&mut rects, core::mem::replace(old, Rect::ZERO));
            }
        }

        let mut changed: Vec<u32> = changes
            .transforms
            .iter()
            .chain(&changes.render)
            .copied()
            .collect();
        changed.sort_unstable();
        changed.dedup();

        for idx in changed {
            let Some(id) = scene.node_at(idx) else {
                continue;
            };
            let now = scene.bounds(id, Space::Root, false);
            let i = idx as usize;
            if self.last.len() <= i {
                self.last.resize(i + 1, Rect::ZERO);
            }
            let before = core::mem::replace(&mut self.last[i], now);
            push_rect(&mut rects, before);
            if now != before {
                push_rect(&mut rects, now);
            }
        }

        if changes.topology_changed {
            DamageRegion::Full
        } else if rects.is_empty() {
            DamageRegion::None
        } else {
            DamageRegion::Rects(rects)
        }
    }

    /// Forgets all history.
    pub fn reset(&mut self) {
        self.last.clear();
    }
}

fn push_rect(rects: &mut Vec<Rect>, rect: Rect) {
    if !is_zero_area(rect) {
        rects.push(rect);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use tableau_core::driver::{RecordingDriver, RendererKind};
    use tableau_core::geometry::Size;

    use super::*;

    #[test]
    fn merge_rules() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(5.0, 5.0, 6.0, 6.0);

        let mut d = DamageRegion::None;
        d.merge(&DamageRegion::Rects(vec![a]));
        d.merge(&DamageRegion::Rects(vec![b]));
        assert_eq!(d, DamageRegion::Rects(vec![a, b]));
        assert_eq!(d.bounding_box(), Some(Rect::new(0.0, 0.0, 6.0, 6.0)));

        d.merge(&DamageRegion::None);
        assert_eq!(d, DamageRegion::Rects(vec![a, b]));
        d.merge(&DamageRegion::Full);
        assert_eq!(d, DamageRegion::Full);
        d.merge(&DamageRegion::Rects(vec![a]));
        assert_eq!(d, DamageRegion::Full);
    }

    #[test]
    fn moving_a_node_damages_old_and_new_positions() {
        let mut drv = RecordingDriver::default();
        let mut scene = Scene::new();
        let root = scene.create_node(RendererKind::DisplayObject, &mut drv);
        let sprite = scene.create_node(RendererKind::Sprite, &mut drv);
        scene.add_child(root, sprite).unwrap();
        scene.set_content_size(sprite, Some(Size::new(10.0, 10.0)));

        let mut tracker = DamageTracker::new();
        let changes = scene.evaluate();
        assert_eq!(tracker.collect(&mut scene, &changes), DamageRegion::Full);

        let changes = scene.evaluate();
        assert_eq!(tracker.collect(&mut scene, &changes), DamageRegion::None);

        scene.set_x(sprite, 100.0).unwrap();
        let changes = scene.evaluate();
        assert_eq!(
            tracker.collect(&mut scene, &changes),
            DamageRegion::Rects(vec![
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(100.0, 0.0, 110.0, 10.0),
            ])
        );
    }

    #[test]
    fn appearance_change_damages_in_place() {
        let mut drv = RecordingDriver::default();
        let mut scene = Scene::new();
        let sprite = scene.create_node(RendererKind::Sprite, &mut drv);
        scene.set_content_size(sprite, Some(Size::new(10.0, 10.0)));
        let mut tracker = DamageTracker::new();
        let changes = scene.evaluate();
        let _ = tracker.collect(&mut scene, &changes);

        scene.set_alpha(sprite, 0.5).unwrap();
        let changes = scene.evaluate();
        assert_eq!(
            tracker.collect(&mut scene, &changes),
            DamageRegion::Rects(vec![Rect::new(0.0, 0.0, 10.0, 10.0)])
        );
    }
}

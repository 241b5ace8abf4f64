// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the ordered draw items of one frame.

use alloc::vec::Vec;

use tableau_core::driver::{RendererId, RendererKind, TextureId};
use tableau_core::geometry::{Affine, Rect, round_half_up, with_translation};
use tableau_core::scene::{BlendMode, NodeId, Scene};

/// A single draw command.
///
/// Alpha, tint and blend mode are already combined with the node's
/// ancestors.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The node this item draws.
    pub node: NodeId,
    /// Which renderer kind the node asked for.
    pub kind: RendererKind,
    /// The node's renderer.
    pub renderer: RendererId,
    /// Own space to root space, translation snapped if the node asks for it.
    pub world_transform: Affine,
    /// Product of the alphas on the path from the plan root.
    pub alpha: f64,
    /// Nearest tint on the path from the plan root, the node's own first.
    pub color: Option<u32>,
    /// Blend mode, with [`BlendMode::Auto`] resolved from the ancestors.
    pub blend_mode: BlendMode,
    /// Clip rectangle in own space, if any. It applies to the whole subtree.
    pub clip: Option<Rect>,
    /// Depth below the plan root.
    pub depth: u32,
    /// A finished bitmap bake that stands in for the whole subtree.
    pub bitmap: Option<TextureId>,
}

#[derive(Clone, Copy)]
struct Inherited {
    alpha: f64,
    color: Option<u32>,
    blend_mode: BlendMode,
}

/// The draw items of a frame, back to front.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draw items in paint order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens the subtree of `root`.
    ///
    /// World transforms are read from the scene's caches, so call
    /// [`Scene::evaluate`] first.
    #[must_use]
    pub fn build(scene: &Scene, root: NodeId) -> Self {
        let mut plan = Self::new();
        plan.rebuild(scene, root);
        plan
    }

    /// Like [`build`](Self::build), reusing this plan's storage.
    pub fn rebuild(&mut self, scene: &Scene, root: NodeId) {
        self.items.clear();
        let top = Inherited {
            alpha: 1.0,
            color: None,
            blend_mode: BlendMode::Normal,
        };
        self.visit(scene, root, top, 0);
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn visit(&mut self, scene: &Scene, id: NodeId, parent: Inherited, depth: u32) {
        let idx = id.index();
        let (alpha, visible, blend_mode, color) = scene.appearance_at(idx);
        let state = Inherited {
            alpha: parent.alpha * alpha,
            color: color.or(parent.color),
            blend_mode: match blend_mode {
                BlendMode::Auto => parent.blend_mode,
                other => other,
            },
        };
        if !visible || state.alpha <= 0.0 {
            return;
        }

        let mut world_transform = scene.world_transform_at(idx);
        if scene.snap_to_pixels_at(idx) {
            let t = world_transform.translation();
            world_transform =
                with_translation(world_transform, round_half_up(t.x), round_half_up(t.y));
        }
        let bake = scene.bitmap_cache(id);
        let bitmap = if scene.cache_as_bitmap(id) && !bake.dirty {
            bake.texture
        } else {
            None
        };

        self.items.push(RenderItem {
            node: id,
            kind: scene.kind(id),
            renderer: scene.renderer_at(idx),
            world_transform,
            alpha: state.alpha,
            color: state.color,
            blend_mode: state.blend_mode,
            clip: scene.clip_rect_at(idx).map(|clip| clip + scene.pivot_at(idx)),
            depth,
            bitmap,
        });

        if bitmap.is_some() {
            return;
        }
        for child in scene.children(id) {
            self.visit(scene, child, state, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use tableau_core::driver::RecordingDriver;
    use tableau_core::geometry::{Point, Size, Vec2};

    use super::*;

    struct Fixture {
        scene: Scene,
        root: NodeId,
        child: NodeId,
        grandchild: NodeId,
    }

    fn fixture() -> Fixture {
        let mut d = RecordingDriver::default();
        let mut scene = Scene::new();
        let root = scene.create_node(RendererKind::DisplayObject, &mut d);
        let child = scene.create_node(RendererKind::Sprite, &mut d);
        let grandchild = scene.create_node(RendererKind::Text, &mut d);
        scene.add_child(root, child).unwrap();
        scene.add_child(child, grandchild).unwrap();
        Fixture {
            scene,
            root,
            child,
            grandchild,
        }
    }

    fn item(plan: &RenderPlan, node: NodeId) -> &RenderItem {
        plan.items.iter().find(|i| i.node == node).unwrap()
    }

    #[test]
    fn items_are_in_paint_order_with_depth() {
        let mut f = fixture();
        let _ = f.scene.evaluate();
        let plan = RenderPlan::build(&f.scene, f.root);
        let nodes: Vec<_> = plan.items.iter().map(|i| (i.node, i.depth)).collect();
        assert_eq!(nodes, [(f.root, 0), (f.child, 1), (f.grandchild, 2)]);
        assert_eq!(plan.items[1].kind, RendererKind::Sprite);
        assert_eq!(plan.items[2].renderer, RendererId(2));
    }

    #[test]
    fn alpha_multiplies_down_the_tree() {
        let mut f = fixture();
        f.scene.set_alpha(f.root, 0.5).unwrap();
        f.scene.set_alpha(f.child, 0.5).unwrap();
        let _ = f.scene.evaluate();
        let plan = RenderPlan::build(&f.scene, f.root);
        assert_eq!(item(&plan, f.grandchild).alpha, 0.25);
    }

    #[test]
    fn invisible_or_transparent_subtrees_are_skipped() {
        let mut f = fixture();
        f.scene.set_visible(f.child, false);
        let _ = f.scene.evaluate();
        assert_eq!(RenderPlan::build(&f.scene, f.root).items.len(), 1);

        f.scene.set_visible(f.child, true);
        f.scene.set_alpha(f.child, 0.0).unwrap();
        let _ = f.scene.evaluate();
        assert_eq!(RenderPlan::build(&f.scene, f.root).items.len(), 1);
    }

    #[test]
    fn tint_and_blend_are_inherited_unless_overridden() {
        let mut f = fixture();
        f.scene.set_color(f.root, Some(0xff_00_00));
        f.scene.set_blend_mode(f.child, BlendMode::Add);
        f.scene.set_color(f.grandchild, Some(0x00_ff_00));
        let _ = f.scene.evaluate();
        let plan = RenderPlan::build(&f.scene, f.root);

        assert_eq!(item(&plan, f.root).blend_mode, BlendMode::Normal);
        assert_eq!(item(&plan, f.child).color, Some(0xff_00_00));
        assert_eq!(item(&plan, f.child).blend_mode, BlendMode::Add);
        assert_eq!(item(&plan, f.grandchild).color, Some(0x00_ff_00));
        assert_eq!(item(&plan, f.grandchild).blend_mode, BlendMode::Add);
    }

    #[test]
    fn clip_is_reported_in_own_space() {
        let mut f = fixture();
        f.scene.set_pivot_offset(f.child, Vec2::new(5.0, 5.0)).unwrap();
        f.scene.set_clip_rect(f.child, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let _ = f.scene.evaluate();
        let plan = RenderPlan::build(&f.scene, f.root);
        assert_eq!(item(&plan, f.child).clip, Some(Rect::new(5.0, 5.0, 15.0, 15.0)));
    }

    #[test]
    fn snapping_rounds_the_translation() {
        let mut f = fixture();
        f.scene.set_position(f.child, 10.4, 20.6).unwrap();
        f.scene.set_snap_to_pixels(f.child, true);
        let _ = f.scene.evaluate();
        let plan = RenderPlan::build(&f.scene, f.root);
        assert_eq!(
            item(&plan, f.child).world_transform * Point::ORIGIN,
            Point::new(10.0, 21.0)
        );
        // The child's own snapping does not leak into its children.
        assert_eq!(
            item(&plan, f.grandchild).world_transform * Point::ORIGIN,
            Point::new(10.4, 20.6)
        );
    }

    #[test]
    fn clean_bake_replaces_the_subtree() {
        let mut f = fixture();
        f.scene.set_content_size(f.grandchild, Some(Size::new(4.0, 4.0)));
        f.scene.set_cache_as_bitmap(f.child, true);
        let _ = f.scene.evaluate();
        assert_eq!(RenderPlan::build(&f.scene, f.root).items.len(), 3);

        f.scene.store_bitmap_cache(
            f.child,
            TextureId(7),
            Affine::IDENTITY,
            Rect::new(0.0, 0.0, 4.0, 4.0),
        );
        let mut plan = RenderPlan::new();
        plan.rebuild(&f.scene, f.root);
        assert_eq!(plan.items.len(), 2);
        assert_eq!(item(&plan, f.child).bitmap, Some(TextureId(7)));
    }
}

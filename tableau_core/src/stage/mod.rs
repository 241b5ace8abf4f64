// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: root of the scene, mapped onto the viewport.
//!
//! [`Stage`] owns a [`Scene`] and its root node. The root's placement is
//! never set directly; it is derived by [`compute_layout`] from the viewport
//! size, the logical size and the scale and orientation settings. Changing any
//! of those re-runs the layout (a *refresh*), which:
//!
//! 1. publishes the new [`StageLayout`] and the root's local matrix,
//! 2. tells the renderer factory about the resize,
//! 3. marks the root's transform dirty,
//! 4. posts a [`StageResize`] to subscribers.
//!
//! A refresh always posts, even when the numbers did not change.
//!
//! Geometry and identity setters on the root (`x`, `rotation`, `name`, ...)
//! are rejected with [`SceneError::StageLocked`], whether they are called
//! through the stage or through the scene with the root's handle.

mod layout;

pub use layout::{ScaleMode, StageInput, StageLayout, StageOrientation, compute_layout};

use alloc::string::String;

use crate::config::StageConfig;
use crate::driver::{RendererFactory, RendererKind};
use crate::error::{GuardPolicy, SceneError};
use crate::geometry::{Point, Rect, Size, Vec2};
use crate::message::Listeners;
use crate::scene::{HitArea, NodeId, Scene};
use crate::viewport::{DeviceOrientation, Viewport};

/// Posted after every stage refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageResize {
    /// Viewport size the layout was computed for.
    pub viewport: Size,
    /// Resulting stage size in logical units.
    pub stage: Size,
    /// Resulting scale factor.
    pub scale_factor: f64,
}

/// Viewport facts captured at the last refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
struct StageEnv {
    viewport: Size,
    device_orientation: DeviceOrientation,
    device_pixel_ratio: f64,
}

/// The scene root, scaled and placed to fit the viewport.
#[derive(Debug)]
pub struct Stage {
    scene: Scene,
    root: NodeId,
    logical: Size,
    scale_mode: ScaleMode,
    orientation: StageOrientation,
    orientation_lock: bool,
    env: StageEnv,
    layout: StageLayout,
    listeners: Listeners<StageResize>,
}

impl Stage {
    /// Creates a stage with an empty scene.
    ///
    /// The layout stays at its default until the first
    /// [`refresh`](Self::refresh).
    pub fn new<F>(config: &StageConfig, factory: &mut F) -> Self
    where
        F: RendererFactory + ?Sized,
    {
        Self::with_scene(Scene::new(), config, factory)
    }

    /// Creates a stage whose root is added to `scene`.
    pub fn with_scene<F>(mut scene: Scene, config: &StageConfig, factory: &mut F) -> Self
    where
        F: RendererFactory + ?Sized,
    {
        let root = scene.create_node(RendererKind::DisplayObject, factory);
        // Not locked yet, so these cannot fail.
        let _ = scene.set_name(root, Some(String::from("stage")));
        scene.set_hit_area(root, HitArea::Everywhere);
        scene.set_touchable(root, true);
        scene.lock_root(root.idx);

        Self {
            scene,
            root,
            logical: config.logical_size(),
            scale_mode: config.scale_mode,
            orientation: config.orientation,
            orientation_lock: config.orientation_lock,
            env: StageEnv {
                viewport: Size::ZERO,
                device_orientation: DeviceOrientation::Landscape,
                device_pixel_ratio: config.device_pixel_ratio,
            },
            layout: StageLayout::default(),
            listeners: Listeners::new(),
        }
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Sets the guard policy of the underlying scene.
    pub fn set_guard_policy(&mut self, policy: GuardPolicy) {
        self.scene.set_guard_policy(policy);
    }

    /// Appends `child` to the root.
    ///
    /// # Errors
    ///
    /// See [`Scene::add_child`].
    pub fn add_child(&mut self, child: NodeId) -> Result<(), SceneError> {
        self.scene.add_child(self.root, child)
    }

    /// Returns the deepest touchable node under `point` (viewport pixels).
    pub fn hit_test(&mut self, point: Point) -> Option<NodeId> {
        self.scene.hit_test(self.root, point)
    }

    /// Stage resize subscribers.
    pub fn listeners_mut(&mut self) -> &mut Listeners<StageResize> {
        &mut self.listeners
    }

    // -- Layout inputs --

    /// Sets the logical size and refreshes.
    pub fn set_size<F>(&mut self, width: f64, height: f64, factory: &mut F) -> StageResize
    where
        F: RendererFactory + ?Sized,
    {
        self.logical = Size::new(width, height);
        self.apply(factory)
    }

    /// Logical (design) size.
    #[must_use]
    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// Sets the scale mode and refreshes.
    pub fn set_scale_mode<F>(&mut self, mode: ScaleMode, factory: &mut F) -> StageResize
    where
        F: RendererFactory + ?Sized,
    {
        self.scale_mode = mode;
        self.apply(factory)
    }

    /// Current scale mode.
    #[must_use]
    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Sets the authored orientation and refreshes.
    pub fn set_orientation<F>(
        &mut self,
        orientation: StageOrientation,
        factory: &mut F,
    ) -> StageResize
    where
        F: RendererFactory + ?Sized,
    {
        self.orientation = orientation;
        self.apply(factory)
    }

    /// Authored orientation.
    #[must_use]
    pub fn orientation(&self) -> StageOrientation {
        self.orientation
    }

    /// Sets the orientation lock and refreshes.
    pub fn set_orientation_lock<F>(&mut self, lock: bool, factory: &mut F) -> StageResize
    where
        F: RendererFactory + ?Sized,
    {
        self.orientation_lock = lock;
        self.apply(factory)
    }

    /// Whether a conflicting device orientation is compensated.
    #[must_use]
    pub fn orientation_lock(&self) -> bool {
        self.orientation_lock
    }

    /// Whether the device orientation conflicts with the authored one.
    #[must_use]
    pub fn is_orientation_mismatched(&self) -> bool {
        self.orientation.conflicts_with(self.env.device_orientation)
    }

    // -- Refresh --

    /// Re-reads the viewport and refreshes unconditionally.
    pub fn refresh<H, F>(&mut self, viewport: &Viewport<H>, factory: &mut F) -> StageResize
    where
        F: RendererFactory + ?Sized,
    {
        self.env = StageEnv {
            viewport: viewport.size(),
            device_orientation: viewport.device_orientation(),
            device_pixel_ratio: viewport.device().pixel_ratio,
        };
        self.apply(factory)
    }

    /// Per-frame check: refreshes only if the viewport size differs from the
    /// one seen at the last refresh.
    pub fn update<H, F>(&mut self, viewport: &Viewport<H>, factory: &mut F) -> Option<StageResize>
    where
        F: RendererFactory + ?Sized,
    {
        (viewport.size() != self.env.viewport).then(|| self.refresh(viewport, factory))
    }

    fn apply<F>(&mut self, factory: &mut F) -> StageResize
    where
        F: RendererFactory + ?Sized,
    {
        let layout = compute_layout(&StageInput {
            viewport: self.env.viewport,
            logical: self.logical,
            scale_mode: self.scale_mode,
            orientation: self.orientation,
            orientation_lock: self.orientation_lock,
            device_orientation: self.env.device_orientation,
            device_pixel_ratio: self.env.device_pixel_ratio,
        });
        log::debug!(
            "stage refresh: {} {}x{} in {}x{} -> scale {} offset ({}, {}){}",
            self.scale_mode,
            layout.stage_width,
            layout.stage_height,
            self.env.viewport.width,
            self.env.viewport.height,
            layout.scale_factor,
            layout.offset_x,
            layout.offset_y,
            if layout.swapped { " rotated" } else { "" },
        );
        self.layout = layout;
        self.scene.set_content_size(self.root, Some(layout.stage_size()));
        self.scene.set_locked_local(layout.local);

        log::trace!("renderer resize {:?}", self.env.viewport);
        factory.on_resize(self.env.viewport.width, self.env.viewport.height);
        self.scene.set_transform_dirty(self.root);

        let event = StageResize {
            viewport: self.env.viewport,
            stage: layout.stage_size(),
            scale_factor: layout.scale_factor,
        };
        self.listeners.post(&event);
        event
    }

    // -- Derived getters --

    /// The layout published by the last refresh.
    #[must_use]
    pub fn layout(&self) -> StageLayout {
        self.layout
    }

    /// Uniform scale from logical units to viewport pixels.
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        self.layout.scale_factor
    }

    /// Horizontal offset in logical units.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.logical_offset().x
    }

    /// Vertical offset in logical units.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.logical_offset().y
    }

    /// Always 1; the stage scale lives in [`scale_factor`](Self::scale_factor).
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        1.0
    }

    /// Always 1.
    #[must_use]
    pub fn scale_y(&self) -> f64 {
        1.0
    }

    /// Always 0.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        0.0
    }

    /// Always zero.
    #[must_use]
    pub fn pivot_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Always `None`.
    #[must_use]
    pub fn anchor(&self) -> Option<Vec2> {
        None
    }

    /// The root's name, `"stage"`.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.scene.name(self.root)
    }

    /// Stage width in logical units.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.layout.stage_width
    }

    /// Stage height in logical units.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.layout.stage_height
    }

    /// Backing-store width in device pixels.
    #[must_use]
    pub fn render_width(&self) -> f64 {
        self.layout.stage_width * self.env.device_pixel_ratio * self.layout.scale_factor
    }

    /// Backing-store height in device pixels.
    #[must_use]
    pub fn render_height(&self) -> f64 {
        self.layout.stage_height * self.env.device_pixel_ratio * self.layout.scale_factor
    }

    /// Horizontal centre in logical units.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.layout.stage_width * 0.5
    }

    /// Vertical centre in logical units.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.layout.stage_height * 0.5
    }

    /// The visible area in stage space, letterbox margins included.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let o = self.logical_offset();
        Rect::from_origin_size(
            (-o.x, -o.y),
            (
                self.layout.stage_width + 2.0 * o.x,
                self.layout.stage_height + 2.0 * o.y,
            ),
        )
    }

    /// `(0, 0, width, height)`.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        Rect::from_origin_size(Point::ORIGIN, self.layout.stage_size())
    }

    fn logical_offset(&self) -> Vec2 {
        let sf = self.layout.scale_factor;
        if sf == 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.layout.offset_x / sf, self.layout.offset_y / sf)
    }

    // -- Rejected setters --

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_x(&mut self, x: f64) -> Result<(), SceneError> {
        self.scene.set_x(self.root, x)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_y(&mut self, y: f64) -> Result<(), SceneError> {
        self.scene.set_y(self.root, y)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_scale_x(&mut self, scale_x: f64) -> Result<(), SceneError> {
        self.scene.set_scale_x(self.root, scale_x)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_scale_y(&mut self, scale_y: f64) -> Result<(), SceneError> {
        self.scene.set_scale_y(self.root, scale_y)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_rotation(&mut self, rotation: f64) -> Result<(), SceneError> {
        self.scene.set_rotation(self.root, rotation)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_pivot_offset(&mut self, offset: Vec2) -> Result<(), SceneError> {
        self.scene.set_pivot_offset(self.root, offset)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_anchor(&mut self, anchor: Option<Vec2>) -> Result<(), SceneError> {
        self.scene.set_anchor(self.root, anchor)
    }

    /// Always rejected; use [`set_size`](Self::set_size).
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_width(&mut self, width: f64) -> Result<(), SceneError> {
        self.scene.set_width(self.root, width)
    }

    /// Always rejected; use [`set_size`](Self::set_size).
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_height(&mut self, height: f64) -> Result<(), SceneError> {
        self.scene.set_height(self.root, height)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn set_name(&mut self, name: Option<String>) -> Result<(), SceneError> {
        self.scene.set_name(self.root, name)
    }

    /// Always rejected.
    ///
    /// # Errors
    ///
    /// [`SceneError::StageLocked`].
    pub fn remove_from_parent(&mut self) -> Result<(), SceneError> {
        self.scene.remove_from_parent(self.root)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::driver::RecordingDriver;
    use crate::viewport::{DeviceInfo, FixedHost};

    fn viewport(w: f64, h: f64) -> Viewport<FixedHost> {
        Viewport::bind(FixedHost(Rect::new(0.0, 0.0, w, h)), DeviceInfo::default())
    }

    fn contain_stage(d: &mut RecordingDriver) -> Stage {
        let config = StageConfig {
            width: 400.0,
            height: 300.0,
            scale_mode: ScaleMode::Contain,
            ..StageConfig::default()
        };
        Stage::new(&config, d)
    }

    fn close(a: f64, b: f64) -> bool {
        let d = a - b;
        d < 1e-9 && d > -1e-9
    }

    #[test]
    fn root_is_named_and_locked() {
        let mut d = RecordingDriver::default();
        let stage = contain_stage(&mut d);
        assert_eq!(stage.name(), Some("stage"));
        assert!(stage.scene().is_locked(stage.root()));
        assert_eq!(d.requests.len(), 1);
    }

    #[test]
    fn refresh_publishes_the_layout() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        let e = stage.refresh(&viewport(800.0, 400.0), &mut d);

        assert_eq!(e.viewport, Size::new(800.0, 400.0));
        assert_eq!(e.stage, Size::new(400.0, 300.0));
        assert!(close(stage.scale_factor(), 4.0 / 3.0));
        assert!(close(stage.x(), 133.0 * 0.75), "x = {}", stage.x());
        assert_eq!(stage.y(), 0.0);
        assert_eq!((stage.scale_x(), stage.scale_y(), stage.rotation()), (1.0, 1.0, 0.0));
        assert_eq!((stage.width(), stage.height()), (400.0, 300.0));
        assert_eq!((stage.center_x(), stage.center_y()), (200.0, 150.0));
        assert!(close(stage.render_width(), 400.0 * 4.0 / 3.0));
        assert_eq!(d.resizes, [(800.0, 400.0)]);
    }

    #[test]
    fn children_are_placed_by_the_layout() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        stage.refresh(&viewport(800.0, 600.0), &mut d);

        let child = stage.scene_mut().create_node(RendererKind::Sprite, &mut d);
        stage.add_child(child).unwrap();
        stage.scene_mut().set_position(child, 10.0, 20.0).unwrap();
        let p = stage.scene_mut().local_to_global(child, Point::ORIGIN);
        assert_eq!(p, Point::new(20.0, 40.0));

        stage.set_scale_mode(ScaleMode::Normal, &mut d);
        let p = stage.scene_mut().local_to_global(child, Point::ORIGIN);
        assert_eq!(p, Point::new(10.0, 20.0));
    }

    #[test]
    fn disallowed_mutation_leaves_state_alone() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        stage.refresh(&viewport(800.0, 400.0), &mut d);
        let x = stage.x();

        assert_eq!(
            stage.set_x(5.0),
            Err(SceneError::StageLocked { property: "x" })
        );
        assert_eq!(stage.x(), x);
        assert_eq!(
            stage.set_rotation(1.0),
            Err(SceneError::StageLocked { property: "rotation" })
        );
        assert_eq!(stage.rotation(), 0.0);
        assert_eq!(
            stage.set_name(Some("other".into())),
            Err(SceneError::StageLocked { property: "name" })
        );
        assert_eq!(stage.name(), Some("stage"));

        assert!(stage.set_y(1.0).is_err());
        assert!(stage.set_scale_x(2.0).is_err());
        assert!(stage.set_scale_y(2.0).is_err());
        assert!(stage.set_pivot_offset(Vec2::new(1.0, 1.0)).is_err());
        assert!(stage.set_anchor(Some(Vec2::new(0.5, 0.5))).is_err());
        assert!(stage.set_width(10.0).is_err());
        assert!(stage.set_height(10.0).is_err());
        assert!(stage.remove_from_parent().is_err());

        // Through the scene with the root handle as well.
        let root = stage.root();
        assert!(stage.scene_mut().set_x(root, 5.0).is_err());
        assert_eq!(stage.scene().transform_props(root).x, 0.0);
    }

    #[test]
    #[should_panic(expected = "`x` is not allowed on the stage")]
    fn strict_guards_panic() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        stage.set_guard_policy(GuardPolicy::Panic);
        let _ = stage.set_x(5.0);
    }

    #[test]
    fn update_refreshes_only_on_viewport_change() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        let mut vp = viewport(800.0, 400.0);
        stage.refresh(&vp, &mut d);

        assert_eq!(stage.update(&vp, &mut d), None);
        assert_eq!(d.resizes.len(), 1);

        vp.observe(Rect::new(0.0, 0.0, 800.0, 600.0));
        assert!(stage.update(&vp, &mut d).is_some());
        assert_eq!(d.resizes.len(), 2);
        assert_eq!(stage.scale_factor(), 2.0);
    }

    #[test]
    fn every_refresh_posts() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        stage
            .listeners_mut()
            .subscribe(move |e: &StageResize| s.borrow_mut().push(e.scale_factor));

        let vp = viewport(800.0, 600.0);
        stage.refresh(&vp, &mut d);
        stage.set_size(400.0, 300.0, &mut d);
        stage.set_orientation_lock(true, &mut d);
        assert_eq!(*seen.borrow(), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn refresh_marks_the_root_transform_dirty() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        let root = stage.root();
        let _ = stage.scene_mut().evaluate();
        stage.refresh(&viewport(800.0, 600.0), &mut d);
        let changes = stage.scene_mut().evaluate();
        assert!(changes.transforms.contains(&root.index()));
    }

    #[test]
    fn portrait_stage_on_landscape_device_rotates() {
        let mut d = RecordingDriver::default();
        let config = StageConfig {
            width: 400.0,
            height: 600.0,
            scale_mode: ScaleMode::Contain,
            orientation: StageOrientation::Portrait,
            ..StageConfig::default()
        };
        let mut stage = Stage::new(&config, &mut d);
        stage.refresh(&viewport(800.0, 400.0), &mut d);
        assert!(stage.is_orientation_mismatched());
        assert!(stage.layout().swapped);

        let root = stage.root();
        let [a, b, c, _, _, _] = stage.scene_mut().local_transform(root).as_coeffs();
        assert!(close(a, 0.0) && close(b, -1.0) && close(c, 1.0));

        stage.set_orientation_lock(false, &mut d);
        assert!(!stage.layout().swapped);
        assert_eq!(stage.scene_mut().local_transform(root).as_coeffs()[1], 0.0);
    }

    #[test]
    fn bounds_include_letterbox_margins() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        stage.refresh(&viewport(800.0, 600.0), &mut d);
        assert_eq!(stage.bounds(), Rect::new(0.0, 0.0, 400.0, 300.0));

        // 1000x600: scale 2, offset (100, 0), 50 logical units each side.
        stage.refresh(&viewport(1000.0, 600.0), &mut d);
        assert_eq!(stage.bounds(), Rect::new(-50.0, 0.0, 450.0, 300.0));
        assert_eq!(stage.local_bounds(), Rect::new(0.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn margins_hit_the_stage() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        stage.refresh(&viewport(1000.0, 600.0), &mut d);
        assert_eq!(stage.hit_test(Point::new(10.0, 10.0)), Some(stage.root()));
    }

    #[test]
    fn zero_viewport_is_degenerate_but_valid() {
        let mut d = RecordingDriver::default();
        let mut stage = contain_stage(&mut d);
        stage.refresh(&viewport(0.0, 0.0), &mut d);
        assert_eq!(stage.scale_factor(), 0.0);
        assert_eq!(stage.x(), 0.0);
        assert_eq!(stage.render_width(), 0.0);
    }
}

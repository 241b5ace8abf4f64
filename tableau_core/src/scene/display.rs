// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display properties: opacity, visibility, blending, clipping, tint,
//! intrinsic content size and bitmap caching.
//!
//! Every setter short-circuits when the new value equals the current one.
//! Otherwise it stores the value and calls
//! [`Scene::set_render_dirty`], except where noted.

use super::hit::{HitArea, Input};
use super::id::NodeId;
use super::store::{Scene, replace};
use crate::dirty::DirtyFlags;
use crate::driver::TextureId;
use crate::error::SceneError;
use crate::geometry::{Affine, Rect, Size};

/// How a node's pixels combine with what is already drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Inherit the parent's mode.
    #[default]
    Auto,
    /// Source-over.
    Normal,
    /// Additive.
    Add,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Hard light.
    HardLight,
    /// Soft light.
    SoftLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// Hue.
    Hue,
    /// Saturation.
    Saturation,
    /// Color.
    Color,
    /// Luminosity.
    Luminosity,
}

/// A baked rendering of a node and its subtree, owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BitmapCache {
    /// Whether the bake must be redone before the next use.
    pub dirty: bool,
    /// Backend texture holding the bake.
    pub texture: Option<TextureId>,
    /// World transform the bake was made with.
    pub transform: Option<Affine>,
    /// Bounds covered by the bake.
    pub bounds: Option<Rect>,
}

impl Default for BitmapCache {
    fn default() -> Self {
        Self {
            dirty: true,
            texture: None,
            transform: None,
            bounds: None,
        }
    }
}

/// Per-node display state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DisplayProps {
    pub(crate) alpha: f64,
    pub(crate) visible: bool,
    pub(crate) blend_mode: BlendMode,
    pub(crate) clip: Option<Rect>,
    pub(crate) color: Option<u32>,
    pub(crate) snap_to_pixels: bool,
    pub(crate) cache_as_bitmap: bool,
    pub(crate) bitmap: BitmapCache,
    pub(crate) content_size: Option<Size>,
    pub(crate) hit_area: HitArea,
    pub(crate) input: Option<Input>,
}

impl Default for DisplayProps {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            visible: true,
            blend_mode: BlendMode::Auto,
            clip: None,
            color: None,
            snap_to_pixels: false,
            cache_as_bitmap: false,
            bitmap: BitmapCache::default(),
            content_size: None,
            hit_area: HitArea::Bounds,
            input: None,
        }
    }
}

impl Scene {
    /// Returns the node's own opacity in `[0, 1]`.
    #[must_use]
    pub fn alpha(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.display[id.idx as usize].alpha
    }

    /// Sets the node's opacity, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NanAlpha`] if `alpha` is `NaN`; the old value is kept.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f64) -> Result<(), SceneError> {
        self.validate(id);
        if alpha.is_nan() {
            return Err(self.guard.raise(SceneError::NanAlpha));
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if replace(&mut self.display[id.idx as usize].alpha, alpha) {
            self.set_render_dirty_idx(id.idx);
        }
        Ok(())
    }

    /// Returns whether the node is visible.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.display[id.idx as usize].visible
    }

    /// Shows or hides the node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        if replace(&mut self.display[id.idx as usize].visible, visible) {
            self.set_render_dirty_idx(id.idx);
        }
    }

    /// Returns the node's blend mode.
    #[must_use]
    pub fn blend_mode(&self, id: NodeId) -> BlendMode {
        self.validate(id);
        self.display[id.idx as usize].blend_mode
    }

    /// Sets the node's blend mode.
    pub fn set_blend_mode(&mut self, id: NodeId, mode: BlendMode) {
        self.validate(id);
        if replace(&mut self.display[id.idx as usize].blend_mode, mode) {
            self.set_render_dirty_idx(id.idx);
        }
    }

    /// Returns the node's tint as `0xRRGGBB`, if any.
    #[must_use]
    pub fn color(&self, id: NodeId) -> Option<u32> {
        self.validate(id);
        self.display[id.idx as usize].color
    }

    /// Sets the node's tint. `None` inherits the parent's.
    pub fn set_color(&mut self, id: NodeId, color: Option<u32>) {
        self.validate(id);
        if replace(&mut self.display[id.idx as usize].color, color) {
            self.set_render_dirty_idx(id.idx);
        }
    }

    /// Returns the node's clip rectangle, if any.
    #[must_use]
    pub fn clip_rect(&self, id: NodeId) -> Option<Rect> {
        self.validate(id);
        self.display[id.idx as usize].clip
    }

    /// Sets the clip rectangle.
    ///
    /// The rectangle is relative to the node's pivot. While set, it replaces
    /// the node's content and children in every bounds query and masks hit
    /// testing of the subtree.
    pub fn set_clip_rect(&mut self, id: NodeId, clip: Option<Rect>) {
        self.validate(id);
        if replace(&mut self.display[id.idx as usize].clip, clip) {
            self.geometry_changed(id.idx);
        }
    }

    /// Returns the node's intrinsic content size, if any.
    #[must_use]
    pub fn content_size(&self, id: NodeId) -> Option<Size> {
        self.validate(id);
        self.display[id.idx as usize].content_size
    }

    /// Sets the intrinsic content size (a sprite's frame, a text run's
    /// extent). The node's local bounds become `(0, 0, w, h)` unless a clip
    /// rectangle is set.
    pub fn set_content_size(&mut self, id: NodeId, size: Option<Size>) {
        self.validate(id);
        if replace(&mut self.display[id.idx as usize].content_size, size) {
            self.geometry_changed(id.idx);
        }
    }

    /// Returns whether the node rounds its world translation to whole pixels
    /// when rendered.
    #[must_use]
    pub fn snap_to_pixels(&self, id: NodeId) -> bool {
        self.validate(id);
        self.display[id.idx as usize].snap_to_pixels
    }

    /// Enables or disables pixel snapping.
    pub fn set_snap_to_pixels(&mut self, id: NodeId, snap: bool) {
        self.validate(id);
        if replace(&mut self.display[id.idx as usize].snap_to_pixels, snap) {
            self.set_render_dirty_idx(id.idx);
        }
    }

    /// Returns whether the subtree is baked into a bitmap.
    #[must_use]
    pub fn cache_as_bitmap(&self, id: NodeId) -> bool {
        self.validate(id);
        self.display[id.idx as usize].cache_as_bitmap
    }

    /// Turns bitmap caching on or off.
    ///
    /// Turning it off discards the baked texture together with its cached
    /// transform and bounds, marks the cache dirty and marks the node's
    /// transform dirty.
    pub fn set_cache_as_bitmap(&mut self, id: NodeId, enabled: bool) {
        self.validate(id);
        let i = id.idx as usize;
        if !replace(&mut self.display[i].cache_as_bitmap, enabled) {
            return;
        }
        if !enabled {
            self.display[i].bitmap = BitmapCache::default();
            self.mark_transform(id.idx);
        }
    }

    /// Returns the node's bitmap cache record.
    #[must_use]
    pub fn bitmap_cache(&self, id: NodeId) -> BitmapCache {
        self.validate(id);
        self.display[id.idx as usize].bitmap
    }

    /// Records a finished bake. Called by the renderer.
    pub fn store_bitmap_cache(
        &mut self,
        id: NodeId,
        texture: TextureId,
        transform: Affine,
        bounds: Rect,
    ) {
        self.validate(id);
        self.display[id.idx as usize].bitmap = BitmapCache {
            dirty: false,
            texture: Some(texture),
            transform: Some(transform),
            bounds: Some(bounds),
        };
    }

    // -- Raw-index accessors for renderers --

    /// Returns the display state at raw slot `idx` as
    /// `(alpha, visible, blend_mode, color)`.
    #[must_use]
    pub fn appearance_at(&self, idx: u32) -> (f64, bool, BlendMode, Option<u32>) {
        let d = &self.display[idx as usize];
        (d.alpha, d.visible, d.blend_mode, d.color)
    }

    /// Returns the clip rectangle at raw slot `idx`.
    #[must_use]
    pub fn clip_rect_at(&self, idx: u32) -> Option<Rect> {
        self.display[idx as usize].clip
    }

    /// Returns whether raw slot `idx` snaps to pixels.
    #[must_use]
    pub fn snap_to_pixels_at(&self, idx: u32) -> bool {
        self.display[idx as usize].snap_to_pixels
    }

    /// Returns the own-space bounds (without children) at raw slot `idx`,
    /// with the clip shifted by the pivot. Reads the cached pivot, so
    /// evaluate first.
    #[must_use]
    pub fn local_bounds_at(&self, idx: u32) -> Rect {
        self.outer_geometry(idx)
    }

    /// Unshifted own geometry without children: the raw clip rectangle if
    /// set, else the content rectangle, else empty. Anchored pivots are
    /// derived from this.
    pub(crate) fn local_bounds(&self, idx: u32) -> Rect {
        let d = &self.display[idx as usize];
        match (d.clip, d.content_size) {
            (Some(clip), _) => clip,
            (None, Some(size)) => size.to_rect(),
            (None, None) => Rect::ZERO,
        }
    }

    /// Clip or content changed: bounds are stale and, for an anchored node,
    /// so are the pivot and transform.
    fn geometry_changed(&mut self, idx: u32) {
        self.set_render_dirty_idx(idx);
        if self.props[idx as usize].anchor.is_some() {
            self.flags[idx as usize] |= DirtyFlags::ANCHOR;
            self.mark_transform(idx);
        }
    }
}

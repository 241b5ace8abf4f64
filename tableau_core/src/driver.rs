// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer-driver contract.
//!
//! Concrete canvas or WebGL backends live outside this crate. The scene talks
//! to them through [`RendererFactory`]:
//!
//! - **Renderer lookup**: every display object asks the factory once, at
//!   creation, for a renderer of its [`RendererKind`] and caches the returned
//!   [`RendererId`].
//! - **Resize**: the stage calls [`on_resize`](RendererFactory::on_resize)
//!   after every refresh so the backend can mark its surfaces dirty.
//! - **Render**: the engine's render phase hands the evaluated scene and the
//!   frame's [`FrameChanges`] to [`render`](RendererFactory::render).
//!
//! [`RecordingDriver`] is a test double that records all three.

use alloc::vec::Vec;
use core::fmt;

use crate::scene::{FrameChanges, NodeId, Scene};

/// Which renderer a display object wants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// Plain container with no drawable content of its own.
    #[default]
    DisplayObject,
    /// Textured quad.
    Sprite,
    /// Text run.
    Text,
    /// Vector graphics.
    Graphics,
    /// Backend-defined renderer.
    Custom(u32),
}

/// Opaque handle to a backend renderer instance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RendererId(pub u32);

impl fmt::Debug for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RendererId({})", self.0)
    }
}

/// Opaque handle to a backend texture (used for bitmap caches).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u64);

impl fmt::Debug for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureId({})", self.0)
    }
}

/// Backend entry points used by the scene, the stage and the frame loop.
pub trait RendererFactory {
    /// Returns the renderer that will draw `node`.
    fn renderer_for(&mut self, kind: RendererKind, node: NodeId) -> RendererId;

    /// Called after every stage refresh with the viewport size in pixels.
    fn on_resize(&mut self, width: f64, height: f64);

    /// Draws one frame.
    fn render(&mut self, scene: &Scene, changes: &FrameChanges) {
        _ = (scene, changes);
    }
}

/// A [`RendererFactory`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    /// Renderer requests in call order.
    pub requests: Vec<(RendererKind, NodeId)>,
    /// Resize notifications in call order.
    pub resizes: Vec<(f64, f64)>,
    /// Number of rendered frames.
    pub frames: u64,
    /// Transform changes seen by the most recent render call.
    pub last_transforms: Vec<u32>,
}

impl RendererFactory for RecordingDriver {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "test double; renderer counts stay far below u32::MAX"
    )]
    fn renderer_for(&mut self, kind: RendererKind, node: NodeId) -> RendererId {
        self.requests.push((kind, node));
        RendererId(self.requests.len() as u32 - 1)
    }

    fn on_resize(&mut self, width: f64, height: f64) {
        self.resizes.push((width, height));
    }

    fn render(&mut self, _scene: &Scene, changes: &FrameChanges) {
        self.frames += 1;
        self.last_transforms.clone_from(&changes.transforms);
    }
}

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! A *node* is an element of a retained 2D scene. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that goes stale when the
//!   node is destroyed.
//! - Topology: parent, ordered children (index 0 is drawn first, the last
//!   child is front-most).
//! - **Transform components** set by the caller: position, scale, rotation,
//!   pivot offset and optional anchor. The local matrix is derived from them.
//! - **Display properties** ([`display`](Scene::set_alpha)): opacity,
//!   visibility, blend mode, clip rectangle, tint, content size and bitmap
//!   caching.
//! - A renderer handle obtained once from the
//!   [`RendererFactory`](crate::driver::RendererFactory) at creation.
//!
//! Nodes live in a struct-of-arrays [`Scene`] with index-based handles.
//!
//! # Derived state
//!
//! Local, world and inverse world matrices, anchor pivots and parent-space
//! bounds are cached per node and guarded by [`DirtyFlags`]. Mutations mark
//! flags (see [`dirty`](crate::dirty)); reads resolve whatever is stale, top
//! down, so a read never observes a stale ancestor. [`Scene::evaluate`] brings
//! the whole tree up to date once per frame and reports what changed.
//!
//! [`DirtyFlags`]: crate::dirty::DirtyFlags

mod bounds;
mod display;
mod evaluate;
mod hit;
mod id;
mod store;
mod traverse;

pub use bounds::Space;
pub use display::{BitmapCache, BlendMode};
pub use evaluate::FrameChanges;
pub use hit::{HitArea, Input};
pub use id::{INVALID, NodeId};
pub use store::{Scene, SceneStats, TransformProps};
pub use traverse::Children;

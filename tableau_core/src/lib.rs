// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode 2D scene graph with lazy transforms and stage scaling.
//!
//! `tableau_core` holds the scene tree of a 2D engine and everything that
//! decides *where* things are: local and world transforms, bounds, hit
//! testing, and the mapping of a fixed logical stage onto a resizable
//! viewport. It is `no_std` compatible (with `alloc`) and stores nodes in
//! struct-of-arrays form behind generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Host resize event            Host animation frame
//!          │                              │
//!          ▼                              ▼
//!   Viewport::observe()            Engine::tick()
//!          │                              │
//!          ▼                     ┌────────┼─────────────┐
//!   Stage::refresh()             ▼        ▼             ▼
//!     compute_layout()        update   Scene::evaluate()  RendererFactory::render()
//!     on_resize()                         │
//!     StageResize                         ▼
//!                                   FrameChanges
//! ```
//!
//! **[`scene`]**: Struct-of-arrays node store. Transform components and
//! display properties are set by the caller; local, world and inverse world
//! matrices, anchor pivots and parent-space bounds are derived lazily and
//! cached behind per-node dirty flags.
//!
//! **[`dirty`]**: Dirty flags and the frame change log. Transform changes
//! propagate down the tree, bounds changes propagate up.
//!
//! **[`stage`]**: The scene root mapped onto the viewport by a scale mode
//! (`NORMAL`, `FIXED`, `CONTAIN`, `COVER`, `FIXED_WIDTH`, `NO_SCALE`) with
//! optional orientation lock.
//!
//! **[`viewport`]**: Host container binding and resize observation.
//!
//! **[`engine`]**: The explicit context that owns viewport, stage, renderer
//! factory and clock, and runs the frame loop.
//!
//! **[`driver`]**: The [`RendererFactory`](driver::RendererFactory) trait
//! concrete backends implement.
//!
//! **[`geometry`]**: Rectangle and matrix helpers over `kurbo`, plus reusable
//! scratch pools.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod clock;
pub mod config;
pub mod dirty;
pub mod driver;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod message;
pub mod scene;
pub mod stage;
pub mod trace;
pub mod viewport;

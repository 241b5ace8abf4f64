// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-plan flattening and damage tracking for tableau scenes.
//!
//! This crate sits between [`tableau_core`]'s scene evaluation and a concrete
//! canvas or WebGL backend. It defines:
//!
//! - [`RenderItem`]: one draw command with its inherited appearance resolved
//! - [`RenderPlan`]: the draw commands of one frame, back to front
//! - [`DamageRegion`]: the area that needs redrawing
//! - [`DamageTracker`]: turns a frame's change log into a [`DamageRegion`]

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;

pub use damage::{DamageRegion, DamageTracker};
pub use plan::{RenderItem, RenderPlan};

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for tableau.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomContainer`]: the host element, as a [`HostContainer`]
//! - [`ResizeListener`]: window `resize` events
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`DomRenderer`]: a [`RendererFactory`] that draws nodes as positioned
//!   `<div>` elements
//!
//! A typical setup binds the container, starts an [`Engine`] on it, resizes
//! the engine from the resize listener and ticks it from the animation loop.
//!
//! [`Engine`]: tableau_core::engine::Engine

#![no_std]

extern crate alloc;

mod host;
mod raf;
mod renderer;
mod resize;

pub use host::DomContainer;
pub use raf::RafLoop;
pub use renderer::DomRenderer;
pub use resize::ResizeListener;
pub use tableau_core::driver::RendererFactory;
pub use tableau_core::viewport::HostContainer;

use tableau_core::viewport::DeviceInfo;

/// Returns the current host time in milliseconds from `performance.now()`.
#[must_use]
pub fn now() -> f64 {
    raf::performance_now()
}

/// Returns the window's device pixel ratio, or 1 outside a window context.
#[must_use]
pub fn device_pixel_ratio() -> f64 {
    web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
}

/// Reads the device characteristics the viewport needs.
///
/// The orientation is left to the viewport, which derives it from the
/// container's aspect ratio.
#[must_use]
pub fn device_info() -> DeviceInfo {
    DeviceInfo {
        pixel_ratio: sanitize_pixel_ratio(device_pixel_ratio()),
        orientation: None,
    }
}

fn sanitize_pixel_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

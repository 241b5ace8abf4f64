// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host container binding.
//!
//! A [`Viewport`] wraps one [`HostContainer`] (a DOM element in the browser
//! backend) and remembers its last bounding rectangle. Resize observation is
//! host-driven: the backend calls [`Viewport::on_host_resize`] (or
//! [`Viewport::observe`] with a rectangle it already has) from its resize
//! event, and the viewport notifies subscribers only when the rectangle
//! actually changed.

use crate::geometry::{Rect, Size};
use crate::message::Listeners;

/// The element the scene is presented in.
pub trait HostContainer {
    /// The element's bounding rectangle in CSS pixels (left, top, width,
    /// height).
    fn bounding_rect(&self) -> Rect;

    /// Applies the interaction style hints the scene needs: no text
    /// selection, no touch gestures, no overflow, default cursor, no tap
    /// highlight.
    fn apply_style_hints(&mut self) {}
}

/// A host with a fixed rectangle and no style, for headless use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedHost(pub Rect);

impl HostContainer for FixedHost {
    fn bounding_rect(&self) -> Rect {
        self.0
    }
}

/// Physical orientation of the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeviceOrientation {
    /// Wider than tall (or square).
    #[default]
    Landscape,
    /// Taller than wide.
    Portrait,
}

/// Device characteristics read once by the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceInfo {
    /// Device pixels per CSS pixel.
    pub pixel_ratio: f64,
    /// Reported orientation. `None` derives it from the viewport's aspect.
    pub orientation: Option<DeviceOrientation>,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            orientation: None,
        }
    }
}

/// Posted when the viewport rectangle changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportResize {
    /// The new bounding rectangle.
    pub rect: Rect,
}

/// A bound host container and its last observed geometry.
#[derive(Debug)]
pub struct Viewport<H> {
    host: H,
    rect: Rect,
    device: DeviceInfo,
    transparent: bool,
    background_color: u32,
    listeners: Listeners<ViewportResize>,
}

impl<H: HostContainer> Viewport<H> {
    /// Binds `host`: applies its style hints and reads its initial rectangle.
    pub fn bind(mut host: H, device: DeviceInfo) -> Self {
        host.apply_style_hints();
        let rect = host.bounding_rect();
        log::debug!("viewport bound at {rect:?}");
        Self {
            host,
            rect,
            device,
            transparent: false,
            background_color: 0x00_00_00,
            listeners: Listeners::new(),
        }
    }

    /// Re-reads the host rectangle; see [`observe`](Self::observe).
    pub fn on_host_resize(&mut self) -> Option<ViewportResize> {
        let rect = self.host.bounding_rect();
        self.observe(rect)
    }
}

impl<H> Viewport<H> {
    /// Records `rect` as the current geometry.
    ///
    /// Returns and posts a [`ViewportResize`] only if `rect` differs from the
    /// cached rectangle.
    pub fn observe(&mut self, rect: Rect) -> Option<ViewportResize> {
        if rect == self.rect {
            return None;
        }
        log::debug!("viewport resized: {:?} -> {rect:?}", self.rect);
        self.rect = rect;
        let event = ViewportResize { rect };
        self.listeners.post(&event);
        Some(event)
    }

    /// Last observed bounding rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Last observed size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.rect.size()
    }

    /// Device characteristics.
    #[must_use]
    pub fn device(&self) -> DeviceInfo {
        self.device
    }

    /// Replaces the device characteristics.
    pub fn set_device(&mut self, device: DeviceInfo) {
        self.device = device;
    }

    /// The device orientation: the reported one, or portrait when the
    /// viewport is taller than wide.
    #[must_use]
    pub fn device_orientation(&self) -> DeviceOrientation {
        self.device.orientation.unwrap_or_else(|| {
            if self.rect.height() > self.rect.width() {
                DeviceOrientation::Portrait
            } else {
                DeviceOrientation::Landscape
            }
        })
    }

    /// Whether the presentation surface should be cleared to transparent.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Sets whether the presentation surface is cleared to transparent.
    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    /// Clear color as `0xRRGGBB`.
    #[must_use]
    pub fn background_color(&self) -> u32 {
        self.background_color
    }

    /// Sets the clear color.
    pub fn set_background_color(&mut self, color: u32) {
        self.background_color = color;
    }

    /// Resize subscribers.
    pub fn listeners_mut(&mut self) -> &mut Listeners<ViewportResize> {
        &mut self.listeners
    }

    /// The bound host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The bound host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

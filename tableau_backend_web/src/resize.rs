// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window `resize` observation.

use alloc::boxed::Box;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, Window};

/// Calls a closure on every window `resize` event until dropped.
///
/// The closure usually forwards to
/// [`Engine::on_host_resize`](tableau_core::engine::Engine::on_host_resize),
/// which re-reads the container rectangle and refreshes the stage before the
/// next animation frame.
pub struct ResizeListener {
    window: Window,
    closure: Closure<dyn FnMut(Event)>,
}

impl core::fmt::Debug for ResizeListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResizeListener").finish_non_exhaustive()
    }
}

impl ResizeListener {
    /// Registers `on_resize` on the current window.
    ///
    /// Returns `None` outside a window context or if registration fails.
    pub fn new(mut on_resize: impl FnMut() + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let closure =
            Closure::wrap(Box::new(move |_: Event| on_resize()) as Box<dyn FnMut(Event)>);
        if let Err(err) =
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            log::error!("failed to listen for window resize: {err:?}");
            return None;
        }
        Some(Self { window, closure })
    }
}

impl Drop for ResizeListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.closure.as_ref().unchecked_ref());
    }
}

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` tick source.
//!
//! [`RafLoop`] calls a closure once per animation frame with the browser's
//! [`DOMHighResTimeStamp`][mdn] in milliseconds, which is what
//! [`Engine::tick`](tableau_core::engine::Engine::tick) expects.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(handle: i32);
}

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Shared between the loop handle and the registered JS closure.
struct LoopState {
    on_frame: RefCell<Box<dyn FnMut(f64)>>,
    /// The closure handed to the browser. It holds an `Rc` to this state, so
    /// it is kept in a separate cell and dropped explicitly.
    js: RefCell<Option<FrameClosure>>,
    active: Cell<bool>,
    /// Handle of the pending request, if any.
    pending: Cell<Option<i32>>,
    delivered: Cell<u64>,
}

impl LoopState {
    /// Asks the browser for the next frame.
    fn schedule(&self) {
        if let Some(js) = &*self.js.borrow() {
            let handle = request_animation_frame(js.as_ref().unchecked_ref());
            self.pending.set(Some(handle));
        }
    }

    fn deliver(&self, timestamp_ms: f64) {
        self.pending.set(None);
        if !self.active.get() {
            return;
        }
        self.delivered.set(self.delivered.get() + 1);
        self.on_frame.borrow_mut()(timestamp_ms);
        if self.active.get() {
            self.schedule();
        }
    }
}

/// A `requestAnimationFrame` loop.
///
/// Nothing runs until [`start`](Self::start). The loop re-registers itself
/// after every frame until [`stop`](Self::stop) is called or the handle is
/// dropped.
pub struct RafLoop {
    state: Rc<LoopState>,
}

impl RafLoop {
    /// Creates a stopped loop; `on_frame` receives the frame timestamp in
    /// milliseconds.
    pub fn new(on_frame: impl FnMut(f64) + 'static) -> Self {
        Self {
            state: Rc::new(LoopState {
                on_frame: RefCell::new(Box::new(on_frame)),
                js: RefCell::new(None),
                active: Cell::new(false),
                pending: Cell::new(None),
                delivered: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. Does nothing if it is already running.
    pub fn start(&self) {
        if self.state.active.replace(true) {
            return;
        }
        if self.state.js.borrow().is_none() {
            let state = Rc::clone(&self.state);
            let js = Closure::wrap(
                Box::new(move |timestamp_ms: f64| state.deliver(timestamp_ms))
                    as Box<dyn FnMut(f64)>,
            );
            *self.state.js.borrow_mut() = Some(js);
        }
        self.state.schedule();
    }

    /// Stops the loop and cancels the pending frame. [`start`](Self::start)
    /// resumes it.
    pub fn stop(&self) {
        self.state.active.set(false);
        if let Some(handle) = self.state.pending.take() {
            cancel_animation_frame(handle);
        }
    }

    /// Returns `true` while the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.active.get()
    }

    /// Number of frames delivered so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.state.delivered.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        self.state.js.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.state.active.get())
            .field("frames", &self.state.delivered.get())
            .finish_non_exhaustive()
    }
}

// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM renderer.
//!
//! Every node gets an absolutely positioned `<div>` inside the container.
//! Each frame that changed something rebuilds a [`RenderPlan`] and writes
//! world transform, inherited opacity and visibility onto the elements; nodes
//! missing from the plan (hidden or fully transparent) are set to
//! `display: none`. Backends that draw actual content hang it off
//! [`DomRenderer::element`].

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use tableau_core::driver::{RendererFactory, RendererId, RendererKind};
use tableau_core::geometry::Affine;
use tableau_core::scene::{FrameChanges, NodeId, Scene};
use tableau_render::RenderPlan;
use wasm_bindgen::JsCast as _;
use web_sys::HtmlElement;

/// Draws the scene as positioned `<div>` elements.
pub struct DomRenderer {
    container: HtmlElement,
    /// Element per renderer id.
    elements: Vec<Option<HtmlElement>>,
    /// Renderer id per node slot.
    by_node: Vec<Option<u32>>,
    next_id: u32,
    plan: RenderPlan,
    drawn: Vec<bool>,
}

impl core::fmt::Debug for DomRenderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomRenderer")
            .field("container", &"HtmlElement")
            .field("elements_len", &self.elements.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl DomRenderer {
    /// Creates a renderer that adds its elements to `container`.
    #[must_use]
    pub fn new(container: HtmlElement) -> Self {
        Self {
            container,
            elements: Vec::new(),
            by_node: Vec::new(),
            next_id: 0,
            plan: RenderPlan::new(),
            drawn: Vec::new(),
        }
    }

    /// Returns the container element.
    #[must_use]
    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// Returns the element of a renderer, if it exists.
    #[must_use]
    pub fn element(&self, renderer: RendererId) -> Option<&HtmlElement> {
        self.elements
            .get(renderer.0 as usize)
            .and_then(|slot| slot.as_ref())
    }

    fn element_of_slot(&self, idx: u32) -> Option<&HtmlElement> {
        let id = (*self.by_node.get(idx as usize)?)?;
        self.element(RendererId(id))
    }

    fn create_element(&self, kind: RendererKind) -> Option<HtmlElement> {
        let doc = self.container.owner_document()?;
        let el: HtmlElement = doc.create_element("div").ok()?.unchecked_into();
        let s = el.style();
        let _ = s.set_property("position", "absolute");
        let _ = s.set_property("left", "0");
        let _ = s.set_property("top", "0");
        let _ = s.set_property("transform-origin", "0 0");
        let _ = el.set_attribute("data-kind", kind_name(kind));
        let _ = self.container.append_child(&el);
        Some(el)
    }

    fn remove_slot(&mut self, idx: u32) {
        let Some(id) = self.by_node.get_mut(idx as usize).and_then(Option::take) else {
            return;
        };
        if let Some(el) = self.elements.get_mut(id as usize).and_then(Option::take) {
            el.remove();
        }
    }
}

impl RendererFactory for DomRenderer {
    fn renderer_for(&mut self, kind: RendererKind, node: NodeId) -> RendererId {
        let id = self.next_id;
        self.next_id += 1;

        let el = self.create_element(kind);
        if el.is_none() {
            log::warn!("no document to create an element for {node:?}");
        }
        let slot = id as usize;
        if self.elements.len() <= slot {
            self.elements.resize_with(slot + 1, || None);
        }
        self.elements[slot] = el;

        let idx = node.index() as usize;
        if self.by_node.len() <= idx {
            self.by_node.resize(idx + 1, None);
        }
        // A reused slot still mapped to a destroyed node's element.
        if let Some(old) = self.by_node[idx].replace(id)
            && let Some(el) = self.elements.get_mut(old as usize).and_then(Option::take)
        {
            el.remove();
        }
        RendererId(id)
    }

    fn on_resize(&mut self, width: f64, height: f64) {
        log::trace!("dom renderer resized to {width}x{height}");
        let s = self.container.style();
        let _ = s.set_property("width", &format!("{width}px"));
        let _ = s.set_property("height", &format!("{height}px"));
    }

    fn render(&mut self, scene: &Scene, changes: &FrameChanges) {
        for &idx in &changes.removed {
            self.remove_slot(idx);
        }
        if changes.is_empty() {
            return;
        }

        self.drawn.clear();
        self.drawn.resize(self.by_node.len(), false);
        let mut plan = core::mem::take(&mut self.plan);
        for root in scene.roots() {
            plan.rebuild(scene, root);
            for item in &plan.items {
                let idx = item.node.index();
                if let Some(drawn) = self.drawn.get_mut(idx as usize) {
                    *drawn = true;
                }
                if let Some(el) = self.element_of_slot(idx) {
                    let s = el.style();
                    let _ = s.set_property("transform", &css_matrix(item.world_transform));
                    let _ = s.set_property("opacity", &format!("{}", item.alpha));
                    let _ = s.remove_property("display");
                }
            }
        }
        self.plan = plan;

        for (idx, drawn) in self.drawn.iter().enumerate() {
            let Ok(idx) = u32::try_from(idx) else {
                break;
            };
            if !*drawn
                && let Some(el) = self.element_of_slot(idx)
            {
                let _ = el.style().set_property("display", "none");
            }
        }

        if changes.topology_changed {
            for &idx in scene.traversal_order() {
                if let Some(el) = self.element_of_slot(idx) {
                    // Re-appending moves the element to the end.
                    let _ = self.container.append_child(el);
                }
            }
        }
    }
}

fn kind_name(kind: RendererKind) -> &'static str {
    match kind {
        RendererKind::DisplayObject => "container",
        RendererKind::Sprite => "sprite",
        RendererKind::Text => "text",
        RendererKind::Graphics => "graphics",
        RendererKind::Custom(_) => "custom",
    }
}

/// Formats an affine as a CSS `matrix()` transform.
fn css_matrix(t: Affine) -> String {
    let [a, b, c, d, e, f] = t.as_coeffs();
    format!("matrix({a}, {b}, {c}, {d}, {e}, {f})")
}

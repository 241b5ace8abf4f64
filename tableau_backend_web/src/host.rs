// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The DOM element that hosts the scene.

use tableau_core::geometry::Rect;
use tableau_core::viewport::HostContainer;
use web_sys::HtmlElement;

/// CSS properties set on the container when it is bound.
pub(crate) const STYLE_HINTS: [(&str, &str); 5] = [
    ("user-select", "none"),
    ("touch-action", "none"),
    ("overflow", "hidden"),
    ("cursor", "auto"),
    ("-webkit-tap-highlight-color", "rgba(0, 0, 0, 0)"),
];

/// A container element whose bounding client rectangle is the viewport.
pub struct DomContainer(pub HtmlElement);

impl core::fmt::Debug for DomContainer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("DomContainer").field(&"HtmlElement").finish()
    }
}

impl DomContainer {
    /// Returns the element.
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.0
    }
}

impl HostContainer for DomContainer {
    fn bounding_rect(&self) -> Rect {
        let r = self.0.get_bounding_client_rect();
        Rect::from_origin_size((r.x(), r.y()), (r.width(), r.height()))
    }

    fn apply_style_hints(&mut self) {
        let style = self.0.style();
        for (name, value) in STYLE_HINTS {
            if style.set_property(name, value).is_err() {
                log::warn!("container rejected style `{name}: {value}`");
            }
        }
    }
}

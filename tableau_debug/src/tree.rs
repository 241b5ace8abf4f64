// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-tree dumps.

use std::fmt::Write as _;

use serde_json::{Value, json};
use tableau_core::geometry::Rect;
use tableau_core::scene::{NodeId, Scene, Space};

/// Renders the subtree of `root` as indented text, one node per line.
///
/// Each line shows the node's name (or `-`), renderer kind, position, scale,
/// rotation and parent-space bounds including children. Hidden nodes are
/// marked. Reading bounds resolves dirty caches, hence `&mut`.
#[must_use]
pub fn dump_tree(scene: &mut Scene, root: NodeId) -> String {
    let mut out = String::new();
    write_node(scene, root, 0, &mut out);
    out
}

fn write_node(scene: &mut Scene, id: NodeId, depth: usize, out: &mut String) {
    let props = scene.transform_props(id);
    let bounds = scene.bounds(id, Space::Parent, true);
    let _ = write!(
        out,
        "{:indent$}{} {:?} pos=({}, {}) scale=({}, {}) rot={} bounds={}",
        "",
        scene.name(id).unwrap_or("-"),
        scene.kind(id),
        props.x,
        props.y,
        props.scale_x,
        props.scale_y,
        props.rotation,
        fmt_rect(bounds),
        indent = depth * 2,
    );
    if !scene.visible(id) {
        out.push_str(" hidden");
    }
    if scene.alpha(id) < 1.0 {
        let _ = write!(out, " alpha={}", scene.alpha(id));
    }
    out.push('\n');

    let children: Vec<NodeId> = scene.children(id).collect();
    for child in children {
        write_node(scene, child, depth + 1, out);
    }
}

fn fmt_rect(r: Rect) -> String {
    format!("[{}, {}, {}x{}]", r.x0, r.y0, r.width(), r.height())
}

/// Exports the subtree of `root` as a JSON value.
///
/// Every node becomes an object with `name`, `kind`, `x`, `y`, `scale_x`,
/// `scale_y`, `rotation`, `alpha`, `visible`, `bounds` (`[x, y, w, h]` in
/// parent space, children included) and `children`.
#[must_use]
pub fn tree_json(scene: &mut Scene, root: NodeId) -> Value {
    let props = scene.transform_props(root);
    let bounds = scene.bounds(root, Space::Parent, true);
    let children: Vec<NodeId> = scene.children(root).collect();
    let children: Vec<Value> = children
        .into_iter()
        .map(|child| tree_json(scene, child))
        .collect();
    json!({
        "name": scene.name(root),
        "kind": format!("{:?}", scene.kind(root)),
        "x": props.x,
        "y": props.y,
        "scale_x": props.scale_x,
        "scale_y": props.scale_y,
        "rotation": props.rotation,
        "alpha": scene.alpha(root),
        "visible": scene.visible(root),
        "bounds": [bounds.x0, bounds.y0, bounds.width(), bounds.height()],
        "children": children,
    })
}

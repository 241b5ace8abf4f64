// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and scene dumps for tableau diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](tableau_core::trace::TraceSink)
//!   that writes one line per frame-loop event.
//! - [`tree::dump_tree`]: indented text dump of a scene subtree.
//! - [`tree::tree_json`]: the same subtree as a JSON value.

pub mod pretty;
pub mod tree;

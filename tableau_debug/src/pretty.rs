// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are host milliseconds, as passed to the engine.

use std::io::Write;

use tableau_core::stage::StageResize;
use tableau_core::trace::{
    FrameBeginEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
    ViewportResizeEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Update => "update",
        PhaseKind::Evaluate => "eval",
        PhaseKind::Render => "render",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} at {:.3}ms delta={:.3}ms",
            e.frame_index, e.timestamp_ms, e.delta_ms,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.3}ms",
            e.frame_index,
            phase_name(e.phase),
            e.timestamp_ms,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.3}ms",
            e.frame_index,
            phase_name(e.phase),
            e.timestamp_ms,
        );
    }

    fn on_viewport_resize(&mut self, e: &ViewportResizeEvent) {
        let _ = writeln!(
            self.writer,
            "[viewport] {}x{} at ({}, {})",
            e.rect.width(),
            e.rect.height(),
            e.rect.x0,
            e.rect.y0,
        );
    }

    fn on_stage_resize(&mut self, e: &StageResize) {
        let _ = writeln!(
            self.writer,
            "[stage] viewport={}x{} stage={}x{} scale={:.4}",
            e.viewport.width, e.viewport.height, e.stage.width, e.stage.height, e.scale_factor,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} update={:.3}ms eval={:.3}ms render={:.3}ms \
             transforms={} render_changes={}",
            s.frame_index,
            s.update_ms,
            s.evaluate_ms,
            s.render_ms,
            s.transforms_changed,
            s.render_changed,
        );
    }
}

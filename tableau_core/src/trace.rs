// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Engine`](crate::engine::Engine) calls at each stage of a frame and on
//! every resize. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.

use crate::geometry::Rect;
use crate::stage::StageResize;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame loop is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Clock advance and stage viewport check.
    Update,
    /// Scene evaluation (transform resolution, change log drain).
    Evaluate,
    /// Backend rendering.
    Render,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a frame starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Clamped time since the previous frame, in milliseconds.
    pub delta_ms: f64,
}

/// Marks the beginning of a frame-loop phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
}

/// Marks the end of a frame-loop phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
}

/// Emitted when the host container's bounding rectangle changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportResizeEvent {
    /// The new bounding rectangle.
    pub rect: Rect,
}

/// Per-frame timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Host timestamp at frame start, in milliseconds.
    pub timestamp_ms: f64,
    /// Update phase duration (0 if not measured).
    pub update_ms: f64,
    /// Evaluate phase duration (0 if not measured).
    pub evaluate_ms: f64,
    /// Render phase duration (0 if not measured).
    pub render_ms: f64,
    /// Nodes whose world transform changed.
    pub transforms_changed: usize,
    /// Nodes whose render state changed.
    pub render_changed: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame-loop phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame-loop phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when the viewport changes.
    fn on_viewport_resize(&mut self, e: &ViewportResizeEvent) {
        _ = e;
    }

    /// Called after every stage refresh.
    fn on_stage_resize(&mut self, e: &StageResize) {
        _ = e;
    }

    /// Called with a per-frame timing summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ViewportResizeEvent`].
    #[inline]
    pub fn viewport_resize(&mut self, e: &ViewportResizeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_viewport_resize(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StageResize`].
    #[inline]
    pub fn stage_resize(&mut self, e: &StageResize) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stage_resize(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame: FrameBeginEvent,
    phase_starts: [Option<f64>; 3],
    phase_ends: [Option<f64>; 3],
    transforms_changed: usize,
    render_changed: usize,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(frame: &FrameBeginEvent) -> Self {
        Self {
            frame: *frame,
            phase_starts: [None; 3],
            phase_ends: [None; 3],
            transforms_changed: 0,
            render_changed: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: f64) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: f64) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records how many nodes changed this frame.
    pub fn set_change_counts(&mut self, transforms: usize, render: usize) {
        self.transforms_changed = transforms;
        self.render_changed = render;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame.frame_index,
            timestamp_ms: self.frame.timestamp_ms,
            update_ms: self.phase_duration(PhaseKind::Update),
            evaluate_ms: self.phase_duration(PhaseKind::Evaluate),
            render_ms: self.phase_duration(PhaseKind::Render),
            transforms_changed: self.transforms_changed,
            render_changed: self.render_changed,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> f64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) if end > start => end - start,
            _ => 0.0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Update => 0,
        PhaseKind::Evaluate => 1,
        PhaseKind::Render => 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            timestamp_ms: 1000.0,
            delta_ms: 16.0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_frame());
        sink.on_viewport_resize(&ViewportResizeEvent {
            rect: Rect::new(0.0, 0.0, 800.0, 600.0),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_frame());
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 42,
            phase: PhaseKind::Update,
            timestamp_ms: 1000.0,
        });
    }

    #[test]
    fn summary_builder_computes_durations() {
        let mut builder = FrameSummaryBuilder::new(&sample_frame());
        builder.phase_begin(PhaseKind::Update, 1000.0);
        builder.phase_end(PhaseKind::Update, 1000.5);
        builder.phase_begin(PhaseKind::Evaluate, 1000.5);
        builder.phase_end(PhaseKind::Evaluate, 1002.0);
        builder.phase_begin(PhaseKind::Render, 1002.0);
        builder.phase_end(PhaseKind::Render, 1006.0);
        builder.set_change_counts(3, 1);

        let summary = builder.finish();
        assert_eq!(summary.update_ms, 0.5);
        assert_eq!(summary.evaluate_ms, 1.5);
        assert_eq!(summary.render_ms, 4.0);
        assert_eq!(summary.transforms_changed, 3);
        assert_eq!(summary.frame_index, 42);
    }

    #[test]
    fn summary_builder_missing_phases_are_zero() {
        let summary = FrameSummaryBuilder::new(&sample_frame()).finish();
        assert_eq!(summary.update_ms, 0.0);
        assert_eq!(summary.evaluate_ms, 0.0);
        assert_eq!(summary.render_ms, 0.0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame_begin(&sample_frame());
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
    }
}

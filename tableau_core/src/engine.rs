// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine context and frame loop.
//!
//! [`Engine`] owns everything a running scene needs: configuration, the bound
//! [`Viewport`], the [`Stage`] (and through it the scene), the renderer
//! factory and the [`FrameClock`]. It is built once at startup and passed by
//! reference to whatever needs it; nothing is looked up globally.
//!
//! The host drives it from two places:
//!
//! - its resize event calls [`Engine::resize`] (or
//!   [`on_host_resize`](Engine::on_host_resize)), which runs the viewport
//!   check and the stage refresh to completion,
//! - its animation-frame callback calls [`Engine::tick`], which runs the
//!   update, evaluate and render phases in order.
//!
//! Both take a [`Tracer`] for instrumentation.

use crate::clock::{FrameClock, FrameTime};
use crate::config::EngineConfig;
use crate::driver::RendererFactory;
use crate::geometry::Rect;
use crate::scene::{FrameChanges, Scene};
use crate::stage::{Stage, StageResize};
use crate::trace::{
    FrameBeginEvent, FrameSummary, FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    Tracer, ViewportResizeEvent,
};
use crate::viewport::{DeviceInfo, HostContainer, Viewport};

/// The running scene and its collaborators.
#[derive(Debug)]
pub struct Engine<H, F> {
    config: EngineConfig,
    viewport: Viewport<H>,
    stage: Stage,
    factory: F,
    clock: FrameClock,
    changes: FrameChanges,
    last_frame: Option<FrameTime>,
    now: Option<fn() -> f64>,
}

impl<H: HostContainer, F: RendererFactory> Engine<H, F> {
    /// Binds `host`, builds the stage and runs its first refresh.
    pub fn new(config: EngineConfig, host: H, mut factory: F) -> Self {
        let viewport = Viewport::bind(
            host,
            DeviceInfo {
                pixel_ratio: config.stage.device_pixel_ratio,
                orientation: None,
            },
        );
        let mut stage = Stage::new(&config.stage, &mut factory);
        stage.set_guard_policy(config.guard_policy());
        let _ = stage.refresh(&viewport, &mut factory);
        log::debug!("engine started with {config:?}");

        Self {
            clock: FrameClock::new(config.max_frame_delta_ms),
            config,
            viewport,
            stage,
            factory,
            changes: FrameChanges::default(),
            last_frame: None,
            now: None,
        }
    }

    /// Re-reads the host rectangle; see [`resize`](Self::resize).
    pub fn on_host_resize(&mut self, tracer: &mut Tracer<'_>) -> Option<StageResize> {
        let rect = self.viewport.host().bounding_rect();
        self.resize(rect, tracer)
    }
}

impl<H, F: RendererFactory> Engine<H, F> {
    /// Uses `now` (milliseconds) to timestamp frame phases.
    ///
    /// Without a time source every phase is stamped with the frame's own
    /// timestamp and phase durations read as zero.
    #[must_use]
    pub fn with_time_source(mut self, now: fn() -> f64) -> Self {
        self.now = Some(now);
        self
    }

    /// Records a new host rectangle and, if it changed, refreshes the stage.
    pub fn resize(&mut self, rect: Rect, tracer: &mut Tracer<'_>) -> Option<StageResize> {
        let event = self.viewport.observe(rect)?;
        tracer.viewport_resize(&ViewportResizeEvent { rect: event.rect });
        let resize = self.stage.refresh(&self.viewport, &mut self.factory);
        tracer.stage_resize(&resize);
        Some(resize)
    }

    /// Runs one frame at host time `timestamp_ms`.
    pub fn tick(&mut self, timestamp_ms: f64, tracer: &mut Tracer<'_>) -> FrameSummary {
        let time = self.clock.advance(timestamp_ms);
        self.last_frame = Some(time);
        let begin = FrameBeginEvent {
            frame_index: time.frame_index,
            timestamp_ms,
            delta_ms: time.delta_ms,
        };
        tracer.frame_begin(&begin);
        let mut summary = FrameSummaryBuilder::new(&begin);

        let t = self.phase_begin(PhaseKind::Update, &begin, &mut summary, tracer);
        if let Some(resize) = self.stage.update(&self.viewport, &mut self.factory) {
            tracer.stage_resize(&resize);
        }
        self.phase_end(PhaseKind::Update, &begin, t, &mut summary, tracer);

        let t = self.phase_begin(PhaseKind::Evaluate, &begin, &mut summary, tracer);
        self.stage.scene_mut().evaluate_into(&mut self.changes);
        summary.set_change_counts(self.changes.transforms.len(), self.changes.render.len());
        self.phase_end(PhaseKind::Evaluate, &begin, t, &mut summary, tracer);

        let t = self.phase_begin(PhaseKind::Render, &begin, &mut summary, tracer);
        self.factory.render(self.stage.scene(), &self.changes);
        self.phase_end(PhaseKind::Render, &begin, t, &mut summary, tracer);

        let summary = summary.finish();
        tracer.frame_summary(&summary);
        summary
    }

    fn phase_begin(
        &self,
        phase: PhaseKind,
        frame: &FrameBeginEvent,
        summary: &mut FrameSummaryBuilder,
        tracer: &mut Tracer<'_>,
    ) -> f64 {
        let t = self.now.map_or(frame.timestamp_ms, |now| now());
        summary.phase_begin(phase, t);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: frame.frame_index,
            phase,
            timestamp_ms: t,
        });
        t
    }

    fn phase_end(
        &self,
        phase: PhaseKind,
        frame: &FrameBeginEvent,
        start: f64,
        summary: &mut FrameSummaryBuilder,
        tracer: &mut Tracer<'_>,
    ) {
        let t = self.now.map_or(start, |now| now());
        summary.phase_end(phase, t);
        tracer.phase_end(&PhaseEndEvent {
            frame_index: frame.frame_index,
            phase,
            timestamp_ms: t,
        });
    }

    /// Configuration the engine was started with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The bound viewport.
    #[must_use]
    pub fn viewport(&self) -> &Viewport<H> {
        &self.viewport
    }

    /// The bound viewport, mutably.
    pub fn viewport_mut(&mut self) -> &mut Viewport<H> {
        &mut self.viewport
    }

    /// The stage.
    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The stage, mutably.
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Shorthand for the stage's scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.stage.scene_mut()
    }

    /// The stage and the renderer factory together, for calls that need
    /// both (node creation, stage setters).
    pub fn stage_and_factory(&mut self) -> (&mut Stage, &mut F) {
        (&mut self.stage, &mut self.factory)
    }

    /// The renderer factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The renderer factory, mutably.
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Changes produced by the most recent frame.
    #[must_use]
    pub fn changes(&self) -> &FrameChanges {
        &self.changes
    }

    /// Clock reading of the most recent frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{RecordingDriver, RendererKind};
    use crate::geometry::Point;
    use crate::stage::ScaleMode;
    use crate::viewport::FixedHost;

    fn engine(w: f64, h: f64) -> Engine<FixedHost, RecordingDriver> {
        let mut config = EngineConfig::default();
        config.stage.width = 400.0;
        config.stage.height = 300.0;
        config.stage.scale_mode = ScaleMode::Contain;
        Engine::new(
            config,
            FixedHost(Rect::new(0.0, 0.0, w, h)),
            RecordingDriver::default(),
        )
    }

    #[test]
    fn startup_refreshes_the_stage() {
        let e = engine(800.0, 600.0);
        assert_eq!(e.stage().scale_factor(), 2.0);
        assert_eq!(e.factory().resizes, [(800.0, 600.0)]);
    }

    #[test]
    fn resize_runs_to_completion_before_the_next_frame() {
        let mut e = engine(800.0, 600.0);
        let mut tracer = Tracer::none();

        assert!(e.resize(Rect::new(0.0, 0.0, 800.0, 600.0), &mut tracer).is_none());
        let r = e.resize(Rect::new(0.0, 0.0, 1200.0, 600.0), &mut tracer).unwrap();
        assert_eq!(r.scale_factor, 2.0);
        assert_eq!(e.stage().x(), 100.0);

        // The frame's update phase sees the new size and does not refresh again.
        let _ = e.tick(0.0, &mut tracer);
        assert_eq!(e.factory().resizes.len(), 2);
    }

    #[test]
    fn tick_evaluates_then_renders() {
        let mut e = engine(800.0, 600.0);
        let mut tracer = Tracer::none();
        let (stage, factory) = e.stage_and_factory();
        let child = stage.scene_mut().create_node(RendererKind::Sprite, factory);
        stage.add_child(child).unwrap();
        stage.scene_mut().set_position(child, 10.0, 10.0).unwrap();

        let summary = e.tick(16.0, &mut tracer);
        assert_eq!(summary.frame_index, 0);
        assert_eq!(e.factory().frames, 1);
        assert!(e.changes().transforms.contains(&child.index()));
        assert!(e.changes().topology_changed);
        assert_eq!(
            e.scene_mut().local_to_global(child, Point::ORIGIN),
            Point::new(20.0, 20.0)
        );

        // Nothing changed: the next frame renders with an empty change set.
        let _ = e.tick(32.0, &mut tracer);
        assert_eq!(e.factory().frames, 2);
        assert!(e.changes().is_empty());
        assert_eq!(e.last_frame().map(|t| t.delta_ms), Some(16.0));
    }

    #[test]
    fn phases_use_the_time_source() {
        fn fake_now() -> f64 {
            7.0
        }
        let mut e = engine(800.0, 600.0).with_time_source(fake_now);
        let summary = e.tick(0.0, &mut Tracer::none());
        // Constant clock: every phase is zero-length.
        assert_eq!(summary.update_ms, 0.0);
        assert_eq!(summary.timestamp_ms, 0.0);
    }

    #[test]
    #[should_panic(expected = "`rotation` is not allowed on the stage")]
    fn strict_guards_reach_the_scene() {
        let mut config = EngineConfig::default();
        config.strict_guards = true;
        let mut e = Engine::new(
            config,
            FixedHost(Rect::new(0.0, 0.0, 10.0, 10.0)),
            RecordingDriver::default(),
        );
        let _ = e.stage_mut().set_rotation(1.0);
    }
}

//! Movement engine
//!
//! Owns the marker position and per-axis step vector and advances them
//! once per tick.
//!
//! # Tick
//!
//! ```text
//!           touch active? ──yes──▶ paint at touch target (any enabled state)
//!                │no
//!           enabled? ──no──▶ idle (marker stays put)
//!                │yes
//!   first tick / after touch / on an edge?
//!                │──yes──▶ recompute step for the affected axes
//!                ▼
//!   paint at position, then position += step
//! ```
//!
//! Steps divide the distance to the edge they head for, so the marker
//! lands exactly on the edge and never leaves `[0, bound]` on either axis.
//! A failed paint leaves position and steps untouched.

pub mod step;

use std::sync::Arc;

use crate::control::EngineContext;
use crate::display::{Bounds, Logo, Position, Renderer};
use crate::error::{Error, RenderError, Result};
use crate::hal::rng::RandomSource;
use crate::picker::BoundedRandomPicker;

/// Which input drives the marker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineMode {
    Autonomous,
    TouchOverride,
}

/// Observable state after the most recent tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Disabled and untouched: no motion
    Stopped,
    Autonomous,
    TouchOverride,
}

/// Signed per-axis displacement applied each autonomous tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepVector {
    pub dx: i32,
    pub dy: i32,
}

impl StepVector {
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Result of one tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Painted at the clamped touch target
    TouchFollowed(Position),
    /// Disabled; nothing painted
    Idle,
    /// Painted at `painted`, then advanced to `next`
    Moved { painted: Position, next: Position },
    /// Render failed; engine state unchanged
    Skipped(RenderError),
}

pub struct MovementEngine<R, D> {
    picker: BoundedRandomPicker<R>,
    renderer: D,
    bounds: Option<Bounds>,
    position: Position,
    steps: StepVector,
    mode: EngineMode,
    state: EngineState,
    /// Position was moved from outside the step sequence; all axes need
    /// fresh steps before moving again
    resync: bool,
}

impl<R: RandomSource, D: Renderer> MovementEngine<R, D> {
    /// Engine at the origin, zero steps, autonomous mode
    pub fn new(picker: BoundedRandomPicker<R>, renderer: D) -> Self {
        Self {
            picker,
            renderer,
            bounds: None,
            position: Position::ORIGIN,
            steps: StepVector::ZERO,
            mode: EngineMode::Autonomous,
            state: EngineState::Stopped,
            resync: false,
        }
    }

    /// Probe the renderer's surface and logo and fix the movement bounds.
    /// Missing resources are a [`Error::ResourceInitFailure`].
    pub fn start(&mut self) -> Result<Bounds> {
        let surface = self
            .renderer
            .surface()
            .ok_or_else(|| Error::init_failure("no framebuffer bound to the active console"))?;
        let logo = self
            .renderer
            .logo()
            .ok_or_else(|| Error::init_failure("logo asset missing"))?;

        let bounds = Bounds::for_logo(surface, &logo)?;
        log::debug!(
            "surface {}x{}, logo {}x{}, bounds ({}, {})",
            surface.width,
            surface.height,
            logo.width(),
            logo.height(),
            bounds.x,
            bounds.y
        );
        self.bounds = Some(bounds);
        Ok(bounds)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn steps(&self) -> StepVector {
        self.steps
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn renderer(&self) -> &D {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut D {
        &mut self.renderer
    }

    /// Consume the engine, returning its renderer
    pub fn into_renderer(self) -> D {
        self.renderer
    }

    /// Run one tick against the shared context.
    ///
    /// Starts the engine first if [`start`](Self::start) has not run; that
    /// is the only error path. Render failures come back as
    /// [`TickOutcome::Skipped`].
    pub fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome> {
        let bounds = match self.bounds {
            Some(bounds) => bounds,
            None => self.start()?,
        };

        let touch = ctx.touch();
        if touch.active {
            if self.mode != EngineMode::TouchOverride {
                log::debug!("entering touch override");
                self.mode = EngineMode::TouchOverride;
            }
            self.state = EngineState::TouchOverride;
            return Ok(self.follow_touch(bounds, touch.x, touch.y));
        }

        if self.mode == EngineMode::TouchOverride {
            log::debug!("touch released, resuming autonomous motion from {}", self.position);
            self.mode = EngineMode::Autonomous;
        }

        if !ctx.is_enabled() {
            self.state = EngineState::Stopped;
            return Ok(TickOutcome::Idle);
        }

        self.state = EngineState::Autonomous;
        Ok(self.advance(bounds))
    }

    fn follow_touch(&mut self, bounds: Bounds, x: i32, y: i32) -> TickOutcome {
        let Some(logo) = self.renderer.logo() else {
            return skipped(RenderError::LogoUnavailable);
        };

        let target = bounds.touch_target(x, y, logo.half_extent());
        if let Err(err) = self.renderer.paint(target, &logo) {
            return skipped(err);
        }

        self.position = target;
        self.resync = true;
        TickOutcome::TouchFollowed(target)
    }

    fn advance(&mut self, bounds: Bounds) -> TickOutcome {
        let mut position = self.position;
        let mut steps = self.steps;

        let recompute_all = steps.is_zero() || self.resync;
        if recompute_all || bounds.reaches_edge(position) {
            if recompute_all || position.x == 0 || position.x == bounds.x {
                steps.dx = step::axis_step(&mut self.picker, &mut position.x, bounds.x);
            }
            if recompute_all || position.y == 0 || position.y == bounds.y {
                steps.dy = step::axis_step(&mut self.picker, &mut position.y, bounds.y);
            }
            log::debug!("new steps ({}, {}) at {}", steps.dx, steps.dy, position);
        }

        let logo: Arc<Logo> = match self.renderer.logo() {
            Some(logo) => logo,
            None => return skipped(RenderError::LogoUnavailable),
        };
        if let Err(err) = self.renderer.paint(position, &logo) {
            return skipped(err);
        }

        self.steps = steps;
        self.resync = false;
        self.position = Position::new(position.x + steps.dx, position.y + steps.dy);
        log::trace!("painted at {}, next {}", position, self.position);

        TickOutcome::Moved {
            painted: position,
            next: self.position,
        }
    }
}

fn skipped(err: RenderError) -> TickOutcome {
    log::error!("render skipped: {err}");
    TickOutcome::Skipped(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Framebuffer, FramebufferRenderer, Rgb565};
    use crate::hal::rng::{SequenceSource, XorShiftSource};

    /// Surface sized so the bounds are (100, 50) for a 16x8 logo
    fn renderer() -> FramebufferRenderer {
        FramebufferRenderer::new(Framebuffer::new(116, 58), Logo::solid(16, 8, Rgb565::WHITE))
    }

    fn engine<R: RandomSource>(source: R) -> MovementEngine<R, FramebufferRenderer> {
        MovementEngine::new(BoundedRandomPicker::new(source), renderer())
    }

    fn enabled_ctx() -> EngineContext {
        let ctx = EngineContext::new();
        ctx.set_enabled(true);
        ctx
    }

    #[test]
    fn test_start_computes_bounds() {
        let mut engine = engine(SequenceSource::starved());
        assert_eq!(engine.start().unwrap(), Bounds::new(100, 50));
    }

    #[test]
    fn test_start_fails_without_logo() {
        let mut engine = engine(SequenceSource::starved());
        engine.renderer_mut().detach_logo();
        assert!(matches!(engine.start(), Err(Error::ResourceInitFailure { .. })));
    }

    #[test]
    fn test_first_tick_moves_inward() {
        let mut engine = engine(XorShiftSource::new(99));
        let ctx = enabled_ctx();

        let outcome = engine.tick(&ctx).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Moved {
                painted: Position::ORIGIN,
                next: engine.position()
            }
        );
        let p = engine.position();
        assert!(p.x > 0 && p.x <= 20, "x = {}", p.x);
        assert!(p.y > 0 && p.y <= 20, "y = {}", p.y);
        assert_eq!(100 % p.x, 0);
        assert_eq!(50 % p.y, 0);
        assert_eq!(engine.state(), EngineState::Autonomous);
    }

    #[test]
    fn test_disabled_engine_stays_put() {
        let mut engine = engine(XorShiftSource::new(5));
        let ctx = EngineContext::new();

        for _ in 0..10 {
            assert_eq!(engine.tick(&ctx).unwrap(), TickOutcome::Idle);
        }
        assert_eq!(engine.position(), Position::ORIGIN);
        assert_eq!(engine.renderer().paint_count(), 0);
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_touch_overrides_disabled_flag() {
        let mut engine = engine(SequenceSource::starved());
        let ctx = EngineContext::new();
        ctx.notify_touch(10, 5, true);

        assert_eq!(engine.tick(&ctx).unwrap(), TickOutcome::TouchFollowed(Position::new(2, 1)));
        assert_eq!(engine.renderer().last_painted(), Some(Position::new(2, 1)));
        assert_eq!(engine.mode(), EngineMode::TouchOverride);
        assert_eq!(engine.steps(), StepVector::ZERO);
    }

    #[test]
    fn test_touch_keeps_steps_while_enabled() {
        let mut engine = engine(XorShiftSource::new(77));
        let ctx = enabled_ctx();

        for _ in 0..3 {
            engine.tick(&ctx).unwrap();
        }
        let steps = engine.steps();
        assert!(!steps.is_zero());

        ctx.notify_touch(40, 20, true);
        for _ in 0..5 {
            assert_eq!(engine.tick(&ctx).unwrap(), TickOutcome::TouchFollowed(Position::new(32, 16)));
            assert_eq!(engine.steps(), steps);
            assert_eq!(engine.state(), EngineState::TouchOverride);
        }
    }

    #[test]
    fn test_extreme_touch_is_clamped() {
        let mut engine = engine(SequenceSource::starved());
        let ctx = EngineContext::new();

        ctx.notify_touch(i32::MIN, 5, true);
        assert_eq!(engine.tick(&ctx).unwrap(), TickOutcome::TouchFollowed(Position::new(0, 1)));

        ctx.notify_touch(i32::MAX, i32::MAX, true);
        assert_eq!(engine.tick(&ctx).unwrap(), TickOutcome::TouchFollowed(Position::new(100, 50)));
    }

    #[test]
    fn test_release_resumes_from_touch_position() {
        let mut engine = engine(XorShiftSource::new(1234));
        let ctx = enabled_ctx();

        for _ in 0..5 {
            engine.tick(&ctx).unwrap();
        }
        ctx.notify_touch(60, 30, true);
        engine.tick(&ctx).unwrap();
        assert_eq!(engine.position(), Position::new(52, 26));

        ctx.notify_touch(0, 0, false);
        match engine.tick(&ctx).unwrap() {
            TickOutcome::Moved { painted, .. } => assert_eq!(painted.y, 26),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(engine.mode(), EngineMode::Autonomous);
    }

    #[test]
    fn test_render_failure_leaves_state() {
        let mut engine = engine(XorShiftSource::new(3));
        let ctx = enabled_ctx();
        engine.start().unwrap();

        let fb = engine.renderer_mut().detach_framebuffer().unwrap();
        assert_eq!(engine.tick(&ctx).unwrap(), TickOutcome::Skipped(RenderError::SurfaceUnavailable));
        assert_eq!(engine.position(), Position::ORIGIN);
        assert_eq!(engine.steps(), StepVector::ZERO);

        engine.renderer_mut().attach_framebuffer(fb);
        assert!(matches!(engine.tick(&ctx).unwrap(), TickOutcome::Moved { .. }));
    }

    #[test]
    fn test_stays_in_bounds_over_many_ticks() {
        let mut engine = engine(XorShiftSource::new(0xfeed).starve_every(5));
        let ctx = enabled_ctx();
        let bounds = engine.start().unwrap();

        for _ in 0..5_000 {
            engine.tick(&ctx).unwrap();
            let p = engine.position();
            assert!(!bounds.out_of_range(p), "escaped to {p}");
        }
    }

    #[test]
    fn test_starved_source_degrades_to_unit_steps() {
        let mut engine = engine(SequenceSource::starved());
        let ctx = enabled_ctx();

        engine.tick(&ctx).unwrap();
        assert_eq!(engine.steps(), StepVector { dx: 1, dy: 1 });
        assert_eq!(engine.position(), Position::new(1, 1));
    }
}

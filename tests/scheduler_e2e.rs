//! End-to-end runs of the movement worker against an in-memory display

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use moving_tux::config::EngineConfig;
use moving_tux::display::{Framebuffer, FramebufferRenderer, Logo, Rgb565};
use moving_tux::hal::{NoButton, XorShiftSource};
use moving_tux::{
    BoundedRandomPicker, ControlSurface, EngineContext, EngineMode, EngineState, Error,
    MovementEngine, Position, Scheduler,
};

type Engine = MovementEngine<XorShiftSource, FramebufferRenderer>;

fn fast_config() -> EngineConfig {
    EngineConfig {
        tick_interval_ms: 1,
        button_poll_us: 10,
        ..EngineConfig::default()
    }
}

/// 116x58 surface with a 16x8 logo: bounds (100, 50)
fn engine(seed: u32) -> Engine {
    MovementEngine::new(
        BoundedRandomPicker::new(XorShiftSource::new(seed)),
        FramebufferRenderer::new(Framebuffer::new(116, 58), Logo::solid(16, 8, Rgb565::GREEN)),
    )
}

fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_ticks(scheduler: &Scheduler<XorShiftSource, FramebufferRenderer>, n: u64) {
    let target = scheduler.ticks() + n;
    wait_for(|| scheduler.ticks() >= target);
}

#[test]
fn test_kickstart_starts_and_stops_motion() {
    let ctx = Arc::new(EngineContext::new());
    let scheduler = Scheduler::spawn(engine(7), NoButton, Arc::clone(&ctx), &fast_config()).unwrap();
    let control = ControlSurface::new(&ctx);

    wait_ticks(&scheduler, 5);
    assert_eq!(control.show(), "0\n");

    assert_eq!(control.store("1\n").unwrap(), 2);
    assert_eq!(control.show(), "1\n");
    wait_ticks(&scheduler, 20);

    control.store("0").unwrap();
    // one tick may already be running with the old value
    wait_ticks(&scheduler, 2);

    let engine = scheduler.stop().unwrap();
    let painted = engine.renderer().paint_count();
    assert!(painted >= 19, "painted {painted}");
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn test_disabled_worker_never_paints() {
    let ctx = Arc::new(EngineContext::new());
    let scheduler = Scheduler::spawn(engine(11), NoButton, Arc::clone(&ctx), &fast_config()).unwrap();

    wait_ticks(&scheduler, 30);
    let engine = scheduler.stop().unwrap();

    assert_eq!(engine.renderer().paint_count(), 0);
    assert_eq!(engine.position(), Position::ORIGIN);
}

#[test]
fn test_invalid_store_keeps_flag() {
    let ctx = Arc::new(EngineContext::new());
    let control = ControlSurface::new(&ctx);
    control.store("1").unwrap();

    for input in ["2", "", "yes", "-1", "1\n\n"] {
        assert!(
            matches!(control.store(input), Err(Error::InvalidValue { .. })),
            "{input:?} accepted"
        );
    }
    assert!(ctx.is_enabled());

    // hex and octal spellings of the same values are fine
    control.store("0x0").unwrap();
    assert!(!ctx.is_enabled());
    control.store("01\n").unwrap();
    assert!(ctx.is_enabled());
}

#[test]
fn test_touch_wins_while_disabled() {
    let ctx = Arc::new(EngineContext::new());
    ctx.notify_touch(10, 5, true);
    let scheduler = Scheduler::spawn(engine(3), NoButton, Arc::clone(&ctx), &fast_config()).unwrap();

    wait_ticks(&scheduler, 5);
    let engine = scheduler.stop().unwrap();

    assert_eq!(engine.mode(), EngineMode::TouchOverride);
    assert_eq!(engine.renderer().last_painted(), Some(Position::new(2, 1)));
    assert_eq!(engine.position(), Position::new(2, 1));
    assert!(!ctx.is_enabled());
}

#[test]
fn test_release_resumes_from_touch_point() {
    let ctx = Arc::new(EngineContext::new());
    ctx.set_enabled(true);
    ctx.notify_touch(60, 30, true);
    let scheduler = Scheduler::spawn(engine(21), NoButton, Arc::clone(&ctx), &fast_config()).unwrap();

    wait_ticks(&scheduler, 5);
    ctx.notify_touch(0, 0, false);
    wait_ticks(&scheduler, 50);

    let engine = scheduler.stop().unwrap();
    assert_eq!(engine.mode(), EngineMode::Autonomous);
    assert_eq!(engine.state(), EngineState::Autonomous);

    let bounds = engine.bounds().unwrap();
    let p = engine.position();
    assert!((0..=bounds.x).contains(&p.x), "x = {}", p.x);
    assert!((0..=bounds.y).contains(&p.y), "y = {}", p.y);
}

#[test]
fn test_long_run_stays_in_bounds_on_starved_source() {
    let ctx = Arc::new(EngineContext::new());
    ctx.set_enabled(true);
    let engine = MovementEngine::new(
        BoundedRandomPicker::new(XorShiftSource::new(0xabcd).starve_every(3)),
        FramebufferRenderer::new(Framebuffer::new(240, 320), Logo::tux(80, 80)),
    );
    let scheduler = Scheduler::spawn(engine, NoButton, Arc::clone(&ctx), &fast_config()).unwrap();

    wait_ticks(&scheduler, 200);
    let engine = scheduler.stop().unwrap();

    let p = engine.position();
    assert!((0..=160).contains(&p.x), "x = {}", p.x);
    assert!((0..=240).contains(&p.y), "y = {}", p.y);
    // every tick painted: no out-of-range skips
    assert!(engine.renderer().paint_count() >= 200);
}

#[test]
fn test_snapshot_after_run() {
    let ctx = Arc::new(EngineContext::new());
    ctx.set_enabled(true);
    let scheduler = Scheduler::spawn(engine(5), NoButton, Arc::clone(&ctx), &fast_config()).unwrap();
    wait_ticks(&scheduler, 10);
    let engine = scheduler.stop().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.ppm");
    engine.renderer().framebuffer().unwrap().write_ppm(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"P6\n116 58\n255\n"));
}

//! Periodic movement worker
//!
//! One dedicated thread samples the button, runs a tick, then waits for
//! the tick interval or a stop request, whichever comes first. Stop is
//! only observed between ticks (or while waiting for a held button to be
//! released), so a tick is never interrupted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::config::EngineConfig;
use crate::control::EngineContext;
use crate::display::Renderer;
use crate::engine::MovementEngine;
use crate::error::{Error, Result};
use crate::hal::gpio::Button;
use crate::hal::rng::RandomSource;

/// Name given to the worker thread
pub const WORKER_NAME: &str = "moving-tux";

/// Handle to a running movement worker.
///
/// Dropping the handle stops the worker and waits for it.
pub struct Scheduler<R, D> {
    stop_tx: Sender<()>,
    join: Option<JoinHandle<Result<MovementEngine<R, D>>>>,
    ticks: Arc<AtomicU64>,
}

struct Worker<R, D, B> {
    engine: MovementEngine<R, D>,
    button: B,
    ctx: Arc<EngineContext>,
    stop_rx: Receiver<()>,
    interval: Duration,
    button_poll: Duration,
    ticks: Arc<AtomicU64>,
}

impl<R, D> Scheduler<R, D>
where
    R: RandomSource + Send + 'static,
    D: Renderer + Send + 'static,
{
    /// Start the worker thread. Resource checks run on the worker; a
    /// failure there ends the worker and is reported by [`stop`](Self::stop).
    pub fn spawn<B>(
        engine: MovementEngine<R, D>,
        button: B,
        ctx: Arc<EngineContext>,
        config: &EngineConfig,
    ) -> Result<Self>
    where
        B: Button + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticks = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            engine,
            button,
            ctx,
            stop_rx,
            interval: config.tick_interval(),
            button_poll: config.button_poll(),
            ticks: Arc::clone(&ticks),
        };

        let join = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker.run())
            .map_err(Error::WorkerSpawn)?;

        Ok(Self {
            stop_tx,
            join: Some(join),
            ticks,
        })
    }

    /// Engine ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// True once the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |j| j.is_finished())
    }

    /// Request a stop, wait for the worker, and hand back the engine
    pub fn stop(mut self) -> Result<MovementEngine<R, D>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<MovementEngine<R, D>> {
        let Some(join) = self.join.take() else {
            return Err(Error::WorkerPanicked);
        };
        // full channel means a stop is already pending; a closed one means
        // the worker is gone
        let _ = self.stop_tx.try_send(());
        join.join().map_err(|_| Error::WorkerPanicked)?
    }
}

impl<R, D> Drop for Scheduler<R, D> {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.stop_tx.try_send(());
            let _ = join.join();
        }
    }
}

impl<R, D, B> Worker<R, D, B>
where
    R: RandomSource,
    D: Renderer,
    B: Button,
{
    fn run(mut self) -> Result<MovementEngine<R, D>> {
        if let Err(err) = self.engine.start() {
            log::error!("moving tux worker not started: {err}");
            return Err(err);
        }
        log::info!("moving tux worker started, tick every {:?}", self.interval);

        loop {
            if self.button.is_pressed() {
                if !self.wait_for_release() {
                    break;
                }
                self.ctx.toggle_enabled();
            } else {
                match self.engine.tick(&self.ctx) {
                    Ok(_) => {}
                    Err(err) if err.is_recoverable() => log::warn!("tick skipped: {err}"),
                    Err(err) => log::error!("tick failed: {err}"),
                }
                self.ticks.fetch_add(1, Ordering::Relaxed);
            }

            if self.stop_requested(self.interval) {
                break;
            }
        }

        log::info!(
            "moving tux worker stopped after {} ticks at {}",
            self.ticks.load(Ordering::Relaxed),
            self.engine.position()
        );
        Ok(self.engine)
    }

    /// Poll until the button is released. Returns `false` if a stop was
    /// requested meanwhile.
    fn wait_for_release(&mut self) -> bool {
        while self.button.is_pressed() {
            if self.stop_requested(self.button_poll) {
                return false;
            }
        }
        true
    }

    fn stop_requested(&self, wait: Duration) -> bool {
        match self.stop_rx.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

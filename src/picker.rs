//! Bounded random step picker
//!
//! Turns a hardware random source into step magnitudes in `1..=max_step`
//! that evenly divide the distance left to travel, so a marker advancing
//! by whole steps lands exactly on the edge instead of overshooting it.

use crate::config::{DEFAULT_MAX_STEP, DEFAULT_RNG_RETRIES};
use crate::error::{Error, Result};
use crate::hal::rng::RandomSource;

/// Step returned when the retry budget runs out
pub const FALLBACK_STEP: u32 = 1;

pub struct BoundedRandomPicker<R> {
    source: R,
    retries: u32,
    max_step: u32,
}

impl<R: RandomSource> BoundedRandomPicker<R> {
    /// Picker with the default budget of 1000 draws and steps up to 20
    pub fn new(source: R) -> Self {
        Self::with_limits(source, DEFAULT_RNG_RETRIES, DEFAULT_MAX_STEP)
    }

    /// `max_step` is clamped to `1..=20`
    pub fn with_limits(source: R, retries: u32, max_step: u32) -> Self {
        Self {
            source,
            retries: retries.max(1),
            max_step: max_step.clamp(1, DEFAULT_MAX_STEP),
        }
    }

    pub fn max_step(&self) -> u32 {
        self.max_step
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    /// A step in `1..=max_step` dividing `limit`, or
    /// [`Error::RandomUnavailable`] once `retries` draws (ready or not)
    /// have produced no such value.
    pub fn try_pick_step(&mut self, limit: u32) -> Result<u32> {
        for _ in 0..self.retries {
            let Some(word) = self.source.try_read_u32() else {
                continue;
            };

            // 0 is excluded: the range is 1..=max_step
            let candidate = word % self.max_step + 1;
            if limit % candidate == 0 {
                return Ok(candidate);
            }
        }
        Err(Error::RandomUnavailable)
    }

    /// Like [`try_pick_step`](Self::try_pick_step), degrading to a unit
    /// step when the budget is exhausted.
    pub fn pick_step(&mut self, limit: u32) -> u32 {
        match self.try_pick_step(limit) {
            Ok(step) => step,
            Err(err) => {
                log::debug!("{err} after {} draws (limit {limit}), using step {FALLBACK_STEP}", self.retries);
                FALLBACK_STEP
            }
        }
    }

    /// Signed step for an axis sitting strictly between `0` and `limit`.
    ///
    /// One random bit picks the direction: odd heads towards `limit` with a
    /// step dividing the remaining distance, even heads towards `0` with a
    /// step dividing `current`. A not-ready sample counts as even.
    pub fn pick_signed_step(&mut self, limit: u32, current: u32) -> i32 {
        let word = self.source.try_read_u32().unwrap_or(0);
        if word % 2 == 1 {
            self.pick_step(limit.saturating_sub(current)) as i32
        } else {
            -(self.pick_step(current) as i32)
        }
    }
}

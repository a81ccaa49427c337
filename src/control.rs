//! Shared engine context and the `kickstart` control attribute
//!
//! The enabled flag is written from outside the worker (attribute writes)
//! and from the worker itself (button presses); both go through the same
//! lock. Touch reports are folded under a separate lock and read by the
//! worker as one snapshot per tick.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::touch::{TouchEvent, TouchState};

/// Name of the control attribute
pub const KICKSTART_ATTR: &str = "kickstart";

/// State shared between the movement worker and its collaborators
#[derive(Debug, Default)]
pub struct EngineContext {
    enabled: Mutex<bool>,
    touch: Mutex<TouchState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // guarded values are plain scalars, always consistent
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EngineContext {
    /// Disabled, no touch
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        *lock(&self.enabled)
    }

    /// Flip the enabled flag, returning the new value
    pub fn toggle_enabled(&self) -> bool {
        let mut enabled = lock(&self.enabled);
        *enabled = !*enabled;
        log::info!("tux movement {}", if *enabled { "enabled" } else { "disabled" });
        *enabled
    }

    /// Toggle only if `value` differs from the current flag. Compare and
    /// flip happen under one lock acquisition. Returns whether it toggled.
    pub fn set_enabled(&self, value: bool) -> bool {
        let mut enabled = lock(&self.enabled);
        if *enabled == value {
            return false;
        }
        *enabled = value;
        log::info!("tux movement {}", if value { "enabled" } else { "disabled" });
        true
    }

    /// Record a touch report (see [`TouchState::update`])
    pub fn notify_touch(&self, x: i32, y: i32, detected: bool) {
        if lock(&self.touch).update(x, y, detected) {
            log::debug!("touch at ({x}, {y}) detected={detected}");
        }
    }

    /// Feed an event from a touch controller. A point with zero pressure
    /// counts as a release.
    pub fn apply_touch_event(&self, event: TouchEvent) {
        match event.point() {
            Some(p) if p.pressure > 0 => self.notify_touch(p.x as i32, p.y as i32, true),
            _ => self.notify_touch(0, 0, false),
        }
    }

    /// Snapshot of the latest touch report
    pub fn touch(&self) -> TouchState {
        *lock(&self.touch)
    }
}

/// Parse an unsigned integer the way `strtoul(.., 0)` picks its base:
/// `0x`/`0X` hexadecimal, leading `0` octal, decimal otherwise.
fn parse_auto_radix(text: &str) -> Option<u64> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    if digits.is_empty() || digits.starts_with('+') || digits.starts_with('-') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// The boolean `kickstart` attribute exposed to the outside world
pub struct ControlSurface<'a> {
    ctx: &'a EngineContext,
}

impl<'a> ControlSurface<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self { ctx }
    }

    pub fn read_enabled(&self) -> bool {
        self.ctx.is_enabled()
    }

    /// Accepts the encodings of `0` and `1` (one trailing newline allowed).
    /// Anything else fails with [`Error::InvalidValue`] and leaves the flag
    /// untouched.
    pub fn write_enabled(&self, input: &str) -> Result<()> {
        let text = input.strip_suffix('\n').unwrap_or(input);
        let value = match parse_auto_radix(text) {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(Error::invalid_value(input)),
        };
        self.ctx.set_enabled(value);
        Ok(())
    }

    /// Canonical textual form: `"0\n"` or `"1\n"`
    pub fn show(&self) -> String {
        format!("{}\n", u8::from(self.read_enabled()))
    }

    /// Attribute-style write; returns the number of bytes consumed
    pub fn store(&self, input: &str) -> Result<usize> {
        self.write_enabled(input)?;
        Ok(input.len())
    }
}

//! Moving Tux for STM32 LCD boards
//!
//! Wanders a logo across the display using the hardware random number
//! generator, follows the finger while the screen is touched, and is
//! paused or resumed by the user button or the `kickstart` attribute.
//!
//! # Architecture
//!
//! ```text
//!   kickstart attr      touch controller       user button
//!        │                     │                    │
//!        ▼                     ▼                    │
//!  ┌──────────────────────────────────┐             │
//!  │          EngineContext           │◀────────────┤
//!  │   enabled (lock)   touch (lock)  │             │
//!  └────────────────┬─────────────────┘             │
//!                   ▼                               │
//!          ┌─────────────────┐               ┌──────┴──────┐
//!          │  MovementEngine │◀── tick ──────│  Scheduler  │
//!          └───┬─────────┬───┘   (100 ms)    └─────────────┘
//!              │         │
//!              ▼         ▼
//!     ┌────────────┐  ┌──────────┐
//!     │   Picker   │  │ Renderer │
//!     └─────┬──────┘  └──────────┘
//!           ▼
//!     ┌────────────┐
//!     │  RNG (HAL) │
//!     └────────────┘
//! ```
//!
//! # Guarantees
//!
//! - The marker never leaves `[0, bound]` on either axis
//! - Steps are in `1..=20` and divide the distance to the edge they head for
//! - Touch input always wins over autonomous motion, enabled or not
//! - Hardware and render failures never corrupt engine state

pub mod config;
pub mod control;
pub mod display;
pub mod engine;
pub mod error;
pub mod hal;
pub mod picker;
pub mod profiles;
pub mod scheduler;
pub mod touch;

// Re-export main types
pub use config::TuxConfig;
pub use control::{ControlSurface, EngineContext};
pub use display::{Bounds, Position, Renderer};
pub use engine::{EngineMode, EngineState, MovementEngine, StepVector, TickOutcome};
pub use error::{Error, RenderError, Result};
pub use picker::BoundedRandomPicker;
pub use scheduler::Scheduler;
pub use touch::{TouchEvent, TouchPoint, TouchState};

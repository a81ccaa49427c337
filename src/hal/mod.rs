//! Hardware Abstraction Layer for STM32F4
//!
//! Provides drivers for:
//! - RNG peripheral (random step source)
//! - GPIO input (user button)
//!
//! Both sit on top of a 32-bit register block so they can run against
//! real memory-mapped registers or an in-memory simulation.

pub mod gpio;
pub mod mmio;
pub mod rng;

pub use gpio::{Button, NoButton, ScriptedButton, Stm32Button};
pub use mmio::{RegisterBlock, SimulatedBlock, VolatileBlock};
pub use rng::{RandomSource, SequenceSource, Stm32Rng, XorShiftSource};

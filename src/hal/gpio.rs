//! STM32F4 GPIO input for the user button
//!
//! # Pin numbering
//!
//! Pins are numbered globally as `port * 16 + pin`, so PA0 is 0 and PB3
//! is 19. Each port owns a 0x400-byte register block.
//!
//! | Pin | Function    | Direction |
//! |-----|-------------|-----------|
//! | PA0 | User button | Input     |

use std::collections::VecDeque;

use super::mmio::{RegisterBlock, VolatileBlock};
use crate::error::{Error, Result};
use crate::profiles::BoardProfile;

/// Pins per GPIO port
pub const PORT_PINS: u32 = 16;

/// Distance between consecutive port register blocks
pub const PORT_STRIDE: usize = 0x400;

/// GPIO register offsets
pub mod regs {
    pub const MODER: usize = 0x00;  // Mode register
    pub const IDR: usize = 0x10;    // Input data register
}

/// Global pin number of `pin` on `port` (port A = 0)
pub const fn gpio_port_pin(port: u32, pin: u32) -> u32 {
    port * PORT_PINS + pin
}

/// PA0: user button
pub const USER_BUTTON: u32 = gpio_port_pin(0, 0);

/// A momentary push button sampled by the scheduler
pub trait Button {
    /// Current level; `true` while held down
    fn is_pressed(&mut self) -> bool;
}

impl<T: Button + ?Sized> Button for Box<T> {
    fn is_pressed(&mut self) -> bool {
        (**self).is_pressed()
    }
}

/// Button wired to an STM32 GPIO input (active high, as on the
/// discovery boards)
pub struct Stm32Button<B: RegisterBlock> {
    port: B,
    bit: u32,
}

impl<B: RegisterBlock> Stm32Button<B> {
    /// `port` is the register block of the pin's port; `pin` is the global
    /// pin number.
    pub fn new(port: B, pin: u32) -> Self {
        let bit = pin % PORT_PINS;
        // Input mode: MODER bits 2n+1:2n = 00
        port.clear_bits(regs::MODER, 0b11 << (bit * 2));
        Self { port, bit }
    }

    /// Offset of the port block for a global pin number, relative to GPIOA
    pub fn port_offset(pin: u32) -> usize {
        (pin / PORT_PINS) as usize * PORT_STRIDE
    }
}

impl<B: RegisterBlock> Button for Stm32Button<B> {
    fn is_pressed(&mut self) -> bool {
        self.port.read(regs::IDR) & (1 << self.bit) != 0
    }
}

impl Stm32Button<VolatileBlock> {
    /// Map the port block of the profile's user button.
    ///
    /// # Safety
    ///
    /// Must run on the board `profile` describes, with its GPIO ports
    /// mapped at their physical addresses.
    pub unsafe fn map(profile: &BoardProfile) -> Result<Self> {
        let (Some(pin), Some(gpio_base)) = (profile.button_pin, profile.gpio_base) else {
            return Err(Error::init_failure(format!("{} has no user button", profile.id)));
        };
        // SAFETY: the caller guarantees the port block is mapped
        let port = unsafe { VolatileBlock::new(gpio_base + Self::port_offset(pin)) };
        Ok(Self::new(port, pin))
    }
}

/// For boards without a button
#[derive(Debug, Default, Clone, Copy)]
pub struct NoButton;

impl Button for NoButton {
    fn is_pressed(&mut self) -> bool {
        false
    }
}

/// Replays recorded samples; released once the script runs out
#[derive(Debug, Default, Clone)]
pub struct ScriptedButton {
    samples: VecDeque<bool>,
}

impl ScriptedButton {
    pub fn new(samples: impl IntoIterator<Item = bool>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// One press held for `held` samples, preceded by `idle` released samples
    pub fn press_after(idle: usize, held: usize) -> Self {
        Self::new(
            std::iter::repeat(false)
                .take(idle)
                .chain(std::iter::repeat(true).take(held)),
        )
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl Button for ScriptedButton {
    fn is_pressed(&mut self) -> bool {
        self.samples.pop_front().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mmio::SimulatedBlock;

    #[test]
    fn test_pin_numbering() {
        assert_eq!(USER_BUTTON, 0);
        assert_eq!(gpio_port_pin(1, 3), 19);
        assert_eq!(Stm32Button::<SimulatedBlock>::port_offset(19), 0x400);
    }

    #[test]
    fn test_button_reads_idr_bit() {
        let port = SimulatedBlock::new(PORT_STRIDE);
        port.write(regs::MODER, 0b11 << 6);
        let mut button = Stm32Button::new(port.clone(), gpio_port_pin(1, 3));

        // forced to input mode
        assert_eq!(port.read(regs::MODER), 0);
        assert!(!button.is_pressed());

        port.write(regs::IDR, 1 << 3);
        assert!(button.is_pressed());
        port.write(regs::IDR, 1 << 4);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_map_requires_button() {
        let err = unsafe { Stm32Button::map(&crate::profiles::RPI4_SPI) }.err();
        assert!(matches!(err, Some(Error::ResourceInitFailure { .. })));
    }

    #[test]
    fn test_scripted_button_releases_when_done() {
        let mut button = ScriptedButton::press_after(1, 2);
        assert!(!button.is_pressed());
        assert!(button.is_pressed());
        assert!(button.is_pressed());
        assert!(!button.is_pressed());
        assert_eq!(button.remaining(), 0);
    }
}

//! 32-bit register block access
//!
//! Drivers address their peripheral through [`RegisterBlock`] using byte
//! offsets from the block base, as in the reference manual tables.

use std::sync::{Arc, Mutex, PoisonError};

/// A block of 32-bit peripheral registers
pub trait RegisterBlock {
    /// Read the register at `offset` bytes from the block base
    fn read(&self, offset: usize) -> u32;

    /// Write the register at `offset` bytes from the block base
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write
    fn modify<F: FnOnce(u32) -> u32>(&self, offset: usize, f: F) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    fn set_bits(&self, offset: usize, mask: u32) {
        self.modify(offset, |v| v | mask);
    }

    fn clear_bits(&self, offset: usize, mask: u32) {
        self.modify(offset, |v| v & !mask);
    }
}

/// Memory-mapped registers accessed with volatile loads and stores
#[derive(Debug)]
pub struct VolatileBlock {
    base: usize,
}

impl VolatileBlock {
    /// # Safety
    ///
    /// `base` must be the 4-byte aligned address of a register block that
    /// stays mapped for the lifetime of this value, and every offset the
    /// driver uses must fall inside it.
    pub unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for VolatileBlock {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: guaranteed by the contract of `VolatileBlock::new`
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: guaranteed by the contract of `VolatileBlock::new`
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}

/// In-memory register file shared between a driver and its test harness.
///
/// Clones alias the same registers, so a test can keep one handle and
/// flip status bits while the driver owns the other.
#[derive(Debug, Clone)]
pub struct SimulatedBlock {
    regs: Arc<Mutex<Vec<u32>>>,
}

impl SimulatedBlock {
    /// A block covering `len_bytes` bytes, all registers zero
    pub fn new(len_bytes: usize) -> Self {
        Self {
            regs: Arc::new(Mutex::new(vec![0; len_bytes.div_ceil(4)])),
        }
    }

    fn with_regs<T>(&self, f: impl FnOnce(&mut Vec<u32>) -> T) -> T {
        let mut regs = self.regs.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut regs)
    }
}

impl RegisterBlock for SimulatedBlock {
    fn read(&self, offset: usize) -> u32 {
        self.with_regs(|regs| regs.get(offset / 4).copied().unwrap_or(0))
    }

    fn write(&self, offset: usize, value: u32) {
        self.with_regs(|regs| {
            if let Some(slot) = regs.get_mut(offset / 4) {
                *slot = value;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_clones_share_state() {
        let block = SimulatedBlock::new(0x10);
        let alias = block.clone();

        block.write(0x4, 0xdead_beef);
        assert_eq!(alias.read(0x4), 0xdead_beef);

        alias.set_bits(0x0, 1 << 2);
        alias.clear_bits(0x4, 0xffff);
        assert_eq!(block.read(0x0), 0b100);
        assert_eq!(block.read(0x4), 0xdead_0000);
    }

    #[test]
    fn test_simulated_out_of_range_reads_zero() {
        let block = SimulatedBlock::new(0x8);
        block.write(0x40, 7);
        assert_eq!(block.read(0x40), 0);
    }

    #[test]
    fn test_volatile_block_over_memory() {
        let mut backing = [0u32; 4];
        let block = unsafe { VolatileBlock::new(backing.as_mut_ptr() as usize) };

        block.write(0x8, 42);
        block.set_bits(0x0, 0b101);
        assert_eq!(block.read(0x8), 42);
        assert_eq!(block.read(0x0), 0b101);
        drop(block);
        assert_eq!(backing, [0b101, 0, 42, 0]);
    }
}

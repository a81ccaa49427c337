//! STM32F4 Random Number Generator driver
//!
//! The RNG produces one 32-bit word every 40 periods of PLL48CLK. Each
//! sample waits that settle delay, then reads the data register only if
//! the status register reports data ready. Retry policy belongs to the
//! caller (see [`BoundedRandomPicker`](crate::picker::BoundedRandomPicker)).

use std::time::{Duration, Instant};

use super::mmio::{RegisterBlock, VolatileBlock};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::profiles::BoardProfile;

/// RNG register offsets
pub mod regs {
    /// Control register
    pub const CR: usize = 0x00;
    /// Status register
    pub const SR: usize = 0x04;
    /// Data register
    pub const DR: usize = 0x08;
}

/// CR: RNG enable
pub const CR_RNGEN: u32 = 1 << 2;
/// CR: interrupt enable
pub const CR_IE: u32 = 1 << 3;

/// SR: data ready
pub const SR_DRDY: u32 = 1 << 0;
/// SR: clock error current status
pub const SR_CECS: u32 = 1 << 1;
/// SR: seed error current status
pub const SR_SECS: u32 = 1 << 2;
/// SR: clock error interrupt status
pub const SR_CEIS: u32 = 1 << 5;
/// SR: seed error interrupt status
pub const SR_SEIS: u32 = 1 << 6;

/// RCC AHB2 peripheral clock enable register offset
pub const RCC_AHB2ENR: usize = 0x34;
/// AHB2ENR: RNG clock enable
pub const RCC_AHB2ENR_RNGEN: u32 = 1 << 6;

/// A source of hardware random words.
///
/// One call is one sample: no internal retry. `None` means the source had
/// nothing ready at sample time.
pub trait RandomSource {
    fn try_read_u32(&mut self) -> Option<u32>;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn try_read_u32(&mut self) -> Option<u32> {
        (**self).try_read_u32()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn try_read_u32(&mut self) -> Option<u32> {
        (**self).try_read_u32()
    }
}

/// Busy-wait for `delay`. The settle delay is sub-microsecond, far below
/// what the OS sleep granularity can honour.
fn settle(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    let start = Instant::now();
    while start.elapsed() < delay {
        std::hint::spin_loop();
    }
}

/// STM32F4 RNG peripheral
pub struct Stm32Rng<B: RegisterBlock> {
    rng: B,
    rcc: B,
    settle: Duration,
    enabled: bool,
}

impl<B: RegisterBlock> Stm32Rng<B> {
    /// Enable the RNG clock and the generator. The driver polls, so the
    /// data-ready interrupt is left off.
    pub fn init(rng: B, rcc: B, settle: Duration) -> Self {
        rcc.set_bits(RCC_AHB2ENR, RCC_AHB2ENR_RNGEN);
        rng.modify(regs::CR, |cr| (cr | CR_RNGEN) & !CR_IE);
        log::info!("STM32 hardware RNG initialized, settle {settle:?}");

        Self {
            rng,
            rcc,
            settle,
            enabled: true,
        }
    }

    /// Like [`init`](Self::init), with the settle delay taken from `config`
    pub fn from_config(rng: B, rcc: B, config: &EngineConfig) -> Self {
        Self::init(rng, rcc, config.rng_settle())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wait applied before every sample
    pub fn settle_delay(&self) -> Duration {
        self.settle
    }

    /// Gate the RNG clock off. Further reads report not-ready.
    pub fn shutdown(&mut self) {
        if self.enabled {
            self.rcc.clear_bits(RCC_AHB2ENR, RCC_AHB2ENR_RNGEN);
            self.enabled = false;
            log::debug!("STM32 hardware RNG clock disabled");
        }
    }
}

impl<B: RegisterBlock> RandomSource for Stm32Rng<B> {
    fn try_read_u32(&mut self) -> Option<u32> {
        if !self.enabled {
            return None;
        }

        settle(self.settle);

        let status = self.rng.read(regs::SR);
        if status & (SR_CECS | SR_SECS) != 0 {
            log::warn!(
                "RNG error status {:#x} (clock error: {}, seed error: {})",
                status,
                status & SR_CECS != 0,
                status & SR_SECS != 0
            );
            // interrupt status flags are cleared by writing zero
            self.rng.clear_bits(regs::SR, SR_CEIS | SR_SEIS);
            return None;
        }

        if status & SR_DRDY != 0 {
            let word = self.rng.read(regs::DR);
            log::trace!("RNG word {word:#010x}");
            Some(word)
        } else {
            None
        }
    }
}

impl Stm32Rng<VolatileBlock> {
    /// Map the RNG and RCC blocks named by `profile` and bring the
    /// generator up with the configured settle delay.
    ///
    /// # Safety
    ///
    /// Must run on the board `profile` describes, with its peripheral
    /// registers mapped at their physical addresses.
    pub unsafe fn map(profile: &BoardProfile, config: &EngineConfig) -> Result<Self> {
        let (Some(rng_base), Some(rcc_base)) = (profile.rng_base, profile.rcc_base) else {
            return Err(Error::init_failure(format!("{} has no hardware RNG", profile.id)));
        };
        // SAFETY: the caller guarantees both blocks are mapped
        let (rng, rcc) = unsafe { (VolatileBlock::new(rng_base), VolatileBlock::new(rcc_base)) };
        Ok(Self::from_config(rng, rcc, config))
    }
}

impl<B: RegisterBlock> Drop for Stm32Rng<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Software xorshift32 source for hosts without the peripheral.
///
/// With `starve_every(n)`, every n-th sample reports not-ready, imitating
/// a generator that cannot keep up with the sampling rate.
#[derive(Debug, Clone)]
pub struct XorShiftSource {
    state: u32,
    starve_every: Option<u32>,
    samples: u32,
}

impl XorShiftSource {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x2545_f491 } else { seed },
            starve_every: None,
            samples: 0,
        }
    }

    pub fn starve_every(mut self, n: u32) -> Self {
        self.starve_every = if n == 0 { None } else { Some(n) };
        self
    }

    fn next_word(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl RandomSource for XorShiftSource {
    fn try_read_u32(&mut self) -> Option<u32> {
        self.samples = self.samples.wrapping_add(1);
        if let Some(n) = self.starve_every {
            if self.samples % n == 0 {
                return None;
            }
        }
        Some(self.next_word())
    }
}

/// Replays a fixed sequence of samples, cycling when it reaches the end.
/// An empty sequence is permanently starved.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    samples: Vec<Option<u32>>,
    next: usize,
    reads: usize,
}

impl SequenceSource {
    pub fn new(samples: Vec<Option<u32>>) -> Self {
        Self {
            samples,
            next: 0,
            reads: 0,
        }
    }

    /// Every sample available, taken from `words`
    pub fn words(words: &[u32]) -> Self {
        Self::new(words.iter().copied().map(Some).collect())
    }

    /// Never ready
    pub fn starved() -> Self {
        Self::new(Vec::new())
    }

    /// Number of samples taken so far
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl RandomSource for SequenceSource {
    fn try_read_u32(&mut self) -> Option<u32> {
        self.reads += 1;
        if self.samples.is_empty() {
            return None;
        }
        let sample = self.samples[self.next];
        self.next = (self.next + 1) % self.samples.len();
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mmio::SimulatedBlock;

    fn peripheral() -> (Stm32Rng<SimulatedBlock>, SimulatedBlock, SimulatedBlock) {
        let rng_regs = SimulatedBlock::new(0x10);
        let rcc_regs = SimulatedBlock::new(0x40);
        let rng = Stm32Rng::init(rng_regs.clone(), rcc_regs.clone(), Duration::ZERO);
        (rng, rng_regs, rcc_regs)
    }

    #[test]
    fn test_init_enables_clock_and_generator() {
        let (rng, rng_regs, rcc_regs) = peripheral();
        assert!(rng.is_enabled());
        assert_eq!(rcc_regs.read(RCC_AHB2ENR) & RCC_AHB2ENR_RNGEN, RCC_AHB2ENR_RNGEN);
        assert_eq!(rng_regs.read(regs::CR) & CR_RNGEN, CR_RNGEN);
    }

    #[test]
    fn test_not_ready_returns_none() {
        let (mut rng, rng_regs, _) = peripheral();
        rng_regs.write(regs::DR, 1234);
        assert_eq!(rng.try_read_u32(), None);
    }

    #[test]
    fn test_data_ready_returns_word() {
        let (mut rng, rng_regs, _) = peripheral();
        rng_regs.write(regs::DR, 0xcafe_f00d);
        rng_regs.write(regs::SR, SR_DRDY);
        assert_eq!(rng.try_read_u32(), Some(0xcafe_f00d));
    }

    #[test]
    fn test_seed_error_discards_word() {
        let (mut rng, rng_regs, _) = peripheral();
        rng_regs.write(regs::DR, 99);
        rng_regs.write(regs::SR, SR_DRDY | SR_SECS);
        assert_eq!(rng.try_read_u32(), None);
    }

    #[test]
    fn test_error_clears_interrupt_status() {
        let (mut rng, rng_regs, _) = peripheral();
        rng_regs.write(regs::SR, SR_DRDY | SR_CECS | SR_CEIS | SR_SEIS);
        assert_eq!(rng.try_read_u32(), None);
        assert_eq!(rng_regs.read(regs::SR), SR_DRDY | SR_CECS);
    }

    #[test]
    fn test_init_leaves_interrupt_off() {
        let rng_regs = SimulatedBlock::new(0x10);
        rng_regs.write(regs::CR, CR_IE);
        let _rng = Stm32Rng::init(rng_regs.clone(), SimulatedBlock::new(0x40), Duration::ZERO);
        assert_eq!(rng_regs.read(regs::CR), CR_RNGEN);
    }

    #[test]
    fn test_configured_settle_reaches_driver() {
        let config = EngineConfig {
            rng_settle_ns: 5_000,
            ..EngineConfig::default()
        };
        let rng = Stm32Rng::from_config(SimulatedBlock::new(0x10), SimulatedBlock::new(0x40), &config);
        assert_eq!(rng.settle_delay(), Duration::from_micros(5));

        let rng = Stm32Rng::from_config(
            SimulatedBlock::new(0x10),
            SimulatedBlock::new(0x40),
            &EngineConfig::default(),
        );
        assert_eq!(rng.settle_delay(), crate::config::RNG_SETTLE_DELAY);
    }

    #[test]
    fn test_map_requires_rng_block() {
        let err = unsafe { Stm32Rng::map(&crate::profiles::RPI4_SPI, &EngineConfig::default()) }.err();
        assert!(matches!(err, Some(Error::ResourceInitFailure { .. })));
    }

    #[test]
    fn test_drop_gates_clock() {
        let (rng, _, rcc_regs) = peripheral();
        drop(rng);
        assert_eq!(rcc_regs.read(RCC_AHB2ENR) & RCC_AHB2ENR_RNGEN, 0);
    }

    #[test]
    fn test_settle_delay_is_honoured() {
        let rng_regs = SimulatedBlock::new(0x10);
        let rcc_regs = SimulatedBlock::new(0x40);
        let mut rng = Stm32Rng::init(rng_regs, rcc_regs, Duration::from_micros(200));

        let start = Instant::now();
        rng.try_read_u32();
        assert!(start.elapsed() >= Duration::from_micros(200));
    }

    #[test]
    fn test_xorshift_starvation() {
        let mut source = XorShiftSource::new(7).starve_every(3);
        let samples: Vec<_> = (0..6).map(|_| source.try_read_u32()).collect();
        assert!(samples[0].is_some() && samples[1].is_some());
        assert_eq!(samples[2], None);
        assert_eq!(samples[5], None);
    }

    #[test]
    fn test_sequence_source_cycles() {
        let mut source = SequenceSource::new(vec![Some(1), None]);
        assert_eq!(source.try_read_u32(), Some(1));
        assert_eq!(source.try_read_u32(), None);
        assert_eq!(source.try_read_u32(), Some(1));
        assert_eq!(source.reads(), 3);
    }
}

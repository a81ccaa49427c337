//! Controller configuration
//!
//! Loaded from TOML. Every field has a default, so a partial file (or no
//! file at all) yields a working configuration for the simulator profile.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::profiles::{get_profile, BoardProfile};

/// Scheduler period
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Draws attempted by the picker before it falls back to a unit step
pub const DEFAULT_RNG_RETRIES: u32 = 1000;

/// Largest step magnitude per axis
pub const DEFAULT_MAX_STEP: u32 = 20;

/// RNG reference clock in MHz
pub const RNG_REFERENCE_MHZ: u64 = 48;

/// Reference clock periods between two consecutive random words
pub const RNG_SETTLE_CYCLES: u64 = 40;

/// Settle delay before each RNG sample (40 cycles of 48 MHz, ~833 ns)
pub const RNG_SETTLE_DELAY: Duration =
    Duration::from_nanos(RNG_SETTLE_CYCLES * 1000 / RNG_REFERENCE_MHZ);

/// Longest settle delay accepted from a config file. The driver spins for
/// the whole delay on every sample.
pub const MAX_RNG_SETTLE: Duration = Duration::from_millis(1);

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuxConfig {
    /// Board profile the geometry was taken from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub display: DisplayConfig,
    pub marker: MarkerConfig,
    pub engine: EngineConfig,
}

/// Display surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

/// Marker (logo) size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub width: u32,
    pub height: u32,
}

/// Timing and randomness knobs of the movement engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    pub rng_retries: u32,
    pub max_step: u32,
    pub rng_settle_ns: u64,
    pub button_poll_us: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            rng_retries: DEFAULT_RNG_RETRIES,
            max_step: DEFAULT_MAX_STEP,
            rng_settle_ns: RNG_SETTLE_DELAY.as_nanos() as u64,
            button_poll_us: 200,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn rng_settle(&self) -> Duration {
        Duration::from_nanos(self.rng_settle_ns)
    }

    pub fn button_poll(&self) -> Duration {
        Duration::from_micros(self.button_poll_us)
    }
}

impl Default for TuxConfig {
    fn default() -> Self {
        Self {
            profile: None,
            display: DisplayConfig::default(),
            marker: MarkerConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl TuxConfig {
    /// Configuration seeded from a board profile
    pub fn for_profile(profile: &BoardProfile) -> Self {
        Self {
            profile: Some(profile.id.to_string()),
            display: DisplayConfig {
                width: profile.display_width,
                height: profile.display_height,
            },
            marker: MarkerConfig {
                width: profile.logo_width,
                height: profile.logo_height,
            },
            engine: EngineConfig::default(),
        }
    }

    /// Replace display and marker geometry with the named profile's
    pub fn with_profile(mut self, name: &str) -> Result<Self> {
        let profile =
            get_profile(name).ok_or_else(|| Error::Config(format!("unknown board profile: {name}")))?;
        self.profile = Some(profile.id.to_string());
        self.display = DisplayConfig {
            width: profile.display_width,
            height: profile.display_height,
        };
        self.marker = MarkerConfig {
            width: profile.logo_width,
            height: profile.logo_height,
        };
        Ok(self)
    }

    /// Parse from TOML text.
    ///
    /// A `profile` key supplies geometry; explicit `[display]`/`[marker]`
    /// tables in the same file are ignored in that case.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TuxConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let config = match config.profile.clone() {
            Some(name) => config.with_profile(&name)?,
            None => config,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(Error::Config("display size must be non-zero".to_string()));
        }
        if self.marker.width == 0 || self.marker.height == 0 {
            return Err(Error::Config("marker size must be non-zero".to_string()));
        }
        if !(1..=DEFAULT_MAX_STEP).contains(&self.engine.max_step) {
            return Err(Error::Config(format!(
                "max_step must be in 1..={DEFAULT_MAX_STEP}, got {}",
                self.engine.max_step
            )));
        }
        if self.engine.rng_retries == 0 {
            return Err(Error::Config("rng_retries must be at least 1".to_string()));
        }
        if self.engine.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be at least 1".to_string()));
        }
        if self.engine.rng_settle() > MAX_RNG_SETTLE {
            return Err(Error::Config(format!(
                "rng_settle_ns must be at most {}",
                MAX_RNG_SETTLE.as_nanos()
            )));
        }
        Ok(())
    }
}

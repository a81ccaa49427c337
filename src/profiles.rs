//! Board profiles
//!
//! Built-in display and peripheral layouts for the boards the controller
//! has been brought up on. A profile fills in the display and marker
//! geometry of a [`TuxConfig`](crate::config::TuxConfig).

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::hal::gpio::{gpio_port_pin, USER_BUTTON};

/// Geometry and peripheral map of a supported board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    /// Short identifier (e.g., "stm32f429-disco")
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub description: &'static str,
    /// Visible display resolution in pixels
    pub display_width: u32,
    pub display_height: u32,
    /// Size of the logo asset drawn by the controller
    pub logo_width: u32,
    pub logo_height: u32,
    /// Global GPIO number of the user button, if the board has one
    pub button_pin: Option<u32>,
    /// Register block base addresses (None on boards without the peripheral)
    pub rng_base: Option<usize>,
    pub rcc_base: Option<usize>,
    pub gpio_base: Option<usize>,
}

/// STM32F429I-DISCO: 2.4" QVGA panel in portrait, blue user button on PA0
pub static STM32F429_DISCO: Lazy<BoardProfile> = Lazy::new(|| BoardProfile {
    id: "stm32f429-disco",
    name: "STM32F429I-DISCO",
    description: "STM32F429 discovery kit with 240x320 LTDC panel",
    display_width: 240,
    display_height: 320,
    logo_width: 80,
    logo_height: 80,
    button_pin: Some(USER_BUTTON),
    // AHB2 peripheral base + 0x60800
    rng_base: Some(0x5000_0000 + 0x6_0800),
    rcc_base: Some(0x4002_3800),
    gpio_base: Some(0x4002_0000),
});

/// ILI9341 SPI panel in landscape (no board button, no hardware RNG)
pub static RPI4_SPI: Lazy<BoardProfile> = Lazy::new(|| BoardProfile {
    id: "rpi4-spi",
    name: "Raspberry Pi 4 + ILI9341",
    description: "320x240 SPI LCD with XPT2046 touch",
    display_width: 320,
    display_height: 240,
    logo_width: 80,
    logo_height: 80,
    button_pin: None,
    rng_base: None,
    rcc_base: None,
    gpio_base: None,
});

/// Host simulation profile
pub static SIM: Lazy<BoardProfile> = Lazy::new(|| BoardProfile {
    id: "sim",
    name: "Simulator",
    description: "In-memory framebuffer with software random source",
    display_width: 320,
    display_height: 240,
    logo_width: 64,
    logo_height: 64,
    button_pin: Some(gpio_port_pin(0, 0)),
    rng_base: None,
    rcc_base: None,
    gpio_base: None,
});

/// Registry of built-in profiles, keyed by id and alias
pub static BOARD_PROFILES: Lazy<HashMap<&'static str, &'static BoardProfile>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("stm32f429-disco", &*STM32F429_DISCO);
    m.insert("stm32f4", &*STM32F429_DISCO);
    m.insert("rpi4-spi", &*RPI4_SPI);
    m.insert("ili9341", &*RPI4_SPI);
    m.insert("sim", &*SIM);
    m.insert("default", &*SIM);
    m
});

/// Get a board profile by id or alias
pub fn get_profile(name: &str) -> Option<&'static BoardProfile> {
    BOARD_PROFILES.get(name.to_lowercase().as_str()).copied()
}

/// Profile ids only (aliases removed)
pub fn profile_names() -> Vec<&'static str> {
    let mut names = vec![STM32F429_DISCO.id, RPI4_SPI.id, SIM.id];
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_alias() {
        let profile = get_profile("STM32F4").unwrap();
        assert_eq!(profile.id, "stm32f429-disco");
        assert_eq!(profile.rng_base, Some(0x5006_0800));
        assert_eq!(profile.button_pin, Some(0));
    }

    #[test]
    fn test_unknown_profile() {
        assert!(get_profile("esp32").is_none());
    }

    #[test]
    fn test_names_are_registered() {
        for name in profile_names() {
            assert!(get_profile(name).is_some(), "{name} missing from registry");
        }
    }
}

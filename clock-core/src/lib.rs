#![cfg_attr(not(feature = "std"), no_std)]

//! # Clock Core
//!
//! Event-driven logic for a four-digit, seven-segment LED-filament clock.
//! Keeps calibrated time from an RTC tick, debounces two buttons, edits
//! calibration and brightness, and cross-fades digit changes with a
//! multiplexed soft-PWM ramp.

pub mod types;
pub mod segment;
pub mod display;
pub mod buttons;
pub mod mode;
pub mod timekeeper;
pub mod store;
pub mod clock;
pub mod hal;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use segment::{encode, encode_code, Glyph};
pub use display::{DigitRamp, Display, DIGIT_COUNT};
pub use buttons::*;
pub use mode::*;
pub use timekeeper::*;
pub use store::{ConfigStore, Settings};
pub use clock::Clock;
pub use hal::*;

/// Clock library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Preset for a board's RTC tick frequency. Unknown rates fall back to
/// revision A.
pub fn config_for_tick_hz(tick_hz: u16) -> ClockConfig {
    match tick_hz {
        2048 => ClockConfig::rev_b(),
        _ => ClockConfig::default(),
    }
}

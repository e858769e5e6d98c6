#![cfg_attr(not(test), no_std)]

//! CH32V003 board support for the LED-filament clock

pub use clock_core::*;

pub use crate::ch32v003_hardware::*;
pub use crate::flash::*;

pub mod ch32v003_hardware;
pub mod flash;

/// The clock as it runs on the board
pub type BoardClock = Clock<Ch32v003ClockHal, SectorStorage<Ch32v003Flash>>;

/// Square-wave rate of the fitted RTC
#[cfg(feature = "rtc-2048hz")]
pub const RTC_HZ: u16 = 2048;
#[cfg(not(feature = "rtc-2048hz"))]
pub const RTC_HZ: u16 = 1024;

/// Timing preset matching the fitted RTC
pub fn board_config() -> ClockConfig {
    config_for_tick_hz(RTC_HZ)
}

/// Dispatch pending multiplex timer events in counter order
pub fn dispatch_timer_events<H, S>(clock: &mut Clock<H, S>, flags: u32)
where
    H: ClockHal,
    S: embedded_storage::Storage,
{
    if flags & TIM_UIF != 0 {
        clock.on_digit_select();
    }
    if flags & TIM_CC1IF != 0 {
        clock.on_ramp_stop();
    }
    if flags & TIM_CC2IF != 0 {
        clock.on_blanking();
    }
}

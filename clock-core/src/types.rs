//! Core value types and configuration for the clock

/// Signed RTC correction in calibration units.
///
/// One unit is one tick added to (or removed from) the sub-second
/// accumulator per calibration window, which is about 1 ppm at 1024 Hz.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration(i16);

impl Calibration {
    pub const MIN: i16 = -999;
    pub const MAX: i16 = 999;
    pub const DEFAULT: Calibration = Calibration(0);

    /// Returns `None` if `value` is outside `[MIN, MAX]`
    pub const fn new(value: i16) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(&self) -> i16 {
        self.0
    }

    /// Increment, saturating at `MAX`
    pub const fn step_up(self) -> Self {
        if self.0 < Self::MAX {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    /// Decrement, saturating at `MIN`
    pub const fn step_down(self) -> Self {
        if self.0 > Self::MIN {
            Self(self.0 - 1)
        } else {
            self
        }
    }
}

/// Display brightness level, linear from 0 (dimmest) to 8 (brightest).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 8;
    /// Mid-scale
    pub const DEFAULT: Brightness = Brightness(4);

    /// Returns `None` if `level` is above `MAX`
    pub const fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX {
            Some(Self(level))
        } else {
            None
        }
    }

    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Increment, saturating at `MAX`
    pub const fn step_up(self) -> Self {
        if self.0 < Self::MAX {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    /// Decrement, saturating at `MIN`
    pub const fn step_down(self) -> Self {
        if self.0 > Self::MIN {
            Self(self.0 - 1)
        } else {
            self
        }
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Clock timing and dimming parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// RTC tick frequency in Hz
    pub tick_hz: u16,
    /// Ticks a button must be held before its first action fires
    pub button_cooldown: u16,
    /// Ticks a button must be held to enter long-press autorepeat
    pub button_longpress: u16,
    /// Autorepeat rate while long-pressed
    pub autorepeat_hz: u16,
    /// Idle seconds before an edit mode falls back to normal
    pub mode_timeout_s: u8,
    /// Ramp compare value at the start of every fade (x/256)
    pub ramp_min: u8,
    /// Ramp increase per full 4-digit scan cycle
    pub ramp_inc: u8,
    /// Distance kept between the ramp ceiling and the blanking compare
    pub ramp_headroom: u8,
    /// Blanking compare at brightness level 0 (x/256)
    pub brightness_base: u8,
    /// Blanking compare added per brightness level
    pub brightness_step: u8,
}

impl Default for ClockConfig {
    /// Hardware revision A: 1024 Hz RTC tick
    fn default() -> Self {
        Self {
            tick_hz: 1024,
            button_cooldown: 200,
            button_longpress: 2000,
            autorepeat_hz: 4,
            mode_timeout_s: 5,
            ramp_min: 16,
            ramp_inc: 4,
            ramp_headroom: 16,
            brightness_base: 122,
            brightness_step: 16,
        }
    }
}

impl ClockConfig {
    /// Hardware revision B: 2048 Hz RTC tick, same wall-clock button timings
    pub fn rev_b() -> Self {
        Self {
            tick_hz: 2048,
            button_cooldown: 400,
            button_longpress: 4000,
            ..Self::default()
        }
    }

    /// Create a new configuration with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tick_hz: u16,
        button_cooldown: u16,
        button_longpress: u16,
        autorepeat_hz: u16,
        mode_timeout_s: u8,
        ramp_min: u8,
        ramp_inc: u8,
        ramp_headroom: u8,
        brightness_base: u8,
        brightness_step: u8,
    ) -> Result<Self, &'static str> {
        if !(64..=8192).contains(&tick_hz) {
            return Err("Tick frequency must be between 64 and 8192 Hz");
        }
        if autorepeat_hz == 0 || tick_hz % autorepeat_hz != 0 {
            return Err("Autorepeat rate must divide the tick frequency");
        }
        if button_cooldown == 0 || button_cooldown >= button_longpress {
            return Err("Button cooldown must be non-zero and below the long-press threshold");
        }
        if mode_timeout_s == 0 {
            return Err("Mode timeout must be at least one second");
        }
        if ramp_inc == 0 {
            return Err("Ramp increment must be non-zero");
        }
        let top = brightness_base as u16 + Brightness::MAX as u16 * brightness_step as u16;
        if top > u8::MAX as u16 {
            return Err("Brightest duty must fit the 8-bit compare register");
        }
        if ramp_min as u16 + ramp_headroom as u16 >= brightness_base as u16 {
            return Err("Ramp ceiling must stay above the ramp floor at every brightness");
        }

        Ok(Self {
            tick_hz,
            button_cooldown,
            button_longpress,
            autorepeat_hz,
            mode_timeout_s,
            ramp_min,
            ramp_inc,
            ramp_headroom,
            brightness_base,
            brightness_step,
        })
    }

    /// Blanking compare value (absolute duty, x/256) for a brightness level
    pub const fn duty(&self, brightness: Brightness) -> u8 {
        self.brightness_base
            .saturating_add(brightness.get().saturating_mul(self.brightness_step))
    }

    /// Highest ramp compare value reachable at a brightness level
    pub const fn ramp_max(&self, brightness: Brightness) -> u8 {
        self.duty(brightness).saturating_sub(self.ramp_headroom)
    }

    /// Ticks between two autorepeat boundaries
    pub const fn autorepeat_period(&self) -> u16 {
        self.tick_hz / self.autorepeat_hz
    }
}

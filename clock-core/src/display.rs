//! Multiplexed soft-PWM renderer
//!
//! Each of the four digits is lit for one timer slot per scan cycle. A slot
//! is split at the ramp compare: before it the digit shows its new pattern,
//! after it (while the fade is still running) the digit falls back to its
//! old pattern. As the shared ramp level climbs once per scan cycle, newly
//! lit segments brighten and extinguished segments dim out until the ramp
//! saturates and only the new pattern remains.

use crate::segment::{encode, Glyph, BLANK, SEGMENT_MASK};

/// Number of multiplexed digits
pub const DIGIT_COUNT: usize = 4;

/// Fade state of one digit
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DigitRamp {
    on: u8,
    rising: u8,
    falling: u8,
}

impl DigitRamp {
    pub const fn new() -> Self {
        Self {
            on: BLANK,
            rising: BLANK,
            falling: BLANK,
        }
    }

    /// Start fading towards `pattern`.
    ///
    /// Pending rising segments are folded into the on-state and pending
    /// falling segments are dropped first, so the new fade starts from the
    /// last visible state. Returns true if any segment has to fade.
    pub fn set_target(&mut self, pattern: u8) -> bool {
        let pattern = pattern & SEGMENT_MASK;
        self.on |= self.rising;
        self.on &= !self.falling;

        let diff = self.on ^ pattern;
        self.rising = diff & !self.on;
        self.falling = diff & self.on;

        diff != 0
    }

    /// Pattern this digit is fading towards
    pub const fn target(&self) -> u8 {
        (self.on | self.rising) & !self.falling
    }

    /// Pattern driven from digit-select until the ramp compare
    pub const fn lit(&self) -> u8 {
        self.target()
    }

    /// Pattern driven from the ramp compare until blanking
    pub const fn faded(&self) -> u8 {
        (self.on & !self.rising) | self.falling
    }

    pub const fn on(&self) -> u8 {
        self.on
    }

    pub const fn rising(&self) -> u8 {
        self.rising
    }

    pub const fn falling(&self) -> u8 {
        self.falling
    }
}

/// Four fading digits plus the shared ramp and scan position
#[derive(Clone, Debug)]
pub struct Display {
    digits: [DigitRamp; DIGIT_COUNT],
    ramp_level: u8,
    ramp_min: u8,
    ramp_max: u8,
    ramp_inc: u8,
    current: usize,
}

impl Display {
    pub const fn new(ramp_min: u8, ramp_max: u8, ramp_inc: u8) -> Self {
        Self {
            digits: [DigitRamp::new(); DIGIT_COUNT],
            ramp_level: ramp_min,
            ramp_min,
            ramp_max,
            ramp_inc,
            current: 0,
        }
    }

    /// Push a new screen. An identical screen is ignored so it never cancels
    /// a running fade. Otherwise every digit restarts from its visible state
    /// together with the shared ramp, and the caller must reload the ramp
    /// compare. Returns true in that case.
    pub fn render(&mut self, glyphs: [Glyph; DIGIT_COUNT]) -> bool {
        let patterns = glyphs.map(encode);
        if self.targets() == patterns {
            return false;
        }
        for (digit, pattern) in self.digits.iter_mut().zip(patterns) {
            digit.set_target(pattern);
        }
        self.ramp_level = self.ramp_min;
        true
    }

    /// Digit-select event: index to enable and the pattern to drive
    pub fn digit_select(&self) -> (usize, u8) {
        (self.current, self.digits[self.current].lit())
    }

    /// Ramp-stop event: pattern for the rest of the slot, or `None` once the
    /// fade has saturated
    pub fn ramp_stop(&self) -> Option<u8> {
        if self.ramp_level < self.ramp_max {
            Some(self.digits[self.current].faded())
        } else {
            None
        }
    }

    /// Blanking event: advance to the next digit. After the last digit the
    /// ramp climbs one step and the new compare value is returned.
    pub fn blanking(&mut self) -> Option<u8> {
        self.current = (self.current + 1) % DIGIT_COUNT;
        if self.current == 0 {
            self.ramp_level = self.clamp(self.ramp_level.saturating_add(self.ramp_inc));
            Some(self.ramp_level)
        } else {
            None
        }
    }

    /// Change the ramp ceiling (brightness change)
    pub fn set_ramp_max(&mut self, ramp_max: u8) {
        self.ramp_max = ramp_max;
        self.ramp_level = self.clamp(self.ramp_level);
    }

    pub const fn ramp_level(&self) -> u8 {
        self.ramp_level
    }

    pub const fn ramp_max(&self) -> u8 {
        self.ramp_max
    }

    pub const fn current_digit(&self) -> usize {
        self.current
    }

    pub fn digit(&self, index: usize) -> Option<&DigitRamp> {
        self.digits.get(index)
    }

    /// Patterns every digit is fading towards
    pub fn targets(&self) -> [u8; DIGIT_COUNT] {
        let mut out = [BLANK; DIGIT_COUNT];
        for (slot, digit) in out.iter_mut().zip(self.digits.iter()) {
            *slot = digit.target();
        }
        out
    }

    fn clamp(&self, level: u8) -> u8 {
        level.max(self.ramp_min).min(self.ramp_max)
    }
}

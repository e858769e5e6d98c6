//! Edit-mode state machine
//!
//! The two buttons set the time in normal mode and edit the persisted
//! parameters in the two edit modes. Holding both buttons past the long-press
//! threshold cycles normal → calibration → brightness → normal. Edit modes
//! fall back to normal after a few idle seconds.

use crate::buttons::{ButtonDebouncer, ButtonId};

#[cfg(feature = "defmt")]
use defmt::{debug, info};

/// Display / edit mode
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Show and set the time
    #[default]
    Normal,
    /// Show and edit the RTC calibration
    Calibration,
    /// Show and edit the display brightness
    Brightness,
}

impl Mode {
    /// Next mode in the combo cycle
    pub const fn next(self) -> Mode {
        match self {
            Mode::Normal => Mode::Calibration,
            Mode::Calibration => Mode::Brightness,
            Mode::Brightness => Mode::Normal,
        }
    }
}

/// Effect of a routed button action
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    BumpMinutes,
    BumpHours,
    CalibrationUp,
    CalibrationDown,
    BrightnessUp,
    BrightnessDown,
}

impl Command {
    /// Button 0 means increase / minutes, button 1 decrease / hours
    pub const fn for_action(mode: Mode, id: ButtonId) -> Command {
        match (mode, id) {
            (Mode::Normal, ButtonId::Up) => Command::BumpMinutes,
            (Mode::Normal, ButtonId::Down) => Command::BumpHours,
            (Mode::Calibration, ButtonId::Up) => Command::CalibrationUp,
            (Mode::Calibration, ButtonId::Down) => Command::CalibrationDown,
            (Mode::Brightness, ButtonId::Up) => Command::BrightnessUp,
            (Mode::Brightness, ButtonId::Down) => Command::BrightnessDown,
        }
    }
}

/// A mode change
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    /// Calibration and brightness must be written back
    pub persist: bool,
}

/// Tracks the mode and its inactivity timeout
#[derive(Clone, Debug)]
pub struct ModeController {
    mode: Mode,
    idle_seconds: u8,
    timeout_s: u8,
}

impl ModeController {
    pub fn new(timeout_s: u8) -> Self {
        Self {
            mode: Mode::Normal,
            idle_seconds: 0,
            timeout_s,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn idle_seconds(&self) -> u8 {
        self.idle_seconds
    }

    /// Map a button action to its command for the current mode
    pub fn route_action(&mut self, id: ButtonId) -> Command {
        self.touch();
        Command::for_action(self.mode, id)
    }

    /// Check for the dual long-press combo. On detection both buttons are
    /// locked until release and the mode advances.
    pub fn detect_combo(&mut self, buttons: &mut ButtonDebouncer) -> Option<Transition> {
        if !buttons.both_long_pressed() {
            return None;
        }
        for id in ButtonId::ALL {
            buttons.lock(id);
        }

        let from = self.mode;
        self.mode = from.next();
        self.touch();

        #[cfg(feature = "defmt")]
        info!("Mode {} -> {}", from, self.mode);

        Some(Transition {
            from,
            to: self.mode,
            persist: self.mode == Mode::Normal,
        })
    }

    /// Count one idle second. Returns the fallback to normal once the
    /// timeout expires in an edit mode.
    pub fn on_idle_second(&mut self) -> Option<Transition> {
        if self.mode == Mode::Normal {
            self.idle_seconds = 0;
            return None;
        }

        self.idle_seconds = self.idle_seconds.saturating_add(1);
        if self.idle_seconds < self.timeout_s {
            return None;
        }

        let from = self.mode;
        self.mode = Mode::Normal;
        self.idle_seconds = 0;

        #[cfg(feature = "defmt")]
        debug!("Mode {} timed out", from);

        Some(Transition {
            from,
            to: Mode::Normal,
            persist: true,
        })
    }

    /// Restart the inactivity timeout
    pub fn touch(&mut self) {
        self.idle_seconds = 0;
    }
}

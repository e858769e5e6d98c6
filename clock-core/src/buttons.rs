//! Tick-sampled button debouncing, long-press and lockup

use crate::types::ClockConfig;

/// The two front-panel buttons
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    /// Minutes / calibration up / brightness up
    Up,
    /// Hours / calibration down / brightness down
    Down,
}

impl ButtonId {
    /// Evaluation order; only one action fires per tick
    pub const ALL: [ButtonId; 2] = [ButtonId::Up, ButtonId::Down];

    pub const fn index(&self) -> usize {
        match self {
            ButtonId::Up => 0,
            ButtonId::Down => 1,
        }
    }
}

/// Per-button debounce phase
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonPhase {
    /// Released, or pressed for less than the cooldown
    #[default]
    Idle,
    /// Pressed past the cooldown; the single edge action has fired
    Active,
    /// Held past the long-press threshold; autorepeat applies
    LongPress,
    /// Suppressed until release
    Lockup,
}

/// Debounce state of one button
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ButtonState {
    pub press_counter: u16,
    pub phase: ButtonPhase,
}

/// Debouncer for both buttons
#[derive(Clone, Debug)]
pub struct ButtonDebouncer {
    buttons: [ButtonState; 2],
    cooldown: u16,
    longpress: u16,
    repeat_period: u16,
}

impl ButtonDebouncer {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            buttons: [ButtonState::default(); 2],
            cooldown: config.button_cooldown,
            longpress: config.button_longpress,
            repeat_period: config.autorepeat_period().max(1),
        }
    }

    /// Feed one tick's raw reading for `id`. Returns true on the tick the
    /// press crosses the cooldown threshold.
    pub fn sample(&mut self, id: ButtonId, pressed: bool) -> bool {
        let button = &mut self.buttons[id.index()];

        if !pressed {
            *button = ButtonState::default();
            return false;
        }

        if button.press_counter < self.longpress {
            button.press_counter += 1;
            if button.phase == ButtonPhase::Idle && button.press_counter >= self.cooldown {
                button.phase = ButtonPhase::Active;
                return true;
            }
        } else if button.phase != ButtonPhase::Lockup {
            button.phase = ButtonPhase::LongPress;
        }

        false
    }

    /// Autorepeat clock. On every `tick_hz / autorepeat_hz` boundary of
    /// `tick_phase`, the first long-pressed button repeats.
    pub fn autorepeat(&self, tick_phase: i32) -> Option<ButtonId> {
        if tick_phase.rem_euclid(self.repeat_period as i32) != 0 {
            return None;
        }
        ButtonId::ALL
            .into_iter()
            .find(|id| self.buttons[id.index()].phase == ButtonPhase::LongPress)
    }

    /// Force a button into lockup until it is released
    pub fn lock(&mut self, id: ButtonId) {
        let button = &mut self.buttons[id.index()];
        if button.press_counter > 0 {
            button.phase = ButtonPhase::Lockup;
        }
    }

    pub fn both_long_pressed(&self) -> bool {
        self.buttons
            .iter()
            .all(|b| b.phase == ButtonPhase::LongPress)
    }

    /// True if any button is currently held
    pub fn any_pressed(&self) -> bool {
        self.buttons.iter().any(|b| b.press_counter > 0)
    }

    pub fn state(&self, id: ButtonId) -> ButtonState {
        self.buttons[id.index()]
    }

    pub fn phase(&self, id: ButtonId) -> ButtonPhase {
        self.buttons[id.index()].phase
    }
}

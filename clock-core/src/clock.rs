//! The device-state aggregate and its event handlers
//!
//! `Clock` owns every piece of mutable state. The board calls exactly one of
//! its handlers per hardware event and never runs two at once, which on a
//! single-core MCU is guaranteed by run-to-completion interrupt dispatch (the
//! firmware keeps the `Clock` inside a critical-section mutex).
//!
//! The tick handler owns time, buttons, mode and settings. The scan handlers
//! (`on_digit_select`, `on_ramp_stop`, `on_blanking`) only read the digit
//! ramps and advance the scan position.

use embedded_storage::Storage;

use crate::buttons::{ButtonDebouncer, ButtonId};
use crate::display::{Display, DIGIT_COUNT};
use crate::hal::{ClockHal, DimmingTimer, SegmentOutput, Watchdog};
use crate::mode::{Command, Mode, ModeController, Transition};
use crate::segment::{two_digits, Glyph, BLANK};
use crate::store::{ConfigStore, Settings};
use crate::timekeeper::{ClockTime, TimeKeeper};
use crate::types::ClockConfig;

#[cfg(feature = "defmt")]
use defmt::{debug, info};

pub struct Clock<H, S> {
    config: ClockConfig,
    time: TimeKeeper,
    buttons: ButtonDebouncer,
    mode: ModeController,
    settings: Settings,
    /// Last settings known to be on the medium
    saved: Settings,
    display: Display,
    store: ConfigStore<S>,
    hal: H,
    /// Both buttons have been seen released at least once since power-up
    released_since_boot: bool,
}

impl<H, S> Clock<H, S>
where
    H: ClockHal,
    S: Storage,
{
    /// Load the settings, program the dimming timer and render 12:00
    pub fn new(config: ClockConfig, hal: H, storage: S) -> Self {
        let mut store = ConfigStore::new(storage);
        let settings = store.load();

        let mut clock = Self {
            config,
            time: TimeKeeper::new(config.tick_hz),
            buttons: ButtonDebouncer::new(&config),
            mode: ModeController::new(config.mode_timeout_s),
            settings,
            saved: settings,
            display: Display::new(
                config.ramp_min,
                config.ramp_max(settings.brightness),
                config.ramp_inc,
            ),
            store,
            hal,
            released_since_boot: false,
        };

        #[cfg(feature = "defmt")]
        info!("Clock started, {} Hz, {}", config.tick_hz, settings);

        clock.apply_brightness();
        clock.hal.segments().set_dots(false).ok();
        clock.render();
        clock.hal.dimmer().set_ramp_compare(clock.display.ramp_level()).ok();
        clock
    }

    /// RTC tick event
    pub fn on_tick(&mut self) {
        self.hal.watchdog().feed().ok();

        let up = self.hal.read_button(ButtonId::Up);
        let down = self.hal.read_button(ButtonId::Down);

        let outcome = self.time.on_tick(self.settings.calibration);
        let mut refresh = outcome.refresh;
        if let Some(dots) = outcome.dots {
            self.hal.segments().set_dots(dots).ok();
        }

        if !up && !down {
            self.released_since_boot = true;
        }

        if outcome.second_elapsed && !up && !down {
            if let Some(transition) = self.mode.on_idle_second() {
                self.finish_transition(transition);
                refresh = true;
            }
        }

        let up_edge = self.buttons.sample(ButtonId::Up, up);
        let down_edge = self.buttons.sample(ButtonId::Down, down);

        if !self.released_since_boot && self.buttons.both_long_pressed() {
            for id in ButtonId::ALL {
                self.buttons.lock(id);
            }
            self.factory_reset();
            refresh = true;
        } else if let Some(transition) = self.mode.detect_combo(&mut self.buttons) {
            self.finish_transition(transition);
            refresh = true;
        } else {
            let action = if up_edge {
                Some(ButtonId::Up)
            } else if down_edge {
                Some(ButtonId::Down)
            } else {
                self.buttons.autorepeat(self.time.subseconds())
            };

            if let Some(id) = action {
                let command = self.mode.route_action(id);
                self.apply(command);
                refresh = true;
            }
        }

        if refresh {
            self.render();
        }
    }

    /// Digit-select event: drive the new pattern of the current digit
    pub fn on_digit_select(&mut self) {
        let (index, pattern) = self.display.digit_select();
        let segments = self.hal.segments();
        segments.set_segments(pattern).ok();
        segments.select_digit(index).ok();
    }

    /// Ramp-stop event: fall back to the old pattern while fading
    pub fn on_ramp_stop(&mut self) {
        if let Some(pattern) = self.display.ramp_stop() {
            self.hal.segments().set_segments(pattern).ok();
        }
    }

    /// Blanking event: dark gap, then advance to the next digit
    pub fn on_blanking(&mut self) {
        let segments = self.hal.segments();
        segments.set_segments(BLANK).ok();
        segments.deselect_all().ok();

        if let Some(level) = self.display.blanking() {
            self.hal.dimmer().set_ramp_compare(level).ok();
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn time(&self) -> ClockTime {
        self.time.time()
    }

    pub fn timekeeper(&self) -> &TimeKeeper {
        &self.time
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn buttons(&self) -> &ButtonDebouncer {
        &self.buttons
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    /// Glyphs for the current mode and time
    pub fn glyphs(&self) -> [Glyph; DIGIT_COUNT] {
        match self.mode.mode() {
            Mode::Normal => {
                if self.time.blanking() {
                    return [Glyph::Blank; DIGIT_COUNT];
                }
                let t = self.time.time();
                let [h1, h0] = two_digits(t.hours);
                let [m1, m0] = two_digits(t.minutes);
                [h1, h0, m1, m0]
            }
            Mode::Calibration => {
                let value = self.settings.calibration.get();
                let sign = if value >= 0 {
                    Glyph::CalibrationPositive
                } else {
                    Glyph::CalibrationNegative
                };
                let magnitude = value.unsigned_abs();
                [
                    sign,
                    Glyph::Digit((magnitude / 100 % 10) as u8),
                    Glyph::Digit((magnitude / 10 % 10) as u8),
                    Glyph::Digit((magnitude % 10) as u8),
                ]
            }
            Mode::Brightness => [
                Glyph::BrightnessMarker,
                Glyph::Blank,
                Glyph::Blank,
                Glyph::Digit(self.settings.brightness.get()),
            ],
        }
    }

    fn render(&mut self) {
        let glyphs = self.glyphs();
        if self.display.render(glyphs) {
            self.hal.dimmer().set_ramp_compare(self.display.ramp_level()).ok();
        }
    }

    fn apply(&mut self, command: Command) {
        let Settings {
            calibration,
            brightness,
        } = self.settings;
        match command {
            Command::BumpMinutes => self.time.bump_minutes(),
            Command::BumpHours => self.time.bump_hours(),
            Command::CalibrationUp => self.settings.calibration = calibration.step_up(),
            Command::CalibrationDown => self.settings.calibration = calibration.step_down(),
            Command::BrightnessUp => {
                self.settings.brightness = brightness.step_up();
                self.apply_brightness();
            }
            Command::BrightnessDown => {
                self.settings.brightness = brightness.step_down();
                self.apply_brightness();
            }
        }
    }

    fn apply_brightness(&mut self) {
        let brightness = self.settings.brightness;
        self.display.set_ramp_max(self.config.ramp_max(brightness));
        self.hal
            .dimmer()
            .set_blanking_compare(self.config.duty(brightness))
            .ok();
    }

    fn finish_transition(&mut self, transition: Transition) {
        if transition.persist {
            self.persist();
        }
    }

    /// Write the settings back unless the medium already holds them
    fn persist(&mut self) {
        if self.settings == self.saved {
            return;
        }
        if self.store.save(&self.settings).is_ok() {
            self.saved = self.settings;
        }
    }

    fn factory_reset(&mut self) {
        #[cfg(feature = "defmt")]
        info!("Factory reset");

        self.settings = Settings::default();
        self.apply_brightness();
        if self.store.save(&self.settings).is_ok() {
            self.saved = self.settings;
        } else {
            #[cfg(feature = "defmt")]
            debug!("Factory reset not persisted");
        }
    }
}

//! Wall-clock time from the RTC tick, with calibration

use crate::types::Calibration;

const DEFAULT_HOURS: u8 = 12;
const DEFAULT_MINUTES: u8 = 0;

/// Displayed time plus the internal seconds counter
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// False from power-up until the first manual edit
    pub time_set: bool,
}

impl Default for ClockTime {
    fn default() -> Self {
        Self {
            hours: DEFAULT_HOURS,
            minutes: DEFAULT_MINUTES,
            seconds: 0,
            time_set: false,
        }
    }
}

/// What one tick changed
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TickOutcome {
    /// The screen content may have changed
    pub refresh: bool,
    /// A whole second completed on this tick
    pub second_elapsed: bool,
    /// New separator state, set when a second completed
    pub dots: Option<bool>,
}

/// Tick accumulator and time-of-day counters
#[derive(Clone, Debug)]
pub struct TimeKeeper {
    time: ClockTime,
    /// Sub-second ticks; briefly negative after a negative correction
    subseconds: i32,
    /// Completed seconds in the current calibration window
    window_seconds: u16,
    tick_hz: u16,
}

impl TimeKeeper {
    /// Power-up state: 12:00, not set
    pub fn new(tick_hz: u16) -> Self {
        Self::with_time(tick_hz, ClockTime::default(), 0)
    }

    /// Start from an arbitrary time and sub-second phase
    pub fn with_time(tick_hz: u16, time: ClockTime, subseconds: i32) -> Self {
        Self {
            time,
            subseconds,
            window_seconds: 0,
            tick_hz,
        }
    }

    /// Advance by one RTC tick
    pub fn on_tick(&mut self, calibration: Calibration) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let tick_hz = self.tick_hz as i32;

        self.subseconds += 1;
        if self.subseconds < tick_hz {
            return outcome;
        }

        self.subseconds -= tick_hz;
        outcome.second_elapsed = true;

        self.time.seconds += 1;
        if self.time.seconds >= 60 {
            self.time.seconds = 0;
            self.minutes_inc();
            outcome.refresh = true;
        }

        outcome.dots = Some(self.dots());
        if !self.time.time_set {
            outcome.refresh = true;
        }

        self.window_seconds += 1;
        if self.window_seconds >= self.tick_hz {
            self.window_seconds = 0;
            self.subseconds += calibration.get() as i32;
        }

        outcome
    }

    /// Manual minute step; carries into hours and realigns to :00
    pub fn bump_minutes(&mut self) {
        self.minutes_inc();
        self.mark_edited();
    }

    /// Manual hour step; minutes are left alone
    pub fn bump_hours(&mut self) {
        self.hours_inc();
        self.mark_edited();
    }

    /// True while the digits should be dark for the not-set blink
    pub fn blanking(&self) -> bool {
        !self.time.time_set && self.time.seconds & 1 == 1
    }

    /// Separator state, toggling every second regardless of `time_set`
    pub fn dots(&self) -> bool {
        self.time.seconds & 1 == 1
    }

    pub fn time(&self) -> ClockTime {
        self.time
    }

    pub fn subseconds(&self) -> i32 {
        self.subseconds
    }

    /// Ticks elapsed since midnight as seen by the counters
    pub fn elapsed_ticks(&self) -> i64 {
        let t = self.time;
        let seconds = (t.hours as i64 * 60 + t.minutes as i64) * 60 + t.seconds as i64;
        seconds * self.tick_hz as i64 + self.subseconds as i64
    }

    fn mark_edited(&mut self) {
        self.time.seconds = 0;
        self.time.time_set = true;
    }

    fn minutes_inc(&mut self) {
        self.time.minutes += 1;
        if self.time.minutes >= 60 {
            self.time.minutes = 0;
            self.hours_inc();
        }
    }

    fn hours_inc(&mut self) {
        self.time.hours += 1;
        if self.time.hours >= 24 {
            self.time.hours = 0;
        }
    }
}

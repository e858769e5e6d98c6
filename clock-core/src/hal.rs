//! Hardware Abstraction Layer for the clock
//!
//! The core never touches registers. Boards implement these traits, either
//! directly (see the firmware crate) or through the embedded-hal adapters
//! below.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::buttons::ButtonId;
use crate::display::DIGIT_COUNT;

/// Number of segment lines, excluding the dots
pub const SEGMENT_LINES: usize = 7;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Non-volatile storage access failed
    StorageError,
    /// Offset or index outside the device's range
    OutOfBounds,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::StorageError => write!(f, "Storage access failed"),
            HalError::OutOfBounds => write!(f, "Access out of bounds"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// A front-panel push button
pub trait ButtonInput {
    type Error: From<HalError>;

    /// Check if the button is currently pressed
    fn is_pressed(&mut self) -> Result<bool, Self::Error>;
}

/// Multiplexed segment and digit drive
pub trait SegmentOutput {
    type Error: From<HalError>;

    /// Drive a logical (active-high) 7-bit segment pattern
    fn set_segments(&mut self, pattern: u8) -> Result<(), Self::Error>;

    /// Enable one digit, disabling the others
    fn select_digit(&mut self, index: usize) -> Result<(), Self::Error>;

    /// Disable every digit
    fn deselect_all(&mut self) -> Result<(), Self::Error>;

    /// Separator dots on or off
    fn set_dots(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// The two compare channels of the multiplex timer
pub trait DimmingTimer {
    type Error: From<HalError>;

    /// Compare value for the ramp-stop event
    fn set_ramp_compare(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Compare value for the blanking event (the brightness duty)
    fn set_blanking_compare(&mut self, value: u8) -> Result<(), Self::Error>;
}

/// Independent watchdog, must be fed from every tick
pub trait Watchdog {
    type Error: From<HalError>;

    fn feed(&mut self) -> Result<(), Self::Error>;
}

/// Complete clock HAL interface
pub trait ClockHal {
    type UpButton: ButtonInput;
    type DownButton: ButtonInput;
    type Segments: SegmentOutput;
    type Dimmer: DimmingTimer;
    type Watchdog: Watchdog;

    /// Access to the minutes / increase button
    fn up_button(&mut self) -> &mut Self::UpButton;

    /// Access to the hours / decrease button
    fn down_button(&mut self) -> &mut Self::DownButton;

    fn segments(&mut self) -> &mut Self::Segments;

    fn dimmer(&mut self) -> &mut Self::Dimmer;

    fn watchdog(&mut self) -> &mut Self::Watchdog;

    /// Sample one button; a failed read counts as released
    fn read_button(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::Up => self.up_button().is_pressed().unwrap_or(false),
            ButtonId::Down => self.down_button().is_pressed().unwrap_or(false),
        }
    }
}

/// Button on an embedded-hal input pin
pub struct EmbeddedHalButton<P> {
    pin: P,
    active_low: bool,
}

impl<P> EmbeddedHalButton<P>
where
    P: InputPin,
{
    /// Button wired to ground with a pull-up
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    /// Button wired to the supply with a pull-down
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> ButtonInput for EmbeddedHalButton<P>
where
    P: InputPin,
{
    type Error = HalError;

    fn is_pressed(&mut self) -> Result<bool, Self::Error> {
        if self.active_low {
            self.pin.is_low().map_err(|_| HalError::GpioError)
        } else {
            self.pin.is_high().map_err(|_| HalError::GpioError)
        }
    }
}

/// Segment and digit drive over individual embedded-hal output pins
pub struct PinSegmentOutput<S, D, T> {
    segments: [S; SEGMENT_LINES],
    digits: [D; DIGIT_COUNT],
    dots: T,
    segments_inverted: bool,
    digits_inverted: bool,
}

impl<S, D, T> PinSegmentOutput<S, D, T>
where
    S: OutputPin,
    D: OutputPin,
    T: OutputPin,
{
    /// `segments_inverted` / `digits_inverted` select active-low lines
    /// (common-anode segments, PNP digit drivers). The dots follow the
    /// segment polarity.
    pub fn new(
        segments: [S; SEGMENT_LINES],
        digits: [D; DIGIT_COUNT],
        dots: T,
        segments_inverted: bool,
        digits_inverted: bool,
    ) -> Self {
        Self {
            segments,
            digits,
            dots,
            segments_inverted,
            digits_inverted,
        }
    }
}

fn drive<P: OutputPin>(pin: &mut P, on: bool, inverted: bool) -> Result<(), HalError> {
    if on != inverted {
        pin.set_high().map_err(|_| HalError::GpioError)
    } else {
        pin.set_low().map_err(|_| HalError::GpioError)
    }
}

impl<S, D, T> SegmentOutput for PinSegmentOutput<S, D, T>
where
    S: OutputPin,
    D: OutputPin,
    T: OutputPin,
{
    type Error = HalError;

    fn set_segments(&mut self, pattern: u8) -> Result<(), Self::Error> {
        for (bit, pin) in self.segments.iter_mut().enumerate() {
            drive(pin, pattern & (1 << bit) != 0, self.segments_inverted)?;
        }
        Ok(())
    }

    fn select_digit(&mut self, index: usize) -> Result<(), Self::Error> {
        if index >= DIGIT_COUNT {
            return Err(HalError::OutOfBounds);
        }
        for (i, pin) in self.digits.iter_mut().enumerate() {
            drive(pin, i == index, self.digits_inverted)?;
        }
        Ok(())
    }

    fn deselect_all(&mut self) -> Result<(), Self::Error> {
        for pin in self.digits.iter_mut() {
            drive(pin, false, self.digits_inverted)?;
        }
        Ok(())
    }

    fn set_dots(&mut self, on: bool) -> Result<(), Self::Error> {
        drive(&mut self.dots, on, self.segments_inverted)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::{Cell, RefCell};
    use embedded_storage::{ReadStorage, Storage};

    #[derive(Default)]
    pub struct MockButton {
        pressed: Cell<bool>,
        failing: Cell<bool>,
    }

    impl MockButton {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_pressed(&self, pressed: bool) {
            self.pressed.set(pressed);
        }

        /// Make every read return `GpioError`
        pub fn set_failing(&self, failing: bool) {
            self.failing.set(failing);
        }
    }

    impl ButtonInput for MockButton {
        type Error = HalError;

        fn is_pressed(&mut self) -> Result<bool, Self::Error> {
            if self.failing.get() {
                return Err(HalError::GpioError);
            }
            Ok(self.pressed.get())
        }
    }

    /// Records what the renderer drives
    #[derive(Default)]
    pub struct MockSegmentOutput {
        pattern: Cell<u8>,
        selected: Cell<Option<usize>>,
        dots: Cell<bool>,
        /// Pattern driven at the most recent digit-select of each digit
        selected_patterns: RefCell<[u8; DIGIT_COUNT]>,
        segment_writes: Cell<u32>,
    }

    impl MockSegmentOutput {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn pattern(&self) -> u8 {
            self.pattern.get()
        }

        pub fn selected(&self) -> Option<usize> {
            self.selected.get()
        }

        pub fn dots(&self) -> bool {
            self.dots.get()
        }

        pub fn selected_patterns(&self) -> [u8; DIGIT_COUNT] {
            *self.selected_patterns.borrow()
        }

        pub fn segment_writes(&self) -> u32 {
            self.segment_writes.get()
        }
    }

    impl SegmentOutput for MockSegmentOutput {
        type Error = HalError;

        fn set_segments(&mut self, pattern: u8) -> Result<(), Self::Error> {
            self.pattern.set(pattern);
            self.segment_writes.set(self.segment_writes.get() + 1);
            Ok(())
        }

        fn select_digit(&mut self, index: usize) -> Result<(), Self::Error> {
            if index >= DIGIT_COUNT {
                return Err(HalError::OutOfBounds);
            }
            self.selected.set(Some(index));
            self.selected_patterns.borrow_mut()[index] = self.pattern.get();
            Ok(())
        }

        fn deselect_all(&mut self) -> Result<(), Self::Error> {
            self.selected.set(None);
            Ok(())
        }

        fn set_dots(&mut self, on: bool) -> Result<(), Self::Error> {
            self.dots.set(on);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockDimmer {
        ramp: Cell<u8>,
        blanking: Cell<u8>,
    }

    impl MockDimmer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ramp_compare(&self) -> u8 {
            self.ramp.get()
        }

        pub fn blanking_compare(&self) -> u8 {
            self.blanking.get()
        }
    }

    impl DimmingTimer for MockDimmer {
        type Error = HalError;

        fn set_ramp_compare(&mut self, value: u8) -> Result<(), Self::Error> {
            self.ramp.set(value);
            Ok(())
        }

        fn set_blanking_compare(&mut self, value: u8) -> Result<(), Self::Error> {
            self.blanking.set(value);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockWatchdog {
        feeds: Cell<u32>,
    }

    impl MockWatchdog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn feeds(&self) -> u32 {
            self.feeds.get()
        }
    }

    impl Watchdog for MockWatchdog {
        type Error = HalError;

        fn feed(&mut self) -> Result<(), Self::Error> {
            self.feeds.set(self.feeds.get() + 1);
            Ok(())
        }
    }

    pub const MOCK_STORAGE_SIZE: usize = 64;

    /// Byte-addressable storage in RAM
    pub struct MockStorage {
        data: [u8; MOCK_STORAGE_SIZE],
        writes: u32,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MockStorage {
        /// Zero-filled medium
        pub fn new() -> Self {
            Self::filled(0)
        }

        /// Freshly erased flash (all ones)
        pub fn erased() -> Self {
            Self::filled(0xff)
        }

        fn filled(value: u8) -> Self {
            Self {
                data: [value; MOCK_STORAGE_SIZE],
                writes: 0,
                fail_reads: false,
                fail_writes: false,
            }
        }

        /// Overwrite bytes without counting a write
        pub fn poke(&mut self, offset: u32, bytes: &[u8]) {
            let start = offset as usize;
            self.data[start..start + bytes.len()].copy_from_slice(bytes);
        }

        pub fn peek_word(&self, offset: u32) -> u16 {
            let start = offset as usize;
            u16::from_le_bytes([self.data[start], self.data[start + 1]])
        }

        pub fn write_count(&self) -> u32 {
            self.writes
        }

        pub fn fail_reads(&mut self, fail: bool) {
            self.fail_reads = fail;
        }

        pub fn fail_writes(&mut self, fail: bool) {
            self.fail_writes = fail;
        }

        fn range(&self, offset: u32, len: usize) -> Result<core::ops::Range<usize>, HalError> {
            let start = offset as usize;
            let end = start.checked_add(len).ok_or(HalError::OutOfBounds)?;
            if end > MOCK_STORAGE_SIZE {
                return Err(HalError::OutOfBounds);
            }
            Ok(start..end)
        }
    }

    impl Default for MockStorage {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ReadStorage for MockStorage {
        type Error = HalError;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            if self.fail_reads {
                return Err(HalError::StorageError);
            }
            let range = self.range(offset, bytes.len())?;
            bytes.copy_from_slice(&self.data[range]);
            Ok(())
        }

        fn capacity(&self) -> usize {
            MOCK_STORAGE_SIZE
        }
    }

    impl Storage for MockStorage {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.fail_writes {
                return Err(HalError::StorageError);
            }
            let range = self.range(offset, bytes.len())?;
            self.data[range].copy_from_slice(bytes);
            self.writes += 1;
            Ok(())
        }
    }

    /// All mock peripherals of a clock board
    #[derive(Default)]
    pub struct MockClockHal {
        pub up: MockButton,
        pub down: MockButton,
        pub segments: MockSegmentOutput,
        pub dimmer: MockDimmer,
        pub watchdog: MockWatchdog,
    }

    impl MockClockHal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn button(&self, id: ButtonId) -> &MockButton {
            match id {
                ButtonId::Up => &self.up,
                ButtonId::Down => &self.down,
            }
        }
    }

    impl ClockHal for MockClockHal {
        type UpButton = MockButton;
        type DownButton = MockButton;
        type Segments = MockSegmentOutput;
        type Dimmer = MockDimmer;
        type Watchdog = MockWatchdog;

        fn up_button(&mut self) -> &mut MockButton {
            &mut self.up
        }

        fn down_button(&mut self) -> &mut MockButton {
            &mut self.down
        }

        fn segments(&mut self) -> &mut MockSegmentOutput {
            &mut self.segments
        }

        fn dimmer(&mut self) -> &mut MockDimmer {
            &mut self.dimmer
        }

        fn watchdog(&mut self) -> &mut MockWatchdog {
            &mut self.watchdog
        }
    }
}

//! CH32V003 specific hardware implementations
//!
//! Register-level implementations of the clock HAL traits.
//!
//! Pin mapping:
//! - PC0..PC6 = segments A..G (active low, common-anode filaments)
//! - PC7      = separator dots (active low)
//! - PD2..PD5 = digit enables 0..3 (active low, PNP high-side drivers)
//! - PA1      = minutes / up button (active low with pull-up)
//! - PA2      = hours / down button (active low with pull-up)
//! - PD6      = RTC square-wave input (EXTI6, rising edge)
//!
//! TIM2 runs the multiplex: update event = digit-select, CH1 compare =
//! ramp-stop, CH2 compare = blanking.

use clock_core::display::DIGIT_COUNT;
use clock_core::hal::{
    ButtonInput, ClockHal, DimmingTimer, HalError, SegmentOutput, Watchdog, SEGMENT_LINES,
};
use clock_core::segment::SEGMENT_MASK;

// ========================================
// CH32V003 Hardware Definitions
// ========================================

pub const RCC_BASE: u32 = 0x4002_1000;
pub const AFIO_BASE: u32 = 0x4001_0000;
pub const EXTI_BASE: u32 = 0x4001_0400;
pub const GPIOA_BASE: u32 = 0x4001_0800;
pub const GPIOC_BASE: u32 = 0x4001_1000;
pub const GPIOD_BASE: u32 = 0x4001_1400;
pub const TIM2_BASE: u32 = 0x4000_0000;
pub const IWDG_BASE: u32 = 0x4000_3000;
pub const PFIC_BASE: u32 = 0xE000_E000;

/// RCC register offsets
pub const RCC_APB2PCENR: u32 = 0x18;
pub const RCC_APB1PCENR: u32 = 0x1C;

/// GPIO register offsets
pub const GPIO_CFGLR: u32 = 0x00;
pub const GPIO_INDR: u32 = 0x08;
pub const GPIO_OUTDR: u32 = 0x0C;
pub const GPIO_BSHR: u32 = 0x10;

/// AFIO / EXTI register offsets
pub const AFIO_EXTICR: u32 = 0x08;
pub const EXTI_INTENR: u32 = 0x00;
pub const EXTI_RTENR: u32 = 0x08;
pub const EXTI_INTFR: u32 = 0x14;

/// TIM2 register offsets
pub const TIM_CTLR1: u32 = 0x00;
pub const TIM_DMAINTENR: u32 = 0x0C;
pub const TIM_INTFR: u32 = 0x10;
pub const TIM_PSC: u32 = 0x28;
pub const TIM_ATRLR: u32 = 0x2C;
pub const TIM_CH1CVR: u32 = 0x34;
pub const TIM_CH2CVR: u32 = 0x38;

/// TIM2 interrupt flags (INTFR) and enables (DMAINTENR) share bit positions
pub const TIM_UIF: u32 = 1 << 0;
pub const TIM_CC1IF: u32 = 1 << 1;
pub const TIM_CC2IF: u32 = 1 << 2;

/// IWDG register offsets and keys
pub const IWDG_CTLR: u32 = 0x00;
pub const IWDG_PSCR: u32 = 0x04;
pub const IWDG_RLDR: u32 = 0x08;
pub const IWDG_KEY_FEED: u32 = 0xAAAA;
pub const IWDG_KEY_UNLOCK: u32 = 0x5555;
pub const IWDG_KEY_START: u32 = 0xCCCC;

/// PFIC interrupt enable registers
pub const PFIC_IENR1: u32 = 0x100;
pub const PFIC_IENR2: u32 = 0x104;
pub const IRQ_EXTI7_0: u32 = 20;
pub const IRQ_TIM2: u32 = 38;

pub const DOTS_PIN: u8 = 7;
pub const DIGIT_PINS: [u8; DIGIT_COUNT] = [2, 3, 4, 5];
pub const UP_BUTTON_PIN: u8 = 1;
pub const DOWN_BUTTON_PIN: u8 = 2;
pub const RTC_PIN: u8 = 6;

/// Timer counts per digit slot; the 8-bit compare values span it
pub const SLOT_COUNTS: u32 = 256;
/// 24 MHz HSI / 48 = 500 kHz timer clock, ~1.95 kHz slots
pub const TIM2_PRESCALER: u32 = 48 - 1;

#[inline(always)]
pub(crate) fn reg_read(addr: u32) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

#[inline(always)]
pub(crate) fn reg_write(addr: u32, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

#[inline(always)]
pub(crate) fn reg_modify(addr: u32, f: impl FnOnce(u32) -> u32) {
    reg_write(addr, f(reg_read(addr)));
}

// ========================================
// BSHR word computation
// ========================================

/// BSHR word for one active-low line: low half sets (off), high half resets (on)
pub const fn active_low_bshr(pin: u8, on: bool) -> u32 {
    if on {
        1 << (pin as u32 + 16)
    } else {
        1 << pin as u32
    }
}

/// BSHR word driving PC0..PC6 for a logical segment pattern, leaving PC7
pub const fn segment_bshr(pattern: u8) -> u32 {
    let on = (pattern & SEGMENT_MASK) as u32;
    let off = !on & SEGMENT_MASK as u32;
    (on << 16) | off
}

/// BSHR word enabling digit `index` and disabling the others
pub const fn digit_bshr(index: usize) -> u32 {
    let mut word = 0;
    let mut i = 0;
    while i < DIGIT_COUNT {
        word |= active_low_bshr(DIGIT_PINS[i], i == index);
        i += 1;
    }
    word
}

/// BSHR word disabling every digit
pub const fn all_digits_off_bshr() -> u32 {
    digit_bshr(DIGIT_COUNT)
}

// ========================================
// HAL implementations
// ========================================

/// Active-low push button with the internal pull-up
pub struct Ch32v003Button {
    port: u32,
    pin: u8,
}

impl Ch32v003Button {
    pub const fn new(port: u32, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl ButtonInput for Ch32v003Button {
    type Error = HalError;

    fn is_pressed(&mut self) -> Result<bool, Self::Error> {
        let indr = reg_read(self.port + GPIO_INDR);
        Ok(indr & (1 << self.pin) == 0)
    }
}

/// Segments on GPIOC, digit enables on GPIOD
pub struct Ch32v003Segments;

impl SegmentOutput for Ch32v003Segments {
    type Error = HalError;

    fn set_segments(&mut self, pattern: u8) -> Result<(), Self::Error> {
        reg_write(GPIOC_BASE + GPIO_BSHR, segment_bshr(pattern));
        Ok(())
    }

    fn select_digit(&mut self, index: usize) -> Result<(), Self::Error> {
        if index >= DIGIT_COUNT {
            return Err(HalError::OutOfBounds);
        }
        reg_write(GPIOD_BASE + GPIO_BSHR, digit_bshr(index));
        Ok(())
    }

    fn deselect_all(&mut self) -> Result<(), Self::Error> {
        reg_write(GPIOD_BASE + GPIO_BSHR, all_digits_off_bshr());
        Ok(())
    }

    fn set_dots(&mut self, on: bool) -> Result<(), Self::Error> {
        reg_write(GPIOC_BASE + GPIO_BSHR, active_low_bshr(DOTS_PIN, on));
        Ok(())
    }
}

/// TIM2 compare channels
pub struct Tim2Dimmer;

impl DimmingTimer for Tim2Dimmer {
    type Error = HalError;

    fn set_ramp_compare(&mut self, value: u8) -> Result<(), Self::Error> {
        reg_write(TIM2_BASE + TIM_CH1CVR, value as u32);
        Ok(())
    }

    fn set_blanking_compare(&mut self, value: u8) -> Result<(), Self::Error> {
        reg_write(TIM2_BASE + TIM_CH2CVR, value as u32);
        Ok(())
    }
}

/// Independent watchdog
pub struct Iwdg;

impl Watchdog for Iwdg {
    type Error = HalError;

    fn feed(&mut self) -> Result<(), Self::Error> {
        reg_write(IWDG_BASE + IWDG_CTLR, IWDG_KEY_FEED);
        Ok(())
    }
}

/// Complete CH32V003 clock board
pub struct Ch32v003ClockHal {
    pub up: Ch32v003Button,
    pub down: Ch32v003Button,
    pub segments: Ch32v003Segments,
    pub dimmer: Tim2Dimmer,
    pub watchdog: Iwdg,
}

impl Ch32v003ClockHal {
    pub const fn new() -> Self {
        Self {
            up: Ch32v003Button::new(GPIOA_BASE, UP_BUTTON_PIN),
            down: Ch32v003Button::new(GPIOA_BASE, DOWN_BUTTON_PIN),
            segments: Ch32v003Segments,
            dimmer: Tim2Dimmer,
            watchdog: Iwdg,
        }
    }
}

impl Default for Ch32v003ClockHal {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockHal for Ch32v003ClockHal {
    type UpButton = Ch32v003Button;
    type DownButton = Ch32v003Button;
    type Segments = Ch32v003Segments;
    type Dimmer = Tim2Dimmer;
    type Watchdog = Iwdg;

    fn up_button(&mut self) -> &mut Ch32v003Button {
        &mut self.up
    }

    fn down_button(&mut self) -> &mut Ch32v003Button {
        &mut self.down
    }

    fn segments(&mut self) -> &mut Ch32v003Segments {
        &mut self.segments
    }

    fn dimmer(&mut self) -> &mut Tim2Dimmer {
        &mut self.dimmer
    }

    fn watchdog(&mut self) -> &mut Iwdg {
        &mut self.watchdog
    }
}

// ========================================
// Peripheral initialization
// ========================================

/// CFGLR nibble: push-pull output, 10 MHz
const CFG_OUTPUT_PP: u32 = 0x1;
/// CFGLR nibble: input with pull-up/down (OUTDR selects up)
const CFG_INPUT_PULL: u32 = 0x8;
/// CFGLR nibble: floating input
const CFG_INPUT_FLOATING: u32 = 0x4;

fn configure_pin(port: u32, pin: u8, cfg: u32) {
    let shift = pin as u32 * 4;
    reg_modify(port + GPIO_CFGLR, |v| (v & !(0xF << shift)) | (cfg << shift));
}

/// Enable the clocks of every peripheral the clock uses
pub fn enable_peripheral_clocks() {
    // AFIO, GPIOA, GPIOC, GPIOD
    reg_modify(RCC_BASE + RCC_APB2PCENR, |v| {
        v | (1 << 0) | (1 << 2) | (1 << 4) | (1 << 5)
    });
    // TIM2
    reg_modify(RCC_BASE + RCC_APB1PCENR, |v| v | (1 << 0));
}

/// Display outputs dark, buttons pulled up, RTC input floating
pub fn configure_gpio_pins() {
    // All lines off before switching them to outputs
    reg_write(GPIOC_BASE + GPIO_BSHR, segment_bshr(0) | active_low_bshr(DOTS_PIN, false));
    reg_write(GPIOD_BASE + GPIO_BSHR, all_digits_off_bshr());

    for pin in 0..SEGMENT_LINES as u8 {
        configure_pin(GPIOC_BASE, pin, CFG_OUTPUT_PP);
    }
    configure_pin(GPIOC_BASE, DOTS_PIN, CFG_OUTPUT_PP);
    for pin in DIGIT_PINS {
        configure_pin(GPIOD_BASE, pin, CFG_OUTPUT_PP);
    }

    for pin in [UP_BUTTON_PIN, DOWN_BUTTON_PIN] {
        configure_pin(GPIOA_BASE, pin, CFG_INPUT_PULL);
        reg_modify(GPIOA_BASE + GPIO_OUTDR, |v| v | (1 << pin));
    }

    configure_pin(GPIOD_BASE, RTC_PIN, CFG_INPUT_FLOATING);
}

/// Route PD6 to EXTI6 and interrupt on its rising edge
pub fn configure_rtc_interrupt() {
    let shift = RTC_PIN as u32 * 2;
    // Port D = 0b11
    reg_modify(AFIO_BASE + AFIO_EXTICR, |v| (v & !(0b11 << shift)) | (0b11 << shift));
    reg_modify(EXTI_BASE + EXTI_RTENR, |v| v | (1 << RTC_PIN));
    reg_modify(EXTI_BASE + EXTI_INTENR, |v| v | (1 << RTC_PIN));
    reg_write(PFIC_BASE + PFIC_IENR1, 1 << IRQ_EXTI7_0);
}

/// Start TIM2 with the multiplex events and the initial compare values
pub fn configure_multiplex_timer(ramp: u8, blanking: u8) {
    reg_write(TIM2_BASE + TIM_PSC, TIM2_PRESCALER);
    reg_write(TIM2_BASE + TIM_ATRLR, SLOT_COUNTS - 1);
    reg_write(TIM2_BASE + TIM_CH1CVR, ramp as u32);
    reg_write(TIM2_BASE + TIM_CH2CVR, blanking as u32);
    reg_write(TIM2_BASE + TIM_INTFR, 0);
    reg_write(TIM2_BASE + TIM_DMAINTENR, TIM_UIF | TIM_CC1IF | TIM_CC2IF);
    reg_write(PFIC_BASE + PFIC_IENR2, 1 << (IRQ_TIM2 - 32));
    // ARPE | CEN
    reg_write(TIM2_BASE + TIM_CTLR1, (1 << 7) | 1);
}

/// Start the independent watchdog: LSI 128 kHz / 32, ~100 ms timeout
pub fn start_watchdog() {
    reg_write(IWDG_BASE + IWDG_CTLR, IWDG_KEY_UNLOCK);
    reg_write(IWDG_BASE + IWDG_PSCR, 3);
    reg_write(IWDG_BASE + IWDG_RLDR, 400);
    reg_write(IWDG_BASE + IWDG_CTLR, IWDG_KEY_FEED);
    reg_write(IWDG_BASE + IWDG_CTLR, IWDG_KEY_START);
}

/// Read and acknowledge pending TIM2 events
pub fn take_timer_events() -> u32 {
    let flags = reg_read(TIM2_BASE + TIM_INTFR) & (TIM_UIF | TIM_CC1IF | TIM_CC2IF);
    // Write-zero-to-clear
    reg_write(TIM2_BASE + TIM_INTFR, !flags);
    flags
}

/// Acknowledge the RTC edge; returns true if it was pending
pub fn take_rtc_event() -> bool {
    let pending = reg_read(EXTI_BASE + EXTI_INTFR) & (1 << RTC_PIN) != 0;
    if pending {
        // Write-one-to-clear
        reg_write(EXTI_BASE + EXTI_INTFR, 1 << RTC_PIN);
    }
    pending
}

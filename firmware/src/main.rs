#![cfg_attr(target_arch = "riscv32", no_std)]
#![cfg_attr(target_arch = "riscv32", no_main)]

//! LED-filament clock firmware for the CH32V003
//!
//! Everything runs in two interrupt handlers; the main loop only sleeps.
//! Both handlers take the same critical section, so their bodies never
//! interleave.

#[cfg(target_arch = "riscv32")]
mod app {
    // Logging support
    #[cfg(feature = "defmt")]
    use defmt::info;
    #[cfg(feature = "defmt")]
    use defmt_rtt as _;
    use panic_halt as _;

    // Define simple logging macros when defmt is not available
    #[cfg(not(feature = "defmt"))]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    use core::cell::RefCell;
    use critical_section::Mutex;
    use portable_atomic::{AtomicU32, Ordering};
    use riscv_rt::entry;

    use ledclock_firmware::*;

    // Critical section implementation for RISC-V
    struct RiscvCriticalSection;
    critical_section::set_impl!(RiscvCriticalSection);

    unsafe impl critical_section::Impl for RiscvCriticalSection {
        unsafe fn acquire() -> critical_section::RawRestoreState {
            let mstatus = riscv::register::mstatus::read();
            riscv::register::mstatus::clear_mie();
            mstatus.mie() as u8
        }

        unsafe fn release(was_enabled: critical_section::RawRestoreState) {
            if was_enabled != 0 {
                riscv::register::mstatus::set_mie();
            }
        }
    }

    /// RTC ticks since reset, used as the log timestamp
    static UPTIME_TICKS: AtomicU32 = AtomicU32::new(0);

    #[cfg(feature = "defmt")]
    defmt::timestamp!("{=u32}", UPTIME_TICKS.load(Ordering::Relaxed));

    static CLOCK: Mutex<RefCell<Option<BoardClock>>> = Mutex::new(RefCell::new(None));

    fn hardware_init() {
        enable_peripheral_clocks();
        configure_gpio_pins();
        start_watchdog();

        let config = board_config();
        let clock = Clock::new(config, Ch32v003ClockHal::new(), SectorStorage::new(Ch32v003Flash));
        let ramp = clock.display().ramp_level();
        let blanking = config.duty(clock.settings().brightness);

        critical_section::with(|cs| {
            CLOCK.borrow(cs).replace(Some(clock));
        });

        configure_multiplex_timer(ramp, blanking);
        configure_rtc_interrupt();

        info!("Hardware initialization complete, {} Hz RTC", config.tick_hz);
    }

    #[entry]
    fn main() -> ! {
        hardware_init();
        unsafe { riscv::register::mstatus::set_mie() };

        loop {
            unsafe { riscv::asm::wfi() };
        }
    }

    // ========================================
    // Interrupt Handlers
    // ========================================

    /// RTC square wave edge on PD6
    #[no_mangle]
    extern "C" fn EXTI7_0_IRQHandler() {
        if !take_rtc_event() {
            return;
        }
        UPTIME_TICKS.fetch_add(1, Ordering::Relaxed);

        critical_section::with(|cs| {
            if let Some(clock) = CLOCK.borrow(cs).borrow_mut().as_mut() {
                clock.on_tick();
            }
        });
    }

    /// Multiplex timer: digit-select, ramp-stop and blanking
    #[no_mangle]
    extern "C" fn TIM2_IRQHandler() {
        let flags = take_timer_events();

        critical_section::with(|cs| {
            if let Some(clock) = CLOCK.borrow(cs).borrow_mut().as_mut() {
                dispatch_timer_events(clock, flags);
            }
        });
    }
}

#[cfg(not(target_arch = "riscv32"))]
fn main() {
    println!(
        "ledclock {} targets the CH32V003; build with --target riscv32ec-unknown-none-elf",
        ledclock_firmware::VERSION
    );
}

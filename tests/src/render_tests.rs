//! Cross-fade rendering and the multiplex scan

#[cfg(test)]
mod tests {
    use clock_core::hal::mock::{MockClockHal, MockStorage};
    use clock_core::segment::{BLANK, SEGMENT_MASK};
    use clock_core::test_utils::frame_capture::{render_text, FrameCapture};
    use clock_core::test_utils::simulator::Simulator;
    use clock_core::{encode, Clock, ClockConfig, DigitRamp, Display, Glyph, DIGIT_COUNT};
    use ledclock_firmware::{dispatch_timer_events, TIM_CC1IF, TIM_CC2IF, TIM_UIF};
    use proptest::prelude::*;
    use rstest::rstest;

    /// Digit that has finished fading in `pattern`
    fn settled(pattern: u8) -> DigitRamp {
        let mut ramp = DigitRamp::new();
        ramp.set_target(pattern);
        ramp.set_target(pattern);
        ramp
    }

    proptest! {
        #[test]
        fn prop_fade_runs_from_old_to_new(old in 0u8..=0x7f, new in 0u8..=0x7f) {
            let mut ramp = settled(old);
            prop_assert_eq!(ramp.faded(), old);

            let fading = ramp.set_target(new);
            prop_assert_eq!(fading, old != new);
            prop_assert_eq!(ramp.lit(), new);
            prop_assert_eq!(ramp.faded(), old);
            prop_assert_eq!(ramp.rising() & ramp.falling(), 0);
        }

        #[test]
        fn prop_retarget_starts_from_visible_state(
            old in 0u8..=0x7f,
            mid in 0u8..=0x7f,
            new in any::<u8>(),
        ) {
            let mut ramp = settled(old);
            ramp.set_target(mid);
            ramp.set_target(new);
            prop_assert_eq!(ramp.target(), new & SEGMENT_MASK);
            prop_assert_eq!(ramp.faded(), mid);
        }

        #[test]
        fn prop_same_target_twice_is_stable(old in 0u8..=0x7f, new in 0u8..=0x7f) {
            let mut ramp = settled(old);
            ramp.set_target(new);
            prop_assert!(!ramp.set_target(new));
            prop_assert_eq!(ramp.target(), new);
            prop_assert_eq!(ramp.lit(), ramp.faded());
        }
    }

    #[test]
    fn test_identical_render_keeps_ramp_running() {
        let glyphs = [Glyph::Digit(0), Glyph::Digit(9), Glyph::Digit(4), Glyph::Digit(5)];
        let mut display = Display::new(16, 170, 4);
        assert!(display.render(glyphs));
        for _ in 0..2 * DIGIT_COUNT {
            display.blanking();
        }
        assert_eq!(display.ramp_level(), 24);

        assert!(!display.render(glyphs));
        assert_eq!(display.ramp_level(), 24);

        // One changed digit restarts the shared ramp
        let mut changed = glyphs;
        changed[3] = Glyph::Digit(6);
        assert!(display.render(changed));
        assert_eq!(display.ramp_level(), 16);
    }

    #[test]
    fn test_brightness_drop_clamps_ramp() {
        let mut display = Display::new(16, 170, 4);
        for _ in 0..100 * DIGIT_COUNT {
            display.blanking();
        }
        assert_eq!(display.ramp_level(), 170);
        display.set_ramp_max(106);
        assert_eq!(display.ramp_level(), 106);
        assert_eq!(display.ramp_stop(), None);
    }

    #[rstest]
    #[case(0, 23)]
    #[case(4, 39)]
    #[case(8, 55)]
    fn test_boot_fade_settles(#[case] brightness: u8, #[case] cycles: usize) {
        let mut storage = MockStorage::new();
        storage.poke(0, &1000u16.to_le_bytes());
        storage.poke(2, &(brightness as u16).to_le_bytes());
        let mut sim = Simulator::with_storage(ClockConfig::default(), storage);

        let mut capture = FrameCapture::<64>::new();
        while capture.push(sim.scan_cycle()) {}
        assert_eq!(capture.settle_cycles(), Some(cycles));

        let first = capture.frames[0];
        assert_eq!(first.faded, [Some(BLANK); DIGIT_COUNT]);
        assert_eq!(render_text(&first.lit, first.dots).as_str(), "12 00");
    }

    #[test]
    fn test_minute_change_fades_one_digit() {
        let mut sim = Simulator::new(ClockConfig::default());
        sim.tick(1);
        for _ in 0..64 {
            sim.scan_cycle();
        }
        sim.press(clock_core::ButtonId::Up, 250);
        // Realign the scan with digit 0
        while sim.clock().display().current_digit() != 0 {
            sim.clock_mut().on_blanking();
        }

        let frame = sim.scan_cycle();
        assert_eq!(frame.lit[3], encode(Glyph::Digit(1)));
        assert_eq!(frame.faded[3], Some(encode(Glyph::Digit(0))));
        // Unchanged digits fade between identical patterns
        assert_eq!(frame.faded[0], Some(frame.lit[0]));
    }

    #[test]
    fn test_timer_dispatch_order() {
        let mut clock = Clock::new(ClockConfig::default(), MockClockHal::new(), MockStorage::new());
        let writes = clock.hal().segments.segment_writes();

        dispatch_timer_events(&mut clock, 0);
        assert_eq!(clock.hal().segments.segment_writes(), writes);

        dispatch_timer_events(&mut clock, TIM_UIF);
        assert_eq!(clock.hal().segments.selected(), Some(0));
        assert_eq!(clock.hal().segments.pattern(), encode(Glyph::Digit(1)));

        // Ramp-stop runs before blanking, which ends the slot dark
        dispatch_timer_events(&mut clock, TIM_CC1IF | TIM_CC2IF);
        assert_eq!(clock.hal().segments.selected(), None);
        assert_eq!(clock.hal().segments.pattern(), BLANK);
        assert_eq!(clock.display().current_digit(), 1);

        for _ in 1..DIGIT_COUNT {
            dispatch_timer_events(&mut clock, TIM_UIF | TIM_CC1IF | TIM_CC2IF);
        }
        assert_eq!(clock.display().current_digit(), 0);
        assert_eq!(clock.hal().dimmer.ramp_compare(), 20);
    }
}

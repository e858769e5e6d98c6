//! Debounce, long-press and autorepeat behaviour

#[cfg(test)]
mod tests {
    use clock_core::{ButtonDebouncer, ButtonId, ButtonPhase, ClockConfig};
    use proptest::prelude::*;
    use rstest::rstest;

    /// Drive one button the way the tick handler does and count actions.
    /// `phase` is the sub-second position of the first held tick.
    fn count_actions(config: &ClockConfig, held: u32, phase: u32) -> u32 {
        let mut buttons = ButtonDebouncer::new(config);
        let mut actions = 0;
        let hz = config.tick_hz as u32;
        for i in 0..held {
            let tick_phase = ((phase + i) % hz) as i32;
            let edge = buttons.sample(ButtonId::Up, true);
            if edge || buttons.autorepeat(tick_phase).is_some() {
                actions += 1;
            }
        }
        // Released: nothing more fires
        for i in held..held + 2 * hz {
            let tick_phase = ((phase + i) % hz) as i32;
            let edge = buttons.sample(ButtonId::Up, false);
            assert!(!edge);
            assert_eq!(buttons.autorepeat(tick_phase), None);
        }
        actions
    }

    /// Boundaries crossed while long-pressed
    fn expected_repeats(config: &ClockConfig, held: u32, phase: u32) -> u32 {
        let period = config.autorepeat_period() as u32;
        let first = config.button_longpress as u32;
        (first..held).filter(|i| (phase + i) % period == 0).count() as u32
    }

    #[rstest]
    #[case(0, 0)]
    #[case(150, 0)]
    #[case(199, 0)]
    #[case(200, 1)]
    #[case(1000, 1)]
    #[case(2000, 1)]
    fn test_press_below_long_press(#[case] held: u32, #[case] actions: u32) {
        let config = ClockConfig::default();
        assert_eq!(count_actions(&config, held, 1), actions);
    }

    #[rstest]
    #[case(ClockConfig::default())]
    #[case(ClockConfig::rev_b())]
    fn test_two_second_hold_repeats_at_four_hz(#[case] config: ClockConfig) {
        let hz = config.tick_hz as u32;
        // Long press starts two seconds in; four more seconds of repeats
        let held = config.button_longpress as u32 + 4 * hz;
        assert_eq!(count_actions(&config, held, 0), 1 + 16);
    }

    proptest! {
        #[test]
        fn prop_action_count_matches_hold_time(held in 0u32..6000, phase in 0u32..1024) {
            let config = ClockConfig::default();
            let edge = u32::from(held >= config.button_cooldown as u32);
            let expected = edge + expected_repeats(&config, held, phase);
            prop_assert_eq!(count_actions(&config, held, phase), expected);
        }
    }

    #[test]
    fn test_repeat_prefers_first_button() {
        let config = ClockConfig::default();
        let mut buttons = ButtonDebouncer::new(&config);
        for _ in 0..2500 {
            buttons.sample(ButtonId::Down, true);
        }
        assert_eq!(buttons.autorepeat(0), Some(ButtonId::Down));

        for _ in 0..2500 {
            buttons.sample(ButtonId::Up, true);
            buttons.sample(ButtonId::Down, true);
        }
        assert_eq!(buttons.autorepeat(256), Some(ButtonId::Up));
    }

    #[test]
    fn test_lockup_survives_until_release() {
        let config = ClockConfig::default();
        let mut buttons = ButtonDebouncer::new(&config);
        for _ in 0..300 {
            buttons.sample(ButtonId::Down, true);
        }
        buttons.lock(ButtonId::Down);
        for _ in 0..5000 {
            assert!(!buttons.sample(ButtonId::Down, true));
        }
        assert_eq!(buttons.phase(ButtonId::Down), ButtonPhase::Lockup);
        assert_eq!(buttons.state(ButtonId::Down).press_counter, config.button_longpress);

        buttons.sample(ButtonId::Down, false);
        assert_eq!(buttons.phase(ButtonId::Down), ButtonPhase::Idle);
    }
}

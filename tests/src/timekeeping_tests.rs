//! Time-of-day arithmetic and calibration

#[cfg(test)]
mod tests {
    use clock_core::{Calibration, ClockTime, TimeKeeper};
    use proptest::prelude::*;
    use rstest::rstest;

    fn at(hours: u8, minutes: u8, seconds: u8) -> ClockTime {
        ClockTime {
            hours,
            minutes,
            seconds,
            time_set: true,
        }
    }

    /// Run `ticks` ticks and return the elapsed tick count
    fn run(tick_hz: u16, calibration: Calibration, ticks: u64) -> i64 {
        let mut tk = TimeKeeper::with_time(tick_hz, at(0, 0, 0), 0);
        for _ in 0..ticks {
            tk.on_tick(calibration);
        }
        tk.elapsed_ticks()
    }

    #[rstest]
    #[case(1024, at(12, 59, 59), at(13, 0, 0))]
    #[case(1024, at(23, 59, 59), at(0, 0, 0))]
    #[case(1024, at(9, 9, 59), at(9, 10, 0))]
    #[case(2048, at(0, 0, 58), at(0, 0, 59))]
    fn test_second_boundary_carries(
        #[case] tick_hz: u16,
        #[case] start: ClockTime,
        #[case] expected: ClockTime,
    ) {
        let mut tk = TimeKeeper::with_time(tick_hz, start, tick_hz as i32 - 1);
        let out = tk.on_tick(Calibration::DEFAULT);
        assert!(out.second_elapsed);
        assert_eq!(tk.time(), expected);
        assert_eq!(out.refresh, expected.seconds == 0);
    }

    #[rstest]
    #[case(1, 999)]
    #[case(2, -999)]
    #[case(1, 1)]
    #[case(2, -37)]
    fn test_calibration_shift_at_1024_hz(#[case] windows: u64, #[case] c: i16) {
        let window = 1024u64 * 1024;
        let ticks = windows * window + window / 2;
        let calibration = Calibration::new(c).unwrap();
        let shift = run(1024, calibration, ticks) - run(1024, Calibration::DEFAULT, ticks);
        assert_eq!(shift, windows as i64 * c as i64);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_calibration_shifts_by_windows_times_value(
            c in -999i16..=999,
            windows in 1u64..=6,
        ) {
            let tick_hz = 128u16;
            let window = tick_hz as u64 * tick_hz as u64;
            let ticks = windows * window + window / 2;
            let calibration = Calibration::new(c).unwrap();
            let shift = run(tick_hz, calibration, ticks) - run(tick_hz, Calibration::DEFAULT, ticks);
            prop_assert_eq!(shift, windows as i64 * c as i64);
        }

        #[test]
        fn prop_hours_cycle_after_24_bumps(hours in 0u8..24, minutes in 0u8..60) {
            let mut tk = TimeKeeper::with_time(1024, at(hours, minutes, 0), 0);
            for _ in 0..24 {
                tk.bump_hours();
            }
            prop_assert_eq!(tk.time(), at(hours, minutes, 0));
        }

        #[test]
        fn prop_minutes_cycle_carries_one_hour(hours in 0u8..24, minutes in 0u8..60) {
            let mut tk = TimeKeeper::with_time(1024, at(hours, minutes, 0), 0);
            for _ in 0..60 {
                tk.bump_minutes();
            }
            prop_assert_eq!(tk.time(), at((hours + 1) % 24, minutes, 0));
        }

        #[test]
        fn prop_sixty_seconds_advance_one_minute(
            hours in 0u8..24,
            minutes in 0u8..60,
            seconds in 0u8..60,
        ) {
            let tick_hz = 64u16;
            let mut tk = TimeKeeper::with_time(tick_hz, at(hours, minutes, seconds), 0);
            for _ in 0..(60 * tick_hz as u32) {
                tk.on_tick(Calibration::DEFAULT);
            }
            let t = tk.time();
            let before = (hours as u32 * 60 + minutes as u32) % (24 * 60);
            let after = (t.hours as u32 * 60 + t.minutes as u32) % (24 * 60);
            prop_assert_eq!(after, (before + 1) % (24 * 60));
            prop_assert_eq!(t.seconds, seconds);
        }

        #[test]
        fn prop_time_stays_in_range(start in 0u32..86_400, ticks in 0u32..20_000) {
            let time = at((start / 3600) as u8, (start / 60 % 60) as u8, (start % 60) as u8);
            let mut tk = TimeKeeper::with_time(64, time, 0);
            for _ in 0..ticks {
                tk.on_tick(Calibration::new(-999).unwrap());
            }
            let t = tk.time();
            prop_assert!(t.hours < 24 && t.minutes < 60 && t.seconds < 60);
            prop_assert!(tk.subseconds() < 64);
        }
    }

    #[test]
    fn test_bumps_set_time_and_realign_seconds() {
        let mut tk = TimeKeeper::with_time(1024, ClockTime { seconds: 41, ..ClockTime::default() }, 500);
        assert!(!tk.time().time_set);
        tk.bump_minutes();
        assert_eq!(tk.time(), at(12, 1, 0));
        assert_eq!(tk.subseconds(), 500);
    }
}

//! Settings persistence and self-healing

#[cfg(test)]
mod tests {
    use clock_core::hal::mock::MockStorage;
    use clock_core::store::CALIBRATION_BIAS;
    use clock_core::{Brightness, Calibration, ConfigStore, Settings};
    use proptest::prelude::*;
    use rstest::rstest;

    fn stored(calibration: u16, brightness: u16) -> MockStorage {
        let mut storage = MockStorage::new();
        storage.poke(0, &calibration.to_le_bytes());
        storage.poke(2, &brightness.to_le_bytes());
        storage
    }

    proptest! {
        #[test]
        fn prop_saved_settings_load_back(c in -999i16..=999, b in 0u8..=8) {
            let settings = Settings::new(Calibration::new(c).unwrap(), Brightness::new(b).unwrap());
            let mut store = ConfigStore::new(MockStorage::erased());
            store.save(&settings).unwrap();
            prop_assert_eq!(store.load(), settings);
            // Valid data is never rewritten by a load
            prop_assert_eq!(store.storage().write_count(), 1);
            prop_assert_eq!(store.storage().peek_word(0) as i32, c as i32 + CALIBRATION_BIAS);
        }
    }

    #[rstest]
    #[case::brightness_out_of_range(1000, 20, 0, 4)]
    #[case::keeps_valid_calibration(1250, 20, 250, 4)]
    #[case::calibration_out_of_range(2500, 7, 0, 7)]
    #[case::calibration_below_range(0, 3, 0, 3)]
    #[case::erased(0xffff, 0xffff, 0, 4)]
    fn test_invalid_field_heals(
        #[case] raw_calibration: u16,
        #[case] raw_brightness: u16,
        #[case] calibration: i16,
        #[case] brightness: u8,
    ) {
        let mut store = ConfigStore::new(stored(raw_calibration, raw_brightness));
        let expected = Settings::new(
            Calibration::new(calibration).unwrap(),
            Brightness::new(brightness).unwrap(),
        );
        assert_eq!(store.load(), expected);
        assert_eq!(store.storage().write_count(), 1);
        assert_eq!(store.storage().peek_word(0) as i32, calibration as i32 + CALIBRATION_BIAS);
        assert_eq!(store.storage().peek_word(2), brightness as u16);

        // Healed record loads cleanly
        assert_eq!(store.load(), expected);
        assert_eq!(store.storage().write_count(), 1);
    }

    #[test]
    fn test_unreadable_medium_yields_defaults() {
        let mut storage = stored(1100, 6);
        storage.fail_reads(true);
        let mut store = ConfigStore::new(storage);
        assert_eq!(store.load(), Settings::default());
        assert_eq!(store.storage().write_count(), 1);
    }

    #[test]
    fn test_failed_heal_still_returns_defaults() {
        let mut storage = MockStorage::erased();
        storage.fail_writes(true);
        let mut store = ConfigStore::new(storage);
        assert_eq!(store.load(), Settings::default());
        assert_eq!(store.storage().write_count(), 0);
        assert!(store.save(&Settings::default()).is_err());
    }

    #[test]
    fn test_store_survives_reboot() {
        let settings = Settings::new(Calibration::new(-42).unwrap(), Brightness::new(2).unwrap());
        let mut store = ConfigStore::new(MockStorage::erased());
        store.load();
        store.save(&settings).unwrap();

        let mut rebooted = ConfigStore::new(store.into_inner());
        assert_eq!(rebooted.load(), settings);
    }
}

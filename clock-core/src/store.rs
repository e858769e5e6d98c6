//! Persisted calibration and brightness
//!
//! Layout: two little-endian 16-bit words at the start of the storage region.
//! Word 0 holds the calibration biased by [`CALIBRATION_BIAS`] so an erased
//! (all ones) region never decodes as a valid value. Word 1 holds the
//! brightness level.

use embedded_storage::Storage;

use crate::types::{Brightness, Calibration};

#[cfg(feature = "defmt")]
use defmt::{debug, warn};

pub const CALIBRATION_OFFSET: u32 = 0;
pub const BRIGHTNESS_OFFSET: u32 = 2;
/// Bytes used at the start of the storage region
pub const RECORD_SIZE: usize = 4;
pub const CALIBRATION_BIAS: i32 = 1000;

/// The durable user settings
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub calibration: Calibration,
    pub brightness: Brightness,
}

impl Settings {
    pub const fn new(calibration: Calibration, brightness: Brightness) -> Self {
        Self {
            calibration,
            brightness,
        }
    }

    fn encode(&self) -> [u8; RECORD_SIZE] {
        let cal = (self.calibration.get() as i32 + CALIBRATION_BIAS) as u16;
        let bri = self.brightness.get() as u16;
        let mut record = [0u8; RECORD_SIZE];
        record[..2].copy_from_slice(&cal.to_le_bytes());
        record[2..].copy_from_slice(&bri.to_le_bytes());
        record
    }
}

/// Decoded record; a field is `None` when its stored word is out of range
fn decode(record: &[u8; RECORD_SIZE]) -> (Option<Calibration>, Option<Brightness>) {
    let cal = u16::from_le_bytes([record[0], record[1]]) as i32 - CALIBRATION_BIAS;
    let bri = u16::from_le_bytes([record[2], record[3]]);

    let calibration = i16::try_from(cal).ok().and_then(Calibration::new);
    let brightness = u8::try_from(bri).ok().and_then(Brightness::new);
    (calibration, brightness)
}

/// Validated load/save of [`Settings`] over any `embedded-storage` medium
pub struct ConfigStore<S> {
    storage: S,
}

impl<S> ConfigStore<S>
where
    S: Storage,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the settings. Out-of-range values (or an unreadable medium) are
    /// replaced by their defaults and the corrected pair is written back.
    pub fn load(&mut self) -> Settings {
        let mut record = [0u8; RECORD_SIZE];
        let (calibration, brightness) = match self.storage.read(CALIBRATION_OFFSET, &mut record) {
            Ok(()) => decode(&record),
            Err(_) => (None, None),
        };

        let settings = Settings {
            calibration: calibration.unwrap_or(Calibration::DEFAULT),
            brightness: brightness.unwrap_or(Brightness::DEFAULT),
        };

        if calibration.is_none() || brightness.is_none() {
            #[cfg(feature = "defmt")]
            warn!("Stored settings invalid, restoring {}", settings);

            // A failed write is retried on the next boot's load
            self.save(&settings).ok();
        }

        settings
    }

    /// Write both values. Repeating a save is harmless.
    pub fn save(&mut self, settings: &Settings) -> Result<(), S::Error> {
        #[cfg(feature = "defmt")]
        debug!("Saving {}", settings);

        self.storage.write(CALIBRATION_OFFSET, &settings.encode())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}

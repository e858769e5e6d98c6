//! Seven-segment glyph encoding
//!
//! Patterns are logical and active-high: bit 0 is segment A, bit 6 is
//! segment G. Inverting for common-anode wiring is the output adapter's job.
//!
//! ```txt
//!    -A-
//!   F   B
//!    -G-
//!   E   C
//!    -D-
//! ```

pub const SEG_A: u8 = 1 << 0;
pub const SEG_B: u8 = 1 << 1;
pub const SEG_C: u8 = 1 << 2;
pub const SEG_D: u8 = 1 << 3;
pub const SEG_E: u8 = 1 << 4;
pub const SEG_F: u8 = 1 << 5;
pub const SEG_G: u8 = 1 << 6;

/// All seven segments
pub const SEGMENT_MASK: u8 = 0x7f;

/// All segments dark
pub const BLANK: u8 = 0;

const DIGITS: [u8; 10] = [
    0x3f, // 0
    0x06, // 1
    0x5b, // 2
    0x4f, // 3
    0x66, // 4
    0x6d, // 5
    0x7d, // 6
    0x07, // 7
    0x7f, // 8
    0x6f, // 9
];

/// Symbols the clock can show on one digit
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    /// Decimal digit; values above 9 render blank
    Digit(u8),
    /// All segments off
    Blank,
    /// Calibration sign, zero or positive (`c`)
    CalibrationPositive,
    /// Calibration sign, negative (`E`)
    CalibrationNegative,
    /// Brightness-mode marker (`b`)
    BrightnessMarker,
}

impl Glyph {
    /// Decode a raw glyph code: 0-9 digits, 10 blank, 11 `c`, 12 `E`, 13 `b`.
    /// Anything else is blank.
    pub const fn from_code(code: u8) -> Glyph {
        match code {
            0..=9 => Glyph::Digit(code),
            11 => Glyph::CalibrationPositive,
            12 => Glyph::CalibrationNegative,
            13 => Glyph::BrightnessMarker,
            _ => Glyph::Blank,
        }
    }
}

/// Segment pattern for a glyph
pub const fn encode(glyph: Glyph) -> u8 {
    match glyph {
        Glyph::Digit(d) if d < 10 => DIGITS[d as usize],
        Glyph::Digit(_) | Glyph::Blank => BLANK,
        Glyph::CalibrationPositive => SEG_D | SEG_E | SEG_G,
        Glyph::CalibrationNegative => SEG_A | SEG_D | SEG_E | SEG_F | SEG_G,
        Glyph::BrightnessMarker => SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    }
}

/// Segment pattern for a raw glyph code, total over `u8`
pub const fn encode_code(code: u8) -> u8 {
    encode(Glyph::from_code(code))
}

/// Glyphs for a two-digit decimal value, tens first
pub const fn two_digits(value: u8) -> [Glyph; 2] {
    [Glyph::Digit(value / 10 % 10), Glyph::Digit(value % 10)]
}

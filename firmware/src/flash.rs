//! Settings storage in the last flash sector
//!
//! The sector is erased as a whole, so every write reads back the small
//! header region, merges the new bytes and reprograms it half-word by
//! half-word.

use clock_core::hal::HalError;
use embedded_storage::{ReadStorage, Storage};

use crate::ch32v003_hardware::{reg_modify, reg_read, reg_write};

pub const FLASH_BASE: u32 = 0x4002_2000;
pub const FLASH_KEYR: u32 = 0x04;
pub const FLASH_STATR: u32 = 0x0C;
pub const FLASH_CTLR: u32 = 0x10;
pub const FLASH_ADDR: u32 = 0x14;

pub const FLASH_KEY1: u32 = 0x4567_0123;
pub const FLASH_KEY2: u32 = 0xCDEF_89AB;

const CTLR_PG: u32 = 1 << 0;
const CTLR_PER: u32 = 1 << 1;
const CTLR_STRT: u32 = 1 << 6;
const CTLR_LOCK: u32 = 1 << 7;
const STATR_BSY: u32 = 1 << 0;
const STATR_EOP: u32 = 1 << 5;

/// Last 1 KiB sector of the 16 KiB part, excluded from the linker's FLASH
pub const SETTINGS_SECTOR: u32 = 0x0800_3C00;
/// Bytes of the sector that are preserved across writes
pub const SETTINGS_REGION: usize = 64;

/// Raw sector access
pub trait FlashSector {
    /// Copy `bytes.len()` bytes starting at `offset` within the sector
    fn read(&self, offset: u32, bytes: &mut [u8]);

    /// Erase the whole sector to all ones
    fn erase(&mut self) -> Result<(), HalError>;

    /// Program one half-word at an even `offset`
    fn program(&mut self, offset: u32, half_word: u16) -> Result<(), HalError>;
}

/// The CH32V003 flash controller driving [`SETTINGS_SECTOR`]
pub struct Ch32v003Flash;

impl Ch32v003Flash {
    fn unlock(&mut self) {
        reg_write(FLASH_BASE + FLASH_KEYR, FLASH_KEY1);
        reg_write(FLASH_BASE + FLASH_KEYR, FLASH_KEY2);
    }

    fn lock(&mut self) {
        reg_modify(FLASH_BASE + FLASH_CTLR, |v| v | CTLR_LOCK);
    }

    fn wait_idle(&self) -> Result<(), HalError> {
        // ~3 ms sector erase at 24 MHz stays far inside this bound
        for _ in 0..200_000u32 {
            if reg_read(FLASH_BASE + FLASH_STATR) & STATR_BSY == 0 {
                reg_write(FLASH_BASE + FLASH_STATR, STATR_EOP);
                return Ok(());
            }
        }
        Err(HalError::StorageError)
    }
}

impl FlashSector for Ch32v003Flash {
    fn read(&self, offset: u32, bytes: &mut [u8]) {
        for (i, byte) in bytes.iter_mut().enumerate() {
            let addr = SETTINGS_SECTOR + offset + i as u32;
            *byte = unsafe { core::ptr::read_volatile(addr as *const u8) };
        }
    }

    fn erase(&mut self) -> Result<(), HalError> {
        self.unlock();
        reg_modify(FLASH_BASE + FLASH_CTLR, |v| v | CTLR_PER);
        reg_write(FLASH_BASE + FLASH_ADDR, SETTINGS_SECTOR);
        reg_modify(FLASH_BASE + FLASH_CTLR, |v| v | CTLR_STRT);
        let result = self.wait_idle();
        reg_modify(FLASH_BASE + FLASH_CTLR, |v| v & !CTLR_PER);
        self.lock();
        result
    }

    fn program(&mut self, offset: u32, half_word: u16) -> Result<(), HalError> {
        self.unlock();
        reg_modify(FLASH_BASE + FLASH_CTLR, |v| v | CTLR_PG);
        let addr = SETTINGS_SECTOR + offset;
        unsafe { core::ptr::write_volatile(addr as *mut u16, half_word) };
        let result = self.wait_idle();
        reg_modify(FLASH_BASE + FLASH_CTLR, |v| v & !CTLR_PG);
        self.lock();
        result
    }
}

/// `embedded-storage` view of the settings region of a flash sector
pub struct SectorStorage<F> {
    sector: F,
}

impl<F: FlashSector> SectorStorage<F> {
    pub fn new(sector: F) -> Self {
        Self { sector }
    }

    pub fn sector(&self) -> &F {
        &self.sector
    }

    fn check(offset: u32, len: usize) -> Result<usize, HalError> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= SETTINGS_REGION => Ok(start),
            _ => Err(HalError::OutOfBounds),
        }
    }
}

impl<F: FlashSector> ReadStorage for SectorStorage<F> {
    type Error = HalError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        Self::check(offset, bytes.len())?;
        self.sector.read(offset, bytes);
        Ok(())
    }

    fn capacity(&self) -> usize {
        SETTINGS_REGION
    }
}

impl<F: FlashSector> Storage for SectorStorage<F> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = Self::check(offset, bytes.len())?;

        let mut region = [0xFFu8; SETTINGS_REGION];
        self.sector.read(0, &mut region);
        if region[start..start + bytes.len()] == *bytes {
            return Ok(());
        }
        region[start..start + bytes.len()].copy_from_slice(bytes);

        self.sector.erase()?;
        for (i, pair) in region.chunks_exact(2).enumerate() {
            let half_word = u16::from_le_bytes([pair[0], pair[1]]);
            // Erased flash already reads as ones
            if half_word != 0xFFFF {
                self.sector.program(i as u32 * 2, half_word)?;
            }
        }
        Ok(())
    }
}

/*!
iNES (v1) image loader.

Features:
- Parse the 16-byte iNES header from bytes or a file path
- Slice PRG ROM into 16 KiB banks and CHR ROM into 8 KiB banks (an empty CHR
  section means the board carries 8 KiB of CHR RAM instead)
- Report mapper id, header mirroring, four-screen VRAM, battery, PRG-RAM size
  and video region

Notes:
- iNES 2.0 is detected and rejected.
- PRG RAM size: header byte 8 counts 8 KiB units; 0 means 8 KiB by convention.
- The loader only describes the image. Whether the region and mapper are
  emulated is decided when a `Console` is built from it.
*/

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{NesError, Result};

pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;
pub const PRG_RAM_UNIT: usize = 8 * 1024;
const TRAINER_SIZE: usize = 512;

/// Nametable arrangement. Header images only ever say horizontal or
/// vertical; mappers may select the single-screen variants at runtime.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Ntsc,
    Pal,
}

/// Parsed cartridge contents, ready to be wired into a console.
#[derive(Clone)]
pub struct CartridgeImage {
    pub prg_banks: Vec<Vec<u8>>,
    pub chr_banks: Vec<Vec<u8>>,
    pub mapper_id: u16,
    pub mirroring: Mirroring,
    pub four_screen: bool,
    pub battery: bool,
    pub prg_ram_len: usize,
    pub region: Region,
}

// Debug implemented manually so bank payloads do not flood logs.
impl std::fmt::Debug for CartridgeImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartridgeImage")
            .field("prg_banks", &self.prg_banks.len())
            .field("chr_banks", &self.chr_banks.len())
            .field("mapper_id", &self.mapper_id)
            .field("mirroring", &self.mirroring)
            .field("four_screen", &self.four_screen)
            .field("battery", &self.battery)
            .field("prg_ram_len", &self.prg_ram_len)
            .field("region", &self.region)
            .finish()
    }
}

impl CartridgeImage {
    // -------------- Construction --------------

    pub fn from_ines_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 16 {
            return Err(NesError::Truncated {
                section: "header",
                needed: 16,
                available: data.len(),
            });
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(NesError::BadMagic);
        }

        let prg_units = data[4] as usize;
        let chr_units = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];
        let prg_ram_units = data[8] as usize;
        let flags9 = data[9];

        if (flags7 & 0x0C) == 0x08 {
            return Err(NesError::Nes2Unsupported);
        }
        if prg_units == 0 {
            return Err(NesError::MissingPrg);
        }

        let mapper_id = ((flags7 & 0xF0) as u16) | ((flags6 >> 4) as u16);
        let mirroring = if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let battery = flags6 & 0x02 != 0;
        let has_trainer = flags6 & 0x04 != 0;
        let four_screen = flags6 & 0x08 != 0;
        let region = if flags9 & 0x01 != 0 {
            Region::Pal
        } else {
            Region::Ntsc
        };

        let mut offset = 16;
        if has_trainer {
            offset += TRAINER_SIZE;
        }

        let prg_banks = slice_banks(data, &mut offset, prg_units, PRG_BANK_SIZE, "PRG ROM")?;
        let chr_banks = slice_banks(data, &mut offset, chr_units, CHR_BANK_SIZE, "CHR ROM")?;

        let prg_ram_len = prg_ram_units.max(1) * PRG_RAM_UNIT;

        let image = Self {
            prg_banks,
            chr_banks,
            mapper_id,
            mirroring,
            four_screen,
            battery,
            prg_ram_len,
            region,
        };
        debug!(?image, "parsed iNES image");
        Ok(image)
    }

    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_ines_bytes(&bytes)
    }

    // -------------- Accessors --------------

    pub fn prg_rom_len(&self) -> usize {
        self.prg_banks.len() * PRG_BANK_SIZE
    }

    pub fn chr_rom_len(&self) -> usize {
        self.chr_banks.len() * CHR_BANK_SIZE
    }

    /// True when the board provides CHR RAM rather than ROM.
    pub fn chr_is_ram(&self) -> bool {
        self.chr_banks.is_empty()
    }
}

fn slice_banks(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    size: usize,
    section: &'static str,
) -> Result<Vec<Vec<u8>>> {
    let needed = *offset + count * size;
    if data.len() < needed {
        return Err(NesError::Truncated {
            section,
            needed,
            available: data.len(),
        });
    }
    let banks = data[*offset..needed]
        .chunks_exact(size)
        .map(<[u8]>::to_vec)
        .collect();
    *offset = needed;
    Ok(banks)
}

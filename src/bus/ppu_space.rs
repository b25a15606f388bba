#![doc = r#"
PPU address space layout and mirroring helpers.

Layout (16 KiB, sixteen 1 KiB slots)
- $0000-$1FFF  slots 0-7   pattern tables, wired by the mapper (CHR ROM/RAM)
- $2000-$2FFF  slots 8-11  nametables, wired to console CIRAM or cartridge VRAM
- $3000-$3FFF  slots 12-15 alias slots 8-11
- $3F00-$3FFF  palette RAM, claimed by a shadow range and serviced by the PPU

Concepts
- Nametable mirroring is pure wiring: each of the four logical tables points
  at one of two CIRAM banks (or one of four banks on four-screen boards).
- Palette addressing has its own mirroring: $3F10/$3F14/$3F18/$3F1C alias
  $3F00/$3F04/$3F08/$3F0C.
"#]

use crate::bus::{BankId, Bus, Region};
use crate::cartridge::Mirroring;
use crate::error::Result;

pub const PPU_SPACE_SIZE: usize = 0x4000;
pub const PPU_SLOT_SIZE: usize = 0x0400;
pub const PATTERN_SLOT: usize = 0;
pub const PATTERN_SLOTS: usize = 8;
pub const NAMETABLE_SLOT: usize = 8;
pub const NAMETABLE_SLOTS: usize = 8;
pub const PALETTE_START: u16 = 0x3F00;

/// Devices that can claim PPU addresses ahead of the slot decode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PpuDevice {
    Palette,
}

/// The 1 KiB banks nametable slots may point at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nametables {
    /// Console-internal 2 KiB VRAM as two banks.
    pub ciram: [BankId; 2],
    /// Extra 2 KiB on four-screen boards.
    pub cartridge: Option<[BankId; 2]>,
}

impl Nametables {
    /// Bank for each logical table $2000/$2400/$2800/$2C00.
    pub fn layout(&self, mirroring: Mirroring) -> [BankId; 4] {
        let [a, b] = self.ciram;
        if let Some([c, d]) = self.cartridge {
            return [a, b, c, d];
        }
        match mirroring {
            Mirroring::Horizontal => [a, a, b, b],
            Mirroring::Vertical => [a, b, a, b],
            Mirroring::SingleScreenLower => [a, a, a, a],
            Mirroring::SingleScreenUpper => [b, b, b, b],
        }
    }

    /// Point all eight nametable slots (including the $3000 alias) at the
    /// banks selected by `mirroring`. Four-screen boards ignore `mirroring`.
    pub fn wire(&self, bus: &mut Bus<PpuDevice>, mirroring: Mirroring) {
        let layout = self.layout(mirroring);
        for i in 0..NAMETABLE_SLOTS {
            bus.remap(NAMETABLE_SLOT + i, Region::Bank(layout[i % 4]));
        }
    }
}

/// Build the PPU bus with CIRAM allocated and the palette shadow registered.
/// Pattern slots are left open for the mapper.
pub fn build_ppu_bus(four_screen: bool) -> Result<(Bus<PpuDevice>, Nametables)> {
    let mut bus = Bus::new(PPU_SPACE_SIZE, &[PPU_SLOT_SIZE; 16])?;

    let ciram = [
        bus.add_bank(vec![0; PPU_SLOT_SIZE], true),
        bus.add_bank(vec![0; PPU_SLOT_SIZE], true),
    ];
    let cartridge = four_screen.then(|| {
        [
            bus.add_bank(vec![0; PPU_SLOT_SIZE], true),
            bus.add_bank(vec![0; PPU_SLOT_SIZE], true),
        ]
    });
    let nametables = Nametables { ciram, cartridge };
    for i in 0..NAMETABLE_SLOTS {
        bus.map(NAMETABLE_SLOT + i, Region::Bank(ciram[i & 1]))?;
    }

    bus.register_shadow_getter(PALETTE_START..=0x3FFF, PpuDevice::Palette);
    bus.register_shadow_setter(PALETTE_START..=0x3FFF, PpuDevice::Palette);

    Ok((bus, nametables))
}

/// Compute the palette RAM byte index (0..=31) for a PPU address in $3F00-$3FFF.
pub fn map_palette_addr(addr: u16) -> usize {
    // Mirror to 0x3F00-0x3F1F
    let mut idx = (addr.wrapping_sub(0x3F00)) as usize & 0x1F;
    // $3F10/$3F14/$3F18/$3F1C mirror $3F00/$3F04/$3F08/$3F0C
    if idx >= 16 && (idx & 0x03) == 0 {
        idx -= 16;
    }
    idx
}

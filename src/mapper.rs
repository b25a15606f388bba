/*!
Mapper subsystem: trait definition, shared bank wiring and NROM (mapper 0).

Model:
- A mapper never serves bytes itself. At construction its `Board` moves the
  cartridge banks into the CPU and PPU bus arenas and keeps only `BankId`s.
- `write` updates the mapper's registers. `resolve` then re-points bus slots
  at banks (and rewires nametables). Switching a bank is an index update;
  nothing is copied.
- `clock` runs once per CPU slot with the PPU bus's last driven address, for
  boards that watch the PPU address lines (MMC3 A12).

Bank granularity is uniform across boards: PRG is handled in 8 KiB banks
(CPU slots 4-7), CHR in 1 KiB banks (PPU slots 0-7). Larger windows are
expressed as runs of consecutive small banks.
*/

use std::fmt;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::bus::cpu_space::{CpuDevice, PRG_RAM_SLOT, PRG_ROM_SLOT, PRG_ROM_SLOTS};
use crate::bus::ppu_space::{Nametables, PATTERN_SLOT, PATTERN_SLOTS, PpuDevice};
use crate::bus::{BankId, Bus, Region};
use crate::cartridge::{CHR_BANK_SIZE, CartridgeImage, Mirroring, PRG_RAM_UNIT};
use crate::error::Result;
use crate::interrupts::InterruptLines;

pub const PRG_BANK_8K: usize = 0x2000;
pub const CHR_BANK_1K: usize = 0x0400;

/// Side channels available to a register write.
#[derive(Debug)]
pub struct MapperContext<'a> {
    pub lines: &'a mut InterruptLines,
    /// CPU cycle of the write, for boards that filter back-to-back writes.
    pub cpu_cycle: u64,
}

/// Both bus sides, borrowed for rewiring.
#[derive(Debug)]
pub struct Wiring<'a> {
    pub cpu: &'a mut Bus<CpuDevice>,
    pub ppu: &'a mut Bus<PpuDevice>,
}

/// Common interface every cartridge board implements.
pub trait Mapper: fmt::Debug {
    /// iNES mapper number.
    fn id(&self) -> u16;

    fn name(&self) -> &'static str;

    /// CPU addresses whose writes reach the board's registers. `None` for
    /// boards without registers.
    fn window(&self) -> Option<RangeInclusive<u16>> {
        Some(0x8000..=0xFFFF)
    }

    /// Register write inside `window()`.
    fn write(&mut self, addr: u16, value: u8, ctx: &mut MapperContext<'_>);

    /// Point bus slots at the banks the registers currently select.
    fn resolve(&self, wiring: &mut Wiring<'_>);

    /// One tick per CPU slot, after the PPU dots of that slot.
    fn clock(&mut self, _ppu_addr: u16, _lines: &mut InterruptLines) {}

    /// Console reset button.
    fn reset(&mut self, _lines: &mut InterruptLines) {}
}

// -------------- Board --------------

/// Cartridge banks installed in the bus arenas, plus the helpers every
/// mapper uses to express its bank windows.
#[derive(Debug, Clone)]
pub struct Board {
    prg: Vec<BankId>,
    chr: Vec<BankId>,
    chr_is_ram: bool,
    prg_ram: Vec<BankId>,
    nametables: Nametables,
    mirroring: Mirroring,
}

impl Board {
    /// Move the image's banks into the arenas and give every cartridge slot a
    /// provisional mapping (validating bank sizes once, up front).
    pub fn install(
        image: CartridgeImage,
        wiring: &mut Wiring<'_>,
        nametables: Nametables,
    ) -> Result<Self> {
        let chr_is_ram = image.chr_is_ram();

        let prg: Vec<BankId> = image
            .prg_banks
            .iter()
            .flat_map(|bank| bank.chunks_exact(PRG_BANK_8K))
            .map(|chunk| wiring.cpu.add_bank(chunk.to_vec(), false))
            .collect();

        let chr: Vec<BankId> = if chr_is_ram {
            (0..CHR_BANK_SIZE / CHR_BANK_1K)
                .map(|_| wiring.ppu.add_bank(vec![0; CHR_BANK_1K], true))
                .collect()
        } else {
            image
                .chr_banks
                .iter()
                .flat_map(|bank| bank.chunks_exact(CHR_BANK_1K))
                .map(|chunk| wiring.ppu.add_bank(chunk.to_vec(), false))
                .collect()
        };

        let prg_ram: Vec<BankId> = (0..image.prg_ram_len / PRG_RAM_UNIT)
            .map(|_| wiring.cpu.add_bank(vec![0; PRG_RAM_UNIT], true))
            .collect();

        for i in 0..PRG_ROM_SLOTS {
            wiring
                .cpu
                .map(PRG_ROM_SLOT + i, Region::Bank(prg[i % prg.len()]))?;
        }
        for i in 0..PATTERN_SLOTS {
            wiring
                .ppu
                .map(PATTERN_SLOT + i, Region::Bank(chr[i % chr.len()]))?;
        }
        if let Some(&ram) = prg_ram.first() {
            wiring.cpu.map(PRG_RAM_SLOT, Region::Bank(ram))?;
        }

        debug!(
            prg_8k = prg.len(),
            chr_1k = chr.len(),
            chr_is_ram,
            prg_ram_8k = prg_ram.len(),
            "cartridge banks installed"
        );

        Ok(Self {
            prg,
            chr,
            chr_is_ram,
            prg_ram,
            nametables,
            mirroring: image.mirroring,
        })
    }

    pub fn prg_8k_count(&self) -> usize {
        self.prg.len()
    }

    pub fn prg_16k_count(&self) -> usize {
        self.prg.len() / 2
    }

    pub fn chr_1k_count(&self) -> usize {
        self.chr.len()
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }

    /// Mirroring from the image header.
    pub fn header_mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn four_screen(&self) -> bool {
        self.nametables.cartridge.is_some()
    }

    // -------------- PRG windows (slot = 8 KiB window index 0..4 from $8000) --------------

    pub fn map_prg_8k(&self, cpu: &mut Bus<CpuDevice>, window: usize, bank: usize) {
        let id = self.prg[bank % self.prg.len()];
        cpu.remap(PRG_ROM_SLOT + window, Region::Bank(id));
    }

    /// `half` 0 is $8000-$BFFF, 1 is $C000-$FFFF.
    pub fn map_prg_16k(&self, cpu: &mut Bus<CpuDevice>, half: usize, bank: usize) {
        let bank = bank % self.prg_16k_count().max(1);
        self.map_prg_8k(cpu, half * 2, bank * 2);
        self.map_prg_8k(cpu, half * 2 + 1, bank * 2 + 1);
    }

    pub fn map_prg_32k(&self, cpu: &mut Bus<CpuDevice>, bank: usize) {
        let count = (self.prg.len() / 4).max(1);
        let base = (bank % count) * 4;
        for window in 0..4 {
            self.map_prg_8k(cpu, window, base + window);
        }
    }

    /// Map (or unmap) the first PRG-RAM bank at $6000 with a write gate.
    pub fn map_prg_ram(&self, cpu: &mut Bus<CpuDevice>, enabled: bool, writable: bool) {
        let region = match self.prg_ram.first() {
            Some(&id) if enabled => Region::Bank(id),
            _ => Region::Open,
        };
        cpu.remap(PRG_RAM_SLOT, region);
        cpu.set_slot_writable(PRG_RAM_SLOT, writable);
    }

    // -------------- CHR windows (slot = 1 KiB window index 0..8 from $0000) --------------

    pub fn map_chr_1k(&self, ppu: &mut Bus<PpuDevice>, window: usize, bank: usize) {
        let id = self.chr[bank % self.chr.len()];
        ppu.remap(PATTERN_SLOT + window, Region::Bank(id));
    }

    /// `window` is in 1 KiB units and must be even; `bank` is in 2 KiB units.
    pub fn map_chr_2k(&self, ppu: &mut Bus<PpuDevice>, window: usize, bank: usize) {
        self.map_chr_1k(ppu, window, bank * 2);
        self.map_chr_1k(ppu, window + 1, bank * 2 + 1);
    }

    /// `half` 0 is $0000-$0FFF, 1 is $1000-$1FFF; `bank` is in 4 KiB units.
    pub fn map_chr_4k(&self, ppu: &mut Bus<PpuDevice>, half: usize, bank: usize) {
        for i in 0..4 {
            self.map_chr_1k(ppu, half * 4 + i, bank * 4 + i);
        }
    }

    pub fn map_chr_8k(&self, ppu: &mut Bus<PpuDevice>, bank: usize) {
        for i in 0..8 {
            self.map_chr_1k(ppu, i, bank * 8 + i);
        }
    }

    pub fn wire_nametables(&self, ppu: &mut Bus<PpuDevice>, mirroring: Mirroring) {
        self.nametables.wire(ppu, mirroring);
    }
}

// -------------- NROM --------------

/// NROM (mapper 0): 16 or 32 KiB PRG, 8 KiB CHR, header mirroring, no
/// registers. A 16 KiB image appears twice in $8000-$FFFF.
#[derive(Debug, Clone)]
pub struct Nrom {
    board: Board,
}

impl Nrom {
    pub fn new(board: Board) -> Self {
        Self { board }
    }
}

impl Mapper for Nrom {
    fn id(&self) -> u16 {
        0
    }

    fn name(&self) -> &'static str {
        "NROM"
    }

    fn window(&self) -> Option<RangeInclusive<u16>> {
        None
    }

    fn write(&mut self, _addr: u16, _value: u8, _ctx: &mut MapperContext<'_>) {}

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        self.board.map_prg_16k(wiring.cpu, 0, 0);
        self.board.map_prg_16k(wiring.cpu, 1, 1);
        self.board.map_chr_8k(wiring.ppu, 0);
        self.board.map_prg_ram(wiring.cpu, true, true);
        self.board
            .wire_nametables(wiring.ppu, self.board.header_mirroring());
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{MapperRig, banked_image};

    #[test]
    fn nrom_128_mirrors_prg_into_both_halves() {
        let rig = MapperRig::new(banked_image(0, 1, 1));
        assert_eq!(rig.cpu_peek(0x8000), 0);
        assert_eq!(rig.cpu_peek(0xA000), 1);
        assert_eq!(rig.cpu_peek(0xC000), 0);
        assert_eq!(rig.cpu_peek(0xE000), 1);
        assert!(rig.mapper.window().is_none());
    }

    #[test]
    fn nrom_256_maps_prg_linearly() {
        let rig = MapperRig::new(banked_image(0, 2, 1));
        for (i, addr) in [0x8000u16, 0xA000, 0xC000, 0xE000].iter().enumerate() {
            assert_eq!(rig.cpu_peek(*addr), i as u8);
        }
    }

    #[test]
    fn chr_rom_is_read_only_and_chr_ram_is_writable() {
        let mut rig = MapperRig::new(banked_image(0, 1, 1));
        assert_eq!(rig.ppu.get_byte(0x0C00), 3);
        rig.ppu.set_byte(0x0C00, 0x99);
        assert_eq!(rig.ppu.get_byte(0x0C00), 3);

        let mut rig = MapperRig::new(banked_image(0, 1, 0));
        rig.ppu.set_byte(0x1234, 0x5E);
        assert_eq!(rig.ppu.get_byte(0x1234), 0x5E);
    }

    #[test]
    fn prg_ram_is_mapped_at_6000() {
        let mut rig = MapperRig::new(banked_image(0, 1, 1));
        rig.cpu.set_byte(0x6001, 0x42);
        assert_eq!(rig.cpu.get_byte(0x6001), 0x42);
    }
}

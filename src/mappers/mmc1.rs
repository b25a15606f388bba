//! MMC1 (Mapper 1) implementation.
//!
//! Implements:
//! - Serial shift register writes (5-bit) to control / CHR0 / CHR1 / PRG registers
//! - Reset bit (D7) clears the shift state and forces 16K PRG mode with $C000 fixed
//! - PRG banking modes (32K switch, or 16K with fixed low or high)
//! - CHR banking (8K or 4K+4K)
//! - Mirroring control (single-screen lower/upper, vertical, horizontal)
//! - PRG RAM disable bit (PRG register bit 4)
//! - Writes on consecutive CPU cycles are ignored after the first (the second
//!   write of a read-modify-write instruction)
//! - 512 KiB boards (SUROM): CHR0 bit 4 selects the outer 256 KiB PRG half
use std::ops::RangeInclusive;

use tracing::trace;

use crate::cartridge::Mirroring;
use crate::interrupts::InterruptLines;
use crate::mapper::{Board, Mapper, MapperContext, Wiring};

/// MMC1 mapper core state.
#[derive(Debug, Clone)]
pub struct Mmc1 {
    board: Board,

    // 5-bit registers
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,

    // Serial latch
    shift_reg: u8,
    shift_count: u8,

    last_write_cycle: Option<u64>,
}

impl Mmc1 {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            shift_reg: 0,
            shift_count: 0,
            last_write_cycle: None,
        }
    }

    fn reset_shift(&mut self) {
        self.shift_reg = 0;
        self.shift_count = 0;
    }

    fn mirroring(&self) -> Mirroring {
        match self.control & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0x03
    }

    fn chr_4k_mode(&self) -> bool {
        self.control & 0x10 != 0
    }

    fn commit(&mut self, addr: u16, value: u8) {
        match addr & 0x6000 {
            0x0000 => self.control = value,
            0x2000 => self.chr_bank0 = value,
            0x4000 => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }
        trace!(
            addr = format_args!("{addr:#06X}"),
            value,
            "MMC1 register write"
        );
    }
}

impl Mapper for Mmc1 {
    fn id(&self) -> u16 {
        1
    }

    fn name(&self) -> &'static str {
        "MMC1"
    }

    fn window(&self) -> Option<RangeInclusive<u16>> {
        Some(0x8000..=0xFFFF)
    }

    fn write(&mut self, addr: u16, value: u8, ctx: &mut MapperContext<'_>) {
        let back_to_back = self
            .last_write_cycle
            .is_some_and(|last| ctx.cpu_cycle == last + 1);
        self.last_write_cycle = Some(ctx.cpu_cycle);
        if back_to_back {
            return;
        }

        if value & 0x80 != 0 {
            self.reset_shift();
            self.control |= 0x0C;
            return;
        }

        self.shift_reg = (self.shift_reg >> 1) | ((value & 1) << 4);
        self.shift_count += 1;
        if self.shift_count == 5 {
            let data = self.shift_reg;
            self.reset_shift();
            self.commit(addr, data);
        }
    }

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        let board = &self.board;

        let outer = if board.prg_16k_count() > 16 {
            (self.chr_bank0 & 0x10) as usize
        } else {
            0
        };
        let bank = (self.prg_bank & 0x0F) as usize;
        match self.prg_mode() {
            0 | 1 => {
                board.map_prg_16k(wiring.cpu, 0, outer | (bank & !1));
                board.map_prg_16k(wiring.cpu, 1, outer | (bank & !1) | 1);
            }
            2 => {
                board.map_prg_16k(wiring.cpu, 0, outer);
                board.map_prg_16k(wiring.cpu, 1, outer | bank);
            }
            _ => {
                board.map_prg_16k(wiring.cpu, 0, outer | bank);
                board.map_prg_16k(wiring.cpu, 1, outer | 0x0F);
            }
        }

        if self.chr_4k_mode() {
            board.map_chr_4k(wiring.ppu, 0, self.chr_bank0 as usize);
            board.map_chr_4k(wiring.ppu, 1, self.chr_bank1 as usize);
        } else {
            board.map_chr_8k(wiring.ppu, (self.chr_bank0 >> 1) as usize);
        }

        board.map_prg_ram(wiring.cpu, self.prg_bank & 0x10 == 0, true);
        board.wire_nametables(wiring.ppu, self.mirroring());
    }

    fn reset(&mut self, _lines: &mut InterruptLines) {
        self.reset_shift();
        self.control |= 0x0C;
        self.last_write_cycle = None;
    }
}

//! MMC3 (Mapper 4) implementation.
//!
//! Banking:
//! - PRG: two switchable 8 KiB windows (R6, R7) and two fixed ones (the
//!   second-last and last banks). Bank-select bit 6 swaps R6 with the
//!   second-last bank between $8000 and $C000.
//! - CHR: two 2 KiB windows (R0, R1) and four 1 KiB windows (R2-R5). Bit 7
//!   swaps the $0000 and $1000 halves.
//! - $A000 selects vertical/horizontal mirroring (ignored on four-screen
//!   boards); $A001 enables PRG RAM and sets its write protect.
//!
//! Scanline IRQ:
//! - The counter is clocked by rising edges of PPU A12, as observed on the
//!   PPU bus once per mapper tick.
//! - An edge only counts when A12 stayed low for at least
//!   [`A12_LOW_TICKS`] ticks beforehand, which filters the rapid toggling
//!   inside the sprite fetch window.
//! - On a counted edge the counter reloads from the latch when it is zero or
//!   a reload was requested, and decrements otherwise. Reaching zero with
//!   IRQs enabled asserts the line; $E000 disables and acknowledges.
use tracing::trace;

use crate::cartridge::Mirroring;
use crate::interrupts::{InterruptLines, IrqSource};
use crate::mapper::{Board, Mapper, MapperContext, Wiring};

/// Mapper ticks A12 must stay low before a rising edge clocks the counter.
pub const A12_LOW_TICKS: u32 = 16;

#[derive(Debug, Clone)]
pub struct Mmc3 {
    board: Board,

    bank_select: u8,
    regs: [u8; 8],
    mirroring: Mirroring,
    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq: IrqSource,

    a12_high: bool,
    a12_low_ticks: u32,
}

impl Mmc3 {
    pub fn new(board: Board) -> Self {
        let mirroring = board.header_mirroring();
        Self {
            board,
            bank_select: 0,
            regs: [0, 2, 4, 5, 6, 7, 0, 1],
            mirroring,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq: IrqSource::new(),
            a12_high: false,
            a12_low_ticks: 0,
        }
    }

    fn prg_swapped(&self) -> bool {
        self.bank_select & 0x40 != 0
    }

    fn chr_inverted(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    pub fn irq_counter(&self) -> u8 {
        self.irq_counter
    }

    fn clock_counter(&mut self, lines: &mut InterruptLines) {
        if self.irq_reload || self.irq_counter == 0 {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            trace!(latch = self.irq_latch, "MMC3 IRQ");
            self.irq.request(lines);
        }
    }
}

impl Mapper for Mmc3 {
    fn id(&self) -> u16 {
        4
    }

    fn name(&self) -> &'static str {
        "MMC3"
    }

    fn write(&mut self, addr: u16, value: u8, ctx: &mut MapperContext<'_>) {
        let odd = addr & 1 != 0;
        match (addr & 0xE000, odd) {
            (0x8000, false) => self.bank_select = value,
            (0x8000, true) => {
                let target = (self.bank_select & 0x07) as usize;
                self.regs[target] = value;
                trace!(target, value, "MMC3 bank data");
            }
            (0xA000, false) => {
                self.mirroring = if value & 1 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
            }
            (0xA000, true) => {
                self.prg_ram_enabled = value & 0x80 != 0;
                self.prg_ram_write_protect = value & 0x40 != 0;
            }
            (0xC000, false) => self.irq_latch = value,
            (0xC000, true) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            (0xE000, false) => {
                self.irq_enabled = false;
                self.irq.acknowledge(ctx.lines);
            }
            (0xE000, true) => self.irq_enabled = true,
            _ => unreachable!("MMC3 window is $8000-$FFFF"),
        }
    }

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        let board = &self.board;
        let second_last = board.prg_8k_count() - 2;
        let last = board.prg_8k_count() - 1;
        let r6 = self.regs[6] as usize;
        let r7 = self.regs[7] as usize;

        let (low, high) = if self.prg_swapped() {
            (second_last, r6)
        } else {
            (r6, second_last)
        };
        board.map_prg_8k(wiring.cpu, 0, low);
        board.map_prg_8k(wiring.cpu, 1, r7);
        board.map_prg_8k(wiring.cpu, 2, high);
        board.map_prg_8k(wiring.cpu, 3, last);

        // 2 KiB pair lives in one half, the four 1 KiB banks in the other.
        let (pairs, singles) = if self.chr_inverted() { (4, 0) } else { (0, 4) };
        board.map_chr_2k(wiring.ppu, pairs, (self.regs[0] >> 1) as usize);
        board.map_chr_2k(wiring.ppu, pairs + 2, (self.regs[1] >> 1) as usize);
        for i in 0..4 {
            board.map_chr_1k(wiring.ppu, singles + i, self.regs[2 + i] as usize);
        }

        board.map_prg_ram(
            wiring.cpu,
            self.prg_ram_enabled,
            !self.prg_ram_write_protect,
        );
        board.wire_nametables(wiring.ppu, self.mirroring);
    }

    fn clock(&mut self, ppu_addr: u16, lines: &mut InterruptLines) {
        let high = ppu_addr & 0x1000 != 0;
        if high {
            if !self.a12_high && self.a12_low_ticks >= A12_LOW_TICKS {
                self.clock_counter(lines);
            }
            self.a12_low_ticks = 0;
        } else {
            self.a12_low_ticks = self.a12_low_ticks.saturating_add(1);
        }
        self.a12_high = high;
    }

    fn reset(&mut self, lines: &mut InterruptLines) {
        self.irq_enabled = false;
        self.irq_reload = false;
        self.irq_counter = 0;
        self.irq.acknowledge(lines);
    }
}

//! AxROM (Mapper 7): 32 KiB PRG switching with a register-selected
//! single-screen nametable. CHR is 8 KiB RAM.
use tracing::trace;

use crate::cartridge::Mirroring;
use crate::mapper::{Board, Mapper, MapperContext, Wiring};

#[derive(Debug, Clone)]
pub struct Axrom {
    board: Board,
    reg: u8,
}

impl Axrom {
    pub fn new(board: Board) -> Self {
        Self { board, reg: 0 }
    }

    fn mirroring(&self) -> Mirroring {
        if self.reg & 0x10 != 0 {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::SingleScreenLower
        }
    }
}

impl Mapper for Axrom {
    fn id(&self) -> u16 {
        7
    }

    fn name(&self) -> &'static str {
        "AxROM"
    }

    fn write(&mut self, _addr: u16, value: u8, _ctx: &mut MapperContext<'_>) {
        self.reg = value;
        trace!(value, "AxROM select");
    }

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        let board = &self.board;
        board.map_prg_32k(wiring.cpu, (self.reg & 0x07) as usize);
        board.map_chr_8k(wiring.ppu, 0);
        board.map_prg_ram(wiring.cpu, true, true);
        board.wire_nametables(wiring.ppu, self.mirroring());
    }
}

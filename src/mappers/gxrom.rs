//! GxROM (Mapper 66): one register selects 32 KiB PRG (bits 4-5) and 8 KiB
//! CHR (bits 0-1). Mirroring from the header.
use tracing::trace;

use crate::mapper::{Board, Mapper, MapperContext, Wiring};

#[derive(Debug, Clone)]
pub struct Gxrom {
    board: Board,
    reg: u8,
}

impl Gxrom {
    pub fn new(board: Board) -> Self {
        Self { board, reg: 0 }
    }
}

impl Mapper for Gxrom {
    fn id(&self) -> u16 {
        66
    }

    fn name(&self) -> &'static str {
        "GxROM"
    }

    fn write(&mut self, _addr: u16, value: u8, _ctx: &mut MapperContext<'_>) {
        self.reg = value;
        trace!(value, "GxROM select");
    }

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        let board = &self.board;
        board.map_prg_32k(wiring.cpu, ((self.reg >> 4) & 0x03) as usize);
        board.map_chr_8k(wiring.ppu, (self.reg & 0x03) as usize);
        board.map_prg_ram(wiring.cpu, true, true);
        board.wire_nametables(wiring.ppu, board.header_mirroring());
    }
}

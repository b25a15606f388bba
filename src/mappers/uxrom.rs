//! UxROM (Mapper 2): one register selects the 16 KiB bank at $8000; the last
//! bank stays fixed at $C000. CHR is 8 KiB (usually RAM), mirroring from the
//! header.
use tracing::trace;

use crate::mapper::{Board, Mapper, MapperContext, Wiring};

#[derive(Debug, Clone)]
pub struct Uxrom {
    board: Board,
    bank: u8,
}

impl Uxrom {
    pub fn new(board: Board) -> Self {
        Self { board, bank: 0 }
    }
}

impl Mapper for Uxrom {
    fn id(&self) -> u16 {
        2
    }

    fn name(&self) -> &'static str {
        "UxROM"
    }

    fn write(&mut self, _addr: u16, value: u8, _ctx: &mut MapperContext<'_>) {
        self.bank = value;
        trace!(bank = value, "UxROM PRG select");
    }

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        let board = &self.board;
        board.map_prg_16k(wiring.cpu, 0, self.bank as usize);
        board.map_prg_16k(wiring.cpu, 1, board.prg_16k_count() - 1);
        board.map_chr_8k(wiring.ppu, 0);
        board.map_prg_ram(wiring.cpu, true, true);
        board.wire_nametables(wiring.ppu, board.header_mirroring());
    }
}

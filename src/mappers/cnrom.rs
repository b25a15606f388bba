/*!
CNROM (Mapper 3) implementation.

Characteristics:
- PRG: Fixed (16 KiB mirrored or 32 KiB direct) at $8000-$FFFF; no PRG banking.
- CHR: Switchable in 8 KiB banks via CPU writes to $8000-$FFFF (bank select register).
- Mirroring: Determined solely by the image header.
- No IRQ generation.

Bank Select:
- Typical hardware decodes the lower 2 bits; this implementation takes the
  whole value modulo the number of available 8 KiB CHR banks.
*/

use tracing::trace;

use crate::interrupts::InterruptLines;
use crate::mapper::{Board, Mapper, MapperContext, Wiring};

#[derive(Debug, Clone)]
pub struct Cnrom {
    board: Board,
    chr_bank: u8,
}

impl Cnrom {
    pub fn new(board: Board) -> Self {
        Self { board, chr_bank: 0 }
    }
}

impl Mapper for Cnrom {
    fn id(&self) -> u16 {
        3
    }

    fn name(&self) -> &'static str {
        "CNROM"
    }

    fn write(&mut self, _addr: u16, value: u8, _ctx: &mut MapperContext<'_>) {
        self.chr_bank = value;
        trace!(bank = value, "CNROM CHR select");
    }

    fn resolve(&self, wiring: &mut Wiring<'_>) {
        let board = &self.board;
        board.map_prg_16k(wiring.cpu, 0, 0);
        board.map_prg_16k(wiring.cpu, 1, 1);
        board.map_chr_8k(wiring.ppu, self.chr_bank as usize);
        board.map_prg_ram(wiring.cpu, true, true);
        board.wire_nametables(wiring.ppu, board.header_mirroring());
    }

    fn reset(&mut self, _lines: &mut InterruptLines) {
        self.chr_bank = 0;
    }
}

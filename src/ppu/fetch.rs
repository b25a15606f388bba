#![doc = r#"
Background fetch pipeline and scroll register updates.

Tile fetch (8 dots, each byte an address dot then a data dot):
```text
phase 0/1  nametable byte   $2000 | (v & $0FFF)
phase 2/3  attribute byte   $23C0 | nametable | coarse Y/4 << 3 | coarse X/4
phase 4/5  pattern low      table | tile * 16 | fine Y
phase 6/7  pattern high     same + 8, then coarse X increment
```
The fetched bytes wait in latches until the next reload moves them into the
low halves of the 16-bit shifters. Attribute bits are expanded to a full
byte so both shifters move in lockstep.

`v` layout: `yyy NN YYYYY XXXXX` (fine Y, nametable, coarse Y, coarse X).
"#]

use super::{Ppu, PpuCtrl};

#[derive(Debug, Clone, Copy, Default)]
pub(in crate::ppu) struct Background {
    tile: u8,
    palette: u8,
    pattern_lo: u8,
    pattern_hi: u8,
    shift_lo: u16,
    shift_hi: u16,
    attr_lo: u16,
    attr_hi: u16,
}

impl Background {
    #[inline]
    pub(in crate::ppu) fn shift(&mut self) {
        self.shift_lo <<= 1;
        self.shift_hi <<= 1;
        self.attr_lo <<= 1;
        self.attr_hi <<= 1;
    }

    #[inline]
    pub(in crate::ppu) fn reload(&mut self) {
        self.shift_lo = (self.shift_lo & 0xFF00) | u16::from(self.pattern_lo);
        self.shift_hi = (self.shift_hi & 0xFF00) | u16::from(self.pattern_hi);
        let expand = |bit: bool| if bit { 0x00FF } else { 0x0000 };
        self.attr_lo = (self.attr_lo & 0xFF00) | expand(self.palette & 0x01 != 0);
        self.attr_hi = (self.attr_hi & 0xFF00) | expand(self.palette & 0x02 != 0);
    }

    /// (pixel 0-3, palette 0-3) at the fine-X tap.
    #[inline]
    pub(in crate::ppu) fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let tap = 0x8000u16 >> fine_x;
        let bit = |reg: u16| u8::from(reg & tap != 0);
        (
            bit(self.shift_lo) | (bit(self.shift_hi) << 1),
            bit(self.attr_lo) | (bit(self.attr_hi) << 1),
        )
    }
}

impl Ppu {
    #[inline]
    pub(in crate::ppu) fn nametable_addr(&self) -> u16 {
        0x2000 | (self.v & 0x0FFF)
    }

    #[inline]
    fn attribute_addr(&self) -> u16 {
        0x23C0 | (self.v & 0x0C00) | ((self.v >> 4) & 0x38) | ((self.v >> 2) & 0x07)
    }

    #[inline]
    fn background_pattern_addr(&self, plane: u16) -> u16 {
        let table = if self.ctrl.contains(PpuCtrl::BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        };
        table | (u16::from(self.bg.tile) << 4) | ((self.v >> 12) & 0x07) | plane
    }

    /// One dot of the tile fetch cycle; `phase` is `(dot - 1) % 8`.
    pub(in crate::ppu) fn fetch_background_phase(&mut self, phase: u16) {
        match phase {
            0 => self.bus.latch(self.nametable_addr()),
            1 => self.bg.tile = self.bus.get_byte(self.nametable_addr()),
            2 => self.bus.latch(self.attribute_addr()),
            3 => {
                let byte = self.bus.get_byte(self.attribute_addr());
                let shift = ((self.v >> 4) & 0x04) | (self.v & 0x02);
                self.bg.palette = (byte >> shift) & 0x03;
            }
            4 => self.bus.latch(self.background_pattern_addr(0)),
            5 => self.bg.pattern_lo = self.bus.get_byte(self.background_pattern_addr(0)),
            6 => self.bus.latch(self.background_pattern_addr(8)),
            _ => {
                self.bg.pattern_hi = self.bus.get_byte(self.background_pattern_addr(8));
                self.increment_x();
            }
        }
    }

    /// Coarse X + 1, switching the horizontal nametable on wrap.
    pub(in crate::ppu) fn increment_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Fine Y + 1, carrying into coarse Y. Row 29 wraps to 0 and switches the
    /// vertical nametable; rows 30 and 31 (attribute memory) wrap without it.
    pub(in crate::ppu) fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        match coarse_y {
            29 => {
                coarse_y = 0;
                self.v ^= 0x0800;
            }
            31 => coarse_y = 0,
            _ => coarse_y += 1,
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    pub(in crate::ppu) fn copy_x(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    pub(in crate::ppu) fn copy_y(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }
}

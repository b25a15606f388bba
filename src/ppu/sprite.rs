#![doc = r#"
Sprite pattern fetches (dots 257-320) and the eight output slots.

Each slot takes 8 dots: two garbage nametable fetches, then the pattern low
and high bytes, each as an address dot plus a data dot. Slots beyond the
number of sprites found still fetch (tile $FF from the cleared secondary
OAM), so the pattern table address lines toggle the same way every line;
their patterns are forced transparent.

8x16 sprites take the pattern table from tile bit 0 and use the even/odd
tile pair for the top/bottom halves.
"#]

use super::{Ppu, PpuCtrl};

#[derive(Debug, Clone, Copy, Default)]
pub(in crate::ppu) struct SpriteSlot {
    x: u8,
    pattern_lo: u8,
    pattern_hi: u8,
    palette: u8,
    behind_background: bool,
}

/// A sprite pixel that won the slot priority for a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::ppu) struct SpritePixel {
    pub(in crate::ppu) slot: usize,
    pub(in crate::ppu) pixel: u8,
    pub(in crate::ppu) palette: u8,
    pub(in crate::ppu) behind_background: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(in crate::ppu) struct SpriteLine {
    slots: [SpriteSlot; 8],
    count: u8,
    zero_in_slot0: bool,
    pattern_lo: u8,
}

impl SpriteLine {
    /// Slot 0 holds OAM sprite 0 on the line being drawn.
    pub(in crate::ppu) fn has_sprite_zero(&self) -> bool {
        self.zero_in_slot0
    }

    /// First opaque sprite pixel at screen column `x`, lowest slot first.
    pub(in crate::ppu) fn pixel_at(&self, x: u16) -> Option<SpritePixel> {
        self.slots[..usize::from(self.count)]
            .iter()
            .enumerate()
            .find_map(|(slot, sprite)| {
                let dx = x.wrapping_sub(u16::from(sprite.x));
                if dx >= 8 {
                    return None;
                }
                let bit = 7 - dx;
                let pixel = ((sprite.pattern_lo >> bit) & 1) | (((sprite.pattern_hi >> bit) & 1) << 1);
                (pixel != 0).then_some(SpritePixel {
                    slot,
                    pixel,
                    palette: sprite.palette,
                    behind_background: sprite.behind_background,
                })
            })
    }
}

impl Ppu {
    fn sprite_pattern_addr(&self, slot: usize, sy: u16, plane: u16) -> u16 {
        let height = self.ctrl.sprite_height();
        let y = self.secondary[slot * 4];
        let tile = self.secondary[slot * 4 + 1];
        let attr = self.secondary[slot * 4 + 2];

        let mut row = sy.wrapping_sub(u16::from(y)) & (height - 1);
        if attr & 0x80 != 0 {
            row = height - 1 - row;
        }
        let (table, tile) = if height == 16 {
            (u16::from(tile & 0x01) << 12, u16::from(tile & 0xFE))
        } else if self.ctrl.contains(PpuCtrl::SPRITE_TABLE) {
            (0x1000, u16::from(tile))
        } else {
            (0x0000, u16::from(tile))
        };
        table | ((tile + (row >> 3)) << 4) | (row & 0x07) | plane
    }

    /// Dots 257-320.
    pub(in crate::ppu) fn fetch_sprite_phase(&mut self, sy: u16, sx: u16) {
        if sx == 257 {
            self.sprites.count = self.eval.found;
            self.sprites.zero_in_slot0 = self.eval.sprite_zero;
        }

        let slot = usize::from((sx - 257) / 8);
        match (sx - 257) % 8 {
            0 | 2 => self.bus.latch(self.nametable_addr()),
            1 | 3 => {
                self.bus.get_byte(self.nametable_addr());
            }
            4 => self.bus.latch(self.sprite_pattern_addr(slot, sy, 0)),
            5 => {
                self.sprites.pattern_lo = self.bus.get_byte(self.sprite_pattern_addr(slot, sy, 0))
            }
            6 => self.bus.latch(self.sprite_pattern_addr(slot, sy, 8)),
            _ => {
                let hi = self.bus.get_byte(self.sprite_pattern_addr(slot, sy, 8));
                self.load_slot(slot, self.sprites.pattern_lo, hi);
            }
        }
    }

    fn load_slot(&mut self, slot: usize, lo: u8, hi: u8) {
        let attr = self.secondary[slot * 4 + 2];
        let (lo, hi) = if slot >= usize::from(self.sprites.count) {
            (0, 0)
        } else if attr & 0x40 != 0 {
            (lo.reverse_bits(), hi.reverse_bits())
        } else {
            (lo, hi)
        };
        self.sprites.slots[slot] = SpriteSlot {
            x: self.secondary[slot * 4 + 3],
            pattern_lo: lo,
            pattern_hi: hi,
            palette: attr & 0x03,
            behind_background: attr & 0x20 != 0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ppu_with_chr_ram;

    fn fetch_slot(ppu: &mut Ppu, slot: u16, sy: u16) {
        for sx in 257 + slot * 8..257 + slot * 8 + 8 {
            ppu.fetch_sprite_phase(sy, sx);
        }
    }

    fn with_secondary(found: u8, bytes: &[[u8; 4]]) -> Ppu {
        let mut ppu = ppu_with_chr_ram();
        for (i, sprite) in bytes.iter().enumerate() {
            ppu.secondary[i * 4..i * 4 + 4].copy_from_slice(sprite);
        }
        ppu.eval.found = found;
        ppu
    }

    #[test]
    fn slot_fetch_reads_the_selected_row() {
        let mut ppu = with_secondary(1, &[[20, 0x02, 0x01, 100]]);
        ppu.vram_write(0x0020 + 3, 0b1000_0001);
        ppu.vram_write(0x0028 + 3, 0b0000_0001);
        fetch_slot(&mut ppu, 0, 23);

        let hit = ppu.sprites.pixel_at(100).expect("left pixel");
        assert_eq!((hit.pixel, hit.palette), (1, 1));
        assert_eq!(ppu.sprites.pixel_at(107).map(|p| p.pixel), Some(3));
        assert_eq!(ppu.sprites.pixel_at(101), None);
        assert_eq!(ppu.sprites.pixel_at(108), None);
    }

    #[test]
    fn flips_mirror_rows_and_columns() {
        let mut ppu = with_secondary(1, &[[20, 0x02, 0xC0, 0]]);
        ppu.vram_write(0x0020 + 4, 0b1100_0000);
        fetch_slot(&mut ppu, 0, 23);
        assert_eq!(ppu.sprites.pixel_at(6).map(|p| p.pixel), Some(1));
        assert_eq!(ppu.sprites.pixel_at(7).map(|p| p.pixel), Some(1));
        assert_eq!(ppu.sprites.pixel_at(0), None);
    }

    #[test]
    fn tall_sprites_pick_table_and_half_from_the_tile() {
        let mut ppu = with_secondary(1, &[[0, 0x03, 0x00, 0]]);
        ppu.ctrl = PpuCtrl::SPRITE_16;
        assert_eq!(ppu.sprite_pattern_addr(0, 2, 0), 0x1022);
        assert_eq!(ppu.sprite_pattern_addr(0, 10, 8), 0x1000 | 0x30 | 2 | 8);

        ppu.secondary[2] = 0x80;
        assert_eq!(ppu.sprite_pattern_addr(0, 0, 0), 0x1037, "flipped top row is bottom tile row 7");
    }

    #[test]
    fn empty_slots_fetch_tile_ff_but_stay_transparent() {
        let mut ppu = with_secondary(0, &[[0xFF; 4]]);
        ppu.ctrl = PpuCtrl::SPRITE_TABLE;
        ppu.vram_write(0x1FF0, 0xFF);
        for sx in 257..=264 {
            ppu.fetch_sprite_phase(30, sx);
            if sx == 261 {
                assert_eq!(ppu.bus().last_addr() & 0x1FF0, 0x1FF0);
            }
        }
        assert_eq!(ppu.sprites.pixel_at(0xFF), None);
    }

    #[test]
    fn lower_slots_win() {
        let mut ppu = with_secondary(2, &[[0, 1, 0x01, 10], [0, 1, 0x02, 10]]);
        ppu.vram_write(0x0010, 0xFF);
        fetch_slot(&mut ppu, 0, 0);
        fetch_slot(&mut ppu, 1, 0);
        let hit = ppu.sprites.pixel_at(12).expect("opaque");
        assert_eq!((hit.slot, hit.palette), (0, 1));
    }
}

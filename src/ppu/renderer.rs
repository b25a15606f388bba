#![doc = r#"
Pixel composition.

Priority per dot (after left-column clipping):
```text
bg 0, sprite 0    backdrop ($3F00)
bg 0, sprite n    sprite palette
bg n, sprite 0    background palette
bg n, sprite n    sprite unless its priority bit puts it behind; sprite-0 hit
```
Sprite-0 hit is never reported at x = 255. Colour indices go through the
greyscale mask and the master palette into ARGB.
"#]

use super::{NES_PALETTE, NES_WIDTH, Ppu, PpuMask, PpuStatus};
use crate::bus::ppu_space::{PALETTE_START, map_palette_addr};

/// Opaque ARGB for a 6-bit colour index.
pub fn argb(index: u8) -> u32 {
    let [r, g, b] = NES_PALETTE[usize::from(index & 0x3F)];
    0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

impl Ppu {
    pub(in crate::ppu) fn output_pixel(&mut self, x: u16, y: u16) {
        let left = x < 8;

        let (bg, bg_palette) = if self.mask.contains(PpuMask::SHOW_BACKGROUND)
            && !(left && !self.mask.contains(PpuMask::SHOW_BACKGROUND_LEFT))
        {
            self.bg.pixel(self.fine_x)
        } else {
            (0, 0)
        };
        let sprite = if self.mask.contains(PpuMask::SHOW_SPRITES)
            && !(left && !self.mask.contains(PpuMask::SHOW_SPRITES_LEFT))
        {
            self.sprites.pixel_at(x)
        } else {
            None
        };

        let index = match (bg, sprite) {
            (0, None) => 0,
            (0, Some(s)) => 0x10 | (s.palette << 2) | s.pixel,
            (_, None) => (bg_palette << 2) | bg,
            (_, Some(s)) => {
                if s.slot == 0 && self.sprites.has_sprite_zero() && x != 255 {
                    self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
                }
                if s.behind_background {
                    (bg_palette << 2) | bg
                } else {
                    0x10 | (s.palette << 2) | s.pixel
                }
            }
        };
        self.put_pixel(x, y, self.palette[usize::from(index)]);
    }

    /// Rendering disabled: the backdrop, or the palette entry `v` points at.
    pub(in crate::ppu) fn output_backdrop(&mut self, x: u16, y: u16) {
        let entry = if self.v & 0x3F00 == PALETTE_START {
            self.palette[map_palette_addr(self.v)]
        } else {
            self.palette[0]
        };
        self.put_pixel(x, y, entry);
    }

    fn put_pixel(&mut self, x: u16, y: u16, colour: u8) {
        let colour = if self.mask.contains(PpuMask::GREYSCALE) {
            colour & 0x30
        } else {
            colour
        };
        self.frame_buffer[usize::from(y) * NES_WIDTH + usize::from(x)] = argb(colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::InterruptLines;
    use crate::test_utils::ppu_with_chr_ram;

    fn set_addr(ppu: &mut Ppu, lines: &mut InterruptLines, addr: u16) {
        ppu.cpu_write(0x2006, (addr >> 8) as u8, lines);
        ppu.cpu_write(0x2006, addr as u8, lines);
    }

    /// Tile 1 solid colour 1, whole first nametable filled with it,
    /// background palette 0 entry 1 = $16, sprite palette 0 entry 1 = $2A.
    fn solid_background() -> (Ppu, InterruptLines) {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        set_addr(&mut ppu, &mut lines, 0x0010);
        for _ in 0..8 {
            ppu.cpu_write(0x2007, 0xFF, &mut lines);
        }
        set_addr(&mut ppu, &mut lines, 0x2000);
        for _ in 0..960 {
            ppu.cpu_write(0x2007, 0x01, &mut lines);
        }
        set_addr(&mut ppu, &mut lines, 0x3F00);
        for colour in [0x0F, 0x16] {
            ppu.cpu_write(0x2007, colour, &mut lines);
        }
        set_addr(&mut ppu, &mut lines, 0x3F11);
        ppu.cpu_write(0x2007, 0x2A, &mut lines);
        // t = 0: nametable 0, fine Y 0, so every row of the screen is tiled.
        set_addr(&mut ppu, &mut lines, 0x0000);
        (ppu, lines)
    }

    fn run_frame(ppu: &mut Ppu, lines: &mut InterruptLines) {
        let start = ppu.frame_count();
        while ppu.frame_count() == start {
            ppu.tick(lines);
        }
    }

    fn pixel(ppu: &Ppu, x: usize, y: usize) -> u32 {
        ppu.frame_buffer()[y * NES_WIDTH + x]
    }

    #[test]
    fn argb_is_opaque() {
        assert_eq!(argb(0x0F) >> 24, 0xFF);
        assert_eq!(argb(0x4F), argb(0x0F));
    }

    #[test]
    fn background_tiles_render_with_left_clip() {
        let (mut ppu, mut lines) = solid_background();
        ppu.cpu_write(0x2001, 0x08, &mut lines);
        run_frame(&mut ppu, &mut lines);

        assert_eq!(pixel(&ppu, 3, 100), argb(0x0F), "left column clipped");
        assert_eq!(pixel(&ppu, 8, 100), argb(0x16));
        assert_eq!(pixel(&ppu, 255, 239), argb(0x16));

        ppu.cpu_write(0x2001, 0x0A, &mut lines);
        run_frame(&mut ppu, &mut lines);
        assert_eq!(pixel(&ppu, 3, 100), argb(0x16));
    }

    #[test]
    fn greyscale_masks_the_hue() {
        let (mut ppu, mut lines) = solid_background();
        ppu.cpu_write(0x2001, 0x0B, &mut lines);
        run_frame(&mut ppu, &mut lines);
        assert_eq!(pixel(&ppu, 50, 50), argb(0x10));
    }

    #[test]
    fn sprite_zero_hit_over_opaque_background() {
        let (mut ppu, mut lines) = solid_background();
        ppu.oam[..4].copy_from_slice(&[30, 0x01, 0x00, 40]);
        ppu.oam[4..].fill(0xF0);
        ppu.cpu_write(0x2001, 0x1E, &mut lines);

        while ppu.scanline() < 31 {
            ppu.tick(&mut lines);
            assert!(!ppu.status().contains(PpuStatus::SPRITE_ZERO_HIT));
        }
        while ppu.scanline() < 32 {
            ppu.tick(&mut lines);
        }
        assert!(ppu.status().contains(PpuStatus::SPRITE_ZERO_HIT));
        assert_eq!(pixel(&ppu, 40, 31), argb(0x2A));
    }

    #[test]
    fn behind_priority_shows_the_background_but_still_hits() {
        let (mut ppu, mut lines) = solid_background();
        ppu.oam[..4].copy_from_slice(&[30, 0x01, 0x20, 40]);
        ppu.oam[4..].fill(0xF0);
        ppu.cpu_write(0x2001, 0x1E, &mut lines);
        while ppu.scanline() < 32 {
            ppu.tick(&mut lines);
        }
        assert!(ppu.status().contains(PpuStatus::SPRITE_ZERO_HIT));
        assert_eq!(pixel(&ppu, 40, 31), argb(0x16));
    }

    #[test]
    fn no_hit_without_background() {
        let (mut ppu, mut lines) = solid_background();
        ppu.oam[..4].copy_from_slice(&[30, 0x01, 0x00, 40]);
        ppu.oam[4..].fill(0xF0);
        ppu.cpu_write(0x2001, 0x14, &mut lines);
        run_frame(&mut ppu, &mut lines);
        assert!(!ppu.status().contains(PpuStatus::SPRITE_ZERO_HIT));
        assert_eq!(pixel(&ppu, 41, 35), argb(0x2A));
        assert_eq!(pixel(&ppu, 20, 35), argb(0x0F));
    }
}

#![doc = r#"
CPU-visible PPU registers ($2000-$2007, mirrored every 8 bytes to $3FFF).

Notes
- $2000 also writes the nametable select bits of `t`; changing the NMI
  enable bit re-evaluates the NMI line immediately.
- $2002 returns the three flag bits over the low five bits of the I/O latch,
  clears vblank and the write toggle. Sprite-0 hit and overflow are left alone.
  Reading it on the dot before vblank would be set suppresses that vblank.
- $2004 reads return $FF while secondary OAM is being cleared; attribute
  bytes read back with bits 2-4 clear. Writes during rendering only bump
  OAMADDR by 4.
- $2005/$2006 share the write toggle `w` with `t`/`fine_x` (loopy layout).
  The second $2006 write copies `t` to `v` and puts `v` on the PPU bus.
- $2007 reads below $3F00 are delayed through the read buffer; palette reads
  return immediately while the buffer is refilled from the nametable beneath.
  During rendering the access performs the coarse-X/Y increments instead of
  the +1/+32 step.
- Write-only registers read back the I/O latch.
"#]

use bitflags::bitflags;

use super::{NES_HEIGHT, PRE_RENDER_LINE, Ppu, VBLANK_LINE};
use crate::interrupts::InterruptLines;

bitflags! {
    /// $2000
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        const NAMETABLE_X = 0x01;
        const NAMETABLE_Y = 0x02;
        const INCREMENT_32 = 0x04;
        const SPRITE_TABLE = 0x08;
        const BACKGROUND_TABLE = 0x10;
        const SPRITE_16 = 0x20;
        const MASTER_SLAVE = 0x40;
        const NMI_ENABLE = 0x80;
    }
}

bitflags! {
    /// $2001
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        const GREYSCALE = 0x01;
        const SHOW_BACKGROUND_LEFT = 0x02;
        const SHOW_SPRITES_LEFT = 0x04;
        const SHOW_BACKGROUND = 0x08;
        const SHOW_SPRITES = 0x10;
        const EMPHASIZE_RED = 0x20;
        const EMPHASIZE_GREEN = 0x40;
        const EMPHASIZE_BLUE = 0x80;
    }
}

bitflags! {
    /// $2002 (upper three bits only)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 0x20;
        const SPRITE_ZERO_HIT = 0x40;
        const VBLANK = 0x80;
    }
}

impl PpuCtrl {
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::INCREMENT_32) { 32 } else { 1 }
    }

    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_16) { 16 } else { 8 }
    }
}

impl Ppu {
    /// CPU read in $2000-$3FFF, with side effects.
    pub fn cpu_read(&mut self, addr: u16, lines: &mut InterruptLines) -> u8 {
        let value = match addr & 0x0007 {
            2 => {
                if self.sy == VBLANK_LINE && self.sx == 1 {
                    self.suppress_vblank = true;
                }
                let value = self.status.bits() | (self.io_latch & 0x1F);
                self.status.remove(PpuStatus::VBLANK);
                self.w = false;
                self.update_nmi(lines);
                value
            }
            4 => self.read_oam_data(),
            7 => self.read_data(),
            _ => self.io_latch,
        };
        self.io_latch = value;
        value
    }

    /// CPU write in $2000-$3FFF.
    pub fn cpu_write(&mut self, addr: u16, value: u8, lines: &mut InterruptLines) {
        self.io_latch = value;
        match addr & 0x0007 {
            0 => {
                self.ctrl = PpuCtrl::from_bits_retain(value);
                self.t = (self.t & !0x0C00) | (u16::from(value & 0x03) << 10);
                self.update_nmi(lines);
            }
            1 => self.mask = PpuMask::from_bits_retain(value),
            3 => self.oam_addr = value,
            4 => self.write_oam_data(value),
            5 => {
                if !self.w {
                    self.t = (self.t & !0x001F) | u16::from(value >> 3);
                    self.fine_x = value & 0x07;
                } else {
                    self.t = (self.t & !0x73E0)
                        | (u16::from(value & 0x07) << 12)
                        | (u16::from(value & 0xF8) << 2);
                }
                self.w = !self.w;
            }
            6 => {
                if !self.w {
                    self.t = (self.t & 0x00FF) | (u16::from(value & 0x3F) << 8);
                } else {
                    self.t = (self.t & 0xFF00) | u16::from(value);
                    self.v = self.t;
                    self.bus.latch(self.v & 0x3FFF);
                }
                self.w = !self.w;
            }
            7 => {
                self.vram_write(self.v, value);
                self.increment_after_data_access();
            }
            _ => {}
        }
    }

    /// Side-effect-free register view for debuggers.
    pub fn peek_register(&self, addr: u16) -> u8 {
        match addr & 0x0007 {
            2 => self.status.bits() | (self.io_latch & 0x1F),
            4 => self.oam[self.oam_addr as usize],
            _ => self.io_latch,
        }
    }

    /// One OAM data port write, from $2004 or the DMA unit.
    pub fn write_oam_data(&mut self, value: u8) {
        if self.rendering_active() {
            self.oam_addr = self.oam_addr.wrapping_add(4);
            return;
        }
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn read_oam_data(&self) -> u8 {
        if self.rendering_active() && (1..=64).contains(&self.sx) {
            return 0xFF;
        }
        let value = self.oam[self.oam_addr as usize];
        if self.oam_addr & 0x03 == 2 {
            value & 0xE3
        } else {
            value
        }
    }

    fn read_data(&mut self) -> u8 {
        let addr = self.v & 0x3FFF;
        let value = if addr >= 0x3F00 {
            self.read_buffer = self.vram_read(addr & 0x2FFF);
            (self.palette_entry(addr) & 0x3F) | (self.io_latch & 0xC0)
        } else {
            let buffered = self.read_buffer;
            self.read_buffer = self.vram_read(addr);
            buffered
        };
        self.increment_after_data_access();
        value
    }

    fn increment_after_data_access(&mut self) {
        let rendering_line = self.sy < NES_HEIGHT as u16 || self.sy == PRE_RENDER_LINE;
        if rendering_line && self.rendering_enabled() {
            self.increment_x();
            self.increment_y();
        } else {
            self.v = self.v.wrapping_add(self.ctrl.vram_increment()) & 0x7FFF;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ppu_with_chr_ram;

    fn set_addr(ppu: &mut Ppu, lines: &mut InterruptLines, addr: u16) {
        ppu.cpu_write(0x2006, (addr >> 8) as u8, lines);
        ppu.cpu_write(0x2006, addr as u8, lines);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle_only() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        ppu.status = PpuStatus::all();
        ppu.cpu_write(0x2005, 0x10, &mut lines);
        assert!(ppu.w);

        let value = ppu.cpu_read(0x2002, &mut lines);
        assert_eq!(value & 0xE0, 0xE0);
        assert!(!ppu.w);
        assert_eq!(
            ppu.status(),
            PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW
        );
    }

    #[test]
    fn status_low_bits_come_from_the_io_latch() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        ppu.cpu_write(0x2003, 0x1B, &mut lines);
        assert_eq!(ppu.cpu_read(0x2002, &mut lines), 0x1B);
        assert_eq!(ppu.cpu_read(0x3FFA, &mut lines), 0x1B, "mirror of $2002");
    }

    #[test]
    fn oam_round_trip_masks_attribute_bytes() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        ppu.cpu_write(0x2003, 0x10, &mut lines);
        for value in [0x40, 0x21, 0xFF, 0x80] {
            ppu.cpu_write(0x2004, value, &mut lines);
        }
        assert_eq!(ppu.oam_addr, 0x14);

        let mut read = Vec::new();
        for addr in 0x10..0x14 {
            ppu.cpu_write(0x2003, addr, &mut lines);
            read.push(ppu.cpu_read(0x2004, &mut lines));
        }
        assert_eq!(read, [0x40, 0x21, 0xE3, 0x80]);
        assert_eq!(ppu.oam_addr, 0x13, "reads do not advance OAMADDR");
    }

    #[test]
    fn oam_writes_during_rendering_only_bump_the_address() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        ppu.cpu_write(0x2001, 0x18, &mut lines);
        ppu.sy = 10;
        ppu.sx = 100;
        ppu.cpu_write(0x2003, 0x05, &mut lines);
        ppu.cpu_write(0x2004, 0x77, &mut lines);
        assert_eq!(ppu.oam_addr, 0x09);
        assert_eq!(ppu.oam[5], 0);
    }

    #[test]
    fn nametable_reads_are_buffered() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        set_addr(&mut ppu, &mut lines, 0x2105);
        for value in [0x11, 0x22, 0x33] {
            ppu.cpu_write(0x2007, value, &mut lines);
        }

        set_addr(&mut ppu, &mut lines, 0x2105);
        let _ = ppu.cpu_read(0x2007, &mut lines);
        assert_eq!(ppu.cpu_read(0x2007, &mut lines), 0x11);
        assert_eq!(ppu.cpu_read(0x2007, &mut lines), 0x22);
        assert_eq!(ppu.cpu_read(0x2007, &mut lines), 0x33);
    }

    #[test]
    fn palette_reads_are_immediate_and_mirrored() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        set_addr(&mut ppu, &mut lines, 0x2F10);
        ppu.cpu_write(0x2007, 0x5A, &mut lines);

        set_addr(&mut ppu, &mut lines, 0x3F10);
        ppu.cpu_write(0x2007, 0x2C, &mut lines);
        set_addr(&mut ppu, &mut lines, 0x3F00);
        assert_eq!(ppu.cpu_read(0x2007, &mut lines) & 0x3F, 0x2C);

        set_addr(&mut ppu, &mut lines, 0x3F10);
        assert_eq!(ppu.cpu_read(0x2007, &mut lines) & 0x3F, 0x2C);
        assert_eq!(ppu.read_buffer, 0x5A, "buffer filled from the nametable below");
    }

    #[test]
    fn increment_32_steps_down_a_column() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        ppu.cpu_write(0x2000, 0x04, &mut lines);
        set_addr(&mut ppu, &mut lines, 0x2000);
        ppu.cpu_write(0x2007, 0x01, &mut lines);
        ppu.cpu_write(0x2007, 0x02, &mut lines);
        assert_eq!(ppu.vram_addr(), 0x2040);
        assert_eq!(ppu.peek_vram(0x2020), 0x02);
    }

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        ppu.cpu_write(0x2000, 0x03, &mut lines);
        ppu.cpu_write(0x2005, 0x7D, &mut lines);
        ppu.cpu_write(0x2005, 0x5E, &mut lines);
        assert_eq!(ppu.fine_x, 0x05);
        // coarse X 15, coarse Y 11, fine Y 6, both nametable bits
        assert_eq!(ppu.t, 0x6D6F);
    }

    #[test]
    fn second_address_write_drives_the_ppu_bus() {
        let mut ppu = ppu_with_chr_ram();
        let mut lines = InterruptLines::new();
        set_addr(&mut ppu, &mut lines, 0x1234);
        assert_eq!(ppu.vram_addr(), 0x1234);
        assert_eq!(ppu.bus().last_addr(), 0x1234);
    }
}

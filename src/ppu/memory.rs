#![doc = r#"
PPU memory access: the PPU bus for pattern and nametable space, the
palette RAM behind the bus's shadow range.

Palette entries are six bits wide; the upper two bits of a palette read come
from the I/O latch (see `registers`).
"#]

use super::Ppu;
use crate::bus::ppu_space::{PpuDevice, map_palette_addr};

impl Ppu {
    /// Read through the PPU bus, recording the access.
    pub(in crate::ppu) fn vram_read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match self.bus.shadow_getter(addr) {
            Some(PpuDevice::Palette) => {
                let value = self.palette_entry(addr);
                self.bus.drive(addr, value);
                value
            }
            None => self.bus.get_byte(addr),
        }
    }

    pub(in crate::ppu) fn vram_write(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        match self.bus.shadow_setter(addr) {
            Some(PpuDevice::Palette) => {
                self.palette[map_palette_addr(addr)] = value & 0x3F;
                self.bus.drive(addr, value);
            }
            None => self.bus.set_byte(addr, value),
        }
    }

    #[inline]
    pub(in crate::ppu) fn palette_entry(&self, addr: u16) -> u8 {
        self.palette[map_palette_addr(addr)]
    }

    /// Side-effect-free view of PPU address space, palette included.
    pub fn peek_vram(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match self.bus.shadow_getter(addr) {
            Some(PpuDevice::Palette) => self.palette_entry(addr),
            None => self.bus.peek(addr),
        }
    }
}

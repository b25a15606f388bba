/*!
Picture processing unit, advanced one dot at a time.

Frame layout (NTSC):
```text
scanline 0-239    visible: pixel output, background fetches, sprite evaluation
scanline 240      idle
scanline 241-260  vertical blank (flag + NMI set at 241/1)
scanline 261      pre-render: same fetches as a visible line, flags cleared at dot 1
```
Each line is 341 dots. On odd frames with rendering enabled, dot 339 of the
pre-render line is skipped.

Per-dot order inside `tick`:
1. background shifters shift and reload
2. pixel output (visible lines, dots 1-256)
3. bus fetches: background tiles, garbage nametable reads, sprite patterns
4. scroll updates (`v` increments and `t -> v` copies)
5. sprite clear / evaluation / fetch
6. vblank and status flag events, then the NMI line

All memory traffic goes through the PPU bus as an address-latch dot followed
by a read dot, so `Bus::last_addr` follows the real address lines.

Submodules:
- `registers`: the CPU-visible $2000-$2007 window and the register flag types
- `memory`: VRAM and palette access through the PPU bus
- `fetch`: background pipeline and the loopy scroll register updates
- `oam_eval`: secondary OAM clear and the per-line evaluation state machine
- `sprite`: sprite pattern fetches and the eight output slots
- `renderer`: pixel composition and the master palette
*/

use std::fmt;

use tracing::trace;

use crate::bus::Bus;
use crate::bus::ppu_space::PpuDevice;
use crate::interrupts::InterruptLines;

pub(crate) mod fetch;
pub(crate) mod memory;
pub(crate) mod oam_eval;
pub(crate) mod registers;
pub(crate) mod renderer;
pub(crate) mod sprite;

pub use registers::{PpuCtrl, PpuMask, PpuStatus};

use fetch::Background;
use oam_eval::SpriteEval;
use sprite::SpriteLine;

pub const NES_WIDTH: usize = 256;
pub const NES_HEIGHT: usize = 240;

pub const DOTS_PER_LINE: u16 = 341;
pub const LINES_PER_FRAME: u16 = 262;
pub const VBLANK_LINE: u16 = 241;
pub const PRE_RENDER_LINE: u16 = 261;

pub struct Ppu {
    bus: Bus<PpuDevice>,

    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    oam_addr: u8,

    // Loopy scroll registers: current and temporary VRAM address, fine X,
    // and the shared $2005/$2006 write toggle.
    v: u16,
    t: u16,
    fine_x: u8,
    w: bool,

    read_buffer: u8,
    // Last value driven on the CPU-facing data lines ($2002 low bits).
    io_latch: u8,

    palette: [u8; 32],
    oam: [u8; 256],
    secondary: [u8; 32],

    bg: Background,
    eval: SpriteEval,
    sprites: SpriteLine,

    sx: u16,
    sy: u16,
    odd_frame: bool,
    frame: u64,
    suppress_vblank: bool,

    frame_buffer: Vec<u32>,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("scanline", &self.sy)
            .field("dot", &self.sx)
            .field("frame", &self.frame)
            .field("ctrl", &self.ctrl)
            .field("mask", &self.mask)
            .field("status", &self.status)
            .field("v", &format_args!("{:#06X}", self.v))
            .field("t", &format_args!("{:#06X}", self.t))
            .finish_non_exhaustive()
    }
}

/// Master palette, RGB per 6-bit colour index.
pub(crate) const NES_PALETTE: [[u8; 3]; 64] = [
    [0x75, 0x75, 0x75],
    [0x27, 0x1B, 0x8F],
    [0x00, 0x00, 0xAB],
    [0x47, 0x00, 0x9F],
    [0x8F, 0x00, 0x77],
    [0xAB, 0x00, 0x13],
    [0xA7, 0x00, 0x00],
    [0x7F, 0x0B, 0x00],
    [0x43, 0x2F, 0x00],
    [0x00, 0x47, 0x00],
    [0x00, 0x51, 0x00],
    [0x00, 0x3F, 0x17],
    [0x1B, 0x3F, 0x5F],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xBC, 0xBC, 0xBC],
    [0x00, 0x73, 0xEF],
    [0x23, 0x3B, 0xEF],
    [0x83, 0x00, 0xF3],
    [0xBF, 0x00, 0xBF],
    [0xE7, 0x00, 0x5B],
    [0xDB, 0x2B, 0x00],
    [0xCB, 0x4F, 0x0F],
    [0x8B, 0x73, 0x00],
    [0x00, 0x97, 0x00],
    [0x00, 0xAB, 0x00],
    [0x00, 0x93, 0x3B],
    [0x00, 0x83, 0x8B],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0x3F, 0xBF, 0xFF],
    [0x5F, 0x97, 0xFF],
    [0xA7, 0x8B, 0xFD],
    [0xF7, 0x7B, 0xFF],
    [0xFF, 0x77, 0xB7],
    [0xFF, 0x77, 0x63],
    [0xFF, 0x9B, 0x3B],
    [0xF3, 0xBF, 0x3F],
    [0x83, 0xD3, 0x13],
    [0x4F, 0xDF, 0x4B],
    [0x58, 0xF8, 0x98],
    [0x00, 0xEB, 0xDB],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0xAB, 0xE7, 0xFF],
    [0xC7, 0xD7, 0xFF],
    [0xD7, 0xCB, 0xFF],
    [0xFF, 0xC7, 0xFF],
    [0xFF, 0xC7, 0xDB],
    [0xFF, 0xBF, 0xB3],
    [0xFF, 0xDB, 0xAB],
    [0xFF, 0xE7, 0xA3],
    [0xE3, 0xFF, 0xA3],
    [0xAB, 0xF3, 0xBF],
    [0xB3, 0xFF, 0xCF],
    [0x9F, 0xFF, 0xF3],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
];

impl Ppu {
    /// Power-on state on a PPU bus whose pattern slots the mapper has wired.
    pub fn new(bus: Bus<PpuDevice>) -> Self {
        Self {
            bus,
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            w: false,
            read_buffer: 0,
            io_latch: 0,
            palette: [0; 32],
            oam: [0; 256],
            secondary: [0xFF; 32],
            bg: Background::default(),
            eval: SpriteEval::default(),
            sprites: SpriteLine::default(),
            sx: 0,
            sy: 0,
            odd_frame: false,
            frame: 0,
            suppress_vblank: false,
            frame_buffer: vec![0xFF00_0000; NES_WIDTH * NES_HEIGHT],
        }
    }

    /// Reset button: control and mask cleared, write toggle and read buffer
    /// reset. OAM, palette and VRAM keep their contents.
    pub fn reset(&mut self, lines: &mut InterruptLines) {
        self.ctrl = PpuCtrl::empty();
        self.mask = PpuMask::empty();
        self.w = false;
        self.t = 0;
        self.fine_x = 0;
        self.read_buffer = 0;
        self.odd_frame = false;
        self.update_nmi(lines);
    }

    pub fn bus(&self) -> &Bus<PpuDevice> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus<PpuDevice> {
        &mut self.bus
    }

    /// ARGB pixels, `y * 256 + x`.
    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }

    /// Completed frames since power-on.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn scanline(&self) -> u16 {
        self.sy
    }

    pub fn dot(&self) -> u16 {
        self.sx
    }

    pub fn ctrl(&self) -> PpuCtrl {
        self.ctrl
    }

    pub fn mask(&self) -> PpuMask {
        self.mask
    }

    pub fn status(&self) -> PpuStatus {
        self.status
    }

    pub fn vram_addr(&self) -> u16 {
        self.v
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    #[inline]
    pub fn rendering_enabled(&self) -> bool {
        self.mask
            .intersects(PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES)
    }

    /// True on the lines where the fetch pipeline runs and rendering is on.
    #[inline]
    fn rendering_active(&self) -> bool {
        (self.sy < NES_HEIGHT as u16 || self.sy == PRE_RENDER_LINE) && self.rendering_enabled()
    }

    /// Advance one dot.
    pub fn tick(&mut self, lines: &mut InterruptLines) {
        let (sy, sx) = (self.sy, self.sx);
        let visible = sy < NES_HEIGHT as u16;

        if self.rendering_active() {
            self.render_dot(sy, sx);
        } else if visible && (1..=256).contains(&sx) {
            self.output_backdrop(sx - 1, sy);
        }

        match (sy, sx) {
            (VBLANK_LINE, 1) => {
                if self.suppress_vblank {
                    trace!(frame = self.frame, "vblank suppressed by $2002 read");
                } else {
                    self.status.insert(PpuStatus::VBLANK);
                }
                self.suppress_vblank = false;
            }
            (PRE_RENDER_LINE, 1) => self.status.remove(
                PpuStatus::VBLANK | PpuStatus::SPRITE_ZERO_HIT | PpuStatus::SPRITE_OVERFLOW,
            ),
            _ => {}
        }

        self.update_nmi(lines);
        self.advance();
    }

    fn render_dot(&mut self, sy: u16, sx: u16) {
        if matches!(sx, 2..=257 | 322..=337) {
            self.bg.shift();
        }
        if matches!(sx, 9..=257 | 329..=337) && (sx - 1) % 8 == 0 {
            self.bg.reload();
        }
        if sy < NES_HEIGHT as u16 && (1..=256).contains(&sx) {
            self.output_pixel(sx - 1, sy);
        }

        match sx {
            1..=256 | 321..=336 => self.fetch_background_phase((sx - 1) % 8),
            337 | 339 => self.bus.latch(self.nametable_addr()),
            338 | 340 => {
                self.bus.get_byte(self.nametable_addr());
            }
            _ => {}
        }

        if sx == 256 {
            self.increment_y();
        }
        if sx == 257 {
            self.copy_x();
        }
        if sy == PRE_RENDER_LINE && (280..=304).contains(&sx) {
            self.copy_y();
        }

        match sx {
            1..=64 => self.clear_secondary_phase(sx),
            65..=256 => self.evaluate_phase(sy, sx),
            257..=320 => {
                self.oam_addr = 0;
                self.fetch_sprite_phase(sy, sx);
            }
            _ => {}
        }
    }

    fn update_nmi(&self, lines: &mut InterruptLines) {
        lines.set_nmi(
            self.status.contains(PpuStatus::VBLANK) && self.ctrl.contains(PpuCtrl::NMI_ENABLE),
        );
    }

    fn advance(&mut self) {
        if self.sy == PRE_RENDER_LINE
            && self.sx == 338
            && self.odd_frame
            && self.rendering_enabled()
        {
            self.sx = 340;
            return;
        }

        self.sx += 1;
        if self.sx == DOTS_PER_LINE {
            self.sx = 0;
            self.sy += 1;
            if self.sy == LINES_PER_FRAME {
                self.sy = 0;
                self.frame += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }
}

#![doc = r#"
Console: the CPU plus the system bus, advanced one slot at a time.

`step()` is the unit of emulated time:

```text
clock_devices      3 PPU dots, 1 mapper tick, 1 APU tick
CPU or DMA         one CPU cycle, or one OAM DMA cycle while a DMA runs
cpu_cycle += 1
```
During DMA the CPU's instruction state machine is frozen, but it still
samples the interrupt lines so an NMI edge raised by the PPU is not lost,
and it re-polls them on the last stalled cycle.

Everything that can fail (image parsing, region and mapper checks, bus
layout) happens in `Console::new`; stepping is infallible.
"#]

use tracing::debug;

use crate::bus::clock::clock_devices;
use crate::bus::system::SystemBus;
use crate::cartridge::CartridgeImage;
use crate::controller::Port;
use crate::cpu::Cpu;
use crate::error::Result;
use crate::ppu::Ppu;

/// Receives the finished frame once per `run_frame`.
pub trait PixelSink {
    /// `frame` is 256x240 opaque ARGB, row-major, indexed `y * 256 + x`.
    fn present(&mut self, frame: &[u32]);
}

impl<F: FnMut(&[u32])> PixelSink for F {
    fn present(&mut self, frame: &[u32]) {
        self(frame)
    }
}

/// What is plugged into the two controller ports.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub input: [Port; 2],
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            input: [Port::controller(), Port::controller()],
        }
    }
}

#[derive(Debug)]
pub struct Console {
    cpu: Cpu,
    system: SystemBus,
}

impl Console {
    /// Power on with `image` inserted. The CPU's reset sequence runs on
    /// the first seven steps.
    pub fn new(image: CartridgeImage, config: ConsoleConfig) -> Result<Self> {
        debug!(
            mapper = image.mapper_id,
            prg = image.prg_rom_len(),
            chr = image.chr_rom_len(),
            "power on"
        );
        let system = SystemBus::new(image, config.input)?;
        Ok(Self {
            cpu: Cpu::new(),
            system,
        })
    }

    /// Parse an iNES image and power on.
    pub fn from_ines_bytes(bytes: &[u8], config: ConsoleConfig) -> Result<Self> {
        Self::new(CartridgeImage::from_ines_bytes(bytes)?, config)
    }

    /// One CPU-cycle slot.
    pub fn step(&mut self) {
        clock_devices(&mut self.system);
        if self.system.dma.is_active() {
            self.system.step_dma();
            let last = !self.system.dma.is_active();
            self.cpu.stall_cycle(&self.system.lines, last);
        } else {
            self.cpu.tick(&mut self.system);
        }
        self.system.cpu_cycle += 1;
    }

    /// Step until the PPU moves to another scanline.
    pub fn step_scanline(&mut self) {
        let line = self.system.ppu.scanline();
        while self.system.ppu.scanline() == line {
            self.step();
        }
    }

    /// Step until the PPU finishes the frame it is in.
    pub fn step_frame(&mut self) {
        let frame = self.system.ppu.frame_count();
        while self.system.ppu.frame_count() == frame {
            self.step();
        }
    }

    /// `step_frame`, then hand the frame buffer to `sink`.
    pub fn run_frame(&mut self, sink: &mut impl PixelSink) {
        self.step_frame();
        sink.present(self.frame());
    }

    /// Reset button. The CPU runs its reset sequence on the next steps.
    pub fn reset(&mut self) {
        debug!(cpu_cycle = self.system.cpu_cycle, "reset");
        self.cpu.reset();
        self.system.reset_devices();
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.system.ppu
    }

    pub fn system(&self) -> &SystemBus {
        &self.system
    }

    pub fn frame(&self) -> &[u32] {
        self.system.ppu.frame_buffer()
    }

    pub fn frame_count(&self) -> u64 {
        self.system.ppu.frame_count()
    }

    /// Slots since power-on, DMA cycles included.
    pub fn cpu_cycles(&self) -> u64 {
        self.system.cpu_cycle
    }

    /// The device in port `port` (0 or 1).
    pub fn input_mut(&mut self, port: usize) -> Option<&mut Port> {
        self.system.ports.get_mut(port)
    }

    /// Side-effect-free read of CPU address space.
    pub fn peek(&self, addr: u16) -> u8 {
        self.system.peek(addr)
    }
}

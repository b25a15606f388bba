/*!
Per-slot device clocking.

One CPU slot is, in order:
1. three PPU dots
2. one mapper tick, sampling the PPU bus address left by the last dot
3. one APU tick
4. the CPU cycle (or a DMA cycle), driven by `Console::step`

Everything that writes the interrupt lines inside a slot does so in this
order, and the CPU samples them after its own cycle.
*/

use crate::bus::system::SystemBus;

pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// Steps 1-3 of a slot.
pub fn clock_devices(system: &mut SystemBus) {
    for _ in 0..PPU_DOTS_PER_CPU_CYCLE {
        system.ppu.tick(&mut system.lines);
    }
    let ppu_addr = system.ppu.bus().last_addr();
    system.mapper.clock(ppu_addr, &mut system.lines);
    system.apu.tick(&mut system.lines);
}

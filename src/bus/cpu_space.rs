/*!
CPU address space layout.

```text
$0000-$1FFF  slot 0  2 KiB work RAM, mirrored x4
$2000-$3FFF  slot 1  unmapped; PPU registers shadow it (mod 8)
$4000-$5FFF  slot 2  unmapped; APU/IO registers shadow $4000-$4017
$6000-$7FFF  slot 3  cartridge PRG RAM (or unmapped)
$8000-$FFFF  slots 4-7  cartridge PRG ROM, 8 KiB each
```

The mapper additionally claims its bank-select window as a shadow setter
when the console is assembled.
*/

use crate::bus::{Bus, Region};
use crate::error::Result;

pub const CPU_SPACE_SIZE: usize = 0x1_0000;
pub const CPU_SLOT_SIZE: usize = 0x2000;
pub const RAM_SIZE: usize = 0x0800;

pub const RAM_SLOT: usize = 0;
pub const PRG_RAM_SLOT: usize = 3;
pub const PRG_ROM_SLOT: usize = 4;
pub const PRG_ROM_SLOTS: usize = 4;

/// Devices that can claim CPU addresses ahead of the slot decode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CpuDevice {
    /// $2000-$2007 and mirrors.
    Ppu,
    /// Frame sequencer / length counters ($4000-$4013, $4015, $4017 writes; $4015 reads).
    Apu,
    /// $4014 write.
    OamDma,
    /// $4016 write: strobe both input ports.
    InputStrobe,
    /// $4016 / $4017 reads.
    InputPort(usize),
    /// Cartridge bank-select registers.
    Mapper,
}

/// Build the console side of the CPU bus: RAM wired, IO shadows registered,
/// cartridge slots left open for the mapper.
pub fn build_cpu_bus() -> Result<Bus<CpuDevice>> {
    let mut bus = Bus::new(CPU_SPACE_SIZE, &[CPU_SLOT_SIZE; 8])?;

    let ram = bus.add_bank(vec![0; RAM_SIZE], true);
    bus.map(RAM_SLOT, Region::Bank(ram))?;

    bus.register_shadow_getter(0x2000..=0x3FFF, CpuDevice::Ppu);
    bus.register_shadow_setter(0x2000..=0x3FFF, CpuDevice::Ppu);

    bus.register_shadow_setter(0x4000..=0x4017, CpuDevice::Apu);
    bus.register_shadow_setter(0x4014..=0x4014, CpuDevice::OamDma);
    bus.register_shadow_setter(0x4016..=0x4016, CpuDevice::InputStrobe);

    bus.register_shadow_getter(0x4015..=0x4015, CpuDevice::Apu);
    bus.register_shadow_getter(0x4016..=0x4016, CpuDevice::InputPort(0));
    bus.register_shadow_getter(0x4017..=0x4017, CpuDevice::InputPort(1));

    Ok(bus)
}

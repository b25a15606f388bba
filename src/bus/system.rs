/*!
SystemBus: every device the CPU can reach, plus the dispatch between them.

Decode order for a CPU access:
1. Ask the CPU bus for a shadow tag (`CpuDevice`) at the address.
2. A tagged access goes to that device; the value is then driven onto the
   bus so open-bus and `last_addr` stay current.
3. Anything untagged decodes through the slots (RAM, PRG RAM, PRG ROM).

Mapper register writes are followed immediately by `Mapper::resolve`, so a
bank switch is visible to the very next access.

The DMA controller lives here as well. While it runs, `step_dma` lends the
whole device set to it as CPU memory and OAM port.
*/

use std::mem;

use crate::apu::Apu;
use crate::bus::Bus;
use crate::bus::cpu_space::{CpuDevice, build_cpu_bus};
use crate::bus::dma::{CpuMemory, DmaController, OamWriter};
use crate::bus::ppu_space::build_ppu_bus;
use crate::cartridge::{CartridgeImage, Region};
use crate::controller::{InputDevice, Port, PortContext};
use crate::cpu::CpuBus;
use crate::error::{NesError, Result};
use crate::interrupts::InterruptLines;
use crate::mapper::{Mapper, MapperContext, Wiring};
use crate::mappers;
use crate::ppu::Ppu;

#[derive(Debug)]
pub struct SystemBus {
    pub(crate) cpu_bus: Bus<CpuDevice>,
    pub(crate) ppu: Ppu,
    pub(crate) mapper: Box<dyn Mapper>,
    pub(crate) apu: Apu,
    pub(crate) ports: [Port; 2],
    pub(crate) dma: DmaController,
    pub(crate) lines: InterruptLines,
    /// CPU slots since power-on.
    pub(crate) cpu_cycle: u64,
}

impl SystemBus {
    /// Build both address spaces, install the cartridge and plug in the
    /// input devices. Only NTSC images are accepted.
    pub fn new(image: CartridgeImage, ports: [Port; 2]) -> Result<Self> {
        if image.region != Region::Ntsc {
            return Err(NesError::UnsupportedRegion(image.region));
        }

        let mut cpu_bus = build_cpu_bus()?;
        let (mut ppu_bus, nametables) = build_ppu_bus(image.four_screen)?;
        let mapper = mappers::create(
            image,
            &mut Wiring {
                cpu: &mut cpu_bus,
                ppu: &mut ppu_bus,
            },
            nametables,
        )?;

        Ok(Self {
            cpu_bus,
            ppu: Ppu::new(ppu_bus),
            mapper,
            apu: Apu::new(),
            ports,
            dma: DmaController::new(),
            lines: InterruptLines::new(),
            cpu_cycle: 0,
        })
    }

    /// Debugger view of CPU space: no side effects, no bus recording.
    pub fn peek(&self, addr: u16) -> u8 {
        match self.cpu_bus.shadow_getter(addr) {
            Some(CpuDevice::Ppu) => self.ppu.peek_register(addr),
            Some(CpuDevice::Apu) => self.apu.peek_status(),
            Some(_) => self.cpu_bus.open_bus(),
            None => self.cpu_bus.peek(addr),
        }
    }

    pub fn cpu_bus(&self) -> &Bus<CpuDevice> {
        &self.cpu_bus
    }

    /// One cycle of an active OAM DMA. Returns false when no DMA is running.
    pub fn step_dma(&mut self) -> bool {
        let mut dma = mem::take(&mut self.dma);
        let stalled = dma.step_one_cycle(self);
        self.dma = dma;
        stalled
    }

    fn rewire(&mut self) {
        self.mapper.resolve(&mut Wiring {
            cpu: &mut self.cpu_bus,
            ppu: self.ppu.bus_mut(),
        });
    }

    /// Reset button as seen by the devices (the CPU resets itself).
    pub(crate) fn reset_devices(&mut self) {
        self.mapper.reset(&mut self.lines);
        self.rewire();
        self.apu.reset(&mut self.lines);
        self.ppu.reset(&mut self.lines);
        self.dma.reset();
    }
}

impl CpuBus for SystemBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match self.cpu_bus.shadow_getter(addr) {
            None => return self.cpu_bus.get_byte(addr),
            Some(CpuDevice::Ppu) => self.ppu.cpu_read(addr, &mut self.lines),
            Some(CpuDevice::Apu) => {
                // Bit 5 of $4015 is not driven.
                (self.apu.read_status(&mut self.lines) & !0x20) | (self.cpu_bus.open_bus() & 0x20)
            }
            Some(CpuDevice::InputPort(port)) => {
                let ctx = PortContext {
                    frame: self.ppu.frame_buffer(),
                    scanline: self.ppu.scanline(),
                    dot: self.ppu.dot(),
                };
                self.ports[port].read_port(&ctx, self.cpu_bus.open_bus())
            }
            Some(CpuDevice::OamDma | CpuDevice::InputStrobe | CpuDevice::Mapper) => {
                self.cpu_bus.open_bus()
            }
        };
        self.cpu_bus.drive(addr, value);
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        match self.cpu_bus.shadow_setter(addr) {
            None => {
                self.cpu_bus.set_byte(addr, value);
                return;
            }
            Some(CpuDevice::Ppu) => self.ppu.cpu_write(addr, value, &mut self.lines),
            Some(CpuDevice::Apu) => self.apu.write(addr, value, &mut self.lines),
            Some(CpuDevice::OamDma) => self.dma.start(value, self.cpu_cycle),
            Some(CpuDevice::InputStrobe) => {
                for port in &mut self.ports {
                    port.strobe(value & 0x01 != 0);
                }
            }
            Some(CpuDevice::Mapper) => {
                let mut ctx = MapperContext {
                    lines: &mut self.lines,
                    cpu_cycle: self.cpu_cycle,
                };
                self.mapper.write(addr, value, &mut ctx);
                self.rewire();
            }
            Some(CpuDevice::InputPort(_)) => {}
        }
        self.cpu_bus.drive(addr, value);
    }

    fn peek(&self, addr: u16) -> u8 {
        SystemBus::peek(self, addr)
    }

    fn lines(&self) -> &InterruptLines {
        &self.lines
    }
}

impl CpuMemory for SystemBus {
    fn cpu_read(&mut self, addr: u16) -> u8 {
        CpuBus::read(self, addr)
    }
}

impl OamWriter for SystemBus {
    fn write_oam_data(&mut self, value: u8) {
        self.ppu.write_oam_data(value);
    }
}

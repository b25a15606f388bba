#![doc = r#"
cyclenes: a cycle-stepped NES core.

The unit of time is one CPU cycle. Each `Console::step` clocks three PPU
dots, the cartridge mapper and the APU, then either one CPU bus cycle or
one OAM DMA cycle. Interrupt lines are sampled per cycle, so NMI/IRQ
timing, the branch polling delay and DMA parity fall out of the schedule.

Modules:
- apu: register file, frame counter and frame IRQ
- bus: slot arena for CPU/PPU address spaces, the system bus and the device clock
- cartridge: iNES v1 image parsing
- console: power on, stepping and frame delivery
- controller: standard pad and light gun on the two input ports
- cpu: 6502 state machine, one bus access per `tick`
- error: crate error type
- interrupts: shared NMI/IRQ lines
- mapper / mappers: the `Mapper` trait and boards 0, 1, 2, 3, 4, 7, 66
- ppu: dot-stepped renderer, registers and OAM evaluation

In tests, shared iNES builders and a flat CPU bus live under `crate::test_utils`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod console;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod interrupts;
pub mod mapper;
pub mod mappers;
pub mod ppu;

pub use console::{Console, ConsoleConfig, PixelSink};
pub use error::{NesError, Result};

#[cfg(test)]
pub mod test_utils;

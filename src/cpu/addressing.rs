/*!
addressing.rs - Per-cycle addressing templates shared by every memory opcode.

`address_cycle` runs once per CPU cycle until the effective address is
known. Cycles that touch the bus return `false`; the first cycle with a final
address returns `true` without touching the bus, and the data cycle (read,
write or the RMW sequence) runs in that same cycle.

```text
mode        cycles before data   bus activity
#imm        0                    (operand is the byte at PC)
zp          1                    fetch address
zp,X zp,Y   2                    fetch, dummy read of unindexed address
abs         2                    fetch low, fetch high
abs,X/Y     2 (+1)               fetch low, fetch high(+index low), [read wrapped]
(zp,X)      4                    fetch, dummy read, pointer low, pointer high
(zp),Y      3 (+1)               fetch, pointer low, pointer high(+index low), [read wrapped]
```

The bracketed read goes to the base high byte with the indexed low byte. Read
instructions only take it when the index carried out of the low byte; writes
and read-modify-writes always take it, then correct the high byte.
*/

use crate::cpu::table::{Kind, Mode};
use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    /// Read the byte at PC and advance PC.
    pub(super) fn fetch_operand<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.state.pc);
        self.state.pc = self.state.pc.wrapping_add(1);
        value
    }

    pub(super) fn dummy_read<B: CpuBus>(&mut self, bus: &mut B, addr: u16) {
        let _ = bus.read(addr);
    }

    /// One cycle of the addressing template for `self.op.mode`.
    /// Returns true once `self.addr` is final and this cycle is still free.
    pub(super) fn address_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        let x = self.state.x;
        let y = self.state.y;
        match (self.op.mode, self.t) {
            (Mode::Immediate, _) => {
                self.addr = self.state.pc;
                self.state.pc = self.state.pc.wrapping_add(1);
                true
            }

            (Mode::ZeroPage, 1) => {
                self.addr = u16::from(self.fetch_operand(bus));
                false
            }

            (Mode::ZeroPageX | Mode::ZeroPageY, 1) => {
                self.addr = u16::from(self.fetch_operand(bus));
                false
            }
            (Mode::ZeroPageX | Mode::ZeroPageY, 2) => {
                self.dummy_read(bus, self.addr);
                let index = if self.op.mode == Mode::ZeroPageX { x } else { y };
                self.addr = u16::from((self.addr as u8).wrapping_add(index));
                false
            }

            (Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY, 1) => {
                self.addr = u16::from(self.fetch_operand(bus));
                false
            }
            (Mode::Absolute, 2) => {
                self.addr |= u16::from(self.fetch_operand(bus)) << 8;
                false
            }
            (Mode::AbsoluteX | Mode::AbsoluteY, 2) => {
                self.addr |= u16::from(self.fetch_operand(bus)) << 8;
                let index = if self.op.mode == Mode::AbsoluteX { x } else { y };
                self.index_low(index);
                false
            }
            (Mode::AbsoluteX | Mode::AbsoluteY, 3) => self.fixup_cycle(bus),

            (Mode::IndirectX, 1) => {
                self.pointer = self.fetch_operand(bus);
                false
            }
            (Mode::IndirectX, 2) => {
                self.dummy_read(bus, u16::from(self.pointer));
                self.pointer = self.pointer.wrapping_add(x);
                false
            }
            (Mode::IndirectX, 3) => {
                self.addr = u16::from(bus.read(u16::from(self.pointer)));
                false
            }
            (Mode::IndirectX, 4) => {
                let high = bus.read(u16::from(self.pointer.wrapping_add(1)));
                self.addr |= u16::from(high) << 8;
                false
            }

            (Mode::IndirectY, 1) => {
                self.pointer = self.fetch_operand(bus);
                false
            }
            (Mode::IndirectY, 2) => {
                self.addr = u16::from(bus.read(u16::from(self.pointer)));
                false
            }
            (Mode::IndirectY, 3) => {
                let high = bus.read(u16::from(self.pointer.wrapping_add(1)));
                self.addr |= u16::from(high) << 8;
                self.index_low(y);
                false
            }
            (Mode::IndirectY, 4) => self.fixup_cycle(bus),

            _ => true,
        }
    }

    /// Add `index` to the low byte only, remembering the carry and the
    /// original high byte.
    fn index_low(&mut self, index: u8) {
        let (low, carry) = (self.addr as u8).overflowing_add(index);
        self.base_high = (self.addr >> 8) as u8;
        self.addr = (self.addr & 0xFF00) | u16::from(low);
        self.page_crossed = carry;
    }

    fn fixup_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        if !self.page_crossed && self.op.kind() == Kind::Read {
            return true;
        }
        self.dummy_read(bus, self.addr);
        if self.page_crossed {
            self.addr = self.addr.wrapping_add(0x0100);
        }
        false
    }
}

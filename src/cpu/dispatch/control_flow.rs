/*!
control_flow.rs - JMP, JSR, RTS, RTI and the shared BRK/interrupt/reset
sequence.

The seven-cycle entry sequence is the same microcode for all four causes:

```text
t0  opcode fetch (BRK) or dummy read at PC (NMI, IRQ, reset)
t1  read at PC; only BRK advances PC past its padding byte
t2  push PCH          (reset: read at S instead)
t3  push PCL          (reset: read)
t4  push P            (reset: read); pick the vector
t5  read vector low, set I
t6  read vector high
```
The vector is chosen on t4: reset uses $FFFC, a latched NMI wins $FFFA
(and is consumed), anything else uses $FFFE. A BRK or IRQ whose sequence
is still before t4 when an NMI edge arrives therefore jumps through the NMI
vector, and the pushed B bit still tells a BRK apart.
*/

use tracing::{debug, trace};

use crate::cpu::{Cpu, CpuBus, Entry};
use crate::cpu::state::Status;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

impl Cpu {
    pub(super) fn jmp_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        if self.t == 1 {
            self.data = self.fetch_operand(bus);
            return false;
        }
        let high = bus.read(self.state.pc);
        self.state.pc = u16::from_le_bytes([self.data, high]);
        true
    }

    /// The pointer's high byte is read without carrying into the page:
    /// `JMP ($10FF)` takes its high byte from $1000.
    pub(super) fn jmp_indirect_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                self.addr = u16::from(self.fetch_operand(bus));
                false
            }
            2 => {
                self.addr |= u16::from(self.fetch_operand(bus)) << 8;
                false
            }
            3 => {
                self.data = bus.read(self.addr);
                false
            }
            _ => {
                let high_addr = (self.addr & 0xFF00) | u16::from((self.addr as u8).wrapping_add(1));
                let high = bus.read(high_addr);
                self.state.pc = u16::from_le_bytes([self.data, high]);
                true
            }
        }
    }

    pub(super) fn jsr_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                self.data = self.fetch_operand(bus);
                false
            }
            2 => {
                let _ = self.read_stack(bus);
                false
            }
            3 => {
                let [_, high] = self.state.pc.to_le_bytes();
                self.push(bus, high);
                false
            }
            4 => {
                let [low, _] = self.state.pc.to_le_bytes();
                self.push(bus, low);
                false
            }
            _ => {
                let high = bus.read(self.state.pc);
                self.state.pc = u16::from_le_bytes([self.data, high]);
                true
            }
        }
    }

    pub(super) fn rts_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                self.dummy_read(bus, self.state.pc);
                false
            }
            2 => {
                self.stack_dummy_read_and_increment(bus);
                false
            }
            3 => {
                self.data = self.read_stack(bus);
                self.state.s = self.state.s.wrapping_add(1);
                false
            }
            4 => {
                let high = self.read_stack(bus);
                self.state.pc = u16::from_le_bytes([self.data, high]);
                false
            }
            _ => {
                let _ = self.fetch_operand(bus);
                true
            }
        }
    }

    pub(super) fn rti_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                self.dummy_read(bus, self.state.pc);
                false
            }
            2 => {
                self.stack_dummy_read_and_increment(bus);
                false
            }
            3 => {
                let p = self.read_stack(bus);
                self.state.restore_status(p);
                self.state.s = self.state.s.wrapping_add(1);
                false
            }
            4 => {
                self.data = self.read_stack(bus);
                self.state.s = self.state.s.wrapping_add(1);
                false
            }
            _ => {
                let high = self.read_stack(bus);
                self.state.pc = u16::from_le_bytes([self.data, high]);
                true
            }
        }
    }

    pub(super) fn brk_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                if self.entry == Entry::Brk {
                    let _ = self.fetch_operand(bus);
                } else {
                    self.dummy_read(bus, self.state.pc);
                }
                false
            }
            2 => {
                let [_, high] = self.state.pc.to_le_bytes();
                self.push_or_read(bus, high);
                false
            }
            3 => {
                let [low, _] = self.state.pc.to_le_bytes();
                self.push_or_read(bus, low);
                false
            }
            4 => {
                let p = self.state.status_for_push(self.entry == Entry::Brk);
                self.push_or_read(bus, p);
                self.addr = if self.entry == Entry::Reset {
                    RESET_VECTOR
                } else if self.nmi_latched {
                    self.nmi_latched = false;
                    NMI_VECTOR
                } else {
                    IRQ_VECTOR
                };
                false
            }
            5 => {
                self.data = bus.read(self.addr);
                self.state.set_flag(Status::IRQ_DISABLE, true);
                false
            }
            _ => {
                let high = bus.read(self.addr.wrapping_add(1));
                self.state.pc = u16::from_le_bytes([self.data, high]);
                match self.entry {
                    Entry::Reset => debug!(pc = format_args!("{:#06X}", self.state.pc), "CPU reset"),
                    _ => trace!(
                        vector = format_args!("{:#06X}", self.addr),
                        entry = ?self.entry,
                        "interrupt entry"
                    ),
                }
                true
            }
        }
    }

    /// Stack write for BRK/NMI/IRQ; the reset sequence reads instead but
    /// still moves S.
    fn push_or_read<B: CpuBus>(&mut self, bus: &mut B, value: u8) {
        if self.entry == Entry::Reset {
            let _ = self.read_stack(bus);
            self.state.s = self.state.s.wrapping_sub(1);
        } else {
            self.push(bus, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::{Cpu, Status};
    use crate::test_utils::{Access, FlatBus};

    #[test]
    fn power_on_reset_reads_the_stack_and_lands_on_fd() {
        let mut bus = FlatBus::with_program(&[0xEA]);
        let mut cpu = Cpu::new();
        assert_eq!(cpu.run_instructions(&mut bus, 1), 7);
        assert_eq!(cpu.state().pc, 0x8000);
        assert_eq!(cpu.state().s, 0xFD);
        assert!(cpu.state().p.contains(Status::IRQ_DISABLE));
        assert!(bus.log.iter().all(|a| matches!(a, Access::Read(_))));
        assert_eq!(bus.log[2..5], [Access::Read(0x0100), Access::Read(0x01FF), Access::Read(0x01FE)]);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR $8010 ... $8010: RTS
        let mut program = vec![0x20, 0x10, 0x80, 0xEA];
        program.resize(0x10, 0xEA);
        program.push(0x60);
        let (mut cpu, mut bus) = FlatBus::boot(&program);
        assert_eq!(cpu.run_instructions(&mut bus, 1), 6);
        assert_eq!(cpu.state().pc, 0x8010);
        assert_eq!((bus.mem[0x01FD], bus.mem[0x01FC]), (0x80, 0x02), "return address - 1");
        assert_eq!(cpu.run_instructions(&mut bus, 1), 6);
        assert_eq!(cpu.state().pc, 0x8003);
    }

    #[test]
    fn jmp_indirect_does_not_carry_into_the_page() {
        let (mut cpu, mut bus) = FlatBus::boot(&[0x6C, 0xFF, 0x10]);
        bus.mem[0x10FF] = 0x34;
        bus.mem[0x1000] = 0x12;
        bus.mem[0x1100] = 0x56;
        assert_eq!(cpu.run_instructions(&mut bus, 1), 5);
        assert_eq!(cpu.state().pc, 0x1234);
    }

    #[test]
    fn brk_pushes_break_and_skips_padding() {
        let (mut cpu, mut bus) = FlatBus::boot(&[0x00, 0xFF]);
        assert_eq!(cpu.run_instructions(&mut bus, 1), 7);
        assert_eq!(cpu.state().pc, FlatBus::IRQ_TARGET);
        assert_eq!((bus.mem[0x01FD], bus.mem[0x01FC]), (0x80, 0x02));
        assert_eq!(bus.mem[0x01FB] & 0x30, 0x30);
    }

    #[test]
    fn rti_restores_status_and_pc() {
        // BRK; handler: RTI
        let (mut cpu, mut bus) = FlatBus::boot(&[0x38, 0x00, 0xFF, 0xEA]);
        bus.mem[usize::from(FlatBus::IRQ_TARGET)] = 0x40;
        cpu.run_instructions(&mut bus, 2);
        assert_eq!(cpu.run_instructions(&mut bus, 1), 6);
        assert_eq!(cpu.state().pc, 0x8003);
        assert!(cpu.state().p.contains(Status::CARRY));
    }
}

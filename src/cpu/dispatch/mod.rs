/*!
dispatch - Runs cycle `t >= 1` of the current instruction.

The opcode fetch (cycle 0) happens in `Cpu::tick`; every later cycle lands
here and is routed by the opcode's cycle template (`table::Kind`):

```text
Read / Write / Rmw        addressing template, then load_store / rmw data cycles
Implied / Push / Pull     misc
Branch                    branches
Jmp / Jsr / Rts / Rti     control_flow
Brk (and NMI/IRQ/reset)   control_flow
Jam                       misc
```
Each handler performs exactly one bus access per call and returns true on
the instruction's final cycle.
*/

pub(crate) mod branches;
pub(crate) mod control_flow;
pub(crate) mod load_store;
pub(crate) mod misc;
pub(crate) mod rmw;

use crate::cpu::table::Kind;
use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    pub(super) fn execute_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.op.kind() {
            Kind::Read | Kind::Write | Kind::Rmw => self.memory_cycle(bus),
            Kind::Implied => self.implied_cycle(bus),
            Kind::Push => self.push_cycle(bus),
            Kind::Pull => self.pull_cycle(bus),
            Kind::Branch => self.branch_cycle(bus),
            Kind::Jmp => self.jmp_cycle(bus),
            Kind::JmpIndirect => self.jmp_indirect_cycle(bus),
            Kind::Jsr => self.jsr_cycle(bus),
            Kind::Rts => self.rts_cycle(bus),
            Kind::Rti => self.rti_cycle(bus),
            Kind::Brk => self.brk_cycle(bus),
            Kind::Jam => self.jam_cycle(bus),
        }
    }

    fn memory_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        let step = match self.data_step {
            Some(step) => step,
            None => {
                if !self.address_cycle(bus) {
                    return false;
                }
                0
            }
        };
        let done = match self.op.kind() {
            Kind::Read => self.read_cycle(bus),
            Kind::Write => self.write_cycle(bus),
            _ => self.rmw_cycle(bus, step),
        };
        self.data_step = if done { None } else { Some(step + 1) };
        done
    }

    /// Write at the stack pointer, then decrement it (wraps inside page $01).
    pub(super) fn push<B: CpuBus>(&mut self, bus: &mut B, value: u8) {
        bus.write(self.state.stack_addr(), value);
        self.state.s = self.state.s.wrapping_sub(1);
    }

    /// The "increment S" half of a pull: a dummy read at the old S.
    pub(super) fn stack_dummy_read_and_increment<B: CpuBus>(&mut self, bus: &mut B) {
        let _ = bus.read(self.state.stack_addr());
        self.state.s = self.state.s.wrapping_add(1);
    }

    pub(super) fn read_stack<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        bus.read(self.state.stack_addr())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{Access, FlatBus};

    /// Cycles per opcode with no page crossed and branches taken on a
    /// clear P (BPL, BVC, BCC, BNE). 0 marks the jam opcodes.
    #[rustfmt::skip]
    const CYCLES: [u8; 256] = [
        7, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6,
        3, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
        6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6,
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
        6, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6,
        3, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
        6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6,
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
        2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
        3, 6, 0, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5,
        2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
        2, 5, 0, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4,
        2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
        3, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
        2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    ];

    /// Run one instruction at $8000 with the given index registers. Operand
    /// bytes are $10 $20, and zero page is NOP-filled, so (zp),Y bases are
    /// $EAEA. Returns the cycle count and whether the CPU jammed.
    fn run_one(opcode: u8, index: u8) -> (u8, bool) {
        let (mut cpu, mut bus) = FlatBus::boot(&[opcode, 0x10, 0x20, 0xEA]);
        cpu.state_mut().x = index;
        cpu.state_mut().y = index;
        let mut cycles = 0;
        loop {
            cpu.tick(&mut bus);
            cycles += 1;
            if cpu.at_instruction_boundary() || cpu.is_jammed() || cycles > 8 {
                return (cycles, cpu.is_jammed());
            }
        }
    }

    #[test]
    fn every_opcode_takes_its_documented_cycles() {
        for opcode in 0..=255u8 {
            let expected = CYCLES[usize::from(opcode)];
            let (cycles, jammed) = run_one(opcode, 0);
            if expected == 0 {
                assert!(jammed, "opcode {opcode:#04X} should jam");
            } else {
                assert!(!jammed, "opcode {opcode:#04X} jammed");
                assert_eq!(cycles, expected, "opcode {opcode:#04X}");
            }
        }
    }

    #[test]
    fn page_cross_costs_reads_one_cycle_and_nothing_else() {
        // X = Y = $FF: $2010 + $FF and $EAEA + $FF both cross.
        let cases = [
            (0xBD, 5), // LDA abs,X
            (0xB9, 5), // LDA abs,Y
            (0xB1, 6), // LDA (zp),Y
            (0xBE, 5), // LDX abs,Y
            (0xBF, 5), // LAX abs,Y
            (0xBB, 5), // LAS abs,Y
            (0x1C, 5), // NOP abs,X
            (0x9D, 5), // STA abs,X
            (0x99, 5), // STA abs,Y
            (0x91, 6), // STA (zp),Y
            (0xFE, 7), // INC abs,X
            (0x1E, 7), // ASL abs,X
            (0xDB, 7), // DCP abs,Y
            (0xB5, 4), // LDA zp,X wraps in page zero
        ];
        for (opcode, expected) in cases {
            let (cycles, jammed) = run_one(opcode, 0xFF);
            assert!(!jammed);
            assert_eq!(cycles, expected, "opcode {opcode:#04X} with a page cross");
        }
    }

    #[test]
    fn stack_push_wraps_within_page_one() {
        // TXS with X = 0; PHA; PHA
        let (mut cpu, mut bus) = FlatBus::boot(&[0xA2, 0x00, 0x9A, 0xA9, 0x42, 0x48, 0x48]);
        cpu.run_instructions(&mut bus, 3);
        bus.log.clear();
        cpu.run_instructions(&mut bus, 1);
        assert_eq!(bus.log[2], Access::Write(0x0100, 0x42));
        assert_eq!(cpu.state().s, 0xFF);
        bus.log.clear();
        cpu.run_instructions(&mut bus, 1);
        assert_eq!(bus.log[2], Access::Write(0x01FF, 0x42));
    }
}

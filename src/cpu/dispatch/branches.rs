/*!
branches.rs - Relative branches (BPL/BMI/BVC/BVS/BCC/BCS/BNE/BEQ).

```text
t1  fetch offset; not taken -> done (2 cycles)
t2  dummy read at PC, add offset to PCL; same page -> done (3 cycles)
t3  dummy read at the unfixed address, fix PCH (4 cycles)
```

A taken branch does not poll interrupts at the end of t1, so a branch that
stays on its page only sees interrupts polled during its opcode fetch. An
interrupt that arrives later waits until after the next instruction.
*/

use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    pub(super) fn branch_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                self.data = self.fetch_operand(bus);
                if !self.state.branch_taken(self.op.mnemonic) {
                    return true;
                }
                self.poll_enabled = false;
                false
            }
            2 => {
                self.dummy_read(bus, self.state.pc);
                let pc = self.state.pc;
                let target = pc.wrapping_add_signed(i16::from(self.data as i8));
                if target & 0xFF00 == pc & 0xFF00 {
                    self.state.pc = target;
                    return true;
                }
                self.state.pc = (pc & 0xFF00) | (target & 0x00FF);
                self.addr = target;
                false
            }
            _ => {
                self.dummy_read(bus, self.state.pc);
                self.state.pc = self.addr;
                true
            }
        }
    }
}

//! Data cycles of read-modify-write instructions: read, write the original
//! value back, write the modified value.

use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    pub(super) fn rmw_cycle<B: CpuBus>(&mut self, bus: &mut B, step: u8) -> bool {
        match step {
            0 => {
                self.data = bus.read(self.addr);
                false
            }
            1 => {
                bus.write(self.addr, self.data);
                false
            }
            _ => {
                let value = self.state.modify(self.op.mnemonic, self.data);
                bus.write(self.addr, value);
                true
            }
        }
    }
}

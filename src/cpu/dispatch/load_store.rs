/*!
load_store.rs - Data cycle of read- and write-class instructions.

Both take exactly one cycle once the addressing template has produced the
effective address. The SHx/TAS stores combine a register with the base high
byte plus one; when the index carried into the high byte, the stored value
also replaces the high byte of the address actually written.
*/

use crate::cpu::table::Mnemonic;
use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    pub(super) fn read_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        let value = bus.read(self.addr);
        self.state.read_op(self.op.mnemonic, value);
        true
    }

    pub(super) fn write_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        let value = self.state.write_value(self.op.mnemonic, self.base_high);
        let unstable = matches!(
            self.op.mnemonic,
            Mnemonic::Sha | Mnemonic::Shx | Mnemonic::Shy | Mnemonic::Tas
        );
        if unstable && self.page_crossed {
            self.addr = (u16::from(value) << 8) | (self.addr & 0x00FF);
        }
        bus.write(self.addr, value);
        true
    }
}

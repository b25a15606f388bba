/*!
misc.rs - Register-only, stack and jam templates.

```text
Implied   t1  dummy read at PC, apply
Push      t1  dummy read at PC        t2  write at S, S -= 1
Pull      t1  dummy read at PC        t2  dummy read at S, S += 1   t3  read at S
Jam       every cycle reads $FFFF until reset
```
*/

use tracing::warn;

use crate::cpu::table::Mnemonic;
use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    pub(super) fn implied_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        self.dummy_read(bus, self.state.pc);
        self.state.implied_op(self.op.mnemonic);
        true
    }

    pub(super) fn push_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        if self.t == 1 {
            self.dummy_read(bus, self.state.pc);
            return false;
        }
        let value = match self.op.mnemonic {
            Mnemonic::Php => self.state.status_for_push(true),
            _ => self.state.a,
        };
        self.push(bus, value);
        true
    }

    pub(super) fn pull_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        match self.t {
            1 => {
                self.dummy_read(bus, self.state.pc);
                false
            }
            2 => {
                self.stack_dummy_read_and_increment(bus);
                false
            }
            _ => {
                let value = self.read_stack(bus);
                if self.op.mnemonic == Mnemonic::Plp {
                    self.state.restore_status(value);
                } else {
                    self.state.a = value;
                    self.state.update_zn(value);
                }
                true
            }
        }
    }

    pub(super) fn jam_cycle<B: CpuBus>(&mut self, bus: &mut B) -> bool {
        self.dummy_read(bus, 0xFFFF);
        self.jammed = true;
        warn!(
            pc = format_args!("{:#06X}", self.state.pc.wrapping_sub(1)),
            "CPU jammed"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::Status;
    use crate::test_utils::{Access, FlatBus};

    #[test]
    fn implied_ops_dummy_read_the_next_byte() {
        // INX
        let (mut cpu, mut bus) = FlatBus::boot(&[0xE8, 0xEA]);
        assert_eq!(cpu.run_instructions(&mut bus, 1), 2);
        assert_eq!(bus.log, [Access::Read(0x8000), Access::Read(0x8001)]);
        assert_eq!(cpu.state().x, 1);
        assert_eq!(cpu.state().pc, 0x8001);
    }

    #[test]
    fn php_plp_round_trip_drops_break() {
        // SEC; PHP; CLC; PLP
        let (mut cpu, mut bus) = FlatBus::boot(&[0x38, 0x08, 0x18, 0x28]);
        cpu.run_instructions(&mut bus, 1);
        assert_eq!(cpu.run_instructions(&mut bus, 1), 3);
        assert_eq!(bus.mem[0x01FD], 0x35, "C, I, B and bit 5");
        cpu.run_instructions(&mut bus, 1);
        assert_eq!(cpu.run_instructions(&mut bus, 1), 4);
        assert!(cpu.state().p.contains(Status::CARRY));
        assert!(!cpu.state().p.contains(Status::BREAK));
        assert_eq!(cpu.state().s, 0xFD);
    }

    #[test]
    fn pla_sets_zero_and_negative() {
        // LDA #$00; PHA; LDA #$01; PLA
        let (mut cpu, mut bus) = FlatBus::boot(&[0xA9, 0x00, 0x48, 0xA9, 0x01, 0x68]);
        cpu.run_instructions(&mut bus, 4);
        assert_eq!(cpu.state().a, 0);
        assert!(cpu.state().p.contains(Status::ZERO));
    }

    #[test]
    fn jam_reads_ffff_until_reset() {
        let (mut cpu, mut bus) = FlatBus::boot(&[0x02, 0xEA]);
        for _ in 0..10 {
            cpu.tick(&mut bus);
        }
        assert!(cpu.is_jammed());
        assert!(bus.log[1..].iter().all(|a| *a == Access::Read(0xFFFF)));

        cpu.reset();
        cpu.run_instructions(&mut bus, 1);
        assert!(!cpu.is_jammed());
        assert_eq!(cpu.state().pc, 0x8000);
    }
}

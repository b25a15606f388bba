/*!
execute.rs - Instruction semantics, independent of timing.

The dispatcher decides *when* a value is read or written; the helpers here
decide what the registers and flags become. They are grouped the way the
cycle templates consume them:

- `read_op`      operand arrives on the final read cycle
- `write_value`  value for the final write cycle
- `modify`       the new value of a read-modify-write, plus its combined
                 side effect for the unofficial RMW+ALU opcodes
- `implied_op`   register-only two-cycle instructions

Decimal mode is stored but ignored: the NES ALU always adds in binary.
*/

use crate::cpu::state::{CpuState, Status};
use crate::cpu::table::Mnemonic;

impl CpuState {
    pub(crate) fn adc(&mut self, value: u8) {
        let sum = u16::from(self.a) + u16::from(value) + u16::from(self.carry_in());
        let result = sum as u8;
        self.set_flag(Status::CARRY, sum > 0xFF);
        self.set_flag(
            Status::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0,
        );
        self.a = result;
        self.update_zn(result);
    }

    #[inline]
    pub(crate) fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    pub(crate) fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(Status::CARRY, register >= value);
        self.update_zn(register.wrapping_sub(value));
    }

    pub(crate) fn bit(&mut self, value: u8) {
        self.set_flag(Status::ZERO, self.a & value == 0);
        self.set_flag(Status::NEGATIVE, value & 0x80 != 0);
        self.set_flag(Status::OVERFLOW, value & 0x40 != 0);
    }

    pub(crate) fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(Status::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zn(result);
        result
    }

    pub(crate) fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(Status::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zn(result);
        result
    }

    pub(crate) fn rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.carry_in();
        self.set_flag(Status::CARRY, value & 0x80 != 0);
        self.update_zn(result);
        result
    }

    pub(crate) fn ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | (self.carry_in() << 7);
        self.set_flag(Status::CARRY, value & 0x01 != 0);
        self.update_zn(result);
        result
    }

    fn load_a(&mut self, value: u8) {
        self.a = value;
        self.update_zn(value);
    }

    fn load_x(&mut self, value: u8) {
        self.x = value;
        self.update_zn(value);
    }

    fn load_y(&mut self, value: u8) {
        self.y = value;
        self.update_zn(value);
    }

    /// Final-cycle effect of a read-class instruction.
    pub(crate) fn read_op(&mut self, mnemonic: Mnemonic, value: u8) {
        use Mnemonic::*;
        match mnemonic {
            Lda => self.load_a(value),
            Ldx => self.load_x(value),
            Ldy => self.load_y(value),
            And => self.load_a(self.a & value),
            Ora => self.load_a(self.a | value),
            Eor => self.load_a(self.a ^ value),
            Adc => self.adc(value),
            Sbc => self.sbc(value),
            Cmp => self.compare(self.a, value),
            Cpx => self.compare(self.x, value),
            Cpy => self.compare(self.y, value),
            Bit => self.bit(value),
            Lax => {
                self.x = value;
                self.load_a(value);
            }
            Anc => {
                self.load_a(self.a & value);
                self.set_flag(Status::CARRY, self.a & 0x80 != 0);
            }
            Alr => {
                let anded = self.a & value;
                self.a = self.lsr(anded);
            }
            Arr => {
                let anded = self.a & value;
                let result = (anded >> 1) | (self.carry_in() << 7);
                self.load_a(result);
                self.set_flag(Status::CARRY, result & 0x40 != 0);
                self.set_flag(Status::OVERFLOW, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
            }
            Axs => {
                let ax = self.a & self.x;
                self.set_flag(Status::CARRY, ax >= value);
                self.load_x(ax.wrapping_sub(value));
            }
            Xaa => self.load_a((self.a | 0xEE) & self.x & value),
            Las => {
                let result = value & self.s;
                self.s = result;
                self.x = result;
                self.load_a(result);
            }
            // Unofficial NOPs still perform their read.
            _ => {}
        }
    }

    /// Value stored by a write-class instruction. `high` is the high byte
    /// of the base address before indexing, used by the SHx/TAS family.
    pub(crate) fn write_value(&mut self, mnemonic: Mnemonic, high: u8) -> u8 {
        use Mnemonic::*;
        let h1 = high.wrapping_add(1);
        match mnemonic {
            Sta => self.a,
            Stx => self.x,
            Sty => self.y,
            Sax => self.a & self.x,
            Sha => self.a & self.x & h1,
            Shx => self.x & h1,
            Shy => self.y & h1,
            Tas => {
                self.s = self.a & self.x;
                self.s & h1
            }
            _ => 0,
        }
    }

    /// New value written on the last cycle of a read-modify-write.
    pub(crate) fn modify(&mut self, mnemonic: Mnemonic, value: u8) -> u8 {
        use Mnemonic::*;
        match mnemonic {
            Asl => self.asl(value),
            Lsr => self.lsr(value),
            Rol => self.rol(value),
            Ror => self.ror(value),
            Inc => {
                let result = value.wrapping_add(1);
                self.update_zn(result);
                result
            }
            Dec => {
                let result = value.wrapping_sub(1);
                self.update_zn(result);
                result
            }
            Slo => {
                let result = self.asl(value);
                self.load_a(self.a | result);
                result
            }
            Rla => {
                let result = self.rol(value);
                self.load_a(self.a & result);
                result
            }
            Sre => {
                let result = self.lsr(value);
                self.load_a(self.a ^ result);
                result
            }
            Rra => {
                let result = self.ror(value);
                self.adc(result);
                result
            }
            Dcp => {
                let result = value.wrapping_sub(1);
                self.compare(self.a, result);
                result
            }
            Isc => {
                let result = value.wrapping_add(1);
                self.sbc(result);
                result
            }
            _ => value,
        }
    }

    /// Two-cycle register instructions, including the accumulator shifts.
    pub(crate) fn implied_op(&mut self, mnemonic: Mnemonic) {
        use Mnemonic::*;
        match mnemonic {
            Asl => self.a = self.asl(self.a),
            Lsr => self.a = self.lsr(self.a),
            Rol => self.a = self.rol(self.a),
            Ror => self.a = self.ror(self.a),
            Clc => self.set_flag(Status::CARRY, false),
            Sec => self.set_flag(Status::CARRY, true),
            Cli => self.set_flag(Status::IRQ_DISABLE, false),
            Sei => self.set_flag(Status::IRQ_DISABLE, true),
            Clv => self.set_flag(Status::OVERFLOW, false),
            Cld => self.set_flag(Status::DECIMAL, false),
            Sed => self.set_flag(Status::DECIMAL, true),
            Tax => self.load_x(self.a),
            Tay => self.load_y(self.a),
            Txa => self.load_a(self.x),
            Tya => self.load_a(self.y),
            Tsx => self.load_x(self.s),
            Txs => self.s = self.x,
            Inx => self.load_x(self.x.wrapping_add(1)),
            Iny => self.load_y(self.y.wrapping_add(1)),
            Dex => self.load_x(self.x.wrapping_sub(1)),
            Dey => self.load_y(self.y.wrapping_sub(1)),
            _ => {}
        }
    }

    /// Branch condition for a relative-mode mnemonic.
    pub(crate) fn branch_taken(&self, mnemonic: Mnemonic) -> bool {
        use Mnemonic::*;
        match mnemonic {
            Bpl => !self.flag(Status::NEGATIVE),
            Bmi => self.flag(Status::NEGATIVE),
            Bvc => !self.flag(Status::OVERFLOW),
            Bvs => self.flag(Status::OVERFLOW),
            Bcc => !self.flag(Status::CARRY),
            Bcs => self.flag(Status::CARRY),
            Bne => !self.flag(Status::ZERO),
            Beq => self.flag(Status::ZERO),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Mnemonic::*;

    fn state(a: u8) -> CpuState {
        CpuState {
            a,
            ..CpuState::new()
        }
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        let mut s = state(0x50);
        s.adc(0x50);
        assert_eq!(s.a, 0xA0);
        assert!(s.flag(Status::OVERFLOW) && s.flag(Status::NEGATIVE) && !s.flag(Status::CARRY));

        let mut s = state(0xFF);
        s.adc(0x01);
        assert_eq!(s.a, 0x00);
        assert!(s.flag(Status::CARRY) && s.flag(Status::ZERO) && !s.flag(Status::OVERFLOW));
    }

    #[test]
    fn adc_ignores_decimal_mode() {
        let mut s = state(0x09);
        s.set_flag(Status::DECIMAL, true);
        s.adc(0x01);
        assert_eq!(s.a, 0x0A);
    }

    #[test]
    fn sbc_borrows_through_carry() {
        let mut s = state(0x05);
        s.set_flag(Status::CARRY, true);
        s.sbc(0x06);
        assert_eq!(s.a, 0xFF);
        assert!(!s.flag(Status::CARRY));
    }

    #[test]
    fn compare_sets_carry_on_greater_or_equal() {
        let mut s = state(0x40);
        s.read_op(Cmp, 0x40);
        assert!(s.flag(Status::CARRY) && s.flag(Status::ZERO));
        s.read_op(Cmp, 0x41);
        assert!(!s.flag(Status::CARRY) && s.flag(Status::NEGATIVE));
    }

    #[test]
    fn bit_copies_the_top_bits() {
        let mut s = state(0x01);
        s.read_op(Bit, 0xC0);
        assert!(s.flag(Status::ZERO) && s.flag(Status::NEGATIVE) && s.flag(Status::OVERFLOW));
    }

    #[test]
    fn rotates_go_through_carry() {
        let mut s = state(0x80);
        s.implied_op(Rol);
        assert_eq!(s.a, 0x00);
        assert!(s.flag(Status::CARRY));
        s.implied_op(Ror);
        assert_eq!(s.a, 0x80);
        assert!(!s.flag(Status::CARRY));
    }

    #[test]
    fn stable_unofficial_combinations() {
        let mut s = state(0x0F);
        assert_eq!(s.modify(Slo, 0x81), 0x02);
        assert_eq!(s.a, 0x0F);
        assert!(s.flag(Status::CARRY));

        let mut s = state(0x10);
        assert_eq!(s.modify(Dcp, 0x11), 0x10);
        assert!(s.flag(Status::ZERO) && s.flag(Status::CARRY));

        let mut s = state(0x10);
        s.set_flag(Status::CARRY, true);
        assert_eq!(s.modify(Isc, 0x0F), 0x10);
        assert_eq!(s.a, 0x00);

        let mut s = state(0xFF);
        s.x = 0x0F;
        s.read_op(Axs, 0x05);
        assert_eq!(s.x, 0x0A);
        assert!(s.flag(Status::CARRY));
    }

    #[test]
    fn arr_flags_come_from_bits_six_and_five() {
        let mut s = state(0xFF);
        s.set_flag(Status::CARRY, true);
        s.read_op(Arr, 0xC0);
        assert_eq!(s.a, 0xE0);
        assert!(s.flag(Status::CARRY));
        assert!(!s.flag(Status::OVERFLOW));

        let mut s = state(0xFF);
        s.read_op(Arr, 0x80);
        assert_eq!(s.a, 0x40);
        assert!(s.flag(Status::CARRY) && s.flag(Status::OVERFLOW));
    }

    #[test]
    fn unstable_opcodes_use_fixed_formulas() {
        let mut s = state(0x00);
        s.x = 0xFF;
        s.read_op(Xaa, 0x35);
        assert_eq!(s.a, 0x24);

        let mut s = state(0xFF);
        s.read_op(Lax, 0x42);
        assert_eq!((s.a, s.x), (0x42, 0x42));

        let mut s = state(0);
        s.s = 0xF0;
        s.read_op(Las, 0x3C);
        assert_eq!((s.a, s.x, s.s), (0x30, 0x30, 0x30));

        let mut s = state(0xF3);
        s.x = 0x3F;
        assert_eq!(s.write_value(Sha, 0x12), 0x13 & 0x33);
        assert_eq!(s.write_value(Tas, 0x7F), 0x33 & 0x80);
        assert_eq!(s.s, 0x33);
    }
}

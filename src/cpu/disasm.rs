//! One-line disassembler over the shared opcode table.
//!
//! `operands` holds the bytes following the opcode; missing bytes read as
//! zero. Relative branches print their absolute target.

use crate::cpu::table::{Mode, decode};

pub fn disassemble(opcode: u8, operands: &[u8], pc: u16) -> String {
    let op = decode(opcode);
    let lo = operands.first().copied().unwrap_or(0);
    let hi = operands.get(1).copied().unwrap_or(0);
    let word = u16::from_le_bytes([lo, hi]);
    let name = op.mnemonic.name();

    match op.mode {
        Mode::Implied => name.to_string(),
        Mode::Accumulator => format!("{name} A"),
        Mode::Immediate => format!("{name} #${lo:02X}"),
        Mode::ZeroPage => format!("{name} ${lo:02X}"),
        Mode::ZeroPageX => format!("{name} ${lo:02X},X"),
        Mode::ZeroPageY => format!("{name} ${lo:02X},Y"),
        Mode::Absolute => format!("{name} ${word:04X}"),
        Mode::AbsoluteX => format!("{name} ${word:04X},X"),
        Mode::AbsoluteY => format!("{name} ${word:04X},Y"),
        Mode::Indirect => format!("{name} (${word:04X})"),
        Mode::IndirectX => format!("{name} (${lo:02X},X)"),
        Mode::IndirectY => format!("{name} (${lo:02X}),Y"),
        Mode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add_signed(i16::from(lo as i8));
            format!("{name} ${target:04X}")
        }
    }
}

/// Bytes the instruction at `opcode` occupies, opcode included.
pub fn instruction_len(opcode: u8) -> u16 {
    1 + decode(opcode).mode.operand_len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_mode() {
        assert_eq!(disassemble(0xA9, &[0x10], 0), "LDA #$10");
        assert_eq!(disassemble(0x0A, &[], 0), "ASL A");
        assert_eq!(disassemble(0xBD, &[0x34, 0x12], 0), "LDA $1234,X");
        assert_eq!(disassemble(0x6C, &[0xFC, 0xFF], 0), "JMP ($FFFC)");
        assert_eq!(disassemble(0xB1, &[0x20], 0), "LDA ($20),Y");
        assert_eq!(disassemble(0x02, &[], 0), "JAM");
    }

    #[test]
    fn branches_print_the_target() {
        assert_eq!(disassemble(0xD0, &[0xFE], 0x8000), "BNE $8000");
        assert_eq!(disassemble(0x10, &[0x05], 0xC000), "BPL $C007");
    }

    #[test]
    fn lengths_follow_the_mode() {
        assert_eq!(instruction_len(0xEA), 1);
        assert_eq!(instruction_len(0xA9), 2);
        assert_eq!(instruction_len(0x4C), 3);
    }
}

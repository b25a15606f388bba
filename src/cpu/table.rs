/*!
table.rs - The 256-entry opcode table.

Every opcode value decodes to a `Mnemonic` and an addressing `Mode`; there is
no "unknown opcode" row. The twelve KIL/JAM encodings decode to `Jam`.

`Opcode::kind` groups rows by the cycle template the dispatcher runs:

```text
Read / Write / Rmw   addressing template, then 1 (read, write) or 3 (rmw) data cycles
Implied              2 cycles, dummy read of the next byte (accumulator forms too)
Push / Pull          3 / 4 cycles
Branch               2 / 3 / 4 cycles
Jmp, JmpIndirect, Jsr, Rts, Rti, Brk, Jam
```
The disassembler shares the table.
*/

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    // Official
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Unofficial, stable
    Alr,
    Anc,
    Arr,
    Axs,
    Dcp,
    Isc,
    Lax,
    Rla,
    Rra,
    Sax,
    Slo,
    Sre,
    // Unofficial, unstable on hardware
    Las,
    Sha,
    Shx,
    Shy,
    Tas,
    Xaa,
    Jam,
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
            Alr => "ALR",
            Anc => "ANC",
            Arr => "ARR",
            Axs => "AXS",
            Dcp => "DCP",
            Isc => "ISC",
            Lax => "LAX",
            Rla => "RLA",
            Rra => "RRA",
            Sax => "SAX",
            Slo => "SLO",
            Sre => "SRE",
            Las => "LAS",
            Sha => "SHA",
            Shx => "SHX",
            Shy => "SHY",
            Tas => "TAS",
            Xaa => "XAA",
            Jam => "JAM",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    /// Operand bytes after the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            Mode::Implied | Mode::Accumulator => 0,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 2,
            _ => 1,
        }
    }
}

/// Cycle template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Read,
    Write,
    Rmw,
    Implied,
    Push,
    Pull,
    Branch,
    Jmp,
    JmpIndirect,
    Jsr,
    Rts,
    Rti,
    Brk,
    Jam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: Mode,
}

impl Opcode {
    pub fn kind(self) -> Kind {
        use Mnemonic::*;
        match (self.mnemonic, self.mode) {
            (_, Mode::Implied | Mode::Accumulator) => match self.mnemonic {
                Brk => Kind::Brk,
                Rti => Kind::Rti,
                Rts => Kind::Rts,
                Pha | Php => Kind::Push,
                Pla | Plp => Kind::Pull,
                Jam => Kind::Jam,
                _ => Kind::Implied,
            },
            (_, Mode::Relative) => Kind::Branch,
            (Jmp, Mode::Indirect) => Kind::JmpIndirect,
            (Jmp, _) => Kind::Jmp,
            (Jsr, _) => Kind::Jsr,
            (Sta | Stx | Sty | Sax | Sha | Shx | Shy | Tas, _) => Kind::Write,
            (Asl | Lsr | Rol | Ror | Inc | Dec | Slo | Rla | Sre | Rra | Dcp | Isc, _) => Kind::Rmw,
            _ => Kind::Read,
        }
    }
}

const fn op(mnemonic: Mnemonic, mode: Mode) -> Opcode {
    Opcode { mnemonic, mode }
}

use Mnemonic::*;
use Mode::{
    Absolute as Abs, AbsoluteX as Abx, AbsoluteY as Aby, Accumulator as Acc, Immediate as Imm,
    Implied as Imp, Indirect as Ind, IndirectX as Izx, IndirectY as Izy, Relative as Rel,
    ZeroPage as Zp, ZeroPageX as Zpx, ZeroPageY as Zpy,
};

#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    // 0x00
    op(Brk, Imp), op(Ora, Izx), op(Jam, Imp), op(Slo, Izx), op(Nop, Zp),  op(Ora, Zp),  op(Asl, Zp),  op(Slo, Zp),
    op(Php, Imp), op(Ora, Imm), op(Asl, Acc), op(Anc, Imm), op(Nop, Abs), op(Ora, Abs), op(Asl, Abs), op(Slo, Abs),
    // 0x10
    op(Bpl, Rel), op(Ora, Izy), op(Jam, Imp), op(Slo, Izy), op(Nop, Zpx), op(Ora, Zpx), op(Asl, Zpx), op(Slo, Zpx),
    op(Clc, Imp), op(Ora, Aby), op(Nop, Imp), op(Slo, Aby), op(Nop, Abx), op(Ora, Abx), op(Asl, Abx), op(Slo, Abx),
    // 0x20
    op(Jsr, Abs), op(And, Izx), op(Jam, Imp), op(Rla, Izx), op(Bit, Zp),  op(And, Zp),  op(Rol, Zp),  op(Rla, Zp),
    op(Plp, Imp), op(And, Imm), op(Rol, Acc), op(Anc, Imm), op(Bit, Abs), op(And, Abs), op(Rol, Abs), op(Rla, Abs),
    // 0x30
    op(Bmi, Rel), op(And, Izy), op(Jam, Imp), op(Rla, Izy), op(Nop, Zpx), op(And, Zpx), op(Rol, Zpx), op(Rla, Zpx),
    op(Sec, Imp), op(And, Aby), op(Nop, Imp), op(Rla, Aby), op(Nop, Abx), op(And, Abx), op(Rol, Abx), op(Rla, Abx),
    // 0x40
    op(Rti, Imp), op(Eor, Izx), op(Jam, Imp), op(Sre, Izx), op(Nop, Zp),  op(Eor, Zp),  op(Lsr, Zp),  op(Sre, Zp),
    op(Pha, Imp), op(Eor, Imm), op(Lsr, Acc), op(Alr, Imm), op(Jmp, Abs), op(Eor, Abs), op(Lsr, Abs), op(Sre, Abs),
    // 0x50
    op(Bvc, Rel), op(Eor, Izy), op(Jam, Imp), op(Sre, Izy), op(Nop, Zpx), op(Eor, Zpx), op(Lsr, Zpx), op(Sre, Zpx),
    op(Cli, Imp), op(Eor, Aby), op(Nop, Imp), op(Sre, Aby), op(Nop, Abx), op(Eor, Abx), op(Lsr, Abx), op(Sre, Abx),
    // 0x60
    op(Rts, Imp), op(Adc, Izx), op(Jam, Imp), op(Rra, Izx), op(Nop, Zp),  op(Adc, Zp),  op(Ror, Zp),  op(Rra, Zp),
    op(Pla, Imp), op(Adc, Imm), op(Ror, Acc), op(Arr, Imm), op(Jmp, Ind), op(Adc, Abs), op(Ror, Abs), op(Rra, Abs),
    // 0x70
    op(Bvs, Rel), op(Adc, Izy), op(Jam, Imp), op(Rra, Izy), op(Nop, Zpx), op(Adc, Zpx), op(Ror, Zpx), op(Rra, Zpx),
    op(Sei, Imp), op(Adc, Aby), op(Nop, Imp), op(Rra, Aby), op(Nop, Abx), op(Adc, Abx), op(Ror, Abx), op(Rra, Abx),
    // 0x80
    op(Nop, Imm), op(Sta, Izx), op(Nop, Imm), op(Sax, Izx), op(Sty, Zp),  op(Sta, Zp),  op(Stx, Zp),  op(Sax, Zp),
    op(Dey, Imp), op(Nop, Imm), op(Txa, Imp), op(Xaa, Imm), op(Sty, Abs), op(Sta, Abs), op(Stx, Abs), op(Sax, Abs),
    // 0x90
    op(Bcc, Rel), op(Sta, Izy), op(Jam, Imp), op(Sha, Izy), op(Sty, Zpx), op(Sta, Zpx), op(Stx, Zpy), op(Sax, Zpy),
    op(Tya, Imp), op(Sta, Aby), op(Txs, Imp), op(Tas, Aby), op(Shy, Abx), op(Sta, Abx), op(Shx, Aby), op(Sha, Aby),
    // 0xA0
    op(Ldy, Imm), op(Lda, Izx), op(Ldx, Imm), op(Lax, Izx), op(Ldy, Zp),  op(Lda, Zp),  op(Ldx, Zp),  op(Lax, Zp),
    op(Tay, Imp), op(Lda, Imm), op(Tax, Imp), op(Lax, Imm), op(Ldy, Abs), op(Lda, Abs), op(Ldx, Abs), op(Lax, Abs),
    // 0xB0
    op(Bcs, Rel), op(Lda, Izy), op(Jam, Imp), op(Lax, Izy), op(Ldy, Zpx), op(Lda, Zpx), op(Ldx, Zpy), op(Lax, Zpy),
    op(Clv, Imp), op(Lda, Aby), op(Tsx, Imp), op(Las, Aby), op(Ldy, Abx), op(Lda, Abx), op(Ldx, Aby), op(Lax, Aby),
    // 0xC0
    op(Cpy, Imm), op(Cmp, Izx), op(Nop, Imm), op(Dcp, Izx), op(Cpy, Zp),  op(Cmp, Zp),  op(Dec, Zp),  op(Dcp, Zp),
    op(Iny, Imp), op(Cmp, Imm), op(Dex, Imp), op(Axs, Imm), op(Cpy, Abs), op(Cmp, Abs), op(Dec, Abs), op(Dcp, Abs),
    // 0xD0
    op(Bne, Rel), op(Cmp, Izy), op(Jam, Imp), op(Dcp, Izy), op(Nop, Zpx), op(Cmp, Zpx), op(Dec, Zpx), op(Dcp, Zpx),
    op(Cld, Imp), op(Cmp, Aby), op(Nop, Imp), op(Dcp, Aby), op(Nop, Abx), op(Cmp, Abx), op(Dec, Abx), op(Dcp, Abx),
    // 0xE0
    op(Cpx, Imm), op(Sbc, Izx), op(Nop, Imm), op(Isc, Izx), op(Cpx, Zp),  op(Sbc, Zp),  op(Inc, Zp),  op(Isc, Zp),
    op(Inx, Imp), op(Sbc, Imm), op(Nop, Imp), op(Sbc, Imm), op(Cpx, Abs), op(Sbc, Abs), op(Inc, Abs), op(Isc, Abs),
    // 0xF0
    op(Beq, Rel), op(Sbc, Izy), op(Jam, Imp), op(Isc, Izy), op(Nop, Zpx), op(Sbc, Zpx), op(Inc, Zpx), op(Isc, Zpx),
    op(Sed, Imp), op(Sbc, Aby), op(Nop, Imp), op(Isc, Aby), op(Nop, Abx), op(Sbc, Abx), op(Inc, Abx), op(Isc, Abx),
];

#[inline]
pub fn decode(opcode: u8) -> Opcode {
    OPCODES[usize::from(opcode)]
}

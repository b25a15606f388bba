/*!
state.rs - Architectural 6502 state: registers and the status byte.

Bus access, decode and timing live elsewhere; this type is plain data with
the flag arithmetic every instruction shares.

6502 Status Register Bit Layout
===============================
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C

The B and unused bits do not exist in the register itself. They only appear
in the byte pushed to the stack: PHP and BRK push B set, NMI and IRQ push it
clear, and bit 5 is always pushed as 1. Pulling a status byte discards both.
*/

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        const CARRY = 0b0000_0001;
        const ZERO = 0b0000_0010;
        const IRQ_DISABLE = 0b0000_0100;
        /// Stored and pushed, but the NES ALU has no decimal mode.
        const DECIMAL = 0b0000_1000;
        const BREAK = 0b0001_0000;
        const UNUSED = 0b0010_0000;
        const OVERFLOW = 0b0100_0000;
        const NEGATIVE = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer; the stack lives in page $01.
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Default for CpuState {
    /// Power-on: S is 0 until the reset sequence walks it down to $FD.
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0,
            pc: 0,
            p: Status::IRQ_DISABLE,
        }
    }
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn flag(&self, flag: Status) -> bool {
        self.p.contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Status, on: bool) {
        self.p.set(flag, on);
    }

    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.p.set(Status::ZERO, value == 0);
        self.p.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    #[inline]
    pub fn carry_in(&self) -> u8 {
        u8::from(self.flag(Status::CARRY))
    }

    /// The byte PHP/BRK (`brk = true`) or an interrupt (`brk = false`) pushes.
    pub fn status_for_push(&self, brk: bool) -> u8 {
        let mut p = self.p | Status::UNUSED;
        p.set(Status::BREAK, brk);
        p.bits()
    }

    /// Load P from a pulled byte (PLP, RTI).
    pub fn restore_status(&mut self, value: u8) {
        self.p = Status::from_bits_retain(value) - Status::BREAK - Status::UNUSED;
    }

    /// Stack address for the current S.
    #[inline]
    pub fn stack_addr(&self) -> u16 {
        0x0100 | u16::from(self.s)
    }
}

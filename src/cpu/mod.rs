/*!
cpu - Cycle-stepped 6502 (2A03 core, no decimal mode).

One call to [`Cpu::tick`] is one CPU cycle and performs exactly one bus
access. Instructions are state machines over `t`:

- `t = 0` fetches the opcode, or for a pending interrupt or reset performs
  a dummy read and runs the BRK microcode instead (see
  `dispatch::control_flow`).
- `t >= 1` runs the opcode's cycle template (`dispatch`).

Interrupts
==========
After every cycle the CPU samples the shared [`InterruptLines`]:
- NMI is edge-detected: a rising `nmi()` latches a request until an entry
  sequence consumes it.
- IRQ is a level, honoured while I is clear.

The "should the next instruction be an interrupt" decision is re-evaluated
after every cycle except the last one of an instruction, so the value taken
into the next fetch is the one polled before the final cycle. CLI, SEI and
PLP change I on their final cycle and therefore act one instruction late;
RTI changes it earlier and acts at once. A taken branch skips the poll after
its operand cycle (see `dispatch::branches`).

Modules
=======
```text
    state.rs        registers and status flags
    table.rs        256-entry opcode table and cycle-template kinds
    addressing.rs   per-cycle addressing templates
    execute.rs      ALU and register semantics
    dispatch/       per-kind cycle sequences
    disasm.rs       one-line disassembler over the opcode table
```
*/

pub mod addressing;
pub mod disasm;
pub mod dispatch;
pub mod execute;
pub mod state;
pub mod table;

use std::fmt;

use crate::interrupts::InterruptLines;

pub use state::{CpuState, Status};
use table::{Opcode, decode};

/// The CPU's view of the system: one access per call, plus the interrupt
/// lines it samples after each cycle.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
    /// Read without side effects. Only the trace hook uses it.
    fn peek(&self, addr: u16) -> u8;
    fn lines(&self) -> &InterruptLines;
}

/// Snapshot handed to the trace hook at each opcode fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub pc: u16,
    pub opcode: u8,
    /// The two bytes after the opcode, peeked; only the first
    /// `Mode::operand_len` of them belong to the instruction.
    pub operands: [u8; 2],
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub s: u8,
    /// CPU cycles since power-on, counting the fetch itself.
    pub cycles: u64,
}

pub type TraceHook = Box<dyn FnMut(&TraceRecord)>;

/// How the current BRK microcode was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Brk,
    Interrupt,
    Reset,
}

pub struct Cpu {
    state: CpuState,
    op: Opcode,
    /// Cycle within the current instruction; 0 is the fetch.
    t: u8,
    /// Cycles spent in the data phase of a memory instruction.
    data_step: Option<u8>,
    entry: Entry,

    addr: u16,
    pointer: u8,
    data: u8,
    base_high: u8,
    page_crossed: bool,

    nmi_previous: bool,
    nmi_latched: bool,
    irq_level: bool,
    interrupt_pending: bool,
    poll_enabled: bool,
    reset_pending: bool,
    jammed: bool,

    cycles: u64,
    trace_hook: Option<TraceHook>,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("op", &self.op)
            .field("t", &self.t)
            .field("nmi_latched", &self.nmi_latched)
            .field("irq_level", &self.irq_level)
            .field("jammed", &self.jammed)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Power-on: registers cleared, reset sequence pending.
    pub fn new() -> Self {
        Self {
            state: CpuState::new(),
            op: decode(0x00),
            t: 0,
            data_step: None,
            entry: Entry::Reset,
            addr: 0,
            pointer: 0,
            data: 0,
            base_high: 0,
            page_crossed: false,
            nmi_previous: false,
            nmi_latched: false,
            irq_level: false,
            interrupt_pending: false,
            poll_enabled: true,
            reset_pending: true,
            jammed: false,
            cycles: 0,
            trace_hook: None,
        }
    }

    /// Reset button: abandon the current instruction and run the reset
    /// sequence from the next cycle. Registers other than PC, S and I keep
    /// their values.
    pub fn reset(&mut self) {
        self.t = 0;
        self.data_step = None;
        self.jammed = false;
        self.reset_pending = true;
        self.nmi_latched = false;
        self.interrupt_pending = false;
    }

    pub fn set_trace_hook(&mut self, hook: TraceHook) {
        self.trace_hook = Some(hook);
    }

    pub fn clear_trace_hook(&mut self) {
        self.trace_hook = None;
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    /// CPU cycles executed since power-on (DMA stalls excluded).
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// True between instructions, i.e. the next tick is an opcode fetch or
    /// an interrupt entry.
    pub fn at_instruction_boundary(&self) -> bool {
        self.t == 0 && !self.jammed
    }

    pub fn cycles_into_instruction(&self) -> u8 {
        self.t
    }

    /// Run one CPU cycle.
    pub fn tick<B: CpuBus>(&mut self, bus: &mut B) {
        self.cycles += 1;
        if self.jammed {
            let _ = bus.read(0xFFFF);
            self.observe_interrupts(bus.lines());
            return;
        }

        self.poll_enabled = true;
        let last = if self.t == 0 {
            self.fetch(bus);
            false
        } else {
            self.execute_cycle(bus)
        };

        self.observe_interrupts(bus.lines());
        if last {
            self.t = 0;
        } else {
            self.t += 1;
            if self.poll_enabled {
                self.poll();
            }
        }
    }

    /// One cycle the CPU spends halted by DMA. The lines are still sampled,
    /// and on the last stalled cycle the interrupt decision is polled again,
    /// so a request raised during the stall is taken at the next boundary.
    pub fn stall_cycle(&mut self, lines: &InterruptLines, last: bool) {
        self.observe_interrupts(lines);
        if last && self.t == 0 {
            self.poll();
        }
    }

    /// Sample the interrupt lines. Called after each CPU cycle and each
    /// DMA stall cycle.
    pub fn observe_interrupts(&mut self, lines: &InterruptLines) {
        let nmi = lines.nmi();
        if nmi && !self.nmi_previous {
            self.nmi_latched = true;
        }
        self.nmi_previous = nmi;
        self.irq_level = lines.irq();
    }

    /// Run whole instructions; returns the cycles they took.
    pub fn run_instructions<B: CpuBus>(&mut self, bus: &mut B, count: usize) -> u64 {
        let start = self.cycles;
        for _ in 0..count {
            loop {
                self.tick(bus);
                if self.at_instruction_boundary() || self.jammed {
                    break;
                }
            }
        }
        self.cycles - start
    }

    fn poll(&mut self) {
        self.interrupt_pending =
            self.nmi_latched || (self.irq_level && !self.state.flag(Status::IRQ_DISABLE));
    }

    fn fetch<B: CpuBus>(&mut self, bus: &mut B) {
        self.data_step = None;
        self.page_crossed = false;

        if self.reset_pending || self.interrupt_pending {
            let _ = bus.read(self.state.pc);
            self.entry = if self.reset_pending {
                Entry::Reset
            } else {
                Entry::Interrupt
            };
            self.reset_pending = false;
            self.op = decode(0x00);
            return;
        }

        let pc = self.state.pc;
        let opcode = bus.read(pc);
        if let Some(hook) = self.trace_hook.as_mut() {
            hook(&TraceRecord {
                pc,
                opcode,
                operands: [bus.peek(pc.wrapping_add(1)), bus.peek(pc.wrapping_add(2))],
                a: self.state.a,
                x: self.state.x,
                y: self.state.y,
                p: self.state.status_for_push(false),
                s: self.state.s,
                cycles: self.cycles,
            });
        }
        self.state.pc = pc.wrapping_add(1);
        self.entry = Entry::Brk;
        self.op = decode(opcode);
    }
}

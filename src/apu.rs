/*!
APU frame sequencer and length counters, modelled as an IRQ source.

Scope:
- No waveform synthesis. The APU takes part in the console only through the
  shared IRQ line and the `$4015` status bits, which depend on the frame
  sequencer and the four length counters.

Frame sequencer (NTSC, CPU cycles since the last reset of the sequence):
```text
mode 0 (4-step): 7457 Q, 14913 QH, 22371 Q, 29828 I, 29829 QHI, 29830 I -> 0
mode 1 (5-step): 7457 Q, 14913 QH, 22371 Q, 37281 QH, 37282 -> 0
```
Q = quarter frame (envelopes; nothing to do here), H = half frame (length
counters), I = frame IRQ unless inhibited.

Registers:
- `$4000/$4004/$400C` bit 5 and `$4008` bit 7: length counter halt.
- `$4003/$4007/$400B/$400F`: length counter load (bits 3-7 index the table).
- `$4015` write: enable bits 0-3; a disabled counter is forced to zero.
- `$4015` read: bits 0-3 counter non-zero, bit 6 frame IRQ; acknowledges the IRQ.
- `$4017` write: bit 7 mode, bit 6 IRQ inhibit (acknowledges). Selecting
  the 5-step mode clocks a half frame immediately.
*/

use crate::interrupts::{InterruptLines, IrqSource};

const LENGTH_TABLE: [u8; 32] = [
    0x0a, 0xfe, 0x14, 0x02, 0x28, 0x04, 0x50, 0x06, 0xa0, 0x08, 0x3c, 0x0a, 0x0e, 0x0c, 0x1a, 0x0e,
    0x0c, 0x10, 0x18, 0x12, 0x30, 0x14, 0x60, 0x16, 0xc0, 0x18, 0x48, 0x1a, 0x10, 0x1c, 0x20, 0x1e,
];

const STEP4_IRQ_FIRST: u32 = 29828;
const STEP4_LAST: u32 = 29830;
const STEP5_LAST: u32 = 37282;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Step4,
    Step5,
}

#[derive(Debug, Clone, Copy, Default)]
struct LengthCounter {
    counter: u8,
    enabled: bool,
    halt: bool,
}

impl LengthCounter {
    fn tick(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.counter = 0;
        }
    }

    fn load(&mut self, data: u8) {
        if self.enabled {
            self.counter = LENGTH_TABLE[(data >> 3) as usize];
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Apu {
    lengths: [LengthCounter; 4],
    mode: Mode,
    irq_inhibit: bool,
    cycle: u32,
    frame_irq: IrqSource,
}

impl Apu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset button: silence channels and the frame IRQ; the sequencer mode
    /// is kept, as on hardware.
    pub fn reset(&mut self, lines: &mut InterruptLines) {
        for len in &mut self.lengths {
            len.set_enabled(false);
        }
        self.cycle = 0;
        self.frame_irq.acknowledge(lines);
    }

    /// Advance one CPU cycle.
    pub fn tick(&mut self, lines: &mut InterruptLines) {
        self.cycle += 1;
        match (self.mode, self.cycle) {
            (_, 14913) => self.half_frame(),
            (Mode::Step4, STEP4_IRQ_FIRST) => self.raise_irq(lines),
            (Mode::Step4, 29829) => {
                self.raise_irq(lines);
                self.half_frame();
            }
            (Mode::Step4, STEP4_LAST) => {
                self.raise_irq(lines);
                self.cycle = 0;
            }
            (Mode::Step5, 37281) => self.half_frame(),
            (Mode::Step5, STEP5_LAST) => self.cycle = 0,
            _ => {}
        }
    }

    fn half_frame(&mut self) {
        for len in &mut self.lengths {
            len.tick();
        }
    }

    fn raise_irq(&mut self, lines: &mut InterruptLines) {
        if !self.irq_inhibit {
            self.frame_irq.request(lines);
        }
    }

    /// CPU write in $4000-$4017 (the $4014 and $4016 ports are claimed by
    /// other devices first).
    pub fn write(&mut self, addr: u16, value: u8, lines: &mut InterruptLines) {
        match addr {
            0x4000 | 0x4004 | 0x400C => {
                self.lengths[((addr - 0x4000) / 4) as usize].halt = value & 0x20 != 0
            }
            0x4008 => self.lengths[2].halt = value & 0x80 != 0,
            0x4003 | 0x4007 | 0x400B | 0x400F => {
                self.lengths[((addr - 0x4003) / 4) as usize].load(value)
            }
            0x4015 => {
                for (i, len) in self.lengths.iter_mut().enumerate() {
                    len.set_enabled(value & (1 << i) != 0);
                }
            }
            0x4017 => {
                self.mode = if value & 0x80 != 0 {
                    Mode::Step5
                } else {
                    Mode::Step4
                };
                self.irq_inhibit = value & 0x40 != 0;
                if self.irq_inhibit {
                    self.frame_irq.acknowledge(lines);
                }
                self.cycle = 0;
                if self.mode == Mode::Step5 {
                    self.half_frame();
                }
            }
            _ => {}
        }
    }

    /// $4015 read with its side effect (frame IRQ acknowledge).
    pub fn read_status(&mut self, lines: &mut InterruptLines) -> u8 {
        let status = self.peek_status();
        self.frame_irq.acknowledge(lines);
        status
    }

    pub fn peek_status(&self) -> u8 {
        let mut status = 0;
        for (i, len) in self.lengths.iter().enumerate() {
            if len.counter > 0 {
                status |= 1 << i;
            }
        }
        if self.frame_irq.is_requested() {
            status |= 0x40;
        }
        status
    }
}

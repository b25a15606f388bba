/*!
DmaController: cycle-accurate OAM DMA state machine.

Behavioral model
- A write to $4014 starts a transfer from page `$XX00`.
- The transfer steals 512 CPU cycles, plus one alignment cycle when it was
  triggered on an odd CPU cycle.
- After alignment, 256 alternating read/write micro-steps:
  - Read one byte from CPU space at ($XX00 + index), with the same side
    effects a CPU read would have.
  - Write the latched byte to OAMDATA ($2004), which increments OAMADDR.
- While active, the CPU instruction engine does not advance; PPU, mapper and
  APU keep ticking.

Integration notes
- The owner calls `start` from the $4014 write handler and `step_one_cycle`
  once per CPU slot while `is_active()`.
- The controller is `Default` so the owner can `mem::take` it out of the
  device set for the duration of one step and hand the rest of the devices
  in as the memory side.
*/

use tracing::trace;

/// Number of CPU cycles a transfer takes when started on an even cycle.
pub const DMA_CYCLES: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DmaPhase {
    #[default]
    Read,
    Write,
}

/// CPU-visible reads used by DMA to fetch source bytes.
pub trait CpuMemory {
    fn cpu_read(&mut self, addr: u16) -> u8;
}

/// Equivalent of a $2004 (OAMDATA) write.
pub trait OamWriter {
    fn write_oam_data(&mut self, value: u8);
}

#[derive(Debug, Default, Clone)]
pub struct DmaController {
    active: bool,
    src_addr: u16,
    index: u16,
    phase: DmaPhase,
    latch: u8,
    align_cycles: u8,
}

impl DmaController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Begin a transfer from `src_page << 8`. An odd `cpu_cycle` costs one
    /// extra alignment cycle (513 total).
    pub fn start(&mut self, src_page: u8, cpu_cycle: u64) {
        self.active = true;
        self.src_addr = (src_page as u16) << 8;
        self.index = 0;
        self.phase = DmaPhase::Read;
        self.latch = 0;
        self.align_cycles = (cpu_cycle & 1) as u8;
        trace!(page = src_page, cpu_cycle, "OAM DMA start");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// CPU stall cycles left in the current transfer, alignment included.
    pub fn stall_remaining(&self) -> u32 {
        if !self.active {
            return 0;
        }
        let bytes_left = 256u32.saturating_sub(self.index as u32);
        let transfer = match self.phase {
            DmaPhase::Read => bytes_left * 2,
            DmaPhase::Write => (bytes_left * 2).saturating_sub(1),
        };
        self.align_cycles as u32 + transfer
    }

    /// Perform one CPU cycle of the transfer. Returns whether the CPU is
    /// stalled this cycle (false only when idle).
    pub fn step_one_cycle<B: CpuMemory + OamWriter>(&mut self, bus: &mut B) -> bool {
        if !self.active {
            return false;
        }

        if self.align_cycles > 0 {
            self.align_cycles -= 1;
            return true;
        }

        match self.phase {
            DmaPhase::Read => {
                self.latch = bus.cpu_read(self.src_addr.wrapping_add(self.index));
                self.phase = DmaPhase::Write;
            }
            DmaPhase::Write => {
                bus.write_oam_data(self.latch);
                self.index += 1;
                self.phase = DmaPhase::Read;
                if self.index == 256 {
                    self.active = false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PatternBus {
        reads: Vec<u16>,
        writes: Vec<u8>,
    }

    impl PatternBus {
        fn new() -> Self {
            Self {
                reads: Vec::new(),
                writes: Vec::new(),
            }
        }
    }

    impl CpuMemory for PatternBus {
        fn cpu_read(&mut self, addr: u16) -> u8 {
            self.reads.push(addr);
            (addr as u8).wrapping_mul(3)
        }
    }

    impl OamWriter for PatternBus {
        fn write_oam_data(&mut self, value: u8) {
            self.writes.push(value);
        }
    }

    fn run(dma: &mut DmaController, bus: &mut PatternBus) -> u32 {
        let mut cycles = 0;
        while dma.is_active() {
            assert!(dma.step_one_cycle(bus));
            cycles += 1;
        }
        cycles
    }

    #[test]
    fn even_start_takes_512_cycles() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus::new();
        dma.start(0x02, 100);
        assert_eq!(dma.stall_remaining(), 512);
        assert_eq!(run(&mut dma, &mut bus), 512);
        assert_eq!(bus.writes.len(), 256);
        assert_eq!(dma.stall_remaining(), 0);
    }

    #[test]
    fn odd_start_adds_one_alignment_cycle() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus::new();
        dma.start(0x03, 7);
        assert_eq!(dma.stall_remaining(), 513);
        assert_eq!(run(&mut dma, &mut bus), 513);
        assert_eq!(bus.writes.len(), 256);
    }

    #[test]
    fn reads_walk_the_source_page_in_order() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus::new();
        dma.start(0x07, 0);
        run(&mut dma, &mut bus);
        for (i, (&addr, &value)) in bus.reads.iter().zip(&bus.writes).enumerate() {
            assert_eq!(addr, 0x0700 + i as u16);
            assert_eq!(value, (i as u8).wrapping_mul(3));
        }
    }

    #[test]
    fn reads_and_writes_alternate() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus::new();
        dma.start(0x10, 0);

        dma.step_one_cycle(&mut bus);
        assert_eq!((bus.reads.len(), bus.writes.len()), (1, 0));
        assert_eq!(dma.stall_remaining(), 511);
        dma.step_one_cycle(&mut bus);
        assert_eq!((bus.reads.len(), bus.writes.len()), (1, 1));
        assert_eq!(dma.stall_remaining(), 510);
    }

    #[test]
    fn idle_controller_does_not_stall() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus::new();
        assert!(!dma.step_one_cycle(&mut bus));
        assert!(bus.reads.is_empty());
    }
}

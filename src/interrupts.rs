//! Shared CPU interrupt lines.
//!
//! The NMI line is a plain level driven by the PPU; the CPU turns it into an
//! edge. The IRQ line is wired-OR: every source that wants service holds it
//! low, so it is modelled as a count of asserting sources. Sources never touch
//! the count directly; they go through an [`IrqSource`], which makes repeated
//! requests (or acknowledgements) idempotent.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InterruptLines {
    nmi: bool,
    irq_sources: i32,
}

impl InterruptLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the NMI line. `true` means asserted (electrically low).
    #[inline]
    pub fn set_nmi(&mut self, asserted: bool) {
        self.nmi = asserted;
    }

    #[inline]
    pub fn nmi(&self) -> bool {
        self.nmi
    }

    /// True while at least one source holds IRQ asserted.
    #[inline]
    pub fn irq(&self) -> bool {
        self.irq_sources > 0
    }

    pub fn irq_source_count(&self) -> i32 {
        self.irq_sources
    }
}

/// One device's connection to the IRQ line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IrqSource {
    requested: bool,
}

impl IrqSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the line on behalf of this source. No-op if already asserted.
    #[inline]
    pub fn request(&mut self, lines: &mut InterruptLines) {
        if !self.requested {
            self.requested = true;
            lines.irq_sources += 1;
        }
    }

    /// Release this source's hold on the line. No-op if not asserted.
    #[inline]
    pub fn acknowledge(&mut self, lines: &mut InterruptLines) {
        if self.requested {
            self.requested = false;
            lines.irq_sources -= 1;
            assert!(lines.irq_sources >= 0, "IRQ source count went negative");
        }
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested
    }
}

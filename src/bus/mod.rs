#![doc = r#"
Generic slot-decoded address space.

Purpose
- Model one flat byte-addressable space (the 64 KiB CPU space or the 16 KiB PPU
  space) as an ordered list of slots, each pointing at a bank in an arena.
- Let devices claim address ranges ahead of the slot decode (shadow ranges).
- Track the last address driven onto the bus and the last data value (open bus).

Ownership
- The bus owns the bank arena. Mappers own only `BankId`s and rewire slots by
  index, so a bank switch never copies or aliases bytes.
- A bank shorter than its slot is mirrored across it (2 KiB of work RAM in an
  8 KiB slot, a 16 KiB PRG image in a 32 KiB window, ...). Bank length must
  evenly divide slot length.

Shadow dispatch
- The bus stores shadow handlers as small `Copy` tags. Whoever owns the devices
  (`SystemBus` for the CPU side, the PPU for its own space) asks for the tag
  first and falls back to `get_byte`/`set_byte` when there is none.

Submodules
- `shadow`: first-match range tables.
- `cpu_space` / `ppu_space`: concrete layouts and device tags.
- `dma`: OAM DMA state machine.
- `system`: the device set behind the CPU, with its read/write dispatch.
- `clock`: per-slot device clocking.
"#]

use std::ops::RangeInclusive;

use crate::error::{NesError, Result};

pub mod clock;
pub mod cpu_space;
pub mod dma;
pub mod ppu_space;
pub(crate) mod shadow;
pub mod system;

use shadow::ShadowTable;

/// Index of a bank inside a bus's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BankId(usize);

/// What a slot currently decodes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    /// Nothing drives the data bus; reads return the open-bus value.
    Open,
    Bank(BankId),
}

#[derive(Debug, Clone)]
struct Bank {
    data: Box<[u8]>,
    writable: bool,
}

#[derive(Debug, Clone)]
struct Slot {
    start: usize,
    len: usize,
    region: Region,
    writable: bool,
}

#[derive(Debug, Clone)]
pub struct Bus<H> {
    size: usize,
    banks: Vec<Bank>,
    slots: Vec<Slot>,
    getters: ShadowTable<H>,
    setters: ShadowTable<H>,
    last_addr: u16,
    open_bus: u8,
}

impl<H: Copy> Bus<H> {
    /// Build a bus of `size` bytes from consecutive slots of the given lengths.
    /// Every slot starts unmapped.
    pub fn new(size: usize, slot_lens: &[usize]) -> Result<Self> {
        let covered: usize = slot_lens.iter().sum();
        if covered != size || slot_lens.iter().any(|&len| len == 0) {
            return Err(NesError::Layout {
                covered,
                expected: size,
            });
        }

        let mut start = 0;
        let slots = slot_lens
            .iter()
            .map(|&len| {
                let slot = Slot {
                    start,
                    len,
                    region: Region::Open,
                    writable: true,
                };
                start += len;
                slot
            })
            .collect();

        Ok(Self {
            size,
            banks: Vec::new(),
            slots,
            getters: ShadowTable::new(),
            setters: ShadowTable::new(),
            last_addr: 0,
            open_bus: 0,
        })
    }

    // -------------- Bank arena --------------

    /// Move a buffer into the arena. `writable` is false for ROM.
    pub fn add_bank(&mut self, data: Vec<u8>, writable: bool) -> BankId {
        assert!(!data.is_empty(), "zero-length bank");
        self.banks.push(Bank {
            data: data.into_boxed_slice(),
            writable,
        });
        BankId(self.banks.len() - 1)
    }

    pub fn bank(&self, id: BankId) -> &[u8] {
        &self.banks[id.0].data
    }

    pub fn bank_mut(&mut self, id: BankId) -> &mut [u8] {
        &mut self.banks[id.0].data
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    // -------------- Slot wiring --------------

    /// Point a slot at a region, validating the bank size. Used while a layout
    /// is being assembled.
    pub fn map(&mut self, slot: usize, region: Region) -> Result<()> {
        if let Region::Bank(id) = region {
            let bank = self.banks[id.0].data.len();
            let slot_len = self.slots[slot].len;
            if slot_len % bank != 0 {
                return Err(NesError::BankSize {
                    bank,
                    slot: slot_len,
                });
            }
        }
        self.slots[slot].region = region;
        Ok(())
    }

    /// Point a slot at a region after construction (bank switching). The
    /// bank must already be known to fit; anything else is a wiring bug.
    #[inline]
    pub fn remap(&mut self, slot: usize, region: Region) {
        if let Region::Bank(id) = region {
            let bank = self.banks[id.0].data.len();
            assert!(
                self.slots[slot].len % bank == 0,
                "bank of {bank} bytes remapped into {}-byte slot {slot}",
                self.slots[slot].len
            );
        }
        self.slots[slot].region = region;
    }

    /// Gate writes through a slot independently of the bank's own writability
    /// (cartridge RAM protect bits).
    #[inline]
    pub fn set_slot_writable(&mut self, slot: usize, writable: bool) {
        self.slots[slot].writable = writable;
    }

    pub fn slot_region(&self, slot: usize) -> Region {
        self.slots[slot].region
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    // -------------- Shadow ranges --------------

    pub fn register_shadow_getter(&mut self, range: RangeInclusive<u16>, handler: H) {
        assert!(
            (*range.end() as usize) < self.size,
            "shadow range beyond bus size"
        );
        self.getters.register(range, handler);
    }

    pub fn register_shadow_setter(&mut self, range: RangeInclusive<u16>, handler: H) {
        assert!(
            (*range.end() as usize) < self.size,
            "shadow range beyond bus size"
        );
        self.setters.register(range, handler);
    }

    #[inline]
    pub fn shadow_getter(&self, addr: u16) -> Option<H> {
        self.getters.lookup(addr)
    }

    #[inline]
    pub fn shadow_setter(&self, addr: u16) -> Option<H> {
        self.setters.lookup(addr)
    }

    // -------------- Access --------------

    #[inline]
    fn slot_index(&self, addr: u16) -> usize {
        let addr = addr as usize;
        assert!(
            addr < self.size,
            "address {addr:#06X} outside {}-byte bus",
            self.size
        );
        self.slots.partition_point(|s| s.start <= addr) - 1
    }

    /// Decode through the slots, recording the access.
    #[inline]
    pub fn get_byte(&mut self, addr: u16) -> u8 {
        let value = self.peek(addr);
        self.last_addr = addr;
        self.open_bus = value;
        value
    }

    /// Decode through the slots, recording the access. Writes into ROM,
    /// protected slots and unmapped space are dropped.
    #[inline]
    pub fn set_byte(&mut self, addr: u16, value: u8) {
        let slot = &self.slots[self.slot_index(addr)];
        if let Region::Bank(id) = slot.region {
            let offset = addr as usize - slot.start;
            let writable = slot.writable;
            let bank = &mut self.banks[id.0];
            if writable && bank.writable {
                let len = bank.data.len();
                bank.data[offset % len] = value;
            }
        }
        self.last_addr = addr;
        self.open_bus = value;
    }

    /// Side-effect-free decode (debuggers, tests).
    pub fn peek(&self, addr: u16) -> u8 {
        let slot = &self.slots[self.slot_index(addr)];
        match slot.region {
            Region::Open => self.open_bus,
            Region::Bank(id) => {
                let data = &self.banks[id.0].data;
                data[(addr as usize - slot.start) % data.len()]
            }
        }
    }

    /// Put an address on the bus without transferring data (the address
    /// phase of a PPU fetch).
    #[inline]
    pub fn latch(&mut self, addr: u16) {
        self.last_addr = addr;
    }

    /// Record an access that a shadow handler serviced.
    #[inline]
    pub fn drive(&mut self, addr: u16, value: u8) {
        self.last_addr = addr;
        self.open_bus = value;
    }

    #[inline]
    pub fn last_addr(&self) -> u16 {
        self.last_addr
    }

    #[inline]
    pub fn open_bus(&self) -> u8 {
        self.open_bus
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

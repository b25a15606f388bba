//! Shadow-range tables: address ranges whose accesses are claimed by a device
//! instead of falling through to the slot decode.
//!
//! Ranges are few (well under a dozen per bus), so lookup is a linear scan.
//! The newest registration is kept at the front, making "last registered wins"
//! a plain first-match.

use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShadowRange<H> {
    first: u16,
    last: u16,
    handler: H,
}

#[derive(Debug, Clone)]
pub(crate) struct ShadowTable<H> {
    ranges: Vec<ShadowRange<H>>,
}

impl<H: Copy> ShadowTable<H> {
    pub(crate) fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub(crate) fn register(&mut self, range: RangeInclusive<u16>, handler: H) {
        let (first, last) = (*range.start(), *range.end());
        assert!(first <= last, "empty shadow range {first:#06X}..={last:#06X}");
        self.ranges.insert(
            0,
            ShadowRange {
                first,
                last,
                handler,
            },
        );
    }

    #[inline]
    pub(crate) fn lookup(&self, addr: u16) -> Option<H> {
        self.ranges
            .iter()
            .find(|r| r.first <= addr && addr <= r.last)
            .map(|r| r.handler)
    }

    pub(crate) fn len(&self) -> usize {
        self.ranges.len()
    }
}

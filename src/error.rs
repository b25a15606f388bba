/*!
Construction-time error type.

Everything that can fail happens before the first `step()`: parsing an iNES
image, laying out a bus, slicing cartridge banks into it, and rejecting
configurations the core does not emulate (PAL, unknown mappers). Once a
`Console` exists, stepping is infallible.
*/

use crate::cartridge::Region;

#[derive(thiserror::Error, Debug)]
pub enum NesError {
    #[error("invalid iNES header magic (expected NES<1A>)")]
    BadMagic,

    #[error("image too small for {section}: need {needed} bytes, have {available}")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("NES 2.0 headers are not supported")]
    Nes2Unsupported,

    #[error("image has no PRG ROM")]
    MissingPrg,

    #[error("unsupported video region: {0:?}")]
    UnsupportedRegion(Region),

    #[error("unsupported mapper id: {0}")]
    UnsupportedMapper(u16),

    #[error("bank of {bank} bytes does not evenly divide a {slot}-byte slot")]
    BankSize { bank: usize, slot: usize },

    #[error("bus slots cover {covered} bytes, expected {expected}")]
    Layout { covered: usize, expected: usize },

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NesError>;

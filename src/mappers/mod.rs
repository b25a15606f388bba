/*!
mappers - Board implementations and the factory.

Declares the board implementations and the factory that turns a parsed
image into a wired, boxed mapper.

Implemented:
- NROM (Mapper 0, in `crate::mapper`)
- MMC1 (Mapper 1)
- UxROM (Mapper 2)
- CNROM (Mapper 3)
- MMC3 (Mapper 4), including the A12 scanline IRQ
- AxROM (Mapper 7)
- GxROM (Mapper 66)
*/

pub mod axrom;
pub mod cnrom;
pub mod gxrom;
pub mod mmc1;
pub mod mmc3;
pub mod uxrom;

pub use axrom::Axrom;
pub use cnrom::Cnrom;
pub use gxrom::Gxrom;
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use uxrom::Uxrom;

use tracing::debug;

use crate::bus::cpu_space::CpuDevice;
use crate::bus::ppu_space::Nametables;
use crate::cartridge::CartridgeImage;
use crate::error::{NesError, Result};
use crate::mapper::{Board, Mapper, Nrom, Wiring};

/// iNES mapper numbers this crate emulates.
pub const SUPPORTED: [u16; 7] = [0, 1, 2, 3, 4, 7, 66];

/// Install the image's banks into both buses, build the matching board,
/// claim its register window on the CPU bus and apply its power-on wiring.
pub fn create(
    image: CartridgeImage,
    wiring: &mut Wiring<'_>,
    nametables: Nametables,
) -> Result<Box<dyn Mapper>> {
    let id = image.mapper_id;
    if !SUPPORTED.contains(&id) {
        return Err(NesError::UnsupportedMapper(id));
    }

    let board = Board::install(image, wiring, nametables)?;
    let mapper: Box<dyn Mapper> = match id {
        0 => Box::new(Nrom::new(board)),
        1 => Box::new(Mmc1::new(board)),
        2 => Box::new(Uxrom::new(board)),
        3 => Box::new(Cnrom::new(board)),
        4 => Box::new(Mmc3::new(board)),
        7 => Box::new(Axrom::new(board)),
        66 => Box::new(Gxrom::new(board)),
        other => return Err(NesError::UnsupportedMapper(other)),
    };

    if let Some(window) = mapper.window() {
        wiring.cpu.register_shadow_setter(window, CpuDevice::Mapper);
    }
    mapper.resolve(wiring);
    debug!(id, name = mapper.name(), "mapper ready");
    Ok(mapper)
}

//! NES cartridge mapper implementations.
//!
//! This crate loads iNES 1.0 ROM images and provides mapper implementations
//! for cartridge memory banking. Mappers handle PRG-ROM/RAM and CHR-ROM/RAM
//! addressing and expose nametable mirroring to the PPU.
//!
//! # Supported Mappers
//!
//! | Mapper | Name  | Description                                   |
//! |--------|-------|------------------------------------------------|
//! | 0      | NROM  | No banking, simplest mapper                     |
//! | 1      | MMC1  | Nintendo's first bank-switching mapper          |
//! | 2      | UxROM | PRG-ROM banking only, CHR-RAM                   |
//! | 3      | CNROM | CHR-ROM banking only                            |
//! | 4      | MMC3  | Fine-grained banking plus scanline IRQ counter  |
//!
//! # Example
//!
//! ```no_run
//! use rustynes_mappers::{Rom, create_mapper};
//!
//! let rom_data = std::fs::read("game.nes").expect("failed to read ROM");
//! let rom = Rom::load(&rom_data).expect("failed to parse ROM");
//! let mut mapper = create_mapper(&rom).expect("unsupported mapper");
//!
//! let opcode = mapper.read_prg(0x8000);
//! let tile = mapper.read_chr(0x0000);
//! ```
//!
//! # `no_std` Support
//!
//! This crate supports `no_std` environments via the `alloc` crate. Disable
//! the default `std` feature for embedded use.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::boxed::Box;

pub mod mapper;
pub mod rom;

mod cnrom;
mod mmc1;
mod mmc3;
mod nrom;
mod uxrom;

pub use cnrom::Cnrom;
pub use mapper::{Mapper, Mirroring};
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};
pub use uxrom::Uxrom;

/// Create a mapper instance from a loaded ROM.
///
/// # Errors
///
/// Returns [`RomError::UnsupportedMapper`] if the ROM's mapper number is not
/// implemented by this crate.
pub fn create_mapper(rom: &Rom) -> Result<Box<dyn Mapper>, RomError> {
    match rom.header.mapper_number {
        0 => Ok(Box::new(Nrom::new(rom))),
        1 => Ok(Box::new(Mmc1::new(rom))),
        2 => Ok(Box::new(Uxrom::new(rom))),
        3 => Ok(Box::new(Cnrom::new(rom))),
        4 => Ok(Box::new(Mmc3::new(rom))),
        n => Err(RomError::UnsupportedMapper(n)),
    }
}

/// The mapper numbers implemented by this crate, in ascending order.
#[must_use]
pub fn supported_mappers() -> &'static [u8] {
    &[0, 1, 2, 3, 4]
}

/// Check if a mapper number is supported.
#[must_use]
pub fn is_mapper_supported(mapper: u8) -> bool {
    supported_mappers().contains(&mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn test_rom(mapper: u8) -> Rom {
        let prg_rom: Vec<u8> = (0..32768).map(|i| (i & 0xFF) as u8).collect();
        // UxROM requires CHR-RAM, i.e. an empty CHR-ROM region.
        let chr_rom: Vec<u8> = if mapper == 2 {
            Vec::new()
        } else {
            (0..8192).map(|i| (i & 0xFF) as u8).collect()
        };
        Rom {
            header: RomHeader {
                prg_rom_size: 32768,
                chr_rom_size: chr_rom.len(),
                mapper_number: mapper,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                prg_ram_size: 8192,
            },
            trainer: None,
            prg_rom,
            chr_rom,
        }
    }

    #[test]
    fn create_mapper_dispatches_on_number() {
        for m in [0u8, 1, 2, 3, 4] {
            let rom = test_rom(m);
            let mapper = create_mapper(&rom).unwrap();
            assert_eq!(mapper.mapper_number(), m);
        }
    }

    #[test]
    fn create_mapper_rejects_unsupported() {
        let rom = test_rom(100);
        assert!(matches!(
            create_mapper(&rom),
            Err(RomError::UnsupportedMapper(100))
        ));
    }

    #[test]
    fn supported_mappers_matches_is_supported() {
        for m in supported_mappers() {
            assert!(is_mapper_supported(*m));
        }
        assert!(!is_mapper_supported(200));
    }
}

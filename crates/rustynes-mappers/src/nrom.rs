//! Mapper 0: NROM.
//!
//! The simplest NES mapper, with no bank switching. Provides direct memory
//! mapping with mirroring for 16KB PRG-ROM carts (NROM-128).
//!
//! # Games
//!
//! Super Mario Bros., Donkey Kong, Balloon Fight, Excitebike, Ice Climber.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use crate::mapper::{Mapper, Mirroring};
use crate::rom::Rom;

/// NROM mapper implementation (Mapper 0).
#[derive(Clone)]
pub struct Nrom {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    chr_ram: Vec<u8>,
    mirroring: Mirroring,
    has_chr_ram: bool,
}

impl Nrom {
    /// Create a new NROM mapper from a ROM.
    ///
    /// # Panics
    ///
    /// Panics if PRG-ROM is not 16KB or 32KB, or CHR-ROM (when present) is
    /// not exactly 8KB.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        assert!(
            rom.prg_rom.len() == 16384 || rom.prg_rom.len() == 32768,
            "NROM requires 16KB or 32KB PRG-ROM, got {} bytes",
            rom.prg_rom.len()
        );

        let has_chr_ram = rom.chr_rom.is_empty();
        let chr_ram = if has_chr_ram { vec![0; 8192] } else { Vec::new() };

        if !has_chr_ram {
            assert_eq!(
                rom.chr_rom.len(),
                8192,
                "NROM requires 8KB CHR-ROM, got {} bytes",
                rom.chr_rom.len()
            );
        }

        Self {
            prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            chr_ram,
            mirroring: rom.header.mirroring,
            has_chr_ram,
        }
    }

    /// PRG-ROM size in bytes (16384 or 32768).
    #[must_use]
    pub fn prg_size(&self) -> usize {
        self.prg_rom.len()
    }

    /// Whether this cartridge uses CHR-RAM rather than CHR-ROM.
    #[must_use]
    pub fn has_chr_ram(&self) -> bool {
        self.has_chr_ram
    }
}

impl Mapper for Nrom {
    fn read_prg(&self, addr: u16) -> u8 {
        let offset = (addr.wrapping_sub(0x8000)) as usize;
        let masked = if self.prg_rom.len() == 16384 {
            offset & 0x3FFF
        } else {
            offset & 0x7FFF
        };
        self.prg_rom.get(masked).copied().unwrap_or(0)
    }

    fn write_prg(&mut self, _addr: u16, _val: u8) {
        // NROM has no writable registers.
    }

    fn read_chr(&self, addr: u16) -> u8 {
        let addr = (addr & 0x1FFF) as usize;
        if self.has_chr_ram {
            self.chr_ram.get(addr).copied().unwrap_or(0)
        } else {
            self.chr_rom.get(addr).copied().unwrap_or(0)
        }
    }

    fn write_chr(&mut self, addr: u16, val: u8) {
        if self.has_chr_ram {
            let addr = (addr & 0x1FFF) as usize;
            if let Some(byte) = self.chr_ram.get_mut(addr) {
                *byte = val;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u8 {
        0
    }

    fn mapper_name(&self) -> &'static str {
        "NROM"
    }

    fn clone_mapper(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}

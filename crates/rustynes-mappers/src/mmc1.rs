//! Mapper 1: MMC1.
//!
//! Nintendo's first bank-switching ASIC, used by The Legend of Zelda,
//! Metroid, and Final Fantasy. Registers are programmed through a 5-write
//! serial shift register that any write to $8000-$FFFF feeds, one bit per
//! write (bit 0 of the value), committing on the fifth write. Writing with
//! bit 7 set resets the shift register immediately and forces PRG mode back
//! to `FixLast`, independent of the in-progress shift count.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use crate::mapper::{Mapper, Mirroring};
use crate::rom::Rom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrgMode {
    Switch32K,
    FixFirst,
    FixLast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChrMode {
    Switch8K,
    Switch4K,
}

/// MMC1 mapper implementation (Mapper 1).
#[derive(Clone)]
pub struct Mmc1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    prg_ram: Vec<u8>,
    chr_is_ram: bool,
    prg_banks: usize,

    shift_reg: u8,
    shift_count: u8,

    mirroring: Mirroring,
    prg_mode: PrgMode,
    chr_mode: ChrMode,

    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
    prg_ram_enabled: bool,

    has_battery: bool,
}

impl Mmc1 {
    /// Create a new MMC1 mapper from a ROM.
    #[must_use]
    pub fn new(rom: &Rom) -> Self {
        let prg_banks = (rom.prg_rom.len() / 16384).max(1);
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0u8; 8192]
        } else {
            rom.chr_rom.clone()
        };

        Self {
            prg_rom: rom.prg_rom.clone(),
            chr,
            prg_ram: vec![0u8; 8192],
            chr_is_ram,
            prg_banks,
            shift_reg: 0,
            shift_count: 0,
            mirroring: rom.header.mirroring,
            prg_mode: PrgMode::FixLast,
            chr_mode: ChrMode::Switch8K,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            prg_ram_enabled: true,
            has_battery: rom.header.has_battery,
        }
    }

    fn write_shift(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.prg_mode = PrgMode::FixLast;
            return;
        }

        self.shift_reg |= (value & 0x01) << self.shift_count;
        self.shift_count += 1;

        if self.shift_count == 5 {
            let committed = self.shift_reg;
            match (addr >> 13) & 0x03 {
                0 => self.write_control(committed),
                1 => self.chr_bank_0 = committed,
                2 => self.chr_bank_1 = committed,
                _ => self.write_prg_bank(committed),
            }
            self.shift_reg = 0;
            self.shift_count = 0;
        }
    }

    fn write_control(&mut self, value: u8) {
        self.mirroring = match value & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        };
        self.prg_mode = match (value >> 2) & 0x03 {
            0 | 1 => PrgMode::Switch32K,
            2 => PrgMode::FixFirst,
            _ => PrgMode::FixLast,
        };
        self.chr_mode = if value & 0x10 != 0 {
            ChrMode::Switch4K
        } else {
            ChrMode::Switch8K
        };
    }

    fn write_prg_bank(&mut self, value: u8) {
        self.prg_bank = value & 0x0F;
        self.prg_ram_enabled = value & 0x10 == 0;
    }

    fn prg_addr(&self, addr: u16) -> usize {
        let offset = (addr & 0x3FFF) as usize;
        let banks = self.prg_banks.max(1);
        let bank = match self.prg_mode {
            PrgMode::Switch32K => {
                let bank32 = (self.prg_bank >> 1) as usize % banks.max(1);
                let full_offset = (addr & 0x7FFF) as usize;
                return (bank32 * 32768 + full_offset) % self.prg_rom.len().max(1);
            }
            PrgMode::FixFirst => {
                if addr < 0xC000 {
                    0
                } else {
                    self.prg_bank as usize % banks
                }
            }
            PrgMode::FixLast => {
                if addr < 0xC000 {
                    self.prg_bank as usize % banks
                } else {
                    banks - 1
                }
            }
        };
        bank * 16384 + offset
    }

    fn chr_addr(&self, addr: u16) -> usize {
        let chr_banks_4k = (self.chr.len() / 4096).max(1);
        match self.chr_mode {
            ChrMode::Switch8K => {
                let bank = (self.chr_bank_0 & 0x1E) as usize % (chr_banks_4k.max(2) / 2).max(1);
                bank * 8192 + (addr & 0x1FFF) as usize
            }
            ChrMode::Switch4K => {
                if addr < 0x1000 {
                    (self.chr_bank_0 as usize % chr_banks_4k) * 4096 + (addr & 0x0FFF) as usize
                } else {
                    (self.chr_bank_1 as usize % chr_banks_4k) * 4096 + (addr & 0x0FFF) as usize
                }
            }
        }
    }
}

impl Mapper for Mmc1 {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    self.prg_ram.get((addr - 0x6000) as usize).copied().unwrap_or(0)
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_addr(addr)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, val: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    if let Some(byte) = self.prg_ram.get_mut((addr - 0x6000) as usize) {
                        *byte = val;
                    }
                }
            }
            0x8000..=0xFFFF => self.write_shift(addr, val),
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr.get(self.chr_addr(addr)).copied().unwrap_or(0)
    }

    fn write_chr(&mut self, addr: u16, val: u8) {
        if self.chr_is_ram {
            let offset = self.chr_addr(addr);
            if let Some(byte) = self.chr.get_mut(offset) {
                *byte = val;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn mapper_number(&self) -> u8 {
        1
    }

    fn mapper_name(&self) -> &'static str {
        "MMC1"
    }

    fn has_battery(&self) -> bool {
        self.has_battery
    }

    fn battery_ram(&self) -> Option<&[u8]> {
        if self.has_battery {
            Some(&self.prg_ram)
        } else {
            None
        }
    }

    fn set_battery_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.prg_ram.len());
        self.prg_ram[..len].copy_from_slice(&data[..len]);
    }

    fn reset(&mut self) {
        self.shift_reg = 0;
        self.shift_count = 0;
        self.prg_mode = PrgMode::FixLast;
    }

    fn clone_mapper(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}

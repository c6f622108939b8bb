//! iNES 1.0 ROM image parsing.
//!
//! Parses the 16-byte iNES header and splits the remaining bytes into the
//! optional trainer, PRG-ROM, and CHR-ROM regions. NES 2.0 and other later
//! container formats are out of scope; a ROM whose header advertises NES 2.0
//! is still accepted as a plain iNES 1.0 image (the extra NES 2.0 header
//! bits are simply ignored), since the byte layout of the fields this crate
//! reads is identical between the two formats.

use alloc::{string::String, vec::Vec};

use crate::mapper::Mirroring;

/// The four magic bytes that open every iNES file: `NES` followed by MS-DOS
/// EOF (`0x1A`).
const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 512;
const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 8 * 1024;

/// Errors that can occur while parsing a ROM image.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RomError {
    /// The file is smaller than the minimum iNES header size.
    #[error("file too small to be a valid iNES image: {0} bytes")]
    FileTooSmall(usize),
    /// The first four bytes did not match the iNES magic number.
    #[error("invalid iNES magic number: {0:02X?}")]
    InvalidMagic([u8; 4]),
    /// The header declares zero PRG-ROM banks.
    #[error("PRG-ROM size must be non-zero")]
    InvalidPrgSize,
    /// The data after the header/trainer is shorter than the header promises.
    #[error("ROM data too short: expected at least {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Bytes required by the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// The cartridge uses a mapper this crate does not implement.
    #[error("unsupported mapper number: {0}")]
    UnsupportedMapper(u8),
    /// A generic format problem not covered by a more specific variant.
    #[error("unsupported ROM format: {0}")]
    UnsupportedFormat(String),
}

/// Parsed iNES 1.0 header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomHeader {
    /// Size of the PRG-ROM area in bytes.
    pub prg_rom_size: usize,
    /// Size of the CHR-ROM area in bytes (0 means the cartridge uses CHR-RAM).
    pub chr_rom_size: usize,
    /// iNES mapper number (0-255).
    pub mapper_number: u8,
    /// Nametable mirroring mode declared by the header.
    pub mirroring: Mirroring,
    /// Whether the cartridge has battery-backed PRG-RAM.
    pub has_battery: bool,
    /// Whether a 512-byte trainer is present before PRG-ROM.
    pub has_trainer: bool,
    /// Size of PRG-RAM in bytes, as declared by byte 8 (0 defaults to 8KB
    /// per the original iNES convention).
    pub prg_ram_size: usize,
}

impl RomHeader {
    fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < HEADER_SIZE {
            return Err(RomError::FileTooSmall(data.len()));
        }
        if data[0..4] != MAGIC {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&data[0..4]);
            return Err(RomError::InvalidMagic(magic));
        }

        let prg_rom_size = data[4] as usize * PRG_BANK_SIZE;
        if prg_rom_size == 0 {
            return Err(RomError::InvalidPrgSize);
        }
        let chr_rom_size = data[5] as usize * CHR_BANK_SIZE;

        let flags6 = data[6];
        let flags7 = data[7];

        let mapper_number = (flags6 >> 4) | (flags7 & 0xF0);

        let four_screen = flags6 & 0x08 != 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let has_battery = flags6 & 0x02 != 0;
        let has_trainer = flags6 & 0x04 != 0;

        let prg_ram_banks = data[8];
        let prg_ram_size = if prg_ram_banks == 0 {
            8 * 1024
        } else {
            prg_ram_banks as usize * 8 * 1024
        };

        Ok(Self {
            prg_rom_size,
            chr_rom_size,
            mapper_number,
            mirroring,
            has_battery,
            has_trainer,
            prg_ram_size,
        })
    }
}

/// A fully loaded NES cartridge image: header plus the raw PRG/CHR banks.
#[derive(Debug, Clone)]
pub struct Rom {
    /// The parsed header.
    pub header: RomHeader,
    /// Optional 512-byte trainer, loaded at CPU $7000 by convention.
    pub trainer: Option<Vec<u8>>,
    /// Raw PRG-ROM bytes.
    pub prg_rom: Vec<u8>,
    /// Raw CHR-ROM bytes (empty if the cartridge uses CHR-RAM).
    pub chr_rom: Vec<u8>,
}

impl Rom {
    /// Parse a complete `.nes` file image.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] if the header is malformed or the file is too
    /// short to contain the PRG/CHR data the header promises.
    pub fn load(data: &[u8]) -> Result<Self, RomError> {
        let header = RomHeader::parse(data)?;

        let mut offset = HEADER_SIZE;

        let trainer = if header.has_trainer {
            let end = offset + TRAINER_SIZE;
            if data.len() < end {
                return Err(RomError::SizeMismatch {
                    expected: end,
                    actual: data.len(),
                });
            }
            let t = data[offset..end].to_vec();
            offset = end;
            Some(t)
        } else {
            None
        };

        let prg_end = offset + header.prg_rom_size;
        if data.len() < prg_end {
            return Err(RomError::SizeMismatch {
                expected: prg_end,
                actual: data.len(),
            });
        }
        let prg_rom = data[offset..prg_end].to_vec();
        offset = prg_end;

        let chr_end = offset + header.chr_rom_size;
        let chr_rom = if header.chr_rom_size == 0 {
            Vec::new()
        } else {
            if data.len() < chr_end {
                return Err(RomError::SizeMismatch {
                    expected: chr_end,
                    actual: data.len(),
                });
            }
            data[offset..chr_end].to_vec()
        };

        Ok(Self {
            header,
            trainer,
            prg_rom,
            chr_rom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_header(
        prg_banks: u8,
        chr_banks: u8,
        mapper: u8,
        mirroring_bit: u8,
        battery: bool,
        trainer: bool,
    ) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&MAGIC);
        header[4] = prg_banks;
        header[5] = chr_banks;
        header[6] =
            ((mapper & 0x0F) << 4) | mirroring_bit | (u8::from(battery) << 1) | (u8::from(trainer) << 2);
        header[7] = mapper & 0xF0;
        header
    }

    #[test]
    fn valid_ines_header_parses() {
        let header = build_header(2, 1, 0, 0, false, false);
        let mut data = header.to_vec();
        data.extend(vec![0u8; 2 * PRG_BANK_SIZE + CHR_BANK_SIZE]);

        let rom = Rom::load(&data).unwrap();
        assert_eq!(rom.header.prg_rom_size, 2 * PRG_BANK_SIZE);
        assert_eq!(rom.header.chr_rom_size, CHR_BANK_SIZE);
        assert_eq!(rom.header.mapper_number, 0);
        assert_eq!(rom.prg_rom.len(), 2 * PRG_BANK_SIZE);
        assert_eq!(rom.chr_rom.len(), CHR_BANK_SIZE);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut data = vec![0u8; HEADER_SIZE + PRG_BANK_SIZE];
        data[0..4].copy_from_slice(b"BAD!");
        assert!(matches!(Rom::load(&data), Err(RomError::InvalidMagic(_))));
    }

    #[test]
    fn file_too_small_rejected() {
        let data = vec![0u8; 8];
        assert_eq!(Rom::load(&data), Err(RomError::FileTooSmall(8)));
    }

    #[test]
    fn mapper_number_combines_both_nibbles() {
        // Mapper 33: low nibble 1 from flags6, high nibble 2 from flags7.
        let header = build_header(1, 1, 33, 0, false, false);
        let mut data = header.to_vec();
        data.extend(vec![0u8; PRG_BANK_SIZE + CHR_BANK_SIZE]);

        let rom = Rom::load(&data).unwrap();
        assert_eq!(rom.header.mapper_number, 33);
    }

    #[test]
    fn mirroring_modes_decode_correctly() {
        let h_vert = build_header(1, 1, 0, 0x01, false, false);
        let mut data = h_vert.to_vec();
        data.extend(vec![0u8; PRG_BANK_SIZE + CHR_BANK_SIZE]);
        assert_eq!(Rom::load(&data).unwrap().header.mirroring, Mirroring::Vertical);

        let h_horiz = build_header(1, 1, 0, 0x00, false, false);
        let mut data = h_horiz.to_vec();
        data.extend(vec![0u8; PRG_BANK_SIZE + CHR_BANK_SIZE]);
        assert_eq!(Rom::load(&data).unwrap().header.mirroring, Mirroring::Horizontal);

        let h_four = build_header(1, 1, 0, 0x08, false, false);
        let mut data = h_four.to_vec();
        data.extend(vec![0u8; PRG_BANK_SIZE + CHR_BANK_SIZE]);
        assert_eq!(Rom::load(&data).unwrap().header.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn battery_flag_detected() {
        let header = build_header(1, 1, 0, 0, true, false);
        let mut data = header.to_vec();
        data.extend(vec![0u8; PRG_BANK_SIZE + CHR_BANK_SIZE]);
        assert!(Rom::load(&data).unwrap().header.has_battery);
    }

    #[test]
    fn rom_with_trainer_offsets_prg_correctly() {
        let header = build_header(1, 1, 0, 0, false, true);
        let mut data = header.to_vec();
        let mut trainer = vec![0xAAu8; TRAINER_SIZE];
        let mut prg = vec![0u8; PRG_BANK_SIZE];
        prg[0] = 0x42;
        data.append(&mut trainer);
        data.append(&mut prg);
        data.extend(vec![0u8; CHR_BANK_SIZE]);

        let rom = Rom::load(&data).unwrap();
        assert!(rom.trainer.is_some());
        assert_eq!(rom.trainer.unwrap().len(), TRAINER_SIZE);
        assert_eq!(rom.prg_rom[0], 0x42);
    }

    #[test]
    fn rom_size_mismatch_detected() {
        let header = build_header(2, 1, 0, 0, false, false);
        let mut data = header.to_vec();
        data.extend(vec![0u8; PRG_BANK_SIZE]); // only 1 bank of the promised 2
        assert!(matches!(Rom::load(&data), Err(RomError::SizeMismatch { .. })));
    }

    #[test]
    fn zero_prg_size_rejected() {
        let header = build_header(0, 1, 0, 0, false, false);
        assert_eq!(Rom::load(&header).unwrap_err(), RomError::InvalidPrgSize);
    }
}

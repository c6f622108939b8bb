//! PPU register definitions (PPUCTRL, PPUMASK, PPUSTATUS).
//!
//! The NES PPU exposes 8 memory-mapped registers at CPU addresses
//! $2000-$2007. This module defines the bit flags and derived behavior for
//! the three control/status registers; the scroll/address pair ($2005,
//! $2006) and data registers ($2003, $2004, $2007) are handled in
//! [`crate::scroll`] and [`crate::oam`].

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL ($2000) - write only.
    ///
    /// ```text
    /// 7  bit  0
    /// ---- ----
    /// VPHB SINN
    /// |||| ||||
    /// |||| ||++- Base nametable address (0=$2000 1=$2400 2=$2800 3=$2C00)
    /// |||| |+--- VRAM address increment (0: +1 across, 1: +32 down)
    /// |||| +---- Sprite pattern table address for 8x8 sprites
    /// |||+------ Background pattern table address
    /// ||+------- Sprite size (0: 8x8, 1: 8x16)
    /// |+-------- PPU master/slave select (unused on NES)
    /// +--------- Generate an NMI at the start of vblank
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuCtrl: u8 {
        /// Nametable X bit (bit 0).
        const NAMETABLE_X = 0b0000_0001;
        /// Nametable Y bit (bit 1).
        const NAMETABLE_Y = 0b0000_0010;
        /// VRAM address increment (0: +1 across, 1: +32 down).
        const VRAM_INCREMENT = 0b0000_0100;
        /// Sprite pattern table address (8x8 mode only).
        const SPRITE_TABLE = 0b0000_1000;
        /// Background pattern table address.
        const BG_TABLE = 0b0001_0000;
        /// Sprite size (0: 8x8, 1: 8x16).
        const SPRITE_SIZE = 0b0010_0000;
        /// Master/slave select (unused on NES).
        const MASTER_SLAVE = 0b0100_0000;
        /// Generate NMI at VBlank.
        const NMI_ENABLE = 0b1000_0000;
    }
}

impl PpuCtrl {
    /// Base nametable address ($2000, $2400, $2800, or $2C00).
    #[inline]
    #[must_use]
    pub fn nametable_addr(self) -> u16 {
        0x2000 | ((self.bits() & 0x03) as u16) << 10
    }

    /// VRAM address increment per PPUDATA access (1 or 32).
    #[inline]
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Sprite pattern table base address ($0000 or $1000), 8x8 mode only.
    #[inline]
    #[must_use]
    pub fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Background pattern table base address ($0000 or $1000).
    #[inline]
    #[must_use]
    pub fn bg_table_addr(self) -> u16 {
        if self.contains(Self::BG_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in pixels (8 or 16).
    #[inline]
    #[must_use]
    pub fn sprite_height(self) -> u8 {
        if self.contains(Self::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }

    /// Whether VBlank should raise an NMI.
    #[inline]
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// PPUMASK ($2001) - write only.
    ///
    /// ```text
    /// 7  bit  0
    /// ---- ----
    /// BGRs bMmG
    /// |||| ||||
    /// |||| |||+- Greyscale
    /// |||| ||+-- Show background in leftmost 8 pixels
    /// |||| |+--- Show sprites in leftmost 8 pixels
    /// |||| +---- Show background
    /// |||+------ Show sprites
    /// ||+------- Emphasize red (green on PAL)
    /// |+-------- Emphasize green (red on PAL)
    /// +--------- Emphasize blue
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuMask: u8 {
        /// Greyscale mode.
        const GREYSCALE = 0b0000_0001;
        /// Show background in leftmost 8 pixels.
        const SHOW_BG_LEFT = 0b0000_0010;
        /// Show sprites in leftmost 8 pixels.
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        /// Show background.
        const SHOW_BG = 0b0000_1000;
        /// Show sprites.
        const SHOW_SPRITES = 0b0001_0000;
        /// Emphasize red (NTSC) / green (PAL).
        const EMPHASIZE_RED = 0b0010_0000;
        /// Emphasize green (NTSC) / red (PAL).
        const EMPHASIZE_GREEN = 0b0100_0000;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl PpuMask {
    /// True if either background or sprite rendering is enabled.
    #[inline]
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BG | Self::SHOW_SPRITES)
    }

    /// Whether background rendering is enabled.
    #[inline]
    #[must_use]
    pub fn show_background(self) -> bool {
        self.contains(Self::SHOW_BG)
    }

    /// Whether sprite rendering is enabled.
    #[inline]
    #[must_use]
    pub fn show_sprites(self) -> bool {
        self.contains(Self::SHOW_SPRITES)
    }

    /// Whether the leftmost 8 pixels show background.
    #[inline]
    #[must_use]
    pub fn show_bg_left(self) -> bool {
        self.contains(Self::SHOW_BG_LEFT)
    }

    /// Whether the leftmost 8 pixels show sprites.
    #[inline]
    #[must_use]
    pub fn show_sprites_left(self) -> bool {
        self.contains(Self::SHOW_SPRITES_LEFT)
    }
}

bitflags! {
    /// PPUSTATUS ($2002) - read only.
    ///
    /// ```text
    /// 7  bit  0
    /// ---- ----
    /// VSO- ----
    /// |||+-++++- Open bus
    /// ||+------- Sprite overflow
    /// |+-------- Sprite 0 hit
    /// +--------- Vertical blank flag
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuStatus: u8 {
        /// Sprite overflow flag (faithfully reproduces the hardware's
        /// buggy diagonal-scan overflow detection).
        const SPRITE_OVERFLOW = 0b0010_0000;
        /// Sprite 0 hit flag.
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Vertical blank flag.
        const VBLANK = 0b1000_0000;
    }
}

impl PpuStatus {
    /// Whether the VBlank flag is set.
    #[inline]
    #[must_use]
    pub fn in_vblank(self) -> bool {
        self.contains(Self::VBLANK)
    }

    /// Whether sprite 0 hit has been detected this frame.
    #[inline]
    #[must_use]
    pub fn sprite_zero_hit(self) -> bool {
        self.contains(Self::SPRITE_ZERO_HIT)
    }

    /// Whether sprite overflow has been detected this frame.
    #[inline]
    #[must_use]
    pub fn sprite_overflow(self) -> bool {
        self.contains(Self::SPRITE_OVERFLOW)
    }

    /// Set the VBlank flag.
    #[inline]
    pub fn set_vblank(&mut self) {
        self.insert(Self::VBLANK);
    }

    /// Clear the VBlank flag.
    #[inline]
    pub fn clear_vblank(&mut self) {
        self.remove(Self::VBLANK);
    }

    /// Set the sprite 0 hit flag.
    #[inline]
    pub fn set_sprite_zero_hit(&mut self) {
        self.insert(Self::SPRITE_ZERO_HIT);
    }

    /// Set the sprite overflow flag.
    #[inline]
    pub fn set_sprite_overflow(&mut self) {
        self.insert(Self::SPRITE_OVERFLOW);
    }

    /// Clear both sprite-related flags (done on pre-render scanline).
    #[inline]
    pub fn clear_sprite_flags(&mut self) {
        self.remove(Self::SPRITE_ZERO_HIT | Self::SPRITE_OVERFLOW);
    }
}

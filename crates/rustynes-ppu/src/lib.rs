//! NES 2C02 PPU (Picture Processing Unit) emulation.
//!
//! This crate provides a cycle-accurate implementation of the NES PPU,
//! responsible for all graphics rendering.
//!
//! # Overview
//!
//! The PPU operates at 3x the CPU clock rate and generates a 256x240 pixel
//! image. It consists of several subsystems:
//!
//! - **Registers**: Control, Mask, Status, OAM Address, Scroll, Address, Data
//! - **Background rendering**: Nametables, pattern tables, attribute tables
//! - **Sprite rendering**: OAM, sprite evaluation, sprite 0 hit detection
//! - **Palette**: 32-byte palette RAM with mirroring
//!
//! # Timing
//!
//! NTSC timing (the primary target):
//! - Master clock: 21.477272 MHz
//! - PPU clock: 5.369318 MHz (master / 4)
//! - 341 dots per scanline
//! - 262 scanlines per frame
//! - 89,341-89,342 dots per frame (odd frame skip)
//!
//! # Usage
//!
//! ```no_run
//! use rustynes_ppu::{Mirroring, Ppu};
//!
//! let mut ppu = Ppu::new(Mirroring::Horizontal);
//!
//! // Register access from the CPU's memory map ($2000-$2007). The closures
//! // let the PPU reach into the mapper's CHR ROM/RAM for pattern data.
//! ppu.write_register(0x2000, 0x80, |_addr, _value| {}); // Enable NMI
//! let status = ppu.read_register(0x2002, |_addr| 0);
//!
//! // Step the PPU one dot at a time (3 dots per CPU cycle for NTSC).
//! let (frame_complete, nmi) = ppu.step_with_chr(|_addr| 0);
//! let _ = (status, frame_complete, nmi);
//! ```
//!
//! # Features
//!
//! - `serde`: Enable serialization support for save states

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod timing;
mod vram;

pub use oam::{SecondaryOam, Sprite, SpriteAttributes};
pub use ppu::{
    DOTS_PER_SCANLINE, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH, PRE_RENDER_SCANLINE, Ppu,
    SCANLINES_PER_FRAME, VBLANK_START_SCANLINE,
};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::ScrollRegisters;
pub use vram::Mirroring;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppu_integration() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);

        ppu.write_register(0x2000, 0x80, |_, _| {}); // Enable NMI
        ppu.write_register(0x2001, 0x1E, |_, _| {}); // Enable rendering

        assert_eq!(ppu.frame_buffer().len(), FRAME_SIZE);
    }

    #[test]
    fn test_frame_completion() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);

        // Run for slightly more than one frame's worth of dots.
        let mut frame_completed = false;
        for _ in 0..(DOTS_PER_SCANLINE as u32 * SCANLINES_PER_FRAME as u32 + 1) {
            let (frame_complete, _) = ppu.step();
            if frame_complete {
                frame_completed = true;
            }
        }

        assert!(frame_completed, "should have completed at least one frame");
    }

    #[test]
    fn test_vblank_nmi() {
        let mut ppu = Ppu::new(Mirroring::Horizontal);

        // Enable NMI
        ppu.write_register(0x2000, 0x80, |_, _| {});

        // Step until we get NMI
        let mut nmi_triggered = false;
        for _ in 0..100_000 {
            let (_, nmi) = ppu.step();
            if nmi {
                nmi_triggered = true;
                break;
            }
        }

        assert!(nmi_triggered, "NMI should have been triggered");
    }
}

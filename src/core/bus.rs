// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Table memory access.
//!
//! The render pipeline never indexes its tables directly; every lookup goes
//! through [`TableReader`]. A read issued on clock N is latched by the caller
//! on the same edge, so the value is visible on clock N+1. ROM is the only
//! backing store today.

/// One-operation, one-cycle-latency read port.
pub trait TableReader {
    /// Word stored at `addr`. Out-of-range addresses read as 0.
    fn read(&self, addr: usize) -> u8;

    /// Number of addressable words.
    fn depth(&self) -> usize;
}

/// Read-only memory of `width`-bit words, loaded once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    words: Box<[u8]>,
    width: u8,
}

impl Rom {
    /// Build a ROM from already-validated words. Bits above `width` are dropped.
    pub fn new(words: Vec<u8>, width: u8) -> Self {
        let mask = Self::mask_for(width);
        let words = words.into_iter().map(|w| w & mask).collect();
        Self { words, width }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.words
    }

    fn mask_for(width: u8) -> u8 {
        if width >= 8 { 0xFF } else { (1u8 << width) - 1 }
    }
}

impl TableReader for Rom {
    fn read(&self, addr: usize) -> u8 {
        self.words.get(addr).copied().unwrap_or(0)
    }

    fn depth(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_read_masks_to_width() {
        let rom = Rom::new(vec![0x1F, 0x03, 0xFF], 4);
        assert_eq!(rom.read(0), 0x0F);
        assert_eq!(rom.read(1), 0x03);
        assert_eq!(rom.read(2), 0x0F);
        assert_eq!(rom.depth(), 3);
    }

    #[test]
    fn rom_out_of_range_reads_zero() {
        let rom = Rom::new(vec![0x2A; 16], 6);
        assert_eq!(rom.read(15), 0x2A);
        assert_eq!(rom.read(16), 0);
        assert_eq!(rom.read(usize::MAX), 0);
    }
}

// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Host-side framebuffer
//!
//! Packed BGRA, 8 bits per channel, row-major with no padding. Each 2-bit
//! channel of the `RRGGBB` output is expanded with an even-spaced table.

/// Bytes per packed pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// 2-bit channel to 8-bit intensity.
pub const CHANNEL_LUT: [u8; 4] = [0, 85, 170, 255];

/// Expand a 6-bit `RRGGBB` value into BGRA bytes.
pub fn expand_color(rrggbb: u8) -> [u8; 4] {
    [
        CHANNEL_LUT[usize::from(rrggbb & 0b11)],
        CHANNEL_LUT[usize::from((rrggbb >> 2) & 0b11)],
        CHANNEL_LUT[usize::from((rrggbb >> 4) & 0b11)],
        0xFF,
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    /// Raw BGRA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// BGRA bytes of one pixel, `None` outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.stride() + x * BYTES_PER_PIXEL;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + BYTES_PER_PIXEL]);
        Some(out)
    }

    /// Store a pixel at a precomputed byte offset. Returns false (and writes
    /// nothing) if the pixel would not fit.
    pub fn write_at(&mut self, offset: usize, rrggbb: u8) -> bool {
        match self.pixels.get_mut(offset..offset + BYTES_PER_PIXEL) {
            Some(slot) => {
                slot.copy_from_slice(&expand_color(rrggbb));
                true
            }
            None => false,
        }
    }

    /// Store a pixel by coordinate.
    pub fn put(&mut self, x: usize, y: usize, rrggbb: u8) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let offset = y * self.stride() + x * BYTES_PER_PIXEL;
        self.write_at(offset, rrggbb)
    }

    /// Convert to RGBA byte order for image encoders.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(BYTES_PER_PIXEL) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_expansion_is_bgra() {
        assert_eq!(expand_color(0b11_00_00), [0, 0, 255, 255]);
        assert_eq!(expand_color(0b00_10_00), [0, 170, 0, 255]);
        assert_eq!(expand_color(0b00_00_01), [85, 0, 0, 255]);
        assert_eq!(expand_color(0), [0, 0, 0, 255]);
    }

    #[test]
    fn put_and_read_back() {
        let mut fb = Framebuffer::new(4, 3);
        assert!(fb.put(3, 2, 0x3F));
        assert_eq!(fb.pixel(3, 2), Some([255, 255, 255, 255]));
        assert_eq!(fb.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn out_of_range_writes_are_dropped() {
        let mut fb = Framebuffer::new(4, 3);
        assert!(!fb.put(4, 0, 0x3F));
        assert!(!fb.write_at(4 * 3 * BYTES_PER_PIXEL, 0x3F));
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn rgba_conversion_swaps_red_and_blue() {
        let mut fb = Framebuffer::new(1, 1);
        fb.put(0, 0, 0b11_00_01);
        assert_eq!(fb.to_rgba(), vec![255, 0, 85, 255]);
    }
}

// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Animation and palette lookup tables.
//!
//! The tables are produced offline as text hex dumps (one value per token,
//! `//` comments) and loaded once before the first clock. After loading
//! they are plain [`Rom`]s and never change.

use std::fs;
use std::path::Path;

use crate::core::Rom;
use crate::error::TableError;

/// Number of animation frames stored in the frame table.
pub const FRAME_COUNT: usize = 12;
/// Source frame width in pixels.
pub const SOURCE_WIDTH: usize = 64;
/// Source frame height in pixels.
pub const SOURCE_HEIGHT: usize = 64;
/// Words per animation frame.
pub const FRAME_WORDS: usize = SOURCE_WIDTH * SOURCE_HEIGHT;
/// Total words in the frame table (49,152).
pub const ANIMATION_WORDS: usize = FRAME_COUNT * FRAME_WORDS;
/// Palette depth; indices are 4 bits wide.
pub const PALETTE_DEPTH: usize = 16;

const INDEX_BITS: u8 = 4;
const COLOR_BITS: u8 = 6;

/// Source palette of the animation, in character-index order.
pub const NYANCAT_COLORS: [(char, [u8; 3]); 14] = [
    (',', [0, 49, 105]),     // background
    ('.', [255, 255, 255]),  // stars
    ('\'', [0, 0, 0]),       // border
    ('@', [255, 205, 152]),  // poptart tan
    ('$', [255, 169, 255]),  // poptart pink
    ('-', [255, 76, 152]),   // poptart red
    ('>', [255, 25, 0]),     // rainbow red
    ('&', [255, 154, 0]),    // rainbow orange
    ('+', [255, 240, 0]),    // rainbow yellow
    ('#', [40, 220, 0]),     // rainbow green
    ('=', [0, 144, 255]),    // rainbow light blue
    (';', [104, 68, 255]),   // rainbow dark blue
    ('*', [153, 153, 153]),  // face
    ('%', [255, 163, 152]),  // cheeks
];

/// Reduce an 8-bit RGB triple to the 6-bit `RRGGBB` output format.
pub fn rgb_to_vga6(r: u8, g: u8, b: u8) -> u8 {
    ((r >> 6) << 4) | ((g >> 6) << 2) | (b >> 6)
}

/// The two read-only tables driving the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationTables {
    pub frames: Rom,
    pub palette: Rom,
}

impl AnimationTables {
    /// Validate raw words and wrap them as ROMs.
    pub fn new(frames: Vec<u8>, palette: Vec<u8>) -> Result<Self, TableError> {
        let frames = frames.into_iter().map(u32::from).collect::<Vec<_>>();
        let palette = palette.into_iter().map(u32::from).collect::<Vec<_>>();
        Self::from_words(&frames, &palette)
    }

    /// Parse both tables from their hex-dump text.
    pub fn from_hex(frames: &str, palette: &str) -> Result<Self, TableError> {
        Self::from_words(&parse_hex_words(frames)?, &parse_hex_words(palette)?)
    }

    /// Read and parse both hex dumps from disk.
    pub fn load(frames_path: &Path, palette_path: &Path) -> Result<Self, TableError> {
        let frames = fs::read_to_string(frames_path)
            .map_err(|err| TableError::unreadable(frames_path, &err))?;
        let palette = fs::read_to_string(palette_path)
            .map_err(|err| TableError::unreadable(palette_path, &err))?;
        let tables = Self::from_hex(&frames, &palette)?;
        log::info!(
            "loaded {} frame words from {} and {} palette entries from {}",
            tables.frames.as_slice().len(),
            frames_path.display(),
            tables.palette.as_slice().len(),
            palette_path.display()
        );
        Ok(tables)
    }

    /// Built-in stand-in animation used when no data files are given.
    ///
    /// A rainbow trail scrolls one band per frame behind a bordered poptart,
    /// over a starfield that twinkles with the frame index.
    pub fn procedural() -> Self {
        let mut frames = Vec::with_capacity(ANIMATION_WORDS);
        for frame in 0..FRAME_COUNT {
            for y in 0..SOURCE_HEIGHT {
                for x in 0..SOURCE_WIDTH {
                    frames.push(procedural_index(frame, x, y));
                }
            }
        }
        Self {
            frames: Rom::new(frames, INDEX_BITS),
            palette: Rom::new(nyancat_palette(), COLOR_BITS),
        }
    }

    fn from_words(frames: &[u32], palette: &[u32]) -> Result<Self, TableError> {
        if frames.len() != ANIMATION_WORDS {
            return Err(TableError::WrongLength {
                table: "frame",
                found: frames.len(),
                expected: ANIMATION_WORDS,
            });
        }
        if palette.is_empty() || palette.len() > PALETTE_DEPTH {
            return Err(TableError::PaletteSize {
                found: palette.len(),
                max: PALETTE_DEPTH,
            });
        }

        let frames = narrow("frame", frames, INDEX_BITS)?;
        let mut palette = narrow("palette", palette, COLOR_BITS)?;
        palette.resize(PALETTE_DEPTH, 0);

        Ok(Self {
            frames: Rom::new(frames, INDEX_BITS),
            palette: Rom::new(palette, COLOR_BITS),
        })
    }
}

/// The 14 source colours converted to 6-bit, padded to the full palette depth.
pub fn nyancat_palette() -> Vec<u8> {
    let mut palette: Vec<u8> = NYANCAT_COLORS
        .iter()
        .map(|(_, [r, g, b])| rgb_to_vga6(*r, *g, *b))
        .collect();
    palette.resize(PALETTE_DEPTH, 0);
    palette
}

/// Split a hex dump into values. `//` starts a comment.
pub fn parse_hex_words(text: &str) -> Result<Vec<u32>, TableError> {
    let mut words = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let code = line.split("//").next().unwrap_or("");
        for token in code.split_whitespace() {
            let digits = token.strip_prefix("0x").unwrap_or(token);
            let value =
                u32::from_str_radix(digits, 16).map_err(|_| TableError::InvalidToken {
                    line: line_idx + 1,
                    token: token.to_string(),
                })?;
            words.push(value);
        }
    }
    Ok(words)
}

fn narrow(table: &'static str, words: &[u32], bits: u8) -> Result<Vec<u8>, TableError> {
    let limit = 1u32 << bits;
    words
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if value < limit {
                Ok(value as u8)
            } else {
                Err(TableError::ValueTooWide {
                    table,
                    index,
                    value,
                    bits,
                })
            }
        })
        .collect()
}

fn procedural_index(frame: usize, x: usize, y: usize) -> u8 {
    const BODY_X: std::ops::Range<usize> = 24..48;
    const BODY_Y: std::ops::Range<usize> = 20..44;

    if BODY_X.contains(&x) && BODY_Y.contains(&y) {
        let edge = x == BODY_X.start
            || x == BODY_X.end - 1
            || y == BODY_Y.start
            || y == BODY_Y.end - 1;
        let frosting = (BODY_X.start + 3..BODY_X.end - 3).contains(&x)
            && (BODY_Y.start + 3..BODY_Y.end - 3).contains(&y);
        return if edge {
            2
        } else if (x + y) % 7 == 0 {
            5
        } else if frosting {
            4
        } else {
            3
        };
    }

    if x < BODY_X.start && BODY_Y.contains(&y) {
        // six bands of four lines, shifted one line per frame
        let band = ((y - BODY_Y.start + frame) / 4) % 6;
        return 6 + band as u8;
    }

    if (x * 7 + y * 13 + frame * 5) % 97 == 0 { 1 } else { 0 }
}

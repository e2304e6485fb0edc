// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Two-stage render pipeline.
//!
//! Stage 1 reads the animation table at the address computed on the previous
//! clock and latches the character index; stage 2 reads the palette at that
//! character index and latches the color. A coordinate presented on clock N
//! therefore reaches the output on clock N+2. The validity flags travel with
//! the data one stage per clock and gate the output together with
//! activevideo.

use crate::address::TableAddress;
use crate::core::{Rom, TableReader};

/// Snapshot of the pipeline registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineRegisters {
    pub char_index: u8,
    pub valid1: bool,
    pub color: u8,
    pub valid2: bool,
}

/// Animation-table lookup followed by palette lookup.
#[derive(Debug, Clone)]
pub struct RenderPipeline<R = Rom> {
    frames: R,
    palette: R,
    regs: PipelineRegisters,
}

impl<R: TableReader> RenderPipeline<R> {
    pub fn new(frames: R, palette: R) -> Self {
        Self {
            frames,
            palette,
            regs: PipelineRegisters::default(),
        }
    }

    /// Clear both validity flags. Data registers keep stale values; they are
    /// masked until fresh data has propagated.
    pub fn reset(&mut self) {
        self.regs.valid1 = false;
        self.regs.valid2 = false;
    }

    /// Advance one clock edge with the address computed on this clock.
    pub fn tick(&mut self, addr: TableAddress) {
        // stage 2 consumes stage 1's registers before they are overwritten
        self.regs.color = self.palette.read(usize::from(self.regs.char_index));
        self.regs.valid2 = self.regs.valid1;

        self.regs.char_index = self.frames.read(addr.index);
        self.regs.valid1 = addr.in_display;
    }

    /// Combinational `rrggbb` output.
    pub fn output(&self, active_video: bool) -> u8 {
        if self.regs.valid2 && active_video {
            self.regs.color
        } else {
            0
        }
    }

    pub fn registers(&self) -> PipelineRegisters {
        self.regs
    }
}

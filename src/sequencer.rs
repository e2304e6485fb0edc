// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Animation frame sequencer

use crate::tables::FRAME_COUNT;

/// Default clocks per animation frame: ~12 frames/s at the 31.5 MHz pixel clock.
pub const DEFAULT_FRAME_PERIOD: u32 = 2_625_000;

/// Steps the animation frame index on a fixed clock period.
#[derive(Debug, Clone)]
pub struct FrameSequencer {
    period: u32,
    counter: u32,
    frame: u8,
}

impl FrameSequencer {
    /// `period` must be non-zero; the design top level validates it.
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            counter: 0,
            frame: 0,
        }
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.frame = 0;
    }

    pub fn tick(&mut self) {
        if self.counter == self.period - 1 {
            self.counter = 0;
            self.frame = (self.frame + 1) % FRAME_COUNT as u8;
        } else {
            self.counter += 1;
        }
    }

    /// Current animation frame, always below [`FRAME_COUNT`].
    pub fn frame(&self) -> u8 {
        self.frame
    }

    pub fn period(&self) -> u32 {
        self.period
    }
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_once_per_period() {
        let mut seq = FrameSequencer::new(10);
        for _ in 0..9 {
            seq.tick();
        }
        assert_eq!(seq.frame(), 0);
        seq.tick();
        assert_eq!(seq.frame(), 1);
    }

    #[test]
    fn wraps_after_twelve_frames() {
        let mut seq = FrameSequencer::new(3);
        for _ in 0..3 * 12 {
            seq.tick();
        }
        assert_eq!(seq.frame(), 0);
        for _ in 0..3 * 11 {
            seq.tick();
        }
        assert_eq!(seq.frame(), 11);
    }

    #[test]
    fn period_of_one_steps_every_clock() {
        let mut seq = FrameSequencer::new(1);
        seq.tick();
        seq.tick();
        assert_eq!(seq.frame(), 2);
    }

    #[test]
    fn reset_zeroes_counter_and_frame() {
        let mut seq = FrameSequencer::new(4);
        for _ in 0..6 {
            seq.tick();
        }
        assert_eq!(seq.frame(), 1);
        seq.reset();
        assert_eq!(seq.frame(), 0);
        for _ in 0..3 {
            seq.tick();
        }
        assert_eq!(seq.frame(), 0);
    }
}
